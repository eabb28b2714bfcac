//! Execution planning: decides between store push-down and scan-and-filter.
//!
//! A query string containing any of `:`, `-`, `*` or `"` is *advanced*: its
//! terms can reference arbitrary attribute keys, negate, and AND several
//! substrings, none of which the store understands. Such queries become a
//! [`ScanPlan`]: only level/service/time predicates are pushed down, the store
//! returns a bounded candidate window, and the evaluator filters and pages in
//! memory. Everything else becomes a [`SimplePlan`] handled by the store alone.

use serde::{Deserialize, Serialize};

use crate::config::QueryConfig;
use crate::search::{parse, SearchTerm};
use crate::store::{Deletion, Predicates, Selection};

/// Characters that mark a query as advanced.
pub const ADVANCED_CHARS: [char; 4] = [':', '-', '*', '"'];

/// Pure, stable classification of a raw query string.
pub fn is_advanced(query: &str) -> bool {
    query.contains(&ADVANCED_CHARS[..])
}

// ---------------------------------------------------------------------------
// Criteria
// ---------------------------------------------------------------------------

/// Filter criteria for [`query`](crate::QueryCoordinator::query) and
/// [`count`](crate::QueryCoordinator::count). Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryCriteria {
    pub query: Option<String>,
    pub level: Option<String>,
    pub service: Option<String>,
    /// Inclusive lower bound, compared as a canonical timestamp string.
    pub start_date: Option<String>,
    /// Inclusive upper bound, compared as a canonical timestamp string.
    pub end_date: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl QueryCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_range(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_date = Some(start.into());
        self.end_date = Some(end.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// The query string, if one was given and it is not empty.
    pub fn query_str(&self) -> Option<&str> {
        self.query.as_deref().filter(|q| !q.is_empty())
    }

    pub fn is_advanced(&self) -> bool {
        self.query_str().is_some_and(is_advanced)
    }

    /// The same criteria without limit or offset.
    pub fn unpaginated(&self) -> Self {
        Self {
            limit: None,
            offset: None,
            ..self.clone()
        }
    }

    fn predicates(&self) -> Predicates {
        Predicates {
            level: non_empty(&self.level),
            service: non_empty(&self.service),
            start: non_empty(&self.start_date),
            end: non_empty(&self.end_date),
        }
    }
}

/// Criteria for bulk deletion. Only `service` and `end_date` apply; rows
/// strictly older than `end_date` are removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCriteria {
    pub service: Option<String>,
    pub end_date: Option<String>,
}

impl DeleteCriteria {
    pub fn to_deletion(&self) -> Deletion {
        Deletion {
            service: non_empty(&self.service),
            before: non_empty(&self.end_date),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

/// Everything is pushed to the store, pagination included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimplePlan {
    pub selection: Selection,
}

/// Candidate rows come from the store; terms, offset and limit are applied
/// in memory. The store-side selection never carries an offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPlan {
    pub selection: Selection,
    pub terms: Vec<SearchTerm>,
    pub candidate_budget: usize,
    pub limit: Option<usize>,
    pub offset: usize,
}

/// How a request will be executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionPlan {
    Simple(SimplePlan),
    Scan(ScanPlan),
}

impl ExecutionPlan {
    /// Plan `criteria`. The query string, if advanced, is parsed exactly once
    /// here.
    pub fn build(criteria: &QueryCriteria, config: &QueryConfig) -> Self {
        let predicates = criteria.predicates();

        match criteria.query_str() {
            Some(query) if is_advanced(query) => {
                let candidate_budget = criteria
                    .limit
                    .unwrap_or(config.default_scan_limit)
                    .max(config.scan_floor);
                ExecutionPlan::Scan(ScanPlan {
                    selection: Selection {
                        predicates,
                        contains: None,
                        limit: Some(candidate_budget),
                        offset: None,
                    },
                    terms: parse(query),
                    candidate_budget,
                    limit: criteria.limit,
                    offset: criteria.offset.unwrap_or(0),
                })
            }
            query => ExecutionPlan::Simple(SimplePlan {
                selection: Selection {
                    predicates,
                    contains: query.map(str::to_string),
                    limit: criteria.limit,
                    offset: criteria.offset,
                },
            }),
        }
    }

    pub fn is_scan(&self) -> bool {
        matches!(self, ExecutionPlan::Scan(_))
    }

    pub fn selection(&self) -> &Selection {
        match self {
            ExecutionPlan::Simple(p) => &p.selection,
            ExecutionPlan::Scan(p) => &p.selection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("level:error", true)]
    #[case("-debug", true)]
    #[case("*", true)]
    #[case("\"quoted\"", true)]
    #[case("api-gateway", true)]
    #[case("timeout", false)]
    #[case("connection refused", false)]
    #[case("", false)]
    fn classification(#[case] query: &str, #[case] advanced: bool) {
        assert_eq!(is_advanced(query), advanced);
    }

    #[test]
    fn simple_plan_pushes_everything_down() {
        let criteria = QueryCriteria::new()
            .with_query("timeout")
            .with_level("error")
            .with_limit(50)
            .with_offset(10);
        let plan = ExecutionPlan::build(&criteria, &QueryConfig::default());
        assert_eq!(
            plan,
            ExecutionPlan::Simple(SimplePlan {
                selection: Selection {
                    predicates: Predicates {
                        level: Some("error".into()),
                        ..Default::default()
                    },
                    contains: Some("timeout".into()),
                    limit: Some(50),
                    offset: Some(10),
                },
            })
        );
    }

    #[test]
    fn scan_plan_enlarges_budget_and_drops_store_offset() {
        let criteria = QueryCriteria::new()
            .with_query("service:*gateway*")
            .with_service("api")
            .with_limit(20)
            .with_offset(40);
        let ExecutionPlan::Scan(plan) = ExecutionPlan::build(&criteria, &QueryConfig::default())
        else {
            panic!("expected a scan plan");
        };
        assert_eq!(plan.candidate_budget, 5000);
        assert_eq!(plan.selection.limit, Some(5000));
        assert_eq!(plan.selection.offset, None);
        assert_eq!(plan.selection.contains, None);
        assert_eq!(plan.selection.predicates.service.as_deref(), Some("api"));
        assert_eq!(plan.limit, Some(20));
        assert_eq!(plan.offset, 40);
        assert_eq!(plan.terms, parse("service:*gateway*"));
    }

    #[rstest]
    #[case(Some(10), 5000)]
    #[case(Some(7500), 7500)]
    #[case(None, 5000)]
    fn candidate_budget_is_floored(#[case] limit: Option<usize>, #[case] budget: usize) {
        let criteria = QueryCriteria {
            query: Some("level:info".into()),
            limit,
            ..Default::default()
        };
        match ExecutionPlan::build(&criteria, &QueryConfig::default()) {
            ExecutionPlan::Scan(p) => assert_eq!(p.candidate_budget, budget),
            other => panic!("expected scan, got {other:?}"),
        }
    }

    #[test]
    fn missing_limit_uses_default_scan_limit_when_above_floor() {
        let config = QueryConfig {
            scan_floor: 10,
            default_scan_limit: 1000,
        };
        let criteria = QueryCriteria::new().with_query("a:b");
        match ExecutionPlan::build(&criteria, &config) {
            ExecutionPlan::Scan(p) => assert_eq!(p.candidate_budget, 1000),
            other => panic!("expected scan, got {other:?}"),
        }
    }

    #[test]
    fn empty_strings_are_absent() {
        let criteria = QueryCriteria {
            query: Some(String::new()),
            level: Some(String::new()),
            ..Default::default()
        };
        let plan = ExecutionPlan::build(&criteria, &QueryConfig::default());
        assert!(!plan.is_scan());
        assert_eq!(plan.selection(), &Selection::default());
    }

    #[test]
    fn delete_criteria_maps_end_date_to_before() {
        let d = DeleteCriteria {
            service: Some("api".into()),
            end_date: Some("2024-01-01".into()),
        }
        .to_deletion();
        assert_eq!(d.service.as_deref(), Some("api"));
        assert_eq!(d.before.as_deref(), Some("2024-01-01"));
    }

    proptest! {
        #[test]
        fn budget_covers_limit_and_floor(
            limit in proptest::option::of(0usize..20_000),
            scan_floor in 0usize..10_000,
            default_scan_limit in 0usize..10_000,
            offset in proptest::option::of(0usize..500),
        ) {
            let config = QueryConfig { scan_floor, default_scan_limit };
            let criteria = QueryCriteria {
                query: Some("level:error".into()),
                limit,
                offset,
                ..Default::default()
            };
            let ExecutionPlan::Scan(plan) = ExecutionPlan::build(&criteria, &config) else {
                panic!("advanced query must scan");
            };
            prop_assert!(plan.candidate_budget >= scan_floor);
            prop_assert!(plan.candidate_budget >= limit.unwrap_or(default_scan_limit));
            prop_assert_eq!(plan.selection.offset, None);
            prop_assert_eq!(plan.offset, offset.unwrap_or(0));
        }
    }
}
