//! Search layer: query parsing and in-memory term evaluation.
//!
//! [`parse`] turns a query string into [`SearchTerm`]s; [`filter`] keeps the
//! records for which every term holds.

pub mod filter;
pub mod parser;

pub use filter::{filter, filter_by_query, matches, stringify, term_matches};
pub use parser::{parse, SearchTerm, TermKind};
