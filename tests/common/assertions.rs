//! Domain-specific assertion macros for mrelic harnesses.
//!
//! These wrap `pretty_assertions` and add failure messages that say which
//! query invariant was violated.

use mrelic_core::LogRecord;

/// Assert the exact message sequence of a record slice.
///
/// ```rust
/// assert_messages!(result.records, ["newest", "older"]);
/// ```
#[macro_export]
macro_rules! assert_messages {
    ($records:expr, [$($msg:expr),* $(,)?]) => {{
        let actual: Vec<&str> = $records.iter().map(|r| r.message.as_str()).collect();
        let expected: Vec<&str> = vec![$($msg),*];
        pretty_assertions::assert_eq!(actual, expected, "message sequence mismatch");
    }};
}

/// Assert that records are ordered by timestamp, newest first.
#[macro_export]
macro_rules! assert_newest_first {
    ($records:expr) => {{
        let records: &[mrelic_core::LogRecord] = &$records;
        for pair in records.windows(2) {
            if pair[0].timestamp < pair[1].timestamp {
                panic!(
                    "assert_newest_first! failed:\n  {} ({}) precedes {} ({})",
                    pair[0].id, pair[0].timestamp, pair[1].id, pair[1].timestamp
                );
            }
        }
    }};
}

/// Assert a predicate over every record, naming the first offender.
///
/// ```rust
/// assert_all!(records, |r| r.level == "error");
/// ```
#[macro_export]
macro_rules! assert_all {
    ($records:expr, $pred:expr) => {{
        if let Some(record) = first_violation(&$records, $pred) {
            panic!(
                "assert_all! failed on record {}:\n  {}",
                record.id,
                record.to_flat_json()
            );
        }
    }};
}

/// First record failing `pred`, if any. Backs [`assert_all!`].
pub fn first_violation<F>(records: &[LogRecord], pred: F) -> Option<&LogRecord>
where
    F: Fn(&LogRecord) -> bool,
{
    records.iter().find(|r| !pred(r))
}

/// Assert that a record carries attribute `key` with the given JSON value.
#[macro_export]
macro_rules! assert_attr {
    ($record:expr, $key:expr, $value:tt) => {{
        let record: &mrelic_core::LogRecord = &$record;
        let key: &str = $key;
        let expected = serde_json::json!($value);
        match record.attributes.get(key) {
            Some(actual) => pretty_assertions::assert_eq!(actual, &expected, "attribute {:?}", key),
            None => panic!(
                "assert_attr! failed: attribute {:?} missing.\n  Available: {:?}",
                key,
                record.attributes.keys().collect::<Vec<_>>()
            ),
        }
    }};
}
