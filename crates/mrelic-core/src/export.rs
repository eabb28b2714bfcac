//! Output rendering for query results.

use std::fmt;
use std::str::FromStr;

use crate::types::LogRecord;

/// How a record is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// `timestamp [LEVEL] service: message`
    #[default]
    Raw,
    /// One flat JSON object per line.
    Jsonl,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw" => Ok(OutputFormat::Raw),
            "jsonl" | "json" => Ok(OutputFormat::Jsonl),
            other => Err(format!("unknown output format {other:?} (expected raw or jsonl)")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Raw => write!(f, "raw"),
            OutputFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

/// Render one record as a single line, without the trailing newline.
pub fn render(record: &LogRecord, format: OutputFormat) -> String {
    match format {
        OutputFormat::Raw => format!(
            "{} [{}] {}: {}",
            record.timestamp,
            record.level.to_uppercase(),
            record.service,
            record.message
        ),
        OutputFormat::Jsonl => record.to_flat_json().to_string(),
    }
}
