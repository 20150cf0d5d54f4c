mod baby;
mod config_cmd;
mod question;
mod sleep;

pub use baby::BabyCommand;
pub use config_cmd::ConfigCommand;
pub use question::QuestionCommand;
pub use sleep::SleepCommand;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use nestling_core::{DualWriteResult, ReadResult};

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Primary outcome of a write. A secondary failure was already logged by the
/// service and is not returned.
fn primary_outcome<T>(result: DualWriteResult<T>) -> Result<Option<T>, Box<dyn std::error::Error>> {
    Ok(result.primary.into_result()?)
}

/// Like [`primary_outcome`], for writes that always return a record.
fn written<T>(result: DualWriteResult<T>) -> Result<T, Box<dyn std::error::Error>> {
    primary_outcome(result)?.ok_or_else(|| "Backend returned no record".into())
}

fn read_data<T>(result: ReadResult<T>) -> Result<Option<T>, Box<dyn std::error::Error>> {
    let source = result.source;
    result
        .into_result()
        .map_err(|e| format!("Read from {} backend failed: {}", source, e).into())
}

/// Parses an RFC 3339 timestamp from the command line.
fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("Invalid time '{}': {} (expected RFC 3339)", s, e))
}
