//! Relational backend: SQLite through sqlx.
//!
//! Row shapes use snake_case columns, UUID string ids, RFC 3339 timestamps
//! and `YYYY-MM-DD` dates. Each repository maps its rows into the canonical
//! models before handing them out.

mod baby_repo;
mod question_repo;
mod sleep_repo;

pub use baby_repo::BabyRepository;
pub use question_repo::QuestionRepository;
pub use sleep_repo::SleepRepository;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use crate::error::DataError;

/// Initialize the database connection pool and run migrations
pub async fn init_db(path: &Path) -> Result<SqlitePool, sqlx::Error> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .foreign_keys(true)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::debug!(path = %path.display(), "relational store ready");

    Ok(pool)
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    // Fixed-width so that ORDER BY on the text column is chronological.
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, DataError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DataError::InvalidRecord(format!("{} '{}': {}", column, value, e)))
}

fn parse_optional_timestamp(
    column: &str,
    value: Option<&str>,
) -> Result<Option<DateTime<Utc>>, DataError> {
    value.map(|v| parse_timestamp(column, v)).transpose()
}

fn parse_optional_date(column: &str, value: Option<&str>) -> Result<Option<NaiveDate>, DataError> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(v, "%Y-%m-%d")
                .map_err(|e| DataError::InvalidRecord(format!("{} '{}': {}", column, v, e)))
        })
        .transpose()
}
