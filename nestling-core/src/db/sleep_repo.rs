use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{format_timestamp, parse_optional_timestamp, parse_timestamp};
use crate::backend::BackendKind;
use crate::error::DataError;
use crate::models::{NewSleepEntry, RecordId, SleepEntry, SleepPatch};
use crate::store::SleepStore;

#[derive(Clone)]
pub struct SleepRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct SleepRow {
    id: String,
    baby_id: String,
    user_id: String,
    start_time: String,
    end_time: Option<String>,
    duration_minutes: Option<i64>,
    notes: Option<String>,
    created_at: String,
}

impl TryFrom<SleepRow> for SleepEntry {
    type Error = DataError;

    fn try_from(row: SleepRow) -> Result<Self, Self::Error> {
        Ok(SleepEntry {
            id: RecordId::new(row.id),
            baby_id: RecordId::new(row.baby_id),
            user_id: row.user_id,
            start_time: parse_timestamp("start_time", &row.start_time)?,
            end_time: parse_optional_timestamp("end_time", row.end_time.as_deref())?,
            duration_minutes: row.duration_minutes,
            notes: row.notes,
            created_at: parse_timestamp("created_at", &row.created_at)?,
        })
    }
}

impl SleepRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, id: &str) -> Result<Option<SleepEntry>, DataError> {
        let row: Option<SleepRow> = sqlx::query_as("SELECT * FROM sleep_entries WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(SleepEntry::try_from).transpose()
    }
}

#[async_trait]
impl SleepStore for SleepRepository {
    fn kind(&self) -> BackendKind {
        BackendKind::Relational
    }

    async fn list_for_baby(&self, baby_id: &RecordId) -> Result<Vec<SleepEntry>, DataError> {
        let rows: Vec<SleepRow> = sqlx::query_as(
            "SELECT * FROM sleep_entries WHERE baby_id = ? ORDER BY start_time DESC",
        )
        .bind(baby_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SleepEntry::try_from).collect()
    }

    async fn get(&self, id: &RecordId) -> Result<Option<SleepEntry>, DataError> {
        self.fetch(id.as_str()).await
    }

    async fn create(&self, entry: &NewSleepEntry) -> Result<SleepEntry, DataError> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO sleep_entries (id, baby_id, user_id, start_time, end_time, duration_minutes, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(entry.baby_id.as_str())
        .bind(&entry.user_id)
        .bind(format_timestamp(&entry.start_time))
        .bind(entry.end_time.as_ref().map(format_timestamp))
        .bind(entry.duration_minutes())
        .bind(&entry.notes)
        .bind(format_timestamp(&Utc::now()))
        .execute(&self.pool)
        .await?;

        self.fetch(&id)
            .await?
            .ok_or_else(|| DataError::not_found("SleepEntry", &id))
    }

    async fn update(&self, id: &RecordId, patch: &SleepPatch) -> Result<SleepEntry, DataError> {
        let mut entry = self
            .fetch(id.as_str())
            .await?
            .ok_or_else(|| DataError::not_found("SleepEntry", id))?;
        patch.apply(&mut entry);

        let result = sqlx::query(
            r#"
            UPDATE sleep_entries
            SET start_time = ?, end_time = ?, duration_minutes = ?, notes = ?
            WHERE id = ?
            "#,
        )
        .bind(format_timestamp(&entry.start_time))
        .bind(entry.end_time.as_ref().map(format_timestamp))
        .bind(entry.duration_minutes)
        .bind(&entry.notes)
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DataError::not_found("SleepEntry", id));
        }
        Ok(entry)
    }

    async fn delete(&self, id: &RecordId) -> Result<(), DataError> {
        let result = sqlx::query("DELETE FROM sleep_entries WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DataError::not_found("SleepEntry", id));
        }
        Ok(())
    }
}
