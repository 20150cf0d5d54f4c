use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{format_timestamp, parse_optional_timestamp, parse_timestamp};
use crate::backend::BackendKind;
use crate::error::DataError;
use crate::models::{DoctorQuestion, NewDoctorQuestion, RecordId};
use crate::store::QuestionStore;

#[derive(Clone)]
pub struct QuestionRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct QuestionRow {
    id: String,
    client_ref: String,
    user_id: String,
    question: String,
    answer: Option<String>,
    category: Option<String>,
    answered_at: Option<String>,
    created_at: String,
}

impl TryFrom<QuestionRow> for DoctorQuestion {
    type Error = DataError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let client_ref = Uuid::parse_str(&row.client_ref).map_err(|e| {
            DataError::InvalidRecord(format!("client_ref '{}': {}", row.client_ref, e))
        })?;

        Ok(DoctorQuestion {
            id: RecordId::new(row.id),
            client_ref,
            user_id: row.user_id,
            question: row.question,
            answer: row.answer,
            category: row.category,
            answered_at: parse_optional_timestamp("answered_at", row.answered_at.as_deref())?,
            created_at: parse_timestamp("created_at", &row.created_at)?,
        })
    }
}

impl QuestionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_by_ref(&self, client_ref: Uuid) -> Result<Option<DoctorQuestion>, DataError> {
        let row: Option<QuestionRow> =
            sqlx::query_as("SELECT * FROM doctor_questions WHERE client_ref = ?")
                .bind(client_ref.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(DoctorQuestion::try_from).transpose()
    }
}

#[async_trait]
impl QuestionStore for QuestionRepository {
    fn kind(&self) -> BackendKind {
        BackendKind::Relational
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<DoctorQuestion>, DataError> {
        let rows: Vec<QuestionRow> = sqlx::query_as(
            "SELECT * FROM doctor_questions WHERE user_id = ? ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DoctorQuestion::try_from).collect()
    }

    async fn create(&self, question: &NewDoctorQuestion) -> Result<DoctorQuestion, DataError> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO doctor_questions (id, client_ref, user_id, question, category, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(question.client_ref.to_string())
        .bind(&question.user_id)
        .bind(&question.question)
        .bind(&question.category)
        .bind(format_timestamp(&Utc::now()))
        .execute(&self.pool)
        .await?;

        self.fetch_by_ref(question.client_ref)
            .await?
            .ok_or_else(|| DataError::not_found("DoctorQuestion", &id))
    }

    async fn answer(
        &self,
        client_ref: Uuid,
        answer: &str,
        answered_at: DateTime<Utc>,
    ) -> Result<DoctorQuestion, DataError> {
        let result = sqlx::query(
            "UPDATE doctor_questions SET answer = ?, answered_at = ? WHERE client_ref = ?",
        )
        .bind(answer)
        .bind(format_timestamp(&answered_at))
        .bind(client_ref.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DataError::not_found("DoctorQuestion", client_ref));
        }

        self.fetch_by_ref(client_ref)
            .await?
            .ok_or_else(|| DataError::not_found("DoctorQuestion", client_ref))
    }

    async fn delete(&self, client_ref: Uuid) -> Result<(), DataError> {
        let result = sqlx::query("DELETE FROM doctor_questions WHERE client_ref = ?")
            .bind(client_ref.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DataError::not_found("DoctorQuestion", client_ref));
        }
        Ok(())
    }
}
