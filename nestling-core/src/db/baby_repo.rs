use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{format_timestamp, parse_optional_date, parse_timestamp};
use crate::backend::BackendKind;
use crate::error::DataError;
use crate::models::{Baby, BabyPatch, NewBaby, RecordId, Sex};
use crate::store::BabyStore;

#[derive(Clone)]
pub struct BabyRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct BabyRow {
    id: String,
    name: String,
    birth_date: Option<String>,
    due_date: Option<String>,
    sex: Option<String>,
    photo_url: Option<String>,
    owner_id: String,
    created_at: String,
    updated_at: String,
}

impl BabyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, id: &str) -> Result<Option<Baby>, DataError> {
        let row: Option<BabyRow> = sqlx::query_as("SELECT * FROM babies WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => self.hydrate(row).await.map(Some),
            None => Ok(None),
        }
    }

    async fn fetch_existing(&self, id: &RecordId) -> Result<Baby, DataError> {
        self.fetch(id.as_str())
            .await?
            .ok_or_else(|| DataError::not_found("Baby", id))
    }

    async fn hydrate(&self, row: BabyRow) -> Result<Baby, DataError> {
        let shared_with: Vec<(String,)> = sqlx::query_as(
            "SELECT user_id FROM baby_shares WHERE baby_id = ? ORDER BY created_at, user_id",
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;

        let sex = match row.sex.as_deref() {
            Some(s) => Some(s.parse::<Sex>().map_err(DataError::InvalidRecord)?),
            None => None,
        };

        Ok(Baby {
            id: RecordId::new(row.id),
            name: row.name,
            birth_date: parse_optional_date("birth_date", row.birth_date.as_deref())?,
            due_date: parse_optional_date("due_date", row.due_date.as_deref())?,
            sex,
            photo_url: row.photo_url,
            owner_id: row.owner_id,
            shared_with: shared_with.into_iter().map(|(u,)| u).collect(),
            created_at: parse_timestamp("created_at", &row.created_at)?,
            updated_at: parse_timestamp("updated_at", &row.updated_at)?,
        })
    }
}

#[async_trait]
impl BabyStore for BabyRepository {
    fn kind(&self) -> BackendKind {
        BackendKind::Relational
    }

    async fn list_visible(&self, user_id: &str) -> Result<Vec<Baby>, DataError> {
        let rows: Vec<BabyRow> = sqlx::query_as(
            r#"
            SELECT * FROM babies
            WHERE owner_id = ?
               OR id IN (SELECT baby_id FROM baby_shares WHERE user_id = ?)
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut babies = Vec::with_capacity(rows.len());
        for row in rows {
            babies.push(self.hydrate(row).await?);
        }
        Ok(babies)
    }

    async fn get(&self, id: &RecordId) -> Result<Option<Baby>, DataError> {
        self.fetch(id.as_str()).await
    }

    async fn create(&self, baby: &NewBaby) -> Result<Baby, DataError> {
        let id = Uuid::new_v4().to_string();
        let now = format_timestamp(&Utc::now());

        sqlx::query(
            r#"
            INSERT INTO babies (id, name, birth_date, due_date, sex, photo_url, owner_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&baby.name)
        .bind(baby.birth_date.map(|d| d.to_string()))
        .bind(baby.due_date.map(|d| d.to_string()))
        .bind(baby.sex.map(|s| s.to_string()))
        .bind(&baby.photo_url)
        .bind(&baby.owner_id)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        tracing::debug!(%id, "baby created in relational store");

        self.fetch(&id)
            .await?
            .ok_or_else(|| DataError::not_found("Baby", &id))
    }

    async fn update(&self, id: &RecordId, patch: &BabyPatch) -> Result<Baby, DataError> {
        let mut baby = self.fetch_existing(id).await?;
        patch.apply(&mut baby);

        let result = sqlx::query(
            r#"
            UPDATE babies
            SET name = ?, birth_date = ?, due_date = ?, sex = ?, photo_url = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&baby.name)
        .bind(baby.birth_date.map(|d| d.to_string()))
        .bind(baby.due_date.map(|d| d.to_string()))
        .bind(baby.sex.map(|s| s.to_string()))
        .bind(&baby.photo_url)
        .bind(format_timestamp(&Utc::now()))
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DataError::not_found("Baby", id));
        }
        self.fetch_existing(id).await
    }

    async fn delete(&self, id: &RecordId) -> Result<(), DataError> {
        let result = sqlx::query("DELETE FROM babies WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DataError::not_found("Baby", id));
        }
        Ok(())
    }

    async fn share(&self, id: &RecordId, user_id: &str) -> Result<Baby, DataError> {
        let baby = self.fetch_existing(id).await?;
        if baby.owner_id == user_id {
            return Ok(baby);
        }

        sqlx::query("INSERT OR IGNORE INTO baby_shares (baby_id, user_id, created_at) VALUES (?, ?, ?)")
            .bind(id.as_str())
            .bind(user_id)
            .bind(format_timestamp(&Utc::now()))
            .execute(&self.pool)
            .await?;

        self.fetch_existing(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    async fn setup() -> (BabyRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&temp_dir.path().join("test.db")).await.unwrap();
        (BabyRepository::new(pool), temp_dir)
    }

    #[tokio::test]
    async fn test_create_and_get_baby() {
        let (repo, _temp) = setup().await;
        let due = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();

        let created = repo
            .create(&NewBaby::new("Ada", "mum").with_due_date(due))
            .await
            .unwrap();

        assert!(Uuid::parse_str(created.id.as_str()).is_ok());
        assert_eq!(created.name, "Ada");
        assert_eq!(created.due_date, Some(due));
        assert!(created.shared_with.is_empty());

        let fetched = repo.get(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_list_visible_via_owner_or_share() {
        let (repo, _temp) = setup().await;

        let ada = repo.create(&NewBaby::new("Ada", "mum")).await.unwrap();
        let bo = repo.create(&NewBaby::new("Bo", "nan")).await.unwrap();
        repo.create(&NewBaby::new("Cy", "stranger")).await.unwrap();

        repo.share(&bo.id, "mum").await.unwrap();

        let visible = repo.list_visible("mum").await.unwrap();
        let names: Vec<&str> = visible.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Ada", "Bo"]);
        assert_eq!(visible[0].id, ada.id);
        assert_eq!(visible[1].shared_with, vec!["mum".to_string()]);
    }

    #[tokio::test]
    async fn test_share_is_idempotent() {
        let (repo, _temp) = setup().await;
        let baby = repo.create(&NewBaby::new("Ada", "mum")).await.unwrap();

        repo.share(&baby.id, "dad").await.unwrap();
        let shared = repo.share(&baby.id, "dad").await.unwrap();
        assert_eq!(shared.shared_with, vec!["dad".to_string()]);

        let owner_share = repo.share(&baby.id, "mum").await.unwrap();
        assert_eq!(owner_share.shared_with, vec!["dad".to_string()]);
    }

    #[tokio::test]
    async fn test_update_baby() {
        let (repo, _temp) = setup().await;
        let baby = repo.create(&NewBaby::new("Ada", "mum")).await.unwrap();
        let born = NaiveDate::from_ymd_opt(2025, 8, 28).unwrap();

        let patch = BabyPatch {
            birth_date: Some(born),
            sex: Some(Sex::Female),
            ..Default::default()
        };
        let updated = repo.update(&baby.id, &patch).await.unwrap();

        assert_eq!(updated.name, "Ada");
        assert_eq!(updated.birth_date, Some(born));
        assert_eq!(updated.sex, Some(Sex::Female));
        assert!(updated.updated_at >= baby.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_baby() {
        let (repo, _temp) = setup().await;
        let err = repo
            .update(&RecordId::new("missing"), &BabyPatch::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_baby_removes_shares() {
        let (repo, _temp) = setup().await;
        let baby = repo.create(&NewBaby::new("Ada", "mum")).await.unwrap();
        repo.share(&baby.id, "dad").await.unwrap();

        repo.delete(&baby.id).await.unwrap();

        assert!(repo.get(&baby.id).await.unwrap().is_none());
        assert!(repo.list_visible("dad").await.unwrap().is_empty());
        assert!(repo.delete(&baby.id).await.unwrap_err().is_not_found());
    }
}
