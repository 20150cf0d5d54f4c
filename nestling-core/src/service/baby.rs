use std::sync::Arc;

use super::DataService;
use crate::backend::{BackendKind, WritePolicy};
use crate::models::{Baby, BabyPatch, NewBaby, RecordId};
use crate::result::{DualWriteResult, ReadResult};
use crate::store::BabyStore;

/// Baby profiles, across both backends.
#[derive(Clone)]
pub struct BabyService {
    inner: DataService<dyn BabyStore>,
}

impl BabyService {
    pub fn new(
        relational: Arc<dyn BabyStore>,
        document: Arc<dyn BabyStore>,
        active: BackendKind,
    ) -> Self {
        Self {
            inner: DataService::new(relational, document, active),
        }
    }

    pub fn with_write_policy(mut self, write_policy: WritePolicy) -> Self {
        self.inner = self.inner.with_write_policy(write_policy);
        self
    }

    pub fn active(&self) -> BackendKind {
        self.inner.active()
    }

    /// Babies `user_id` owns or has been shared.
    pub async fn list_babies(&self, user_id: &str) -> ReadResult<Vec<Baby>> {
        tracing::debug!(user_id, backend = %self.active(), "listing babies");
        self.inner.read(|store| store.list_visible(user_id)).await
    }

    /// A missing baby is `data: None` with no error.
    pub async fn get_baby(&self, id: &RecordId) -> ReadResult<Baby> {
        let result = self.inner.read(|store| store.get(id)).await;
        ReadResult {
            data: result.data.flatten(),
            error: result.error,
            source: result.source,
        }
    }

    pub async fn create_baby(&self, baby: &NewBaby) -> DualWriteResult<Baby> {
        self.inner.write(|store| store.create(baby)).await
    }

    pub async fn update_baby(&self, id: &RecordId, patch: &BabyPatch) -> DualWriteResult<Baby> {
        self.inner.write(|store| store.update(id, patch)).await
    }

    pub async fn delete_baby(&self, id: &RecordId) -> DualWriteResult<()> {
        self.inner.write(|store| store.delete(id)).await
    }

    /// Makes the baby visible to `user_id`.
    pub async fn share_baby(&self, id: &RecordId, user_id: &str) -> DualWriteResult<Baby> {
        self.inner.write(|store| store.share(id, user_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataError;
    use crate::models::Sex;
    use crate::service::fakes::{backends, BrokenStore};

    #[tokio::test]
    async fn test_reads_and_writes_active_backend_only() {
        let b = backends().await;
        let service = BabyService::new(
            Arc::new(b.babies.clone()),
            Arc::new(b.documents.clone()),
            BackendKind::Document,
        );

        let created = service.create_baby(&NewBaby::new("Ada", "mum")).await;
        assert!(created.success);
        assert!(created.secondary.data.is_none());
        assert!(created.secondary.error.is_none());

        let listed = service.list_babies("mum").await;
        assert_eq!(listed.source, BackendKind::Document);
        assert_eq!(listed.data.unwrap().len(), 1);

        assert!(b.babies.list_visible("mum").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_share_and_delete() {
        let b = backends().await;
        let service = BabyService::new(
            Arc::new(b.babies.clone()),
            Arc::new(b.documents.clone()),
            BackendKind::Relational,
        );

        let baby = service
            .create_baby(&NewBaby::new("Ada", "mum"))
            .await
            .primary
            .data
            .unwrap();

        let patch = BabyPatch {
            sex: Some(Sex::Female),
            ..Default::default()
        };
        let updated = service.update_baby(&baby.id, &patch).await;
        assert!(updated.success);
        assert_eq!(updated.primary.data.unwrap().sex, Some(Sex::Female));

        let shared = service.share_baby(&baby.id, "dad").await;
        assert!(shared.success);
        assert_eq!(service.list_babies("dad").await.data.unwrap().len(), 1);

        assert!(service.delete_baby(&baby.id).await.success);
        let fetched = service.get_baby(&baby.id).await;
        assert!(fetched.is_ok());
        assert!(fetched.data.is_none());
    }

    #[tokio::test]
    async fn test_update_missing_baby_reports_not_found() {
        let b = backends().await;
        let service = BabyService::new(
            Arc::new(b.babies.clone()),
            Arc::new(b.documents.clone()),
            BackendKind::Relational,
        );

        let result = service
            .update_baby(&RecordId::new("nope"), &BabyPatch::default())
            .await;

        assert!(!result.success);
        assert!(result.primary.error.unwrap().is_not_found());
    }

    #[tokio::test]
    async fn test_failed_read_is_returned_as_data() {
        let b = backends().await;
        let service = BabyService::new(
            BrokenStore::failing(BackendKind::Relational),
            Arc::new(b.documents.clone()),
            BackendKind::Relational,
        );

        let result = service.list_babies("mum").await;

        assert!(result.data.is_none());
        assert_eq!(
            result.error,
            Some(DataError::Database("backend down".to_string()))
        );
        assert_eq!(result.source, BackendKind::Relational);
    }

    #[tokio::test]
    async fn test_panicking_backend_read_is_caught() {
        let b = backends().await;
        let service = BabyService::new(
            Arc::new(b.babies.clone()),
            BrokenStore::panicking(BackendKind::Document),
            BackendKind::Document,
        );

        let result = service.get_baby(&RecordId::new("x")).await;

        assert!(result.data.is_none());
        assert!(matches!(result.error, Some(DataError::Panicked(_))));
        assert_eq!(result.source, BackendKind::Document);
    }

    #[tokio::test]
    async fn test_dual_policy_mirrors_creates() {
        let b = backends().await;
        let service = BabyService::new(
            Arc::new(b.babies.clone()),
            Arc::new(b.documents.clone()),
            BackendKind::Relational,
        )
        .with_write_policy(WritePolicy::Dual {
            primary: BackendKind::Relational,
        });

        let created = service.create_baby(&NewBaby::new("Ada", "mum")).await;

        assert!(created.success);
        assert_eq!(created.primary.data.unwrap().name, "Ada");
        assert_eq!(created.secondary.data.unwrap().name, "Ada");
        assert_eq!(b.babies.list_visible("mum").await.unwrap().len(), 1);
        assert_eq!(
            BabyStore::list_visible(&b.documents, "mum").await.unwrap().len(),
            1
        );
    }
}
