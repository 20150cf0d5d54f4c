use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use super::DataService;
use crate::backend::{BackendKind, WritePolicy};
use crate::error::DataError;
use crate::models::{NewSleepEntry, RecordId, SleepEntry, SleepPatch};
use crate::result::{DualWriteResult, OpResult, ReadResult};
use crate::store::SleepStore;

/// Running entries older than this are closed automatically when read.
pub const MAX_ACTIVE_SLEEP_DURATION_MINUTES: i64 = 720;

/// Sleep entries, across both backends.
///
/// Reading a baby's entries also closes any entry that has been running for
/// longer than the maximum active duration; see [`SleepService::get_entries`].
#[derive(Clone)]
pub struct SleepService {
    inner: DataService<dyn SleepStore>,
    max_active_duration: Duration,
}

impl SleepService {
    pub fn new(
        relational: Arc<dyn SleepStore>,
        document: Arc<dyn SleepStore>,
        active: BackendKind,
    ) -> Self {
        Self {
            inner: DataService::new(relational, document, active),
            max_active_duration: Duration::minutes(MAX_ACTIVE_SLEEP_DURATION_MINUTES),
        }
    }

    pub fn with_write_policy(mut self, write_policy: WritePolicy) -> Self {
        self.inner = self.inner.with_write_policy(write_policy);
        self
    }

    pub fn with_max_active_duration(mut self, max_active_duration: Duration) -> Self {
        self.max_active_duration = max_active_duration;
        self
    }

    pub fn active(&self) -> BackendKind {
        self.inner.active()
    }

    pub fn max_active_duration(&self) -> Duration {
        self.max_active_duration
    }

    /// Entries for one baby, most recent first.
    ///
    /// Every running entry older than the maximum active duration is closed
    /// at `start_time + max` on the backend it was read from, one at a time.
    /// A close that fails is logged and the entry is returned as it was read.
    pub async fn get_entries(&self, baby_id: &RecordId) -> ReadResult<Vec<SleepEntry>> {
        self.get_entries_at(baby_id, Utc::now()).await
    }

    /// [`get_entries`](Self::get_entries) with an explicit clock.
    pub async fn get_entries_at(
        &self,
        baby_id: &RecordId,
        now: DateTime<Utc>,
    ) -> ReadResult<Vec<SleepEntry>> {
        let mut result = self.inner.read(|store| store.list_for_baby(baby_id)).await;
        let source = result.source;

        if let Some(entries) = result.data.as_mut() {
            self.close_stale_entries(entries, source, now).await;
        }

        result
    }

    async fn close_stale_entries(
        &self,
        entries: &mut [SleepEntry],
        source: BackendKind,
        now: DateTime<Utc>,
    ) {
        let max = self.max_active_duration;

        for entry in entries.iter_mut() {
            if !entry.is_stale(now, max) {
                continue;
            }

            let id = entry.id.clone();
            let patch = SleepPatch {
                end_time: Some(entry.start_time + max),
                duration_minutes: Some(max.num_minutes()),
                ..Default::default()
            };

            let outcome = self
                .inner
                .write_to(source, |store| store.update(&id, &patch))
                .await;

            match (outcome.data, outcome.error) {
                (_, Some(err)) => tracing::warn!(
                    entry_id = %id,
                    backend = %source,
                    error = %err,
                    "failed to auto-close stale sleep entry"
                ),
                (Some(updated), None) => {
                    tracing::info!(
                        entry_id = %id,
                        baby_id = %updated.baby_id,
                        max_minutes = max.num_minutes(),
                        "auto-closed stale sleep entry"
                    );
                    *entry = updated;
                }
                (None, None) => {}
            }
        }
    }

    /// The baby's running entry, if any, after stale entries are closed.
    pub async fn get_active_entry(&self, baby_id: &RecordId) -> ReadResult<SleepEntry> {
        let result = self.get_entries(baby_id).await;
        ReadResult {
            data: result
                .data
                .and_then(|entries| entries.into_iter().find(SleepEntry::is_active)),
            error: result.error,
            source: result.source,
        }
    }

    pub async fn start_sleep(&self, entry: &NewSleepEntry) -> DualWriteResult<SleepEntry> {
        self.inner.write(|store| store.create(entry)).await
    }

    /// Closes an entry at `end_time`, computing its duration from the start
    /// time stored on the active backend.
    pub async fn stop_sleep(
        &self,
        id: &RecordId,
        end_time: DateTime<Utc>,
    ) -> DualWriteResult<SleepEntry> {
        let current = self.inner.read(|store| store.get(id)).await;

        let entry = match current.into_result().map(Option::flatten) {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                return DualWriteResult::single(OpResult::err(DataError::not_found(
                    "SleepEntry",
                    id,
                )))
            }
            Err(err) => return DualWriteResult::single(OpResult::err(err)),
        };

        if end_time < entry.start_time {
            return DualWriteResult::single(OpResult::err(DataError::InvalidRecord(format!(
                "end time {} is before start time {}",
                end_time, entry.start_time
            ))));
        }

        self.update_entry(id, &SleepPatch::stop(entry.start_time, end_time))
            .await
    }

    pub async fn update_entry(
        &self,
        id: &RecordId,
        patch: &SleepPatch,
    ) -> DualWriteResult<SleepEntry> {
        self.inner.write(|store| store.update(id, patch)).await
    }

    pub async fn delete_entry(&self, id: &RecordId) -> DualWriteResult<()> {
        self.inner.write(|store| store.delete(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::fakes::{backends, BrokenStore};
    use async_trait::async_trait;
    use chrono::{SubsecRound, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Forwards to a real store, counting updates and how many overlap.
    struct CountingStore {
        inner: Arc<dyn SleepStore>,
        reject_updates: bool,
        updates: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl CountingStore {
        fn new(inner: Arc<dyn SleepStore>) -> Arc<Self> {
            Arc::new(Self {
                inner,
                reject_updates: false,
                updates: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            })
        }

        fn rejecting(inner: Arc<dyn SleepStore>) -> Arc<Self> {
            Arc::new(Self {
                inner,
                reject_updates: true,
                updates: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            })
        }

        fn updates(&self) -> usize {
            self.updates.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SleepStore for CountingStore {
        fn kind(&self) -> BackendKind {
            self.inner.kind()
        }

        async fn list_for_baby(&self, baby_id: &RecordId) -> Result<Vec<SleepEntry>, DataError> {
            self.inner.list_for_baby(baby_id).await
        }

        async fn get(&self, id: &RecordId) -> Result<Option<SleepEntry>, DataError> {
            self.inner.get(id).await
        }

        async fn create(&self, entry: &NewSleepEntry) -> Result<SleepEntry, DataError> {
            self.inner.create(entry).await
        }

        async fn update(&self, id: &RecordId, patch: &SleepPatch) -> Result<SleepEntry, DataError> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(running, Ordering::SeqCst);
            tokio::task::yield_now().await;

            let result = if self.reject_updates {
                Err(DataError::Database("update rejected".to_string()))
            } else {
                self.inner.update(id, patch).await
            };
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }

        async fn delete(&self, id: &RecordId) -> Result<(), DataError> {
            self.inner.delete(id).await
        }
    }

    fn baby() -> RecordId {
        RecordId::new("baby-1")
    }

    #[tokio::test]
    async fn test_stale_entry_is_closed_on_read() {
        let b = backends().await;
        let counting = CountingStore::new(Arc::new(b.sleep.clone()));
        let service = SleepService::new(
            counting.clone(),
            Arc::new(b.documents.clone()),
            BackendKind::Relational,
        );

        let start = Utc::now() - Duration::hours(20);
        service
            .start_sleep(&NewSleepEntry::new(baby(), "mum", start))
            .await;

        let result = service.get_entries(&baby()).await;

        assert!(result.is_ok());
        let entries = result.data.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].end_time,
            Some(start + Duration::minutes(MAX_ACTIVE_SLEEP_DURATION_MINUTES))
        );
        assert_eq!(
            entries[0].duration_minutes,
            Some(MAX_ACTIVE_SLEEP_DURATION_MINUTES)
        );
        assert_eq!(counting.updates(), 1);

        // Closed entries are left alone on the next read.
        service.get_entries(&baby()).await;
        assert_eq!(counting.updates(), 1);
    }

    #[tokio::test]
    async fn test_recent_entry_stays_active() {
        let b = backends().await;
        let counting = CountingStore::new(Arc::new(b.sleep.clone()));
        let service = SleepService::new(
            counting.clone(),
            Arc::new(b.documents.clone()),
            BackendKind::Relational,
        );

        let start = Utc::now() - Duration::hours(2);
        service
            .start_sleep(&NewSleepEntry::new(baby(), "mum", start))
            .await;

        let active = service.get_active_entry(&baby()).await;

        assert_eq!(active.data.unwrap().start_time, start);
        assert_eq!(counting.updates(), 0);
    }

    #[tokio::test]
    async fn test_failed_auto_close_keeps_original_entry() {
        let b = backends().await;
        let counting = CountingStore::rejecting(Arc::new(b.sleep.clone()));
        let service = SleepService::new(
            counting.clone(),
            Arc::new(b.documents.clone()),
            BackendKind::Relational,
        );

        let start = Utc::now() - Duration::hours(20);
        b.sleep
            .create(&NewSleepEntry::new(baby(), "mum", start))
            .await
            .unwrap();

        let result = service.get_entries(&baby()).await;

        assert!(result.is_ok());
        let entries = result.data.unwrap();
        assert!(entries[0].is_active());
        assert_eq!(counting.updates(), 1);
    }

    #[tokio::test]
    async fn test_stale_entries_are_closed_one_at_a_time() {
        let b = backends().await;
        let counting = CountingStore::new(Arc::new(b.sleep.clone()));
        let service = SleepService::new(
            counting.clone(),
            Arc::new(b.documents.clone()),
            BackendKind::Relational,
        );

        for hours in [30, 25, 20] {
            b.sleep
                .create(&NewSleepEntry::new(
                    baby(),
                    "mum",
                    Utc::now() - Duration::hours(hours),
                ))
                .await
                .unwrap();
        }

        let entries = service.get_entries(&baby()).await.data.unwrap();

        assert!(entries.iter().all(|e| !e.is_active()));
        assert_eq!(counting.updates(), 3);
        assert_eq!(counting.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_auto_close_on_document_backend() {
        let b = backends().await;
        let service = SleepService::new(
            Arc::new(b.sleep.clone()),
            Arc::new(b.documents.clone()),
            BackendKind::Document,
        )
        .with_max_active_duration(Duration::hours(8));

        let now = Utc.with_ymd_and_hms(2025, 3, 2, 9, 0, 0).unwrap();
        let start = now - Duration::hours(13);
        service
            .start_sleep(&NewSleepEntry::new(baby(), "mum", start))
            .await;

        let result = service.get_entries_at(&baby(), now).await;

        assert_eq!(result.source, BackendKind::Document);
        let entry = &result.data.unwrap()[0];
        assert_eq!(entry.end_time, Some(start + Duration::hours(8)));
        assert_eq!(entry.duration_minutes, Some(480));
    }

    #[tokio::test]
    async fn test_failed_read_skips_auto_close() {
        let b = backends().await;
        let service = SleepService::new(
            BrokenStore::failing(BackendKind::Relational),
            Arc::new(b.documents.clone()),
            BackendKind::Relational,
        );

        let result = service.get_entries(&baby()).await;

        assert!(result.data.is_none());
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_stop_sleep_computes_duration() {
        let b = backends().await;
        let service = SleepService::new(
            Arc::new(b.sleep.clone()),
            Arc::new(b.documents.clone()),
            BackendKind::Relational,
        );

        let start = Utc::now().trunc_subsecs(0) - Duration::minutes(95);
        let started = service
            .start_sleep(&NewSleepEntry::new(baby(), "mum", start))
            .await
            .primary
            .data
            .unwrap();

        let stopped = service
            .stop_sleep(&started.id, start + Duration::minutes(95))
            .await;

        assert!(stopped.success);
        let entry = stopped.primary.data.unwrap();
        assert_eq!(entry.duration_minutes, Some(95));
        assert!(!entry.is_active());
        assert!(service.get_active_entry(&baby()).await.data.is_none());
    }

    #[tokio::test]
    async fn test_stop_sleep_rejects_end_before_start() {
        let b = backends().await;
        let service = SleepService::new(
            Arc::new(b.sleep.clone()),
            Arc::new(b.documents.clone()),
            BackendKind::Relational,
        );

        let start = Utc::now() - Duration::minutes(10);
        let started = service
            .start_sleep(&NewSleepEntry::new(baby(), "mum", start))
            .await
            .primary
            .data
            .unwrap();

        let result = service
            .stop_sleep(&started.id, start - Duration::minutes(1))
            .await;

        assert!(!result.success);
        assert!(matches!(
            result.primary.error,
            Some(DataError::InvalidRecord(_))
        ));
    }

    #[tokio::test]
    async fn test_stop_missing_entry_is_not_found() {
        let b = backends().await;
        let service = SleepService::new(
            Arc::new(b.sleep.clone()),
            Arc::new(b.documents.clone()),
            BackendKind::Relational,
        );

        let result = service
            .stop_sleep(&RecordId::new("missing"), Utc::now())
            .await;

        assert!(!result.success);
        assert!(result.primary.error.unwrap().is_not_found());
    }

    #[tokio::test]
    async fn test_update_and_delete_entry() {
        let b = backends().await;
        let service = SleepService::new(
            Arc::new(b.sleep.clone()),
            Arc::new(b.documents.clone()),
            BackendKind::Relational,
        );

        let entry = service
            .start_sleep(&NewSleepEntry::new(baby(), "mum", Utc::now()))
            .await
            .primary
            .data
            .unwrap();

        let patch = SleepPatch {
            notes: Some("car seat".to_string()),
            ..Default::default()
        };
        let updated = service.update_entry(&entry.id, &patch).await;
        assert_eq!(
            updated.primary.data.unwrap().notes.as_deref(),
            Some("car seat")
        );

        assert!(service.delete_entry(&entry.id).await.success);
        assert!(service.get_entries(&baby()).await.data.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_moving_end_time_recomputes_duration() {
        for active in [BackendKind::Relational, BackendKind::Document] {
            let b = backends().await;
            let service = SleepService::new(
                Arc::new(b.sleep.clone()),
                Arc::new(b.documents.clone()),
                active,
            );

            let start = Utc::now().trunc_subsecs(0) - Duration::hours(3);
            let entry = service
                .start_sleep(
                    &NewSleepEntry::new(baby(), "mum", start)
                        .with_end_time(start + Duration::minutes(60)),
                )
                .await
                .primary
                .data
                .unwrap();
            assert_eq!(entry.duration_minutes, Some(60));

            let patch = SleepPatch {
                end_time: Some(start + Duration::minutes(150)),
                ..Default::default()
            };
            let updated = service.update_entry(&entry.id, &patch).await;

            assert!(updated.success);
            assert_eq!(updated.primary.data.unwrap().duration_minutes, Some(150));
            let stored = service.get_entries(&baby()).await.data.unwrap();
            assert_eq!(stored[0].duration_minutes, Some(150));
        }
    }
}
