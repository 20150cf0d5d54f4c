//! Data services: routing of reads and writes across the two backends.
//!
//! Every service holds one store per backend and the backend that is active
//! for reads. Writes follow the service's [`WritePolicy`]. Nothing here
//! returns `Err`; failures come back inside the result shapes of
//! [`crate::result`].

mod baby;
mod base;
#[cfg(test)]
mod fakes;
mod question;
mod sleep;

pub use baby::BabyService;
pub use base::{dual_write, read_from_active, with_retry, RetryPolicy};
pub use question::QuestionService;
pub use sleep::{SleepService, MAX_ACTIVE_SLEEP_DURATION_MINUTES};

use futures::future::BoxFuture;
use std::sync::Arc;

use crate::backend::{BackendKind, WritePolicy};
use crate::error::DataError;
use crate::result::{DualWriteResult, OpResult, ReadResult};

use base::settle;

/// Both backends' stores for one record type, plus the routing settings.
///
/// `S` is normally a store trait object such as `dyn BabyStore`.
pub struct DataService<S: ?Sized> {
    relational: Arc<S>,
    document: Arc<S>,
    active: BackendKind,
    write_policy: WritePolicy,
}

impl<S: ?Sized> Clone for DataService<S> {
    fn clone(&self) -> Self {
        Self {
            relational: Arc::clone(&self.relational),
            document: Arc::clone(&self.document),
            active: self.active,
            write_policy: self.write_policy,
        }
    }
}

impl<S: ?Sized> DataService<S> {
    pub fn new(relational: Arc<S>, document: Arc<S>, active: BackendKind) -> Self {
        Self {
            relational,
            document,
            active,
            write_policy: WritePolicy::Active,
        }
    }

    pub fn with_write_policy(mut self, write_policy: WritePolicy) -> Self {
        self.write_policy = write_policy;
        self
    }

    pub fn active(&self) -> BackendKind {
        self.active
    }

    pub fn write_policy(&self) -> WritePolicy {
        self.write_policy
    }

    pub fn store(&self, kind: BackendKind) -> &S {
        match kind {
            BackendKind::Relational => &*self.relational,
            BackendKind::Document => &*self.document,
        }
    }

    /// Runs `op` against the active backend only.
    pub async fn read<'a, T, F>(&'a self, op: F) -> ReadResult<T>
    where
        F: Fn(&'a S) -> BoxFuture<'a, Result<T, DataError>>,
    {
        let op = &op;
        read_from_active(
            self.active,
            move || op(self.store(BackendKind::Relational)),
            move || op(self.store(BackendKind::Document)),
        )
        .await
    }

    /// Runs `op` according to the write policy.
    ///
    /// With [`WritePolicy::Active`] the active backend's outcome is reported
    /// as `primary` and `secondary` is left untouched.
    pub async fn write<'a, T, F>(&'a self, op: F) -> DualWriteResult<T>
    where
        F: Fn(&'a S) -> BoxFuture<'a, Result<T, DataError>>,
    {
        match self.write_policy {
            WritePolicy::Active => {
                let outcome = self.write_to(self.active, op).await;
                if let Some(err) = &outcome.error {
                    tracing::error!(backend = %self.active, error = %err, "write failed");
                }
                DualWriteResult::single(outcome)
            }
            WritePolicy::Dual { primary } => {
                let op = &op;
                dual_write(
                    primary,
                    async move { op(self.store(primary)).await },
                    async move { op(self.store(primary.other())).await },
                )
                .await
            }
        }
    }

    /// Runs `op` against one named backend, ignoring the write policy.
    /// Failures are returned, not logged.
    pub async fn write_to<'a, T, F>(&'a self, kind: BackendKind, op: F) -> OpResult<T>
    where
        F: FnOnce(&'a S) -> BoxFuture<'a, Result<T, DataError>>,
    {
        settle(async move { op(self.store(kind)).await }).await
    }
}
