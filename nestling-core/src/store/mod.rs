//! Per-domain store interfaces.
//!
//! Both backends implement every trait here. Services hold one instance of
//! each backend and dispatch through these traits, so nothing above this
//! layer compares backend names or sees backend-specific record shapes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::backend::BackendKind;
use crate::error::DataError;
use crate::models::{
    Baby, BabyPatch, DoctorQuestion, NewBaby, NewDoctorQuestion, NewSleepEntry, RecordId,
    SleepEntry, SleepPatch,
};

#[async_trait]
pub trait BabyStore: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Babies the user owns or has been given access to.
    async fn list_visible(&self, user_id: &str) -> Result<Vec<Baby>, DataError>;

    async fn get(&self, id: &RecordId) -> Result<Option<Baby>, DataError>;

    async fn create(&self, baby: &NewBaby) -> Result<Baby, DataError>;

    async fn update(&self, id: &RecordId, patch: &BabyPatch) -> Result<Baby, DataError>;

    async fn delete(&self, id: &RecordId) -> Result<(), DataError>;

    /// Gives `user_id` access to the baby. Sharing twice is a no-op.
    async fn share(&self, id: &RecordId, user_id: &str) -> Result<Baby, DataError>;
}

#[async_trait]
pub trait SleepStore: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Entries for one baby, most recent start first.
    async fn list_for_baby(&self, baby_id: &RecordId) -> Result<Vec<SleepEntry>, DataError>;

    async fn get(&self, id: &RecordId) -> Result<Option<SleepEntry>, DataError>;

    async fn create(&self, entry: &NewSleepEntry) -> Result<SleepEntry, DataError>;

    async fn update(&self, id: &RecordId, patch: &SleepPatch) -> Result<SleepEntry, DataError>;

    async fn delete(&self, id: &RecordId) -> Result<(), DataError>;
}

#[async_trait]
pub trait QuestionStore: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Questions asked by the user, oldest first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<DoctorQuestion>, DataError>;

    async fn create(&self, question: &NewDoctorQuestion) -> Result<DoctorQuestion, DataError>;

    async fn answer(
        &self,
        client_ref: Uuid,
        answer: &str,
        answered_at: DateTime<Utc>,
    ) -> Result<DoctorQuestion, DataError>;

    async fn delete(&self, client_ref: Uuid) -> Result<(), DataError>;
}
