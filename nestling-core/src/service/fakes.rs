//! Stores used by the service tests: real backends in a temp dir, and a
//! broken backend that fails or panics on every call.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

use crate::automerge::DocumentStore;
use crate::backend::BackendKind;
use crate::db::{init_db, BabyRepository, QuestionRepository, SleepRepository};
use crate::error::DataError;
use crate::models::{
    Baby, BabyPatch, DoctorQuestion, NewBaby, NewDoctorQuestion, NewSleepEntry, RecordId,
    SleepEntry, SleepPatch,
};
use crate::store::{BabyStore, QuestionStore, SleepStore};

pub struct Backends {
    pub babies: BabyRepository,
    pub sleep: SleepRepository,
    pub questions: QuestionRepository,
    pub documents: DocumentStore,
    _temp: TempDir,
}

pub async fn backends() -> Backends {
    let temp = TempDir::new().unwrap();
    let pool = init_db(&temp.path().join("test.db")).await.unwrap();
    Backends {
        babies: BabyRepository::new(pool.clone()),
        sleep: SleepRepository::new(pool.clone()),
        questions: QuestionRepository::new(pool),
        documents: DocumentStore::new(temp.path().join("documents")),
        _temp: temp,
    }
}

/// A backend where every call fails, or panics if `panics` is set.
pub struct BrokenStore {
    pub kind: BackendKind,
    pub panics: bool,
}

impl BrokenStore {
    pub fn failing(kind: BackendKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            panics: false,
        })
    }

    pub fn panicking(kind: BackendKind) -> Arc<Self> {
        Arc::new(Self { kind, panics: true })
    }

    fn fail<T>(&self) -> Result<T, DataError> {
        if self.panics {
            panic!("{} backend blew up", self.kind);
        }
        Err(match self.kind {
            BackendKind::Relational => DataError::Database("backend down".to_string()),
            BackendKind::Document => DataError::Document("backend down".to_string()),
        })
    }
}

#[async_trait]
impl BabyStore for BrokenStore {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn list_visible(&self, _user_id: &str) -> Result<Vec<Baby>, DataError> {
        self.fail()
    }

    async fn get(&self, _id: &RecordId) -> Result<Option<Baby>, DataError> {
        self.fail()
    }

    async fn create(&self, _baby: &NewBaby) -> Result<Baby, DataError> {
        self.fail()
    }

    async fn update(&self, _id: &RecordId, _patch: &BabyPatch) -> Result<Baby, DataError> {
        self.fail()
    }

    async fn delete(&self, _id: &RecordId) -> Result<(), DataError> {
        self.fail()
    }

    async fn share(&self, _id: &RecordId, _user_id: &str) -> Result<Baby, DataError> {
        self.fail()
    }
}

#[async_trait]
impl SleepStore for BrokenStore {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn list_for_baby(&self, _baby_id: &RecordId) -> Result<Vec<SleepEntry>, DataError> {
        self.fail()
    }

    async fn get(&self, _id: &RecordId) -> Result<Option<SleepEntry>, DataError> {
        self.fail()
    }

    async fn create(&self, _entry: &NewSleepEntry) -> Result<SleepEntry, DataError> {
        self.fail()
    }

    async fn update(&self, _id: &RecordId, _patch: &SleepPatch) -> Result<SleepEntry, DataError> {
        self.fail()
    }

    async fn delete(&self, _id: &RecordId) -> Result<(), DataError> {
        self.fail()
    }
}

#[async_trait]
impl QuestionStore for BrokenStore {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn list_for_user(&self, _user_id: &str) -> Result<Vec<DoctorQuestion>, DataError> {
        self.fail()
    }

    async fn create(&self, _question: &NewDoctorQuestion) -> Result<DoctorQuestion, DataError> {
        self.fail()
    }

    async fn answer(
        &self,
        _client_ref: Uuid,
        _answer: &str,
        _answered_at: DateTime<Utc>,
    ) -> Result<DoctorQuestion, DataError> {
        self.fail()
    }

    async fn delete(&self, _client_ref: Uuid) -> Result<(), DataError> {
        self.fail()
    }
}
