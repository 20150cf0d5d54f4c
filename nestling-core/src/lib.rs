//! Nestling Core Library
//!
//! Baby-tracking data access over two interchangeable backends: a SQLite
//! relational store and an Automerge document store. Services read from the
//! active backend and write to one or both according to their write policy.

pub mod automerge;
pub mod backend;
pub mod db;
pub mod error;
pub mod models;
pub mod pregnancy;
pub mod result;
pub mod service;
pub mod store;

pub use self::automerge::DocumentStore;
pub use backend::{BackendKind, WritePolicy};
pub use db::{init_db, BabyRepository, QuestionRepository, SleepRepository};
pub use error::DataError;
pub use models::{
    Baby, BabyPatch, DoctorQuestion, NewBaby, NewDoctorQuestion, NewSleepEntry, RecordId, Sex,
    SleepEntry, SleepPatch, SleepState,
};
pub use result::{DualWriteResult, OpResult, ReadResult};
pub use service::{
    dual_write, read_from_active, with_retry, BabyService, QuestionService, RetryPolicy,
    SleepService, MAX_ACTIVE_SLEEP_DURATION_MINUTES,
};
pub use store::{BabyStore, QuestionStore, SleepStore};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
