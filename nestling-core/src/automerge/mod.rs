//! Document backend built on Automerge.
//!
//! # Document Storage
//!
//! Each collection is one Automerge document in the data directory:
//! - `babies.automerge`: Map of record key -> baby object
//! - `sleep_entries.automerge`: Map of record key -> sleep entry object
//! - `doctor_questions.automerge`: Map of record key -> question object
//!
//! Object shapes are described in [`schema`].

mod collection;
pub mod document_key;
pub mod reader;
pub mod schema;
mod storage;
mod store;
pub mod writer;

pub use collection::Collection;
pub use reader::ReaderError;
pub use storage::{DocumentStorage, StorageError};
pub use store::DocumentStore;
