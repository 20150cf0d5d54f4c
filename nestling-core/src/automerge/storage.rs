//! Automerge document storage for persisting documents to disk.

use automerge::AutoCommit;
use std::fs;
use std::io;
use std::path::PathBuf;

use super::Collection;

/// Loads and saves one Automerge document per collection under a data directory.
#[derive(Clone, Debug)]
pub struct DocumentStorage {
    data_dir: PathBuf,
}

impl DocumentStorage {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Returns the full path for a collection's document.
    pub fn path(&self, collection: Collection) -> PathBuf {
        self.data_dir.join(collection.filename())
    }

    pub fn exists(&self, collection: Collection) -> bool {
        self.path(collection).exists()
    }

    /// Loads a document from disk.
    ///
    /// Returns `Ok(None)` if the file doesn't exist.
    pub fn load(&self, collection: Collection) -> Result<Option<AutoCommit>, StorageError> {
        let path = self.path(collection);

        match fs::read(&path) {
            Ok(bytes) => {
                let doc = AutoCommit::load(&bytes)
                    .map_err(|e| StorageError::LoadError(path, e.to_string()))?;
                Ok(Some(doc))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::IoError(path, e)),
        }
    }

    pub fn load_or_create(&self, collection: Collection) -> Result<AutoCommit, StorageError> {
        Ok(self.load(collection)?.unwrap_or_else(AutoCommit::new))
    }

    /// Saves a document to disk, creating the data directory if needed.
    ///
    /// The bytes go to a sibling temp file first and are renamed into place,
    /// so a reader never sees a half-written document.
    pub fn save(&self, collection: Collection, doc: &mut AutoCommit) -> Result<(), StorageError> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| StorageError::IoError(self.data_dir.clone(), e))?;

        let path = self.path(collection);
        let staging = path.with_extension("automerge.tmp");
        fs::write(&staging, doc.save()).map_err(|e| StorageError::IoError(staging.clone(), e))?;
        fs::rename(&staging, &path).map_err(|e| StorageError::IoError(path, e))?;

        Ok(())
    }
}

#[derive(Debug)]
pub enum StorageError {
    /// I/O error reading or writing a file.
    IoError(PathBuf, io::Error),
    /// Error loading/parsing an Automerge document.
    LoadError(PathBuf, String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::IoError(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            StorageError::LoadError(path, e) => {
                write!(f, "Failed to load document {}: {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::IoError(_, e) => Some(e),
            StorageError::LoadError(_, _) => None,
        }
    }
}
