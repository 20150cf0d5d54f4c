//! Record keys for the document backend.
//!
//! Keys are 16 random bytes encoded with bs58check, a different identifier
//! space from the relational backend's UUID strings.

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DocumentKeyError {
    #[error("Invalid bs58check encoding: {0}")]
    InvalidEncoding(String),

    #[error("Invalid document key length: expected 16 bytes, got {0}")]
    InvalidLength(usize),
}

/// Generate a fresh record key.
pub fn new_key() -> String {
    bs58::encode(Uuid::new_v4().as_bytes())
        .with_check()
        .into_string()
}

/// Check that `key` is a well-formed record key.
pub fn validate_key(key: &str) -> Result<(), DocumentKeyError> {
    let bytes = bs58::decode(key)
        .with_check(None)
        .into_vec()
        .map_err(|e| DocumentKeyError::InvalidEncoding(e.to_string()))?;

    if bytes.len() != 16 {
        return Err(DocumentKeyError::InvalidLength(bytes.len()));
    }
    Ok(())
}
