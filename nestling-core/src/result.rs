//! Result shapes returned by the data services.
//!
//! Failures are carried as data: nothing in the service layer returns `Err`
//! to its caller. Callers look at `primary` for user-facing outcomes and
//! treat `secondary.error` as telemetry.

use serde::Serialize;

use crate::backend::BackendKind;
use crate::error::DataError;

/// Outcome of a single backend operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpResult<T> {
    pub data: Option<T>,
    pub error: Option<DataError>,
}

impl<T> OpResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: DataError) -> Self {
        Self {
            data: None,
            error: Some(error),
        }
    }

    /// The side of a dual-write result that no backend was asked to touch.
    pub fn untouched() -> Self {
        Self {
            data: None,
            error: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<Option<T>, DataError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.data),
        }
    }
}

impl<T> From<Result<T, DataError>> for OpResult<T> {
    fn from(result: Result<T, DataError>) -> Self {
        match result {
            Ok(data) => OpResult::ok(data),
            Err(e) => OpResult::err(e),
        }
    }
}

/// Outcome of a write that may have been mirrored to a second backend.
///
/// `success` reflects the primary side only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DualWriteResult<T> {
    pub primary: OpResult<T>,
    pub secondary: OpResult<T>,
    pub success: bool,
}

impl<T> DualWriteResult<T> {
    pub fn new(primary: OpResult<T>, secondary: OpResult<T>) -> Self {
        let success = primary.error.is_none();
        Self {
            primary,
            secondary,
            success,
        }
    }

    /// Wraps a write that only touched one backend.
    pub fn single(primary: OpResult<T>) -> Self {
        Self::new(primary, OpResult::untouched())
    }

    /// Maps both sides' data, keeping errors and `success` as they are.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> DualWriteResult<U> {
        DualWriteResult {
            primary: OpResult {
                data: self.primary.data.map(&mut f),
                error: self.primary.error,
            },
            secondary: OpResult {
                data: self.secondary.data.map(&mut f),
                error: self.secondary.error,
            },
            success: self.success,
        }
    }
}

/// Outcome of a read against the active backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadResult<T> {
    pub data: Option<T>,
    pub error: Option<DataError>,
    pub source: BackendKind,
}

impl<T> ReadResult<T> {
    pub fn from_op(op: OpResult<T>, source: BackendKind) -> Self {
        Self {
            data: op.data,
            error: op.error,
            source,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<Option<T>, DataError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.data),
        }
    }
}
