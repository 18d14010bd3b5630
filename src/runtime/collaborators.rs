//! Boundaries to the outside world. Implementations own transport, auth and
//! timeouts; the engine only sees their results.

use crate::core::value::{FileRef, Value};
use crate::engine::SubmittedRecord;
use crate::error::{ReferenceError, SubmitError};
use crate::state::reference::ReferenceItem;

/// Persists a validated record.
#[async_trait::async_trait]
pub trait RemoteSubmitter: Send + Sync {
    /// Create a new record from `payload`
    async fn create(&self, payload: Value) -> Result<SubmittedRecord, SubmitError>;

    /// Replace the record `record_id` with `payload`
    async fn update(&self, record_id: &str, payload: Value) -> Result<SubmittedRecord, SubmitError>;
}

/// Supplies selectable options such as classes and their fees.
#[async_trait::async_trait]
pub trait ReferenceDataProvider: Send + Sync {
    async fn load(&self) -> Result<Vec<ReferenceItem>, ReferenceError>;
}

/// Delivers a file after its record exists.
#[async_trait::async_trait]
pub trait PhotoUploader: Send + Sync {
    async fn upload(&self, record_id: &str, file: FileRef) -> Result<(), SubmitError>;
}
