//! Remote form configuration backend abstraction
//!
//! A [`Backend`] speaks the wire format of the remote service: field
//! definitions keyed by code and a list of layout items, each read paired
//! with the revision it was taken at. Callers normally go through
//! [`crate::ApplySession`], which tracks revisions and converts payloads.

pub mod memory;

pub use memory::{MemoryBackend, RecordedCall};

use crate::revision::Revision;
use serde_json::{Map, Value};
use thiserror::Error;

/// Error code the remote service uses to reject a stale revision
pub const STALE_REVISION_CODE: &str = "GAIA_CO02";

/// Field definitions in wire form, keyed by field code
pub type WireFields = Map<String, Value>;

/// Layout items in wire form
pub type WireLayout = Vec<Value>;

/// A failure reported by (or while talking to) the remote service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteError {
    /// Service error code, if the service returned one
    pub code: Option<String>,
    pub message: String,
    /// HTTP status, if any
    pub status: Option<u16>,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            status: None,
        }
    }

    /// The error the service returns when a write carries a stale revision
    pub fn stale_revision(message: impl Into<String>) -> Self {
        Self::new(message).with_code(STALE_REVISION_CODE).with_status(409)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Check if the service rejected the call because of a stale revision
    pub fn is_stale_revision(&self) -> bool {
        self.code.as_deref() == Some(STALE_REVISION_CODE)
    }
}

/// Result type for raw backend calls
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// A payload together with the revision it was read at
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub payload: T,
    pub revision: Revision,
}

impl<T> Snapshot<T> {
    pub fn new(payload: T, revision: Revision) -> Self {
        Self { payload, revision }
    }
}

/// Backend trait for a remote form configuration service
///
/// Every mutation accepts an optional revision. When present the service
/// must reject the call with [`STALE_REVISION_CODE`] if the revision is
/// not current. When absent the write is unconditional. Each mutation
/// returns the revision after the change.
pub trait Backend: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Read all field definitions of an application
    fn get_elements(&self, app_id: &str) -> RemoteResult<Snapshot<WireFields>>;

    /// Add new fields
    fn add_elements(
        &self,
        app_id: &str,
        fields: &WireFields,
        revision: Option<Revision>,
    ) -> RemoteResult<Revision>;

    /// Update existing fields
    fn update_elements(
        &self,
        app_id: &str,
        fields: &WireFields,
        revision: Option<Revision>,
    ) -> RemoteResult<Revision>;

    /// Delete fields by code
    fn delete_elements(
        &self,
        app_id: &str,
        codes: &[String],
        revision: Option<Revision>,
    ) -> RemoteResult<Revision>;

    /// Read the form layout
    fn get_layout(&self, app_id: &str) -> RemoteResult<Snapshot<WireLayout>>;

    /// Replace the form layout
    fn update_layout(
        &self,
        app_id: &str,
        layout: &WireLayout,
        revision: Option<Revision>,
    ) -> RemoteResult<Revision>;
}
