//! # Formkit
//!
//! Typed form fields and layout for a remote application platform, with
//! strict wire conversion and revision-tracked writes.
//!
//! ## Core Concepts
//!
//! - **FieldSet / Layout**: The typed form model
//! - **Backend**: The remote service seam (wire payloads plus revisions)
//! - **ApplySession**: Tracks the newest revision and attaches it to writes
//! - **apply_domain**: Diffs a declared state and issues only needed mutations
//!
//! ## Example
//!
//! ```
//! use formkit::backend::MemoryBackend;
//! use formkit::{ApplySession, DeclaredState, Revision, apply_domain, wire};
//! use serde_json::json;
//!
//! let backend = MemoryBackend::new();
//! backend.insert_app("12", serde_json::Map::new(), vec![], Revision(1));
//!
//! let declared = wire::fields_from_wire(
//!     json!({"title": {"type": "SINGLE_LINE_TEXT", "code": "title", "label": "Title"}})
//!         .as_object()
//!         .unwrap(),
//! )?;
//!
//! let mut session = ApplySession::new(&backend, "12");
//! let report = apply_domain(&DeclaredState::Fields(declared), &mut session)?;
//! assert_eq!(report.added, vec!["title"]);
//! assert_eq!(report.revision, Some(Revision(2)));
//! # Ok::<(), formkit::Error>(())
//! ```

pub mod apply;
pub mod backend;
pub mod diff;
pub mod element;
pub mod error;
pub mod field;
pub mod layout;
pub mod revision;
pub mod schema;
pub mod session;
pub mod wire;

// Re-export main types at crate root
pub use apply::{ApplyReport, DeclaredState, apply_domain, preview_domain};
pub use backend::{Backend, RemoteError, STALE_REVISION_CODE, Snapshot};
pub use diff::{FieldsDomain, LayoutDomain, SchemaDiff, diff_fields, diff_layout, diff_schema};
pub use element::{ElementTag, FieldType, SystemType};
pub use error::{Error, ErrorCategory, Result};
pub use field::{FieldDefinition, FieldKind};
pub use layout::{ElementSize, Layout, LayoutElement, LayoutItem};
pub use revision::Revision;
pub use schema::{FieldSet, Schema};
pub use session::{ApplySession, RemoteState};
