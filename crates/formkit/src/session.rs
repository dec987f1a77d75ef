//! Revision-tracked access to one application's form
//!
//! An [`ApplySession`] holds the newest revision it has seen for its
//! application. Reads raise it; every mutation carries it so the service
//! rejects the write if someone else changed the form in between. Before
//! anything has been observed, mutations go out without a revision and
//! are applied unconditionally.

use crate::backend::{Backend, RemoteError, Snapshot, WireLayout};
use crate::error::{Error, Result};
use crate::field::FieldDefinition;
use crate::layout::Layout;
use crate::revision::Revision;
use crate::schema::{FieldSet, Schema};
use crate::wire;

/// A consistent read of fields and layout
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteState {
    pub schema: Schema,
    /// Newest revision among the reads
    pub revision: Revision,
}

/// Revision-tracked session over a [`Backend`] for one application
pub struct ApplySession<'a, B: Backend + ?Sized> {
    backend: &'a B,
    app_id: String,
    revision: Option<Revision>,
}

impl<'a, B: Backend + ?Sized> ApplySession<'a, B> {
    pub fn new(backend: &'a B, app_id: impl Into<String>) -> Self {
        Self {
            backend,
            app_id: app_id.into(),
            revision: None,
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Newest revision observed so far
    pub fn revision(&self) -> Option<Revision> {
        self.revision
    }

    /// Raise the held revision to `observed` if it is newer
    fn observe(&mut self, observed: Revision) {
        let next = Revision::newest(self.revision, observed);
        if self.revision != Some(next) {
            log::debug!(
                "App {}: revision {} -> {}",
                self.app_id,
                self.revision.map_or_else(|| "none".to_string(), |r| r.to_string()),
                next
            );
        }
        self.revision = Some(next);
    }

    fn record<T>(&mut self, operation: &'static str, result: std::result::Result<Snapshot<T>, RemoteError>) -> Result<T> {
        let snapshot = result.map_err(|e| Error::from_remote(operation, e))?;
        self.observe(snapshot.revision);
        Ok(snapshot.payload)
    }

    /// Read fields and layout concurrently
    ///
    /// The held revision becomes the newest of the two reads, whichever
    /// finished last.
    pub fn read(&mut self) -> Result<RemoteState> {
        let backend = self.backend;
        let app_id = self.app_id.as_str();
        let (fields, layout) = rayon::join(|| backend.get_elements(app_id), || backend.get_layout(app_id));

        // Keep what was observed even if the other read failed
        let fields = self.record("get elements", fields);
        let layout = self.record("get layout", layout);
        let (fields, layout) = (fields?, layout?);

        let schema = Schema {
            fields: wire::fields_from_wire(&fields)?,
            layout: wire::layout_from_wire(&layout)?,
        };
        let revision = self.revision.unwrap_or_default();
        Ok(RemoteState { schema, revision })
    }

    /// Read only the field definitions
    pub fn read_fields(&mut self) -> Result<FieldSet> {
        let fields = self.backend.get_elements(&self.app_id);
        let fields = self.record("get elements", fields)?;
        wire::fields_from_wire(&fields)
    }

    /// Read only the layout
    pub fn read_layout(&mut self) -> Result<Layout> {
        let layout = self.backend.get_layout(&self.app_id);
        let layout = self.record("get layout", layout)?;
        wire::layout_from_wire(&layout)
    }

    fn mutate(
        &mut self,
        operation: &'static str,
        call: impl FnOnce(&B, &str, Option<Revision>) -> std::result::Result<Revision, RemoteError>,
    ) -> Result<Revision> {
        log::debug!(
            "App {}: {operation} (revision {})",
            self.app_id,
            self.revision.map_or_else(|| "unconditional".to_string(), |r| r.to_string())
        );
        let revision = call(self.backend, &self.app_id, self.revision)
            .map_err(|e| Error::from_remote(operation, e))?;
        self.observe(revision);
        Ok(revision)
    }

    /// Add new fields
    pub fn add_fields<'f>(&mut self, fields: impl IntoIterator<Item = &'f FieldDefinition>) -> Result<Revision> {
        let payload = wire::fields_to_wire(fields);
        self.mutate("add elements", |b, app, rev| b.add_elements(app, &payload, rev))
    }

    /// Update existing fields with their full definitions
    pub fn update_fields<'f>(&mut self, fields: impl IntoIterator<Item = &'f FieldDefinition>) -> Result<Revision> {
        let payload = wire::fields_to_wire(fields);
        self.mutate("update elements", |b, app, rev| b.update_elements(app, &payload, rev))
    }

    /// Delete fields by code
    pub fn delete_fields(&mut self, codes: &[String]) -> Result<Revision> {
        self.mutate("delete elements", |b, app, rev| b.delete_elements(app, codes, rev))
    }

    /// Replace the layout
    pub fn update_layout(&mut self, layout: &Layout) -> Result<Revision> {
        let payload: WireLayout = wire::layout_to_wire(layout);
        self.mutate("update layout", |b, app, rev| b.update_layout(app, &payload, rev))
    }
}
