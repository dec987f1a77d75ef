//! Applying a declared form to the remote application
//!
//! Mutations run in a fixed order: delete, update, add, then layout.
//! Deleting first frees codes that an update or add may reuse, which is
//! what moving a field into or out of a subtable needs. Each one carries the revision the session currently holds, so a
//! concurrent edit anywhere in the sequence stops the rest with a
//! conflict. Mutations already made are not undone.

use crate::backend::Backend;
use crate::diff::{SchemaDiff, diff_fields, diff_layout, layout_changed};
use crate::error::Result;
use crate::field::FieldDefinition;
use crate::layout::Layout;
use crate::revision::Revision;
use crate::schema::{FieldSet, Schema};
use crate::session::ApplySession;
use declarative::{DiffKind, DiffResult};

/// What a declared document states about a form
#[derive(Debug, Clone, PartialEq)]
pub enum DeclaredState {
    Fields(FieldSet),
    Layout(Layout),
    Schema(Schema),
}

impl DeclaredState {
    fn fields(&self) -> Option<&FieldSet> {
        match self {
            Self::Fields(fields) | Self::Schema(Schema { fields, .. }) => Some(fields),
            Self::Layout(_) => None,
        }
    }

    fn layout(&self) -> Option<&Layout> {
        match self {
            Self::Layout(layout) | Self::Schema(Schema { layout, .. }) => Some(layout),
            Self::Fields(_) => None,
        }
    }
}

/// Outcome of applying one declared state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Codes of added top-level fields
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub deleted: Vec<String>,
    pub layout_updated: bool,
    /// Revision held after the last read or mutation
    pub revision: Option<Revision>,
}

impl ApplyReport {
    /// True when nothing was written
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.deleted.is_empty() && !self.layout_updated
    }
}

/// Top-level field mutations derived from a fields diff
#[derive(Debug, Default)]
struct FieldChanges<'a> {
    add: Vec<&'a FieldDefinition>,
    update: Vec<&'a FieldDefinition>,
    delete: Vec<String>,
}

impl<'a> FieldChanges<'a> {
    /// Map diff entries onto top-level fields
    ///
    /// The service only accepts whole top-level definitions, so any change
    /// to a subtable member becomes an update of the subtable.
    fn plan(declared: &'a FieldSet, remote: &FieldSet, diff: &DiffResult<String>) -> Self {
        let mut changes = Self::default();

        for entry in &diff.entries {
            let code = entry.key.as_str();
            match entry.kind {
                DiffKind::Added => match declared.parent_of(code) {
                    None => changes.push_add(declared.get(code)),
                    Some(parent) if remote.contains(parent) => changes.push_update(declared.get(parent)),
                    Some(_) => {} // added along with its new subtable
                },
                DiffKind::Modified => {
                    let (wanted, current) = (declared.parent_of(code), remote.parent_of(code));
                    if wanted == current {
                        changes.push_update(declared.get(wanted.unwrap_or(code)));
                    } else {
                        changes.push_move(code, wanted, current, declared, remote);
                    }
                }
                DiffKind::Deleted => match remote.parent_of(code) {
                    None => changes.push_delete(code),
                    Some(parent) => changes.push_update(declared.get(parent)),
                },
            }
        }

        changes
    }

    /// A field that changes owner leaves the old one and joins the new one
    fn push_move(
        &mut self,
        code: &str,
        wanted: Option<&str>,
        current: Option<&str>,
        declared: &'a FieldSet,
        remote: &FieldSet,
    ) {
        match current {
            None => self.push_delete(code),
            Some(parent) => self.push_update(declared.get(parent)),
        }
        match wanted {
            None => self.push_add(declared.get(code)),
            Some(parent) if remote.contains(parent) => self.push_update(declared.get(parent)),
            Some(_) => {} // added along with its new subtable
        }
    }

    fn push_add(&mut self, field: Option<&'a FieldDefinition>) {
        if let Some(field) = field
            && !self.add.iter().any(|f| f.code == field.code)
        {
            self.add.push(field);
        }
    }

    fn push_update(&mut self, field: Option<&'a FieldDefinition>) {
        if let Some(field) = field
            && !self.update.iter().any(|f| f.code == field.code)
        {
            self.update.push(field);
        }
    }

    fn push_delete(&mut self, code: &str) {
        if !self.delete.iter().any(|c| c == code) {
            self.delete.push(code.to_string());
        }
    }
}

/// Read the remote form and diff it against the declared state
///
/// Only the parts the declared state covers are diffed; nothing is written.
pub fn preview_domain<B: Backend + ?Sized>(
    declared: &DeclaredState,
    session: &mut ApplySession<'_, B>,
) -> Result<SchemaDiff> {
    let remote = session.read()?;
    Ok(diff_declared(declared, &remote.schema))
}

fn diff_declared(declared: &DeclaredState, remote: &Schema) -> SchemaDiff {
    let mut diff = SchemaDiff::default();
    if let Some(fields) = declared.fields() {
        diff.fields = diff_fields(fields, &remote.fields);
    }
    if let Some(layout) = declared.layout() {
        diff.layout = diff_layout(layout, &remote.layout);
        diff.layout_changed = layout_changed(layout, &remote.layout);
    }
    diff
}

/// Bring the remote form in line with the declared state
///
/// Reads fields and layout concurrently, diffs, then issues only the
/// mutations the diff calls for. An empty diff writes nothing.
pub fn apply_domain<B: Backend + ?Sized>(
    declared: &DeclaredState,
    session: &mut ApplySession<'_, B>,
) -> Result<ApplyReport> {
    let remote = session.read()?;
    let diff = diff_declared(declared, &remote.schema);
    let mut report = ApplyReport::default();

    if let Some(fields) = declared.fields() {
        let changes = FieldChanges::plan(fields, &remote.schema.fields, &diff.fields);

        if !changes.delete.is_empty() {
            session.delete_fields(&changes.delete)?;
            report.deleted = changes.delete;
        }
        if !changes.update.is_empty() {
            session.update_fields(changes.update.iter().copied())?;
            report.updated = codes(&changes.update);
        }
        if !changes.add.is_empty() {
            session.add_fields(changes.add.iter().copied())?;
            report.added = codes(&changes.add);
        }
    }

    if let Some(layout) = declared.layout()
        && diff.layout_needs_update()
    {
        session.update_layout(layout)?;
        report.layout_updated = true;
    }

    report.revision = session.revision();
    if report.is_noop() {
        log::debug!("App {}: already up to date", session.app_id());
    } else {
        log::info!(
            "App {}: added {}, updated {}, deleted {}{}",
            session.app_id(),
            report.added.len(),
            report.updated.len(),
            report.deleted.len(),
            if report.layout_updated { ", layout updated" } else { "" }
        );
    }
    Ok(report)
}

fn codes(fields: &[&FieldDefinition]) -> Vec<String> {
    fields.iter().map(|f| f.code.clone()).collect()
}
