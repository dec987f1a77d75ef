//! In-memory backend
//!
//! Behaves like the remote service for one or more applications: every
//! mutation bumps the application's revision, and a mutation carrying a
//! revision other than the current one is rejected as stale.
//!
//! ```
//! use formkit::backend::{Backend, MemoryBackend};
//! use formkit::Revision;
//! use serde_json::json;
//!
//! let backend = MemoryBackend::new();
//! backend.insert_app("12", serde_json::Map::new(), vec![], Revision(3));
//!
//! let fields = json!({"title": {"type": "SINGLE_LINE_TEXT", "code": "title", "label": "Title"}});
//! let revision = backend
//!     .add_elements("12", fields.as_object().unwrap(), Some(Revision(3)))
//!     .unwrap();
//! assert_eq!(revision, Revision(4));
//!
//! // Stale revisions are rejected
//! let err = backend.delete_elements("12", &["title".into()], Some(Revision(3))).unwrap_err();
//! assert!(err.is_stale_revision());
//! ```

use super::{Backend, RemoteError, RemoteResult, Snapshot, WireFields, WireLayout};
use crate::revision::Revision;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A call observed by [`MemoryBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub app_id: String,
    pub operation: &'static str,
    /// Revision the caller attached, if any
    pub revision: Option<Revision>,
}

#[derive(Debug, Clone, Default)]
struct AppState {
    fields: WireFields,
    layout: WireLayout,
    revision: Revision,
}

#[derive(Debug, Default)]
struct Inner {
    apps: HashMap<String, AppState>,
    calls: Vec<RecordedCall>,
    failures: Vec<(String, &'static str, RemoteError)>,
}

/// In-memory form configuration store
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryBackend {
    /// Create a new empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed (or replace) an application's configuration.
    pub fn insert_app(
        &self,
        app_id: impl Into<String>,
        fields: WireFields,
        layout: WireLayout,
        revision: Revision,
    ) {
        self.lock().apps.insert(
            app_id.into(),
            AppState {
                fields,
                layout,
                revision,
            },
        );
    }

    /// Make the next `operation` call for `app_id` fail with `error`.
    ///
    /// Operations are named after the [`Backend`] methods, e.g.
    /// `"update_layout"`. Each injected failure is used once.
    pub fn fail_next(&self, app_id: impl Into<String>, operation: &'static str, error: RemoteError) {
        self.lock().failures.push((app_id.into(), operation, error));
    }

    /// Bump an application's revision as if someone else edited it.
    pub fn touch(&self, app_id: &str) -> Option<Revision> {
        let mut inner = self.lock();
        let state = inner.apps.get_mut(app_id)?;
        state.revision = Revision(state.revision.0 + 1);
        Some(state.revision)
    }

    /// Current revision of an application
    pub fn revision(&self, app_id: &str) -> Option<Revision> {
        self.lock().apps.get(app_id).map(|s| s.revision)
    }

    /// Current wire fields of an application
    pub fn fields(&self, app_id: &str) -> Option<WireFields> {
        self.lock().apps.get(app_id).map(|s| s.fields.clone())
    }

    /// Current wire layout of an application
    pub fn layout(&self, app_id: &str) -> Option<WireLayout> {
        self.lock().apps.get(app_id).map(|s| s.layout.clone())
    }

    /// Every call made so far, oldest first
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Operations that changed state, oldest first
    pub fn mutations(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| !c.operation.starts_with("get"))
            .collect()
    }

    /// Record the call, honor injected failures, and run `f` on the app state.
    fn call<T>(
        &self,
        app_id: &str,
        operation: &'static str,
        revision: Option<Revision>,
        f: impl FnOnce(&mut AppState) -> RemoteResult<T>,
    ) -> RemoteResult<T> {
        let mut inner = self.lock();
        inner.calls.push(RecordedCall {
            app_id: app_id.to_string(),
            operation,
            revision,
        });

        if let Some(i) = inner
            .failures
            .iter()
            .position(|(app, op, _)| app == app_id && *op == operation)
        {
            let (_, _, error) = inner.failures.remove(i);
            log::debug!("memory backend: injected failure for {operation} on app {app_id}");
            return Err(error);
        }

        let state = inner
            .apps
            .get_mut(app_id)
            .ok_or_else(|| RemoteError::new(format!("app {app_id} not found")).with_status(404))?;
        f(state)
    }

    fn mutate(
        &self,
        app_id: &str,
        operation: &'static str,
        revision: Option<Revision>,
        f: impl FnOnce(&mut AppState) -> RemoteResult<()>,
    ) -> RemoteResult<Revision> {
        self.call(app_id, operation, revision, |state| {
            if let Some(expected) = revision
                && expected != state.revision
            {
                return Err(RemoteError::stale_revision(format!(
                    "revision {expected} is not current ({})",
                    state.revision
                )));
            }
            f(state)?;
            state.revision = Revision(state.revision.0 + 1);
            Ok(state.revision)
        })
    }
}

/// Field codes are unique across the app, subtable members included
fn member_codes(field: &Value) -> impl Iterator<Item = &String> {
    field
        .get("fields")
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|members| members.keys())
}

fn codes_in_use(fields: &WireFields, keep: impl Fn(&str) -> bool) -> HashSet<String> {
    fields
        .iter()
        .filter(|(code, _)| keep(code))
        .flat_map(|(code, field)| std::iter::once(code).chain(member_codes(field)))
        .cloned()
        .collect()
}

fn check_unused(fields: &WireFields, in_use: &HashSet<String>) -> RemoteResult<()> {
    let mut incoming = fields
        .iter()
        .flat_map(|(code, field)| std::iter::once(code).chain(member_codes(field)));
    match incoming.find(|code| in_use.contains(*code)) {
        Some(code) => Err(RemoteError::new(format!("field code {code} is already used"))
            .with_code("GAIA_FC01")
            .with_status(400)),
        None => Ok(()),
    }
}

impl Backend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get_elements(&self, app_id: &str) -> RemoteResult<Snapshot<WireFields>> {
        self.call(app_id, "get_elements", None, |state| {
            Ok(Snapshot::new(state.fields.clone(), state.revision))
        })
    }

    fn add_elements(
        &self,
        app_id: &str,
        fields: &WireFields,
        revision: Option<Revision>,
    ) -> RemoteResult<Revision> {
        self.mutate(app_id, "add_elements", revision, |state| {
            let in_use = codes_in_use(&state.fields, |_| true);
            check_unused(fields, &in_use)?;
            state
                .fields
                .extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
            Ok(())
        })
    }

    fn update_elements(
        &self,
        app_id: &str,
        fields: &WireFields,
        revision: Option<Revision>,
    ) -> RemoteResult<Revision> {
        self.mutate(app_id, "update_elements", revision, |state| {
            if let Some(code) = fields.keys().find(|c| !state.fields.contains_key(*c)) {
                return Err(RemoteError::new(format!("field {code} does not exist"))
                    .with_code("GAIA_FN01")
                    .with_status(400));
            }
            let in_use = codes_in_use(&state.fields, |code| !fields.contains_key(code));
            check_unused(fields, &in_use)?;
            for (code, update) in fields {
                // Properties not sent keep their current value
                if let (Some(current), Some(update)) = (
                    state.fields.get_mut(code).and_then(|v| v.as_object_mut()),
                    update.as_object(),
                ) {
                    current.extend(update.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
            }
            Ok(())
        })
    }

    fn delete_elements(
        &self,
        app_id: &str,
        codes: &[String],
        revision: Option<Revision>,
    ) -> RemoteResult<Revision> {
        self.mutate(app_id, "delete_elements", revision, |state| {
            if let Some(code) = codes.iter().find(|c| !state.fields.contains_key(*c)) {
                return Err(RemoteError::new(format!("field {code} does not exist"))
                    .with_code("GAIA_FN01")
                    .with_status(400));
            }
            for code in codes {
                state.fields.remove(code);
            }
            Ok(())
        })
    }

    fn get_layout(&self, app_id: &str) -> RemoteResult<Snapshot<WireLayout>> {
        self.call(app_id, "get_layout", None, |state| {
            Ok(Snapshot::new(state.layout.clone(), state.revision))
        })
    }

    fn update_layout(
        &self,
        app_id: &str,
        layout: &WireLayout,
        revision: Option<Revision>,
    ) -> RemoteResult<Revision> {
        self.mutate(app_id, "update_layout", revision, |state| {
            state.layout = layout.clone();
            Ok(())
        })
    }
}
