use anyhow::{Context, Result, bail};
use declarative::{AppEntry, Domain, ProjectConfig};
use formkit::{Revision, Schema, wire};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Expand `~` in a user-supplied path
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// A project document together with where it was loaded from
#[derive(Debug)]
pub struct Project {
    pub config: ProjectConfig,
    /// Directory the project file lives in; relative paths resolve here
    pub root: PathBuf,
}

impl Project {
    /// Load a project file, choosing the format by extension
    pub fn load(path: &str) -> Result<Self> {
        let path = expand_path(path);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?;

        let parsed = if is_json(&path) {
            ProjectConfig::from_json_str(&content)
        } else {
            ProjectConfig::from_toml_str(&content)
        };
        let config =
            parsed.with_context(|| format!("Invalid project file {}", path.display()))?;

        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        log::debug!("Loaded {} app(s) from {}", config.apps.len(), path.display());

        Ok(Self { config, root })
    }

    /// Path of an application's file for one domain
    pub fn file_path(&self, app: &AppEntry, domain: Domain) -> PathBuf {
        let declared = expand_path(app.file(domain));
        if declared.is_absolute() {
            declared
        } else {
            self.root.join(declared)
        }
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// A schema export as written by the service's form API
#[derive(Debug, Deserialize)]
struct Export {
    #[serde(default)]
    properties: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    layout: Vec<serde_json::Value>,
    #[serde(default)]
    revision: Option<String>,
}

/// A parsed schema export
#[derive(Debug)]
pub struct LoadedSchema {
    pub schema: Schema,
    pub revision: Option<Revision>,
}

/// Load a JSON schema export (`properties`, `layout`, optional `revision`)
pub fn load_export(path: &Path) -> Result<LoadedSchema> {
    if !is_json(path) {
        bail!(
            "{} is not a JSON schema export (only .json files are supported; point schemaFile at a .json export)",
            path.display()
        );
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    let export: Export = serde_json::from_str(&content)
        .with_context(|| format!("Invalid schema export {}", path.display()))?;

    let fields = wire::fields_from_wire(&export.properties)
        .with_context(|| format!("Invalid fields in {}", path.display()))?;
    let layout = wire::layout_from_wire(&export.layout)
        .with_context(|| format!("Invalid layout in {}", path.display()))?;
    let revision = export
        .revision
        .as_deref()
        .map(str::parse::<Revision>)
        .transpose()
        .with_context(|| format!("Invalid revision in {}", path.display()))?;

    Ok(LoadedSchema {
        schema: Schema { fields, layout },
        revision,
    })
}
