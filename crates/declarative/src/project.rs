//! Project document parsing
//!
//! A project document declares the applications to keep in sync, the
//! file each configuration domain is read from, optional connection
//! overrides, and the dependencies between applications. Parsing turns
//! the raw document into immutable [`ProjectConfig`] / [`AppEntry`]
//! values or fails with a validation error before anything touches the
//! remote service.

use crate::error::{Error, Result};
use crate::planner::{ExecutionPlan, resolve_execution_order};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

// ============================================================================
// Configuration domains
// ============================================================================

/// A configuration domain that has its own declared file per application
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Domain {
    Schema,
    Seed,
    Customize,
    View,
    Settings,
    Notification,
    Report,
    Action,
    Process,
    FieldAcl,
    AppAcl,
    RecordAcl,
    AdminNotes,
    Plugin,
}

impl Domain {
    /// Every domain, in declaration order
    pub const ALL: [Domain; 14] = [
        Domain::Schema,
        Domain::Seed,
        Domain::Customize,
        Domain::View,
        Domain::Settings,
        Domain::Notification,
        Domain::Report,
        Domain::Action,
        Domain::Process,
        Domain::FieldAcl,
        Domain::AppAcl,
        Domain::RecordAcl,
        Domain::AdminNotes,
        Domain::Plugin,
    ];

    /// Key used in the nested `files` object
    pub fn key(&self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Seed => "seed",
            Self::Customize => "customize",
            Self::View => "view",
            Self::Settings => "settings",
            Self::Notification => "notification",
            Self::Report => "report",
            Self::Action => "action",
            Self::Process => "process",
            Self::FieldAcl => "fieldAcl",
            Self::AppAcl => "appAcl",
            Self::RecordAcl => "recordAcl",
            Self::AdminNotes => "adminNotes",
            Self::Plugin => "plugin",
        }
    }

    /// Key of the flat equivalent on the app entry (e.g. `schemaFile`)
    pub fn flat_key(&self) -> String {
        format!("{}File", self.key())
    }

    /// Directory used for the default file path
    pub fn default_dir(&self) -> &'static str {
        match self {
            Self::Schema => "schemas",
            Self::Seed => "seeds",
            Self::Customize => "customize",
            Self::View => "view",
            Self::Settings => "settings",
            Self::Notification => "notification",
            Self::Report => "report",
            Self::Action => "action",
            Self::Process => "process",
            Self::FieldAcl => "field-acl",
            Self::AppAcl => "app-acl",
            Self::RecordAcl => "record-acl",
            Self::AdminNotes => "admin-notes",
            Self::Plugin => "plugin",
        }
    }

    /// Default file path for an application
    ///
    /// Files are JSON exports unless a path says otherwise.
    pub fn default_path(&self, app_name: &str) -> String {
        format!("{}/{}.json", self.default_dir(), app_name)
    }

    /// Look up a domain by its `files` key
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.key() == key)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ============================================================================
// Auth
// ============================================================================

/// Credentials declared in the document
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Auth {
    /// API token authentication
    ApiToken {
        #[serde(rename = "apiToken")]
        api_token: String,
    },
    /// Username/password authentication
    Password { username: String, password: String },
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiToken { .. } => f.write_str("Auth::ApiToken(***)"),
            Self::Password { username, .. } => write!(f, "Auth::Password({username}, ***)"),
        }
    }
}

// ============================================================================
// Parsed project
// ============================================================================

/// Effective connection settings for one application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection<'a> {
    pub domain: Option<&'a str>,
    pub auth: Option<&'a Auth>,
    pub guest_space_id: Option<&'a str>,
}

/// One application declared in the project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppEntry {
    /// Unique, path-safe name
    pub name: String,
    /// Identifier of the application on the remote service
    pub app_id: String,
    /// Declared file per configuration domain (defaults filled in)
    pub files: BTreeMap<Domain, String>,
    pub domain: Option<String>,
    pub auth: Option<Auth>,
    pub guest_space_id: Option<String>,
    /// Names of the applications this one depends on, in declared order
    pub depends_on: Vec<String>,
}

impl AppEntry {
    /// File declared for a configuration domain
    pub fn file(&self, domain: Domain) -> &str {
        self.files.get(&domain).map(String::as_str).unwrap_or_default()
    }

    /// Resolve connection settings, falling back to project defaults
    pub fn connection<'a>(&'a self, project: &'a ProjectConfig) -> Connection<'a> {
        Connection {
            domain: self.domain.as_deref().or(project.domain.as_deref()),
            auth: self.auth.as_ref().or(project.auth.as_ref()),
            guest_space_id: self
                .guest_space_id
                .as_deref()
                .or(project.guest_space_id.as_deref()),
        }
    }
}

/// A parsed, validated project document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    pub domain: Option<String>,
    pub auth: Option<Auth>,
    pub guest_space_id: Option<String>,
    /// Applications keyed by name
    pub apps: HashMap<String, AppEntry>,
}

impl ProjectConfig {
    /// Parse a TOML project document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let value: Value = toml::from_str(content)?;
        Self::from_value(value)
    }

    /// Parse a JSON project document
    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_value(value)
    }

    /// Parse an already-decoded document
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::invalid_document("top level must be an object"));
        }
        let raw: RawProject = serde_json::from_value(value)?;
        raw.validate()
    }

    /// Find an application by name
    pub fn app(&self, name: &str) -> Option<&AppEntry> {
        self.apps.get(name)
    }

    /// Application names, sorted
    pub fn app_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.apps.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve the dependency-respecting execution order
    pub fn execution_plan(&self) -> Result<ExecutionPlan> {
        resolve_execution_order(&self.apps)
    }
}

/// Check that an application name is usable as a path component
pub fn validate_app_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name == "." || name == ".." {
        Some("name is a relative path component")
    } else if name.contains('/') || name.contains('\\') {
        Some("name contains a path separator")
    } else if name.chars().any(char::is_control) {
        Some("name contains a control character")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(Error::InvalidAppName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

// ============================================================================
// Raw document
// ============================================================================

/// Identifier that may be written as a string or an integer
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdValue {
    Text(String),
    Number(u64),
}

impl IdValue {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s.trim().to_string(),
            Self::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProject {
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    auth: Option<Auth>,
    #[serde(default)]
    guest_space_id: Option<IdValue>,
    #[serde(default)]
    apps: Option<HashMap<String, RawApp>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawApp {
    #[serde(default)]
    app_id: Option<IdValue>,
    #[serde(default)]
    depends_on: Vec<String>,
    #[serde(default)]
    files: BTreeMap<String, String>,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    auth: Option<Auth>,
    #[serde(default)]
    guest_space_id: Option<IdValue>,
    /// Flat `<domain>File` keys and anything else not named above
    #[serde(flatten)]
    rest: BTreeMap<String, Value>,
}

impl RawProject {
    fn validate(self) -> Result<ProjectConfig> {
        let raw_apps = self
            .apps
            .ok_or_else(|| Error::invalid_document("missing required `apps` table"))?;
        if raw_apps.is_empty() {
            return Err(Error::EmptyProject);
        }

        let mut apps = HashMap::with_capacity(raw_apps.len());
        for (name, raw) in raw_apps {
            let entry = raw.validate(name)?;
            apps.insert(entry.name.clone(), entry);
        }

        log::debug!("Parsed project with {} application(s)", apps.len());

        Ok(ProjectConfig {
            domain: self.domain,
            auth: self.auth,
            guest_space_id: self.guest_space_id.map(IdValue::into_string),
            apps,
        })
    }
}

impl RawApp {
    fn validate(self, name: String) -> Result<AppEntry> {
        validate_app_name(&name)?;

        let app_id = self.app_id.map(IdValue::into_string).unwrap_or_default();
        if app_id.is_empty() {
            return Err(Error::EmptyAppId { app: name });
        }

        if let Some(unknown) = self.files.keys().find(|k| Domain::from_key(k).is_none()) {
            return Err(Error::invalid_document(format!(
                "application '{name}' declares a file for unknown domain '{unknown}'"
            )));
        }

        let mut files = BTreeMap::new();
        for domain in Domain::ALL {
            let nested = self.files.get(domain.key()).cloned();
            let flat = match self.rest.get(&domain.flat_key()) {
                None => None,
                Some(Value::String(path)) => Some(path.clone()),
                Some(_) => {
                    return Err(Error::invalid_document(format!(
                        "application '{name}': `{}` must be a string",
                        domain.flat_key()
                    )));
                }
            };
            let path = nested.or(flat).unwrap_or_else(|| domain.default_path(&name));
            files.insert(domain, path);
        }

        let mut depends_on: Vec<String> = Vec::with_capacity(self.depends_on.len());
        for dep in self.depends_on {
            if !depends_on.contains(&dep) {
                depends_on.push(dep);
            }
        }

        Ok(AppEntry {
            name,
            app_id,
            files,
            domain: self.domain,
            auth: self.auth,
            guest_space_id: self.guest_space_id.map(IdValue::into_string),
            depends_on,
        })
    }
}
