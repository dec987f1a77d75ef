//! # Declarative
//!
//! Machinery for keeping a graph of interdependent applications in sync
//! with a declared configuration.
//!
//! ## Core Concepts
//!
//! - **ProjectConfig**: The parsed project document (apps, files, overrides)
//! - **ExecutionPlan**: Applications ordered so dependencies run first
//! - **DiffDomain**: How one configuration domain keys and compares elements
//! - **MultiAppResult**: Per-application outcomes of a fail-fast run
//!
//! ## Example
//!
//! ```no_run
//! use declarative::{ProjectConfig, run_multi_app_simple};
//!
//! let project = ProjectConfig::from_toml_str(r#"
//! [apps.customers]
//! appId = 12
//!
//! [apps.orders]
//! appId = 34
//! dependsOn = ["customers"]
//! "#)?;
//!
//! let plan = project.execution_plan()?;
//! let result = run_multi_app_simple(&plan, |app| {
//!     println!("syncing {} ({})", app.name, app.app_id);
//!     Ok(())
//! });
//! assert!(!result.has_failure);
//! # Ok::<(), declarative::Error>(())
//! ```
//!
//! ## Provider Traits
//!
//! - [`ProgressCallback`]: Receives progress updates during a run
//! - [`DiffDomain`]: Plugs a configuration domain into [`detect_diff`]

pub mod context;
pub mod diff;
pub mod error;
pub mod executor;
pub mod planner;
pub mod project;
pub mod types;

// Re-export main types at crate root
pub use context::{NoProgress, ProgressCallback};
pub use diff::{
    DiffDomain, DiffEntry, DiffKind, DiffResult, DiffSummary, PropertyChange, Side, detect_diff,
    group_by_kind,
};
pub use error::{Error, Result};
pub use executor::{run_multi_app, run_multi_app_simple};
pub use planner::{ExecutionPlan, resolve_execution_order};
pub use project::{AppEntry, Auth, Connection, Domain, ProjectConfig, validate_app_name};
pub use types::{AppOutcome, AppStatus, MultiAppResult, RunSummary};
