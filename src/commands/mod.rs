//! Subcommand implementations
//!
//! - `plan` - Show the dependency-ordered application list
//! - `validate` - Load and check each application's schema file
//! - `diff` - Compare two schema exports offline

pub mod diff;
pub mod plan;
pub mod validate;

use anyhow::Result;
use declarative::ExecutionPlan;

use crate::cli::ProjectArgs;
use crate::config::Project;

/// Load the project and order the selected applications
fn load_plan(args: &ProjectArgs) -> Result<(Project, ExecutionPlan)> {
    let project = Project::load(&args.config)?;
    let plan = project.config.execution_plan()?.select(&args.apps)?;
    Ok((project, plan))
}
