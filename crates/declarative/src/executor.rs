//! Multi-application execution - runs an operation over a plan in order
//!
//! Applications run strictly one after another. The first failure stops
//! the run: every application after it is recorded as skipped and never
//! attempted. Nothing already applied is rolled back.

use crate::context::{NoProgress, ProgressCallback};
use crate::planner::ExecutionPlan;
use crate::project::AppEntry;
use crate::types::{AppOutcome, AppStatus, MultiAppResult};
use anyhow::Result;

/// Run `operation` for each application in the plan
///
/// Per-application errors never escape; they are captured in the
/// returned [`MultiAppResult`].
///
/// # Arguments
/// * `plan` - Applications in execution order
/// * `operation` - Work to perform for one application
/// * `progress` - Progress callback
pub fn run_multi_app<F, P>(plan: &ExecutionPlan, mut operation: F, progress: &mut P) -> MultiAppResult
where
    F: FnMut(&AppEntry) -> Result<()>,
    P: ProgressCallback,
{
    let total = plan.len();
    let mut results = Vec::with_capacity(total);
    let mut has_failure = false;

    for (index, app) in plan.iter().enumerate() {
        let status = if has_failure {
            AppStatus::Skipped
        } else {
            progress.on_app_start(&app.name, index, total);
            match operation(app) {
                Ok(()) => {
                    log::debug!("Application '{}' succeeded", app.name);
                    AppStatus::Succeeded
                }
                Err(error) => {
                    log::error!("Application '{}' failed: {:#}", app.name, error);
                    has_failure = true;
                    AppStatus::Failed { error }
                }
            }
        };

        if status.is_skipped() {
            log::debug!("Skipping application '{}' after earlier failure", app.name);
        }
        progress.on_app_complete(&app.name, &status);
        results.push(AppOutcome {
            app: app.name.clone(),
            status,
        });
    }

    MultiAppResult {
        results,
        has_failure,
    }
}

/// Simple execution without callbacks
pub fn run_multi_app_simple<F>(plan: &ExecutionPlan, operation: F) -> MultiAppResult
where
    F: FnMut(&AppEntry) -> Result<()>,
{
    run_multi_app(plan, operation, &mut NoProgress)
}
