//! Progress traits for multi-application runs
//!
//! These traits let callers observe a run without the crate depending
//! on any particular terminal or UI implementation.

use crate::types::AppStatus;

/// Progress callback for multi-application execution
///
/// Implement this trait to receive progress updates during a run.
pub trait ProgressCallback {
    /// Called before the operation runs for an application
    ///
    /// # Arguments
    /// * `app` - Name of the application
    /// * `index` - Zero-based position in the plan
    /// * `total` - Number of applications in the plan
    fn on_app_start(&mut self, app: &str, index: usize, total: usize);

    /// Called once an application has an outcome (including skips)
    fn on_app_complete(&mut self, app: &str, status: &AppStatus);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_app_start(&mut self, _app: &str, _index: usize, _total: usize) {}
    fn on_app_complete(&mut self, _app: &str, _status: &AppStatus) {}
}
