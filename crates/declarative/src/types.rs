//! Outcome types for multi-application runs

use std::fmt;

/// Outcome of running an operation against one application
#[derive(Debug)]
pub enum AppStatus {
    /// The operation completed
    Succeeded,
    /// The operation returned an error
    Failed { error: anyhow::Error },
    /// Never attempted because an earlier application failed
    Skipped,
}

impl AppStatus {
    /// Check if the operation completed
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    /// Captured error, if the operation failed
    pub fn error(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Failed { error } => Some(error),
            _ => None,
        }
    }

    /// Short label for display
    pub fn label(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed { .. } => "failed",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for AppStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed { error } => write!(f, "failed: {error:#}"),
            other => f.write_str(other.label()),
        }
    }
}

/// Outcome for one named application
#[derive(Debug)]
pub struct AppOutcome {
    pub app: String,
    pub status: AppStatus,
}

/// Outcomes for every application in a plan, in plan order
#[derive(Debug, Default)]
pub struct MultiAppResult {
    pub results: Vec<AppOutcome>,
    /// True if any application failed
    pub has_failure: bool,
}

impl MultiAppResult {
    /// Find the outcome for an application
    pub fn get(&self, app: &str) -> Option<&AppOutcome> {
        self.results.iter().find(|r| r.app == app)
    }

    /// The failing application and its error, if any
    pub fn failure(&self) -> Option<(&str, &anyhow::Error)> {
        self.results
            .iter()
            .find_map(|r| r.status.error().map(|e| (r.app.as_str(), e)))
    }

    /// Count outcomes by status
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for outcome in &self.results {
            match outcome.status {
                AppStatus::Succeeded => summary.succeeded += 1,
                AppStatus::Failed { .. } => summary.failed += 1,
                AppStatus::Skipped => summary.skipped += 1,
            }
        }
        summary
    }
}

/// Summary of a multi-application run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunSummary {
    /// Total number of applications
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }

    /// Check if the run was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let result = MultiAppResult {
            results: vec![
                AppOutcome {
                    app: "a".into(),
                    status: AppStatus::Succeeded,
                },
                AppOutcome {
                    app: "b".into(),
                    status: AppStatus::Failed {
                        error: anyhow::anyhow!("boom"),
                    },
                },
                AppOutcome {
                    app: "c".into(),
                    status: AppStatus::Skipped,
                },
            ],
            has_failure: true,
        };

        let summary = result.summary();
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.failed, 1);
        assert!(!summary.is_success());

        let (app, error) = result.failure().unwrap();
        assert_eq!(app, "b");
        assert_eq!(error.to_string(), "boom");
        assert_eq!(result.get("c").unwrap().status.label(), "skipped");
    }
}
