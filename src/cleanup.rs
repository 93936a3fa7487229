//! Cleanup Manager
//!
//! Best effort. A failed removal is reported and logged, never escalated.

use serde::Serialize;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::formats::{OutputFormat, OutputPaths};

/// Intermediates to delete once every step of a run has settled.
///
/// Built per run by [`crate::plan::resolve`] and moved into [`cleanup`].
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct CleanupPlan {
    pub remove_dot_after: bool,
    pub remove_svg_after: bool,
}

impl CleanupPlan {
    pub fn targets(&self) -> Vec<OutputFormat> {
        let mut targets = vec![];
        if self.remove_dot_after {
            targets.push(OutputFormat::Dot);
        }
        if self.remove_svg_after {
            targets.push(OutputFormat::Svg);
        }
        targets
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    pub failures: Vec<CleanupFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupFailure {
    pub path: PathBuf,
    pub error: String,
}

pub async fn cleanup(plan: CleanupPlan, paths: &OutputPaths) -> CleanupReport {
    let mut report = CleanupReport::default();

    for format in plan.targets() {
        let path = paths.get(format);
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                info!(path = %path.display(), "removed intermediate {}", format);
                report.removed.push(path.to_path_buf());
            }
            // The producing step failed; nothing was left behind.
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "intermediate {} not present", format);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to remove intermediate {}", format);
                report.failures.push(CleanupFailure {
                    path: path.to_path_buf(),
                    error: e.to_string(),
                });
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_follow_flags() {
        assert!(CleanupPlan::default().targets().is_empty());
        let plan = CleanupPlan { remove_dot_after: true, remove_svg_after: true };
        assert_eq!(plan.targets(), vec![OutputFormat::Dot, OutputFormat::Svg]);
    }

    #[tokio::test]
    async fn test_removes_only_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::new(dir.path());
        std::fs::write(paths.dot(), "digraph {}").unwrap();
        std::fs::write(paths.svg(), "<svg/>").unwrap();

        let plan = CleanupPlan { remove_dot_after: true, remove_svg_after: false };
        let report = cleanup(plan, &paths).await;

        assert_eq!(report.removed, vec![paths.dot().to_path_buf()]);
        assert!(report.failures.is_empty());
        assert!(!paths.dot().exists());
        assert!(paths.svg().exists());
    }

    #[tokio::test]
    async fn test_missing_file_is_not_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::new(dir.path());
        let plan = CleanupPlan { remove_dot_after: true, remove_svg_after: true };

        let report = cleanup(plan, &paths).await;

        assert!(report.removed.is_empty());
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn test_failure_reported_and_others_still_removed() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::new(dir.path());
        // A directory where the DOT file should be cannot be removed as a file.
        std::fs::create_dir(paths.dot()).unwrap();
        std::fs::write(paths.svg(), "<svg/>").unwrap();

        let plan = CleanupPlan { remove_dot_after: true, remove_svg_after: true };
        let report = cleanup(plan, &paths).await;

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, paths.dot().to_path_buf());
        assert_eq!(report.removed, vec![paths.svg().to_path_buf()]);
        assert!(paths.dot().exists());
    }
}
