//! Last-modified dates for documents.
//!
//! Templates receive a `lastCommit` value for every markdown page. Where it
//! comes from is pluggable: [`GitHistory`] asks git for the committer date of
//! the last commit touching the file, [`NoHistory`] always reports nothing.
//! A lookup that fails (git missing, file untracked, not a repository) is
//! not an error; the page simply renders without a date.

use crate::config::SiteConfig;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Source of the `lastCommit` template value.
pub trait LastModified: Send + Sync {
    /// Timestamp for `path`, or `None` when unknown.
    fn last_modified(&self, path: &Path) -> Option<String>;
}

/// Never knows a date.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHistory;

impl LastModified for NoHistory {
    fn last_modified(&self, _path: &Path) -> Option<String> {
        None
    }
}

/// Committer date (ISO 8601) of the last commit that touched a file.
#[derive(Debug, Clone)]
pub struct GitHistory {
    repo_dir: PathBuf,
}

impl GitHistory {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
        }
    }
}

impl LastModified for GitHistory {
    fn last_modified(&self, path: &Path) -> Option<String> {
        let path = std::path::absolute(path).ok()?;
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo_dir)
            .args(["log", "-1", "--format=%cI", "--"])
            .arg(&path)
            .output()
            .ok()
            .filter(|o| o.status.success())?;

        let stamp = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if stamp.is_empty() {
            tracing::debug!(path = %path.display(), "No commit found");
            None
        } else {
            Some(stamp)
        }
    }
}

/// The provider selected by `git_timestamps`.
pub fn from_config(config: &SiteConfig) -> Box<dyn LastModified> {
    if config.git_timestamps {
        Box::new(GitHistory::new(&config.sources_path))
    } else {
        Box::new(NoHistory)
    }
}
