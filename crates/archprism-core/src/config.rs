//! Immutable analysis run configuration

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for one analysis run. Built once at startup and read-only
/// afterwards; every knob the scheduler and scanner consult lives here.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Root directory of the project under analysis
    pub project_root: PathBuf,
    /// Gitignore-style patterns for paths to skip
    pub ignore_patterns: Vec<String>,
    /// Extra JARs appended to the class index
    pub extra_jars: Vec<PathBuf>,
    /// Safety cap on convergence passes per phase
    pub max_passes: usize,
    /// Worker threads for parallel inspector execution
    pub parallelism: usize,
    /// Optional wall-clock budget per inspector invocation
    pub inspector_timeout: Option<Duration>,
    /// Where Phase 5 writes the snapshot; `None` uses the default location
    pub snapshot_path: Option<PathBuf>,
}

impl AnalyzerConfig {
    /// Create a configuration with defaults for the given project root
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ignore_patterns: Vec::new(),
            extra_jars: Vec::new(),
            max_passes: 10,
            parallelism: num_cpus::get(),
            inspector_timeout: None,
            snapshot_path: None,
        }
    }

    /// Set ignore patterns
    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    /// Add JARs to the class index
    pub fn with_extra_jars(mut self, jars: Vec<PathBuf>) -> Self {
        self.extra_jars = jars;
        self
    }

    /// Override the convergence pass cap
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Override the worker count
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Set a per-inspector invocation timeout
    pub fn with_inspector_timeout(mut self, timeout: Duration) -> Self {
        self.inspector_timeout = Some(timeout);
        self
    }

    /// Set the snapshot output path
    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    /// Resolved snapshot location
    pub fn snapshot_file(&self) -> PathBuf {
        self.snapshot_path
            .clone()
            .unwrap_or_else(|| self.project_root.join(".analysis").join("graph.json"))
    }

    /// Validate the configuration. Runs before Phase 1; any failure here is
    /// fatal for the run.
    pub fn validate(&self) -> Result<()> {
        if !self.project_root.exists() {
            return Err(Error::config(
                "projectRoot",
                format!("path does not exist: {}", self.project_root.display()),
            ));
        }
        if !self.project_root.is_dir() {
            return Err(Error::config(
                "projectRoot",
                format!("not a directory: {}", self.project_root.display()),
            ));
        }
        if self.max_passes == 0 {
            return Err(Error::config("maxPasses", "must be at least 1"));
        }
        if self.parallelism == 0 {
            return Err(Error::config("parallelism", "must be at least 1"));
        }
        for jar in &self.extra_jars {
            if !jar.is_file() {
                return Err(Error::config(
                    "extraJars",
                    format!("not a file: {}", jar.display()),
                ));
            }
        }
        Ok(())
    }

    /// Project root as a borrowed path
    pub fn root(&self) -> &Path {
        &self.project_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AnalyzerConfig::new("/tmp");
        assert_eq!(config.max_passes, 10);
        assert!(config.parallelism >= 1);
        assert!(config.inspector_timeout.is_none());
        assert_eq!(
            config.snapshot_file(),
            PathBuf::from("/tmp/.analysis/graph.json")
        );
    }

    #[test]
    fn validate_rejects_missing_root() {
        let config = AnalyzerConfig::new("/definitely/not/here");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Configuration { ref key, .. } if key == "projectRoot"));
    }

    #[test]
    fn validate_rejects_zero_passes() {
        let dir = tempfile::tempdir().unwrap();
        let config = AnalyzerConfig::new(dir.path()).with_max_passes(0);
        assert!(config.validate().is_err());
    }
}
