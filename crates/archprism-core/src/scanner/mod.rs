//! Project file discovery (Phase 1)
//!
//! Walks the project root, applies the ignore filter and the hidden-path
//! rules, and installs one ProjectFile node per admissible file. No
//! inspectors run during discovery.

pub mod ignore;

pub use ignore::IgnoreFilter;

use crate::error::{Error, Result};
use crate::graph::{GraphNode, GraphRepository};
use crate::progress::ProgressReporter;
use chrono::Utc;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Subtree of the hidden `.analysis` directory that holds exploded
/// archives and stays visible to discovery.
const BINARIES_DIR: &str = ".analysis/binaries";

/// Result of a discovery walk
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// ProjectFile nodes created
    pub files_discovered: usize,
    /// Paths that could not be read
    pub errors: Vec<String>,
}

/// Walks a project root and populates the repository with ProjectFile nodes
pub struct ProjectScanner {
    root: PathBuf,
    filter: IgnoreFilter,
}

impl ProjectScanner {
    /// Create a scanner for the given root with compiled ignore patterns
    pub fn new(root: impl Into<PathBuf>, filter: IgnoreFilter) -> Self {
        Self {
            root: root.into(),
            filter,
        }
    }

    /// Discover files and create one ProjectFile node each.
    pub fn discover(
        &self,
        repository: &GraphRepository,
        progress: &Arc<dyn ProgressReporter>,
    ) -> Result<ScanOutcome> {
        if !self.root.is_dir() {
            return Err(Error::config(
                "projectRoot",
                format!("not a directory: {}", self.root.display()),
            ));
        }

        let mut outcome = ScanOutcome::default();
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 {
                    return true;
                }
                if entry.file_type().is_dir() {
                    self.admits_directory(entry.path())
                } else {
                    true
                }
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let message = format!("unreadable path during scan: {e}");
                    tracing::warn!("{message}");
                    progress.error(&message);
                    outcome.errors.push(message);
                    continue;
                }
            };
            if entry.depth() == 0 || !entry.file_type().is_file() {
                // Symlinks fail the is_file check (no link following).
                continue;
            }
            let path = entry.path();
            if !self.admits_file(path) {
                continue;
            }

            let relative = path
                .strip_prefix(&self.root)
                .map_err(|_| Error::invariant(format!("walked outside root: {}", path.display())))?
                .to_path_buf();
            let node = GraphNode::project_file(path.to_path_buf(), relative, Utc::now());
            repository.get_or_create_node(node)?;
            outcome.files_discovered += 1;
            progress.tick(outcome.files_discovered);
        }

        tracing::info!(
            files = outcome.files_discovered,
            errors = outcome.errors.len(),
            root = %self.root.display(),
            "file discovery finished"
        );
        Ok(outcome)
    }

    /// Directory admission: hidden directories are skipped except along the
    /// `.analysis/binaries` subtree, then the ignore filter applies.
    fn admits_directory(&self, path: &Path) -> bool {
        let relative = match path.strip_prefix(&self.root) {
            Ok(rel) => rel,
            Err(_) => return false,
        };
        if has_hidden_component(relative) && !within_binaries(relative) {
            return false;
        }
        !self.filter.is_ignored(relative, path, true)
    }

    /// File admission: hidden ancestry outside the binaries subtree and
    /// ignore patterns both exclude a file.
    fn admits_file(&self, path: &Path) -> bool {
        let relative = match path.strip_prefix(&self.root) {
            Ok(rel) => rel,
            Err(_) => return false,
        };
        if has_hidden_component(relative) && !within_binaries(relative) {
            return false;
        }
        !self.filter.is_ignored(relative, path, false)
    }
}

fn has_hidden_component(relative: &Path) -> bool {
    relative.components().any(|component| match component {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    })
}

/// True for `.analysis`, `.analysis/binaries` and anything below it
fn within_binaries(relative: &Path) -> bool {
    let text = relative.to_string_lossy().replace('\\', "/");
    text == ".analysis" || text == BINARIES_DIR || text.starts_with(&format!("{BINARIES_DIR}/"))
}
