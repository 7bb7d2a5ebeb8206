//! Gitignore-style path filtering

use crate::error::{Error, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

#[derive(Debug, Clone, Copy)]
struct PatternMeta {
    /// Pattern ended with `/`, so it only matches directories
    dir_only: bool,
}

/// Compiled ignore patterns.
///
/// Lines follow gitignore conventions: `#` starts a comment, `/` separates
/// segments, `**` globs recursively, a trailing `/` restricts the pattern
/// to directories. Each pattern is matched against the project-relative
/// path and the absolute path. Anything that goes wrong while matching a
/// single path defaults to "do not ignore".
#[derive(Debug)]
pub struct IgnoreFilter {
    set: GlobSet,
    metas: Vec<PatternMeta>,
}

impl IgnoreFilter {
    /// Compile a pattern list. An unparseable pattern is a configuration
    /// error and fails the run before Phase 1.
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        let mut metas = Vec::new();
        for line in patterns {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let dir_only = line.ends_with('/');
            let body = line.trim_end_matches('/');
            let meta = PatternMeta { dir_only };

            // Patterns float to any depth like gitignore basenames; the
            // `**/` variant also lets anchored patterns hit absolute paths.
            for variant in [body.to_string(), format!("**/{body}")] {
                let glob = Glob::new(&variant).map_err(|e| {
                    Error::config("ignorePatterns", format!("invalid pattern '{line}': {e}"))
                })?;
                builder.add(glob);
                metas.push(meta);
            }
        }
        let set = builder
            .build()
            .map_err(|e| Error::config("ignorePatterns", format!("pattern set: {e}")))?;
        Ok(Self { set, metas })
    }

    /// Whether a path should be skipped. `is_dir` selects whether
    /// directory-only patterns apply.
    pub fn is_ignored(&self, relative: &Path, absolute: &Path, is_dir: bool) -> bool {
        self.matches(relative, is_dir) || self.matches(absolute, is_dir)
    }

    fn matches(&self, path: &Path, is_dir: bool) -> bool {
        self.set
            .matches(path)
            .into_iter()
            .any(|idx| match self.metas.get(idx) {
                Some(meta) => is_dir || !meta.dir_only,
                // Out-of-range index would be a globset bug; do not ignore.
                None => false,
            })
    }

    /// Number of compiled pattern variants
    pub fn len(&self) -> usize {
        self.metas.len()
    }

    /// True when no patterns were supplied
    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn filter(lines: &[&str]) -> IgnoreFilter {
        let patterns: Vec<String> = lines.iter().map(|s| s.to_string()).collect();
        IgnoreFilter::new(&patterns).unwrap()
    }

    fn ignored(f: &IgnoreFilter, rel: &str, is_dir: bool) -> bool {
        f.is_ignored(
            &PathBuf::from(rel),
            &PathBuf::from("/project").join(rel),
            is_dir,
        )
    }

    #[test]
    fn comments_and_blanks_are_skipped() {
        let f = filter(&["# build output", "", "target/"]);
        assert!(ignored(&f, "target", true));
        assert!(!ignored(&f, "src", true));
    }

    #[test]
    fn bare_name_floats_to_any_depth() {
        let f = filter(&["generated"]);
        assert!(ignored(&f, "generated", true));
        assert!(ignored(&f, "src/main/generated", true));
    }

    #[test]
    fn recursive_glob() {
        let f = filter(&["**/*.min.js"]);
        assert!(ignored(&f, "web/dist/app.min.js", false));
        assert!(!ignored(&f, "web/dist/app.js", false));
    }

    #[test]
    fn trailing_slash_is_directory_only() {
        let f = filter(&["build/"]);
        assert!(ignored(&f, "build", true));
        assert!(!ignored(&f, "build", false), "files named 'build' survive");
    }

    #[test]
    fn anchored_pattern() {
        let f = filter(&["src/legacy/*.java"]);
        assert!(ignored(&f, "src/legacy/Old.java", false));
        assert!(!ignored(&f, "src/main/Old.java", false));
    }

    #[test]
    fn absolute_paths_match_too() {
        let f = filter(&["**/vendored/**"]);
        let rel = PathBuf::from("x.txt");
        let abs = PathBuf::from("/project/vendored/deep/x.txt");
        assert!(f.is_ignored(&rel, &abs, false));
    }

    #[test]
    fn invalid_pattern_is_configuration_error() {
        let err = IgnoreFilter::new(&["a[".to_string()]).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }
}
