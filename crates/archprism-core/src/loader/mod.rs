//! Resource access and the per-run class index
//!
//! Abstracts byte access over plain files and archive entries, and keeps
//! one index from binary class names to their classfile bytes (compiled
//! class roots plus any JARs handed to the run). The index is built once,
//! read-only afterwards, and never outlives the analysis run.

use crate::error::{Error, Result};
use dashmap::DashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::ZipArchive;

/// Location of one readable resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceLocator {
    /// A file on disk
    File(PathBuf),
    /// An entry inside a ZIP/JAR archive
    ArchiveEntry {
        /// Archive path on disk
        archive: PathBuf,
        /// Entry name inside the archive
        entry: String,
    },
}

impl ResourceLocator {
    /// Stable identifier for logs and diagnostics
    pub fn identifier(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::ArchiveEntry { archive, entry } => {
                format!("jar:{}!{}", archive.display(), entry)
            }
        }
    }

    /// Read the full contents of the resource
    pub fn read(&self) -> Result<Vec<u8>> {
        match self {
            Self::File(path) => std::fs::read(path).map_err(|e| Error::io(path.clone(), e)),
            Self::ArchiveEntry { archive, entry } => {
                let file = File::open(archive).map_err(|e| Error::io(archive.clone(), e))?;
                let mut zip = ZipArchive::new(file)
                    .map_err(|e| Error::parse(archive.clone(), format!("not a zip archive: {e}")))?;
                let mut stream = zip.by_name(entry).map_err(|e| {
                    Error::parse(archive.clone(), format!("missing entry '{entry}': {e}"))
                })?;
                let mut bytes = Vec::with_capacity(stream.size() as usize);
                stream
                    .read_to_end(&mut bytes)
                    .map_err(|e| Error::io(archive.clone(), e))?;
                Ok(bytes)
            }
        }
    }
}

/// Maps fully-qualified binary class names to classfile bytes.
///
/// The Rust rendition of the source system's project classloader: instead
/// of defining classes reflectively, inspectors ask for the raw classfile
/// of a name and parse what they need.
#[derive(Debug, Default)]
pub struct ClassIndex {
    classes: DashMap<String, ResourceLocator>,
}

impl ClassIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every `.class` file under a package root directory. The
    /// directory itself is the default package, so `x/y/Foo.class` maps to
    /// `x.y.Foo`.
    pub fn register_class_dir(&self, root: &Path) -> Result<usize> {
        let mut registered = 0;
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("skipping unreadable path under {}: {e}", root.display());
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("class") {
                continue;
            }
            if let Ok(relative) = path.strip_prefix(root) {
                if let Some(fqn) = entry_to_fqn(&relative.to_string_lossy()) {
                    self.classes
                        .entry(fqn)
                        .or_insert_with(|| ResourceLocator::File(path.to_path_buf()));
                    registered += 1;
                }
            }
        }
        Ok(registered)
    }

    /// Register every `.class` entry of a JAR
    pub fn register_jar(&self, jar: &Path) -> Result<usize> {
        let file = File::open(jar).map_err(|e| Error::io(jar.to_path_buf(), e))?;
        let mut zip = ZipArchive::new(file)
            .map_err(|e| Error::parse(jar.to_path_buf(), format!("not a zip archive: {e}")))?;
        let mut registered = 0;
        for index in 0..zip.len() {
            let entry = zip
                .by_index(index)
                .map_err(|e| Error::parse(jar.to_path_buf(), format!("bad entry: {e}")))?;
            let name = entry.name().to_string();
            if let Some(fqn) = entry_to_fqn(&name) {
                self.classes
                    .entry(fqn)
                    .or_insert_with(|| ResourceLocator::ArchiveEntry {
                        archive: jar.to_path_buf(),
                        entry: name,
                    });
                registered += 1;
            }
        }
        Ok(registered)
    }

    /// Locator for a class name, when indexed
    pub fn resolve(&self, fqn: &str) -> Option<ResourceLocator> {
        self.classes.get(fqn).map(|entry| entry.value().clone())
    }

    /// True when the class name is indexed
    pub fn contains(&self, fqn: &str) -> bool {
        self.classes.contains_key(fqn)
    }

    /// Read the classfile bytes for a name
    pub fn load_class(&self, fqn: &str) -> Result<Vec<u8>> {
        let locator = self.resolve(fqn).ok_or_else(|| {
            Error::parse(PathBuf::from(fqn), "class not present in the class index")
        })?;
        locator.read()
    }

    /// Number of indexed classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// True when nothing is indexed
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// `x/y/Foo$Bar.class` → `x.y.Foo$Bar`; non-class and metadata entries
/// yield `None`.
fn entry_to_fqn(entry: &str) -> Option<String> {
    let normalized = entry.replace('\\', "/");
    let stem = normalized.strip_suffix(".class")?;
    if stem.is_empty() || stem == "module-info" || stem.ends_with("/module-info") {
        return None;
    }
    Some(stem.replace('/', "."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    #[test]
    fn entry_names_become_binary_names() {
        assert_eq!(entry_to_fqn("x/y/Foo.class"), Some("x.y.Foo".to_string()));
        assert_eq!(
            entry_to_fqn("x/Outer$Inner.class"),
            Some("x.Outer$Inner".to_string())
        );
        assert_eq!(entry_to_fqn("META-INF/MANIFEST.MF"), None);
        assert_eq!(entry_to_fqn("module-info.class"), None);
    }

    #[test]
    fn class_dir_indexing_and_loading() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("x/y")).unwrap();
        fs::write(dir.path().join("x/y/Foo.class"), b"\xCA\xFE\xBA\xBE").unwrap();
        fs::write(dir.path().join("readme.txt"), b"not a class").unwrap();

        let index = ClassIndex::new();
        assert_eq!(index.register_class_dir(dir.path()).unwrap(), 1);
        assert!(index.contains("x.y.Foo"));
        assert_eq!(index.load_class("x.y.Foo").unwrap(), b"\xCA\xFE\xBA\xBE");
        assert!(index.load_class("x.y.Missing").is_err());
    }

    #[test]
    fn jar_indexing_and_loading() {
        let dir = tempfile::tempdir().unwrap();
        let jar_path = dir.path().join("lib.jar");
        let file = File::create(&jar_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("a/b/Util.class", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"\xCA\xFE\xBA\xBE\x00\x00").unwrap();
        writer
            .start_file("META-INF/MANIFEST.MF", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"Manifest-Version: 1.0\n").unwrap();
        writer.finish().unwrap();

        let index = ClassIndex::new();
        assert_eq!(index.register_jar(&jar_path).unwrap(), 1);
        let bytes = index.load_class("a.b.Util").unwrap();
        assert_eq!(&bytes[..4], b"\xCA\xFE");
        let locator = index.resolve("a.b.Util").unwrap();
        assert!(locator.identifier().contains("lib.jar"));
    }
}
