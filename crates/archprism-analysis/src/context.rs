//! Shared parsing context for the built-in Java analyzers

use archprism_core::{AnalyzerConfig, ClassIndex, Error, GraphNode, GraphRepository, Result};
use archprism_lang_java::{ClassFile, JavaSourceParser, SourceUnit};
use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Capabilities injected into the built-in collectors and inspectors: the
/// two parsers, per-file parse caches, read access to the repository, and
/// the class index over compiled roots and extra JARs.
///
/// Parse results are cached by file node id, so the many inspectors that
/// look at one class share a single parse (and re-runs across convergence
/// passes stay cheap).
pub struct JavaAnalysisContext {
    repository: Arc<GraphRepository>,
    parser: JavaSourceParser,
    class_index: Arc<ClassIndex>,
    source_units: DashMap<String, Arc<SourceUnit>>,
    class_files: DashMap<String, Arc<ClassFile>>,
}

impl JavaAnalysisContext {
    /// Build the context for one run: indexes `.analysis/binaries` (when
    /// present) and every configured extra JAR.
    pub fn new(config: &AnalyzerConfig, repository: Arc<GraphRepository>) -> Result<Self> {
        let class_index = ClassIndex::new();
        let binaries = config.project_root.join(".analysis").join("binaries");
        if binaries.is_dir() {
            let count = class_index.register_class_dir(&binaries)?;
            tracing::debug!(count, "indexed exploded binaries");
        }
        for jar in &config.extra_jars {
            let count = class_index.register_jar(jar)?;
            tracing::debug!(count, jar = %jar.display(), "indexed jar");
        }
        Ok(Self {
            repository,
            parser: JavaSourceParser::new(),
            class_index: Arc::new(class_index),
            source_units: DashMap::new(),
            class_files: DashMap::new(),
        })
    }

    /// The shared repository
    pub fn repository(&self) -> &GraphRepository {
        &self.repository
    }

    /// The per-run class index
    pub fn class_index(&self) -> &ClassIndex {
        &self.class_index
    }

    /// Parse (or fetch the cached parse of) a `.java` project file
    pub fn source_unit(&self, file: &GraphNode) -> Result<Arc<SourceUnit>> {
        if let Some(unit) = self.source_units.get(&file.id) {
            return Ok(Arc::clone(unit.value()));
        }
        let path = self.file_path(file)?;
        let content = std::fs::read_to_string(&path).map_err(|e| Error::io(path.clone(), e))?;
        let unit = self
            .parser
            .parse(&path, &content)
            .map_err(|e| Error::parse(path, e.to_string()))?;
        let unit = Arc::new(unit);
        self.source_units.insert(file.id.clone(), Arc::clone(&unit));
        Ok(unit)
    }

    /// Parse (or fetch the cached parse of) a `.class` project file
    pub fn class_file(&self, file: &GraphNode) -> Result<Arc<ClassFile>> {
        if let Some(class) = self.class_files.get(&file.id) {
            return Ok(Arc::clone(class.value()));
        }
        let path = self.file_path(file)?;
        let bytes = std::fs::read(&path).map_err(|e| Error::io(path.clone(), e))?;
        let class = ClassFile::parse(&bytes).map_err(|e| Error::parse(path, e.to_string()))?;
        let class = Arc::new(class);
        self.class_files.insert(file.id.clone(), Arc::clone(&class));
        Ok(class)
    }

    /// The project file node backing a class node, when it has one
    pub fn file_of_class(&self, class: &GraphNode) -> Option<GraphNode> {
        let file_id = class.project_file_id()?;
        self.repository
            .find_by_id(archprism_core::NodeType::ProjectFile, file_id)
    }

    fn file_path(&self, file: &GraphNode) -> Result<PathBuf> {
        file.absolute_path().cloned().ok_or_else(|| {
            Error::invariant(format!("node '{}' is not a project file", file.id))
        })
    }

    /// Raw file content helper for file-level inspectors
    pub fn read_file(&self, file: &GraphNode) -> Result<Vec<u8>> {
        let path = self.file_path(file)?;
        std::fs::read(&path).map_err(|e| Error::io(path, e))
    }
}
