//! Built-in Java analyzers for archprism
//!
//! The collectors and inspectors in this crate instantiate the core
//! framework for Java projects: class collection from sources and
//! bytecode, per-class metrics, dependency and inheritance edges, and
//! coupling/instability measures.

pub mod class;
pub mod collectors;
pub mod context;
pub mod file;

pub use class::{
    BytecodeMetricsInspector, CouplingInspector, DependencyInspector, InheritanceInspector,
    SourceMetricsInspector,
};
pub use collectors::{BinaryClassCollector, SourceClassCollector};
pub use context::JavaAnalysisContext;
pub use file::{FileInfoInspector, JavaFilePairingInspector};

use archprism_core::{
    AnalysisEngine, AnalyzerConfig, GraphRepository, InspectorRegistry, Result,
};
use std::sync::Arc;

/// Tags produced and consumed by the built-in analyzers
pub mod tags {
    /// File or class originates from `.java` source
    pub const JAVA_SOURCE: &str = "java.source";
    /// File or class originates from a `.class` file
    pub const JAVA_BINARY: &str = "java.binary";
    /// Class node seeded by name recovery from an unparseable file
    pub const PARTIAL: &str = "java.partial";
    /// Baseline file facts are present
    pub const FILE_INFO: &str = "file.info";
    /// Size and complexity metrics are present
    pub const METRICS: &str = "java.metrics";
    /// Dependency edges are present
    pub const DEPENDENCIES: &str = "java.dependencies";
    /// Inheritance edges are present
    pub const INHERITANCE: &str = "java.inheritance";
    /// Coupling metrics are present
    pub const COUPLING: &str = "java.coupling";
}

/// Register the full built-in analyzer set
pub fn register_java_analyzers(registry: &mut InspectorRegistry, context: Arc<JavaAnalysisContext>) {
    registry.register_collector(Arc::new(SourceClassCollector::new(Arc::clone(&context))));
    registry.register_collector(Arc::new(BinaryClassCollector::new(Arc::clone(&context))));

    registry.register_file_inspector(Arc::new(FileInfoInspector::new(Arc::clone(&context))));
    registry.register_file_inspector(Arc::new(JavaFilePairingInspector::new(Arc::clone(&context))));

    registry.register_class_inspector(Arc::new(SourceMetricsInspector::new(Arc::clone(&context))));
    registry.register_class_inspector(Arc::new(BytecodeMetricsInspector::new(Arc::clone(&context))));
    registry.register_class_inspector(Arc::new(DependencyInspector::new(Arc::clone(&context))));
    registry.register_class_inspector(Arc::new(InheritanceInspector::new(Arc::clone(&context))));
    registry.register_class_inspector(Arc::new(CouplingInspector::new(context)));
}

/// Build a ready-to-run engine with the built-in Java analyzer set
pub fn java_analysis_engine(config: AnalyzerConfig) -> Result<AnalysisEngine> {
    let repository = Arc::new(GraphRepository::new());
    let context = Arc::new(JavaAnalysisContext::new(&config, Arc::clone(&repository))?);
    let mut registry = InspectorRegistry::new();
    register_java_analyzers(&mut registry, context);
    Ok(AnalysisEngine::new(config, registry).with_repository(repository))
}
