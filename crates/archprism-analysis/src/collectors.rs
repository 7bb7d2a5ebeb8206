//! Phase 2 collectors: project files to JavaClass seeds

use crate::context::JavaAnalysisContext;
use crate::tags;
use archprism_core::{
    ClassSeed, ClassType, CollectOutcome, Collector, GraphNode, NodeOp, Result, SourceType,
};
use archprism_lang_java::{recover_type_names, JavaTypeKind, TypeKind};
use std::sync::Arc;

/// Map a source declaration kind onto the graph's class type
pub(crate) fn class_type_of(kind: TypeKind) -> ClassType {
    match kind {
        TypeKind::Class => ClassType::Class,
        TypeKind::Interface => ClassType::Interface,
        TypeKind::Enum => ClassType::Enum,
        TypeKind::Annotation => ClassType::Annotation,
        TypeKind::Record => ClassType::Record,
    }
}

/// Map a bytecode classification onto the graph's class type
pub(crate) fn class_type_of_binary(kind: JavaTypeKind) -> ClassType {
    match kind {
        JavaTypeKind::Class => ClassType::Class,
        JavaTypeKind::Interface => ClassType::Interface,
        JavaTypeKind::Enum => ClassType::Enum,
        JavaTypeKind::Annotation => ClassType::Annotation,
        JavaTypeKind::Record => ClassType::Record,
    }
}

/// Collects class nodes from `.java` sources. A file the parser rejects
/// outright still seeds partial nodes for every type name the fallback
/// scan can recover.
pub struct SourceClassCollector {
    context: Arc<JavaAnalysisContext>,
}

impl SourceClassCollector {
    /// Create the collector
    pub fn new(context: Arc<JavaAnalysisContext>) -> Self {
        Self { context }
    }
}

impl Collector for SourceClassCollector {
    fn name(&self) -> &str {
        "java-source-collector"
    }

    fn supports(&self, file: &GraphNode) -> bool {
        file.extension() == Some("java")
    }

    fn collect(&self, file: &GraphNode) -> Result<CollectOutcome> {
        let mut outcome = CollectOutcome::default();
        outcome.file_ops.push(NodeOp::EnableTag(tags::JAVA_SOURCE.into()));
        outcome
            .file_ops
            .push(NodeOp::SetProperty("hasSource".into(), true.into()));

        match self.context.source_unit(file) {
            Ok(unit) => {
                outcome.file_ops.push(NodeOp::SetProperty(
                    "packageName".into(),
                    unit.package_name.clone().into(),
                ));
                if let Some(first) = unit.types.first() {
                    outcome.file_ops.push(NodeOp::SetProperty(
                        "className".into(),
                        unit.fqn_of(first).into(),
                    ));
                }
                for diagnostic in &unit.diagnostics {
                    outcome.file_ops.push(NodeOp::Diagnostic(diagnostic.clone()));
                }
                for summary in &unit.types {
                    outcome.seeds.push(
                        ClassSeed::new(
                            unit.fqn_of(summary),
                            class_type_of(summary.kind),
                            SourceType::Source,
                        )
                        .with_tag(tags::JAVA_SOURCE),
                    );
                }
            }
            Err(e) => {
                // Name recovery keeps Phase 2 productive on files the
                // parser cannot handle at all.
                outcome
                    .file_ops
                    .push(NodeOp::Diagnostic(format!("ERROR: {e}")));
                let bytes = self.context.read_file(file)?;
                let content = String::from_utf8_lossy(&bytes);
                let (package, names) = recover_type_names(&content);
                for name in names {
                    let fqn = if package.is_empty() {
                        name
                    } else {
                        format!("{package}.{name}")
                    };
                    outcome.seeds.push(
                        ClassSeed::new(fqn, ClassType::Class, SourceType::Source)
                            .with_tag(tags::JAVA_SOURCE)
                            .with_tag(tags::PARTIAL),
                    );
                }
            }
        }
        Ok(outcome)
    }
}

/// Collects class nodes from compiled `.class` files
pub struct BinaryClassCollector {
    context: Arc<JavaAnalysisContext>,
}

impl BinaryClassCollector {
    /// Create the collector
    pub fn new(context: Arc<JavaAnalysisContext>) -> Self {
        Self { context }
    }
}

impl Collector for BinaryClassCollector {
    fn name(&self) -> &str {
        "java-binary-collector"
    }

    fn supports(&self, file: &GraphNode) -> bool {
        file.extension() == Some("class")
    }

    fn collect(&self, file: &GraphNode) -> Result<CollectOutcome> {
        let mut outcome = CollectOutcome::default();
        outcome.file_ops.push(NodeOp::EnableTag(tags::JAVA_BINARY.into()));
        outcome
            .file_ops
            .push(NodeOp::SetProperty("hasBinary".into(), true.into()));

        match self.context.class_file(file) {
            Ok(class) => {
                if class.is_module_info() {
                    return Ok(outcome);
                }
                let fqn = class.fqn();
                let (package, _) = archprism_core::graph::split_fqn(&fqn);
                outcome
                    .file_ops
                    .push(NodeOp::SetProperty("className".into(), fqn.clone().into()));
                outcome
                    .file_ops
                    .push(NodeOp::SetProperty("packageName".into(), package.into()));
                outcome.seeds.push(
                    ClassSeed::new(
                        fqn,
                        class_type_of_binary(class.kind()),
                        SourceType::Binary,
                    )
                    .with_tag(tags::JAVA_BINARY),
                );
            }
            Err(e) => {
                // No name is recoverable from a broken classfile; keep the
                // diagnostic and move on.
                outcome
                    .file_ops
                    .push(NodeOp::Diagnostic(format!("ERROR: {e}")));
            }
        }
        Ok(outcome)
    }
}
