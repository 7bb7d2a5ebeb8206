//! Class dependency edges

use crate::context::JavaAnalysisContext;
use crate::tags;
use archprism_core::{
    edge_types, GraphNode, Inspector, NodeDecorator, NodeRef, NodeType, Result, SourceType,
};
use archprism_lang_java::SourceUnit;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Candidate fully-qualified names for a type written as `name` inside
/// `unit`, in resolution priority order. Binding resolution is off, so
/// this is the classic import/package heuristic.
pub(crate) fn resolve_candidates(name: &str, unit: &SourceUnit) -> Vec<String> {
    if name.contains('.') {
        return vec![name.to_string()];
    }
    let mut candidates = Vec::new();
    for import in &unit.imports {
        if let Some(target) = import.target_class() {
            if target.rsplit('.').next() == Some(name) {
                candidates.push(target);
            }
        }
    }
    if unit.package_name.is_empty() {
        candidates.push(name.to_string());
    } else {
        candidates.push(format!("{}.{}", unit.package_name, name));
    }
    candidates
}

#[derive(Default)]
struct Referenced {
    /// Classes with a node in the repository; these become edges
    internal: BTreeSet<String>,
    /// Classes resolvable through the class index (JARs, exploded archives)
    library: BTreeSet<String>,
    /// Everything else (JDK and unresolved references)
    external: BTreeSet<String>,
}

/// Resolves each referenced class against the repository and records
/// `imports` edges toward project classes. References outside the project
/// are counted as library or external dependencies, never turned into
/// edges.
pub struct DependencyInspector {
    context: Arc<JavaAnalysisContext>,
}

impl DependencyInspector {
    /// Create the inspector
    pub fn new(context: Arc<JavaAnalysisContext>) -> Self {
        Self { context }
    }

    fn classify(&self, fqn: String, own_id: &str, referenced: &mut Referenced) {
        if fqn == own_id {
            return;
        }
        if self.context.repository().find_class_by_fqn(&fqn).is_some() {
            referenced.internal.insert(fqn);
        } else if self.context.class_index().contains(&fqn) {
            referenced.library.insert(fqn);
        } else {
            referenced.external.insert(fqn);
        }
    }
}

impl Inspector for DependencyInspector {
    fn name(&self) -> &str {
        "java-dependencies"
    }

    fn produces(&self) -> &[&str] {
        &[tags::DEPENDENCIES]
    }

    fn supports(&self, node: &GraphNode) -> bool {
        node.node_type == NodeType::JavaClass
    }

    fn inspect(&self, node: &GraphNode, decorator: &mut NodeDecorator) -> Result<()> {
        let mut referenced = Referenced::default();

        match node.source_type() {
            Some(SourceType::Source) => {
                let file = match self.context.file_of_class(node) {
                    Some(file) => file,
                    None => {
                        decorator.error("class has no backing project file");
                        return Ok(());
                    }
                };
                let unit = self.context.source_unit(&file)?;
                for import in &unit.imports {
                    if let Some(target) = import.target_class() {
                        self.classify(target, &node.id, &mut referenced);
                    }
                }
                if let Some(summary) = unit.types.iter().find(|t| unit.fqn_of(t) == node.id) {
                    let written: Vec<&String> =
                        summary.superclass.iter().chain(summary.interfaces.iter()).collect();
                    for name in written {
                        let candidates = resolve_candidates(name, &unit);
                        let resolved = candidates
                            .iter()
                            .find(|c| self.context.repository().find_class_by_fqn(c).is_some())
                            .or(candidates.first());
                        if let Some(fqn) = resolved {
                            self.classify(fqn.clone(), &node.id, &mut referenced);
                        }
                    }
                }
            }
            Some(SourceType::Binary) => {
                let file = match self.context.file_of_class(node) {
                    Some(file) => file,
                    None => {
                        decorator.error("class has no backing project file");
                        return Ok(());
                    }
                };
                let class = self.context.class_file(&file)?;
                for name in &class.referenced_classes {
                    self.classify(name.clone(), &node.id, &mut referenced);
                }
            }
            None => return Ok(()),
        }

        for target in &referenced.internal {
            decorator.add_edge_to(NodeRef::java_class(target.clone()), edge_types::IMPORTS);
        }
        decorator.set_property(
            "internalDependencies",
            referenced.internal.iter().cloned().collect::<Vec<_>>(),
        );
        decorator.set_property(
            "libraryDependencies",
            referenced.library.iter().cloned().collect::<Vec<_>>(),
        );
        decorator.set_property(
            "externalDependencies",
            referenced.external.iter().cloned().collect::<Vec<_>>(),
        );
        decorator.enable_tag(tags::DEPENDENCIES);
        Ok(())
    }
}
