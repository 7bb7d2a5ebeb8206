//! Inheritance edges

use crate::class::dependencies::resolve_candidates;
use crate::context::JavaAnalysisContext;
use crate::tags;
use archprism_core::{
    edge_types, ClassType, GraphNode, Inspector, NodeDecorator, NodeRef, NodeType, Result,
    SourceType,
};
use std::sync::Arc;

/// Records `extends` and `implements` edges toward project classes and the
/// declared supertypes as properties.
pub struct InheritanceInspector {
    context: Arc<JavaAnalysisContext>,
}

impl InheritanceInspector {
    /// Create the inspector
    pub fn new(context: Arc<JavaAnalysisContext>) -> Self {
        Self { context }
    }

    fn link(&self, decorator: &mut NodeDecorator, own_id: &str, fqn: &str, edge_type: &str) {
        if fqn != own_id && self.context.repository().find_class_by_fqn(fqn).is_some() {
            decorator.add_edge_to(NodeRef::java_class(fqn), edge_type);
        }
    }
}

impl Inspector for InheritanceInspector {
    fn name(&self) -> &str {
        "java-inheritance"
    }

    fn produces(&self) -> &[&str] {
        &[tags::INHERITANCE]
    }

    fn supports(&self, node: &GraphNode) -> bool {
        node.node_type == NodeType::JavaClass
    }

    fn inspect(&self, node: &GraphNode, decorator: &mut NodeDecorator) -> Result<()> {
        // Interfaces extend their super-interfaces; everything else
        // implements them.
        let interface_edge = if node.class_type() == Some(ClassType::Interface) {
            edge_types::EXTENDS
        } else {
            edge_types::IMPLEMENTS
        };

        match node.source_type() {
            Some(SourceType::Source) => {
                let file = match self.context.file_of_class(node) {
                    Some(file) => file,
                    None => return Ok(()),
                };
                let unit = self.context.source_unit(&file)?;
                let summary = match unit.types.iter().find(|t| unit.fqn_of(t) == node.id) {
                    Some(summary) => summary,
                    None => return Ok(()),
                };
                if let Some(written) = &summary.superclass {
                    let candidates = resolve_candidates(written, &unit);
                    let resolved = candidates
                        .iter()
                        .find(|c| self.context.repository().find_class_by_fqn(c).is_some())
                        .cloned()
                        .or_else(|| candidates.first().cloned());
                    if let Some(fqn) = resolved {
                        decorator.set_property("superClass", fqn.clone());
                        self.link(decorator, &node.id, &fqn, edge_types::EXTENDS);
                    }
                }
                let mut names = Vec::new();
                for written in &summary.interfaces {
                    let candidates = resolve_candidates(written, &unit);
                    let resolved = candidates
                        .iter()
                        .find(|c| self.context.repository().find_class_by_fqn(c).is_some())
                        .cloned()
                        .or_else(|| candidates.first().cloned());
                    if let Some(fqn) = resolved {
                        self.link(decorator, &node.id, &fqn, interface_edge);
                        names.push(fqn);
                    }
                }
                if !names.is_empty() {
                    names.sort();
                    decorator.set_property("interfaces", names);
                }
            }
            Some(SourceType::Binary) => {
                let file = match self.context.file_of_class(node) {
                    Some(file) => file,
                    None => return Ok(()),
                };
                let class = self.context.class_file(&file)?;
                if let Some(super_internal) = &class.super_class {
                    let fqn = super_internal.replace('/', ".");
                    if fqn != "java.lang.Object" {
                        decorator.set_property("superClass", fqn.clone());
                        self.link(decorator, &node.id, &fqn, edge_types::EXTENDS);
                    }
                }
                let mut names = Vec::new();
                for interface in &class.interfaces {
                    let fqn = interface.replace('/', ".");
                    self.link(decorator, &node.id, &fqn, interface_edge);
                    names.push(fqn);
                }
                if !names.is_empty() {
                    names.sort();
                    decorator.set_property("interfaces", names);
                }
            }
            None => {}
        }

        decorator.enable_tag(tags::INHERITANCE);
        Ok(())
    }
}
