//! Phase 3 file inspectors

use crate::context::JavaAnalysisContext;
use crate::tags;
use archprism_core::{
    edge_types, GraphNode, Inspector, NodeDecorator, NodeType, Result,
};
use std::sync::Arc;

/// Baseline per-file facts: name, extension, size and a coarse kind
pub struct FileInfoInspector {
    context: Arc<JavaAnalysisContext>,
}

impl FileInfoInspector {
    /// Create the inspector
    pub fn new(context: Arc<JavaAnalysisContext>) -> Self {
        Self { context }
    }
}

impl Inspector for FileInfoInspector {
    fn name(&self) -> &str {
        "file-info"
    }

    fn produces(&self) -> &[&str] {
        &[tags::FILE_INFO]
    }

    fn supports(&self, node: &GraphNode) -> bool {
        node.node_type == NodeType::ProjectFile
    }

    fn inspect(&self, node: &GraphNode, decorator: &mut NodeDecorator) -> Result<()> {
        let extension = node.extension().unwrap_or("").to_string();
        decorator.set_property("extension", extension.clone());
        decorator.set_property("relativePath", node.id.to_string());
        let kind = match extension.as_str() {
            "java" => "source",
            "class" => "binary",
            "jar" | "war" | "ear" => "archive",
            _ => "resource",
        };
        decorator.set_property("fileKind", kind);
        match self.context.read_file(node) {
            Ok(bytes) => decorator.set_property("sizeBytes", bytes.len()),
            Err(e) => decorator.error(format!("unreadable file: {e}")),
        }
        decorator.enable_tag(tags::FILE_INFO);
        Ok(())
    }
}

/// Cross-links `.java` and `.class` sightings of one type: a file whose
/// classes were also collected from the other representation gets both
/// `hasSource` and `hasBinary`.
pub struct JavaFilePairingInspector {
    context: Arc<JavaAnalysisContext>,
}

impl JavaFilePairingInspector {
    /// Create the inspector
    pub fn new(context: Arc<JavaAnalysisContext>) -> Self {
        Self { context }
    }
}

impl Inspector for JavaFilePairingInspector {
    fn name(&self) -> &str {
        "java-file-pairing"
    }

    fn requires(&self) -> &[&str] {
        &[tags::FILE_INFO]
    }

    fn supports(&self, node: &GraphNode) -> bool {
        node.node_type == NodeType::ProjectFile
            && matches!(node.extension(), Some("java") | Some("class"))
    }

    fn inspect(&self, node: &GraphNode, decorator: &mut NodeDecorator) -> Result<()> {
        let repository = self.context.repository();
        let file_ref = archprism_core::NodeRef::project_file(node.id.clone());
        let mut class_names = Vec::new();
        let mut has_source = node.extension() == Some("java");
        let mut has_binary = node.extension() == Some("class");

        for edge in repository.outgoing_edges(&file_ref, Some(edge_types::CONTAINS)) {
            class_names.push(edge.target.id.clone());
            // Another file containing the same class from the other
            // representation flips the paired flag.
            for sibling in repository.incoming_edges(&edge.target, Some(edge_types::CONTAINS)) {
                if let Some(other) =
                    repository.find_by_id(NodeType::ProjectFile, &sibling.source.id)
                {
                    match other.extension() {
                        Some("java") => has_source = true,
                        Some("class") => has_binary = true,
                        _ => {}
                    }
                }
            }
        }

        class_names.sort();
        decorator.set_property("classNames", class_names);
        decorator.set_property("hasSource", has_source);
        decorator.set_property("hasBinary", has_binary);
        Ok(())
    }
}
