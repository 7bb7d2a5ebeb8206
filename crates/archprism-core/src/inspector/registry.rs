//! Explicit inspector registration

use crate::inspector::{CollectorRef, InspectorRef};
use crate::graph::NodeType;

/// Registry of collectors and inspectors for one analysis run.
///
/// Consumers construct their analyzer instances and register them here
/// before the run starts; the registry is read-only afterwards. Inspectors
/// are keyed by the node variant they operate on, so file-inspectors and
/// class-inspectors are scheduled independently.
#[derive(Default)]
pub struct InspectorRegistry {
    collectors: Vec<CollectorRef>,
    file_inspectors: Vec<InspectorRef>,
    class_inspectors: Vec<InspectorRef>,
}

impl InspectorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a Phase 2 collector
    pub fn register_collector(&mut self, collector: CollectorRef) {
        self.collectors.push(collector);
    }

    /// Register a Phase 3 file inspector
    pub fn register_file_inspector(&mut self, inspector: InspectorRef) {
        self.file_inspectors.push(inspector);
    }

    /// Register a Phase 4 class inspector
    pub fn register_class_inspector(&mut self, inspector: InspectorRef) {
        self.class_inspectors.push(inspector);
    }

    /// Collectors in registration order
    pub fn collectors(&self) -> &[CollectorRef] {
        &self.collectors
    }

    /// Inspectors for the given node variant
    pub fn inspectors_for(&self, node_type: NodeType) -> &[InspectorRef] {
        match node_type {
            NodeType::ProjectFile => &self.file_inspectors,
            NodeType::JavaClass => &self.class_inspectors,
            _ => &[],
        }
    }

    /// Total number of registered inspectors
    pub fn inspector_count(&self) -> usize {
        self.file_inspectors.len() + self.class_inspectors.len()
    }
}
