//! Per-invocation write handle for inspectors

use crate::graph::{NodeOp, NodeRef, NodeType, PropertyValue};

/// A requested edge from the decorated node to another node
#[derive(Debug, Clone)]
pub struct EdgeRequest {
    /// Target endpoint; must exist in the repository when applied
    pub target: NodeRef,
    /// Edge type string
    pub edge_type: String,
}

/// The handle through which an inspector writes to one node.
///
/// Writes are buffered and applied by the scheduler in one critical
/// section per node: properties merge under the priority rule, tags are
/// set-union, diagnostics append, and requested edges go through the
/// repository's idempotent `get_or_create_edge`.
#[derive(Debug)]
pub struct NodeDecorator {
    node_ref: NodeRef,
    ops: Vec<NodeOp>,
    edges: Vec<EdgeRequest>,
    errors: usize,
}

impl NodeDecorator {
    /// Create a decorator for the given node
    pub fn new(node_ref: NodeRef) -> Self {
        Self {
            node_ref,
            ops: Vec::new(),
            edges: Vec::new(),
            errors: 0,
        }
    }

    /// Id of the wrapped node
    pub fn node_id(&self) -> &str {
        &self.node_ref.id
    }

    /// Type of the wrapped node
    pub fn node_type(&self) -> NodeType {
        self.node_ref.node_type
    }

    /// Write a property; the repository merges it under the priority rule
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.ops.push(NodeOp::SetProperty(key.into(), value.into()));
    }

    /// Add a tag to the node
    pub fn enable_tag(&mut self, tag: impl Into<String>) {
        self.ops.push(NodeOp::EnableTag(tag.into()));
    }

    /// Record an error on the node's diagnostic log
    pub fn error(&mut self, message: impl Into<String>) {
        self.errors += 1;
        self.ops.push(NodeOp::Diagnostic(message.into()));
    }

    /// Request an edge from this node to `target`
    pub fn add_edge_to(&mut self, target: NodeRef, edge_type: impl Into<String>) {
        self.edges.push(EdgeRequest {
            target,
            edge_type: edge_type.into(),
        });
    }

    /// Number of errors reported so far
    pub fn error_count(&self) -> usize {
        self.errors
    }

    /// Consume the decorator, yielding buffered node writes and edges
    pub fn into_parts(self) -> (NodeRef, Vec<NodeOp>, Vec<EdgeRequest>) {
        (self.node_ref, self.ops, self.edges)
    }
}
