//! Graph edge model

use crate::graph::node::NodeType;
use crate::graph::property::PropertyValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Reference to a node by `(type, id)`; edges never own their endpoints
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeRef {
    /// Endpoint node type
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Endpoint node id
    pub id: String,
}

impl NodeRef {
    /// Create a node reference
    pub fn new(node_type: NodeType, id: impl Into<String>) -> Self {
        Self {
            node_type,
            id: id.into(),
        }
    }

    /// Reference to a JavaClass node
    pub fn java_class(fqn: impl Into<String>) -> Self {
        Self::new(NodeType::JavaClass, fqn)
    }

    /// Reference to a ProjectFile node
    pub fn project_file(id: impl Into<String>) -> Self {
        Self::new(NodeType::ProjectFile, id)
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node_type, self.id)
    }
}

/// A directed edge between two repository nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Repository-assigned id (`e1`, `e2`, …)
    pub id: String,
    /// Source endpoint
    pub source: NodeRef,
    /// Target endpoint
    pub target: NodeRef,
    /// Edge type string (`imports`, `extends`, `contains`, …)
    #[serde(rename = "edgeType")]
    pub edge_type: String,
    /// Edge properties; keys emit sorted
    pub properties: BTreeMap<String, PropertyValue>,
}

impl GraphEdge {
    /// Create an edge with the given repository id
    pub fn new(
        id: impl Into<String>,
        source: NodeRef,
        target: NodeRef,
        edge_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source,
            target,
            edge_type: edge_type.into(),
            properties: BTreeMap::new(),
        }
    }

    /// De-duplication key: `(source, target, edge_type)`
    pub fn key(&self) -> EdgeKey {
        EdgeKey {
            source: self.source.clone(),
            target: self.target.clone(),
            edge_type: self.edge_type.clone(),
        }
    }
}

impl fmt::Display for GraphEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --{}-> {}", self.source, self.edge_type, self.target)
    }
}

/// Identity of an edge for get-or-create semantics
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    /// Source endpoint
    pub source: NodeRef,
    /// Target endpoint
    pub target: NodeRef,
    /// Edge type string
    pub edge_type: String,
}

/// Well-known edge type names used by the built-in inspectors
pub mod edge_types {
    /// Class-to-class import/reference dependency
    pub const IMPORTS: &str = "imports";
    /// Generic dependency
    pub const DEPENDS_ON: &str = "depends_on";
    /// Superclass relation
    pub const EXTENDS: &str = "extends";
    /// Interface implementation
    pub const IMPLEMENTS: &str = "implements";
    /// Structural containment (file contains class, class contains member)
    pub const CONTAINS: &str = "contains";
    /// Call relation
    pub const CALLS: &str = "calls";
    /// Usage relation
    pub const USES: &str = "uses";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_key_ignores_id() {
        let a = GraphEdge::new(
            "e1",
            NodeRef::java_class("x.A"),
            NodeRef::java_class("x.B"),
            edge_types::IMPORTS,
        );
        let b = GraphEdge::new(
            "e2",
            NodeRef::java_class("x.A"),
            NodeRef::java_class("x.B"),
            edge_types::IMPORTS,
        );
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn edge_serialization_shape() {
        let edge = GraphEdge::new(
            "e1",
            NodeRef::java_class("x.A"),
            NodeRef::java_class("x.B"),
            edge_types::EXTENDS,
        );
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["edgeType"], "extends");
        assert_eq!(json["source"]["type"], "java_class");
        assert_eq!(json["source"]["id"], "x.A");
    }
}
