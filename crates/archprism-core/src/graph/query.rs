//! Read-only consumer query surface
//!
//! Downstream tools (migration planners, refactoring servers) query the
//! finished graph through this type. Nothing here mutates the repository.

use crate::graph::edge::{GraphEdge, NodeRef};
use crate::graph::node::{GraphNode, NodeType};
use crate::graph::repository::GraphRepository;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Query engine over a shared repository
pub struct GraphQuery {
    repository: Arc<GraphRepository>,
}

impl GraphQuery {
    /// Create a query engine
    pub fn new(repository: Arc<GraphRepository>) -> Self {
        Self { repository }
    }

    /// Node lookup by type and id
    pub fn node(&self, node_type: NodeType, id: &str) -> Option<GraphNode> {
        self.repository.find_by_id(node_type, id)
    }

    /// All nodes carrying a tag
    pub fn nodes_with_tag(&self, tag: &str) -> Vec<GraphNode> {
        self.repository.find_by_tag(tag)
    }

    /// Nodes whose property `key` matches `pattern`. A pattern without `*`
    /// is an exact string match; `*` matches any run of characters. Matching
    /// is against the property's display form, so numeric properties can be
    /// queried as `"42"`.
    pub fn nodes_with_property(&self, key: &str, pattern: &str) -> Vec<GraphNode> {
        let matcher = wildcard_regex(pattern);
        self.repository
            .find_by_property(key)
            .into_iter()
            .filter(|node| {
                node.property(key)
                    .map(|value| {
                        let text = value.to_string();
                        match &matcher {
                            Some(re) => re.is_match(&text),
                            None => text == pattern,
                        }
                    })
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Outgoing edges of a node, optionally filtered by edge type
    pub fn outgoing(&self, node_ref: &NodeRef, edge_type: Option<&str>) -> Vec<GraphEdge> {
        self.repository.outgoing_edges(node_ref, edge_type)
    }

    /// Incoming edges of a node, optionally filtered by edge type
    pub fn incoming(&self, node_ref: &NodeRef, edge_type: Option<&str>) -> Vec<GraphEdge> {
        self.repository.incoming_edges(node_ref, edge_type)
    }

    /// Diagnostic log of one node
    pub fn diagnostics(&self, node_ref: &NodeRef) -> Vec<String> {
        self.repository.diagnostics(node_ref)
    }

    /// Filtered view of the graph. Only nodes of the given types are kept,
    /// and only edges of the given types whose endpoints both survive the
    /// node filter.
    pub fn subgraph(&self, node_types: &[NodeType], edge_types: &[&str]) -> SubgraphView {
        let mut nodes = Vec::new();
        let mut kept: BTreeSet<NodeRef> = BTreeSet::new();
        for node_type in node_types {
            for node in self.repository.nodes_of_type(*node_type) {
                kept.insert(NodeRef::new(node.node_type, node.id.clone()));
                nodes.push(node);
            }
        }
        let edges = self
            .repository
            .all_edges()
            .into_iter()
            .filter(|edge| {
                (edge_types.is_empty() || edge_types.contains(&edge.edge_type.as_str()))
                    && kept.contains(&edge.source)
                    && kept.contains(&edge.target)
            })
            .collect();
        SubgraphView { nodes, edges }
    }
}

/// Translate a `*` wildcard pattern into an anchored regex; `None` means
/// the pattern is literal and should be compared directly.
fn wildcard_regex(pattern: &str) -> Option<Regex> {
    if !pattern.contains('*') {
        return None;
    }
    let escaped = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    // An invalid build here would be a bug in the escaping above; fall back
    // to literal comparison instead of failing the query.
    Regex::new(&format!("^{escaped}$")).ok()
}

/// A filtered, detached copy of part of the graph
#[derive(Debug, Clone)]
pub struct SubgraphView {
    /// Nodes that passed the type filter, in `(type, id)` order
    pub nodes: Vec<GraphNode>,
    /// Edges whose type passed the filter and whose endpoints are present
    pub edges: Vec<GraphEdge>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::{ClassType, SourceType};
    use crate::graph::repository::NodeOp;

    fn repo_with_classes() -> Arc<GraphRepository> {
        let repo = Arc::new(GraphRepository::new());
        for fqn in ["x.Alpha", "x.Beta", "y.AlphaBeta"] {
            repo.get_or_create_node(GraphNode::java_class(
                fqn,
                ClassType::Class,
                SourceType::Source,
                None,
            ))
            .unwrap();
        }
        repo.apply_inspection(
            &NodeRef::java_class("x.Alpha"),
            "i",
            &[NodeOp::SetProperty("packageName".into(), "x".into())],
        )
        .unwrap();
        repo.apply_inspection(
            &NodeRef::java_class("y.AlphaBeta"),
            "i",
            &[NodeOp::SetProperty("packageName".into(), "y".into())],
        )
        .unwrap();
        repo
    }

    #[test]
    fn exact_property_match() {
        let query = GraphQuery::new(repo_with_classes());
        let hits = query.nodes_with_property("packageName", "x");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "x.Alpha");
    }

    #[test]
    fn wildcard_property_match() {
        let query = GraphQuery::new(repo_with_classes());
        assert_eq!(query.nodes_with_property("packageName", "*").len(), 2);
        assert_eq!(query.nodes_with_property("packageName", "z*").len(), 0);
    }

    #[test]
    fn subgraph_filters_nodes_and_edges() {
        let repo = repo_with_classes();
        repo.get_or_create_edge(
            NodeRef::java_class("x.Alpha"),
            NodeRef::java_class("x.Beta"),
            "imports",
        )
        .unwrap();
        repo.get_or_create_edge(
            NodeRef::java_class("x.Alpha"),
            NodeRef::java_class("x.Beta"),
            "extends",
        )
        .unwrap();

        let query = GraphQuery::new(repo);
        let view = query.subgraph(&[NodeType::JavaClass], &["imports"]);
        assert_eq!(view.nodes.len(), 3);
        assert_eq!(view.edges.len(), 1);
        assert_eq!(view.edges[0].edge_type, "imports");

        let empty = query.subgraph(&[NodeType::ProjectFile], &[]);
        assert!(empty.nodes.is_empty());
        assert!(empty.edges.is_empty());
    }
}
