//! Shared graph repository
//!
//! Sole owner of all nodes and edges. Every lookup hands out clones; every
//! mutation goes through this type so the property merge rule, the
//! modification fingerprint and the per-node freshness stamps stay
//! consistent under concurrent inspector execution.

use crate::error::{Error, Result};
use crate::graph::edge::{EdgeKey, GraphEdge, NodeRef};
use crate::graph::node::{GraphNode, NodeType, Revision};
use crate::graph::property::{merge_values, PropertyValue};
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

/// Aggregate graph counts
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GraphStats {
    /// Number of nodes
    pub total_nodes: usize,
    /// Number of edges
    pub total_edges: usize,
    /// Node counts per type
    pub nodes_by_type: std::collections::BTreeMap<NodeType, usize>,
}

/// A buffered write against one node, produced by a decorator
#[derive(Debug, Clone)]
pub enum NodeOp {
    /// Merge a property value under the priority rule
    SetProperty(String, PropertyValue),
    /// Add a tag (set semantics)
    EnableTag(String),
    /// Append a diagnostic message
    Diagnostic(String),
}

/// Thread-safe repository of analysis nodes and edges
#[derive(Debug, Default)]
pub struct GraphRepository {
    nodes: DashMap<NodeRef, GraphNode>,
    edges: DashMap<EdgeKey, GraphEdge>,
    /// node type -> members
    type_index: DashMap<NodeType, BTreeSet<NodeRef>>,
    /// tag -> nodes carrying it
    tag_index: DashMap<String, BTreeSet<NodeRef>>,
    /// property key -> nodes carrying it
    property_index: DashMap<String, BTreeSet<NodeRef>>,
    /// outgoing edges per node
    outgoing: DashMap<NodeRef, BTreeSet<EdgeKey>>,
    /// incoming edges per node
    incoming: DashMap<NodeRef, BTreeSet<EdgeKey>>,
    edge_seq: AtomicU64,
    revision: AtomicU64,
}

impl GraphRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of the logical modification clock
    pub fn current_revision(&self) -> Revision {
        Revision(self.revision.load(Ordering::SeqCst))
    }

    fn next_revision(&self) -> Revision {
        Revision(self.revision.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Install a node unless one with the same `(type, id)` already exists;
    /// either way the stored node is returned. Existing content is never
    /// replaced.
    pub fn get_or_create_node(&self, proposed: GraphNode) -> Result<GraphNode> {
        if proposed.id.trim().is_empty() {
            return Err(Error::invariant("node id must not be empty"));
        }
        let node_ref = NodeRef::new(proposed.node_type, proposed.id.clone());
        let entry = self.nodes.entry(node_ref.clone()).or_insert_with(|| {
            self.type_index
                .entry(proposed.node_type)
                .or_default()
                .insert(node_ref.clone());
            for tag in &proposed.tags {
                self.tag_index
                    .entry(tag.clone())
                    .or_default()
                    .insert(node_ref.clone());
            }
            for key in proposed.properties.keys() {
                self.property_index
                    .entry(key.clone())
                    .or_default()
                    .insert(node_ref.clone());
            }
            proposed
        });
        Ok(entry.value().clone())
    }

    /// De-duplicated edge creation. Both endpoints must already exist.
    pub fn get_or_create_edge(
        &self,
        source: NodeRef,
        target: NodeRef,
        edge_type: &str,
    ) -> Result<GraphEdge> {
        if edge_type.trim().is_empty() {
            return Err(Error::invariant("edge type must not be empty"));
        }
        if source.id.trim().is_empty() || target.id.trim().is_empty() {
            return Err(Error::invariant("edge endpoints must have non-empty ids"));
        }
        if !self.nodes.contains_key(&source) {
            return Err(Error::invariant(format!(
                "edge source {source} is not in the repository"
            )));
        }
        if !self.nodes.contains_key(&target) {
            return Err(Error::invariant(format!(
                "edge target {target} is not in the repository"
            )));
        }

        let key = EdgeKey {
            source: source.clone(),
            target: target.clone(),
            edge_type: edge_type.to_string(),
        };
        if let Some(existing) = self.edges.get(&key) {
            return Ok(existing.value().clone());
        }

        // Index entries go in before the edge itself so no thread ever
        // holds an edge-map guard while taking an index guard (lock order
        // is the reverse on the read path). Both inserts are idempotent,
        // so a racing creator is harmless.
        self.outgoing
            .entry(source.clone())
            .or_default()
            .insert(key.clone());
        self.incoming
            .entry(target.clone())
            .or_default()
            .insert(key.clone());
        let id = format!("e{}", self.edge_seq.fetch_add(1, Ordering::SeqCst) + 1);
        let edge = self
            .edges
            .entry(key)
            .or_insert_with(|| GraphEdge::new(id, source, target, edge_type))
            .value()
            .clone();
        Ok(edge)
    }

    /// Apply one inspector invocation's buffered writes atomically under the
    /// node's lock: merge properties, union tags, append diagnostics, then
    /// compare fingerprints to decide whether the node changed. The
    /// inspector's execution stamp is recorded in the same critical section
    /// so a concurrent sibling inspector's change can never be masked.
    ///
    /// Returns `true` when the node's fingerprint changed.
    pub fn apply_inspection(
        &self,
        node_ref: &NodeRef,
        inspector: &str,
        ops: &[NodeOp],
    ) -> Result<bool> {
        let mut entry = self
            .nodes
            .get_mut(node_ref)
            .ok_or_else(|| Error::invariant(format!("unknown node {node_ref}")))?;
        let node = entry.value_mut();

        let before = node.fingerprint();
        for op in ops {
            match op {
                NodeOp::SetProperty(key, value) => {
                    let merged = match node.properties.get(key) {
                        Some(existing) => merge_values(existing, value),
                        None => value.clone(),
                    };
                    node.properties.insert(key.clone(), merged);
                    self.property_index
                        .entry(key.clone())
                        .or_default()
                        .insert(node_ref.clone());
                }
                NodeOp::EnableTag(tag) => {
                    node.tags.insert(tag.clone());
                    self.tag_index
                        .entry(tag.clone())
                        .or_default()
                        .insert(node_ref.clone());
                }
                NodeOp::Diagnostic(message) => {
                    node.diagnostics.push(message.clone());
                }
            }
        }

        let changed = before != node.fingerprint();
        let stamp = if changed {
            let revision = self.next_revision();
            node.last_modified = revision;
            revision
        } else {
            self.current_revision()
        };
        node.executed.insert(inspector.to_string(), stamp);
        Ok(changed)
    }

    /// Append a diagnostic outside an inspector invocation (scanner and
    /// collector failures land here).
    pub fn record_diagnostic(&self, node_ref: &NodeRef, message: impl Into<String>) {
        if let Some(mut entry) = self.nodes.get_mut(node_ref) {
            entry.value_mut().diagnostics.push(message.into());
        }
    }

    /// Node lookup by reference
    pub fn find_node(&self, node_ref: &NodeRef) -> Option<GraphNode> {
        self.nodes.get(node_ref).map(|entry| entry.value().clone())
    }

    /// Node lookup by type and id
    pub fn find_by_id(&self, node_type: NodeType, id: &str) -> Option<GraphNode> {
        self.find_node(&NodeRef::new(node_type, id))
    }

    /// JavaClass lookup by fully-qualified name
    pub fn find_class_by_fqn(&self, fqn: &str) -> Option<GraphNode> {
        self.find_by_id(NodeType::JavaClass, fqn)
    }

    /// All nodes carrying the given tag
    pub fn find_by_tag(&self, tag: &str) -> Vec<GraphNode> {
        // Clone the ref set out before touching the node map; holding an
        // index guard across a node lookup inverts the writer lock order.
        let refs: Vec<NodeRef> = self
            .tag_index
            .get(tag)
            .map(|refs| refs.iter().cloned().collect())
            .unwrap_or_default();
        refs.iter().filter_map(|r| self.find_node(r)).collect()
    }

    /// All nodes carrying the given property key
    pub fn find_by_property(&self, key: &str) -> Vec<GraphNode> {
        let refs: Vec<NodeRef> = self
            .property_index
            .get(key)
            .map(|refs| refs.iter().cloned().collect())
            .unwrap_or_default();
        refs.iter().filter_map(|r| self.find_node(r)).collect()
    }

    /// References to every node of a type, in id order
    pub fn refs_of_type(&self, node_type: NodeType) -> Vec<NodeRef> {
        self.type_index
            .get(&node_type)
            .map(|refs| refs.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// All nodes of a type, in id order
    pub fn nodes_of_type(&self, node_type: NodeType) -> Vec<GraphNode> {
        self.refs_of_type(node_type)
            .iter()
            .filter_map(|r| self.find_node(r))
            .collect()
    }

    /// Outgoing edges of a node, optionally filtered by edge type
    pub fn outgoing_edges(&self, node_ref: &NodeRef, edge_type: Option<&str>) -> Vec<GraphEdge> {
        self.collect_edges(&self.outgoing, node_ref, edge_type)
    }

    /// Incoming edges of a node, optionally filtered by edge type
    pub fn incoming_edges(&self, node_ref: &NodeRef, edge_type: Option<&str>) -> Vec<GraphEdge> {
        self.collect_edges(&self.incoming, node_ref, edge_type)
    }

    fn collect_edges(
        &self,
        index: &DashMap<NodeRef, BTreeSet<EdgeKey>>,
        node_ref: &NodeRef,
        edge_type: Option<&str>,
    ) -> Vec<GraphEdge> {
        let keys: Vec<EdgeKey> = index
            .get(node_ref)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default();
        keys.iter()
            .filter(|key| edge_type.map(|t| key.edge_type == t).unwrap_or(true))
            .filter_map(|key| self.edges.get(key).map(|e| e.value().clone()))
            .collect()
    }

    /// Every node, sorted by `(type, id)` for stable emission
    pub fn all_nodes(&self) -> Vec<GraphNode> {
        let mut nodes: Vec<GraphNode> = self.nodes.iter().map(|e| e.value().clone()).collect();
        nodes.sort_by(|a, b| (a.node_type, &a.id).cmp(&(b.node_type, &b.id)));
        nodes
    }

    /// Every edge, sorted by creation order
    pub fn all_edges(&self) -> Vec<GraphEdge> {
        let mut edges: Vec<GraphEdge> = self.edges.iter().map(|e| e.value().clone()).collect();
        edges.sort_by_key(|e| e.id.trim_start_matches('e').parse::<u64>().unwrap_or(u64::MAX));
        edges
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Diagnostic log for a node, empty when the node is unknown
    pub fn diagnostics(&self, node_ref: &NodeRef) -> Vec<String> {
        self.find_node(node_ref)
            .map(|n| n.diagnostics)
            .unwrap_or_default()
    }

    /// Aggregate counts over the stored graph
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            total_nodes: self.nodes.len(),
            total_edges: self.edges.len(),
            nodes_by_type: self
                .type_index
                .iter()
                .map(|entry| (*entry.key(), entry.value().len()))
                .collect(),
        }
    }

    /// Reinstall a node verbatim while rebuilding indices; used by snapshot
    /// loading, which must preserve identities and revisions exactly.
    pub(crate) fn restore_node(&self, node: GraphNode) -> Result<()> {
        let max_rev = node
            .executed
            .values()
            .copied()
            .chain(std::iter::once(node.last_modified))
            .max()
            .unwrap_or(Revision(0));
        self.revision.fetch_max(max_rev.0, Ordering::SeqCst);

        let node_ref = NodeRef::new(node.node_type, node.id.clone());
        if self.nodes.contains_key(&node_ref) {
            return Err(Error::Snapshot(format!("duplicate node {node_ref}")));
        }
        self.type_index
            .entry(node.node_type)
            .or_default()
            .insert(node_ref.clone());
        for tag in &node.tags {
            self.tag_index
                .entry(tag.clone())
                .or_default()
                .insert(node_ref.clone());
        }
        for key in node.properties.keys() {
            self.property_index
                .entry(key.clone())
                .or_default()
                .insert(node_ref.clone());
        }
        self.nodes.insert(node_ref, node);
        Ok(())
    }

    /// Reinstall an edge verbatim; endpoints must have been restored first.
    pub(crate) fn restore_edge(&self, edge: GraphEdge) -> Result<()> {
        if !self.nodes.contains_key(&edge.source) {
            return Err(Error::Snapshot(format!(
                "edge {} references missing source {}",
                edge.id, edge.source
            )));
        }
        if !self.nodes.contains_key(&edge.target) {
            return Err(Error::Snapshot(format!(
                "edge {} references missing target {}",
                edge.id, edge.target
            )));
        }
        if let Ok(seq) = edge.id.trim_start_matches('e').parse::<u64>() {
            self.edge_seq.fetch_max(seq, Ordering::SeqCst);
        }
        let key = edge.key();
        self.outgoing
            .entry(edge.source.clone())
            .or_default()
            .insert(key.clone());
        self.incoming
            .entry(edge.target.clone())
            .or_default()
            .insert(key.clone());
        self.edges.insert(key, edge);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::{ClassType, SourceType};

    fn class(fqn: &str) -> GraphNode {
        GraphNode::java_class(fqn, ClassType::Class, SourceType::Source, None)
    }

    #[test]
    fn get_or_create_node_is_identity_preserving() {
        let repo = GraphRepository::new();
        let mut first = class("x.Foo");
        first.tags.insert("seed".into());
        repo.get_or_create_node(first).unwrap();

        let second = class("x.Foo");
        let stored = repo.get_or_create_node(second).unwrap();
        assert!(stored.has_tag("seed"), "existing content must be kept");
        assert_eq!(repo.node_count(), 1);
    }

    #[test]
    fn empty_node_id_is_rejected_without_state_change() {
        let repo = GraphRepository::new();
        let bad = GraphNode::java_class("  ", ClassType::Class, SourceType::Source, None);
        assert!(repo.get_or_create_node(bad).is_err());
        assert_eq!(repo.node_count(), 0);
    }

    #[test]
    fn edge_creation_is_idempotent() {
        let repo = GraphRepository::new();
        repo.get_or_create_node(class("x.A")).unwrap();
        repo.get_or_create_node(class("x.B")).unwrap();

        let a = NodeRef::java_class("x.A");
        let b = NodeRef::java_class("x.B");
        let first = repo
            .get_or_create_edge(a.clone(), b.clone(), "imports")
            .unwrap();
        for _ in 0..5 {
            let again = repo
                .get_or_create_edge(a.clone(), b.clone(), "imports")
                .unwrap();
            assert_eq!(again.id, first.id);
        }
        assert_eq!(repo.edge_count(), 1);
    }

    #[test]
    fn edges_require_existing_endpoints() {
        let repo = GraphRepository::new();
        repo.get_or_create_node(class("x.A")).unwrap();
        let err = repo
            .get_or_create_edge(
                NodeRef::java_class("x.A"),
                NodeRef::java_class("x.Missing"),
                "imports",
            )
            .unwrap_err();
        assert!(matches!(err, Error::Invariant(_)));
        assert_eq!(repo.edge_count(), 0);
    }

    #[test]
    fn apply_inspection_bumps_last_modified_only_on_change() {
        let repo = GraphRepository::new();
        repo.get_or_create_node(class("x.A")).unwrap();
        let node_ref = NodeRef::java_class("x.A");

        let changed = repo
            .apply_inspection(
                &node_ref,
                "metrics",
                &[NodeOp::SetProperty("methodCount".into(), 3i64.into())],
            )
            .unwrap();
        assert!(changed);
        let node = repo.find_node(&node_ref).unwrap();
        assert!(node.is_up_to_date("metrics"));
        let modified_at = node.last_modified;

        // Same key again: fingerprint covers keys, not values.
        let changed = repo
            .apply_inspection(
                &node_ref,
                "metrics",
                &[NodeOp::SetProperty("methodCount".into(), 3i64.into())],
            )
            .unwrap();
        assert!(!changed);
        assert_eq!(repo.find_node(&node_ref).unwrap().last_modified, modified_at);
    }

    #[test]
    fn modification_invalidates_other_inspectors() {
        let repo = GraphRepository::new();
        repo.get_or_create_node(class("x.A")).unwrap();
        let node_ref = NodeRef::java_class("x.A");

        repo.apply_inspection(&node_ref, "first", &[NodeOp::EnableTag("t0".into())])
            .unwrap();
        repo.apply_inspection(&node_ref, "second", &[])
            .unwrap();
        assert!(repo.find_node(&node_ref).unwrap().is_up_to_date("second"));

        repo.apply_inspection(&node_ref, "first", &[NodeOp::EnableTag("t1".into())])
            .unwrap();
        let node = repo.find_node(&node_ref).unwrap();
        assert!(node.is_up_to_date("first"));
        assert!(!node.is_up_to_date("second"));
    }

    #[test]
    fn property_merge_applies_priority_rule() {
        let repo = GraphRepository::new();
        repo.get_or_create_node(class("x.A")).unwrap();
        let node_ref = NodeRef::java_class("x.A");

        repo.apply_inspection(
            &node_ref,
            "one",
            &[NodeOp::SetProperty("classType".into(), "UNKNOWN".into())],
        )
        .unwrap();
        repo.apply_inspection(
            &node_ref,
            "two",
            &[NodeOp::SetProperty("classType".into(), "enum".into())],
        )
        .unwrap();
        repo.apply_inspection(
            &node_ref,
            "three",
            &[NodeOp::SetProperty("classType".into(), "N/A".into())],
        )
        .unwrap();

        let node = repo.find_node(&node_ref).unwrap();
        assert_eq!(node.property("classType").unwrap().as_str(), Some("enum"));
    }

    #[test]
    fn indices_answer_lookups() {
        let repo = GraphRepository::new();
        repo.get_or_create_node(class("x.A")).unwrap();
        repo.get_or_create_node(class("x.B")).unwrap();
        let a = NodeRef::java_class("x.A");
        repo.apply_inspection(
            &a,
            "i",
            &[
                NodeOp::EnableTag("java.metrics".into()),
                NodeOp::SetProperty("methodCount".into(), 2i64.into()),
            ],
        )
        .unwrap();

        assert_eq!(repo.find_by_tag("java.metrics").len(), 1);
        assert_eq!(repo.find_by_property("methodCount").len(), 1);
        assert!(repo.find_class_by_fqn("x.B").is_some());
        assert_eq!(repo.refs_of_type(NodeType::JavaClass).len(), 2);
    }

    #[test]
    fn edge_queries_filter_by_type() {
        let repo = GraphRepository::new();
        for fqn in ["x.A", "x.B", "x.C"] {
            repo.get_or_create_node(class(fqn)).unwrap();
        }
        let a = NodeRef::java_class("x.A");
        let b = NodeRef::java_class("x.B");
        let c = NodeRef::java_class("x.C");
        repo.get_or_create_edge(a.clone(), b.clone(), "imports").unwrap();
        repo.get_or_create_edge(a.clone(), c.clone(), "extends").unwrap();

        assert_eq!(repo.outgoing_edges(&a, None).len(), 2);
        assert_eq!(repo.outgoing_edges(&a, Some("imports")).len(), 1);
        assert_eq!(repo.incoming_edges(&c, Some("extends")).len(), 1);
    }

    #[test]
    fn stats_count_by_type() {
        let repo = GraphRepository::new();
        repo.get_or_create_node(class("x.A")).unwrap();
        repo.get_or_create_node(class("x.B")).unwrap();
        repo.get_or_create_edge(
            NodeRef::java_class("x.A"),
            NodeRef::java_class("x.B"),
            "imports",
        )
        .unwrap();

        let stats = repo.stats();
        assert_eq!(stats.total_nodes, 2);
        assert_eq!(stats.total_edges, 1);
        assert_eq!(stats.nodes_by_type.get(&NodeType::JavaClass), Some(&2));
    }

    #[test]
    fn restore_preserves_revisions() {
        let repo = GraphRepository::new();
        let mut node = class("x.A");
        node.last_modified = Revision(41);
        node.executed.insert("metrics".into(), Revision(41));
        repo.restore_node(node).unwrap();

        assert_eq!(repo.current_revision(), Revision(41));
        let node = repo.find_class_by_fqn("x.A").unwrap();
        assert!(node.is_up_to_date("metrics"));
    }
}
