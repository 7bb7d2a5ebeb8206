//! Coupling and instability metrics

use crate::context::JavaAnalysisContext;
use crate::tags;
use archprism_core::{GraphNode, GraphRepository, Inspector, NodeDecorator, NodeRef, NodeType, Result};
use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

/// Edge types that constitute a dependency between classes
const DEPENDENCY_EDGES: [&str; 5] = ["imports", "depends_on", "extends", "implements", "uses"];

#[derive(Clone, Copy)]
enum Direction {
    Outgoing,
    Incoming,
}

fn neighbors(repository: &GraphRepository, node_ref: &NodeRef, direction: Direction) -> BTreeSet<NodeRef> {
    let mut result = BTreeSet::new();
    for edge_type in DEPENDENCY_EDGES {
        let edges = match direction {
            Direction::Outgoing => repository.outgoing_edges(node_ref, Some(edge_type)),
            Direction::Incoming => repository.incoming_edges(node_ref, Some(edge_type)),
        };
        for edge in edges {
            let other = match direction {
                Direction::Outgoing => edge.target,
                Direction::Incoming => edge.source,
            };
            if other.node_type == NodeType::JavaClass && other != *node_ref {
                result.insert(other);
            }
        }
    }
    result
}

/// Distinct classes reachable from `start` following dependency edges in
/// one direction. The graph may contain cycles, so reachability uses an
/// explicit visited set; `start` itself never counts.
fn reachable(repository: &GraphRepository, start: &NodeRef, direction: Direction) -> BTreeSet<NodeRef> {
    let mut visited: BTreeSet<NodeRef> = BTreeSet::new();
    let mut queue: VecDeque<NodeRef> = VecDeque::new();
    queue.push_back(start.clone());
    while let Some(current) = queue.pop_front() {
        for next in neighbors(repository, &current, direction) {
            if next != *start && visited.insert(next.clone()) {
                queue.push_back(next);
            }
        }
    }
    visited
}

/// Computes direct and transitive coupling plus the instability ratio.
/// Requires dependency edges to be in place, which the tag dependency on
/// the dependency inspector guarantees across the layer barrier.
pub struct CouplingInspector {
    context: Arc<JavaAnalysisContext>,
}

impl CouplingInspector {
    /// Create the inspector
    pub fn new(context: Arc<JavaAnalysisContext>) -> Self {
        Self { context }
    }
}

impl Inspector for CouplingInspector {
    fn name(&self) -> &str {
        "java-coupling"
    }

    fn requires(&self) -> &[&str] {
        &[tags::DEPENDENCIES]
    }

    fn produces(&self) -> &[&str] {
        &[tags::COUPLING]
    }

    fn supports(&self, node: &GraphNode) -> bool {
        node.node_type == NodeType::JavaClass
    }

    fn inspect(&self, node: &GraphNode, decorator: &mut NodeDecorator) -> Result<()> {
        let repository = self.context.repository();
        let self_ref = NodeRef::java_class(node.id.clone());

        let direct_out = neighbors(repository, &self_ref, Direction::Outgoing);
        let direct_in = neighbors(repository, &self_ref, Direction::Incoming);
        let transitive_out = reachable(repository, &self_ref, Direction::Outgoing);
        let transitive_in = reachable(repository, &self_ref, Direction::Incoming);

        let efferent = direct_out.len();
        let afferent = direct_in.len();
        decorator.set_property("directEfferent", efferent);
        decorator.set_property("directAfferent", afferent);
        decorator.set_property("transitiveEfferent", transitive_out.len());
        decorator.set_property("transitiveAfferent", transitive_in.len());
        decorator.set_property("efferentCoupling", efferent);
        decorator.set_property("afferentCoupling", afferent);

        let instability = if efferent + afferent == 0 {
            0.0
        } else {
            efferent as f64 / (efferent + afferent) as f64
        };
        decorator.set_property("instability", instability);
        decorator.enable_tag(tags::COUPLING);
        Ok(())
    }
}
