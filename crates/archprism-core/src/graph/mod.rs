//! Typed property graph: nodes, edges, repository and queries

pub mod edge;
pub mod node;
pub mod property;
pub mod query;
pub mod repository;

pub use edge::{edge_types, EdgeKey, GraphEdge, NodeRef};
pub use node::{
    split_fqn, ClassType, GraphNode, NodeData, NodeFingerprint, NodeType, Revision, SourceType,
};
pub use property::{merge_values, PropertyValue};
pub use query::{GraphQuery, SubgraphView};
pub use repository::{GraphRepository, GraphStats, NodeOp};
