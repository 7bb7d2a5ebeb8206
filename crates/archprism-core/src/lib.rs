//! ArchPrism - Java Architecture Analysis Core
//!
//! This crate provides the core of a static architecture analyzer for
//! large Java codebases: a typed property graph with a shared repository,
//! an inspector framework with declarative tag dependencies, and a
//! multi-phase scheduler that drives inspectors to a fixed point before
//! serializing the result as a stable snapshot.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod graph;
pub mod inspector;
pub mod loader;
pub mod profile;
pub mod progress;
pub mod scanner;
pub mod scheduler;
pub mod snapshot;

pub use config::AnalyzerConfig;
pub use error::{Error, Result};
pub use graph::{
    edge_types, ClassType, GraphEdge, GraphNode, GraphQuery, GraphRepository, GraphStats,
    NodeData, NodeOp, NodeRef, NodeType, PropertyValue, Revision, SourceType, SubgraphView,
};
pub use inspector::{
    resolve_layers, ClassSeed, CollectOutcome, Collector, CollectorRef, Inspector,
    InspectorRef, InspectorRegistry, InspectorSchedule, NodeDecorator,
};
pub use loader::{ClassIndex, ResourceLocator};
pub use profile::ExecutionProfile;
pub use progress::{
    LogProgressReporter, NoOpProgressReporter, ProgressReporter, TextProgressReporter,
};
pub use scanner::{IgnoreFilter, ProjectScanner};
pub use scheduler::{AnalysisEngine, AnalysisReport, CancellationFlag};
pub use snapshot::{RunMetadata, Snapshot, SCHEMA_VERSION};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::AnalyzerConfig;
    pub use crate::error::{Error, Result};
    pub use crate::graph::{
        edge_types, ClassType, GraphEdge, GraphNode, GraphQuery, GraphRepository, NodeOp,
        NodeRef, NodeType, PropertyValue, SourceType,
    };
    pub use crate::inspector::{
        ClassSeed, CollectOutcome, Collector, Inspector, InspectorRegistry, NodeDecorator,
    };
    pub use crate::loader::{ClassIndex, ResourceLocator};
    pub use crate::profile::ExecutionProfile;
    pub use crate::progress::{NoOpProgressReporter, ProgressReporter, TextProgressReporter};
    pub use crate::scheduler::{AnalysisEngine, AnalysisReport, CancellationFlag};
    pub use crate::snapshot::{RunMetadata, Snapshot};
}
