//! Phase 4 class inspectors

pub mod coupling;
pub mod dependencies;
pub mod inheritance;
pub mod metrics;

pub use coupling::CouplingInspector;
pub use dependencies::DependencyInspector;
pub use inheritance::InheritanceInspector;
pub use metrics::{BytecodeMetricsInspector, SourceMetricsInspector};
