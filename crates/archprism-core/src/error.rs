//! Error types for the analysis core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the analysis core
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration, surfaced before Phase 1
    #[error("Configuration error in '{key}': {message}")]
    Configuration { key: String, message: String },

    /// Inspector dependency cycle detected by the resolver
    #[error("Cyclic inspector dependencies: {}", cycle.join(" -> "))]
    DependencyCycle { cycle: Vec<String> },

    /// IO failure on a concrete path
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed source or classfile input
    #[error("Parse error in {}: {message}", file.display())]
    Parse { file: PathBuf, message: String },

    /// Failure raised inside an inspector while visiting one node
    #[error("Inspector '{inspector}' failed on node '{node_id}': {message}")]
    Inspector {
        inspector: String,
        node_id: String,
        message: String,
    },

    /// A repository invariant was broken by a collector or inspector; fatal
    #[error("Invariant violation: {0}")]
    Invariant(String),

    /// The run was cancelled between inspector layers
    #[error("Analysis cancelled during {phase}")]
    Cancelled { phase: String },

    /// Snapshot serialization or deserialization failure
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// JSON encoding/decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create an IO error for a path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a parse error
    pub fn parse(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create an inspector error bound to a node
    pub fn inspector(
        inspector: impl Into<String>,
        node_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Inspector {
            inspector: inspector.into(),
            node_id: node_id.into(),
            message: message.into(),
        }
    }

    /// Create an invariant violation
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant(message.into())
    }

    /// True for errors that abort the whole run rather than one node
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. }
                | Self::DependencyCycle { .. }
                | Self::Invariant(_)
                | Self::Cancelled { .. }
                | Self::Snapshot(_)
        )
    }
}
