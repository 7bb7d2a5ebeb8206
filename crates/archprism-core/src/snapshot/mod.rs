//! Snapshot serialization (Phase 5)
//!
//! Emits the whole repository as one versioned JSON document and rebuilds
//! it later with identical identities, revisions and edge sets. All maps
//! in the model are ordered, so saving a loaded document reproduces it
//! byte for byte.

use crate::error::{Error, Result};
use crate::graph::{GraphEdge, GraphNode, GraphRepository};
use crate::profile::ExecutionProfile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Current snapshot schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Run-level metadata stored in the snapshot header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Analyzed project root
    #[serde(rename = "projectRoot")]
    pub project_root: PathBuf,
    /// Run start
    #[serde(rename = "startedAt")]
    pub started_at: DateTime<Utc>,
    /// Run end
    #[serde(rename = "finishedAt")]
    pub finished_at: DateTime<Utc>,
    /// Per-phase profiles in execution order
    pub phases: Vec<ExecutionProfile>,
}

/// The on-disk form of an analyzed project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Schema version for forward compatibility checks
    #[serde(rename = "schemaVersion")]
    pub schema_version: u32,
    /// Run metadata
    pub run: RunMetadata,
    /// Nodes sorted by `(type, id)`
    pub nodes: Vec<GraphNode>,
    /// Edges sorted by creation order
    pub edges: Vec<GraphEdge>,
}

impl Snapshot {
    /// Capture the current repository state
    pub fn capture(repository: &GraphRepository, run: RunMetadata) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            run,
            nodes: repository.all_nodes(),
            edges: repository.all_edges(),
        }
    }

    /// Serialize to pretty JSON bytes with a trailing newline
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Write the document, creating parent directories as needed
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent.to_path_buf(), e))?;
        }
        std::fs::write(path, self.to_bytes()?).map_err(|e| Error::io(path.to_path_buf(), e))?;
        tracing::info!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            path = %path.display(),
            "snapshot written"
        );
        Ok(())
    }

    /// Read and validate a snapshot document
    pub fn read_from(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| Error::io(path.to_path_buf(), e))?;
        let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
        if snapshot.schema_version != SCHEMA_VERSION {
            return Err(Error::Snapshot(format!(
                "unsupported schema version {} (expected {})",
                snapshot.schema_version, SCHEMA_VERSION
            )));
        }
        Ok(snapshot)
    }

    /// Rebuild a repository with identical node identities, revisions and
    /// edges. Dangling edges in the document are rejected.
    pub fn into_repository(self) -> Result<(GraphRepository, RunMetadata)> {
        let repository = GraphRepository::new();
        for node in self.nodes {
            repository.restore_node(node)?;
        }
        for edge in self.edges {
            repository.restore_edge(edge)?;
        }
        Ok((repository, self.run))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ClassType, NodeOp, NodeRef, SourceType};

    fn sample_repository() -> GraphRepository {
        let repository = GraphRepository::new();
        for fqn in ["x.B", "x.A"] {
            repository
                .get_or_create_node(GraphNode::java_class(
                    fqn,
                    ClassType::Class,
                    SourceType::Binary,
                    None,
                ))
                .unwrap();
        }
        repository
            .apply_inspection(
                &NodeRef::java_class("x.A"),
                "metrics",
                &[
                    NodeOp::SetProperty("methodCount".into(), 2i64.into()),
                    NodeOp::EnableTag("java.metrics".into()),
                ],
            )
            .unwrap();
        repository
            .get_or_create_edge(
                NodeRef::java_class("x.A"),
                NodeRef::java_class("x.B"),
                "imports",
            )
            .unwrap();
        repository
    }

    fn sample_run() -> RunMetadata {
        let now = Utc::now();
        RunMetadata {
            project_root: PathBuf::from("/project"),
            started_at: now,
            finished_at: now,
            phases: vec![ExecutionProfile::begin("file-discovery").finish(2, 1, true)],
        }
    }

    #[test]
    fn nodes_are_emitted_sorted() {
        let snapshot = Snapshot::capture(&sample_repository(), sample_run());
        let ids: Vec<&str> = snapshot.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["x.A", "x.B"]);
    }

    #[test]
    fn round_trip_preserves_identities_and_revisions() {
        let repository = sample_repository();
        let snapshot = Snapshot::capture(&repository, sample_run());
        let (restored, _) = snapshot.clone().into_repository().unwrap();

        assert_eq!(restored.node_count(), repository.node_count());
        assert_eq!(restored.edge_count(), repository.edge_count());
        let node = restored.find_class_by_fqn("x.A").unwrap();
        assert!(node.is_up_to_date("metrics"));
        assert_eq!(restored.current_revision(), repository.current_revision());
    }

    #[test]
    fn save_load_save_is_byte_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        let snapshot = Snapshot::capture(&sample_repository(), sample_run());
        snapshot.write_to(&path).unwrap();
        let first = std::fs::read(&path).unwrap();

        let loaded = Snapshot::read_from(&path).unwrap();
        loaded.write_to(&path).unwrap();
        let second = std::fs::read(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn dangling_edges_are_rejected_on_load() {
        let mut snapshot = Snapshot::capture(&sample_repository(), sample_run());
        snapshot.nodes.retain(|n| n.id != "x.B");
        let err = snapshot.into_repository().unwrap_err();
        assert!(matches!(err, Error::Snapshot(_)));
    }

    #[test]
    fn wrong_schema_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        let mut snapshot = Snapshot::capture(&sample_repository(), sample_run());
        snapshot.schema_version = 99;
        snapshot.write_to(&path).unwrap();
        assert!(matches!(
            Snapshot::read_from(&path).unwrap_err(),
            Error::Snapshot(_)
        ));
    }
}
