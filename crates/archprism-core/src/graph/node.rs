//! Graph node model

use crate::graph::property::PropertyValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

/// Types of nodes in the analysis graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// One file on disk under the project root
    ProjectFile,
    /// One Java type, from source or bytecode
    JavaClass,
    /// A Java package
    Package,
    /// A method within a type
    Method,
    /// A field within a type
    Field,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeType::ProjectFile => write!(f, "project_file"),
            NodeType::JavaClass => write!(f, "java_class"),
            NodeType::Package => write!(f, "package"),
            NodeType::Method => write!(f, "method"),
            NodeType::Field => write!(f, "field"),
        }
    }
}

/// Kind of a Java type declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassType {
    /// Ordinary class
    Class,
    /// Interface
    Interface,
    /// Enum
    Enum,
    /// Annotation type
    Annotation,
    /// Record class
    Record,
}

impl ClassType {
    /// Stable lowercase label, used as a property value
    pub fn label(&self) -> &'static str {
        match self {
            ClassType::Class => "class",
            ClassType::Interface => "interface",
            ClassType::Enum => "enum",
            ClassType::Annotation => "annotation",
            ClassType::Record => "record",
        }
    }
}

impl fmt::Display for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a class node was sighted first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Parsed from a `.java` file
    Source,
    /// Parsed from a `.class` file
    Binary,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceType::Source => write!(f, "source"),
            SourceType::Binary => write!(f, "binary"),
        }
    }
}

/// Logical modification clock. Revisions are handed out by the repository,
/// strictly increase over one run, and serialize as plain integers so a
/// reloaded snapshot preserves every freshness relation exactly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Revision(pub u64);

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Variant-specific node attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeData {
    /// Attributes of a file discovered in Phase 1
    ProjectFile {
        /// Absolute path on disk
        absolute_path: PathBuf,
        /// Path relative to the project root
        relative_path: PathBuf,
        /// File name with extension
        file_name: String,
        /// Lowercased extension, empty when absent
        extension: String,
        /// Discovery wall-clock time
        discovered_at: DateTime<Utc>,
    },
    /// Attributes of a Java type collected in Phase 2
    JavaClass {
        /// Simple (innermost) name
        simple_name: String,
        /// Package name, empty for the default package
        package_name: String,
        /// Declaration kind
        class_type: ClassType,
        /// First sighting origin
        source_type: SourceType,
        /// Id of the originating ProjectFile node, when one exists
        project_file_id: Option<String>,
    },
    /// Placeholder for node types without dedicated attributes
    Other,
}

/// A node in the analysis graph.
///
/// `(node_type, id)` uniquely identifies a node; the id never changes after
/// creation. Properties and tags accumulate monotonically during a run and
/// are only written through decorators so the repository can apply the
/// merge rule and maintain `last_modified`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Node type tag
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Identifier, unique within the node type
    pub id: String,
    /// Variant attributes
    pub data: NodeData,
    /// Property map; keys emit sorted
    pub properties: BTreeMap<String, PropertyValue>,
    /// Boolean tag set
    pub tags: BTreeSet<String>,
    /// Per-inspector execution revisions
    #[serde(rename = "executedInspectors")]
    pub executed: BTreeMap<String, Revision>,
    /// Revision of the last observed property/tag change
    #[serde(rename = "lastModified")]
    pub last_modified: Revision,
    /// Per-node diagnostic log, in arrival order
    pub diagnostics: Vec<String>,
}

impl GraphNode {
    /// Create a node with empty analysis state
    pub fn new(node_type: NodeType, id: impl Into<String>, data: NodeData) -> Self {
        Self {
            node_type,
            id: id.into(),
            data,
            properties: BTreeMap::new(),
            tags: BTreeSet::new(),
            executed: BTreeMap::new(),
            last_modified: Revision(0),
            diagnostics: Vec::new(),
        }
    }

    /// Create a ProjectFile node; the id is the project-relative path
    pub fn project_file(
        absolute_path: PathBuf,
        relative_path: PathBuf,
        discovered_at: DateTime<Utc>,
    ) -> Self {
        let file_name = relative_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = relative_path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let id = relative_path.to_string_lossy().replace('\\', "/");
        Self::new(
            NodeType::ProjectFile,
            id,
            NodeData::ProjectFile {
                absolute_path,
                relative_path,
                file_name,
                extension,
                discovered_at,
            },
        )
    }

    /// Create a JavaClass node; the id is the fully-qualified binary name
    pub fn java_class(
        fqn: impl Into<String>,
        class_type: ClassType,
        source_type: SourceType,
        project_file_id: Option<String>,
    ) -> Self {
        let fqn = fqn.into();
        let (package_name, simple_name) = split_fqn(&fqn);
        Self::new(
            NodeType::JavaClass,
            fqn,
            NodeData::JavaClass {
                simple_name,
                package_name,
                class_type,
                source_type,
                project_file_id,
            },
        )
    }

    /// True when the given tag is present
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Property lookup by key
    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Lowercased extension for ProjectFile nodes, `None` otherwise
    pub fn extension(&self) -> Option<&str> {
        match &self.data {
            NodeData::ProjectFile { extension, .. } => Some(extension.as_str()),
            _ => None,
        }
    }

    /// Absolute path for ProjectFile nodes
    pub fn absolute_path(&self) -> Option<&PathBuf> {
        match &self.data {
            NodeData::ProjectFile { absolute_path, .. } => Some(absolute_path),
            _ => None,
        }
    }

    /// Originating file id for JavaClass nodes
    pub fn project_file_id(&self) -> Option<&str> {
        match &self.data {
            NodeData::JavaClass {
                project_file_id, ..
            } => project_file_id.as_deref(),
            _ => None,
        }
    }

    /// Source type for JavaClass nodes
    pub fn source_type(&self) -> Option<SourceType> {
        match &self.data {
            NodeData::JavaClass { source_type, .. } => Some(*source_type),
            _ => None,
        }
    }

    /// Declaration kind for JavaClass nodes
    pub fn class_type(&self) -> Option<ClassType> {
        match &self.data {
            NodeData::JavaClass { class_type, .. } => Some(*class_type),
            _ => None,
        }
    }

    /// Snapshot of tags and property keys, used by the scheduler to decide
    /// whether an inspector invocation modified the node.
    pub fn fingerprint(&self) -> NodeFingerprint {
        NodeFingerprint {
            tags: self.tags.clone(),
            property_keys: self.properties.keys().cloned().collect(),
        }
    }

    /// True when the named inspector has seen every modification so far
    pub fn is_up_to_date(&self, inspector: &str) -> bool {
        self.executed
            .get(inspector)
            .map(|at| *at >= self.last_modified)
            .unwrap_or(false)
    }
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.node_type, self.id)
    }
}

/// The modification fingerprint of a node: its tag set plus property keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeFingerprint {
    tags: BTreeSet<String>,
    property_keys: BTreeSet<String>,
}

/// Split a dotted fully-qualified name into package and simple name.
/// Nested types use binary `Outer$Inner` names, so the simple name is the
/// segment after the last `$` of the last dotted segment.
pub fn split_fqn(fqn: &str) -> (String, String) {
    let (package, tail) = match fqn.rsplit_once('.') {
        Some((pkg, tail)) => (pkg.to_string(), tail),
        None => (String::new(), fqn),
    };
    let simple = tail.rsplit_once('$').map(|(_, s)| s).unwrap_or(tail);
    (package, simple.to_string())
}
