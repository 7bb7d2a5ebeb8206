//! Per-phase execution profiles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timing and convergence record for one analysis phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionProfile {
    /// Phase name (`file-discovery`, `class-collection`, …)
    pub name: String,
    /// Wall-clock start
    #[serde(rename = "startedAt")]
    pub started_at: DateTime<Utc>,
    /// Wall-clock end
    #[serde(rename = "finishedAt")]
    pub finished_at: DateTime<Utc>,
    /// (inspector, node) invocations, or nodes touched for phases 1/2/5
    #[serde(rename = "nodesProcessed")]
    pub nodes_processed: usize,
    /// Passes used; always 1 outside the convergence phases
    pub passes: usize,
    /// Whether the phase reached a fixed point
    pub converged: bool,
}

impl ExecutionProfile {
    /// Start a profile now
    pub fn begin(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            started_at: now,
            finished_at: now,
            nodes_processed: 0,
            passes: 1,
            converged: true,
        }
    }

    /// Close the profile with final counters
    pub fn finish(mut self, nodes_processed: usize, passes: usize, converged: bool) -> Self {
        self.finished_at = Utc::now();
        self.nodes_processed = nodes_processed;
        self.passes = passes;
        self.converged = converged;
        self
    }

    /// Elapsed wall time in milliseconds
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_serialization_field_names() {
        let profile = ExecutionProfile::begin("file-discovery").finish(12, 1, true);
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["name"], "file-discovery");
        assert_eq!(json["nodesProcessed"], 12);
        assert!(json["startedAt"].is_string());
        assert_eq!(json["converged"], true);
    }
}
