//! Class size and complexity metrics

use crate::context::JavaAnalysisContext;
use crate::tags;
use archprism_core::{GraphNode, Inspector, NodeDecorator, NodeType, Result, SourceType};
use std::sync::Arc;

fn write_identity(decorator: &mut NodeDecorator, node: &GraphNode) {
    let class_type = node
        .class_type()
        .map(|t| t.label())
        .unwrap_or("UNKNOWN");
    decorator.set_property("classType", class_type);
    let source_type = node
        .source_type()
        .map(|t| t.to_string())
        .unwrap_or_else(|| "UNKNOWN".to_string());
    decorator.set_property("sourceType", source_type);
}

fn write_metrics(
    decorator: &mut NodeDecorator,
    method_count: usize,
    field_count: usize,
    decision_points: u32,
) {
    decorator.set_property("methodCount", method_count);
    decorator.set_property("fieldCount", field_count);
    decorator.set_property("cyclomaticComplexity", decision_points as i64);
    // Weighted methods per class: one per method plus its branches.
    decorator.set_property("wmc", method_count as i64 + decision_points as i64);
    decorator.enable_tag(tags::METRICS);
}

/// Metrics for classes collected from `.java` sources
pub struct SourceMetricsInspector {
    context: Arc<JavaAnalysisContext>,
}

impl SourceMetricsInspector {
    /// Create the inspector
    pub fn new(context: Arc<JavaAnalysisContext>) -> Self {
        Self { context }
    }
}

impl Inspector for SourceMetricsInspector {
    fn name(&self) -> &str {
        "java-source-metrics"
    }

    fn produces(&self) -> &[&str] {
        &[tags::METRICS]
    }

    fn supports(&self, node: &GraphNode) -> bool {
        node.node_type == NodeType::JavaClass && node.source_type() == Some(SourceType::Source)
    }

    fn inspect(&self, node: &GraphNode, decorator: &mut NodeDecorator) -> Result<()> {
        write_identity(decorator, node);
        let file = match self.context.file_of_class(node) {
            Some(file) => file,
            None => {
                decorator.error("class has no backing project file");
                return Ok(());
            }
        };
        let unit = self.context.source_unit(&file)?;
        match unit.types.iter().find(|t| unit.fqn_of(t) == node.id) {
            Some(summary) => {
                write_metrics(
                    decorator,
                    summary.methods.len(),
                    summary.field_count,
                    summary.decision_points(),
                );
                if !summary.annotations.is_empty() {
                    decorator.set_property("annotations", summary.annotations.clone());
                }
            }
            None => {
                // Partial nodes from name recovery have no summary.
                decorator.error(format!("no parsed declaration for {}", node.id));
            }
        }
        Ok(())
    }
}

/// Metrics for classes collected from `.class` files. Every
/// bytecode-visible method counts, constructors and synthetics included.
pub struct BytecodeMetricsInspector {
    context: Arc<JavaAnalysisContext>,
}

impl BytecodeMetricsInspector {
    /// Create the inspector
    pub fn new(context: Arc<JavaAnalysisContext>) -> Self {
        Self { context }
    }
}

impl Inspector for BytecodeMetricsInspector {
    fn name(&self) -> &str {
        "java-bytecode-metrics"
    }

    fn produces(&self) -> &[&str] {
        &[tags::METRICS]
    }

    fn supports(&self, node: &GraphNode) -> bool {
        node.node_type == NodeType::JavaClass && node.source_type() == Some(SourceType::Binary)
    }

    fn inspect(&self, node: &GraphNode, decorator: &mut NodeDecorator) -> Result<()> {
        write_identity(decorator, node);
        let file = match self.context.file_of_class(node) {
            Some(file) => file,
            None => {
                decorator.error("class has no backing project file");
                return Ok(());
            }
        };
        let class = self.context.class_file(&file)?;
        write_metrics(
            decorator,
            class.methods.len(),
            class.fields.len(),
            class.total_decision_points(),
        );
        Ok(())
    }
}
