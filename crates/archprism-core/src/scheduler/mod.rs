//! Multi-phase convergence scheduler
//!
//! Drives an analysis run through its five phases: file discovery, class
//! collection, file-node convergence, class-node convergence and snapshot
//! serialization. Phases 3 and 4 share one multipass routine that applies
//! inspectors in resolver order until no node changes or the pass cap is
//! reached. Inspector failures are isolated per node; invariant
//! violations, configuration errors and failures in phases 1, 2 and 5
//! abort the run.

use crate::config::AnalyzerConfig;
use crate::error::{Error, Result};
use crate::graph::{GraphNode, GraphQuery, GraphRepository, NodeOp, NodeRef, NodeType};
use crate::inspector::decorator::EdgeRequest;
use crate::inspector::{
    resolve_layers, InspectorRef, InspectorRegistry, InspectorSchedule, NodeDecorator,
};
use crate::profile::ExecutionProfile;
use crate::progress::{NoOpProgressReporter, ProgressReporter};
use crate::scanner::{IgnoreFilter, ProjectScanner};
use crate::snapshot::{RunMetadata, Snapshot};
use chrono::Utc;
use rayon::prelude::*;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

/// Cooperative cancellation handle. Setting the flag stops the scheduler
/// at the next layer boundary; in-flight inspector invocations finish.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Create an unset flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of a completed run
#[derive(Debug)]
pub struct AnalysisReport {
    /// The analyzed graph
    pub repository: Arc<GraphRepository>,
    /// Per-phase profiles in execution order
    pub profiles: Vec<ExecutionProfile>,
    /// Convergence warnings emitted by phases that hit the pass cap
    pub warnings: Vec<String>,
    /// Where the snapshot was written
    pub snapshot_path: PathBuf,
    /// Run metadata as serialized into the snapshot
    pub run: RunMetadata,
}

enum GuardedOutcome {
    Completed {
        decorator: NodeDecorator,
        result: Result<()>,
    },
    Panicked(String),
    TimedOut,
}

/// The analysis engine: one configuration, one inspector registry, one
/// repository, five phases.
pub struct AnalysisEngine {
    config: AnalyzerConfig,
    registry: InspectorRegistry,
    repository: Arc<GraphRepository>,
    progress: Arc<dyn ProgressReporter>,
    cancel: CancellationFlag,
}

impl AnalysisEngine {
    /// Create an engine over a fresh repository
    pub fn new(config: AnalyzerConfig, registry: InspectorRegistry) -> Self {
        Self {
            config,
            registry,
            repository: Arc::new(GraphRepository::new()),
            progress: Arc::new(NoOpProgressReporter),
            cancel: CancellationFlag::new(),
        }
    }

    /// Replace the progress reporter
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Continue from a previously loaded repository instead of an empty one
    pub fn with_repository(mut self, repository: Arc<GraphRepository>) -> Self {
        self.repository = repository;
        self
    }

    /// The shared repository
    pub fn repository(&self) -> Arc<GraphRepository> {
        Arc::clone(&self.repository)
    }

    /// Read-only query surface over the repository
    pub fn query(&self) -> GraphQuery {
        GraphQuery::new(self.repository())
    }

    /// Handle callers can use to cancel the run from another thread
    pub fn cancellation_flag(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    /// Execute phases 1 through 5
    pub fn run(&self) -> Result<AnalysisReport> {
        self.config.validate()?;
        // Cyclic inspector declarations surface here, before Phase 1.
        let file_schedule = resolve_layers(self.registry.inspectors_for(NodeType::ProjectFile))?;
        let class_schedule = resolve_layers(self.registry.inspectors_for(NodeType::JavaClass))?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.parallelism)
            .build()
            .map_err(|e| Error::config("parallelism", e.to_string()))?;

        let started_at = Utc::now();
        let mut profiles = Vec::new();
        let mut warnings = Vec::new();

        profiles.push(self.discover_files()?);
        profiles.push(self.collect_classes(&pool)?);
        profiles.push(self.converge(
            "project-file-analysis",
            NodeType::ProjectFile,
            &file_schedule,
            &pool,
            &mut warnings,
        )?);
        profiles.push(self.converge(
            "java-class-analysis",
            NodeType::JavaClass,
            &class_schedule,
            &pool,
            &mut warnings,
        )?);

        let snapshot_path = self.config.snapshot_file();
        self.progress.phase_started("serialization", None);
        let serialization =
            ExecutionProfile::begin("serialization").finish(self.repository.node_count(), 1, true);
        self.progress.phase_finished(&serialization);
        profiles.push(serialization);

        let run = RunMetadata {
            project_root: self.config.project_root.clone(),
            started_at,
            finished_at: Utc::now(),
            phases: profiles.clone(),
        };
        Snapshot::capture(&self.repository, run.clone()).write_to(&snapshot_path)?;

        let stats = self.repository.stats();
        tracing::info!(
            nodes = stats.total_nodes,
            edges = stats.total_edges,
            warnings = warnings.len(),
            "analysis run complete"
        );

        Ok(AnalysisReport {
            repository: self.repository(),
            profiles,
            warnings,
            snapshot_path,
            run,
        })
    }

    /// Phase 1: walk the project root and install ProjectFile nodes
    fn discover_files(&self) -> Result<ExecutionProfile> {
        self.progress.phase_started("file-discovery", None);
        let profile = ExecutionProfile::begin("file-discovery");
        let filter = IgnoreFilter::new(&self.config.ignore_patterns)?;
        let scanner = ProjectScanner::new(&self.config.project_root, filter);
        let outcome = scanner.discover(&self.repository, &self.progress)?;
        let profile = profile.finish(outcome.files_discovered, 1, true);
        self.progress.phase_finished(&profile);
        Ok(profile)
    }

    /// Phase 2: run collectors over project files to seed class nodes
    fn collect_classes(&self, pool: &rayon::ThreadPool) -> Result<ExecutionProfile> {
        let files = self.repository.refs_of_type(NodeType::ProjectFile);
        self.progress
            .phase_started("class-collection", Some(files.len()));
        let profile = ExecutionProfile::begin("class-collection");

        let mut invocations = 0usize;
        for collector in self.registry.collectors() {
            let results: Vec<Result<usize>> = pool.install(|| {
                files
                    .par_iter()
                    .map(|file_ref| self.collect_one(collector.as_ref(), file_ref))
                    .collect()
            });
            for result in results {
                invocations += result?;
            }
            self.progress.tick(invocations);
        }

        tracing::info!(
            collectors = self.registry.collectors().len(),
            classes = self.repository.refs_of_type(NodeType::JavaClass).len(),
            "class collection finished"
        );
        let profile = profile.finish(invocations, 1, true);
        self.progress.phase_finished(&profile);
        Ok(profile)
    }

    /// Apply one collector to one file; returns 1 when the collector ran
    fn collect_one(
        &self,
        collector: &dyn crate::inspector::Collector,
        file_ref: &NodeRef,
    ) -> Result<usize> {
        let file = match self.repository.find_node(file_ref) {
            Some(file) => file,
            None => return Ok(0),
        };
        if !collector.supports(&file) {
            return Ok(0);
        }
        match collector.collect(&file) {
            Ok(outcome) => {
                self.repository
                    .apply_inspection(file_ref, collector.name(), &outcome.file_ops)?;
                for seed in outcome.seeds {
                    let mut node = GraphNode::java_class(
                        seed.fqn,
                        seed.class_type,
                        seed.source_type,
                        Some(file.id.clone()),
                    );
                    node.tags.extend(seed.tags);
                    let stored = self.repository.get_or_create_node(node)?;
                    self.repository.get_or_create_edge(
                        file_ref.clone(),
                        NodeRef::java_class(stored.id),
                        crate::graph::edge_types::CONTAINS,
                    )?;
                }
                Ok(1)
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                // Parse and IO problems stay on the file node; collection
                // continues with the remaining files.
                self.repository
                    .record_diagnostic(file_ref, format!("{}: {e}", collector.name()));
                self.progress.error(&e.to_string());
                Ok(1)
            }
        }
    }

    /// Phases 3 and 4: apply inspectors in resolver order until no node
    /// changes, or until the pass cap is reached.
    fn converge(
        &self,
        phase_name: &str,
        node_type: NodeType,
        schedule: &InspectorSchedule,
        pool: &rayon::ThreadPool,
        warnings: &mut Vec<String>,
    ) -> Result<ExecutionProfile> {
        self.progress.phase_started(phase_name, None);
        let profile = ExecutionProfile::begin(phase_name);

        let mut total_invocations = 0usize;
        let mut passes_used = 0usize;
        let mut converged = false;

        for pass in 1..=self.config.max_passes {
            passes_used = pass;
            let mut pass_invocations = 0usize;

            for layer in schedule.layers() {
                if self.cancel.is_cancelled() {
                    return Err(Error::Cancelled {
                        phase: phase_name.to_string(),
                    });
                }
                let work = self.eligible_work(node_type, layer);
                if work.is_empty() {
                    continue;
                }
                pass_invocations += work.len();

                let failures: Vec<Error> = pool.install(|| {
                    work.par_iter()
                        .filter_map(|(inspector, node_ref)| {
                            self.invoke(inspector, node_ref).err()
                        })
                        .collect()
                });
                if let Some(fatal) = failures.into_iter().next() {
                    return Err(fatal);
                }

                total_invocations += work.len();
                self.progress.tick(total_invocations);
            }

            tracing::debug!(phase = phase_name, pass, invocations = pass_invocations, "pass done");
            if pass_invocations == 0 {
                converged = true;
                break;
            }
        }

        if !converged {
            let dirty = self.still_dirty(node_type, schedule);
            let listing: Vec<String> = dirty
                .iter()
                .map(|(inspector, node_ref)| format!("({inspector}, {node_ref})"))
                .collect();
            let message = format!(
                "phase '{phase_name}' did not converge after {} passes; still dirty: {}",
                self.config.max_passes,
                listing.join(", ")
            );
            tracing::warn!("{message}");
            self.progress.error(&message);
            for (inspector, node_ref) in &dirty {
                self.repository.record_diagnostic(
                    node_ref,
                    format!(
                        "convergence warning: '{inspector}' still stale after {} passes",
                        self.config.max_passes
                    ),
                );
            }
            warnings.push(message);
        }

        let profile = profile.finish(total_invocations, passes_used, converged);
        self.progress.phase_finished(&profile);
        Ok(profile)
    }

    /// (inspector, node) pairs of one layer that are supported, have their
    /// required tags, and are stale under the freshness rule
    fn eligible_work(
        &self,
        node_type: NodeType,
        layer: &[InspectorRef],
    ) -> Vec<(InspectorRef, NodeRef)> {
        let refs = self.repository.refs_of_type(node_type);
        let mut work = Vec::new();
        for inspector in layer {
            for node_ref in &refs {
                if let Some(node) = self.repository.find_node(node_ref) {
                    if Self::applicable(inspector.as_ref(), &node) {
                        work.push((InspectorRef::clone(inspector), node_ref.clone()));
                    }
                }
            }
        }
        work
    }

    fn applicable(inspector: &dyn crate::inspector::Inspector, node: &GraphNode) -> bool {
        inspector.supports(node)
            && inspector.requires().iter().all(|tag| node.has_tag(tag))
            && !node.is_up_to_date(inspector.name())
    }

    /// Run one inspector on one node, apply its output, and record its
    /// execution stamp. Only fatal errors propagate; inspector failures,
    /// panics and timeouts become diagnostics on the node, which still
    /// counts as processed for the pass.
    fn invoke(&self, inspector: &InspectorRef, node_ref: &NodeRef) -> Result<()> {
        let node = self
            .repository
            .find_node(node_ref)
            .ok_or_else(|| Error::invariant(format!("node {node_ref} vanished mid-pass")))?;

        match self.run_guarded(inspector, node) {
            GuardedOutcome::Completed { decorator, result } => {
                let (_, mut ops, edges) = decorator.into_parts();
                if let Err(e) = result {
                    tracing::debug!(
                        inspector = inspector.name(),
                        node = %node_ref,
                        error = %e,
                        "inspector reported failure"
                    );
                    ops.push(NodeOp::Diagnostic(format!("ERROR: {e}")));
                }
                self.repository
                    .apply_inspection(node_ref, inspector.name(), &ops)?;
                self.apply_edges(node_ref, edges)
            }
            GuardedOutcome::Panicked(message) => {
                tracing::warn!(
                    inspector = inspector.name(),
                    node = %node_ref,
                    "inspector panicked: {message}"
                );
                self.repository.apply_inspection(
                    node_ref,
                    inspector.name(),
                    &[NodeOp::Diagnostic(format!(
                        "ERROR: inspector '{}' panicked: {message}",
                        inspector.name()
                    ))],
                )?;
                Ok(())
            }
            GuardedOutcome::TimedOut => {
                self.repository.apply_inspection(
                    node_ref,
                    inspector.name(),
                    &[NodeOp::Diagnostic(format!(
                        "ERROR: inspector '{}' timed out; result discarded",
                        inspector.name()
                    ))],
                )?;
                Ok(())
            }
        }
    }

    fn apply_edges(&self, node_ref: &NodeRef, edges: Vec<EdgeRequest>) -> Result<()> {
        for request in edges {
            // A missing target is an inspector programming error; the
            // resulting invariant violation aborts the run.
            self.repository
                .get_or_create_edge(node_ref.clone(), request.target, &request.edge_type)?;
        }
        Ok(())
    }

    fn run_guarded(&self, inspector: &InspectorRef, node: GraphNode) -> GuardedOutcome {
        match self.config.inspector_timeout {
            None => Self::run_caught(InspectorRef::clone(inspector), node),
            Some(timeout) => {
                let (tx, rx) = mpsc::channel();
                let inspector = InspectorRef::clone(inspector);
                std::thread::spawn(move || {
                    let _ = tx.send(Self::run_caught(inspector, node));
                });
                match rx.recv_timeout(timeout) {
                    Ok(outcome) => outcome,
                    // The invocation thread runs to completion on its own;
                    // its decorator is dropped unapplied.
                    Err(_) => GuardedOutcome::TimedOut,
                }
            }
        }
    }

    fn run_caught(inspector: InspectorRef, node: GraphNode) -> GuardedOutcome {
        let invocation = std::panic::catch_unwind(AssertUnwindSafe(move || {
            let mut decorator = NodeDecorator::new(NodeRef::new(node.node_type, node.id.clone()));
            let result = inspector.inspect(&node, &mut decorator);
            (decorator, result)
        }));
        match invocation {
            Ok((decorator, result)) => GuardedOutcome::Completed { decorator, result },
            Err(payload) => GuardedOutcome::Panicked(panic_message(payload)),
        }
    }

    fn still_dirty(
        &self,
        node_type: NodeType,
        schedule: &InspectorSchedule,
    ) -> Vec<(String, NodeRef)> {
        let refs = self.repository.refs_of_type(node_type);
        let mut dirty = Vec::new();
        for inspector in schedule.iter() {
            for node_ref in &refs {
                if let Some(node) = self.repository.find_node(node_ref) {
                    if Self::applicable(inspector.as_ref(), &node) {
                        dirty.push((inspector.name().to_string(), node_ref.clone()));
                    }
                }
            }
        }
        dirty
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ClassType, PropertyValue, SourceType};
    use crate::inspector::{ClassSeed, CollectOutcome, Collector, Inspector};
    use std::fs;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    /// Collector that turns every `.java` file into one class node named
    /// after the file stem, tagged `java.source`.
    struct StemCollector;

    impl Collector for StemCollector {
        fn name(&self) -> &str {
            "stem-collector"
        }
        fn supports(&self, file: &GraphNode) -> bool {
            file.extension() == Some("java")
        }
        fn collect(&self, file: &GraphNode) -> Result<CollectOutcome> {
            let stem = file
                .id
                .rsplit('/')
                .next()
                .and_then(|name| name.strip_suffix(".java"))
                .unwrap_or("Unknown")
                .to_string();
            Ok(CollectOutcome {
                seeds: vec![ClassSeed::new(
                    format!("p.{stem}"),
                    ClassType::Class,
                    SourceType::Source,
                )
                .with_tag("java.source")],
                file_ops: vec![NodeOp::EnableTag("java.source".into())],
            })
        }
    }

    struct FnInspector<F> {
        name: &'static str,
        requires: Vec<&'static str>,
        produces: Vec<&'static str>,
        node_type: NodeType,
        body: F,
    }

    impl<F> Inspector for FnInspector<F>
    where
        F: Fn(&GraphNode, &mut NodeDecorator) -> Result<()> + Send + Sync,
    {
        fn name(&self) -> &str {
            self.name
        }
        fn requires(&self) -> &[&str] {
            &self.requires
        }
        fn produces(&self) -> &[&str] {
            &self.produces
        }
        fn supports(&self, node: &GraphNode) -> bool {
            node.node_type == self.node_type
        }
        fn inspect(&self, node: &GraphNode, decorator: &mut NodeDecorator) -> Result<()> {
            (self.body)(node, decorator)
        }
    }

    fn class_inspector<F>(
        name: &'static str,
        requires: &[&'static str],
        produces: &[&'static str],
        body: F,
    ) -> InspectorRef
    where
        F: Fn(&GraphNode, &mut NodeDecorator) -> Result<()> + Send + Sync + 'static,
    {
        Arc::new(FnInspector {
            name,
            requires: requires.to_vec(),
            produces: produces.to_vec(),
            node_type: NodeType::JavaClass,
            body,
        })
    }

    fn project_with_classes(names: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in names {
            fs::write(
                dir.path().join(format!("{name}.java")),
                format!("class {name} {{}}"),
            )
            .unwrap();
        }
        dir
    }

    fn engine_for(dir: &tempfile::TempDir, registry: InspectorRegistry) -> AnalysisEngine {
        AnalysisEngine::new(AnalyzerConfig::new(dir.path()).with_parallelism(2), registry)
    }

    #[test]
    fn empty_project_runs_all_phases_without_errors() {
        let dir = tempfile::tempdir().unwrap();
        let report = engine_for(&dir, InspectorRegistry::new()).run().unwrap();
        assert_eq!(report.profiles.len(), 5);
        assert!(report.warnings.is_empty());
        assert!(report.profiles.iter().all(|p| p.converged));
        assert!(report.snapshot_path.exists());
    }

    #[test]
    fn cyclic_inspectors_abort_before_phase_one() {
        let dir = project_with_classes(&["Foo"]);
        let mut registry = InspectorRegistry::new();
        registry.register_class_inspector(class_inspector("i1", &["t2"], &["t1"], |_, _| Ok(())));
        registry.register_class_inspector(class_inspector("i2", &["t1"], &["t2"], |_, _| Ok(())));
        let engine = engine_for(&dir, registry);
        let err = engine.run().unwrap_err();
        assert!(matches!(err, Error::DependencyCycle { .. }));
        // Phase 1 never ran.
        assert_eq!(engine.repository().node_count(), 0);
    }

    #[test]
    fn mutual_enrichment_converges_within_two_working_passes() {
        let dir = project_with_classes(&["Foo"]);
        let mut registry = InspectorRegistry::new();
        registry.register_collector(Arc::new(StemCollector));
        // B sets t1 once java.source (from collection) is present.
        registry.register_class_inspector(class_inspector(
            "b-tagger",
            &["java.source"],
            &["t1"],
            |_, decorator| {
                decorator.enable_tag("t1");
                Ok(())
            },
        ));
        // A writes property p once t1 is present.
        registry.register_class_inspector(class_inspector(
            "a-writer",
            &["t1"],
            &[],
            |_, decorator| {
                decorator.set_property("p", "present");
                Ok(())
            },
        ));

        let engine = engine_for(&dir, registry);
        let report = engine.run().unwrap();
        let phase4 = &report.profiles[3];
        assert!(phase4.converged);
        assert!(phase4.passes <= 3, "stable after two working passes");

        let node = engine.repository().find_class_by_fqn("p.Foo").unwrap();
        assert_eq!(node.property("p").unwrap().as_str(), Some("present"));
        assert!(node.has_tag("t1"));
    }

    #[test]
    fn producer_runs_before_consumer_in_every_pass() {
        let dir = project_with_classes(&["Foo", "Bar"]);
        let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
        let mut registry = InspectorRegistry::new();
        registry.register_collector(Arc::new(StemCollector));
        let o1 = Arc::clone(&order);
        registry.register_class_inspector(class_inspector(
            "z-producer",
            &[],
            &["ready"],
            move |_, decorator| {
                o1.lock().unwrap().push("producer");
                decorator.enable_tag("ready");
                Ok(())
            },
        ));
        let o2 = Arc::clone(&order);
        registry.register_class_inspector(class_inspector(
            "a-consumer",
            &["ready"],
            &[],
            move |_, _| {
                o2.lock().unwrap().push("consumer");
                Ok(())
            },
        ));

        engine_for(&dir, registry).run().unwrap();
        let order = order.lock().unwrap();
        let first_consumer = order.iter().position(|n| *n == "consumer").unwrap();
        let producers_before = order[..first_consumer]
            .iter()
            .filter(|n| **n == "producer")
            .count();
        assert_eq!(producers_before, 2, "both nodes produced before any consume");
    }

    #[test]
    fn failing_inspector_is_recorded_and_does_not_loop() {
        let dir = project_with_classes(&["Foo"]);
        let mut registry = InspectorRegistry::new();
        registry.register_collector(Arc::new(StemCollector));
        registry.register_class_inspector(class_inspector(
            "broken",
            &[],
            &[],
            |node, _| Err(Error::inspector("broken", node.id.clone(), "boom")),
        ));

        let engine = engine_for(&dir, registry);
        let report = engine.run().unwrap();
        assert!(report.profiles[3].converged);

        let node = engine.repository().find_class_by_fqn("p.Foo").unwrap();
        assert!(node.diagnostics.iter().any(|d| d.contains("boom")));
        assert!(node.is_up_to_date("broken"), "failure still counts as executed");
    }

    #[test]
    fn panicking_inspector_is_isolated() {
        let dir = project_with_classes(&["Foo", "Bar"]);
        let mut registry = InspectorRegistry::new();
        registry.register_collector(Arc::new(StemCollector));
        registry.register_class_inspector(class_inspector("grumpy", &[], &[], |node, _| {
            if node.id == "p.Foo" {
                panic!("unexpected shape");
            }
            Ok(())
        }));
        registry.register_class_inspector(class_inspector(
            "steady",
            &[],
            &[],
            |_, decorator| {
                decorator.set_property("seen", true);
                Ok(())
            },
        ));

        let engine = engine_for(&dir, registry);
        let report = engine.run().unwrap();
        assert!(report.profiles[3].converged);

        let repo = engine.repository();
        let foo = repo.find_class_by_fqn("p.Foo").unwrap();
        assert!(foo.diagnostics.iter().any(|d| d.contains("panicked")));
        // The sibling inspector still processed every node.
        assert_eq!(foo.property("seen"), Some(&PropertyValue::Bool(true)));
        let bar = repo.find_class_by_fqn("p.Bar").unwrap();
        assert_eq!(bar.property("seen"), Some(&PropertyValue::Bool(true)));
    }

    #[test]
    fn pass_cap_emits_convergence_warning_and_keeps_outputs() {
        let dir = project_with_classes(&["Foo"]);
        let counter = Arc::new(AtomicUsize::new(0));
        let mut registry = InspectorRegistry::new();
        registry.register_collector(Arc::new(StemCollector));
        let c = Arc::clone(&counter);
        registry.register_class_inspector(class_inspector(
            "restless",
            &[],
            &[],
            move |_, decorator| {
                let n = c.fetch_add(1, Ordering::SeqCst);
                decorator.enable_tag(format!("gen{n}"));
                Ok(())
            },
        ));

        let engine = AnalysisEngine::new(
            AnalyzerConfig::new(dir.path())
                .with_parallelism(1)
                .with_max_passes(3),
            registry,
        );
        let report = engine.run().unwrap();
        let phase4 = &report.profiles[3];
        assert!(!phase4.converged);
        assert_eq!(phase4.passes, 3);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("restless"));

        let node = engine.repository().find_class_by_fqn("p.Foo").unwrap();
        assert!(node.has_tag("gen0"), "applied outputs are never rolled back");
        assert!(node
            .diagnostics
            .iter()
            .any(|d| d.contains("convergence warning")));
    }

    #[test]
    fn cancellation_stops_between_layers() {
        let dir = project_with_classes(&["Foo"]);
        let mut registry = InspectorRegistry::new();
        registry.register_collector(Arc::new(StemCollector));
        registry.register_class_inspector(class_inspector("noop", &[], &[], |_, _| Ok(())));
        let engine = engine_for(&dir, registry);
        engine.cancellation_flag().cancel();
        let err = engine.run().unwrap_err();
        assert!(matches!(err, Error::Cancelled { .. }));
    }

    #[test]
    fn timed_out_inspector_result_is_discarded() {
        let dir = project_with_classes(&["Foo"]);
        let mut registry = InspectorRegistry::new();
        registry.register_collector(Arc::new(StemCollector));
        registry.register_class_inspector(class_inspector(
            "sleepy",
            &[],
            &[],
            |_, decorator| {
                std::thread::sleep(std::time::Duration::from_millis(250));
                decorator.set_property("late", true);
                Ok(())
            },
        ));

        let engine = AnalysisEngine::new(
            AnalyzerConfig::new(dir.path())
                .with_parallelism(1)
                .with_inspector_timeout(std::time::Duration::from_millis(20)),
            registry,
        );
        let report = engine.run().unwrap();
        assert!(report.profiles[3].converged);
        let node = engine.repository().find_class_by_fqn("p.Foo").unwrap();
        assert!(node.property("late").is_none(), "timed-out writes are discarded");
        assert!(node.diagnostics.iter().any(|d| d.contains("timed out")));
    }

    #[test]
    fn edge_to_missing_node_is_fatal() {
        let dir = project_with_classes(&["Foo"]);
        let mut registry = InspectorRegistry::new();
        registry.register_collector(Arc::new(StemCollector));
        registry.register_class_inspector(class_inspector(
            "dangling",
            &[],
            &[],
            |_, decorator| {
                decorator.add_edge_to(NodeRef::java_class("p.DoesNotExist"), "imports");
                Ok(())
            },
        ));

        let err = engine_for(&dir, registry).run().unwrap_err();
        assert!(matches!(err, Error::Invariant(_)));
    }

    #[test]
    fn rerun_on_converged_repository_processes_nothing() {
        let dir = project_with_classes(&["Foo"]);
        let mut registry = InspectorRegistry::new();
        registry.register_collector(Arc::new(StemCollector));
        registry.register_class_inspector(class_inspector(
            "marker",
            &[],
            &["marked"],
            |_, decorator| {
                decorator.enable_tag("marked");
                Ok(())
            },
        ));

        let engine = engine_for(&dir, registry);
        let first = engine.run().unwrap();
        assert!(first.profiles[3].nodes_processed > 0);

        // Same engine, same repository: everything is already fresh.
        let second = engine.run().unwrap();
        assert_eq!(second.profiles[3].nodes_processed, 0);
        assert_eq!(second.profiles[3].passes, 1);
        assert!(second.profiles[3].converged);
    }
}
