//! Dependency resolution and layering for inspectors
//!
//! Orders inspectors so every `requires` tag is produced by an earlier
//! inspector, groups independent inspectors into layers eligible for
//! parallel execution, and rejects cyclic declarations with an error that
//! names the cycle. Tags no registered inspector produces (for example
//! tags set by collectors in Phase 2) impose no ordering constraint; the
//! runtime `requires ⊆ tags(n)` check still gates them per node.

use crate::error::{Error, Result};
use crate::inspector::InspectorRef;
use std::collections::{BTreeMap, BTreeSet};

/// A topological schedule of inspectors
#[derive(Clone)]
pub struct InspectorSchedule {
    layers: Vec<Vec<InspectorRef>>,
}

impl std::fmt::Debug for InspectorSchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InspectorSchedule")
            .field(
                "layers",
                &self
                    .layers
                    .iter()
                    .map(|layer| layer.iter().map(|i| i.name()).collect::<Vec<_>>())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl InspectorSchedule {
    /// Layers in execution order; inspectors within one layer are mutually
    /// independent and sorted by name
    pub fn layers(&self) -> &[Vec<InspectorRef>] {
        &self.layers
    }

    /// Flattened execution order
    pub fn iter(&self) -> impl Iterator<Item = &InspectorRef> {
        self.layers.iter().flatten()
    }

    /// Total inspector count
    pub fn len(&self) -> usize {
        self.layers.iter().map(|l| l.len()).sum()
    }

    /// True when no inspectors are scheduled
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Compute the layered schedule for a set of inspectors of one variant.
pub fn resolve_layers(inspectors: &[InspectorRef]) -> Result<InspectorSchedule> {
    let mut by_name: BTreeMap<&str, &InspectorRef> = BTreeMap::new();
    for inspector in inspectors {
        if by_name.insert(inspector.name(), inspector).is_some() {
            return Err(Error::config(
                "inspectors",
                format!("duplicate inspector name '{}'", inspector.name()),
            ));
        }
    }

    // tag -> producers
    let mut producers: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for inspector in inspectors {
        for tag in inspector.produces() {
            producers.entry(*tag).or_default().insert(inspector.name());
        }
    }

    // name -> names of inspectors that must run earlier
    let mut predecessors: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for inspector in inspectors {
        let mut preds = BTreeSet::new();
        for tag in inspector.requires() {
            if let Some(tag_producers) = producers.get(tag) {
                for producer in tag_producers {
                    if *producer != inspector.name() {
                        preds.insert(*producer);
                    } else {
                        return Err(Error::DependencyCycle {
                            cycle: vec![inspector.name().to_string(), inspector.name().to_string()],
                        });
                    }
                }
            }
        }
        predecessors.insert(inspector.name(), preds);
    }

    let mut scheduled: BTreeSet<&str> = BTreeSet::new();
    let mut layers: Vec<Vec<InspectorRef>> = Vec::new();
    while scheduled.len() < inspectors.len() {
        // BTreeMap iteration keeps each layer lexicographically sorted.
        let ready: Vec<&str> = predecessors
            .iter()
            .filter(|(name, preds)| {
                !scheduled.contains(*name) && preds.iter().all(|p| scheduled.contains(p))
            })
            .map(|(name, _)| *name)
            .collect();

        if ready.is_empty() {
            let remaining: BTreeSet<&str> = predecessors
                .keys()
                .filter(|name| !scheduled.contains(*name))
                .copied()
                .collect();
            return Err(Error::DependencyCycle {
                cycle: find_cycle(&predecessors, &scheduled, &remaining),
            });
        }

        layers.push(
            ready
                .iter()
                .map(|name| InspectorRef::clone(by_name[name]))
                .collect(),
        );
        scheduled.extend(ready);
    }

    Ok(InspectorSchedule { layers })
}

/// Walk predecessor links among unscheduled inspectors until a name
/// repeats; the slice between the repetitions is a genuine cycle.
fn find_cycle(
    predecessors: &BTreeMap<&str, BTreeSet<&str>>,
    scheduled: &BTreeSet<&str>,
    remaining: &BTreeSet<&str>,
) -> Vec<String> {
    let start = match remaining.iter().next() {
        Some(name) => *name,
        None => return Vec::new(),
    };
    let mut trail: Vec<&str> = vec![start];
    let mut current = start;
    loop {
        let next = predecessors
            .get(current)
            .and_then(|preds| preds.iter().find(|p| !scheduled.contains(*p)).copied());
        let next = match next {
            Some(n) => n,
            None => break,
        };
        if let Some(pos) = trail.iter().position(|n| *n == next) {
            let mut cycle: Vec<String> = trail[pos..].iter().map(|s| s.to_string()).collect();
            cycle.push(next.to_string());
            return cycle;
        }
        trail.push(next);
        current = next;
    }
    trail.into_iter().map(|s| s.to_string()).collect()
}
