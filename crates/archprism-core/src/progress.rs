//! Progress reporting for analysis runs

use crate::profile::ExecutionProfile;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Receiver for scheduler tick events.
///
/// The default implementation renders a terminal progress bar; silent and
/// structured-log implementations plug in through the same interface.
pub trait ProgressReporter: Send + Sync {
    /// A phase is starting; `total` is the work item count when known
    fn phase_started(&self, phase: &str, total: Option<usize>);

    /// Work items finished so far in the current phase
    fn tick(&self, processed: usize);

    /// A phase finished with the given profile
    fn phase_finished(&self, profile: &ExecutionProfile);

    /// A non-fatal error was observed
    fn error(&self, message: &str);
}

/// Reporter that swallows every event
#[derive(Debug, Default)]
pub struct NoOpProgressReporter;

impl ProgressReporter for NoOpProgressReporter {
    fn phase_started(&self, _phase: &str, _total: Option<usize>) {}
    fn tick(&self, _processed: usize) {}
    fn phase_finished(&self, _profile: &ExecutionProfile) {}
    fn error(&self, _message: &str) {}
}

/// Reporter that forwards events to the tracing subscriber
#[derive(Debug, Default)]
pub struct LogProgressReporter;

impl ProgressReporter for LogProgressReporter {
    fn phase_started(&self, phase: &str, total: Option<usize>) {
        tracing::info!(phase, total, "phase started");
    }

    fn tick(&self, _processed: usize) {}

    fn phase_finished(&self, profile: &ExecutionProfile) {
        tracing::info!(
            phase = %profile.name,
            nodes = profile.nodes_processed,
            passes = profile.passes,
            converged = profile.converged,
            duration_ms = profile.duration_ms(),
            "phase finished"
        );
    }

    fn error(&self, message: &str) {
        tracing::warn!("{message}");
    }
}

/// Default terminal reporter: one indicatif bar per phase
pub struct TextProgressReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl TextProgressReporter {
    /// Create a terminal reporter
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template("{msg:24} [{bar:40}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }
}

impl Default for TextProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for TextProgressReporter {
    fn phase_started(&self, phase: &str, total: Option<usize>) {
        let bar = match total {
            Some(total) => {
                let bar = ProgressBar::new(total as u64);
                bar.set_style(Self::style());
                bar
            }
            None => ProgressBar::new_spinner(),
        };
        bar.set_message(phase.to_string());
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(previous) = slot.take() {
                previous.finish_and_clear();
            }
            *slot = Some(bar);
        }
    }

    fn tick(&self, processed: usize) {
        if let Ok(slot) = self.bar.lock() {
            if let Some(bar) = slot.as_ref() {
                bar.set_position(processed as u64);
            }
        }
    }

    fn phase_finished(&self, profile: &ExecutionProfile) {
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_with_message(format!(
                    "{} ({} nodes, {} passes)",
                    profile.name, profile.nodes_processed, profile.passes
                ));
            }
        }
    }

    fn error(&self, message: &str) {
        if let Ok(slot) = self.bar.lock() {
            if let Some(bar) = slot.as_ref() {
                bar.println(message.to_string());
                return;
            }
        }
        tracing::warn!("{message}");
    }
}
