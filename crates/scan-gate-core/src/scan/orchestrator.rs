use std::sync::Arc;
use std::time::SystemTime;

use tokio::task::JoinSet;
use tracing::{info, instrument, warn};

use super::{ScanRun, ToolAdapter, ToolOutcome};
use crate::adapters;
use crate::settings::Settings;

/// Runs the configured adapters and assembles a [`ScanRun`].
///
/// Adapters are independent of each other, so they execute as concurrent
/// tasks; the join barrier restores the fixed report order before the run
/// is frozen. No adapter result can abort the orchestrator.
pub struct Orchestrator {
    settings: Settings,
    adapters: Vec<Arc<dyn ToolAdapter>>,
}

impl Orchestrator {
    /// Orchestrator over the full built-in tool registry.
    pub fn new(settings: Settings) -> Self {
        Self::with_adapters(settings, adapters::default_adapters())
    }

    /// Orchestrator over a caller-provided adapter set, in the order given.
    pub fn with_adapters(settings: Settings, adapters: Vec<Arc<dyn ToolAdapter>>) -> Self {
        Self { settings, adapters }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[instrument(name = "scan_run", skip(self), fields(tools = self.adapters.len()))]
    pub async fn run(&self) -> ScanRun {
        let started_at = SystemTime::now();
        info!(target = %self.settings.target.display(), "security scan started");

        let mut tasks = JoinSet::new();
        for (index, adapter) in self.adapters.iter().enumerate() {
            let adapter = Arc::clone(adapter);
            let settings = self.settings.clone();
            tasks.spawn(async move {
                let outcome = adapter.run(&settings).await;
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<ToolOutcome>> = vec![None; self.adapters.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    log_outcome(&outcome);
                    slots[index] = Some(outcome);
                }
                Err(err) => warn!(error = %err, "adapter task did not complete"),
            }
        }

        // A panicked task leaves its slot empty; record that as a tooling
        // error so the report still carries one section per tool.
        let outcomes = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    ToolOutcome::failed(self.adapters[index].tool(), "adapter task panicked")
                })
            })
            .collect();

        let run = ScanRun::new(started_at, outcomes);
        info!(any_issue = run.any_issue, "security scan completed");
        run
    }
}

fn log_outcome(outcome: &ToolOutcome) {
    match (&outcome.tooling_error, outcome.invoked) {
        (Some(error), _) => warn!(tool = %outcome.tool, %error, "tooling error"),
        (None, false) => info!(tool = %outcome.tool, "skipped (not installed)"),
        (None, true) => info!(tool = %outcome.tool, findings = outcome.findings.len(), "scanned"),
    }
}
