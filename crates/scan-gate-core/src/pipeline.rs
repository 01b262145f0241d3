use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use crate::gate::GateDecision;
use crate::report::{render_report, write_report, OutputFormat};
use crate::scan::orchestrator::Orchestrator;
use crate::scan::ScanRun;
use crate::settings::Settings;

/// Everything one pipeline invocation produced.
pub struct PipelineOutput {
    pub run: ScanRun,
    pub decision: GateDecision,
    pub report: String,
    pub report_path: PathBuf,
}

/// Scan, render, summarize, write, gate. Adapter trouble never aborts the
/// pipeline; failing to put the report in place does.
pub async fn run_pipeline(settings: Settings) -> Result<PipelineOutput> {
    run_with(Orchestrator::new(settings)).await
}

/// Same, over a caller-provided orchestrator (custom adapter sets).
pub async fn run_with(orchestrator: Orchestrator) -> Result<PipelineOutput> {
    let run = orchestrator.run().await;
    let decision = GateDecision::evaluate(&run);
    let report = render_report(&run, OutputFormat::Markdown)?;
    let report_path = orchestrator.settings().report_path(run.started_at);
    write_report(&report_path, &report).await?;
    info!(path = %report_path.display(), gate = %decision, "report written");

    Ok(PipelineOutput {
        run,
        decision,
        report,
        report_path,
    })
}
