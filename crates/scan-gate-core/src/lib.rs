pub mod adapters;
pub mod gate;
pub mod pipeline;
pub mod report;
pub mod scan;
pub mod settings;
pub mod summary;

pub use gate::GateDecision;
pub use pipeline::{run_pipeline, run_with, PipelineOutput};
pub use report::{render_report, write_report, OutputFormat};
pub use scan::orchestrator::Orchestrator;
pub use scan::{
    Finding, Location, ParseError, ScanRun, Severity, ToolAdapter, ToolCommand, ToolId,
    ToolOutcome,
};
pub use settings::Settings;
pub use summary::{token_counts, SeverityCounts, TokenCounts};
