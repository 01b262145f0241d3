use std::fmt;
use std::time::SystemTime;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::Settings;

pub mod invoke;
pub mod orchestrator;

/// Shared severity scale every tool vocabulary is mapped onto.
///
/// Ordering is used for display grouping only; the gate never looks at it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
    Unknown,
}

impl Severity {
    /// Literal token embedded in rendered report bullets, e.g. `[HIGH]`.
    pub fn token(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
            Self::Info => "INFO",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Identity of one external analysis tool wired into the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolId {
    Bandit,
    Safety,
    NpmAudit,
    Trivy,
    Gitleaks,
    Semgrep,
    PipOutdated,
    NpmOutdated,
}

impl ToolId {
    /// Fixed report order. Adapters may finish in any order at runtime;
    /// outcomes are always presented in this one.
    pub const ALL: [ToolId; 8] = [
        ToolId::Bandit,
        ToolId::Safety,
        ToolId::NpmAudit,
        ToolId::Trivy,
        ToolId::Gitleaks,
        ToolId::Semgrep,
        ToolId::PipOutdated,
        ToolId::NpmOutdated,
    ];

    /// Short identifier used in logs and artifact file names.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bandit => "bandit",
            Self::Safety => "safety",
            Self::NpmAudit => "npm-audit",
            Self::Trivy => "trivy",
            Self::Gitleaks => "gitleaks",
            Self::Semgrep => "semgrep",
            Self::PipOutdated => "pip-outdated",
            Self::NpmOutdated => "npm-outdated",
        }
    }

    /// Section heading shown in the rendered report.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Bandit => "Bandit (Python static analysis)",
            Self::Safety => "Safety (Python dependency vulnerabilities)",
            Self::NpmAudit => "npm audit (JS dependency vulnerabilities)",
            Self::Trivy => "Trivy (container image scan)",
            Self::Gitleaks => "Gitleaks (secret scan)",
            Self::Semgrep => "Semgrep (SAST)",
            Self::PipOutdated => "Outdated Python packages",
            Self::NpmOutdated => "Outdated npm packages",
        }
    }

    /// File name under the raw artifact directory holding the captured output.
    pub fn artifact_file(&self) -> &'static str {
        match self {
            Self::Bandit => "bandit.json",
            Self::Safety => "safety.json",
            Self::NpmAudit => "npm-audit.json",
            Self::Trivy => "trivy.json",
            Self::Gitleaks => "gitleaks.json",
            Self::Semgrep => "semgrep.json",
            Self::PipOutdated => "pip-outdated.json",
            Self::NpmOutdated => "npm-outdated.json",
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Source position attached to a finding when the tool reports one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,
}

impl Location {
    pub fn new(file: impl Into<String>, line: Option<u64>) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}", self.file, line),
            None => f.write_str(&self.file),
        }
    }
}

/// One normalized unit of scanner evidence. Created once at parse time and
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub tool: ToolId,
    pub severity: Severity,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// The tool's original record, kept opaque for later inspection.
    pub raw: serde_json::Value,
}

/// Result of one adapter invocation.
///
/// The four states stay distinguishable: skipped (binary absent), clean
/// (ran, zero findings), findings present, and tooling error (ran but the
/// output could not be interpreted).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub tool: ToolId,
    pub invoked: bool,
    pub findings: Vec<Finding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooling_error: Option<String>,
}

impl ToolOutcome {
    /// Tool binary was unavailable. A skip, not a failure.
    pub fn skipped(tool: ToolId) -> Self {
        Self {
            tool,
            invoked: false,
            findings: Vec::new(),
            tooling_error: None,
        }
    }

    /// Tool ran and reported nothing.
    pub fn clean(tool: ToolId) -> Self {
        Self {
            tool,
            invoked: true,
            findings: Vec::new(),
            tooling_error: None,
        }
    }

    /// Tool ran and reported one or more findings.
    pub fn with_findings(tool: ToolId, findings: Vec<Finding>) -> Self {
        Self {
            tool,
            invoked: true,
            findings,
            tooling_error: None,
        }
    }

    /// Tool ran but its output could not be interpreted.
    pub fn failed(tool: ToolId, error: impl Into<String>) -> Self {
        Self {
            tool,
            invoked: true,
            findings: Vec::new(),
            tooling_error: Some(error.into()),
        }
    }

    pub fn has_findings(&self) -> bool {
        !self.findings.is_empty()
    }
}

/// The complete set of outcomes from one pipeline invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRun {
    pub started_at: SystemTime,
    pub outcomes: Vec<ToolOutcome>,
    /// Sole gating signal: true when any outcome carries at least one
    /// finding. Tooling errors and skips do not set it.
    pub any_issue: bool,
}

impl ScanRun {
    /// Freeze a run. `any_issue` is reduced here, after all adapters have
    /// returned, rather than accumulated through shared state.
    pub fn new(started_at: SystemTime, outcomes: Vec<ToolOutcome>) -> Self {
        let any_issue = outcomes.iter().any(ToolOutcome::has_findings);
        Self {
            started_at,
            outcomes,
            any_issue,
        }
    }

    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.outcomes.iter().flat_map(|o| o.findings.iter())
    }
}

/// Errors emitted while interpreting a tool's captured output.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("output is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unexpected {tool} output shape: {detail}")]
    Schema { tool: ToolId, detail: String },
}

impl ParseError {
    pub fn schema(tool: ToolId, detail: impl Into<String>) -> Self {
        Self::Schema {
            tool,
            detail: detail.into(),
        }
    }
}

/// External program invocation an adapter wants executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// One adapter per external tool: names the invocation and interprets the
/// captured output into normalized findings. Execution itself (spawn,
/// timeout, artifact capture, failure downgrade) lives in [`invoke`] so
/// every adapter shares the same failure policy.
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    fn tool(&self) -> ToolId;

    /// Command line to execute for the configured settings.
    fn command(&self, settings: &Settings) -> ToolCommand;

    /// Whether this adapter applies at all under the given settings.
    /// Disabled adapters are recorded as skipped.
    fn enabled(&self, _settings: &Settings) -> bool {
        true
    }

    /// Interpret captured stdout into zero or more findings.
    fn parse(&self, raw: &str) -> Result<Vec<Finding>, ParseError>;

    /// Execute this adapter end to end under the shared failure policy.
    async fn run(&self, settings: &Settings) -> ToolOutcome {
        invoke::run_adapter(self, settings).await
    }
}
