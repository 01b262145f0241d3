use serde::Deserialize;
use serde_json::Value;

use crate::scan::{Finding, Location, ParseError, Severity, ToolAdapter, ToolCommand, ToolId};
use crate::settings::Settings;

/// General SAST via `semgrep scan --json`.
pub struct SemgrepAdapter;

#[derive(Deserialize)]
struct SemgrepOutput {
    #[serde(default)]
    results: Vec<Value>,
}

#[derive(Deserialize)]
struct SemgrepResult {
    check_id: String,
    path: String,
    start: SemgrepPosition,
    extra: SemgrepExtra,
}

#[derive(Deserialize)]
struct SemgrepPosition {
    #[serde(default)]
    line: Option<u64>,
}

#[derive(Deserialize)]
struct SemgrepExtra {
    severity: String,
    message: String,
}

/// Semgrep speaks ERROR/WARNING/INFO rather than a security scale.
fn map_severity(raw: &str) -> Severity {
    match raw.to_ascii_uppercase().as_str() {
        "ERROR" => Severity::High,
        "WARNING" => Severity::Medium,
        "INFO" => Severity::Info,
        _ => Severity::Unknown,
    }
}

#[async_trait::async_trait]
impl ToolAdapter for SemgrepAdapter {
    fn tool(&self) -> ToolId {
        ToolId::Semgrep
    }

    fn command(&self, settings: &Settings) -> ToolCommand {
        let target = settings.target.display().to_string();
        ToolCommand::new("semgrep", &["scan", "--config", "auto", "--json", "--quiet", &target])
    }

    fn parse(&self, raw: &str) -> Result<Vec<Finding>, ParseError> {
        let output: SemgrepOutput = serde_json::from_str(raw)?;
        let mut findings = Vec::with_capacity(output.results.len());
        for value in output.results {
            let result: SemgrepResult = serde_json::from_value(value.clone())?;
            findings.push(Finding {
                tool: ToolId::Semgrep,
                severity: map_severity(&result.extra.severity),
                title: format!("{}: {}", result.check_id, result.extra.message.trim()),
                location: Some(Location::new(result.path, result.start.line)),
                raw: value,
            });
        }
        Ok(findings)
    }
}
