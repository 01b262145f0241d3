use serde::Deserialize;
use serde_json::Value;

use crate::scan::{Finding, Location, ParseError, Severity, ToolAdapter, ToolCommand, ToolId};
use crate::settings::Settings;

/// Python source static analysis via `bandit -r <target> -f json`.
pub struct BanditAdapter;

#[derive(Deserialize)]
struct BanditOutput {
    #[serde(default)]
    results: Vec<Value>,
}

#[derive(Deserialize)]
struct BanditIssue {
    issue_severity: String,
    issue_text: String,
    filename: String,
    #[serde(default)]
    line_number: Option<u64>,
}

/// Bandit severities map 1:1; anything it grows later lands in Unknown.
fn map_severity(raw: &str) -> Severity {
    match raw.to_ascii_uppercase().as_str() {
        "HIGH" => Severity::High,
        "MEDIUM" => Severity::Medium,
        "LOW" => Severity::Low,
        _ => Severity::Unknown,
    }
}

#[async_trait::async_trait]
impl ToolAdapter for BanditAdapter {
    fn tool(&self) -> ToolId {
        ToolId::Bandit
    }

    fn command(&self, settings: &Settings) -> ToolCommand {
        let target = settings.target.display().to_string();
        ToolCommand::new("bandit", &["-r", &target, "-f", "json", "-q"])
    }

    fn parse(&self, raw: &str) -> Result<Vec<Finding>, ParseError> {
        let output: BanditOutput = serde_json::from_str(raw)?;
        let mut findings = Vec::with_capacity(output.results.len());
        for value in output.results {
            let issue: BanditIssue = serde_json::from_value(value.clone())?;
            findings.push(Finding {
                tool: ToolId::Bandit,
                severity: map_severity(&issue.issue_severity),
                title: issue.issue_text,
                location: Some(Location::new(issue.filename, issue.line_number)),
                raw: value,
            });
        }
        Ok(findings)
    }
}
