use serde::Deserialize;
use serde_json::Value;

use crate::scan::{Finding, Location, ParseError, Severity, ToolAdapter, ToolCommand, ToolId};
use crate::settings::Settings;

/// Secret scan via `gitleaks detect`.
///
/// Gitleaks has no severity concept. An exposed credential is treated as
/// High across the board.
pub struct GitleaksAdapter;

const FIXED_SEVERITY: Severity = Severity::High;

#[derive(Deserialize)]
struct Leak {
    #[serde(rename = "Description")]
    description: String,
    #[serde(rename = "File")]
    file: String,
    #[serde(rename = "StartLine", default)]
    start_line: Option<u64>,
}

#[async_trait::async_trait]
impl ToolAdapter for GitleaksAdapter {
    fn tool(&self) -> ToolId {
        ToolId::Gitleaks
    }

    fn command(&self, settings: &Settings) -> ToolCommand {
        let target = settings.target.display().to_string();
        ToolCommand::new(
            "gitleaks",
            &[
                "detect",
                "--no-banner",
                "--source",
                &target,
                "--report-format",
                "json",
                "--report-path",
                "/dev/stdout",
            ],
        )
    }

    fn parse(&self, raw: &str) -> Result<Vec<Finding>, ParseError> {
        let leaks: Vec<Value> = serde_json::from_str(raw)?;
        let mut findings = Vec::with_capacity(leaks.len());
        for value in leaks {
            let leak: Leak = serde_json::from_value(value.clone())?;
            findings.push(Finding {
                tool: ToolId::Gitleaks,
                severity: FIXED_SEVERITY,
                title: leak.description,
                location: Some(Location::new(leak.file, leak.start_line)),
                raw: value,
            });
        }
        Ok(findings)
    }
}
