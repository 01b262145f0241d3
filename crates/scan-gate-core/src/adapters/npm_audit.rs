use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::scan::{Finding, ParseError, Severity, ToolAdapter, ToolCommand, ToolId};
use crate::settings::Settings;

/// JS dependency vulnerabilities via `npm audit --json`.
pub struct NpmAuditAdapter;

#[derive(Deserialize)]
struct AuditOutput {
    metadata: AuditMetadata,
    #[serde(default)]
    advisories: BTreeMap<String, Value>,
}

#[derive(Deserialize)]
struct AuditMetadata {
    vulnerabilities: VulnerabilityTotals,
}

#[derive(Deserialize)]
struct VulnerabilityTotals {
    total: u64,
}

#[derive(Deserialize)]
struct Advisory {
    module_name: String,
    severity: String,
    title: String,
}

/// npm's five-level vocabulary; `moderate` is the odd one out.
fn map_severity(raw: &str) -> Severity {
    match raw.to_ascii_lowercase().as_str() {
        "critical" => Severity::Critical,
        "high" => Severity::High,
        "moderate" => Severity::Medium,
        "low" => Severity::Low,
        "info" => Severity::Info,
        _ => Severity::Unknown,
    }
}

#[async_trait::async_trait]
impl ToolAdapter for NpmAuditAdapter {
    fn tool(&self) -> ToolId {
        ToolId::NpmAudit
    }

    fn command(&self, _settings: &Settings) -> ToolCommand {
        ToolCommand::new("npm", &["audit", "--json"])
    }

    fn parse(&self, raw: &str) -> Result<Vec<Finding>, ParseError> {
        let output: AuditOutput = serde_json::from_str(raw)?;
        let total = output.metadata.vulnerabilities.total;
        if total == 0 {
            return Ok(Vec::new());
        }
        if output.advisories.is_empty() {
            return Err(ParseError::schema(
                ToolId::NpmAudit,
                format!("{total} vulnerabilities reported but no advisory details present"),
            ));
        }
        let mut findings = Vec::with_capacity(output.advisories.len());
        for (_, value) in output.advisories {
            let advisory: Advisory = serde_json::from_value(value.clone())?;
            findings.push(Finding {
                tool: ToolId::NpmAudit,
                severity: map_severity(&advisory.severity),
                title: format!("{}: {}", advisory.module_name, advisory.title),
                location: None,
                raw: value,
            });
        }
        Ok(findings)
    }
}
