use serde_json::Value;

use crate::scan::{Finding, ParseError, Severity, ToolAdapter, ToolCommand, ToolId};
use crate::settings::Settings;

/// Python dependency vulnerabilities via `safety check --json`.
///
/// The JSON form is a list of advisory tuples:
/// `[package, affected_spec, installed_version, advisory, advisory_id]`.
/// The format carries no severity, and a known-vulnerable dependency is
/// always worth acting on, so every hit is reported as High.
pub struct SafetyAdapter;

const FIXED_SEVERITY: Severity = Severity::High;

#[async_trait::async_trait]
impl ToolAdapter for SafetyAdapter {
    fn tool(&self) -> ToolId {
        ToolId::Safety
    }

    fn command(&self, _settings: &Settings) -> ToolCommand {
        ToolCommand::new("safety", &["check", "--json"])
    }

    fn parse(&self, raw: &str) -> Result<Vec<Finding>, ParseError> {
        let rows: Vec<Value> = serde_json::from_str(raw)?;
        let mut findings = Vec::with_capacity(rows.len());
        for row in rows {
            let tuple = row
                .as_array()
                .filter(|t| t.len() >= 5)
                .ok_or_else(|| {
                    ParseError::schema(ToolId::Safety, "advisory row is not a 5-element tuple")
                })?;
            let package = tuple[0].as_str().unwrap_or("<unknown package>");
            let installed = tuple[2].as_str().unwrap_or("?");
            let advisory = tuple[3].as_str().unwrap_or("").trim();
            let advisory_id = tuple[4].as_str().unwrap_or("?");
            findings.push(Finding {
                tool: ToolId::Safety,
                severity: FIXED_SEVERITY,
                title: format!("{package} {installed} [{advisory_id}]: {advisory}"),
                location: None,
                raw: row,
            });
        }
        Ok(findings)
    }
}
