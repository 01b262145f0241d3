//! Outdated-dependency listings for both ecosystems. These are
//! informational (fixed Info severity) but still findings: the gate is
//! severity-blind, so a stale dependency blocks the release like anything
//! else the scanners surface.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::scan::{Finding, ParseError, Severity, ToolAdapter, ToolCommand, ToolId};
use crate::settings::Settings;

const FIXED_SEVERITY: Severity = Severity::Info;

/// `pip list --outdated --format json`: a list of package records.
pub struct PipOutdatedAdapter;

#[derive(Deserialize)]
struct PipOutdatedPackage {
    name: String,
    version: String,
    latest_version: String,
}

#[async_trait::async_trait]
impl ToolAdapter for PipOutdatedAdapter {
    fn tool(&self) -> ToolId {
        ToolId::PipOutdated
    }

    fn command(&self, _settings: &Settings) -> ToolCommand {
        ToolCommand::new("pip", &["list", "--outdated", "--format", "json"])
    }

    fn parse(&self, raw: &str) -> Result<Vec<Finding>, ParseError> {
        let rows: Vec<Value> = serde_json::from_str(raw)?;
        let mut findings = Vec::with_capacity(rows.len());
        for value in rows {
            let package: PipOutdatedPackage = serde_json::from_value(value.clone())?;
            findings.push(Finding {
                tool: ToolId::PipOutdated,
                severity: FIXED_SEVERITY,
                title: format!(
                    "{} {} -> {}",
                    package.name, package.version, package.latest_version
                ),
                location: None,
                raw: value,
            });
        }
        Ok(findings)
    }
}

/// `npm outdated --json`: a map of package name to version info. npm exits
/// non-zero whenever the map is non-empty; that is data, not an error.
pub struct NpmOutdatedAdapter;

#[derive(Deserialize)]
struct NpmOutdatedEntry {
    #[serde(default)]
    current: Option<String>,
    latest: String,
}

#[async_trait::async_trait]
impl ToolAdapter for NpmOutdatedAdapter {
    fn tool(&self) -> ToolId {
        ToolId::NpmOutdated
    }

    fn command(&self, _settings: &Settings) -> ToolCommand {
        ToolCommand::new("npm", &["outdated", "--json"])
    }

    fn parse(&self, raw: &str) -> Result<Vec<Finding>, ParseError> {
        // npm prints nothing at all when every dependency is current.
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        let rows: BTreeMap<String, Value> = serde_json::from_str(raw)?;
        let mut findings = Vec::with_capacity(rows.len());
        for (name, value) in rows {
            let entry: NpmOutdatedEntry = serde_json::from_value(value.clone())?;
            findings.push(Finding {
                tool: ToolId::NpmOutdated,
                severity: FIXED_SEVERITY,
                title: format!(
                    "{} {} -> {}",
                    name,
                    entry.current.as_deref().unwrap_or("missing"),
                    entry.latest
                ),
                location: None,
                raw: value,
            });
        }
        Ok(findings)
    }
}
