use serde::Deserialize;
use serde_json::Value;

use crate::scan::{Finding, Location, ParseError, Severity, ToolAdapter, ToolCommand, ToolId};
use crate::settings::Settings;

/// Container image scan via `trivy image --format json <image>`.
///
/// Only runs when an image is configured; without one the outcome is a
/// skip, same as an absent binary.
pub struct TrivyAdapter;

#[derive(Deserialize)]
struct TrivyOutput {
    #[serde(rename = "Results", default)]
    results: Vec<TrivyResult>,
}

#[derive(Deserialize)]
struct TrivyResult {
    #[serde(rename = "Target", default)]
    target: String,
    #[serde(rename = "Vulnerabilities", default)]
    vulnerabilities: Vec<Value>,
}

#[derive(Deserialize)]
struct TrivyVulnerability {
    #[serde(rename = "VulnerabilityID")]
    vulnerability_id: String,
    #[serde(rename = "Severity")]
    severity: String,
    #[serde(rename = "PkgName")]
    pkg_name: String,
    #[serde(rename = "InstalledVersion", default)]
    installed_version: String,
    #[serde(rename = "Title", default)]
    title: String,
}

fn map_severity(raw: &str) -> Severity {
    match raw.to_ascii_uppercase().as_str() {
        "CRITICAL" => Severity::Critical,
        "HIGH" => Severity::High,
        "MEDIUM" => Severity::Medium,
        "LOW" => Severity::Low,
        _ => Severity::Unknown,
    }
}

#[async_trait::async_trait]
impl ToolAdapter for TrivyAdapter {
    fn tool(&self) -> ToolId {
        ToolId::Trivy
    }

    fn enabled(&self, settings: &Settings) -> bool {
        settings.image.is_some()
    }

    fn command(&self, settings: &Settings) -> ToolCommand {
        let image = settings.image.clone().unwrap_or_default();
        ToolCommand::new("trivy", &["image", "--quiet", "--format", "json", &image])
    }

    fn parse(&self, raw: &str) -> Result<Vec<Finding>, ParseError> {
        let output: TrivyOutput = serde_json::from_str(raw)?;
        let mut findings = Vec::new();
        for result in output.results {
            for value in result.vulnerabilities {
                let vuln: TrivyVulnerability = serde_json::from_value(value.clone())?;
                let mut title =
                    format!("{} {}: {}", vuln.pkg_name, vuln.installed_version, vuln.vulnerability_id);
                if !vuln.title.is_empty() {
                    title.push_str(&format!(" ({})", vuln.title));
                }
                findings.push(Finding {
                    tool: ToolId::Trivy,
                    severity: map_severity(&vuln.severity),
                    title,
                    location: (!result.target.is_empty())
                        .then(|| Location::new(result.target.clone(), None)),
                    raw: value,
                });
            }
        }
        Ok(findings)
    }
}
