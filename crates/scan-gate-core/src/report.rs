use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::gate::GateDecision;
use crate::scan::{ScanRun, ToolOutcome};
use crate::summary::{self, SeverityCounts};

/// Format styles supported by the reporter.
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Markdown,
    Json,
}

/// Produce the consolidated report for one run.
///
/// Regeneration is idempotent: the same run renders byte-identically
/// (the timestamp comes from the run itself, not the wall clock).
pub fn render_report(run: &ScanRun, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Markdown => {
            let document = assemble_sections(run)?;
            Ok(summary::apply_summary(&document, GateDecision::evaluate(run)))
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&JsonReport::from(run))?),
    }
}

/// Document header plus one section per outcome, in registry order.
fn assemble_sections(run: &ScanRun) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "# Security Scan Report")?;
    writeln!(out)?;
    writeln!(
        out,
        "Generated: {}",
        humantime::format_rfc3339_seconds(run.started_at)
    )?;

    for outcome in &run.outcomes {
        writeln!(out)?;
        writeln!(out, "## {}", outcome.tool.title())?;
        writeln!(out)?;
        render_section(&mut out, outcome)?;
    }
    Ok(out)
}

fn render_section(out: &mut String, outcome: &ToolOutcome) -> Result<()> {
    if !outcome.invoked {
        writeln!(out, "_`{}` is not installed; section skipped._", outcome.tool)?;
        return Ok(());
    }
    if let Some(error) = &outcome.tooling_error {
        // Must never look like a pass: a tool that ran but produced
        // uninterpretable output is surfaced as its own state.
        writeln!(out, "**Tooling error:** {error}")?;
        return Ok(());
    }
    if outcome.findings.is_empty() {
        writeln!(out, "No issues found.")?;
        return Ok(());
    }

    writeln!(out, "{} issue(s) found:", outcome.findings.len())?;
    writeln!(out)?;
    for finding in &outcome.findings {
        match &finding.location {
            Some(location) => writeln!(
                out,
                "- **[{}]** {} ({location})",
                finding.severity, finding.title
            )?,
            None => writeln!(out, "- **[{}]** {}", finding.severity, finding.title)?,
        }
    }
    Ok(())
}

/// Whole-file replace via a sibling temp file, so observers never see a
/// partial report. This is the one fatal error path of the pipeline.
pub async fn write_report(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create report directory {}", parent.display()))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = Path::new(&tmp);
    tokio::fs::write(tmp, contents)
        .await
        .with_context(|| format!("failed to write report to {}", tmp.display()))?;
    tokio::fs::rename(tmp, path)
        .await
        .with_context(|| format!("failed to move report into place at {}", path.display()))?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    gate: GateDecision,
    severity_counts: SeverityCounts,
    outcomes: &'a [ToolOutcome],
}

impl<'a> From<&'a ScanRun> for JsonReport<'a> {
    fn from(run: &'a ScanRun) -> Self {
        Self {
            generated_at: humantime::format_rfc3339_seconds(run.started_at).to_string(),
            gate: GateDecision::evaluate(run),
            severity_counts: SeverityCounts::from_run(run),
            outcomes: &run.outcomes,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::scan::{Finding, Location, Severity, ToolId};

    fn sample_run() -> ScanRun {
        ScanRun::new(
            SystemTime::UNIX_EPOCH,
            vec![
                ToolOutcome::with_findings(
                    ToolId::Bandit,
                    vec![Finding {
                        tool: ToolId::Bandit,
                        severity: Severity::Medium,
                        title: "Possible SQL injection".into(),
                        location: Some(Location::new("app/db.py", Some(10))),
                        raw: serde_json::Value::Null,
                    }],
                ),
                ToolOutcome::skipped(ToolId::Trivy),
                ToolOutcome::clean(ToolId::Gitleaks),
                ToolOutcome::failed(ToolId::Semgrep, "output is not valid JSON"),
            ],
        )
    }

    #[test]
    fn sections_reflect_all_outcome_states() {
        let report = render_report(&sample_run(), OutputFormat::Markdown).unwrap();
        assert!(report.contains("## Bandit (Python static analysis)"));
        assert!(report.contains("- **[MEDIUM]** Possible SQL injection (app/db.py:10)"));
        assert!(report.contains("_`trivy` is not installed; section skipped._"));
        assert!(report.contains("No issues found."));
        assert!(report.contains("**Tooling error:** output is not valid JSON"));
    }

    #[test]
    fn tooling_error_never_renders_as_a_pass() {
        let report = render_report(&sample_run(), OutputFormat::Markdown).unwrap();
        let semgrep_section = report
            .split("## Semgrep (SAST)")
            .nth(1)
            .expect("semgrep section present");
        assert!(!semgrep_section.contains("No issues found."));
    }

    #[test]
    fn rendering_is_idempotent() {
        let run = sample_run();
        let first = render_report(&run, OutputFormat::Markdown).unwrap();
        let second = render_report(&run, OutputFormat::Markdown).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn json_report_serializes_gate_and_counts() {
        let output = render_report(&sample_run(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["gate"], "fail");
        assert_eq!(value["severity_counts"]["medium"], 1);
        assert_eq!(value["outcomes"].as_array().unwrap().len(), 4);
        assert_eq!(value["generated_at"], "1970-01-01T00:00:00Z");
    }

    #[tokio::test]
    async fn report_write_is_atomic_replace() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("reports/security-report-1970-01-01.md");
        write_report(&path, "first").await.unwrap();
        write_report(&path, "second").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        assert!(!path.with_extension("md.tmp").exists());
    }
}
