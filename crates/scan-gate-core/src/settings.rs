use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};

/// Environment-driven configuration for a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory handed to the source-level scanners.
    pub target: PathBuf,
    /// Directory receiving the rendered report and raw artifacts.
    pub report_dir: PathBuf,
    /// Container image for the image scan; unset means that scan is skipped.
    pub image: Option<String>,
    /// Upper bound on any single tool invocation.
    pub tool_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target: PathBuf::from("."),
            report_dir: PathBuf::from("security-reports"),
            image: None,
            tool_timeout: Duration::from_secs(120),
        }
    }
}

impl Settings {
    const TARGET_ENV: &'static str = "SCAN_GATE_TARGET";
    const REPORT_DIR_ENV: &'static str = "SCAN_GATE_REPORT_DIR";
    const IMAGE_ENV: &'static str = "SCAN_GATE_IMAGE";
    const TIMEOUT_ENV: &'static str = "SCAN_GATE_TIMEOUT";

    /// Load settings from environment variables.
    ///
    /// * `SCAN_GATE_TARGET`     — directory to scan (default `.`).
    /// * `SCAN_GATE_REPORT_DIR` — report directory (default `security-reports`).
    /// * `SCAN_GATE_IMAGE`      — container image to scan (optional).
    /// * `SCAN_GATE_TIMEOUT`    — per-tool timeout, humantime form (default `120s`).
    pub fn from_env() -> Result<Self> {
        Self::from_map(std::env::vars().collect())
    }

    fn from_map(vars: HashMap<String, String>) -> Result<Self> {
        let defaults = Self::default();
        let target = vars
            .get(Self::TARGET_ENV)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.target);
        let report_dir = vars
            .get(Self::REPORT_DIR_ENV)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.report_dir);
        let image = vars
            .get(Self::IMAGE_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let tool_timeout = match vars.get(Self::TIMEOUT_ENV).map(|v| v.trim()) {
            Some(raw) if !raw.is_empty() => humantime::parse_duration(raw)
                .with_context(|| format!("invalid {} value `{raw}`", Self::TIMEOUT_ENV))?,
            _ => defaults.tool_timeout,
        };

        Ok(Self {
            target,
            report_dir,
            image,
            tool_timeout,
        })
    }

    /// Directory holding each tool's captured raw output.
    pub fn raw_dir(&self) -> PathBuf {
        self.report_dir.join("raw")
    }

    /// Date-stamped report path for a run started at the given instant.
    pub fn report_path(&self, started_at: SystemTime) -> PathBuf {
        let stamp = humantime::format_rfc3339_seconds(started_at).to_string();
        let date = stamp.get(..10).unwrap_or("unknown-date");
        self.report_dir.join(format!("security-report-{date}.md"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let settings = Settings::from_map(HashMap::new()).expect("should load settings");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.tool_timeout, Duration::from_secs(120));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let settings = Settings::from_map(vars(&[
            ("SCAN_GATE_TARGET", "  "),
            ("SCAN_GATE_IMAGE", ""),
        ]))
        .expect("blank values should not be errors");
        assert_eq!(settings.target, PathBuf::from("."));
        assert!(settings.image.is_none());
    }

    #[test]
    fn parses_timeout_and_image() {
        let settings = Settings::from_map(vars(&[
            ("SCAN_GATE_TIMEOUT", "45s"),
            ("SCAN_GATE_IMAGE", "registry.local/app:1.2"),
            ("SCAN_GATE_REPORT_DIR", "out/reports"),
        ]))
        .expect("should parse");
        assert_eq!(settings.tool_timeout, Duration::from_secs(45));
        assert_eq!(settings.image.as_deref(), Some("registry.local/app:1.2"));
        assert_eq!(settings.report_dir, PathBuf::from("out/reports"));
    }

    #[test]
    fn rejects_malformed_timeout() {
        let err = Settings::from_map(vars(&[("SCAN_GATE_TIMEOUT", "soon")]))
            .expect_err("bad duration should error");
        assert!(err.to_string().contains("SCAN_GATE_TIMEOUT"));
    }

    #[test]
    fn report_path_is_date_stamped() {
        let settings = Settings::default();
        let path = settings.report_path(SystemTime::UNIX_EPOCH);
        assert_eq!(
            path,
            PathBuf::from("security-reports/security-report-1970-01-01.md")
        );
    }

    #[test]
    fn raw_dir_sits_beside_reports() {
        let settings = Settings::from_map(vars(&[("SCAN_GATE_REPORT_DIR", "sr")])).unwrap();
        assert_eq!(settings.raw_dir(), PathBuf::from("sr/raw"));
    }
}
