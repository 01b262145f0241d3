//! Aggregate severity counts for a run.
//!
//! Two aligned signals exist on purpose. [`SeverityCounts`] folds over the
//! typed findings and is the source of truth (it feeds the JSON report).
//! [`token_counts`] re-scans the rendered document for literal bracket
//! markers and drives the markdown summary block, matching the legacy
//! report format this pipeline replaced. The token scan only knows the
//! four gating-era markers, so Info/Unknown bullets are visible in the
//! body but absent from the block.

use std::fmt::Write as _;

use serde::Serialize;

use crate::gate::GateDecision;
use crate::scan::{ScanRun, Severity};

/// Typed per-severity totals folded from `Finding.severity`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
    pub unknown: usize,
}

impl SeverityCounts {
    pub fn from_run(run: &ScanRun) -> Self {
        let mut counts = Self::default();
        for finding in run.findings() {
            match finding.severity {
                Severity::Critical => counts.critical += 1,
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
                Severity::Info => counts.info += 1,
                Severity::Unknown => counts.unknown += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low + self.info + self.unknown
    }
}

/// Literal bracket-marker totals re-scanned from rendered text.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Count `[CRITICAL]`/`[HIGH]`/`[MEDIUM]`/`[LOW]` markers in a rendered
/// document.
pub fn token_counts(document: &str) -> TokenCounts {
    TokenCounts {
        critical: document.matches("[CRITICAL]").count(),
        high: document.matches("[HIGH]").count(),
        medium: document.matches("[MEDIUM]").count(),
        low: document.matches("[LOW]").count(),
    }
}

/// Insert the summary block (marker counts plus the overall gate line) at
/// the top of an assembled document, ahead of the first tool section.
pub fn apply_summary(document: &str, decision: GateDecision) -> String {
    let counts = token_counts(document);
    let mut block = String::new();
    let _ = writeln!(block, "## Summary");
    let _ = writeln!(block);
    let _ = writeln!(block, "- CRITICAL: {}", counts.critical);
    let _ = writeln!(block, "- HIGH: {}", counts.high);
    let _ = writeln!(block, "- MEDIUM: {}", counts.medium);
    let _ = writeln!(block, "- LOW: {}", counts.low);
    let _ = writeln!(block);
    let _ = writeln!(block, "**Overall: {decision}**");

    match document.find("\n## ") {
        Some(pos) => {
            let (header, sections) = document.split_at(pos);
            format!("{header}\n{block}{sections}")
        }
        None => format!("{document}\n{block}"),
    }
}
