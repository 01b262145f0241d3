use std::fmt;

use serde::{Deserialize, Serialize};

use crate::scan::ScanRun;

/// Terminal pass/fail decision controlling the process exit code.
///
/// The gate is severity-blind by contract: any finding from any invoked
/// tool fails it, a run of only Low findings included. Skips and tooling
/// errors never fail the gate on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateDecision {
    Pass,
    Fail,
}

impl GateDecision {
    pub fn evaluate(run: &ScanRun) -> Self {
        if run.any_issue {
            Self::Fail
        } else {
            Self::Pass
        }
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail)
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Pass => 0,
            Self::Fail => 1,
        }
    }
}

impl fmt::Display for GateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => f.write_str("PASS"),
            Self::Fail => f.write_str("FAIL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use proptest::prelude::*;

    use super::*;
    use crate::scan::{Finding, Severity, ToolId, ToolOutcome};

    fn finding(severity: Severity) -> Finding {
        Finding {
            tool: ToolId::Bandit,
            severity,
            title: "x".into(),
            location: None,
            raw: serde_json::Value::Null,
        }
    }

    #[test]
    fn clean_run_passes_with_exit_zero() {
        let run = ScanRun::new(
            SystemTime::UNIX_EPOCH,
            vec![
                ToolOutcome::clean(ToolId::Bandit),
                ToolOutcome::skipped(ToolId::Trivy),
            ],
        );
        let decision = GateDecision::evaluate(&run);
        assert_eq!(decision, GateDecision::Pass);
        assert_eq!(decision.exit_code(), 0);
    }

    #[test]
    fn low_only_run_still_fails() {
        let run = ScanRun::new(
            SystemTime::UNIX_EPOCH,
            vec![ToolOutcome::with_findings(
                ToolId::Bandit,
                vec![finding(Severity::Low)],
            )],
        );
        let decision = GateDecision::evaluate(&run);
        assert!(decision.is_fail());
        assert_eq!(decision.exit_code(), 1);
    }

    #[test]
    fn tooling_errors_alone_do_not_fail_the_gate() {
        let run = ScanRun::new(
            SystemTime::UNIX_EPOCH,
            vec![ToolOutcome::failed(ToolId::Semgrep, "unparseable")],
        );
        assert_eq!(GateDecision::evaluate(&run), GateDecision::Pass);
    }

    // 0 = skipped, 1 = clean, 2 = tooling error, 3.. = that many findings
    fn outcome_from_code(tool: ToolId, code: usize) -> ToolOutcome {
        match code {
            0 => ToolOutcome::skipped(tool),
            1 => ToolOutcome::clean(tool),
            2 => ToolOutcome::failed(tool, "unparseable"),
            n => ToolOutcome::with_findings(
                tool,
                (0..n - 2).map(|_| finding(Severity::Low)).collect(),
            ),
        }
    }

    proptest! {
        #[test]
        fn gate_fails_iff_some_outcome_has_findings(
            codes in proptest::collection::vec(0usize..6, 1..8)
        ) {
            let outcomes: Vec<ToolOutcome> = codes
                .iter()
                .enumerate()
                .map(|(i, &code)| outcome_from_code(ToolId::ALL[i], code))
                .collect();
            let expected_fail = codes.iter().any(|&code| code >= 3);
            let run = ScanRun::new(SystemTime::UNIX_EPOCH, outcomes);
            prop_assert_eq!(GateDecision::evaluate(&run).is_fail(), expected_fail);
        }
    }
}
