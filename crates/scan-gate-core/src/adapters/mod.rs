//! One adapter per external tool. Each module owns the tool's JSON schema
//! and its severity-mapping policy; execution is shared via
//! [`crate::scan::invoke`].

use std::sync::Arc;

use crate::scan::ToolAdapter;

pub mod bandit;
pub mod gitleaks;
pub mod npm_audit;
pub mod outdated;
pub mod safety;
pub mod semgrep;
pub mod trivy;

pub use bandit::BanditAdapter;
pub use gitleaks::GitleaksAdapter;
pub use npm_audit::NpmAuditAdapter;
pub use outdated::{NpmOutdatedAdapter, PipOutdatedAdapter};
pub use safety::SafetyAdapter;
pub use semgrep::SemgrepAdapter;
pub use trivy::TrivyAdapter;

/// The built-in registry, in fixed report order.
pub fn default_adapters() -> Vec<Arc<dyn ToolAdapter>> {
    vec![
        Arc::new(BanditAdapter),
        Arc::new(SafetyAdapter),
        Arc::new(NpmAuditAdapter),
        Arc::new(TrivyAdapter),
        Arc::new(GitleaksAdapter),
        Arc::new(SemgrepAdapter),
        Arc::new(PipOutdatedAdapter),
        Arc::new(NpmOutdatedAdapter),
    ]
}
