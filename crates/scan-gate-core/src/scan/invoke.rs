use std::io;
use std::process::Stdio;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::{ToolAdapter, ToolOutcome};
use crate::settings::Settings;

/// Execute one adapter end to end: spawn the tool, bound it with the
/// configured timeout, persist the captured output, and interpret it.
///
/// Nothing in here is fatal to the pipeline. A missing binary becomes a
/// skip, everything else that goes wrong becomes a tooling error on the
/// outcome.
pub async fn run_adapter<A>(adapter: &A, settings: &Settings) -> ToolOutcome
where
    A: ToolAdapter + ?Sized,
{
    let tool = adapter.tool();
    if !adapter.enabled(settings) {
        debug!(%tool, "adapter disabled by configuration, skipping");
        return ToolOutcome::skipped(tool);
    }

    let invocation = adapter.command(settings);
    debug!(%tool, program = %invocation.program, "invoking tool");

    let mut command = Command::new(&invocation.program);
    command
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match timeout(settings.tool_timeout, command.output()).await {
        Err(_) => {
            return ToolOutcome::failed(
                tool,
                format!(
                    "tool unresponsive, killed after {}",
                    humantime::format_duration(settings.tool_timeout)
                ),
            );
        }
        Ok(Err(err)) if err.kind() == io::ErrorKind::NotFound => {
            warn!(%tool, program = %invocation.program, "tool not installed, skipping");
            return ToolOutcome::skipped(tool);
        }
        Ok(Err(err)) => {
            return ToolOutcome::failed(tool, format!("failed to spawn `{}`: {err}", invocation.program));
        }
        Ok(Ok(output)) => output,
    };

    // Scanners legitimately exit non-zero when findings exist, so the exit
    // status is recorded but never treated as a failure by itself.
    let raw = String::from_utf8_lossy(&output.stdout).into_owned();
    debug!(%tool, exit = ?output.status.code(), bytes = raw.len(), "tool finished");

    write_artifact(settings, adapter, &raw).await;

    match adapter.parse(&raw) {
        Ok(findings) if findings.is_empty() => ToolOutcome::clean(tool),
        Ok(findings) => ToolOutcome::with_findings(tool, findings),
        Err(err) => ToolOutcome::failed(tool, err.to_string()),
    }
}

/// Persist the captured stdout for later inspection. Deterministic path,
/// overwritten each run. Artifact trouble must not take the run down, so
/// failures are only logged.
async fn write_artifact<A>(settings: &Settings, adapter: &A, raw: &str)
where
    A: ToolAdapter + ?Sized,
{
    let dir = settings.raw_dir();
    if let Err(err) = tokio::fs::create_dir_all(&dir).await {
        warn!(tool = %adapter.tool(), error = %err, "could not create artifact directory");
        return;
    }
    let path = dir.join(adapter.tool().artifact_file());
    if let Err(err) = tokio::fs::write(&path, raw).await {
        warn!(tool = %adapter.tool(), path = %path.display(), error = %err, "could not write artifact");
    }
}
