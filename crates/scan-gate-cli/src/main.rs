use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use scan_gate_core::{
    adapters, render_report, run_pipeline, OutputFormat, Settings, SeverityCounts, ToolAdapter,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "scan-gate",
    author,
    version,
    about = "Security scan aggregation and release gate"
)]
struct Cli {
    /// TOML configuration file layered under SCAN_GATE_* env and flags
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run every scanner, write the consolidated report, gate on the result
    Scan {
        /// Directory to scan
        #[arg(long, value_name = "DIR")]
        target: Option<PathBuf>,
        /// Directory receiving the report and raw artifacts
        #[arg(long = "report-dir", value_name = "DIR")]
        report_dir: Option<PathBuf>,
        /// Container image for the image scan
        #[arg(long, value_name = "IMAGE")]
        image: Option<String>,
        /// Per-tool timeout, e.g. `90s` or `5m`
        #[arg(long, value_name = "DURATION")]
        timeout: Option<String>,
        /// Also print the JSON rendering of the run to stdout
        #[arg(long)]
        json: bool,
    },
    /// List the configured tools and whether their binaries are present
    Tools,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;
    match cli.command.unwrap_or(Commands::Scan {
        target: None,
        report_dir: None,
        image: None,
        timeout: None,
        json: false,
    }) {
        Commands::Scan {
            target,
            report_dir,
            image,
            timeout,
            json,
        } => {
            let settings = apply_overrides(settings, target, report_dir, image, timeout)?;
            scan(settings, json).await?;
        }
        Commands::Tools => tools(&settings),
    }
    Ok(())
}

async fn scan(settings: Settings, json: bool) -> Result<()> {
    let output = run_pipeline(settings).await?;

    if json {
        println!("{}", render_report(&output.run, OutputFormat::Json)?);
    }

    let counts = SeverityCounts::from_run(&output.run);
    println!(
        "{} finding(s): {} critical, {} high, {} medium, {} low, {} info, {} unknown",
        counts.total(),
        counts.critical,
        counts.high,
        counts.medium,
        counts.low,
        counts.info,
        counts.unknown
    );
    println!("Report: {}", output.report_path.display());

    let verdict = if output.decision.is_fail() {
        "FAIL".red().bold()
    } else {
        "PASS".green().bold()
    };
    println!("Gate: {verdict}");

    if output.decision.is_fail() {
        std::process::exit(output.decision.exit_code());
    }
    Ok(())
}

fn tools(settings: &Settings) {
    for adapter in adapters::default_adapters() {
        let command = adapter.command(settings);
        let status = if !adapter.enabled(settings) {
            "disabled".dimmed()
        } else if binary_on_path(&command.program) {
            "present".green()
        } else {
            "missing".yellow()
        };
        println!(
            "- {name:<14} [{program}] {status}",
            name = adapter.tool().name(),
            program = command.program,
            status = status
        );
    }
}

fn binary_on_path(program: &str) -> bool {
    if program.contains(std::path::MAIN_SEPARATOR) {
        return Path::new(program).is_file();
    }
    let Some(paths) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&paths).any(|dir| dir.join(program).is_file())
}

/// Keys accepted from the config file and `SCAN_GATE_*` environment.
#[derive(Debug, Default, serde::Deserialize)]
struct LayeredSettings {
    target: Option<PathBuf>,
    report_dir: Option<PathBuf>,
    image: Option<String>,
    timeout: Option<String>,
}

fn load_settings(config_path: Option<&Path>) -> Result<Settings> {
    let mut builder = config::Config::builder();
    if let Some(path) = config_path {
        builder = builder.add_source(config::File::from(path));
    }
    builder = builder.add_source(config::Environment::with_prefix("SCAN_GATE"));
    let layered: LayeredSettings = builder
        .build()
        .and_then(|loaded| loaded.try_deserialize())
        .context("failed to load configuration")?;

    let defaults = Settings::default();
    Ok(Settings {
        target: layered.target.unwrap_or(defaults.target),
        report_dir: layered.report_dir.unwrap_or(defaults.report_dir),
        image: layered.image,
        tool_timeout: match layered.timeout {
            Some(raw) => humantime::parse_duration(&raw)
                .with_context(|| format!("invalid timeout `{raw}`"))?,
            None => defaults.tool_timeout,
        },
    })
}

fn apply_overrides(
    settings: Settings,
    target: Option<PathBuf>,
    report_dir: Option<PathBuf>,
    image: Option<String>,
    timeout: Option<String>,
) -> Result<Settings> {
    Ok(Settings {
        target: target.unwrap_or(settings.target),
        report_dir: report_dir.unwrap_or(settings.report_dir),
        image: image.or(settings.image),
        tool_timeout: match timeout {
            Some(raw) => humantime::parse_duration(&raw)
                .with_context(|| format!("invalid timeout `{raw}`"))?,
            None => settings.tool_timeout,
        },
    })
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tokio=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
