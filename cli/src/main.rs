//! bosun - command-line driver for the diagnosis engine.
//!
//! The editor-facing pipeline runs document events through debounce and
//! publication; this binary drives the same engine through its direct
//! entry points instead: read a file, run the active tool backends over
//! it once, and print what came back.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use bosun_engine::{BosunConfig, NullSink, Orchestrator};
use bosun_plugins::{ShellcheckPlugin, ShfmtPlugin};
use bosun_types::{Diagnostic, DocumentId, DocumentSnapshot};

#[derive(Parser)]
#[command(name = "bosun", version)]
#[command(about = "Format and lint shell scripts through their native tools")]
struct Cli {
    /// Configuration file (default: ./.bosun.toml, then ~/.bosun/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Diagnose files and print their findings
    Check {
        /// Files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output format
        #[arg(long, default_value = "text")]
        output: OutputFormat,
    },

    /// Format files, printing the result or rewriting them in place
    Format {
        /// Files to format
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Rewrite files instead of printing to stdout
        #[arg(long)]
        write: bool,
    },

    /// Show configured tools and their availability
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();

    let cli = Cli::parse();
    let config =
        BosunConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Check { files, output } => check(&config, &files, output).await,
        Commands::Format { files, write } => format(&config, &files, write).await,
        Commands::Status => status(&config).await,
    }
}

async fn check(config: &BosunConfig, files: &[PathBuf], output: OutputFormat) -> Result<ExitCode> {
    let orchestrator = Orchestrator::start(config, Arc::new(NullSink)).await;
    warn_if_no_tools(&orchestrator).await;

    let mut failed = false;
    let mut results: Vec<(DocumentId, Vec<Diagnostic>)> = Vec::new();
    for path in files {
        let doc = read_document(path)?;
        let report = orchestrator.check_now(&doc).await;
        failed |= report.has_errors();
        results.push((doc.id().clone(), report.into_diagnostics()));
    }

    match output {
        OutputFormat::Text => {
            for (id, diagnostics) in &results {
                for diagnostic in diagnostics {
                    println!("{}", diagnostic.display_with_path(id.as_str()));
                }
            }
        }
        OutputFormat::Json => {
            let payload: Vec<_> = results
                .iter()
                .map(|(id, diagnostics)| {
                    json!({ "path": id.as_str(), "diagnostics": diagnostics })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
    }

    Ok(exit_code(failed))
}

async fn format(config: &BosunConfig, files: &[PathBuf], write: bool) -> Result<ExitCode> {
    let orchestrator = Orchestrator::start(config, Arc::new(NullSink)).await;
    warn_if_no_tools(&orchestrator).await;

    let mut failed = false;
    for path in files {
        let doc = read_document(path)?;
        let report = orchestrator.format_document(&doc).await;

        if report.is_blocked() {
            failed = true;
            for diagnostic in report.diagnostics() {
                eprintln!("{}", diagnostic.display_with_path(doc.id().as_str()));
            }
            continue;
        }

        match report.into_replacement() {
            Some(formatted) if write => {
                fs::write(path, formatted)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("formatted {}", path.display());
            }
            Some(formatted) => print!("{formatted}"),
            None if write => println!("unchanged {}", path.display()),
            // Filter semantics: an already-formatted file passes through.
            None => print!("{}", doc.text()),
        }
    }

    Ok(exit_code(failed))
}

async fn status(config: &BosunConfig) -> Result<ExitCode> {
    let orchestrator = Orchestrator::start(config, Arc::new(NullSink)).await;
    let stats = orchestrator.stats().await;

    println!("{} tools registered, {} active", stats.total, stats.active);
    for plugin in &stats.plugins {
        let state = if plugin.active { "active" } else { "inactive" };
        let extras = if plugin.can_format {
            "check, format"
        } else {
            "check"
        };
        println!(
            "  {:<12} {:<28} {:<9} {:<14} {}",
            plugin.name,
            plugin.display_name,
            state,
            extras,
            resolve_tool(config, &plugin.name),
        );
    }

    Ok(ExitCode::SUCCESS)
}

fn read_document(path: &Path) -> Result<DocumentSnapshot> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(DocumentSnapshot::new(DocumentId::from(path), text))
}

async fn warn_if_no_tools(orchestrator: &Orchestrator) {
    if orchestrator.stats().await.active == 0 {
        tracing::warn!("no tools available; install shfmt and shellcheck or check [shfmt]/[shellcheck] path settings");
    }
}

/// PATH resolution of the executable a backend is configured with.
fn resolve_tool(config: &BosunConfig, name: &str) -> String {
    let configured = match name {
        ShfmtPlugin::NAME => config.shfmt.path.as_str(),
        ShellcheckPlugin::NAME => config.shellcheck.path.as_str(),
        _ => return String::from("-"),
    };
    match which::which(configured) {
        Ok(resolved) => resolved.display().to_string(),
        Err(_) => format!("{configured} (not found)"),
    }
}

fn exit_code(failed: bool) -> ExitCode {
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
