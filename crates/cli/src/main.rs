//! Azure idle resource report CLI
//!
//! Scans every enabled subscription in a tenant for orphaned disks, unattached
//! public IPs and NICs, stopped-but-allocated VMs and (optionally) old
//! snapshots, attaches last-30-day cost and prints a text, JSON or CSV report.

mod commands;
mod config;
mod output;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::scan::{self, ScanRequest};

/// Azure idle resource report
#[derive(Parser, Debug)]
#[command(name = "azidle")]
#[command(
    author,
    version,
    about = "Azure idle report with AKS review bucket + cost (last 30d)",
    long_about = None
)]
pub struct Cli {
    /// Tenant ID (Directory ID). Prompted for if omitted
    #[arg(long, env = "AZURE_TENANT_ID")]
    pub tenant: Option<String>,

    /// Use device code auth for az login
    #[arg(long)]
    pub device_code: bool,

    /// Comma-separated subscription names or IDs to skip
    #[arg(long, value_delimiter = ',')]
    pub skip_subs: Vec<String>,

    /// Comma-separated subscription names or IDs to include (if set, only these are scanned)
    #[arg(long, value_delimiter = ',')]
    pub only_subs: Vec<String>,

    /// Include old snapshots as review-required
    #[arg(long)]
    pub include_snapshots: bool,

    /// Snapshot age threshold in days [default: 180]
    #[arg(long)]
    pub snapshot_days: Option<u32>,

    /// Disable Cost Management lookups (faster, no cost figures)
    #[arg(long)]
    pub no_cost: bool,

    /// Output format
    #[arg(long, short = 'o', value_enum, default_value = "text")]
    pub output_format: output::OutputFormat,

    /// Timeout for each az call in seconds [default: 120]
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Path to the az executable (searched on PATH if not specified)
    #[arg(long)]
    pub az_path: Option<PathBuf>,

    /// Path to a JSON config file (defaults to ~/.config/azidle/config.json)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match config::Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(err) => {
            output::print_error(&format!("{:#}", err));
            return ExitCode::FAILURE;
        }
    };

    init_tracing(cli.verbose, settings.log_json);

    let request = ScanRequest::resolve(&cli, settings);
    match scan::run(request).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::print_error(&format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so the report on stdout stays clean
fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
