//! The scan command: log in, pick subscriptions, scan them and print a report

use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use idle_lib::session::{self, SubscriptionFilter};
use idle_lib::{AzCli, ScanLogger, ScanOptions, Scanner};

use crate::config::Settings;
use crate::output::{print_info, print_report, print_warning, OutputFormat};
use crate::Cli;

/// Fully resolved inputs for one run
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRequest {
    pub tenant: Option<String>,
    pub device_code: bool,
    pub filter: SubscriptionFilter,
    pub options: ScanOptions,
    pub format: OutputFormat,
    pub timeout: Duration,
    pub az_path: Option<PathBuf>,
}

impl ScanRequest {
    /// Apply command-line flags on top of loaded settings
    pub fn resolve(cli: &Cli, settings: Settings) -> Self {
        let only = if cli.only_subs.is_empty() {
            settings.only_subs
        } else {
            cli.only_subs.clone()
        };
        let skip = if cli.skip_subs.is_empty() {
            settings.skip_subs
        } else {
            cli.skip_subs.clone()
        };

        Self {
            tenant: cli.tenant.clone().or(settings.tenant),
            device_code: cli.device_code,
            filter: SubscriptionFilter::new(only, skip),
            options: ScanOptions {
                include_snapshots: cli.include_snapshots,
                snapshot_days: cli.snapshot_days.unwrap_or(settings.snapshot_days),
                cost_enabled: !cli.no_cost,
            },
            format: cli.output_format,
            timeout: Duration::from_secs(cli.timeout.unwrap_or(settings.timeout_secs)),
            az_path: cli.az_path.clone().or(settings.az_path),
        }
    }
}

/// Run a scan and print the report
pub async fn run(request: ScanRequest) -> Result<()> {
    let transport = AzCli::locate(request.az_path.as_deref())?.with_timeout(request.timeout);

    let tenant = match request.tenant.as_deref().map(str::trim) {
        Some(tenant) if !tenant.is_empty() => tenant.to_string(),
        _ => prompt_tenant()?,
    };

    print_info(&format!("Logging in to tenant: {}", tenant));
    session::login(&transport, &tenant, request.device_code)
        .await
        .context("Azure login failed")?;

    let subscriptions = session::list_enabled_subscriptions(&transport).await?;
    let in_tenant = subscriptions.len();
    let selected = request.filter.apply(subscriptions);
    info!(in_tenant, selected = selected.len(), "Subscriptions resolved");
    if selected.is_empty() {
        print_warning("No subscriptions left after applying --only-subs/--skip-subs");
    }

    let scanner = Scanner::new(&transport, request.options, ScanLogger::new(tenant.as_str()));
    let run = scanner.run(&tenant, in_tenant, &selected, Utc::now()).await?;

    let rendered = idle_lib::render(&run, request.format.into())?;
    print_report(&rendered);
    Ok(())
}

/// Ask for the tenant id interactively
fn prompt_tenant() -> Result<String> {
    let answer = inquire::Text::new("Azure Tenant ID (Directory ID):")
        .prompt()
        .context("Tenant ID is required.")?;

    let tenant = answer.trim();
    if tenant.is_empty() {
        bail!("Tenant ID is required.");
    }
    Ok(tenant.to_string())
}
