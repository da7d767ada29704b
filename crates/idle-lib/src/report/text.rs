//! Human-readable report view

use super::money::format_money;
use super::RunTotals;
use crate::models::{Bucket, Finding, ResourceType};
use crate::scan::{CostStatus, ScanRun, SubscriptionScan};
use colored::Colorize;
use std::fmt::Write;
use tabled::{settings::Style, Table, Tabled};

/// Oldest snapshots shown per subscription; structured views are never cut
pub const SNAPSHOT_DISPLAY_LIMIT: usize = 20;

/// Currency assumed for display when the cost API reported none
const FALLBACK_CURRENCY: &str = "GBP";

/// Row for the totals table
#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Finding")]
    label: String,
    #[tabled(rename = "Count")]
    count: usize,
}

/// Render the run as console text
pub fn render_text(run: &ScanRun) -> String {
    let mut out = String::new();

    let _ = writeln!(out);
    let _ = writeln!(out, "Report generated: {}", run.generated_at.to_rfc3339());
    let _ = writeln!(out, "Subscriptions in tenant: {}", run.subscriptions_in_tenant);

    for scan in &run.scans {
        render_subscription(&mut out, run, scan);
    }

    render_totals(&mut out, run, &run.totals());
    out
}

fn render_subscription(out: &mut String, run: &ScanRun, scan: &SubscriptionScan) {
    let sub = &scan.subscription;
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{}",
        format!("=== {} ({}) ===", sub.display_name(), sub.id).bold()
    );

    if let CostStatus::Unavailable(reason) = &scan.cost_status {
        let _ = writeln!(
            out,
            "{}",
            format!("(Cost data unavailable for this subscription: {reason})").yellow()
        );
    }

    let immediate: Vec<&Finding> = scan
        .findings
        .iter()
        .filter(|f| f.bucket == Bucket::Immediate)
        .collect();
    let review: Vec<&Finding> = scan
        .findings
        .iter()
        .filter(|f| f.bucket == Bucket::AksReview)
        .collect();

    if immediate.is_empty() {
        let _ = writeln!(out, "Immediate savings: none");
    } else {
        let _ = writeln!(out, "{}", "Immediate savings (safe-ish infra cleanup):".green());
        for f in immediate {
            let _ = writeln!(out, "  - {}", finding_line(f));
        }
    }

    let _ = writeln!(out);
    if review.is_empty() {
        let _ = writeln!(out, "AKS review required: none");
    } else {
        let _ = writeln!(
            out,
            "{}",
            "AKS review required (cluster-linked storage/network):".yellow()
        );
        for f in review {
            let _ = writeln!(out, "  - {}", finding_line(f));
        }
    }

    if run.options.include_snapshots {
        render_snapshots(out, scan, run.options.snapshot_days);
    }

    if run.options.cost_enabled {
        if let Some(currency) = scan.currency.as_deref() {
            let costs = &scan.costs;
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "Estimated savings (Immediate, last30d): {}",
                format_money(costs.immediate, currency)
            );
            let _ = writeln!(
                out,
                "Estimated savings (AKS review, last30d): {}",
                format_money(costs.review, currency)
            );
            let _ = writeln!(
                out,
                "Estimated savings (Total, last30d): {}",
                format_money(costs.total(), currency)
            );
        }
    }
}

fn render_snapshots(out: &mut String, scan: &SubscriptionScan, days: u32) {
    let mut snapshots: Vec<&Finding> = scan
        .findings
        .iter()
        .filter(|f| f.bucket == Bucket::SnapshotReview)
        .collect();

    let _ = writeln!(out);
    if snapshots.is_empty() {
        let _ = writeln!(out, "Review required: no snapshots older than {days} days");
        return;
    }

    // stable sort keeps discovery order among equal ages
    snapshots.sort_by(|a, b| b.age_days.unwrap_or(0).cmp(&a.age_days.unwrap_or(0)));

    let _ = writeln!(
        out,
        "{}",
        format!("Review required (retention/policy): snapshots older than {days} days:").yellow()
    );
    for f in snapshots.iter().take(SNAPSHOT_DISPLAY_LIMIT) {
        let _ = writeln!(out, "  - {}", finding_line(f));
    }
    if snapshots.len() > SNAPSHOT_DISPLAY_LIMIT {
        let _ = writeln!(
            out,
            "  - ... ({} more)",
            snapshots.len() - SNAPSHOT_DISPLAY_LIMIT
        );
    }
}

/// One console line for a finding
fn finding_line(f: &Finding) -> String {
    let mut line = match f.resource_type {
        ResourceType::Disk => format!(
            "Orphan disk: name={}, resourceGroup={}, location={}, sizeGb={}, sku={}",
            f.name,
            f.resource_group,
            f.location,
            display(&f.size_gb),
            display(&f.sku)
        ),
        ResourceType::PublicIp => format!(
            "Unattached Public IP: name={}, resourceGroup={}, location={}, sku={}, ip={}",
            f.name,
            f.resource_group,
            f.location,
            display(&f.sku),
            display(&f.ip)
        ),
        ResourceType::Nic => format!(
            "Unattached NIC: name={}, resourceGroup={}, location={}",
            f.name, f.resource_group, f.location
        ),
        ResourceType::Vm => format!(
            "VM not deallocated: name={}, resourceGroup={}, location={}, powerState={}",
            f.name,
            f.resource_group,
            f.location,
            display(&f.power_state)
        ),
        ResourceType::Snapshot => format!(
            "Snapshot: name={}, rg={}, loc={}, sizeGb={}, ageDays={}",
            f.name,
            f.resource_group,
            f.location,
            display(&f.size_gb),
            display(&f.age_days)
        ),
    };

    if let Some(cost) = f.cost_last30d {
        let currency = f.currency.as_deref().unwrap_or(FALLBACK_CURRENCY);
        let money = format_money(cost, currency);
        let _ = write!(line, " last30d~{money} est~{money}/mo");
    }

    if f.resource_type == ResourceType::Nic && f.bucket == Bucket::Immediate {
        line.push_str(" (housekeeping)");
    }
    line
}

fn display<T: ToString>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "None".to_string())
}

fn render_totals(out: &mut String, run: &ScanRun, totals: &RunTotals) {
    let summary = totals.summary();
    let mut rows = vec![
        CountRow {
            label: "Orphaned managed disks (Immediate)".to_string(),
            count: summary.immediate_disks,
        },
        CountRow {
            label: "Unattached public IPs (Immediate)".to_string(),
            count: summary.immediate_pips,
        },
        CountRow {
            label: "Stopped VMs not deallocated (Immediate)".to_string(),
            count: summary.immediate_vms,
        },
        CountRow {
            label: "Unattached NICs (Immediate housekeeping)".to_string(),
            count: summary.immediate_nics,
        },
        CountRow {
            label: "AKS review disks".to_string(),
            count: summary.aks_review_disks,
        },
        CountRow {
            label: "AKS review NICs".to_string(),
            count: summary.aks_review_nics,
        },
    ];
    if run.options.include_snapshots {
        rows.push(CountRow {
            label: format!("Old snapshots (>= {}d)", run.options.snapshot_days),
            count: summary.snapshots_old,
        });
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", "=".repeat(50));
    let _ = writeln!(
        out,
        "{}",
        "TOTAL COUNTS (all scanned subscriptions):".bold()
    );
    let table = Table::new(rows).with(Style::rounded()).to_string();
    let _ = writeln!(out, "{}", table);

    if run.options.cost_enabled && totals.primary_currency().is_some() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", "TOTAL ESTIMATED SAVINGS (last30d):".bold());
        for entry in totals.currencies() {
            let currency = entry.currency.as_deref().unwrap_or(FALLBACK_CURRENCY);
            let costs = &entry.costs;
            let _ = writeln!(out, "  Immediate: {}", format_money(costs.immediate, currency));
            let _ = writeln!(out, "  AKS review: {}", format_money(costs.review, currency));
            let _ = writeln!(
                out,
                "  Overall: {}",
                format_money(costs.total(), currency).green().bold()
            );
        }
    }

    let _ = writeln!(out, "{}", "=".repeat(50));
}
