//! Report aggregation and rendering
//!
//! Rendering is a pure transformation of a [`ScanRun`] into text. The three
//! views are mutually exclusive and picked once per run.

mod csv;
mod json;
mod money;
mod text;

pub use self::csv::{render_csv, CSV_COLUMNS};
pub use self::json::{render_json, CostSummary, JsonReport};
pub use self::money::{currency_symbol, format_money, round2};
pub use self::text::{render_text, SNAPSHOT_DISPLAY_LIMIT};

use crate::error::Result;
use crate::models::{Bucket, BucketCosts, Finding, ResourceType};
use crate::scan::ScanRun;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Output view for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// Human-readable sections (default)
    #[default]
    Text,
    /// Machine-readable JSON document
    Json,
    /// One CSV row per finding
    Csv,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            "csv" => Ok(ReportFormat::Csv),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReportFormat::Text => "text",
            ReportFormat::Json => "json",
            ReportFormat::Csv => "csv",
        })
    }
}

/// Render a run in the requested view
pub fn render(run: &ScanRun, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(render_text(run)),
        ReportFormat::Json => render_json(run),
        ReportFormat::Csv => render_csv(run.findings()),
    }
}

/// Bucket costs for one currency
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyTotals {
    /// `None` when the cost API returned no currency column
    pub currency: Option<String>,
    pub costs: BucketCosts,
}

/// Aggregates derived from a finding sequence
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunTotals {
    counts: BTreeMap<(ResourceType, Bucket), usize>,
    currencies: Vec<CurrencyTotals>,
}

impl RunTotals {
    pub fn from_findings<'f>(findings: impl IntoIterator<Item = &'f Finding>) -> Self {
        let mut totals = Self::default();
        for finding in findings {
            *totals
                .counts
                .entry((finding.resource_type, finding.bucket))
                .or_default() += 1;

            if finding.cost_last30d.is_none() && finding.currency.is_none() {
                continue;
            }
            let entry = totals.currency_entry(finding.currency.as_deref());
            if let Some(cost) = finding.cost_last30d {
                entry.costs.add(finding.bucket, cost);
            }
        }
        totals
    }

    fn currency_entry(&mut self, currency: Option<&str>) -> &mut CurrencyTotals {
        let position = self
            .currencies
            .iter()
            .position(|t| t.currency.as_deref() == currency);
        let index = match position {
            Some(index) => index,
            None => {
                self.currencies.push(CurrencyTotals {
                    currency: currency.map(str::to_string),
                    costs: BucketCosts::default(),
                });
                self.currencies.len() - 1
            }
        };
        &mut self.currencies[index]
    }

    /// Number of findings of a kind in a bucket
    pub fn count(&self, resource_type: ResourceType, bucket: Bucket) -> usize {
        self.counts
            .get(&(resource_type, bucket))
            .copied()
            .unwrap_or_default()
    }

    /// Cost totals per currency in first-seen order
    pub fn currencies(&self) -> &[CurrencyTotals] {
        &self.currencies
    }

    /// First currency observed in the run
    pub fn primary_currency(&self) -> Option<&CurrencyTotals> {
        self.currencies.iter().find(|t| t.currency.is_some())
    }

    pub fn summary(&self) -> SummaryCounts {
        SummaryCounts {
            immediate_disks: self.count(ResourceType::Disk, Bucket::Immediate),
            immediate_pips: self.count(ResourceType::PublicIp, Bucket::Immediate),
            immediate_vms: self.count(ResourceType::Vm, Bucket::Immediate),
            immediate_nics: self.count(ResourceType::Nic, Bucket::Immediate),
            aks_review_disks: self.count(ResourceType::Disk, Bucket::AksReview),
            aks_review_nics: self.count(ResourceType::Nic, Bucket::AksReview),
            snapshots_old: self.count(ResourceType::Snapshot, Bucket::SnapshotReview),
        }
    }
}

/// Per-kind counts published in the JSON summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryCounts {
    pub immediate_disks: usize,
    pub immediate_pips: usize,
    pub immediate_vms: usize,
    pub immediate_nics: usize,
    pub aks_review_disks: usize,
    pub aks_review_nics: usize,
    pub snapshots_old: usize,
}
