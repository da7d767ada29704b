//! JSON report view

use super::money::round2;
use super::{RunTotals, SummaryCounts};
use crate::error::{Result, ScanError};
use crate::models::Finding;
use crate::scan::ScanRun;
use serde::{Deserialize, Serialize};

/// Top-level JSON document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonReport {
    pub generated_at: String,
    pub tenant_id: String,
    pub summary: SummaryCounts,
    pub findings: Vec<Finding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_summary: Option<CostSummary>,
}

/// Grand cost totals for the primary currency
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostSummary {
    pub currency: String,
    pub immediate_last30d: f64,
    pub aks_review_last30d: f64,
    pub total_last30d: f64,
    /// Totals for further currencies when subscriptions bill differently
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_currencies: Vec<CostSummary>,
}

impl CostSummary {
    fn from_totals(totals: &RunTotals) -> Option<Self> {
        let mut priced = totals.currencies().iter().filter_map(|t| {
            t.currency.as_ref().map(|currency| CostSummary {
                currency: currency.clone(),
                immediate_last30d: round2(t.costs.immediate),
                aks_review_last30d: round2(t.costs.review),
                total_last30d: round2(t.costs.total()),
                additional_currencies: Vec::new(),
            })
        });

        let mut primary = priced.next()?;
        primary.additional_currencies = priced.collect();
        Some(primary)
    }
}

impl JsonReport {
    pub fn from_run(run: &ScanRun) -> Self {
        let totals = run.totals();
        let cost_summary = if run.options.cost_enabled {
            CostSummary::from_totals(&totals)
        } else {
            None
        };

        Self {
            generated_at: run.generated_at.to_rfc3339(),
            tenant_id: run.tenant_id.clone(),
            summary: totals.summary(),
            findings: run.findings().cloned().collect(),
            cost_summary,
        }
    }
}

/// Render the run as pretty-printed JSON
pub fn render_json(run: &ScanRun) -> Result<String> {
    serde_json::to_string_pretty(&JsonReport::from_run(run))
        .map_err(|err| ScanError::Export(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bucket, ResourceType};
    use crate::report::fixtures::{finding, run};
    use crate::scan::ScanOptions;
    use serde_json::Value;

    #[test]
    fn test_json_document_shape() {
        let run = run(
            vec![
                finding(ResourceType::Disk, Bucket::AksReview, "pvc-1234", Some(12.5), Some("GBP")),
                finding(ResourceType::PublicIp, Bucket::Immediate, "ip-1", Some(3.333), Some("GBP")),
            ],
            ScanOptions::default(),
        );

        let value: Value = serde_json::from_str(&render_json(&run).unwrap()).unwrap();

        assert_eq!(value["tenantId"], "tenant-1");
        assert!(value["generatedAt"].as_str().unwrap().starts_with("2024-06-01T12:00:00"));
        assert_eq!(value["summary"]["aks_review_disks"], 1);
        assert_eq!(value["summary"]["immediate_pips"], 1);
        assert_eq!(value["findings"].as_array().unwrap().len(), 2);
        assert_eq!(value["findings"][0]["bucket"], "aksReview");
        assert_eq!(value["findings"][0]["resourceType"], "disk");
        assert_eq!(value["findings"][0]["costLast30d"], 12.5);
        assert!(value["findings"][0].get("ip").is_none());

        let cost = &value["costSummary"];
        assert_eq!(cost["currency"], "GBP");
        assert_eq!(cost["immediateLast30d"], 3.33);
        assert_eq!(cost["aksReviewLast30d"], 12.5);
        assert_eq!(cost["totalLast30d"], 15.83);
        assert!(cost.get("additionalCurrencies").is_none());
    }

    #[test]
    fn test_cost_summary_omitted_when_costs_disabled() {
        let options = ScanOptions {
            cost_enabled: false,
            ..ScanOptions::default()
        };
        let run = run(
            vec![finding(ResourceType::Vm, Bucket::Immediate, "vm-1", None, None)],
            options,
        );

        let value: Value = serde_json::from_str(&render_json(&run).unwrap()).unwrap();
        assert!(value.get("costSummary").is_none());
        assert!(value["findings"][0]["costLast30d"].is_null());
        assert!(value["findings"][0]["currency"].is_null());
    }

    #[test]
    fn test_additional_currencies_listed() {
        let run = run(
            vec![
                finding(ResourceType::Disk, Bucket::Immediate, "d1", Some(1.0), Some("GBP")),
                finding(ResourceType::Disk, Bucket::Immediate, "d2", Some(2.0), Some("EUR")),
            ],
            ScanOptions::default(),
        );

        let report = JsonReport::from_run(&run);
        let summary = report.cost_summary.unwrap();
        assert_eq!(summary.currency, "GBP");
        assert_eq!(summary.additional_currencies.len(), 1);
        assert_eq!(summary.additional_currencies[0].currency, "EUR");
        assert_eq!(summary.additional_currencies[0].immediate_last30d, 2.0);
    }
}
