//! Sequential scan over subscriptions
//!
//! For each subscription, in listing order: activate it, fetch cost data
//! (optional and non-fatal), collect inventory (fatal on failure) and build
//! findings. Nothing is shared between subscriptions beyond the run result.

use crate::cost::{CostIndex, CostLookup};
use crate::error::Result;
use crate::findings::{build_findings, SubscriptionFindings};
use crate::inventory::Collector;
use crate::models::{BucketCosts, Finding, Subscription};
use crate::observability::ScanLogger;
use crate::report::RunTotals;
use crate::session::set_active_subscription;
use crate::transport::AzTransport;
use chrono::{DateTime, Utc};

/// Default snapshot age threshold in days
pub const DEFAULT_SNAPSHOT_DAYS: u32 = 180;

/// Options that shape a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub include_snapshots: bool,
    pub snapshot_days: u32,
    pub cost_enabled: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            include_snapshots: false,
            snapshot_days: DEFAULT_SNAPSHOT_DAYS,
            cost_enabled: true,
        }
    }
}

/// Outcome of the cost lookup for one subscription
#[derive(Debug, Clone, PartialEq)]
pub enum CostStatus {
    /// Lookup turned off for the run
    Disabled,
    /// Lookup succeeded (the index may still be empty)
    Available,
    /// Lookup failed; carries the last line of the error
    Unavailable(String),
}

/// Result of scanning one subscription
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionScan {
    pub subscription: Subscription,
    pub findings: Vec<Finding>,
    pub costs: BucketCosts,
    pub currency: Option<String>,
    pub cost_status: CostStatus,
}

/// Result of a whole run
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRun {
    pub tenant_id: String,
    pub generated_at: DateTime<Utc>,
    pub subscriptions_in_tenant: usize,
    pub options: ScanOptions,
    pub scans: Vec<SubscriptionScan>,
}

impl ScanRun {
    /// Findings in subscription order, then discovery order
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.scans.iter().flat_map(|scan| scan.findings.iter())
    }

    /// Aggregates derived from the findings
    pub fn totals(&self) -> RunTotals {
        RunTotals::from_findings(self.findings())
    }
}

/// Drives the pipeline over a list of subscriptions
pub struct Scanner<'a> {
    transport: &'a dyn AzTransport,
    options: ScanOptions,
    logger: ScanLogger,
}

impl<'a> Scanner<'a> {
    pub fn new(transport: &'a dyn AzTransport, options: ScanOptions, logger: ScanLogger) -> Self {
        Self {
            transport,
            options,
            logger,
        }
    }

    /// Scan the given subscriptions sequentially
    ///
    /// `subscriptions_in_tenant` is the count before include/exclude filters.
    pub async fn run(
        &self,
        tenant_id: &str,
        subscriptions_in_tenant: usize,
        subscriptions: &[Subscription],
        now: DateTime<Utc>,
    ) -> Result<ScanRun> {
        self.logger
            .log_run_started(subscriptions_in_tenant, subscriptions.len());

        let mut scans = Vec::with_capacity(subscriptions.len());
        for subscription in subscriptions {
            scans.push(self.scan_subscription(subscription, now).await?);
        }

        let run = ScanRun {
            tenant_id: tenant_id.to_string(),
            generated_at: now,
            subscriptions_in_tenant,
            options: self.options,
            scans,
        };
        self.logger
            .log_run_finished(run.scans.len(), run.findings().count());
        Ok(run)
    }

    /// Scan one subscription
    pub async fn scan_subscription(
        &self,
        subscription: &Subscription,
        now: DateTime<Utc>,
    ) -> Result<SubscriptionScan> {
        let name = subscription.display_name();
        self.logger.log_subscription_started(name, &subscription.id);
        set_active_subscription(self.transport, &subscription.id).await?;

        let (index, cost_status) = self.lookup_costs(subscription).await;

        let snapshot_days = self
            .options
            .include_snapshots
            .then_some(self.options.snapshot_days);
        let inventory = Collector::new(self.transport)
            .collect(snapshot_days, now)
            .await?;

        let SubscriptionFindings { findings, costs } =
            build_findings(subscription, inventory.records(), index.as_ref());
        let currency = index
            .as_ref()
            .and_then(CostIndex::currency)
            .map(str::to_string);

        self.logger.log_subscription_finished(
            name,
            &subscription.id,
            findings.len(),
            &costs,
            currency.as_deref(),
        );

        Ok(SubscriptionScan {
            subscription: subscription.clone(),
            findings,
            costs,
            currency,
            cost_status,
        })
    }

    async fn lookup_costs(&self, subscription: &Subscription) -> (Option<CostIndex>, CostStatus) {
        if !self.options.cost_enabled {
            return (None, CostStatus::Disabled);
        }

        match CostLookup::new(self.transport)
            .last_30_days(&subscription.id)
            .await
        {
            Ok(index) => (Some(index), CostStatus::Available),
            Err(err) => {
                let reason = err.summary_line();
                self.logger.log_cost_unavailable(
                    subscription.display_name(),
                    &subscription.id,
                    &reason,
                );
                (None, CostStatus::Unavailable(reason))
            }
        }
    }
}
