//! Structured logging for scan events
//!
//! Every significant pipeline event is emitted through [`ScanLogger`] with an
//! `event` field, so JSON log output can be filtered per event kind.

use crate::models::BucketCosts;
use tracing::{info, warn};

/// Structured logger for scan events
#[derive(Clone)]
pub struct ScanLogger {
    tenant_id: String,
}

impl ScanLogger {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
        }
    }

    /// Log the start of a run
    pub fn log_run_started(&self, subscriptions_in_tenant: usize, subscriptions_selected: usize) {
        info!(
            event = "scan_started",
            tenant = %self.tenant_id,
            subscriptions_in_tenant = subscriptions_in_tenant,
            subscriptions_selected = subscriptions_selected,
            "Scan started"
        );
    }

    /// Log the start of one subscription
    pub fn log_subscription_started(&self, name: &str, id: &str) {
        info!(
            event = "subscription_started",
            tenant = %self.tenant_id,
            subscription = %name,
            subscription_id = %id,
            "Scanning subscription"
        );
    }

    /// Log a subscription whose cost data could not be fetched
    pub fn log_cost_unavailable(&self, name: &str, id: &str, reason: &str) {
        warn!(
            event = "cost_unavailable",
            tenant = %self.tenant_id,
            subscription = %name,
            subscription_id = %id,
            reason = %reason,
            "Cost data unavailable, continuing without costs"
        );
    }

    /// Log a completed subscription
    pub fn log_subscription_finished(
        &self,
        name: &str,
        id: &str,
        findings: usize,
        costs: &BucketCosts,
        currency: Option<&str>,
    ) {
        info!(
            event = "subscription_finished",
            tenant = %self.tenant_id,
            subscription = %name,
            subscription_id = %id,
            findings = findings,
            immediate_last30d = costs.immediate,
            review_last30d = costs.review,
            currency = ?currency,
            "Subscription scanned"
        );
    }

    /// Log the end of a run
    pub fn log_run_finished(&self, subscriptions_scanned: usize, findings: usize) {
        info!(
            event = "scan_finished",
            tenant = %self.tenant_id,
            subscriptions_scanned = subscriptions_scanned,
            findings = findings,
            "Scan finished"
        );
    }
}
