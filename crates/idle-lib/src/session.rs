//! Tenant login and subscription enumeration

use crate::error::{Result, ScanError};
use crate::models::Subscription;
use crate::transport::{args, invoke_json, AzTransport};
use std::collections::BTreeSet;
use tracing::info;

/// Log in to a tenant with the Azure CLI
pub async fn login(transport: &dyn AzTransport, tenant_id: &str, device_code: bool) -> Result<()> {
    let mut login_args = args(["login", "--tenant", tenant_id, "--output", "none"]);
    if device_code {
        login_args.push("--use-device-code".to_string());
    }
    transport.invoke(&login_args).await?;
    info!(tenant_id = %tenant_id, device_code, "Logged in");
    Ok(())
}

/// Subscriptions in the `Enabled` state
pub async fn list_enabled_subscriptions(transport: &dyn AzTransport) -> Result<Vec<Subscription>> {
    let all: Vec<Subscription> =
        invoke_json(transport, &args(["account", "list", "--all", "-o", "json"])).await?;
    let enabled: Vec<Subscription> = all.into_iter().filter(Subscription::is_enabled).collect();

    if enabled.is_empty() {
        return Err(ScanError::NoSubscriptions);
    }
    Ok(enabled)
}

/// Make a subscription the active one for subsequent queries
pub async fn set_active_subscription(transport: &dyn AzTransport, subscription_id: &str) -> Result<()> {
    transport
        .invoke(&args(["account", "set", "--subscription", subscription_id]))
        .await?;
    Ok(())
}

/// Include/exclude lists matched against subscription name or id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionFilter {
    only: BTreeSet<String>,
    skip: BTreeSet<String>,
}

impl SubscriptionFilter {
    pub fn new<I, J, S, T>(only: I, skip: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Self {
            only: normalize(only),
            skip: normalize(skip),
        }
    }

    /// Whether a subscription should be scanned
    pub fn allows(&self, subscription: &Subscription) -> bool {
        if !self.only.is_empty() && !matches_any(subscription, &self.only) {
            return false;
        }
        !matches_any(subscription, &self.skip)
    }

    pub fn apply(&self, subscriptions: Vec<Subscription>) -> Vec<Subscription> {
        subscriptions.into_iter().filter(|s| self.allows(s)).collect()
    }
}

fn normalize<I, S>(values: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|v| v.as_ref().trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn matches_any(subscription: &Subscription, names_or_ids: &BTreeSet<String>) -> bool {
    names_or_ids.contains(subscription.name.trim()) || names_or_ids.contains(subscription.id.trim())
}
