//! Joins inventory, classification and cost into report findings

use crate::classify::classify;
use crate::cost::CostIndex;
use crate::models::{BucketCosts, Finding, ResourceRecord, ResourceType, Subscription};

/// Suggested cleanup command for a resource
pub fn remediation_hint(resource_type: ResourceType, resource_id: &str) -> String {
    if resource_id.is_empty() {
        return String::new();
    }
    match resource_type {
        ResourceType::Disk => format!("az disk delete --ids {resource_id} --yes"),
        ResourceType::PublicIp => format!("az network public-ip delete --ids {resource_id}"),
        ResourceType::Nic => format!("az network nic delete --ids {resource_id}"),
        ResourceType::Vm => format!("az vm deallocate --ids {resource_id}"),
        ResourceType::Snapshot => format!("az snapshot delete --ids {resource_id}"),
    }
}

/// Findings for one subscription plus the bucket cost accumulator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubscriptionFindings {
    pub findings: Vec<Finding>,
    pub costs: BucketCosts,
}

/// Build one finding per record
///
/// `costs` is `None` when cost lookup is disabled or unavailable, in which
/// case every finding carries a null cost.
pub fn build_findings<'r>(
    subscription: &Subscription,
    records: impl IntoIterator<Item = &'r ResourceRecord>,
    costs: Option<&CostIndex>,
) -> SubscriptionFindings {
    let currency = costs.and_then(CostIndex::currency).map(str::to_string);
    let mut out = SubscriptionFindings::default();

    for record in records {
        let cost = costs.and_then(|index| index.get(&record.id));
        let bucket = classify(record.resource_type, &record.name, &record.resource_group);

        if let Some(cost) = cost {
            out.costs.add(bucket, cost);
        }

        out.findings.push(Finding {
            subscription: subscription.display_name().to_string(),
            subscription_id: subscription.id.clone(),
            bucket,
            resource_type: record.resource_type,
            name: record.name.clone(),
            resource_group: record.resource_group.clone(),
            location: record.location.clone(),
            size_gb: record.size_gb,
            sku: record.sku.clone(),
            ip: record.ip.clone(),
            power_state: record.power_state.clone(),
            age_days: record.age_days,
            resource_id: record.id.clone(),
            cost_last30d: cost,
            currency: currency.clone(),
            remediation: remediation_hint(record.resource_type, &record.id),
        });
    }

    out
}
