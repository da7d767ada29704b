//! Core data models for the idle resource scan

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of billable resource inspected by the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceType {
    Disk,
    PublicIp,
    Nic,
    Vm,
    Snapshot,
}

impl ResourceType {
    /// Wire name used in JSON and CSV output
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Disk => "disk",
            ResourceType::PublicIp => "publicIp",
            ResourceType::Nic => "nic",
            ResourceType::Vm => "vm",
            ResourceType::Snapshot => "snapshot",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remediation bucket a resource is placed into
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Bucket {
    /// Safe-ish infrastructure cleanup
    Immediate,
    /// Cluster-linked storage or network that needs an AKS owner to confirm
    AksReview,
    /// Old snapshots subject to retention policy review
    SnapshotReview,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Immediate => "immediate",
            Bucket::AksReview => "aksReview",
            Bucket::SnapshotReview => "snapshotReview",
        }
    }

    /// Whether costs in this bucket count towards the review total
    pub fn is_review(&self) -> bool {
        !matches!(self, Bucket::Immediate)
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized inventory entry produced by the collector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    pub resource_type: ResourceType,
    pub id: String,
    pub name: String,
    pub resource_group: String,
    pub location: String,
    pub size_gb: Option<u64>,
    pub sku: Option<String>,
    pub ip: Option<String>,
    pub power_state: Option<String>,
    pub age_days: Option<i64>,
}

impl ResourceRecord {
    /// Create a record with only the common attributes set
    pub fn new(
        resource_type: ResourceType,
        id: impl Into<String>,
        name: impl Into<String>,
        resource_group: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            resource_type,
            id: id.into(),
            name: name.into(),
            resource_group: resource_group.into(),
            location: location.into(),
            size_gb: None,
            sku: None,
            ip: None,
            power_state: None,
            age_days: None,
        }
    }
}

/// Subscription as returned by `az account list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

impl Subscription {
    /// Display name, falling back to the id
    pub fn display_name(&self) -> &str {
        if !self.name.is_empty() {
            &self.name
        } else if !self.id.is_empty() {
            &self.id
        } else {
            "Unknown"
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.eq_ignore_ascii_case("enabled")
    }
}

/// One classified, cost-annotated resource in the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub subscription: String,
    pub subscription_id: String,
    pub bucket: Bucket,
    pub resource_type: ResourceType,
    pub name: String,
    pub resource_group: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_gb: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_days: Option<i64>,
    pub resource_id: String,
    pub cost_last30d: Option<f64>,
    pub currency: Option<String>,
    pub remediation: String,
}

/// Running cost totals for the two report buckets
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketCosts {
    pub immediate: f64,
    pub review: f64,
}

impl BucketCosts {
    /// Add a cost into the total matching `bucket`
    pub fn add(&mut self, bucket: Bucket, cost: f64) {
        if bucket.is_review() {
            self.review += cost;
        } else {
            self.immediate += cost;
        }
    }

    pub fn total(&self) -> f64 {
        self.immediate + self.review
    }
}
