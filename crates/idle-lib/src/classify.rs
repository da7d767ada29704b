//! AKS-linked resource heuristics
//!
//! AKS provisions disks and NICs into a separately named node resource group.
//! Deleting those out from under a cluster breaks it, so anything that looks
//! cluster-owned goes to the review bucket instead of immediate cleanup.

use crate::models::{Bucket, ResourceType};
use regex::Regex;
use std::sync::OnceLock;

static AKS_RESOURCE_GROUP: OnceLock<Regex> = OnceLock::new();

/// `aks` only counts as a `-`/`_` delimited token so "flasks" or "tasks" stay out
fn aks_resource_group() -> &'static Regex {
    AKS_RESOURCE_GROUP.get_or_init(|| {
        Regex::new(r"(?i)(^MC_)|([_\-]aks[_\-])|(^aks[_\-])|([_\-]aks$)")
            .expect("AKS resource group pattern is valid")
    })
}

/// Whether a resource looks like it belongs to an AKS cluster
pub fn is_aks_related(name: &str, resource_group: &str) -> bool {
    if aks_resource_group().is_match(resource_group) {
        return true;
    }

    let name = name.to_lowercase();

    // persistent volume claims
    if name.starts_with("pvc-") {
        return true;
    }

    // kube-apiserver NICs and private endpoints
    name.contains("kube") || name.contains("-pe-")
}

/// Bucket for a resource of the given kind
pub fn classify(resource_type: ResourceType, name: &str, resource_group: &str) -> Bucket {
    match resource_type {
        ResourceType::Disk | ResourceType::Nic => {
            if is_aks_related(name, resource_group) {
                Bucket::AksReview
            } else {
                Bucket::Immediate
            }
        }
        ResourceType::PublicIp | ResourceType::Vm => Bucket::Immediate,
        ResourceType::Snapshot => Bucket::SnapshotReview,
    }
}
