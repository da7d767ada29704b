//! Inventory collection
//!
//! Lists idle or orphaned resources in the active subscription through
//! read-only `az` queries and normalizes them into [`ResourceRecord`]s.
//! A failed query fails the whole collection; there is no per-kind retry.

use crate::error::Result;
use crate::models::{ResourceRecord, ResourceType};
use crate::transport::{args, invoke_json, AzTransport};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use tracing::debug;

const DISK_PROJECTION: &str = "{id:id, name:name, resourceGroup:resourceGroup, location:location, sizeGb:properties.diskSizeGB, sku:sku.name}";

/// Everything the collector found for one subscription
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    pub disks: Vec<ResourceRecord>,
    pub public_ips: Vec<ResourceRecord>,
    pub nics: Vec<ResourceRecord>,
    pub vms: Vec<ResourceRecord>,
    pub snapshots: Vec<ResourceRecord>,
}

impl Inventory {
    /// All records in report order
    pub fn records(&self) -> impl Iterator<Item = &ResourceRecord> {
        self.disks
            .iter()
            .chain(&self.public_ips)
            .chain(&self.nics)
            .chain(&self.vms)
            .chain(&self.snapshots)
    }

    pub fn len(&self) -> usize {
        self.disks.len()
            + self.public_ips.len()
            + self.nics.len()
            + self.vms.len()
            + self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Row shape shared by every projection; missing attributes stay `None`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResource {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    resource_group: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    size_gb: Option<u64>,
    #[serde(default)]
    sku: Option<String>,
    #[serde(default)]
    ip: Option<String>,
    #[serde(default)]
    power_state: Option<String>,
    #[serde(default)]
    time_created: Option<String>,
}

impl RawResource {
    fn into_record(self, resource_type: ResourceType) -> ResourceRecord {
        ResourceRecord {
            resource_type,
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            resource_group: self.resource_group.unwrap_or_default(),
            location: self.location.unwrap_or_default(),
            size_gb: self.size_gb,
            sku: self.sku,
            ip: self.ip,
            power_state: self.power_state,
            age_days: None,
        }
    }
}

/// Read-only collector bound to a transport
pub struct Collector<'a> {
    transport: &'a dyn AzTransport,
}

impl<'a> Collector<'a> {
    pub fn new(transport: &'a dyn AzTransport) -> Self {
        Self { transport }
    }

    /// Collect every resource kind; snapshots only when `snapshot_days` is set
    pub async fn collect(&self, snapshot_days: Option<u32>, now: DateTime<Utc>) -> Result<Inventory> {
        let disks = self.orphaned_disks().await?;
        let public_ips = self.unattached_public_ips().await?;
        let nics = self.unattached_nics().await?;
        let vms = self.stopped_not_deallocated_vms().await?;
        let snapshots = match snapshot_days {
            Some(days) => self.snapshots_older_than(days, now).await?,
            None => Vec::new(),
        };

        let inventory = Inventory {
            disks,
            public_ips,
            nics,
            vms,
            snapshots,
        };
        debug!(
            disks = inventory.disks.len(),
            public_ips = inventory.public_ips.len(),
            nics = inventory.nics.len(),
            vms = inventory.vms.len(),
            snapshots = inventory.snapshots.len(),
            "Inventory collected"
        );
        Ok(inventory)
    }

    /// Unattached managed disks
    ///
    /// `managedBy == null` misses disks whose parent VM was deleted but left a
    /// stale owner reference, so the `diskState` listing is merged in as well.
    pub async fn orphaned_disks(&self) -> Result<Vec<ResourceRecord>> {
        let by_owner = self
            .list_disks(&format!("[?properties.managedBy==null].{DISK_PROJECTION}"))
            .await?;
        let by_state = self
            .list_disks(&format!("[?properties.diskState=='Unattached'].{DISK_PROJECTION}"))
            .await?;

        Ok(merge_unique(by_owner, by_state))
    }

    async fn list_disks(&self, query: &str) -> Result<Vec<ResourceRecord>> {
        let rows: Vec<RawResource> = invoke_json(
            self.transport,
            &args([
                "resource",
                "list",
                "--resource-type",
                "Microsoft.Compute/disks",
                "--query",
                query,
                "-o",
                "json",
            ]),
        )
        .await?;
        Ok(into_records(rows, ResourceType::Disk))
    }

    /// Public IPs with no IP configuration
    pub async fn unattached_public_ips(&self) -> Result<Vec<ResourceRecord>> {
        let rows: Vec<RawResource> = invoke_json(
            self.transport,
            &args([
                "network",
                "public-ip",
                "list",
                "--query",
                "[?ipConfiguration==null].{id:id, name:name, resourceGroup:resourceGroup, location:location, sku:sku.name, ip:ipAddress}",
                "-o",
                "json",
            ]),
        )
        .await?;
        Ok(into_records(rows, ResourceType::PublicIp))
    }

    /// NICs not attached to a virtual machine
    pub async fn unattached_nics(&self) -> Result<Vec<ResourceRecord>> {
        let rows: Vec<RawResource> = invoke_json(
            self.transport,
            &args([
                "network",
                "nic",
                "list",
                "--query",
                "[?virtualMachine==null].{id:id, name:name, resourceGroup:resourceGroup, location:location}",
                "-o",
                "json",
            ]),
        )
        .await?;
        Ok(into_records(rows, ResourceType::Nic))
    }

    /// VMs that are stopped but still allocated, and so still billed for compute
    pub async fn stopped_not_deallocated_vms(&self) -> Result<Vec<ResourceRecord>> {
        let rows: Vec<RawResource> = invoke_json(
            self.transport,
            &args([
                "vm",
                "list",
                "-d",
                "--query",
                "[].{id:id, name:name, resourceGroup:resourceGroup, location:location, powerState:powerState}",
                "-o",
                "json",
            ]),
        )
        .await?;

        Ok(into_records(rows, ResourceType::Vm)
            .into_iter()
            .filter(|vm| is_stopped_not_deallocated(vm.power_state.as_deref().unwrap_or_default()))
            .collect())
    }

    /// Snapshots at least `days` old
    pub async fn snapshots_older_than(&self, days: u32, now: DateTime<Utc>) -> Result<Vec<ResourceRecord>> {
        let rows: Vec<RawResource> = invoke_json(
            self.transport,
            &args([
                "snapshot",
                "list",
                "--query",
                "[].{id:id, name:name, resourceGroup:resourceGroup, location:location, timeCreated:timeCreated, sizeGb:diskSizeGB}",
                "-o",
                "json",
            ]),
        )
        .await?;

        let mut snapshots = Vec::new();
        for row in rows {
            let created = row.time_created.as_deref();
            let Some(age) = created.and_then(|ts| snapshot_age_days(ts, now)) else {
                debug!(name = ?row.name, time_created = ?created, "Skipping snapshot without usable timestamp");
                continue;
            };
            if age < i64::from(days) {
                continue;
            }
            let mut record = row.into_record(ResourceType::Snapshot);
            record.age_days = Some(age);
            snapshots.push(record);
        }
        Ok(snapshots)
    }
}

fn into_records(rows: Vec<RawResource>, resource_type: ResourceType) -> Vec<ResourceRecord> {
    rows.into_iter().map(|row| row.into_record(resource_type)).collect()
}

/// Concatenate two listings keeping the first occurrence of each id
///
/// Ids compare case-insensitively; records without an id are dropped.
pub fn merge_unique(first: Vec<ResourceRecord>, second: Vec<ResourceRecord>) -> Vec<ResourceRecord> {
    let mut seen = HashSet::new();
    first
        .into_iter()
        .chain(second)
        .filter(|record| !record.id.is_empty() && seen.insert(record.id.to_lowercase()))
        .collect()
}

/// `stopped` without `deallocated`, as an exact substring check
pub fn is_stopped_not_deallocated(power_state: &str) -> bool {
    let state = power_state.to_lowercase();
    state.contains("stopped") && !state.contains("deallocated")
}

/// Whole days between `time_created` and `now`
///
/// Accepts RFC 3339 and offset-less ISO timestamps (taken as UTC). Returns
/// `None` for unparsable or future timestamps.
pub fn snapshot_age_days(time_created: &str, now: DateTime<Utc>) -> Option<i64> {
    let created = parse_timestamp(time_created.trim())?;
    let elapsed = now.signed_duration_since(created);
    if elapsed < chrono::Duration::zero() {
        return None;
    }
    Some(elapsed.num_days())
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
