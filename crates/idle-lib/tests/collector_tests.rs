//! Inventory collector tests against a scripted Azure CLI

mod common;

use chrono::{Duration, TimeZone, Utc};
use common::{disk_json, ScriptedTransport, SUB_ID};
use idle_lib::inventory::Collector;
use idle_lib::{ResourceType, ScanError};

#[tokio::test]
async fn test_orphaned_disks_union_is_deduplicated() {
    let shared = disk_json("data-01", "rg-app");
    let shared_upper = shared.replace("/subscriptions/", "/SUBSCRIPTIONS/").replace("data-01\"", "DATA-01\"");
    let transport = ScriptedTransport::new()
        .on(
            "properties.managedBy==null",
            format!("[{shared},{}]", disk_json("data-02", "rg-app")),
        )
        .on(
            "properties.diskState=='Unattached'",
            format!("[{shared_upper},{}]", disk_json("stale-owner", "rg-app")),
        );

    let disks = Collector::new(&transport).orphaned_disks().await.unwrap();

    let names: Vec<&str> = disks.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["data-01", "data-02", "stale-owner"]);
    assert!(disks.iter().all(|d| d.resource_type == ResourceType::Disk));
    assert_eq!(disks[0].size_gb, Some(128));
    assert_eq!(disks[0].sku.as_deref(), Some("Premium_LRS"));
    assert_eq!(transport.calls_matching("Microsoft.Compute/disks"), 2);
}

#[tokio::test]
async fn test_only_stopped_vms_are_flagged() {
    let transport = ScriptedTransport::new().on(
        "vm list -d",
        r#"[
            {"id":"/vm/a","name":"a","resourceGroup":"rg","location":"uksouth","powerState":"VM stopped"},
            {"id":"/vm/b","name":"b","resourceGroup":"rg","location":"uksouth","powerState":"VM deallocated"},
            {"id":"/vm/c","name":"c","resourceGroup":"rg","location":"uksouth","powerState":"VM stopping"},
            {"id":"/vm/d","name":"d","resourceGroup":"rg","location":"uksouth","powerState":"VM running"},
            {"id":"/vm/e","name":"e","resourceGroup":"rg","location":"uksouth","powerState":null}
        ]"#,
    );

    let vms = Collector::new(&transport)
        .stopped_not_deallocated_vms()
        .await
        .unwrap();

    assert_eq!(vms.len(), 1);
    assert_eq!(vms[0].name, "a");
    assert_eq!(vms[0].power_state.as_deref(), Some("VM stopped"));
}

#[tokio::test]
async fn test_snapshot_threshold_and_bad_timestamps() {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let exactly = (now - Duration::days(30)).to_rfc3339();
    let younger = (now - Duration::days(29)).to_rfc3339();
    let older = (now - Duration::days(400)).to_rfc3339();
    let transport = ScriptedTransport::new().on(
        "snapshot list",
        format!(
            r#"[
                {{"id":"/s/exact","name":"exact","resourceGroup":"rg","location":"uksouth","timeCreated":"{exactly}","sizeGb":32}},
                {{"id":"/s/young","name":"young","resourceGroup":"rg","location":"uksouth","timeCreated":"{younger}"}},
                {{"id":"/s/old","name":"old","resourceGroup":"rg","location":"uksouth","timeCreated":"{older}"}},
                {{"id":"/s/none","name":"none","resourceGroup":"rg","location":"uksouth","timeCreated":null}},
                {{"id":"/s/bad","name":"bad","resourceGroup":"rg","location":"uksouth","timeCreated":"not a date"}}
            ]"#
        ),
    );

    let snapshots = Collector::new(&transport)
        .snapshots_older_than(30, now)
        .await
        .unwrap();

    let found: Vec<(&str, Option<i64>)> = snapshots
        .iter()
        .map(|s| (s.name.as_str(), s.age_days))
        .collect();
    assert_eq!(found, vec![("exact", Some(30)), ("old", Some(400))]);
    assert_eq!(snapshots[0].size_gb, Some(32));
}

#[tokio::test]
async fn test_snapshots_not_listed_unless_requested() {
    let transport = ScriptedTransport::new();
    let inventory = Collector::new(&transport).collect(None, Utc::now()).await.unwrap();

    assert!(inventory.is_empty());
    assert_eq!(transport.calls_matching("snapshot list"), 0);
    assert_eq!(transport.calls().len(), 5);
}

#[tokio::test]
async fn test_inventory_failure_propagates() {
    let transport = ScriptedTransport::new()
        .on("properties.managedBy==null", format!("[{}]", disk_json("d", "rg")))
        .fail_on("network nic list", "ERROR: (AuthorizationFailed) not allowed");

    let err = Collector::new(&transport)
        .collect(Some(180), Utc::now())
        .await
        .unwrap_err();

    match err {
        ScanError::CommandFailed { command, stderr } => {
            assert!(command.starts_with("az network nic list"));
            assert!(stderr.contains("AuthorizationFailed"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_public_ip_attributes() {
    let transport = ScriptedTransport::new().on(
        "public-ip list",
        format!(
            r#"[{{"id":"/subscriptions/{SUB_ID}/ip/1","name":"pip-1","resourceGroup":"rg","location":"westeurope","sku":"Standard","ip":"20.1.2.3"}}]"#
        ),
    );

    let ips = Collector::new(&transport).unattached_public_ips().await.unwrap();
    assert_eq!(ips.len(), 1);
    assert_eq!(ips[0].resource_type, ResourceType::PublicIp);
    assert_eq!(ips[0].ip.as_deref(), Some("20.1.2.3"));
    assert_eq!(ips[0].sku.as_deref(), Some("Standard"));
}
