//! CSV report view

use crate::error::{Result, ScanError};
use crate::models::Finding;
use csv::Writer;

/// Fixed column set, one row per finding
pub const CSV_COLUMNS: [&str; 16] = [
    "subscription",
    "subscriptionId",
    "bucket",
    "resourceType",
    "name",
    "resourceGroup",
    "location",
    "sizeGb",
    "sku",
    "ip",
    "powerState",
    "ageDays",
    "resourceId",
    "costLast30d",
    "currency",
    "remediation",
];

/// Render findings as CSV with a header row; never truncated
pub fn render_csv<'f>(findings: impl IntoIterator<Item = &'f Finding>) -> Result<String> {
    let mut wtr = Writer::from_writer(vec![]);
    wtr.write_record(CSV_COLUMNS)?;

    for f in findings {
        wtr.write_record([
            f.subscription.clone(),
            f.subscription_id.clone(),
            f.bucket.to_string(),
            f.resource_type.to_string(),
            f.name.clone(),
            f.resource_group.clone(),
            f.location.clone(),
            optional(f.size_gb),
            f.sku.clone().unwrap_or_default(),
            f.ip.clone().unwrap_or_default(),
            f.power_state.clone().unwrap_or_default(),
            optional(f.age_days),
            f.resource_id.clone(),
            optional(f.cost_last30d),
            f.currency.clone().unwrap_or_default(),
            f.remediation.clone(),
        ])?;
    }

    let data = wtr
        .into_inner()
        .map_err(|e| ScanError::Export(format!("CSV writer error: {}", e)))?;
    String::from_utf8(data).map_err(|e| ScanError::Export(format!("UTF-8 conversion error: {}", e)))
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bucket, ResourceType};
    use crate::report::fixtures::finding;

    #[test]
    fn test_csv_export_empty() {
        let result = render_csv(&[]).unwrap();

        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0], CSV_COLUMNS.join(","));
    }

    #[test]
    fn test_csv_row_values() {
        let mut vm = finding(ResourceType::Vm, Bucket::Immediate, "vm-1", Some(40.25), Some("USD"));
        vm.power_state = Some("VM stopped".to_string());

        let result = render_csv([&vm]).unwrap();
        let mut reader = csv::Reader::from_reader(result.as_bytes());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(&row[2], "immediate");
        assert_eq!(&row[3], "vm");
        assert_eq!(&row[7], "");
        assert_eq!(&row[10], "VM stopped");
        assert_eq!(&row[13], "40.25");
        assert_eq!(&row[14], "USD");
        assert!(row[15].starts_with("az vm deallocate --ids "));
    }

    #[test]
    fn test_csv_quotes_embedded_commas() {
        let mut disk = finding(ResourceType::Disk, Bucket::Immediate, "d1", None, None);
        disk.name = "disk, with comma".to_string();

        let result = render_csv([&disk]).unwrap();
        assert!(result.contains("\"disk, with comma\""));
    }
}
