//! Azure idle resource scanning library
//!
//! This crate provides the core functionality for:
//! - Inventory collection of orphaned disks, public IPs, NICs, stopped VMs and old snapshots
//! - Last-30-day cost lookup by resource id
//! - AKS-linked resource classification
//! - Findings assembly and text/JSON/CSV reporting

pub mod classify;
pub mod cost;
pub mod error;
pub mod findings;
pub mod inventory;
pub mod models;
pub mod observability;
pub mod report;
pub mod scan;
pub mod session;
pub mod transport;

pub use error::{Result, ScanError};
pub use models::*;
pub use observability::ScanLogger;
pub use report::{render, ReportFormat, RunTotals};
pub use scan::{CostStatus, ScanOptions, ScanRun, Scanner, SubscriptionScan};
pub use transport::{AzCli, AzTransport};
