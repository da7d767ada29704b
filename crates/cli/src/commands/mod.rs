//! CLI commands

pub mod scan;
