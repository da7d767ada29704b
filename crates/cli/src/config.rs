//! Configuration management for the CLI
//!
//! Settings are layered with the `config` crate: built-in defaults, then an
//! optional JSON file, then `AZIDLE_*` environment variables. Command-line
//! flags are applied on top by the caller.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use idle_lib::scan::DEFAULT_SNAPSHOT_DAYS;
use idle_lib::transport::DEFAULT_TIMEOUT_SECS;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "AZIDLE";

/// CLI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Tenant (directory) id to log in to
    #[serde(default)]
    pub tenant: Option<String>,
    /// Subscription names or ids to skip
    #[serde(default)]
    pub skip_subs: Vec<String>,
    /// Subscription names or ids to scan exclusively
    #[serde(default)]
    pub only_subs: Vec<String>,
    /// Snapshot age threshold in days
    #[serde(default = "default_snapshot_days")]
    pub snapshot_days: u32,
    /// Per-call timeout for `az`
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Explicit path to the `az` executable
    #[serde(default)]
    pub az_path: Option<PathBuf>,
    /// Emit logs as JSON
    #[serde(default)]
    pub log_json: bool,
}

fn default_snapshot_days() -> u32 {
    DEFAULT_SNAPSHOT_DAYS
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tenant: None,
            skip_subs: Vec::new(),
            only_subs: Vec::new(),
            snapshot_days: default_snapshot_days(),
            timeout_secs: default_timeout_secs(),
            az_path: None,
            log_json: false,
        }
    }
}

impl Settings {
    /// Load settings from the config file and environment
    ///
    /// An explicit path must exist; the default path is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let file = match explicit {
            Some(path) => Some((path.to_path_buf(), true)),
            None => Self::config_path().ok().map(|path| (path, false)),
        };
        Self::build(file, Some(Self::environment()))
    }

    /// Environment source for `AZIDLE_*` variables
    pub fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("skip_subs")
            .with_list_parse_key("only_subs")
    }

    /// Build settings from an optional file and environment source
    pub fn build(
        file: Option<(PathBuf, bool)>,
        environment: Option<config::Environment>,
    ) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some((path, required)) = file {
            builder = builder.add_source(
                config::File::from(path.as_path())
                    .format(config::FileFormat::Json)
                    .required(required),
            );
        }
        if let Some(environment) = environment {
            builder = builder.add_source(environment);
        }

        let settings: Self = builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values no scan can run with
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            bail!("Invalid configuration: timeout_secs must be at least 1");
        }
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("azidle").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults_without_sources() {
        let settings = Settings::build(None, None).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.snapshot_days, 180);
        assert_eq!(settings.timeout_secs, 120);
    }

    #[test]
    fn test_file_values() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"tenant":"contoso","skip_subs":["Sandbox"],"snapshot_days":90,"log_json":true}}"#
        )
        .unwrap();

        let settings = Settings::build(Some((file.path().to_path_buf(), true)), None).unwrap();
        assert_eq!(settings.tenant.as_deref(), Some("contoso"));
        assert_eq!(settings.skip_subs, vec!["Sandbox".to_string()]);
        assert_eq!(settings.snapshot_days, 90);
        assert_eq!(settings.timeout_secs, 120);
        assert!(settings.log_json);
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"snapshot_days":90}}"#).unwrap();

        let vars: HashMap<String, String> = [
            ("AZIDLE_SNAPSHOT_DAYS", "30"),
            ("AZIDLE_ONLY_SUBS", "Prod,Dev"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let settings = Settings::build(
            Some((file.path().to_path_buf(), true)),
            Some(Settings::environment().source(Some(vars))),
        )
        .unwrap();

        assert_eq!(settings.snapshot_days, 30);
        assert_eq!(settings.only_subs, vec!["Prod".to_string(), "Dev".to_string()]);
    }

    #[test]
    fn test_missing_optional_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        assert!(Settings::build(Some((path.clone(), false)), None).is_ok());
        assert!(Settings::build(Some((path, true)), None).is_err());
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let vars: HashMap<String, String> =
            [("AZIDLE_TIMEOUT_SECS".to_string(), "0".to_string())].into_iter().collect();

        let err = Settings::build(None, Some(Settings::environment().source(Some(vars))))
            .unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{{not json").unwrap();

        let err = Settings::build(Some((file.path().to_path_buf(), true)), None).unwrap_err();
        assert!(err.to_string().contains("configuration"));
    }
}
