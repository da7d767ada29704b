//! Query transport for the Azure CLI
//!
//! Every read against Azure goes through [`AzTransport`], so the collector,
//! cost lookup and session helpers can be driven by a scripted transport in
//! tests. [`AzCli`] is the production implementation and shells out to `az`.

use crate::error::{Result, ScanError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Default per-call timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Homebrew location on Apple Silicon, often missing from non-login shells
const HOMEBREW_AZ: &str = "/opt/homebrew/bin/az";

/// Runs one `az` invocation and returns its stdout
#[async_trait]
pub trait AzTransport: Send + Sync {
    async fn invoke(&self, args: &[String]) -> Result<String>;
}

/// Run `az` and decode stdout as JSON; empty stdout decodes as `[]`
pub async fn invoke_json<T: DeserializeOwned>(
    transport: &dyn AzTransport,
    args: &[String],
) -> Result<T> {
    let out = transport.invoke(args).await?;
    let trimmed = out.trim();
    let text = if trimmed.is_empty() { "[]" } else { trimmed };

    serde_json::from_str(text).map_err(|source| ScanError::Decode {
        command: render_command(args),
        source,
    })
}

/// Human-readable form of an `az` invocation
pub fn render_command(args: &[String]) -> String {
    let mut command = String::from("az");
    for arg in args {
        command.push(' ');
        command.push_str(arg);
    }
    command
}

/// Convert a list of string slices into owned arguments
pub fn args<const N: usize>(parts: [&str; N]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

/// Production transport that spawns the Azure CLI
#[derive(Debug, Clone)]
pub struct AzCli {
    program: PathBuf,
    timeout: Duration,
}

impl AzCli {
    /// Locate `az` and build a transport with the default timeout
    pub fn locate(explicit: Option<&Path>) -> Result<Self> {
        let program = resolve_program(explicit, std::env::var_os("PATH").as_deref())?;
        debug!(program = %program.display(), "Resolved Azure CLI");
        Ok(Self {
            program,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Set a custom per-call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl AzTransport for AzCli {
    async fn invoke(&self, args: &[String]) -> Result<String> {
        let command = render_command(args);
        debug!(command = %command, "Running az");

        let child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(result) => result.map_err(|source| ScanError::Spawn {
                command: command.clone(),
                source,
            })?,
            Err(_) => {
                return Err(ScanError::Timeout {
                    command,
                    secs: self.timeout.as_secs(),
                })
            }
        };

        if !output.status.success() {
            return Err(ScanError::CommandFailed {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Find the `az` executable: explicit path, then `PATH`, then Homebrew
fn resolve_program(explicit: Option<&Path>, path_var: Option<&std::ffi::OsStr>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(ScanError::ToolNotFound)
        };
    }

    if let Some(found) = path_var.and_then(search_path) {
        return Ok(found);
    }

    let homebrew = Path::new(HOMEBREW_AZ);
    if homebrew.is_file() {
        return Ok(homebrew.to_path_buf());
    }

    Err(ScanError::ToolNotFound)
}

fn search_path(path_var: &std::ffi::OsStr) -> Option<PathBuf> {
    let names: &[&str] = if cfg!(windows) {
        &["az.cmd", "az.exe", "az"]
    } else {
        &["az"]
    };

    std::env::split_paths(path_var).find_map(|dir| {
        names
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    #[test]
    fn test_render_command() {
        let rendered = render_command(&args(["account", "list", "--all"]));
        assert_eq!(rendered, "az account list --all");
    }

    #[test]
    fn test_explicit_missing_path_is_tool_not_found() {
        let result = resolve_program(Some(Path::new("/definitely/not/here/az")), None);
        assert!(matches!(result, Err(ScanError::ToolNotFound)));
    }

    #[test]
    fn test_search_path_skips_directories_without_az() {
        let path_var = OsString::from("/definitely/not/here");
        assert!(search_path(&path_var).is_none());
    }

    const STUB_AZ: &str = r#"#!/bin/sh
case "$1" in
  slow) sleep 5 ;;
  fail) echo "noise" >&2; echo "ERROR: boom" >&2; exit 3 ;;
  *) echo "  [1]  " ;;
esac
"#;

    // Single test: the stub must not be open for writing while another test forks
    #[cfg(unix)]
    #[tokio::test]
    async fn test_az_cli_runs_process() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let stub = dir.path().join("az");
        std::fs::write(&stub, STUB_AZ).unwrap();
        std::fs::set_permissions(&stub, std::fs::Permissions::from_mode(0o755)).unwrap();

        let az = AzCli::locate(Some(stub.as_path()))
            .unwrap()
            .with_timeout(Duration::from_secs(1));

        let out = az.invoke(&args(["list"])).await.unwrap();
        assert_eq!(out, "[1]");

        match az.invoke(&args(["fail"])).await {
            Err(ScanError::CommandFailed { command, stderr }) => {
                assert_eq!(command, "az fail");
                assert_eq!(stderr, "noise\nERROR: boom");
            }
            other => panic!("expected command failure, got {other:?}"),
        }

        let started = std::time::Instant::now();
        match az.invoke(&args(["slow"])).await {
            Err(ScanError::Timeout { command, secs }) => {
                assert_eq!(command, "az slow");
                assert_eq!(secs, 1);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
