//! Scripted Azure CLI transport for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use idle_lib::transport::{render_command, AzTransport};
use idle_lib::{Result, ScanError};
use std::sync::Mutex;

enum Reply {
    Output(String),
    Failure(String),
}

/// Answers `az` calls by the first rule whose pattern occurs in the command line
///
/// Calls that match no rule print nothing, which decodes as an empty listing.
#[derive(Default)]
pub struct ScriptedTransport {
    rules: Vec<(String, Reply)>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, pattern: &str, output: impl Into<String>) -> Self {
        self.rules
            .push((pattern.to_string(), Reply::Output(output.into())));
        self
    }

    pub fn fail_on(mut self, pattern: &str, stderr: &str) -> Self {
        self.rules
            .push((pattern.to_string(), Reply::Failure(stderr.to_string())));
        self
    }

    /// Rendered command lines in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_matching(&self, pattern: &str) -> usize {
        self.calls().iter().filter(|c| c.contains(pattern)).count()
    }
}

#[async_trait]
impl AzTransport for ScriptedTransport {
    async fn invoke(&self, args: &[String]) -> Result<String> {
        let command = render_command(args);
        self.calls.lock().unwrap().push(command.clone());

        match self.rules.iter().find(|(pattern, _)| command.contains(pattern.as_str())) {
            Some((_, Reply::Output(out))) => Ok(out.clone()),
            Some((_, Reply::Failure(stderr))) => Err(ScanError::CommandFailed {
                command,
                stderr: stderr.clone(),
            }),
            None => Ok(String::new()),
        }
    }
}

pub const SUB_ID: &str = "00000000-0000-0000-0000-000000000001";

pub fn disk_json(name: &str, rg: &str) -> String {
    format!(
        r#"{{"id":"/subscriptions/{SUB_ID}/resourceGroups/{rg}/providers/Microsoft.Compute/disks/{name}","name":"{name}","resourceGroup":"{rg}","location":"uksouth","sizeGb":128,"sku":"Premium_LRS"}}"#
    )
}
