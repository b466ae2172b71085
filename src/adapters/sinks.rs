use crate::domain::model::HistoryValue;
use crate::domain::ports::{ApiTransport, ValueSink};
use crate::utils::error::{LoadGenError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::process::Stdio;
use tokio::process::Command;

pub const DEFAULT_SENDER_BIN: &str = "zabbix_sender";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Shell out to the sender utility once per value.
    #[default]
    Sender,
    /// Push through the `history.push` API method.
    Api,
    /// Accept and drop every value.
    None,
}

/// Runs `<binary> -z <server> -s <host> -k <key> -o <value>` per value.
#[derive(Debug, Clone)]
pub struct SenderSink {
    binary: String,
    server: String,
}

impl SenderSink {
    pub fn new(binary: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            server: server.into(),
        }
    }

    pub fn args<'a>(&'a self, host: &'a str, key: &'a str, value: &'a str) -> [&'a str; 8] {
        ["-z", self.server.as_str(), "-s", host, "-k", key, "-o", value]
    }
}

#[async_trait]
impl ValueSink for SenderSink {
    async fn send(&self, host: &str, key: &str, value: &str) -> Result<()> {
        let status = Command::new(&self.binary)
            .args(self.args(host, key, value))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| LoadGenError::SinkError {
                host: host.to_string(),
                key: key.to_string(),
                message: format!("failed to run {}: {}", self.binary, e),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(LoadGenError::SinkError {
                host: host.to_string(),
                key: key.to_string(),
                message: format!("{} exited with {}", self.binary, status),
            })
        }
    }

    fn name(&self) -> &str {
        "sender"
    }
}

/// Pushes values through the API, for machines without the sender binary.
pub struct ApiSink<T: ApiTransport> {
    transport: T,
}

impl<T: ApiTransport> ApiSink<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl<T: ApiTransport> ValueSink for ApiSink<T> {
    async fn send(&self, host: &str, key: &str, value: &str) -> Result<()> {
        let row = HistoryValue {
            host: host.to_string(),
            key: key.to_string(),
            value: Value::String(value.to_string()),
            clock: chrono::Utc::now().timestamp(),
        };
        let params = serde_json::to_value(vec![row])?;
        let result = self
            .transport
            .call("history.push", params)
            .await
            .map_err(|e| LoadGenError::SinkError {
                host: host.to_string(),
                key: key.to_string(),
                message: e.to_string(),
            })?;

        // Per-row failures come back inside a successful envelope.
        let rejected = result
            .get("data")
            .and_then(Value::as_array)
            .and_then(|rows| rows.iter().find_map(|row| row.get("error")))
            .filter(|error| !error.is_null());

        match rejected {
            Some(error) => Err(LoadGenError::SinkError {
                host: host.to_string(),
                key: key.to_string(),
                message: error
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| error.to_string()),
            }),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "api"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

#[async_trait]
impl ValueSink for NullSink {
    async fn send(&self, _host: &str, _key: &str, _value: &str) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "none"
    }
}
