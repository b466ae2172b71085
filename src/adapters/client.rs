use crate::domain::ports::ApiTransport;
use crate::utils::error::{LoadGenError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Longest slice of a non-JSON error body kept in an error message.
const MAX_ERROR_BODY: usize = 512;

/// Where the credential travels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// `Authorization: Bearer <token>` header (API tokens, 6.4+).
    #[default]
    Bearer,
    /// `auth` field inside the request envelope (session ids, older servers).
    Body,
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Value,
}

impl RpcError {
    fn into_error(self, method: &str) -> LoadGenError {
        let data = match self.data {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        LoadGenError::ApiError {
            method: method.to_string(),
            code: self.code,
            message: self.message,
            data,
        }
    }
}

/// JSON-RPC client for the monitoring API. Cheap to clone; clones share the
/// connection pool and the request-id counter.
#[derive(Clone)]
pub struct ZabbixClient {
    client: Client,
    url: String,
    token: String,
    auth_mode: AuthMode,
    next_id: Arc<AtomicU64>,
}

impl ZabbixClient {
    pub fn new(url: impl Into<String>, token: impl Into<String>, auth_mode: AuthMode) -> Result<Self> {
        Self::with_timeout(url, token, auth_mode, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        url: impl Into<String>,
        token: impl Into<String>,
        auth_mode: AuthMode,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            token: token.into(),
            auth_mode,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.auth_mode
    }

    /// Exchanges a username and password for a session id and switches the
    /// client to in-body authentication with it.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let params = serde_json::json!({ "username": username, "password": password });
        let result = self.request("user.login", params, false).await?;
        let session = result
            .as_str()
            .ok_or_else(|| LoadGenError::UnexpectedResponseError {
                method: "user.login".to_string(),
                message: format!("expected a session id string, got {}", result),
            })?;

        self.token = session.to_string();
        self.auth_mode = AuthMode::Body;
        tracing::debug!("🔑 Logged in as {}, using session authentication", username);
        Ok(())
    }

    /// Server version as reported by `apiinfo.version`.
    pub async fn api_version(&self) -> Result<String> {
        let result = self.request("apiinfo.version", Value::Array(vec![]), false).await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| LoadGenError::UnexpectedResponseError {
                method: "apiinfo.version".to_string(),
                message: format!("expected a version string, got {}", result),
            })
    }

    async fn request(&self, method: &str, params: Value, authenticated: bool) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let auth = (authenticated && self.auth_mode == AuthMode::Body).then_some(self.token.as_str());

        let envelope = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
            auth,
        };

        let mut request = self.client.post(&self.url).json(&envelope);
        if authenticated && self.auth_mode == AuthMode::Bearer {
            request = request.bearer_auth(&self.token);
        }

        tracing::debug!("📡 {} (id {})", method, id);
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Some frontends answer API errors with a non-2xx status and a
            // normal envelope; prefer the API error when there is one.
            if let Ok(RpcResponse { error: Some(error), .. }) = serde_json::from_str::<RpcResponse>(&body) {
                return Err(error.into_error(method));
            }
            return Err(LoadGenError::HttpStatusError {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }

        let envelope: RpcResponse = serde_json::from_str(&body)?;
        if let Some(error) = envelope.error {
            return Err(error.into_error(method));
        }

        envelope.result.ok_or_else(|| LoadGenError::UnexpectedResponseError {
            method: method.to_string(),
            message: "response has neither result nor error".to_string(),
        })
    }
}

#[async_trait]
impl ApiTransport for ZabbixClient {
    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        self.request(method, params, true).await
    }
}

fn truncate(body: &str, max: usize) -> String {
    if body.len() <= max {
        return body.to_string();
    }
    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
