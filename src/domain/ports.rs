use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// One JSON-RPC call against the monitoring API, returning the raw `result`.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn call(&self, method: &str, params: Value) -> Result<Value>;
}

/// Somewhere a single metric value for a host/key can be delivered.
#[async_trait]
pub trait ValueSink: Send + Sync {
    async fn send(&self, host: &str, key: &str, value: &str) -> Result<()>;

    fn name(&self) -> &str;
}

#[async_trait]
impl<'a, T: ApiTransport + ?Sized> ApiTransport for &'a T {
    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        (**self).call(method, params).await
    }
}
