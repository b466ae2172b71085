// Adapters layer: concrete implementations of the domain ports (HTTP API client, value sinks).

pub mod client;
pub mod sinks;

pub use client::{AuthMode, ZabbixClient};
pub use sinks::{ApiSink, NullSink, SenderSink, SinkKind};
