pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::{AuthMode, SinkKind, ZabbixClient};
pub use config::{PartialConfig, RunConfig};
pub use crate::core::engine::RunEngine;
pub use crate::core::load::{FailurePolicy, ItemSelection, LoadGenerator, LoadOptions, StopCondition};
pub use crate::core::provision::{ProvisionPlan, Provisioner};
pub use utils::error::{LoadGenError, Result};
