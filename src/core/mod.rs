pub mod engine;
pub mod load;
pub mod provision;

pub use crate::domain::model::{LoadReport, ProvisionReport, RunReport};
pub use crate::domain::ports::{ApiTransport, ValueSink};
pub use crate::utils::error::Result;
