pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::cli::LocalStorage;

pub use crate::core::etl::AggregateEngine;
pub use domain::model::{Edge, RType, RunSummary, SinkFormat, Table};
pub use utils::error::{EtlError, Result};
