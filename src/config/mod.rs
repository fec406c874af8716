pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
use crate::core::aggregate::DEFAULT_AGG_INTERVAL;
#[cfg(feature = "cli")]
use crate::core::{ConfigProvider, SinkFormat};
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "tweetgraph-etl")]
#[command(about = "Aggregate cached tweet search responses into tables and interaction edges")]
pub struct CliConfig {
    /// Directory holding the cached response JSON files
    #[arg(long, default_value = "./cache")]
    pub cache_dir: String,

    /// Directory the flushed batches are written to
    #[arg(long, default_value = "./output")]
    pub save_dir: String,

    /// Files per flush window
    #[arg(long, default_value_t = DEFAULT_AGG_INTERVAL)]
    pub agg_interval: usize,

    /// Encoding of the persisted batches
    #[arg(long, value_enum, default_value_t = SinkFormat::Json)]
    pub format: SinkFormat,

    /// Process only the first 10 files
    #[arg(long)]
    pub debug_mode: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log system resource usage during the run")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn cache_dir(&self) -> &str {
        &self.cache_dir
    }

    fn save_dir(&self) -> &str {
        &self.save_dir
    }

    fn agg_interval(&self) -> usize {
        self.agg_interval
    }

    fn sink_format(&self) -> SinkFormat {
        self.format
    }

    fn debug_mode(&self) -> bool {
        self.debug_mode
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("cache_dir", &self.cache_dir)?;
        validation::validate_path("save_dir", &self.save_dir)?;
        validation::validate_positive_number("agg_interval", self.agg_interval, 1)?;
        Ok(())
    }
}
