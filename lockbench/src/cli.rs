use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use lockbench_api::ConfigError;
use tracing::Level;

use crate::config::{
    HarnessConfig, PoolConfig, TaskSettings, DEFAULT_GRACE_UNITS, DEFAULT_TRY_TIMEOUT_UNITS,
    DEFAULT_WAIT_ITERATIONS,
};
use crate::logging::LogConfig;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Interactive bounded worker pool and shared lock harness
#[derive(Parser, Debug)]
#[command(name = "lockbench")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Core worker count
    pub core_cnt: usize,

    /// Maximum worker count (at least core_cnt, at least 1)
    pub max_cnt: usize,

    /// Idle time before a non-core worker retires, in time units
    pub keepalive: u64,

    /// Work queue capacity, 0 for unbounded
    pub queue_cnt: usize,

    /// Length of one time unit in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub time_unit_ms: u64,

    /// How long TRY tasks wait for the write lock, in time units
    #[arg(long, default_value_t = DEFAULT_TRY_TIMEOUT_UNITS)]
    pub try_timeout: u64,

    /// Await rounds performed by WAIT tasks
    #[arg(long, default_value_t = DEFAULT_WAIT_ITERATIONS)]
    pub wait_iterations: usize,

    /// Grace period for in-flight tasks after QUIT, in time units
    #[arg(long, default_value_t = DEFAULT_GRACE_UNITS)]
    pub grace: u64,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[arg(long, default_value = "info")]
    pub log_level: Level,

    /// Extra filter directives, e.g. "lockbench::pool=debug"
    #[arg(long)]
    pub log_filter: Option<String>,

    /// Also append logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Build and validate the harness configuration.
    pub fn into_config(self) -> Result<HarnessConfig, ConfigError> {
        let tasks = TaskSettings {
            time_unit: Duration::from_millis(self.time_unit_ms),
            try_timeout_units: self.try_timeout,
            wait_iterations: self.wait_iterations,
        };
        let pool = PoolConfig::new(
            self.core_cnt,
            self.max_cnt,
            tasks.units(self.keepalive),
            self.queue_cnt,
        );
        let config = HarnessConfig {
            pool,
            tasks,
            grace_units: self.grace,
            logging: LogConfig {
                level: self.log_level,
                json_format: self.log_format == LogFormat::Json,
                target_filters: self.log_filter,
                log_file: self.log_file,
                ..LogConfig::default()
            },
        };
        config.validate()?;
        Ok(config)
    }
}
