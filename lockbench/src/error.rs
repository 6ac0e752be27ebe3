use lockbench_api::ConfigError;
use thiserror::Error;

/// Errors surfaced by the harness outside of task execution.
///
/// Task failures never reach this type: tasks report them and carry on.
/// Rejected submissions are reported to the operator, not raised.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Console I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Blocking shutdown task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type HarnessResult<T> = Result<T, HarnessError>;
