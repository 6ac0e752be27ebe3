// Logging System for Lockbench
//
// This module provides a unified logging interface for the harness. It's built
// on top of the `tracing` ecosystem. All output goes to stderr so that stdout
// stays reserved for the operator console (prompts and pool reports).
//
// # Usage Examples
//
// ## Basic Initialization
//
// ```rust
// use lockbench::logging;
//
// // Initialize with default settings (INFO level, console output)
// logging::init_default();
//
// // Or initialize with custom settings
// let config = logging::LogConfig {
//     level: tracing::Level::DEBUG,
//     json_format: false,
//     ..Default::default()
// };
// logging::init(config);
// ```
//
// ## File Logging
//
// ```rust
// use lockbench::logging;
//
// let config = logging::LogConfig {
//     log_file: Some("lockbench.log".into()),
//     ..Default::default()
// };
// logging::init(config);
// ```
//
// ## Using Log Macros
//
// ```rust
// use lockbench::{log_pool, log_task, task_span};
//
// let span = task_span!("2b9c...", "READER-1", "READ");
// let _guard = span.enter();
//
// log_task!("READER-1", "started", duration_units = 3);
// log_pool!("worker_started", pool_size = 2);
// ```

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once};
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::Layered;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer, Registry};

/// Configuration for the logging system
///
/// # Examples
///
/// ```rust
/// use lockbench::logging::LogConfig;
/// use tracing::Level;
///
/// let custom_config = LogConfig {
///     level: Level::DEBUG,
///     json_format: true,
///     target_filters: Some("lockbench::pool=trace".to_string()),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: Level,
    /// Whether to use JSON format for logs
    pub json_format: bool,
    /// Whether to include file and line information
    pub show_file_line: bool,
    /// Whether to include thread name/id
    pub show_thread_info: bool,
    /// Target filter expressions (format: "target=level,target2=level2,...")
    pub target_filters: Option<String>,
    /// Optional file receiving a plain-text copy of every event
    pub log_file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            show_file_line: false,
            show_thread_info: true,
            target_filters: None,
            log_file: None,
        }
    }
}

// Initialization guard to ensure we only initialize once
static INIT: Once = Once::new();

/// Registry with the level filter applied, below the console and file layers.
type FilteredRegistry = Layered<EnvFilter, Registry>;

/// Initialize the logging system with the given configuration
///
/// Safe to call multiple times; only the first call takes effect. A log file
/// that cannot be opened is reported on stderr and logging continues without
/// it.
pub fn init(config: LogConfig) {
    INIT.call_once(|| {
        let file = config
            .log_file
            .as_deref()
            .and_then(|path| match open_log_file(path) {
                Ok(file) => Some(file),
                Err(err) => {
                    eprintln!(
                        "Error opening log file {}: {}; logging to stderr only",
                        path.display(),
                        err
                    );
                    None
                }
            });

        set_global_subscriber(build_subscriber(&config, file));
    });
}

/// Assemble the subscriber described by `config`.
///
/// Console output goes to stderr. When `file` is given, every event is also
/// appended to it as plain text.
pub fn build_subscriber(
    config: &LogConfig,
    file: Option<File>,
) -> Box<dyn Subscriber + Send + Sync> {
    let mut env_filter = EnvFilter::from_default_env().add_directive(config.level.into());

    if let Some(filters) = &config.target_filters {
        for filter in filters.split(',') {
            if let Ok(directive) = filter.trim().parse() {
                env_filter = env_filter.add_directive(directive);
            }
        }
    }

    let console: Box<dyn Layer<FilteredRegistry> + Send + Sync> = if config.json_format {
        fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(io::stderr)
            .with_thread_names(config.show_thread_info)
            .boxed()
    } else {
        fmt::layer()
            .with_ansi(atty::is(atty::Stream::Stderr))
            .with_writer(io::stderr)
            .with_file(config.show_file_line)
            .with_line_number(config.show_file_line)
            .with_thread_names(config.show_thread_info)
            .with_thread_ids(config.show_thread_info)
            .boxed()
    };

    // The file is opened once and shared by every event.
    let file_layer = file.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .with_thread_names(true)
            .with_thread_ids(true)
    });

    Box::new(
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console)
            .with(file_layer),
    )
}

fn set_global_subscriber<S>(subscriber: S)
where
    S: Subscriber + Send + Sync + 'static,
{
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Error setting global tracing subscriber: {}", err);
    }
}

/// Open `path` in append mode, creating it if needed.
pub fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Initialize default logging (INFO level, human-readable stderr output)
pub fn init_default() {
    init(LogConfig::default());
}

/// Initialize logging for testing
///
/// Only shows warnings and errors by default to keep test output clean.
///
/// # Examples
///
/// ```rust
/// use lockbench::logging;
///
/// #[test]
/// fn my_test() {
///     logging::init_test();
///     // Your test code...
/// }
/// ```
pub fn init_test() {
    let config = LogConfig {
        level: Level::WARN,
        json_format: false,
        show_file_line: true,
        show_thread_info: false,
        target_filters: None,
        log_file: None,
    };
    init(config);
}

/// Create a span for one task execution
///
/// # Examples
///
/// ```rust
/// use lockbench::task_span;
///
/// let span = task_span!("task-id", "A", "WRITE");
/// let _guard = span.enter();
/// ```
#[macro_export]
macro_rules! task_span {
    ($task_id:expr, $task_name:expr, $kind:expr) => {
        tracing::info_span!("task", id = %$task_id, name = %$task_name, kind = %$kind)
    };
}

/// Log task lifecycle and lock events
///
/// # Examples
///
/// ```rust
/// use lockbench::log_task;
///
/// log_task!("A", "started");
/// log_task!("A", "finished", duration_units = 3);
/// ```
#[macro_export]
macro_rules! log_task {
    ($task_name:expr, $event:expr) => {
        tracing::info!(task = %$task_name, event = $event)
    };
    ($task_name:expr, $event:expr, $($fields:tt)*) => {
        tracing::info!(task = %$task_name, event = $event, $($fields)*)
    };
}

/// Log worker pool events
///
/// # Examples
///
/// ```rust
/// use lockbench::log_pool;
///
/// log_pool!("job_queued", queue_size = 3);
/// ```
#[macro_export]
macro_rules! log_pool {
    ($event:expr) => {
        tracing::debug!(scheduler = "worker_pool", event = $event)
    };
    ($event:expr, $($fields:tt)*) => {
        tracing::debug!(scheduler = "worker_pool", event = $event, $($fields)*)
    };
}

// Re-export the most commonly used tracing macros for convenience
pub use tracing::{debug, error, info, trace, warn};
