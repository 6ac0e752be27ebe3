use std::time::Duration;

use lockbench_api::ConfigError;

use crate::logging::LogConfig;

/// Default length of one time unit: the operator types durations in seconds.
pub const DEFAULT_TIME_UNIT: Duration = Duration::from_secs(1);

/// Default try-write timeout, in time units.
pub const DEFAULT_TRY_TIMEOUT_UNITS: u64 = 100;

/// Default number of await/awaken rounds a wait task performs.
pub const DEFAULT_WAIT_ITERATIONS: usize = 10;

/// Default grace period granted to in-flight tasks on quit, in time units.
pub const DEFAULT_GRACE_UNITS: u64 = 5;

// --- Pool Configuration ---

/// Sizing and queueing policy for the `WorkerPool`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Workers kept alive even when idle.
    pub core_pool_size: usize,

    /// Upper bound on live workers.
    pub maximum_pool_size: usize,

    /// Idle time after which a non-core worker retires.
    pub keep_alive: Duration,

    /// Work queue capacity; 0 means unbounded.
    pub queue_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        let cpus = num_cpus::get();
        Self {
            core_pool_size: cpus,
            maximum_pool_size: cpus * 2,
            keep_alive: Duration::from_secs(60),
            queue_capacity: 0,
        }
    }
}

impl PoolConfig {
    pub fn new(
        core_pool_size: usize,
        maximum_pool_size: usize,
        keep_alive: Duration,
        queue_capacity: usize,
    ) -> Self {
        Self {
            core_pool_size,
            maximum_pool_size,
            keep_alive,
            queue_capacity,
        }
    }

    /// Reject sizings no pool can honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.maximum_pool_size == 0 || self.maximum_pool_size < self.core_pool_size {
            return Err(ConfigError::InvalidPoolSize {
                core: self.core_pool_size,
                maximum: self.maximum_pool_size,
            });
        }
        Ok(())
    }

    /// `None` when the queue is unbounded.
    pub fn bounded_capacity(&self) -> Option<usize> {
        (self.queue_capacity > 0).then_some(self.queue_capacity)
    }
}

// --- Task Configuration ---

/// Timing parameters shared by every task the harness builds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskSettings {
    /// Length of one operator time unit.
    pub time_unit: Duration,

    /// How long a try-write task waits for the lock, in time units.
    pub try_timeout_units: u64,

    /// Await/awaken rounds performed by a wait task.
    pub wait_iterations: usize,
}

impl Default for TaskSettings {
    fn default() -> Self {
        Self {
            time_unit: DEFAULT_TIME_UNIT,
            try_timeout_units: DEFAULT_TRY_TIMEOUT_UNITS,
            wait_iterations: DEFAULT_WAIT_ITERATIONS,
        }
    }
}

impl TaskSettings {
    /// Convert a count of time units into a wall-clock duration.
    pub fn units(&self, units: u64) -> Duration {
        self.time_unit
            .saturating_mul(u32::try_from(units).unwrap_or(u32::MAX))
    }

    pub fn try_timeout(&self) -> Duration {
        self.units(self.try_timeout_units)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_unit.is_zero() {
            return Err(ConfigError::InvalidSetting(
                "time unit must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// --- Harness Configuration ---

/// Everything the command driver needs to start.
#[derive(Clone, Debug)]
pub struct HarnessConfig {
    pub pool: PoolConfig,

    pub tasks: TaskSettings,

    /// Time granted to in-flight tasks after quit, in time units.
    pub grace_units: u64,

    pub logging: LogConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            pool: PoolConfig::default(),
            tasks: TaskSettings::default(),
            grace_units: DEFAULT_GRACE_UNITS,
            logging: LogConfig::default(),
        }
    }
}

impl HarnessConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pool.validate()?;
        self.tasks.validate()
    }

    pub fn grace_period(&self) -> Duration {
        self.tasks.units(self.grace_units)
    }
}
