//! Parallel execution settings.
//!
//! A [`ParallelConfig`] can be passed explicitly to the `*_with` matrix
//! methods, or installed once as the process-wide configuration that the
//! plain methods (`add`, `multiply`, ...) read. The process-wide value is
//! fixed after first use and never re-sampled.

use std::env;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::sync::OnceLock;

use thiserror::Error;

/// Element (or row) count at which operations switch to the parallel path.
pub const MIN_PARALLEL_SIZE: usize = 64;

/// Environment variable overriding [`ParallelConfig::parallel_threshold`].
pub const ENV_THRESHOLD: &str = "PARMAT_PARALLEL_THRESHOLD";
/// Environment variable overriding [`ParallelConfig::max_workers`].
pub const ENV_MAX_WORKERS: &str = "PARMAT_MAX_WORKERS";
/// Environment variable overriding [`ParallelConfig::dispatch`].
pub const ENV_DISPATCH: &str = "PARMAT_DISPATCH";
/// Environment variable overriding [`ParallelConfig::executor`].
pub const ENV_EXECUTOR: &str = "PARMAT_EXECUTOR";

/// Errors from building or installing a configuration.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment variable holds a value that cannot be parsed.
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidEnv {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
        /// What was expected.
        reason: &'static str,
    },

    /// A worker ceiling of zero was requested.
    #[error("max_workers must be at least 1")]
    ZeroWorkers,

    /// The process-wide configuration was already set or already read.
    #[error("the process-wide parallel configuration is already installed")]
    AlreadyInstalled,
}

/// How an operation chooses between the sequential and the parallel path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DispatchMode {
    /// Use the size threshold.
    #[default]
    Auto,
    /// Always run sequentially.
    Sequential,
    /// Run in parallel whenever there is at least one unit of work.
    Parallel,
}

impl FromStr for DispatchMode {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(DispatchMode::Auto),
            "sequential" | "seq" => Ok(DispatchMode::Sequential),
            "parallel" | "par" => Ok(DispatchMode::Parallel),
            _ => Err("expected one of auto, sequential, parallel"),
        }
    }
}

/// What runs the ranges of a parallel operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Executor {
    /// Tasks spawned into a `rayon::scope` on rayon's global pool.
    ///
    /// The pool's threads persist across calls; each call still joins all
    /// of its ranges before returning. Use [`Executor::ScopedThreads`] when
    /// no thread may outlive the operation.
    #[default]
    Rayon,
    /// One OS thread per range inside `std::thread::scope`, joined per call.
    ScopedThreads,
}

impl FromStr for Executor {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rayon" => Ok(Executor::Rayon),
            "threads" | "scoped" | "scoped-threads" => Ok(Executor::ScopedThreads),
            _ => Err("expected one of rayon, threads"),
        }
    }
}

/// Configuration for parallel matrix operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParallelConfig {
    /// Minimum size (elements for add/subtract, rows or columns for
    /// multiply/transpose) that enables the parallel path.
    pub parallel_threshold: usize,
    /// Upper bound on the number of workers launched per operation.
    pub max_workers: usize,
    /// Sequential/parallel selection policy.
    pub dispatch: DispatchMode,
    /// Backend running the parallel ranges.
    pub executor: Executor,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: MIN_PARALLEL_SIZE,
            max_workers: available_parallelism(),
            dispatch: DispatchMode::Auto,
            executor: Executor::Rayon,
        }
    }
}

impl ParallelConfig {
    /// Configuration that never launches workers.
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            dispatch: DispatchMode::Sequential,
            ..Self::default()
        }
    }

    /// Configuration that always takes the parallel path when there is work.
    #[must_use]
    pub fn parallel() -> Self {
        Self {
            dispatch: DispatchMode::Parallel,
            ..Self::default()
        }
    }

    /// Sets the parallel threshold.
    #[must_use]
    pub fn with_threshold(mut self, parallel_threshold: usize) -> Self {
        self.parallel_threshold = parallel_threshold;
        self
    }

    /// Sets the worker ceiling.
    #[must_use]
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Sets the dispatch mode.
    #[must_use]
    pub fn with_dispatch(mut self, dispatch: DispatchMode) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Sets the executor.
    #[must_use]
    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executor = executor;
        self
    }

    /// Checks the invariants the dispatch layer relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroWorkers`] if `max_workers` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(())
    }

    /// Worker ceiling with the floor of one applied.
    #[must_use]
    pub fn worker_ceiling(&self) -> usize {
        self.max_workers.max(1)
    }

    /// Builds a configuration from the `PARMAT_*` environment variables.
    ///
    /// Unset or empty variables keep their default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] for unparsable values and
    /// [`ConfigError::ZeroWorkers`] for `PARMAT_MAX_WORKERS=0`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(nonempty_var)
    }

    /// Like [`ParallelConfig::from_env`], reading variables through `lookup`.
    ///
    /// `lookup` returns `Ok(None)` for unset variables.
    ///
    /// # Errors
    ///
    /// Propagates errors from `lookup`, otherwise as [`ParallelConfig::from_env`].
    pub fn from_lookup<F>(mut lookup: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&'static str) -> Result<Option<String>, ConfigError>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_THRESHOLD)? {
            config.parallel_threshold = parse_var(ENV_THRESHOLD, &value, "expected an integer")?;
        }
        if let Some(value) = lookup(ENV_MAX_WORKERS)? {
            config.max_workers = parse_var(ENV_MAX_WORKERS, &value, "expected an integer")?;
        }
        if let Some(value) = lookup(ENV_DISPATCH)? {
            config.dispatch = parse_var(ENV_DISPATCH, &value, "expected auto, sequential or parallel")?;
        }
        if let Some(value) = lookup(ENV_EXECUTOR)? {
            config.executor = parse_var(ENV_EXECUTOR, &value, "expected rayon or threads")?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn nonempty_var(key: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(key) {
        Ok(s) if s.trim().is_empty() => Ok(None),
        Ok(s) => Ok(Some(s)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(s)) => Err(ConfigError::InvalidEnv {
            key,
            value: s.to_string_lossy().into_owned(),
            reason: "not unicode",
        }),
    }
}

fn parse_var<T: FromStr>(
    key: &'static str,
    value: &str,
    reason: &'static str,
) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key,
        value: value.to_owned(),
        reason,
    })
}

/// Hardware concurrency, sampled once per process and never zero.
#[must_use]
pub fn available_parallelism() -> usize {
    static CORES: OnceLock<usize> = OnceLock::new();
    *CORES.get_or_init(|| {
        std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
    })
}

static GLOBAL: OnceLock<ParallelConfig> = OnceLock::new();

/// Installs the process-wide configuration.
///
/// Must happen before the first operation that reads [`global`].
///
/// # Errors
///
/// Returns [`ConfigError::ZeroWorkers`] for an invalid config and
/// [`ConfigError::AlreadyInstalled`] if a configuration is already in place.
pub fn install(config: ParallelConfig) -> Result<(), ConfigError> {
    config.validate()?;
    log::debug!("installing parallel config: {config:?}");
    GLOBAL
        .set(config)
        .map_err(|_| ConfigError::AlreadyInstalled)
}

/// The process-wide configuration.
///
/// On first use without a prior [`install`], it is read from the
/// environment; malformed variables fall back to the defaults.
pub fn global() -> &'static ParallelConfig {
    GLOBAL.get_or_init(|| match ParallelConfig::from_env() {
        Ok(config) => {
            log::debug!("parallel config from environment: {config:?}");
            config
        }
        Err(err) => {
            log::warn!("ignoring parallel config from environment: {err}");
            ParallelConfig::default()
        }
    })
}
