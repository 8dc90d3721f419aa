//! Tracing subscriber setup.
//!
//! `RUST_LOG` takes precedence over the configured level, so per-module
//! filters such as `RUST_LOG=runi_application::event_bus=debug` work as
//! usual. The level can be changed at runtime with [`set_log_level`]
//! unless `RUST_LOG` was set.

use std::sync::OnceLock;

use parking_lot::Mutex;
use runi_domain::AppSettings;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter, Registry, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

type FilterHandle = reload::Handle<EnvFilter, Registry>;

static FILTER: OnceLock<FilterHandle> = OnceLock::new();
static LEVEL: Mutex<Level> = Mutex::new(Level::INFO);

/// Errors raised while configuring logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// The level name is not one of error, warn, info, debug, trace.
    #[error("invalid log level \"{0}\" (expected error, warn, info, debug or trace)")]
    InvalidLevel(String),

    /// The subscriber was installed by someone else and cannot be reloaded.
    #[error("logging is not managed by runi")]
    NotInitialized,

    /// Swapping the filter failed.
    #[error("failed to reload log filter: {0}")]
    Reload(#[from] reload::Error),
}

/// Subscriber options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Maximum level when `RUST_LOG` is unset.
    pub level: Level,
    /// Colored output.
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            ansi: true,
        }
    }
}

impl LoggingConfig {
    /// Builds the config from application settings.
    ///
    /// # Errors
    ///
    /// Returns `LoggingError::InvalidLevel` if `log_level` is unknown.
    pub fn from_settings(settings: &AppSettings) -> Result<Self, LoggingError> {
        Ok(Self {
            level: parse_level(&settings.log_level)?,
            ansi: settings.ansi_logs,
        })
    }
}

/// Parses a level name, case-insensitively.
///
/// # Errors
///
/// Returns `LoggingError::InvalidLevel` for anything but error, warn, info,
/// debug or trace.
pub fn parse_level(name: &str) -> Result<Level, LoggingError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "error" => Ok(Level::ERROR),
        "warn" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        _ => Err(LoggingError::InvalidLevel(name.to_string())),
    }
}

/// Installs the global subscriber.
///
/// Safe to call more than once. Returns `true` if this call installed the
/// subscriber and `false` if one was already in place.
pub fn init_logging(config: &LoggingConfig) -> bool {
    if FILTER.get().is_some() {
        return false;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str().to_ascii_lowercase()));
    let (filter_layer, handle) = reload::Layer::new(filter);

    let installed = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().with_ansi(config.ansi))
        .try_init()
        .is_ok();

    if installed && FILTER.set(handle).is_ok() {
        *LEVEL.lock() = config.level;
        tracing::debug!(level = %config.level, "logging initialized");
        return true;
    }
    false
}

/// Changes the maximum level at runtime.
///
/// # Errors
///
/// Returns `LoggingError::NotInitialized` if [`init_logging`] did not
/// install the current subscriber.
pub fn set_log_level(level: Level) -> Result<(), LoggingError> {
    let handle = FILTER.get().ok_or(LoggingError::NotInitialized)?;
    handle.reload(EnvFilter::new(level.as_str().to_ascii_lowercase()))?;
    *LEVEL.lock() = level;
    Ok(())
}

/// The last level set through this module.
#[must_use]
pub fn log_level() -> Level {
    *LEVEL.lock()
}
