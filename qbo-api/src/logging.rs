//! Subscriber setup for applications built on the client
//!
//! The library only emits `tracing` events: request lines and classification
//! failures at `debug`, fault-probe doubts at `warn`, and raw bodies at
//! `trace` when [`ServiceConfig::log_bodies`](crate::ServiceConfig) is set.
//! Nothing is printed unless the application installs a subscriber, for
//! example through [`init_logging`].

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Filter used when neither `QBO_LOG_LEVEL` nor `RUST_LOG` is set
const CLIENT_TARGETS: &[&str] = &["qbo_api", "qbo_transport"];

/// How log events are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingMode {
    /// No subscriber is installed
    Silent,
    /// One compact stderr line per event at `info`
    Development,
    /// Every request and classification decision, with source locations
    Debug,
    /// One JSON object per event, for log collectors
    Json,
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),
}

/// Install a global subscriber for `mode`
///
/// `QBO_LOG_LEVEL` (then `RUST_LOG`) overrides the mode's default filter,
/// e.g. `QBO_LOG_LEVEL=qbo_api=trace` to see response bodies.
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    let filter = create_env_filter(mode, |key| std::env::var(key).ok());

    let installed = match mode {
        LoggingMode::Silent => return Ok(()),
        LoggingMode::Development => Registry::default()
            .with(fmt::layer().with_target(false).compact())
            .with(filter)
            .try_init(),
        LoggingMode::Debug => Registry::default()
            .with(fmt::layer().with_file(true).with_line_number(true))
            .with(filter)
            .try_init(),
        LoggingMode::Json => Registry::default()
            .with(fmt::layer().json().with_current_span(false))
            .with(filter)
            .try_init(),
    };
    installed.map_err(|e| LoggingError::TracingInit(e.to_string()))
}

/// Install a subscriber chosen by `QBO_LOG_MODE` (`development`, `debug`, `json`)
///
/// Any other value, or none, leaves logging silent.
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    init_logging(mode_from(std::env::var("QBO_LOG_MODE").ok().as_deref()))
}

fn mode_from(value: Option<&str>) -> LoggingMode {
    match value.map(str::to_ascii_lowercase).as_deref() {
        Some("development") => LoggingMode::Development,
        Some("debug") => LoggingMode::Debug,
        Some("json") => LoggingMode::Json,
        _ => LoggingMode::Silent,
    }
}

fn default_directives(mode: LoggingMode) -> String {
    let level = match mode {
        LoggingMode::Debug => "debug",
        _ => "info",
    };
    CLIENT_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",")
}

fn create_env_filter<F>(mode: LoggingMode, lookup: F) -> EnvFilter
where
    F: Fn(&str) -> Option<String>,
{
    let directives = lookup("QBO_LOG_LEVEL")
        .or_else(|| lookup("RUST_LOG"))
        .unwrap_or_else(|| default_directives(mode));
    EnvFilter::new(directives)
}

/// Whether a global subscriber has been installed
pub fn is_initialized() -> bool {
    tracing::dispatcher::has_been_set()
}
