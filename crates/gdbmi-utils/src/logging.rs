//! # Logging Utilities
//!
//! Logging setup for gdbmi using `tracing`.
//!
//! The client logs every MI line it reads and writes at `trace`, command
//! correlation and operation ordering at `debug`, and dropped malformed
//! lines at `warn`. Turn on `RUST_LOG=gdbmi_core=trace` to see the raw
//! conversation with gdb.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gdbmi_utils::init_logging;
//!
//! init_logging().expect("Failed to initialize logging");
//! tracing::info!("Session started");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Level filter (e.g. `RUST_LOG=debug`, `RUST_LOG=gdbmi_core=trace`)
//! - `GDBMI_LOG_FORMAT`: `json` or `pretty` (default: `pretty`)
//! - `GDBMI_LOG_FILE`: Optional path of an extra log file
//!
//! ## Interactive use
//!
//! The `gdbmi` prompt shares the terminal with gdb's output, so it logs to a
//! file only:
//!
//! ```rust,no_run
//! use gdbmi_utils::{init_logging_file_only, LogLevel};
//!
//! let path = init_logging_file_only(None, Some(LogLevel::Debug)).expect("Failed to initialize logging");
//! println!("logging to {}", path.display());
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, io};

use chrono::Utc;
use tracing::Level;
use tracing_appender::non_blocking::NonBlocking;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the output format.
pub const FORMAT_ENV: &str = "GDBMI_LOG_FORMAT";
/// Environment variable naming an extra log file.
pub const FILE_ENV: &str = "GDBMI_LOG_FILE";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(LoggingError::InvalidFormat(s.to_string())),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level (default)
    Info,
    /// Debug level
    Debug,
    /// Trace level, includes every MI line
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(LoggingError::InvalidLevel(s.to_string())),
        }
    }
}

/// Initialize logging from the environment
///
/// Logs to stdout, plus to `GDBMI_LOG_FILE` when set.
///
/// ## Errors
///
/// Returns an error if logging is already initialized or `GDBMI_LOG_FORMAT`
/// holds an unknown format.
pub fn init_logging() -> Result<(), LoggingError>
{
    let format = match env::var(FORMAT_ENV) {
        Ok(value) => value.parse()?,
        Err(_) => LogFormat::Pretty,
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));
    init_with(format, filter)
}

/// Initialize logging with an explicit level and format
///
/// ## Errors
///
/// Returns an error if logging is already initialized.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<(), LoggingError>
{
    init_with(format, EnvFilter::new(Level::from(level).to_string()))
}

/// Initialize logging to a file only
///
/// `path` defaults to `~/.gdbmi/<date>-gdbmi.log` (or the system temp
/// directory when there is no home). An explicit `level` wins over
/// `RUST_LOG`, which wins over `info`.
///
/// Returns the path of the log file.
///
/// ## Errors
///
/// Returns an error if the log directory cannot be created or logging is
/// already initialized.
pub fn init_logging_file_only(path: Option<PathBuf>, level: Option<LogLevel>) -> Result<PathBuf, LoggingError>
{
    let path = match path {
        Some(path) => path,
        None => default_log_file()?,
    };
    let filter = match level {
        Some(level) => EnvFilter::new(Level::from(level).to_string()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string())),
    };

    let writer = file_writer(&path, false);
    Registry::default()
        .with(file_layer(LogFormat::Pretty, writer).with_filter(filter))
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;
    Ok(path)
}

fn default_log_file() -> Result<PathBuf, LoggingError>
{
    let today = Utc::now().format("%Y-%m-%d");
    let dir = env::var_os("HOME").map_or_else(env::temp_dir, |home| PathBuf::from(home).join(".gdbmi"));
    std::fs::create_dir_all(&dir)?;
    Ok(dir.join(format!("{today}-gdbmi.log")))
}

fn init_with(format: LogFormat, filter: EnvFilter) -> Result<(), LoggingError>
{
    let mut layers = vec![console_layer(format).with_filter(filter.clone()).boxed()];
    if let Some(path) = env::var_os(FILE_ENV).map(PathBuf::from) {
        layers.push(file_layer(format, file_writer(&path, true)).with_filter(filter).boxed());
    }

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))
}

// The worker guard is leaked: logging lives as long as the process.
fn file_writer(path: &Path, daily: bool) -> NonBlocking
{
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let name = path.file_name().unwrap_or_default();
    let appender = if daily {
        tracing_appender::rolling::daily(dir, name)
    } else {
        tracing_appender::rolling::never(dir, name)
    };
    let (writer, guard) = tracing_appender::non_blocking(appender);
    std::mem::forget(guard);
    writer
}

fn console_layer(format: LogFormat) -> Box<dyn Layer<Registry> + Send + Sync>
{
    layer(format, io::stdout, true)
}

fn file_layer(format: LogFormat, writer: NonBlocking) -> Box<dyn Layer<Registry> + Send + Sync>
{
    layer(format, writer, false)
}

fn layer<W>(format: LogFormat, writer: W, ansi: bool) -> Box<dyn Layer<Registry> + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let base = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::rfc_3339());
    match format {
        LogFormat::Pretty => base.with_ansi(ansi).boxed(),
        LogFormat::Json => base.json().with_current_span(true).with_span_list(true).boxed(),
    }
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}. Use 'pretty' or 'json'")]
    InvalidFormat(String),

    /// Invalid log level
    #[error("Invalid log level: {0}. Use 'error', 'warn', 'info', 'debug', or 'trace'")]
    InvalidLevel(String),

    /// A global subscriber is already set
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// Log file or directory error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_log_format_from_str()
    {
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!(matches!("xml".parse::<LogFormat>(), Err(LoggingError::InvalidFormat(f)) if f == "xml"));
    }

    #[test]
    fn test_log_level_from_str()
    {
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("trace".parse::<LogLevel>().unwrap(), LogLevel::Trace);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_log_level_to_tracing_level()
    {
        assert_eq!(Level::from(LogLevel::Error), Level::ERROR);
        assert_eq!(Level::from(LogLevel::Debug), Level::DEBUG);
        assert_eq!(Level::from(LogLevel::Trace), Level::TRACE);
    }

    #[test]
    fn test_default_log_file_is_dated()
    {
        let path = default_log_file().unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("-gdbmi.log"), "{name}");
        assert_eq!(name.len(), "YYYY-MM-DD-gdbmi.log".len());
    }
}
