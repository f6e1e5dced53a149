//! # gdbmi Utilities
//!
//! Ambient helpers shared by the gdbmi workspace: logging setup on top of
//! `tracing`.

pub mod logging;

pub use logging::{init_logging, init_logging_file_only, init_logging_with_level, LogFormat, LogLevel, LoggingError};
