//! # Error Types
//!
//! Errors surfaced by the client.
//!
//! We use `thiserror` to generate the `Error` implementations. Only two
//! kinds of failure ever reach a caller through an operation:
//!
//! 1. **Command errors**: gdb answered the correlated command with `^error`
//! 2. **Process errors**: the channel to gdb is gone; every pending command
//!    is rejected with this and later commands fail immediately
//!
//! Malformed lines (see [`gdbmi_protocol::ParseError`]) are logged and
//! dropped by the reader and never show up here. [`GdbError::ScriptLoad`]
//! only comes out of [`crate::Gdb::init`].

use std::fmt;

use thiserror::Error;

/// gdb rejected a command with an `^error` result.
///
/// ```rust
/// use gdbmi_core::error::CommandError;
///
/// let err = CommandError {
///     command: "-data-evaluate-expression x".to_string(),
///     message: "No symbol \"x\" in current context.".to_string(),
///     code: Some("undefined-command".to_string()),
/// };
/// assert!(err.to_string().contains("No symbol"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandError
{
    /// Text of the command as it was written to gdb.
    pub command: String,
    /// `msg` field of the error record.
    pub message: String,
    /// `code` field of the error record, when gdb sent one.
    pub code: Option<String>,
}

impl fmt::Display for CommandError
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "'{}' failed: {}", self.command, self.message)?;
        if let Some(code) = &self.code {
            write!(f, " ({code})")?;
        }
        Ok(())
    }
}

impl std::error::Error for CommandError {}

/// Main error type for client operations
#[derive(Error, Debug, Clone)]
pub enum GdbError
{
    /// The correlated command finished with `^error`.
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// The channel to gdb closed or failed.
    ///
    /// Every command still waiting for its result is rejected with this
    /// error; the string describes why the channel ended.
    #[error("Debugger process error: {0}")]
    Process(String),

    /// An extension script was refused during [`crate::Gdb::init`].
    #[error("Failed to load extension script '{script}': {source}")]
    ScriptLoad
    {
        /// Asset name of the script.
        script: &'static str,
        /// Error gdb returned for the upload.
        #[source]
        source: Box<GdbError>,
    },

    /// A result arrived but did not have the shape the operation needs.
    #[error("Unexpected payload for '{command}': {reason}")]
    UnexpectedPayload
    {
        /// Command that produced the payload.
        command: String,
        /// What was missing or malformed.
        reason: String,
    },

    /// Interrupt was requested in synchronous mode but the transport has no
    /// way to signal the debugger process.
    #[error("Cannot interrupt: async mode is off and the transport cannot deliver signals")]
    NoInterruptTarget,

    /// I/O error on the transport.
    ///
    /// Stored as a string so the error stays `Clone`; one failure is
    /// delivered to many pending callers.
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for GdbError
{
    fn from(err: std::io::Error) -> Self
    {
        Self::Io(err.to_string())
    }
}

impl GdbError
{
    /// The command error, if this is one.
    #[must_use]
    pub fn as_command(&self) -> Option<&CommandError>
    {
        match self {
            Self::Command(err) => Some(err),
            _ => None,
        }
    }

    pub(crate) fn unexpected(command: impl Into<String>, reason: impl Into<String>) -> Self
    {
        Self::UnexpectedPayload {
            command: command.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for `Result<T, GdbError>`
///
/// ```rust
/// use gdbmi_core::error::Result;
/// fn foo() -> Result<()>
/// {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, GdbError>;
