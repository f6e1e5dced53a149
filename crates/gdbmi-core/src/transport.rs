//! # Transport
//!
//! The client does not spawn gdb. Whoever owns the process hands over its
//! two pipes, plus optionally a way to interrupt it with a signal.

use std::fmt;
use std::io;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};

/// Something that can deliver an interrupt (`SIGINT`) to the debugger
/// process.
///
/// Used by [`crate::Gdb::interrupt`] when async mode is off: gdb does not
/// read commands while the target runs in synchronous mode, so the only way
/// to stop the target is a signal.
pub trait SignalTarget: Send + Sync
{
    /// Deliver the interrupt.
    ///
    /// ## Errors
    ///
    /// Returns the OS error if the signal cannot be delivered.
    fn interrupt(&self) -> io::Result<()>;
}

pub(crate) type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
pub(crate) type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// A live, bidirectional text channel to a gdb speaking MI.
///
/// ## Example
///
/// ```rust,no_run
/// use gdbmi_core::Transport;
/// use tokio::process::Command;
/// use std::process::Stdio;
///
/// # async fn example() -> std::io::Result<()> {
/// let mut child = Command::new("gdb")
///     .args(["--interpreter=mi2", "--quiet", "--nx"])
///     .stdin(Stdio::piped())
///     .stdout(Stdio::piped())
///     .spawn()?;
/// let stdout = child.stdout.take().expect("piped stdout");
/// let stdin = child.stdin.take().expect("piped stdin");
/// let transport = Transport::new(stdout, stdin);
/// # Ok(())
/// # }
/// ```
pub struct Transport
{
    pub(crate) reader: BoxedReader,
    pub(crate) writer: BoxedWriter,
    pub(crate) signal: Option<Arc<dyn SignalTarget>>,
}

impl Transport
{
    /// Wrap gdb's output (`reader`) and input (`writer`) streams.
    pub fn new<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            reader: Box::new(reader),
            writer: Box::new(writer),
            signal: None,
        }
    }

    /// Attach a signal target for interrupting in synchronous mode.
    #[must_use]
    pub fn with_signal(mut self, target: Arc<dyn SignalTarget>) -> Self
    {
        self.signal = Some(target);
        self
    }
}

impl fmt::Debug for Transport
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Transport")
            .field("signal", &self.signal.is_some())
            .finish_non_exhaustive()
    }
}
