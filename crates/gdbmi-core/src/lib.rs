//! # gdbmi-core
//!
//! Asynchronous client for gdb's Machine Interface.
//!
//! gdb speaks one line-oriented text stream that mixes command results,
//! asynchronous notifications and free text. This crate turns it into:
//! - a request/response API ([`Gdb`]) where each call is correlated with
//!   its result by order of issue, since MI results carry no request id
//! - a typed event stream ([`GdbEvent`]) for target state changes
//! - structured extension commands (`gdbjs-*`), uploaded as Python scripts
//!   at [`Gdb::init`], whose JSON results travel through the console
//!
//! ## Selection state
//!
//! gdb has a single selected thread and inferior shared by every command.
//! Operations can be aimed at a [`Scope`]; the client either names the
//! target inline or switches selection, runs the command, and re-selects
//! the previous thread. Public operations run one at a time, in call order,
//! so no two operations ever interleave their switches.
//!
//! ## Errors
//!
//! Callers only ever see command errors (`^error` for their command) and
//! process errors (the channel to gdb is gone). Malformed lines are logged
//! and dropped.

pub mod client;
pub mod config;
pub mod correlator;
pub mod demux;
pub mod error;
pub mod events;
pub mod scope;
pub mod scripts;
pub mod serializer;
pub mod transport;
pub mod types;

pub use client::Gdb;
pub use config::ClientConfig;
pub use correlator::Interpreter;
pub use error::{CommandError, GdbError, Result};
pub use events::{EventStream, GdbEvent};
pub use scope::Scope;
pub use transport::{SignalTarget, Transport};
pub use types::{Breakpoint, BreakpointId, Frame, FunctionName, GroupId, Thread, ThreadGroup, ThreadId, ThreadStatus, Variable, VariableScope};
