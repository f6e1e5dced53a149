//! # gdbmi-protocol
//!
//! Wire-level pieces of the GDB Machine Interface (MI) as spoken by gdbmi.
//!
//! This crate knows nothing about processes, queues or tasks. It provides:
//! - [`Record`] / [`Value`]: the typed form of one MI output line
//! - [`parse_line`]: the grammar parser turning a line into a [`Record`]
//! - [`quote`]: MI c-string quoting for outbound commands
//! - [`sentinel`]: the `<gdbjs:...>` markers that extension commands and
//!   debugger-side event hooks write into the console channel
//!
//! ## Example
//!
//! ```rust
//! use gdbmi_protocol::{parse_line, Channel};
//!
//! let record = parse_line("^done,bkpt={number=\"1\",type=\"breakpoint\"}")
//!     .expect("valid line")
//!     .expect("not a terminator");
//! assert_eq!(record.channel, Channel::Result);
//! assert_eq!(record.class, "done");
//! ```

pub mod parser;
pub mod quote;
pub mod record;
pub mod sentinel;

pub use parser::{parse_line, ParseError};
pub use quote::{quote, unescape};
pub use record::{Channel, Record, Value};
pub use sentinel::{CommandOutput, EventSentinel, SentinelError};
