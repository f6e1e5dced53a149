//! # Scripting Bridge
//!
//! Python extensions uploaded into gdb by [`crate::Gdb::init`].
//!
//! They register the `gdbjs-*` console commands the client relies on for
//! data MI does not expose (current thread and inferior, visible symbols,
//! source files, captured CLI output) plus an event hook reporting object
//! file loads. Each script is sent as a single `python exec("...")` command.
//!
//! Order matters: `base` defines the command base class and the event
//! helper every later script uses.

use gdbmi_protocol::quote;

/// Revision of the script set. Bump when any asset changes.
pub const SCRIPTS_VERSION: u32 = 1;

/// Prefix of every extension command name.
pub const COMMAND_PREFIX: &str = "gdbjs-";

/// One embedded script asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Script
{
    /// Asset name, used in logs and errors.
    pub name: &'static str,
    /// Python source.
    pub source: &'static str,
}

/// Every asset, in upload order.
pub const SCRIPTS: &[Script] = &[
    Script {
        name: "base",
        source: include_str!("../scripts/base.py"),
    },
    Script {
        name: "exec",
        source: include_str!("../scripts/exec.py"),
    },
    Script {
        name: "context",
        source: include_str!("../scripts/context.py"),
    },
    Script {
        name: "thread",
        source: include_str!("../scripts/thread.py"),
    },
    Script {
        name: "group",
        source: include_str!("../scripts/group.py"),
    },
    Script {
        name: "sources",
        source: include_str!("../scripts/sources.py"),
    },
    Script {
        name: "events",
        source: include_str!("../scripts/events.py"),
    },
];

/// Python string literal holding `source` verbatim.
///
/// This is the same escaping MI c-strings use, which Python reads back
/// unchanged.
///
/// ```rust
/// use gdbmi_core::scripts::python_literal;
///
/// assert_eq!(python_literal("print(\"a\\n\")\n"), r#""print(\"a\\n\")\n""#);
/// ```
#[must_use]
pub fn python_literal(source: &str) -> String
{
    quote(source)
}

/// Console command that runs `source` in gdb's Python interpreter.
#[must_use]
pub fn python_command(source: &str) -> String
{
    format!("python exec({})", python_literal(source))
}

/// Console command invoking extension command `name` with `arg`.
#[must_use]
pub fn extension_command(name: &str, arg: &str) -> String
{
    if arg.is_empty() {
        format!("{COMMAND_PREFIX}{name}")
    } else {
        format!("{COMMAND_PREFIX}{name} {arg}")
    }
}
