//! # Scope Resolver
//!
//! gdb keeps one selected thread and one selected inferior for the whole
//! session. An operation aimed at a particular thread or group either names
//! that target inline or changes the selection around the command.
//!
//! | scope  | structured command                  | textual command               |
//! |--------|-------------------------------------|-------------------------------|
//! | none   | as-is                               | as-is                         |
//! | thread | `--thread N` inline                 | select thread, run, restore   |
//! | group  | select inferior, run, restore       | select inferior, run, restore |
//!
//! MI can name a thread inline but has no per-group targeting, so group
//! scope always switches the selection. Only the prior *thread* is ever
//! restored, never the prior inferior.
//!
//! [`resolve`] is pure; the client executes the [`Plan`] it returns.

use gdbmi_protocol::quote;

use crate::correlator::Interpreter;
use crate::types::{GroupId, Thread, ThreadGroup, ThreadId};

/// Target of a scoped operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope
{
    /// Whatever gdb currently has selected.
    #[default]
    None,
    /// One thread.
    Thread(ThreadId),
    /// One thread group (inferior).
    Group(GroupId),
}

impl From<ThreadId> for Scope
{
    fn from(id: ThreadId) -> Self
    {
        Self::Thread(id)
    }
}

impl From<GroupId> for Scope
{
    fn from(id: GroupId) -> Self
    {
        Self::Group(id)
    }
}

impl From<&Thread> for Scope
{
    fn from(thread: &Thread) -> Self
    {
        Self::Thread(thread.id)
    }
}

impl From<&ThreadGroup> for Scope
{
    fn from(group: &ThreadGroup) -> Self
    {
        Self::Group(group.id)
    }
}

impl<T> From<Option<T>> for Scope
where
    T: Into<Scope>,
{
    fn from(value: Option<T>) -> Self
    {
        value.map_or(Self::None, Into::into)
    }
}

/// One command to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step
{
    /// Command text (unwrapped for textual commands).
    pub command: String,
    /// How the command is submitted.
    pub interpreter: Interpreter,
}

impl Step
{
    fn mi(command: String) -> Self
    {
        Self {
            command,
            interpreter: Interpreter::Mi,
        }
    }
}

/// Commands to run for one scoped operation, in order:
/// remember the current thread (if `restore_thread`), `select`, `run`,
/// then re-select the remembered thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan
{
    /// Selection change before the command.
    pub select: Option<Step>,
    /// The command itself, possibly decorated.
    pub run: Step,
    /// Whether the previously selected thread is re-selected afterwards.
    pub restore_thread: bool,
}

/// MI command selecting thread `id`.
#[must_use]
pub fn select_thread_command(id: ThreadId) -> String
{
    format!("-thread-select {id}")
}

/// MI command selecting inferior `id`.
///
/// MI has no group selection command; the console `inferior` command is
/// passed through `-interpreter-exec`.
#[must_use]
pub fn select_group_command(id: GroupId) -> String
{
    format!("-interpreter-exec console {}", quote(&format!("inferior {id}")))
}

/// Turn a scope plus command into the sequence of commands to submit.
///
/// ```rust
/// use gdbmi_core::scope::{resolve, Scope};
/// use gdbmi_core::types::ThreadId;
/// use gdbmi_core::Interpreter;
///
/// let plan = resolve(Scope::Thread(ThreadId(7)), "-exec-step", Interpreter::Mi);
/// assert_eq!(plan.run.command, "-exec-step --thread 7");
/// assert!(plan.select.is_none());
/// ```
#[must_use]
pub fn resolve(scope: Scope, command: &str, interpreter: Interpreter) -> Plan
{
    let run = Step {
        command: command.to_string(),
        interpreter,
    };
    match (scope, interpreter) {
        (Scope::None, _) => Plan {
            select: None,
            run,
            restore_thread: false,
        },
        (Scope::Thread(id), Interpreter::Mi) => Plan {
            select: None,
            run: Step::mi(with_option(command, &format!("--thread {id}"))),
            restore_thread: false,
        },
        (Scope::Thread(id), Interpreter::Console) => Plan {
            select: Some(Step::mi(select_thread_command(id))),
            run,
            restore_thread: true,
        },
        (Scope::Group(id), _) => Plan {
            select: Some(Step::mi(select_group_command(id))),
            run,
            restore_thread: true,
        },
    }
}

// MI options go right after the command name, before any parameters.
fn with_option(command: &str, option: &str) -> String
{
    match command.split_once(' ') {
        Some((name, rest)) => format!("{name} {option} {rest}"),
        None => format!("{command} {option}"),
    }
}
