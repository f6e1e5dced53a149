//! Thread and thread group types.

use std::fmt;

use serde_json::Value as Json;

use super::stack::Frame;
use super::{num_field, parse_num, str_field};

/// gdb's global thread number
///
/// This is the number gdb shows in `info threads` and accepts in
/// `--thread N` / `-thread-select N`, not the OS thread id.
///
/// ## Example
///
/// ```rust
/// use gdbmi_core::types::ThreadId;
///
/// let thread = ThreadId::from(3);
/// assert_eq!(thread.raw(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(pub u32);

impl ThreadId
{
    /// Get the raw thread number
    #[must_use]
    pub fn raw(self) -> u32
    {
        self.0
    }
}

impl From<u32> for ThreadId
{
    fn from(value: u32) -> Self
    {
        Self(value)
    }
}

impl fmt::Display for ThreadId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.0)
    }
}

/// Thread group (inferior) number
///
/// On the wire gdb prefixes group ids with a one character type tag
/// (`i1`, `i2`, ...). [`GroupId::parse`] strips it; [`GroupId::mi`] puts it
/// back for commands that expect the tagged form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(pub u32);

impl GroupId
{
    /// Get the raw inferior number
    #[must_use]
    pub fn raw(self) -> u32
    {
        self.0
    }

    /// Parse a tagged (`i1`) or plain (`1`) group id.
    ///
    /// ```rust
    /// use gdbmi_core::types::GroupId;
    ///
    /// assert_eq!(GroupId::parse("i7"), Some(GroupId(7)));
    /// assert_eq!(GroupId::parse("7"), Some(GroupId(7)));
    /// assert_eq!(GroupId::parse("i"), None);
    /// ```
    #[must_use]
    pub fn parse(text: &str) -> Option<Self>
    {
        let digits = match text.chars().next() {
            Some(c) if !c.is_ascii_digit() => &text[c.len_utf8()..],
            _ => text,
        };
        digits.parse().ok().map(Self)
    }

    /// Tagged form MI uses for groups (`-list-thread-groups i1`).
    #[must_use]
    pub fn mi(self) -> String
    {
        format!("i{}", self.0)
    }

    pub(crate) fn from_json(value: &Json) -> Option<Self>
    {
        match value {
            Json::String(s) => Self::parse(s),
            other => parse_num(other).map(Self),
        }
    }
}

impl From<u32> for GroupId
{
    fn from(value: u32) -> Self
    {
        Self(value)
    }
}

impl fmt::Display for GroupId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.0)
    }
}

/// Execution state of a thread as last reported by gdb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreadStatus
{
    /// The thread is executing.
    Running,
    /// The thread is stopped and can be inspected.
    Stopped,
    /// gdb did not say.
    Unknown,
}

impl ThreadStatus
{
    fn parse(state: Option<&str>) -> Self
    {
        match state {
            Some("running") => Self::Running,
            Some("stopped") => Self::Stopped,
            _ => Self::Unknown,
        }
    }
}

/// Snapshot of one thread
///
/// Two snapshots are equal when they describe the same thread number,
/// regardless of state captured at different times.
#[derive(Debug, Clone)]
pub struct Thread
{
    /// gdb thread number.
    pub id: ThreadId,
    /// Execution state.
    pub status: ThreadStatus,
    /// Owning thread group, when known.
    pub group: Option<GroupId>,
    /// Innermost frame, when the thread is stopped in code with line info.
    pub frame: Option<Frame>,
}

impl PartialEq for Thread
{
    fn eq(&self, other: &Self) -> bool
    {
        self.id == other.id
    }
}

impl Eq for Thread {}

impl Thread
{
    /// A thread known only by number.
    #[must_use]
    pub fn new(id: ThreadId) -> Self
    {
        Self {
            id,
            status: ThreadStatus::Unknown,
            group: None,
            frame: None,
        }
    }

    /// Attach the owning group.
    #[must_use]
    pub fn with_group(mut self, group: Option<GroupId>) -> Self
    {
        self.group = group;
        self
    }

    /// Build from an MI thread entry (`-thread-info`,
    /// `-list-thread-groups iN`): `{id, state, frame, ...}`.
    pub(crate) fn from_json(value: &Json, group: Option<GroupId>) -> Option<Self>
    {
        Some(Self {
            id: ThreadId(num_field(value, "id")?),
            status: ThreadStatus::parse(str_field(value, "state")),
            group,
            frame: value.get("frame").and_then(Frame::from_json),
        })
    }
}

/// Snapshot of one thread group (inferior)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadGroup
{
    /// Inferior number.
    pub id: GroupId,
    /// Path of the loaded executable.
    pub executable: Option<String>,
    /// OS process id, present only while the inferior is running.
    pub pid: Option<u32>,
}

impl ThreadGroup
{
    /// A group known only by number.
    #[must_use]
    pub fn new(id: GroupId) -> Self
    {
        Self {
            id,
            executable: None,
            pid: None,
        }
    }

    /// Build from `-list-thread-groups` entries, `=thread-group-*`
    /// notifications or the current-group extension command.
    pub(crate) fn from_json(value: &Json) -> Option<Self>
    {
        Some(Self {
            id: GroupId::from_json(value.get("id")?)?,
            executable: str_field(value, "executable").map(str::to_string),
            pid: num_field(value, "pid"),
        })
    }
}
