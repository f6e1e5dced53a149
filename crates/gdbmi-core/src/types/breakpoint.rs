//! Breakpoint type.

use std::fmt;

use serde_json::Value as Json;

use super::process::ThreadId;
use super::{num_field, str_field};

/// gdb breakpoint number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BreakpointId(pub u32);

impl From<u32> for BreakpointId
{
    fn from(value: u32) -> Self
    {
        Self(value)
    }
}

impl fmt::Display for BreakpointId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.0)
    }
}

/// Function a breakpoint resolved to
///
/// A location inside a template resolves once per instantiation, so a
/// single breakpoint can sit in several functions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionName
{
    /// Exactly one function.
    Single(String),
    /// One entry per resolved location.
    Multiple(Vec<String>),
}

impl FunctionName
{
    /// All function names.
    #[must_use]
    pub fn names(&self) -> Vec<&str>
    {
        match self {
            Self::Single(name) => vec![name.as_str()],
            Self::Multiple(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

/// Snapshot of a breakpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint
{
    /// Breakpoint number.
    pub id: BreakpointId,
    /// Source file of the (first) location.
    pub file: Option<String>,
    /// Line of the (first) location.
    pub line: Option<u32>,
    /// Function(s) the breakpoint resolved to.
    pub func: Option<FunctionName>,
    /// Thread the breakpoint is restricted to; `None` means every thread.
    pub thread: Option<ThreadId>,
}

impl Breakpoint
{
    /// A breakpoint known only by number.
    #[must_use]
    pub fn new(id: BreakpointId) -> Self
    {
        Self {
            id,
            file: None,
            line: None,
            func: None,
            thread: None,
        }
    }

    /// Build from the `bkpt` field of a `-break-insert` result.
    ///
    /// Accepts the nested form (`bkpt={..., locations=[...]}`) as well as
    /// the older flat form where gdb repeats the `bkpt` key once per
    /// location, which arrives here as an array whose head is the parent.
    pub(crate) fn from_json(bkpt: &Json) -> Option<Self>
    {
        let (parent, locations): (&Json, Vec<&Json>) = match bkpt {
            Json::Array(items) => {
                let (head, rest) = items.split_first()?;
                (head, rest.iter().collect())
            }
            other => {
                let nested = other.get("locations").and_then(Json::as_array);
                (other, nested.map(|l| l.iter().collect()).unwrap_or_default())
            }
        };

        let id = parent.get("number").and_then(parse_number)?;
        let first_location = locations.first().copied();
        let source = |key: &str| {
            str_field(parent, key).or_else(|| first_location.and_then(|loc| str_field(loc, key)))
        };
        let file = source("fullname").or_else(|| source("file")).map(str::to_string);
        let line = num_field(parent, "line").or_else(|| first_location.and_then(|loc| num_field(loc, "line")));

        let func = match str_field(parent, "func") {
            Some(name) => Some(FunctionName::Single(name.to_string())),
            None => {
                let mut names: Vec<String> = locations
                    .iter()
                    .filter_map(|loc| str_field(loc, "func"))
                    .map(str::to_string)
                    .collect();
                match names.len() {
                    0 => None,
                    1 => names.pop().map(FunctionName::Single),
                    _ => Some(FunctionName::Multiple(names)),
                }
            }
        };

        Some(Self {
            id,
            file,
            line,
            func,
            thread: num_field(parent, "thread").map(ThreadId),
        })
    }
}

// Breakpoint numbers of sub-locations look like "1.2"; the parent number is
// the part before the dot.
fn parse_number(value: &Json) -> Option<BreakpointId>
{
    match value {
        Json::String(s) => s.split('.').next()?.parse().ok().map(BreakpointId),
        other => super::parse_num(other).map(BreakpointId),
    }
}
