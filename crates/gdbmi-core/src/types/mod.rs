//! # Types
//!
//! Domain value objects returned by client operations and carried by events.
//!
//! Every value is a snapshot built fresh from a gdb answer. Nothing here
//! holds a live reference to anything else: a thread names its group by
//! [`GroupId`], a breakpoint names its thread by [`ThreadId`]. Resolve those
//! with a new query when the current state is needed.
//!
//! Builders accept both shapes gdb data arrives in: MI results converted to
//! JSON (where every number is a string) and the JSON written by extension
//! commands (where numbers are numbers).

pub mod breakpoint;
pub mod process;
pub mod stack;
pub mod variable;

use std::str::FromStr;

use serde_json::Value as Json;

// Re-export all public types
pub use breakpoint::{Breakpoint, BreakpointId, FunctionName};
pub use process::{GroupId, Thread, ThreadGroup, ThreadId, ThreadStatus};
pub use stack::Frame;
pub use variable::{Variable, VariableScope};

/// String field of a JSON object.
pub(crate) fn str_field<'a>(value: &'a Json, key: &str) -> Option<&'a str>
{
    value.get(key).and_then(Json::as_str)
}

/// Numeric field that may arrive as a JSON number or a numeric string.
pub(crate) fn num_field<T: FromStr + TryFrom<u64>>(value: &Json, key: &str) -> Option<T>
{
    parse_num(value.get(key)?)
}

pub(crate) fn parse_num<T: FromStr + TryFrom<u64>>(value: &Json) -> Option<T>
{
    match value {
        Json::Number(n) => n.as_u64().and_then(|n| T::try_from(n).ok()),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests
{
    use serde_json::json;

    use super::*;

    #[test]
    fn test_num_field_accepts_strings_and_numbers()
    {
        let value = json!({"a": "12", "b": 7, "c": "x", "d": -1});
        assert_eq!(num_field::<u32>(&value, "a"), Some(12));
        assert_eq!(num_field::<u32>(&value, "b"), Some(7));
        assert_eq!(num_field::<u32>(&value, "c"), None);
        assert_eq!(num_field::<u32>(&value, "d"), None);
        assert_eq!(num_field::<u32>(&value, "missing"), None);
    }
}
