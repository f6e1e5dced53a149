//! # Records
//!
//! Typed form of a single MI output line.
//!
//! Every line gdb writes on its MI channel is one of:
//!
//! | sigil | channel | meaning |
//! |---|---|---|
//! | `^` | [`Channel::Result`] | synchronous result of the oldest outstanding command |
//! | `*` | [`Channel::Exec`] | asynchronous execution state change (`stopped`, `running`) |
//! | `+` | [`Channel::Status`] | progress of a slow operation |
//! | `=` | [`Channel::Notify`] | supplementary notification (`thread-created`, ...) |
//! | `~` | [`Channel::Console`] | text meant for the user's console |
//! | `@` | [`Channel::Target`] | output of the program being debugged |
//! | `&` | [`Channel::Log`] | gdb's own diagnostics |
//!
//! plus the `(gdb)` terminator, which carries nothing and never becomes a
//! [`Record`].

use std::fmt;

use serde_json::{Map, Value as Json};

/// Channel a record arrived on, decided by its leading sigil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel
{
    /// `^` synchronous command results
    Result,
    /// `*` execution state changes
    Exec,
    /// `=` notifications
    Notify,
    /// `+` status updates
    Status,
    /// `~` console stream
    Console,
    /// `@` target stream
    Target,
    /// `&` log stream
    Log,
}

impl Channel
{
    /// Channel for a sigil character, if it is one.
    #[must_use]
    pub fn from_sigil(sigil: char) -> Option<Self>
    {
        match sigil {
            '^' => Some(Self::Result),
            '*' => Some(Self::Exec),
            '=' => Some(Self::Notify),
            '+' => Some(Self::Status),
            '~' => Some(Self::Console),
            '@' => Some(Self::Target),
            '&' => Some(Self::Log),
            _ => None,
        }
    }

    /// Sigil character that introduces this channel on the wire.
    #[must_use]
    pub fn sigil(self) -> char
    {
        match self {
            Self::Result => '^',
            Self::Exec => '*',
            Self::Notify => '=',
            Self::Status => '+',
            Self::Console => '~',
            Self::Target => '@',
            Self::Log => '&',
        }
    }

    /// `true` for the three free-text stream channels.
    #[must_use]
    pub fn is_stream(self) -> bool
    {
        matches!(self, Self::Console | Self::Target | Self::Log)
    }

    /// `true` for exec, notify and status records.
    #[must_use]
    pub fn is_async(self) -> bool
    {
        matches!(self, Self::Exec | Self::Notify | Self::Status)
    }
}

impl fmt::Display for Channel
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let name = match self {
            Self::Result => "result",
            Self::Exec => "exec",
            Self::Notify => "notify",
            Self::Status => "status",
            Self::Console => "console",
            Self::Target => "target",
            Self::Log => "log",
        };
        f.write_str(name)
    }
}

/// MI value: a c-string, a tuple of named values, or a list.
///
/// Tuples keep the order gdb wrote them in and may repeat a key. gdb does
/// that for breakpoints with several locations, so lookups return the first
/// match and [`Value::to_json`] folds repeats into an array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value
{
    /// Unescaped c-string contents.
    String(String),
    /// `{key=value,...}` (also used for a record's top-level result list)
    Tuple(Vec<(String, Value)>),
    /// `[value,...]` or `[key=value,...]`; keys inside lists are dropped.
    List(Vec<Value>),
}

impl Value
{
    /// An empty tuple, the payload of records without results.
    #[must_use]
    pub fn empty() -> Self
    {
        Self::Tuple(Vec::new())
    }

    /// First value stored under `key` when this is a tuple.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value>
    {
        match self {
            Self::Tuple(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// String contents, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str>
    {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Elements, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]>
    {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Convenience for `get(key).and_then(Value::as_str)`.
    #[must_use]
    pub fn str_field(&self, key: &str) -> Option<&str>
    {
        self.get(key).and_then(Value::as_str)
    }

    /// Convert into a JSON value.
    ///
    /// Strings stay strings (MI has no numbers), tuples become objects in
    /// wire order and lists become arrays. A key repeated inside a tuple is
    /// collected into an array holding every occurrence.
    #[must_use]
    pub fn to_json(&self) -> Json
    {
        match self {
            Self::String(s) => Json::String(s.clone()),
            Self::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Self::Tuple(entries) => {
                let mut map = Map::new();
                let mut folded: Vec<&str> = Vec::new();
                for (key, value) in entries {
                    let value = value.to_json();
                    match map.get_mut(key) {
                        None => {
                            map.insert(key.clone(), value);
                        }
                        Some(Json::Array(repeated)) if folded.contains(&key.as_str()) => repeated.push(value),
                        Some(existing) => {
                            let first = existing.take();
                            *existing = Json::Array(vec![first, value]);
                            folded.push(key);
                        }
                    }
                }
                Json::Object(map)
            }
        }
    }
}

/// One parsed MI output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record
{
    /// Channel selected by the sigil.
    pub channel: Channel,
    /// Result or async class (`done`, `stopped`, `thread-created`, ...).
    /// Empty for stream records.
    pub class: String,
    /// Result list as a tuple, or the unescaped text of a stream record.
    pub data: Value,
}

impl Record
{
    /// Build a stream record carrying `text`.
    #[must_use]
    pub fn stream(channel: Channel, text: impl Into<String>) -> Self
    {
        Self {
            channel,
            class: String::new(),
            data: Value::String(text.into()),
        }
    }

    /// Text of a console, target or log record.
    #[must_use]
    pub fn text(&self) -> Option<&str>
    {
        if self.channel.is_stream() {
            self.data.as_str()
        } else {
            None
        }
    }

    /// `true` for a `^error` result.
    #[must_use]
    pub fn is_error(&self) -> bool
    {
        self.channel == Channel::Result && self.class == "error"
    }
}

#[cfg(test)]
mod tests
{
    use serde_json::json;

    use super::*;

    fn s(text: &str) -> Value
    {
        Value::String(text.to_string())
    }

    #[test]
    fn test_sigil_round_trip()
    {
        for sigil in ['^', '*', '=', '+', '~', '@', '&'] {
            let channel = Channel::from_sigil(sigil).unwrap();
            assert_eq!(channel.sigil(), sigil);
        }
        assert_eq!(Channel::from_sigil('!'), None);
    }

    #[test]
    fn test_tuple_lookup_returns_first_match()
    {
        let value = Value::Tuple(vec![("a".into(), s("1")), ("a".into(), s("2"))]);
        assert_eq!(value.str_field("a"), Some("1"));
        assert_eq!(value.get("b"), None);
    }

    #[test]
    fn test_to_json_nested()
    {
        let value = Value::Tuple(vec![
            ("reason".into(), s("breakpoint-hit")),
            ("args".into(), Value::List(vec![s("x"), s("y")])),
            ("frame".into(), Value::Tuple(vec![("line".into(), s("12"))])),
        ]);
        assert_eq!(
            value.to_json(),
            json!({"reason": "breakpoint-hit", "args": ["x", "y"], "frame": {"line": "12"}})
        );
    }

    #[test]
    fn test_to_json_folds_repeated_keys()
    {
        let value = Value::Tuple(vec![
            ("bkpt".into(), Value::Tuple(vec![("number".into(), s("1"))])),
            ("bkpt".into(), Value::Tuple(vec![("number".into(), s("1.1"))])),
            ("bkpt".into(), Value::Tuple(vec![("number".into(), s("1.2"))])),
        ]);
        assert_eq!(
            value.to_json(),
            json!({"bkpt": [{"number": "1"}, {"number": "1.1"}, {"number": "1.2"}]})
        );
    }

    #[test]
    fn test_to_json_repeated_list_key_is_not_flattened()
    {
        let value = Value::Tuple(vec![
            ("x".into(), Value::List(vec![s("a")])),
            ("x".into(), Value::List(vec![s("b")])),
        ]);
        assert_eq!(value.to_json(), json!({"x": [["a"], ["b"]]}));
    }

    #[test]
    fn test_to_json_three_repeated_lists()
    {
        let value = Value::Tuple(vec![
            ("x".into(), Value::List(vec![s("a")])),
            ("x".into(), Value::List(vec![s("b")])),
            ("x".into(), Value::List(vec![s("c")])),
        ]);
        assert_eq!(value.to_json(), json!({"x": [["a"], ["b"], ["c"]]}));
    }

    #[test]
    fn test_stream_record_text()
    {
        let record = Record::stream(Channel::Console, "hello\n");
        assert_eq!(record.text(), Some("hello\n"));
        assert!(!record.is_error());
    }
}
