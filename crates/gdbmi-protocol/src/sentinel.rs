//! # Extension Sentinels
//!
//! gdb's console channel is free text. The debugger-side extension scripts
//! get structured data out of it by writing self-delimiting markers:
//!
//! ```text
//! <gdbjs:cmd:<name> <json> <name>:cmd:gdbjs>        result of an extension command
//! <gdbjs:event:<name> <payload> <name>:event:gdbjs>  custom event
//! ```
//!
//! A command result is always written as one console record, so decoding is
//! a per-record scan with no reassembly. A single record may carry several
//! event markers.
//!
//! Sentinel scanning lives here and nowhere else: the grammar parser never
//! looks inside console text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as Json;
use thiserror::Error;

/// Tag shared by every marker the extension scripts write.
pub const SENTINEL_TAG: &str = "gdbjs";

static OPENING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<gdbjs:(cmd|event):([A-Za-z0-9_.\-]+) ").expect("sentinel pattern is valid"));

/// Result written by an extension command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput
{
    /// Extension command name, without the `gdbjs-` prefix.
    pub name: String,
    /// Decoded JSON payload.
    pub payload: Json,
}

/// Custom event written by a debugger-side hook.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSentinel
{
    /// Event name.
    pub name: String,
    /// Payload, decoded as JSON when possible and kept as a string otherwise.
    pub payload: Json,
}

/// A command marker whose payload is not valid JSON.
#[derive(Error, Debug)]
pub enum SentinelError
{
    /// The text between the markers failed to decode.
    #[error("extension command '{name}' wrote invalid JSON: {source}")]
    InvalidJson
    {
        /// Command name taken from the marker.
        name: String,
        /// Decoder error.
        source: serde_json::Error,
    },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind
{
    Cmd,
    Event,
}

impl Kind
{
    fn as_str(self) -> &'static str
    {
        match self {
            Self::Cmd => "cmd",
            Self::Event => "event",
        }
    }
}

/// Wrap `payload` the way an extension command reports its result.
#[must_use]
pub fn encode_command_output(name: &str, payload: &Json) -> String
{
    wrap(Kind::Cmd, name, &payload.to_string())
}

/// Wrap `payload` the way an event hook reports an event.
#[must_use]
pub fn encode_event(name: &str, payload: &Json) -> String
{
    wrap(Kind::Event, name, &payload.to_string())
}

fn wrap(kind: Kind, name: &str, body: &str) -> String
{
    let kind = kind.as_str();
    format!("<{SENTINEL_TAG}:{kind}:{name} {body} {name}:{kind}:{SENTINEL_TAG}>")
}

/// Find the command result carried by a console record, if any.
///
/// Returns `None` when the text holds no command marker.
///
/// ## Errors
///
/// Returns [`SentinelError::InvalidJson`] if a marker is present but its
/// payload does not decode.
pub fn find_command_output(text: &str) -> Option<Result<CommandOutput, SentinelError>>
{
    let (name, body) = scan(text, Kind::Cmd).into_iter().next()?;
    Some(match serde_json::from_str(body) {
        Ok(payload) => Ok(CommandOutput {
            name: name.to_string(),
            payload,
        }),
        Err(source) => Err(SentinelError::InvalidJson {
            name: name.to_string(),
            source,
        }),
    })
}

/// Every event marker in a console record, in order of appearance.
#[must_use]
pub fn find_events(text: &str) -> Vec<EventSentinel>
{
    scan(text, Kind::Event)
        .into_iter()
        .map(|(name, body)| EventSentinel {
            name: name.to_string(),
            payload: serde_json::from_str(body).unwrap_or_else(|_| Json::String(body.to_string())),
        })
        .collect()
}

fn scan(text: &str, kind: Kind) -> Vec<(&str, &str)>
{
    let mut found = Vec::new();
    let mut from = 0;
    while let Some(caps) = OPENING.captures_at(text, from) {
        let (Some(whole), Some(kind_match), Some(name)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            break;
        };
        from = whole.end();
        if kind_match.as_str() != kind.as_str() {
            continue;
        }
        let closing = format!(" {}:{}:{SENTINEL_TAG}>", name.as_str(), kind.as_str());
        // the payload may be empty, in which case the closing marker starts
        // at the space that ended the opening one
        let body_start = whole.end() - 1;
        let Some(offset) = text[body_start..].find(&closing) else {
            continue;
        };
        let body_end = body_start + offset;
        let body = if body_end > whole.end() { &text[whole.end()..body_end] } else { "" };
        found.push((name.as_str(), body));
        from = body_end + closing.len();
    }
    found
}
