//! # Grammar Parser
//!
//! Recursive-descent parser for one MI output line.
//!
//! ```text
//! line         := asyncRecord | streamRecord | resultRecord | terminator
//! resultRecord := token? '^' class (',' result)*
//! asyncRecord  := token? ('*'|'+'|'=') class (',' result)*
//! streamRecord := ('~'|'@'|'&') cstring
//! terminator   := '(gdb)'
//! result       := key '=' value
//! value        := cstring | tuple | list
//! tuple        := '{}' | '{' result (',' result)* '}'
//! list         := '[]' | '[' (value|result) (',' (value|result))* ']'
//! ```
//!
//! The leading token is accepted and discarded; gdbmi never sends one.
//!
//! gdb is not perfectly faithful to its own grammar: breakpoints with several
//! locations are reported as `bkpt={...},{...},{...}` with bare tuples in a
//! result list. A bare value in result position is kept under the key that
//! preceded it, so the record parses and correlation never loses a result.

use thiserror::Error;

use crate::quote::unescape_bytes;
use crate::record::{Channel, Record, Value};

/// A line that does not follow the MI grammar.
///
/// Callers drop the line and keep reading; a malformed line never ends the
/// stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed MI line at byte {offset}: {reason}")]
pub struct ParseError
{
    /// Byte offset where parsing stopped.
    pub offset: usize,
    /// What the parser expected.
    pub reason: String,
}

/// Parse one line of MI output.
///
/// Returns `Ok(None)` for the `(gdb)` terminator and for blank lines.
/// Trailing `\r` / `\n` are ignored.
///
/// ## Errors
///
/// Returns [`ParseError`] when the line does not match the grammar.
///
/// ## Example
///
/// ```rust
/// use gdbmi_protocol::{parse_line, Channel};
///
/// let record = parse_line("~\"Starting program\\n\"").unwrap().unwrap();
/// assert_eq!(record.channel, Channel::Console);
/// assert_eq!(record.text(), Some("Starting program\n"));
/// ```
pub fn parse_line(line: &str) -> Result<Option<Record>, ParseError>
{
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() || line.trim_end() == "(gdb)" {
        return Ok(None);
    }

    let mut cursor = Cursor::new(line);
    cursor.skip_token();

    let sigil = cursor.bump().ok_or_else(|| cursor.error("expected a record sigil"))?;
    let channel = Channel::from_sigil(sigil).ok_or_else(|| cursor.error(format!("unknown sigil {sigil:?}")))?;

    let record = if channel.is_stream() {
        let text = cursor.cstring()?;
        Record::stream(channel, text)
    } else {
        let class = cursor.word();
        if class.is_empty() {
            return Err(cursor.error("expected a record class"));
        }
        let mut results = Vec::new();
        while cursor.eat(',') {
            let (key, value) = cursor.result_or_bare(results.last())?;
            results.push((key, value));
        }
        Record {
            channel,
            class,
            data: Value::Tuple(results),
        }
    };

    if !cursor.at_end() {
        return Err(cursor.error("trailing characters after record"));
    }
    Ok(Some(record))
}

struct Cursor<'a>
{
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a>
{
    fn new(src: &'a str) -> Self
    {
        Self { src, pos: 0 }
    }

    fn error(&self, reason: impl Into<String>) -> ParseError
    {
        ParseError {
            offset: self.pos,
            reason: reason.into(),
        }
    }

    fn rest(&self) -> &'a str
    {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool
    {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char>
    {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char>
    {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool
    {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseError>
    {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected {expected:?}")))
        }
    }

    fn skip_token(&mut self)
    {
        let digits = self.rest().bytes().take_while(u8::is_ascii_digit).count();
        self.pos += digits;
    }

    /// Class names and result keys: everything up to `=`, `,` or a bracket.
    fn word(&mut self) -> String
    {
        let len = self
            .rest()
            .find(|c: char| matches!(c, '=' | ',' | '{' | '}' | '[' | ']' | '"'))
            .unwrap_or(self.rest().len());
        let word = &self.rest()[..len];
        self.pos += len;
        word.to_string()
    }

    fn cstring(&mut self) -> Result<String, ParseError>
    {
        self.expect('"')?;
        let bytes = self.rest().as_bytes();
        let mut end = None;
        let mut escaped = false;
        for (i, b) in bytes.iter().enumerate() {
            match (escaped, b) {
                (true, _) => escaped = false,
                (false, b'\\') => escaped = true,
                (false, b'"') => {
                    end = Some(i);
                    break;
                }
                _ => {}
            }
        }
        let end = end.ok_or_else(|| self.error("unterminated string"))?;
        let raw = &self.rest()[..end];
        self.pos += end + 1;
        Ok(String::from_utf8_lossy(&unescape_bytes(raw)).into_owned())
    }

    fn value(&mut self) -> Result<Value, ParseError>
    {
        match self.peek() {
            Some('"') => self.cstring().map(Value::String),
            Some('{') => self.tuple(),
            Some('[') => self.list(),
            _ => Err(self.error("expected a value")),
        }
    }

    fn result(&mut self) -> Result<(String, Value), ParseError>
    {
        let key = self.word();
        if key.is_empty() {
            return Err(self.error("expected a key"));
        }
        self.expect('=')?;
        Ok((key, self.value()?))
    }

    fn result_or_bare(&mut self, previous: Option<&(String, Value)>) -> Result<(String, Value), ParseError>
    {
        match (self.peek(), previous) {
            (Some('{' | '[' | '"'), Some((key, _))) => Ok((key.clone(), self.value()?)),
            _ => self.result(),
        }
    }

    fn tuple(&mut self) -> Result<Value, ParseError>
    {
        self.expect('{')?;
        let mut entries: Vec<(String, Value)> = Vec::new();
        if self.eat('}') {
            return Ok(Value::Tuple(entries));
        }
        loop {
            let entry = self.result_or_bare(entries.last())?;
            entries.push(entry);
            if self.eat('}') {
                return Ok(Value::Tuple(entries));
            }
            self.expect(',')?;
        }
    }

    fn list(&mut self) -> Result<Value, ParseError>
    {
        self.expect('[')?;
        let mut items = Vec::new();
        if self.eat(']') {
            return Ok(Value::List(items));
        }
        loop {
            let item = match self.peek() {
                Some('"' | '{' | '[') => self.value()?,
                _ => self.result()?.1,
            };
            items.push(item);
            if self.eat(']') {
                return Ok(Value::List(items));
            }
            self.expect(',')?;
        }
    }
}
