//! Prompt command parsing.
//!
//! Each line is one command word plus arguments. Commands that accept a
//! scope take an optional trailing `@tN` (thread N) or `@iN` (inferior N).

use gdbmi_core::{BreakpointId, GroupId, Scope, ThreadId};

/// One parsed prompt line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request
{
    Break
    {
        location: String,
        thread: Option<ThreadId>,
    },
    Delete(BreakpointId),
    Run(Scope),
    Continue
    {
        reverse: bool,
        scope: Scope,
    },
    Step
    {
        kind: StepKind,
        reverse: bool,
        scope: Scope,
    },
    Interrupt(Scope),
    Threads(Scope),
    Thread(Option<ThreadId>),
    Groups,
    Group(Option<GroupId>),
    Backtrace(Scope),
    Locals(Scope),
    Sources
    {
        pattern: Option<String>,
        group: Option<GroupId>,
    },
    Print
    {
        expression: String,
        scope: Scope,
    },
    Python
    {
        source: String,
        scope: Scope,
    },
    Cli
    {
        command: String,
        scope: Scope,
    },
    Mi
    {
        command: String,
        scope: Scope,
    },
    Attach(u32),
    Detach(GroupId),
    Set
    {
        name: String,
        value: String,
    },
    Async,
    ForkFollow
    {
        child: bool,
    },
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind
{
    In,
    Over,
    Out,
}

/// Text printed by `help`.
pub const HELP: &str = "\
commands (append @tN or @iN to aim at a thread or inferior):
  break LOC [THREAD]   delete N          run            continue | rcontinue
  step | next | finish (prefix r for reverse)           interrupt
  threads  thread [N]  groups  group [N]  bt  locals    sources [REGEX] [iN]
  print EXPR   py SOURCE   cli COMMAND   mi COMMAND
  attach PID   detach N   set NAME VALUE   async   fork child|parent   quit";

/// Parse one line. `Ok(None)` for a blank line.
///
/// ## Errors
///
/// Returns a message for unknown commands and bad arguments.
pub fn parse(line: &str) -> Result<Option<Request>, String>
{
    let (line, scope) = split_scope(line.trim())?;
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    if word.is_empty() {
        return Ok(None);
    }

    let request = match word {
        "break" | "b" => {
            let mut args = rest.split_whitespace();
            let location = args.next().ok_or("break needs a location")?.to_string();
            let thread = args.next().map(number).transpose()?.map(ThreadId);
            Request::Break { location, thread }
        }
        "delete" | "d" => Request::Delete(BreakpointId(number(rest)?)),
        "run" | "r" => Request::Run(scope),
        "continue" | "c" => Request::Continue { reverse: false, scope },
        "rcontinue" | "rc" => Request::Continue { reverse: true, scope },
        "step" | "s" => step(StepKind::In, false, scope),
        "next" | "n" => step(StepKind::Over, false, scope),
        "finish" => step(StepKind::Out, false, scope),
        "rstep" => step(StepKind::In, true, scope),
        "rnext" => step(StepKind::Over, true, scope),
        "rfinish" => step(StepKind::Out, true, scope),
        "interrupt" | "int" => Request::Interrupt(scope),
        "threads" => Request::Threads(scope),
        "thread" => Request::Thread(optional(rest)?.map(ThreadId)),
        "groups" | "inferiors" => Request::Groups,
        "group" | "inferior" => Request::Group(optional(rest)?.map(GroupId)),
        "bt" | "backtrace" => Request::Backtrace(scope),
        "locals" | "context" => Request::Locals(scope),
        "sources" => {
            let mut pattern = None;
            let mut group = None;
            for arg in rest.split_whitespace() {
                match GroupId::parse(arg).filter(|_| arg.starts_with('i')) {
                    Some(id) => group = Some(id),
                    None => pattern = Some(arg.to_string()),
                }
            }
            Request::Sources { pattern, group }
        }
        "print" | "p" => Request::Print {
            expression: required(rest, "print needs an expression")?,
            scope,
        },
        "py" | "python" => Request::Python {
            source: required(rest, "py needs source")?,
            scope,
        },
        "cli" => Request::Cli {
            command: required(rest, "cli needs a command")?,
            scope,
        },
        "mi" => Request::Mi {
            command: required(rest, "mi needs a command")?,
            scope,
        },
        "attach" => Request::Attach(number(rest)?),
        "detach" => Request::Detach(GroupId::parse(rest).ok_or("detach needs an inferior number")?),
        "set" => {
            let (name, value) = rest.split_once(char::is_whitespace).ok_or("usage: set NAME VALUE")?;
            Request::Set {
                name: name.to_string(),
                value: value.trim().to_string(),
            }
        }
        "async" => Request::Async,
        "fork" => match rest {
            "child" => Request::ForkFollow { child: true },
            "parent" => Request::ForkFollow { child: false },
            _ => return Err("usage: fork child|parent".to_string()),
        },
        "help" | "?" => Request::Help,
        "quit" | "q" | "exit" => Request::Quit,
        other => return Err(format!("unknown command '{other}', try help")),
    };
    Ok(Some(request))
}

fn step(kind: StepKind, reverse: bool, scope: Scope) -> Request
{
    Request::Step { kind, reverse, scope }
}

fn split_scope(line: &str) -> Result<(&str, Scope), String>
{
    let Some((head, tail)) = line.rsplit_once('@') else {
        return Ok((line, Scope::None));
    };
    if tail.contains(char::is_whitespace) {
        return Ok((line, Scope::None));
    }
    let scope = match tail.split_at_checked(1) {
        Some(("t", id)) => Scope::Thread(ThreadId(number(id)?)),
        Some(("i", id)) => Scope::Group(GroupId(number(id)?)),
        _ => return Err(format!("bad scope '@{tail}', use @tN or @iN")),
    };
    Ok((head.trim_end(), scope))
}

fn number(text: &str) -> Result<u32, String>
{
    text.trim().parse().map_err(|_| format!("'{text}' is not a number"))
}

fn optional(text: &str) -> Result<Option<u32>, String>
{
    if text.is_empty() {
        Ok(None)
    } else {
        number(text).map(Some)
    }
}

fn required(text: &str, message: &str) -> Result<String, String>
{
    if text.is_empty() {
        Err(message.to_string())
    } else {
        Ok(text.to_string())
    }
}
