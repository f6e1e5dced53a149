//! # Command Queue & Correlator
//!
//! MI results carry no request id. gdb answers commands strictly in the
//! order it received them, so the n-th `^` record belongs to the n-th
//! command written. The queue records every command at the moment it is
//! written and pairs results with it in FIFO order.
//!
//! Textual (console) commands are different: their `^done` carries nothing.
//! The extension commands print their result as a sentinel on the console
//! channel, so those commands are resolved from the stream of decoded
//! sentinels instead, zipped in FIFO order against the textual commands
//! that completed without error.
//!
//! ```text
//!  writer ──push──▶ pending ──^result──▶ error?      ──▶ reject
//!                                 ├── structured   ──▶ resolve(payload)
//!                                 └── textual ──▶ awaiting ◀─zip─▶ outputs ◀── console sentinels
//! ```

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use gdbmi_protocol::sentinel::find_command_output;
use gdbmi_protocol::{quote, Record};
use serde_json::Value as Json;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::demux::Branch;
use crate::error::{CommandError, GdbError, Result};

/// Interpreter a command is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interpreter
{
    /// A native MI command (`-exec-step`, `-thread-info`, ...). The result
    /// record carries the payload.
    Mi,
    /// A console command, sent through `-interpreter-exec console`. The
    /// payload comes from the sentinel the extension command prints.
    Console,
}

impl Interpreter
{
    /// Text to write for `command` under this interpreter.
    ///
    /// ```rust
    /// use gdbmi_core::Interpreter;
    ///
    /// assert_eq!(Interpreter::Mi.wire_text("-thread-info"), "-thread-info");
    /// assert_eq!(
    ///     Interpreter::Console.wire_text("gdbjs-exec print \"x\""),
    ///     r#"-interpreter-exec console "gdbjs-exec print \"x\"""#
    /// );
    /// ```
    #[must_use]
    pub fn wire_text(self, command: &str) -> String
    {
        match self {
            Self::Mi => command.to_string(),
            Self::Console => format!("-interpreter-exec console {}", quote(command)),
        }
    }
}

type Responder = oneshot::Sender<Result<Json>>;

struct Pending
{
    command: String,
    interpreter: Interpreter,
    responder: Responder,
}

impl Pending
{
    fn settle(self, outcome: Result<Json>)
    {
        if self.responder.send(outcome).is_err() {
            debug!(command = %self.command, "caller stopped waiting for result");
        }
    }
}

#[derive(Default)]
struct State
{
    /// Written, no `^` record yet.
    pending: VecDeque<Pending>,
    /// Textual commands that got `^done` but not yet their sentinel.
    awaiting_output: VecDeque<Pending>,
    /// Sentinels that arrived before their command's `^done`.
    outputs: VecDeque<Result<Json>>,
    /// Set once the channel has terminated.
    closed: Option<String>,
}

impl State
{
    fn textual_outstanding(&self) -> bool
    {
        !self.awaiting_output.is_empty() || self.pending.iter().any(|p| p.interpreter == Interpreter::Console)
    }

    fn zip(&mut self)
    {
        while !self.awaiting_output.is_empty() && !self.outputs.is_empty() {
            if let (Some(waiter), Some(output)) = (self.awaiting_output.pop_front(), self.outputs.pop_front()) {
                debug!(command = %waiter.command, "resolved from console output");
                waiter.settle(output);
            }
        }
    }
}

/// FIFO of commands waiting for their result.
#[derive(Default)]
pub struct CommandQueue
{
    state: Mutex<State>,
}

impl CommandQueue
{
    /// Create an empty, open queue.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State>
    {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a command about to be written.
    ///
    /// Must be called under the same lock that serializes writes, right
    /// before the command text goes out, so that queue order equals wire
    /// order.
    ///
    /// ## Errors
    ///
    /// Returns [`GdbError::Process`] if the channel has already terminated.
    pub(crate) fn push(&self, command: &str, interpreter: Interpreter) -> Result<oneshot::Receiver<Result<Json>>>
    {
        let mut state = self.lock();
        if let Some(reason) = &state.closed {
            return Err(GdbError::Process(reason.clone()));
        }
        let (responder, rx) = oneshot::channel();
        state.pending.push_back(Pending {
            command: command.to_string(),
            interpreter,
            responder,
        });
        Ok(rx)
    }

    /// Number of commands still waiting for any part of their answer.
    #[must_use]
    pub fn outstanding(&self) -> usize
    {
        let state = self.lock();
        state.pending.len() + state.awaiting_output.len()
    }

    /// Pair a `^` record with the oldest pending command.
    pub fn on_result(&self, record: &Record)
    {
        let mut state = self.lock();
        let Some(pending) = state.pending.pop_front() else {
            warn!(class = %record.class, "result record with no pending command");
            return;
        };

        if record.is_error() {
            let error = CommandError {
                command: pending.command.clone(),
                message: record.data.str_field("msg").unwrap_or("unknown error").to_string(),
                code: record.data.str_field("code").map(str::to_string),
            };
            debug!(command = %pending.command, message = %error.message, "command failed");
            pending.settle(Err(GdbError::Command(error)));
            return;
        }

        match pending.interpreter {
            Interpreter::Mi => {
                debug!(command = %pending.command, class = %record.class, "command completed");
                pending.settle(Ok(record.data.to_json()));
            }
            Interpreter::Console => {
                state.awaiting_output.push_back(pending);
                state.zip();
            }
        }
    }

    /// Scan a console record for an extension command result.
    pub fn on_console(&self, record: &Record)
    {
        let Some(text) = record.text() else {
            return;
        };
        let Some(decoded) = find_command_output(text) else {
            return;
        };
        let mut state = self.lock();
        if !state.textual_outstanding() {
            warn!("extension output with no textual command outstanding, dropped");
            return;
        }
        let output = decoded
            .map(|output| output.payload)
            .map_err(|err| GdbError::unexpected("console output", err.to_string()));
        state.outputs.push_back(output);
        state.zip();
    }

    /// Terminate: reject everything still waiting and refuse new commands.
    pub fn close(&self, reason: &str)
    {
        let drained: Vec<Pending> = {
            let mut state = self.lock();
            if state.closed.is_none() {
                state.closed = Some(reason.to_string());
            }
            state.outputs.clear();
            let mut drained: Vec<Pending> = state.pending.drain(..).collect();
            drained.extend(state.awaiting_output.drain(..));
            drained
        };
        if !drained.is_empty() {
            warn!(count = drained.len(), %reason, "rejecting pending commands");
        }
        for pending in drained {
            pending.settle(Err(GdbError::Process(reason.to_string())));
        }
    }

    /// `true` once [`CommandQueue::close`] has run.
    #[must_use]
    pub fn is_closed(&self) -> bool
    {
        self.lock().closed.is_some()
    }

    /// Why the queue was closed.
    #[must_use]
    pub fn close_reason(&self) -> Option<String>
    {
        self.lock().closed.clone()
    }

    /// Drive the queue from a results + console branch until it ends.
    pub(crate) async fn run(&self, mut branch: Branch)
    {
        while let Some(record) = branch.next().await {
            if record.channel.is_stream() {
                self.on_console(&record);
            } else {
                self.on_result(&record);
            }
        }
    }
}

#[cfg(test)]
mod tests
{
    use gdbmi_protocol::sentinel::encode_command_output;
    use gdbmi_protocol::{parse_line, Channel};
    use serde_json::json;

    use super::*;

    fn record(line: &str) -> Record
    {
        parse_line(line).unwrap().unwrap()
    }

    fn console(text: &str) -> Record
    {
        Record::stream(Channel::Console, text)
    }

    #[tokio::test]
    async fn test_results_pair_in_submission_order()
    {
        let queue = CommandQueue::new();
        let first = queue.push("-a", Interpreter::Mi).unwrap();
        let second = queue.push("-b", Interpreter::Mi).unwrap();
        queue.on_result(&record(r#"^done,value="1""#));
        queue.on_result(&record(r#"^done,value="2""#));
        assert_eq!(first.await.unwrap().unwrap(), json!({"value": "1"}));
        assert_eq!(second.await.unwrap().unwrap(), json!({"value": "2"}));
        assert_eq!(queue.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_error_rejects_only_correlated_command()
    {
        let queue = CommandQueue::new();
        let ok = queue.push("-ok", Interpreter::Mi).unwrap();
        let bad = queue.push("-data-evaluate-expression x", Interpreter::Mi).unwrap();
        queue.on_result(&record("^done"));
        queue.on_result(&record(r#"^error,msg="No symbol \"x\" in current context.",code="undefined-command""#));

        assert!(ok.await.unwrap().is_ok());
        let err = bad.await.unwrap().unwrap_err();
        let command = err.as_command().unwrap();
        assert_eq!(command.command, "-data-evaluate-expression x");
        assert_eq!(command.code.as_deref(), Some("undefined-command"));
        assert_eq!(command.message, "No symbol \"x\" in current context.");
    }

    #[tokio::test]
    async fn test_textual_command_resolves_from_console_output()
    {
        let queue = CommandQueue::new();
        let mi = queue.push("-a", Interpreter::Mi).unwrap();
        let cli = queue.push("gdbjs-thread", Interpreter::Console).unwrap();
        queue.on_result(&record("^done"));
        queue.on_console(&console(&encode_command_output("thread", &json!({"id": 1}))));
        queue.on_result(&record("^done"));
        assert_eq!(mi.await.unwrap().unwrap(), json!({}));
        assert_eq!(cli.await.unwrap().unwrap(), json!({"id": 1}));
    }

    #[tokio::test]
    async fn test_output_after_result_still_pairs()
    {
        let queue = CommandQueue::new();
        let cli = queue.push("gdbjs-group", Interpreter::Console).unwrap();
        queue.on_result(&record("^done"));
        assert_eq!(queue.outstanding(), 1);
        queue.on_console(&console(&encode_command_output("group", &json!({"id": 2}))));
        assert_eq!(cli.await.unwrap().unwrap(), json!({"id": 2}));
    }

    #[tokio::test]
    async fn test_failed_textual_command_is_skipped_by_zip()
    {
        let queue = CommandQueue::new();
        let failing = queue.push("gdbjs-context", Interpreter::Console).unwrap();
        let working = queue.push("gdbjs-thread", Interpreter::Console).unwrap();
        queue.on_result(&record(r#"^error,msg="No frame selected.""#));
        queue.on_console(&console(&encode_command_output("thread", &json!(null))));
        queue.on_result(&record("^done"));
        assert!(failing.await.unwrap().is_err());
        assert_eq!(working.await.unwrap().unwrap(), json!(null));
    }

    #[tokio::test]
    async fn test_stray_output_is_dropped()
    {
        let queue = CommandQueue::new();
        queue.on_console(&console(&encode_command_output("thread", &json!(1))));
        let cli = queue.push("gdbjs-thread", Interpreter::Console).unwrap();
        queue.on_console(&console(&encode_command_output("thread", &json!(2))));
        queue.on_result(&record("^done"));
        assert_eq!(cli.await.unwrap().unwrap(), json!(2));
    }

    #[tokio::test]
    async fn test_plain_console_text_is_ignored()
    {
        let queue = CommandQueue::new();
        let cli = queue.push("gdbjs-exec", Interpreter::Console).unwrap();
        queue.on_console(&console("Breakpoint 1, main () at a.c:3\n"));
        queue.on_console(&console(&encode_command_output("exec", &json!("text"))));
        queue.on_result(&record("^done"));
        assert_eq!(cli.await.unwrap().unwrap(), json!("text"));
    }

    #[tokio::test]
    async fn test_close_rejects_everything_and_refuses_new_commands()
    {
        let queue = CommandQueue::new();
        let waiting = queue.push("-exec-continue", Interpreter::Mi).unwrap();
        let awaiting = queue.push("gdbjs-exec", Interpreter::Console).unwrap();
        queue.on_result(&record("^running"));
        queue.on_result(&record("^done"));
        queue.close("gdb exited");

        assert!(waiting.await.unwrap().is_ok());
        assert!(matches!(awaiting.await.unwrap(), Err(GdbError::Process(reason)) if reason == "gdb exited"));
        assert!(matches!(queue.push("-x", Interpreter::Mi), Err(GdbError::Process(_))));
        assert!(queue.is_closed());
    }

    #[tokio::test]
    async fn test_invalid_output_rejects_waiter()
    {
        let queue = CommandQueue::new();
        let cli = queue.push("gdbjs-context", Interpreter::Console).unwrap();
        queue.on_console(&console("<gdbjs:cmd:context {oops context:cmd:gdbjs>"));
        queue.on_result(&record("^done"));
        assert!(matches!(cli.await.unwrap(), Err(GdbError::UnexpectedPayload { .. })));
    }
}
