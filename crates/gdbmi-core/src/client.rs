//! # Client
//!
//! [`Gdb`] ties the pieces together:
//!
//! ```text
//!  reader task ──parse──▶ Demux ──results+console──▶ CommandQueue ──▶ callers
//!                           ├────async+console─────▶ derive ──▶ broadcast ──▶ subscribers
//!                           └────console/target/log──▶ raw text streams
//! ```
//!
//! Every public operation takes a [`Serializer`] ticket when it is *called*
//! (not when first polled), then runs its whole body, including any scope
//! switch and restore, before the next operation starts.
//!
//! ## Example
//!
//! ```rust,no_run
//! use gdbmi_core::{ClientConfig, Gdb, Scope, Transport};
//!
//! # async fn example(transport: Transport) -> gdbmi_core::Result<()> {
//! let gdb = Gdb::new(transport, ClientConfig::default());
//! gdb.init().await?;
//! let bp = gdb.add_breakpoint("main", None).await?;
//! gdb.run(Scope::None).await?;
//! let mut events = gdb.subscribe();
//! while let Some(event) = events.next().await {
//!     println!("{}", event.describe());
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use gdbmi_protocol::{parse_line, quote};
use serde_json::Value as Json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::config::ClientConfig;
use crate::correlator::{CommandQueue, Interpreter};
use crate::demux::{ChannelSet, Demux, TextStream};
use crate::error::{GdbError, Result};
use crate::events::{derive, EventStream, GdbEvent};
use crate::scope::{self, Scope};
use crate::scripts::{extension_command, python_command, SCRIPTS, SCRIPTS_VERSION};
use crate::serializer::Serializer;
use crate::transport::{BoxedReader, BoxedWriter, SignalTarget, Transport};
use crate::types::{
    num_field, str_field, Breakpoint, BreakpointId, Frame, GroupId, Thread, ThreadGroup, ThreadId, Variable,
};

type EventSlot = Arc<StdMutex<Option<broadcast::Sender<GdbEvent>>>>;

struct Inner
{
    writer: Mutex<BoxedWriter>,
    queue: Arc<CommandQueue>,
    demux: Arc<Demux>,
    /// Taken by the event task when the channel closes, which ends every
    /// subscription.
    events: EventSlot,
    serializer: Serializer,
    signal: Option<Arc<dyn SignalTarget>>,
    async_mode: AtomicBool,
    shutdown: CancellationToken,
    config: ClientConfig,
}

/// Handle to a gdb session speaking MI.
///
/// Cheap to clone; all clones share the session and its operation queue.
#[derive(Clone)]
pub struct Gdb
{
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Gdb
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        f.debug_struct("Gdb")
            .field("async_mode", &self.inner.async_mode.load(Ordering::Relaxed))
            .field("closed", &self.inner.queue.is_closed())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl Gdb
{
    /// Start a client over `transport`.
    ///
    /// Spawns the reader, correlator and event tasks, so this must be
    /// called from within a Tokio runtime. Call [`Gdb::init`] before using
    /// operations that depend on the extension commands.
    #[must_use]
    pub fn new(transport: Transport, config: ClientConfig) -> Self
    {
        let Transport { reader, writer, signal } = transport;
        let demux = Arc::new(Demux::new());
        let queue = Arc::new(CommandQueue::new());
        let shutdown = CancellationToken::new();
        let (sender, _) = broadcast::channel(config.event_capacity.max(1));
        let events: EventSlot = Arc::new(StdMutex::new(Some(sender.clone())));

        // Branches exist before the first line is read, so nothing is missed.
        let results = demux.branch(ChannelSet::RESULTS | ChannelSet::CONSOLE);
        let notifications = demux.branch(ChannelSet::ASYNC_ALL | ChannelSet::CONSOLE);

        let reader_task = tokio::spawn(read_loop(reader, Arc::clone(&demux)));

        {
            let queue = Arc::clone(&queue);
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                queue.run(results).await;
                let reason = reader_task
                    .await
                    .unwrap_or_else(|err| format!("reader task failed: {err}"));
                error!(%reason, "gdb channel closed");
                queue.close(&reason);
                shutdown.cancel();
            });
        }

        tokio::spawn(event_loop(notifications, sender, Arc::clone(&events)));

        Self {
            inner: Arc::new(Inner {
                writer: Mutex::new(writer),
                queue,
                demux,
                events,
                serializer: Serializer::new(),
                signal,
                async_mode: AtomicBool::new(false),
                shutdown,
                config,
            }),
        }
    }

    fn serialized<'a, T, F, Fut>(&'a self, body: F) -> impl Future<Output = Result<T>> + 'a
    where
        F: FnOnce(&'a Inner) -> Fut + 'a,
        Fut: Future<Output = Result<T>> + 'a,
        T: 'a,
    {
        let ticket = self.inner.serializer.ticket();
        let inner: &'a Inner = &self.inner;
        async move {
            ticket.ready().await;
            let outcome = body(inner).await;
            drop(ticket);
            outcome
        }
    }

    // ---- lifecycle ------------------------------------------------------

    /// Upload the extension scripts.
    ///
    /// ## Errors
    ///
    /// Returns [`GdbError::ScriptLoad`] naming the first script gdb refused;
    /// later scripts are not sent.
    pub fn init(&self) -> impl Future<Output = Result<()>> + '_
    {
        self.serialized(|inner| async move {
            if !inner.config.load_scripts {
                debug!("extension scripts disabled");
                return Ok(());
            }
            for script in SCRIPTS {
                let command = Interpreter::Console.wire_text(&python_command(script.source));
                inner
                    .submit(&command, Interpreter::Mi)
                    .await
                    .map_err(|err| GdbError::ScriptLoad {
                        script: script.name,
                        source: Box::new(err),
                    })?;
                debug!(script = script.name, "extension script loaded");
            }
            info!(version = SCRIPTS_VERSION, count = SCRIPTS.len(), "extension scripts loaded");
            Ok(())
        })
    }

    /// Ask gdb to quit.
    pub fn exit(&self) -> impl Future<Output = Result<()>> + '_
    {
        self.serialized(|inner| async move { inner.submit("-gdb-exit", Interpreter::Mi).await.map(drop) })
    }

    /// Resolves when the channel to gdb has terminated, with the error every
    /// pending command was rejected with.
    pub async fn closed(&self) -> GdbError
    {
        self.inner.shutdown.cancelled().await;
        GdbError::Process(self.inner.queue.close_reason().unwrap_or_default())
    }

    /// `true` once the channel to gdb has terminated.
    #[must_use]
    pub fn is_closed(&self) -> bool
    {
        self.inner.shutdown.is_cancelled()
    }

    /// Token cancelled when the channel to gdb terminates.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken
    {
        self.inner.shutdown.clone()
    }

    // ---- observation ----------------------------------------------------

    /// Subscribe to domain events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> EventStream
    {
        let slot = self.inner.events.lock().unwrap_or_else(PoisonError::into_inner);
        let rx = match slot.as_ref() {
            Some(sender) => sender.subscribe(),
            // already closed: a receiver whose sender is gone ends at once
            None => broadcast::channel(1).1,
        };
        EventStream::new(rx)
    }

    /// Raw text gdb writes to its console (`~`).
    #[must_use]
    pub fn console(&self) -> TextStream
    {
        TextStream::new(self.inner.demux.branch(ChannelSet::CONSOLE))
    }

    /// Raw output of the debugged program (`@`).
    #[must_use]
    pub fn target_output(&self) -> TextStream
    {
        TextStream::new(self.inner.demux.branch(ChannelSet::TARGET))
    }

    /// gdb's own log messages (`&`).
    #[must_use]
    pub fn log_output(&self) -> TextStream
    {
        TextStream::new(self.inner.demux.branch(ChannelSet::LOG))
    }

    /// `true` after a successful [`Gdb::enable_async`].
    #[must_use]
    pub fn is_async(&self) -> bool
    {
        self.inner.async_mode.load(Ordering::SeqCst)
    }

    // ---- settings -------------------------------------------------------

    /// `-gdb-set <name> <value>`.
    pub fn set_var(&self, name: &str, value: &str) -> impl Future<Output = Result<()>> + '_
    {
        let command = format!("-gdb-set {name} {value}");
        self.serialized(move |inner| async move { inner.submit(&command, Interpreter::Mi).await.map(drop) })
    }

    /// Follow the child (`true`) or the parent (`false`) after a fork.
    pub fn set_fork_follow(&self, child: bool) -> impl Future<Output = Result<()>> + '_
    {
        let mode = if child { "child" } else { "parent" };
        self.serialized(move |inner| async move {
            inner
                .submit(&format!("-gdb-set follow-fork-mode {mode}"), Interpreter::Mi)
                .await
                .map(drop)
        })
    }

    /// Switch to asynchronous, non-stop execution.
    ///
    /// Uses `mi-async` and falls back to the older `target-async` name.
    pub fn enable_async(&self) -> impl Future<Output = Result<()>> + '_
    {
        self.serialized(|inner| async move {
            if let Err(err) = inner.submit("-gdb-set mi-async on", Interpreter::Mi).await {
                debug!(%err, "mi-async refused, trying target-async");
                inner.submit("-gdb-set target-async on", Interpreter::Mi).await?;
            }
            inner.submit("-gdb-set non-stop on", Interpreter::Mi).await?;
            inner.async_mode.store(true, Ordering::SeqCst);
            info!("async non-stop mode enabled");
            Ok(())
        })
    }

    // ---- target ---------------------------------------------------------

    /// Attach to a running process.
    pub fn attach(&self, pid: u32) -> impl Future<Output = Result<()>> + '_
    {
        self.serialized(move |inner| async move {
            info!(pid, "attaching");
            inner.submit(&format!("-target-attach {pid}"), Interpreter::Mi).await.map(drop)
        })
    }

    /// Detach from the process of thread group `group`.
    pub fn detach(&self, group: GroupId) -> impl Future<Output = Result<()>> + '_
    {
        self.serialized(move |inner| async move {
            info!(%group, "detaching");
            inner
                .submit(&format!("-target-detach {}", group.mi()), Interpreter::Mi)
                .await
                .map(drop)
        })
    }

    /// Stop the target.
    ///
    /// In async mode this is `-exec-interrupt`; otherwise gdb is not
    /// reading commands while the target runs and the transport's signal
    /// target is used. A signal stops the whole of gdb, so `scope` only
    /// applies in async mode.
    ///
    /// ## Errors
    ///
    /// [`GdbError::NoInterruptTarget`] when async mode is off and the
    /// transport has no signal target.
    pub fn interrupt(&self, scope: Scope) -> impl Future<Output = Result<()>> + '_
    {
        self.serialized(move |inner| async move {
            if inner.async_mode.load(Ordering::SeqCst) {
                return inner.run(scope, "-exec-interrupt", Interpreter::Mi).await.map(drop);
            }
            let signal = inner.signal.as_ref().ok_or(GdbError::NoInterruptTarget)?;
            if scope != Scope::None {
                debug!(?scope, "scope ignored, a signal interrupts every thread");
            }
            debug!("interrupting with a signal");
            signal.interrupt().map_err(GdbError::from)
        })
    }

    // ---- threads --------------------------------------------------------

    /// Threads, all of them or those of one thread / group.
    pub fn threads(&self, scope: Scope) -> impl Future<Output = Result<Vec<Thread>>> + '_
    {
        self.serialized(move |inner| async move {
            match scope {
                Scope::None => inner.all_threads().await,
                Scope::Thread(id) => Ok(inner.all_threads().await?.into_iter().filter(|t| t.id == id).collect()),
                Scope::Group(group) => inner.group_threads(group).await,
            }
        })
    }

    /// The selected thread, if any.
    pub fn current_thread(&self) -> impl Future<Output = Result<Option<Thread>>> + '_
    {
        self.serialized(|inner| async move {
            let Some((id, group)) = inner.selected_thread().await? else {
                return Ok(None);
            };
            let info = inner.submit(&format!("-thread-info {id}"), Interpreter::Mi).await?;
            let thread = list(&info, "threads")
                .first()
                .and_then(|entry| Thread::from_json(entry, group))
                .unwrap_or_else(|| Thread::new(id).with_group(group));
            Ok(Some(thread))
        })
    }

    /// Select thread `id`.
    pub fn select_thread(&self, id: ThreadId) -> impl Future<Output = Result<()>> + '_
    {
        self.serialized(move |inner| async move {
            inner.submit(&scope::select_thread_command(id), Interpreter::Mi).await.map(drop)
        })
    }

    /// Every thread group (inferior).
    pub fn thread_groups(&self) -> impl Future<Output = Result<Vec<ThreadGroup>>> + '_
    {
        self.serialized(|inner| async move { inner.groups().await })
    }

    /// The selected thread group.
    pub fn current_thread_group(&self) -> impl Future<Output = Result<ThreadGroup>> + '_
    {
        self.serialized(|inner| async move {
            let command = extension_command("group", "");
            let value = inner.submit(&command, Interpreter::Console).await?;
            ThreadGroup::from_json(&value).ok_or_else(|| GdbError::unexpected(command, "no thread group"))
        })
    }

    /// Select thread group `id`.
    pub fn select_thread_group(&self, id: GroupId) -> impl Future<Output = Result<()>> + '_
    {
        self.serialized(move |inner| async move {
            inner.submit(&scope::select_group_command(id), Interpreter::Mi).await.map(drop)
        })
    }

    // ---- breakpoints ----------------------------------------------------

    /// Insert a breakpoint at `location` (`file.c:12`, `main`, ...),
    /// optionally restricted to one thread.
    pub fn add_breakpoint(&self, location: &str, thread: Option<ThreadId>) -> impl Future<Output = Result<Breakpoint>> + '_
    {
        let command = match thread {
            Some(id) => format!("-break-insert -p {id} {location}"),
            None => format!("-break-insert {location}"),
        };
        self.serialized(move |inner| async move {
            let result = inner.submit(&command, Interpreter::Mi).await?;
            let bp = result
                .get("bkpt")
                .and_then(Breakpoint::from_json)
                .ok_or_else(|| GdbError::unexpected(&command, "missing bkpt"))?;
            debug!(id = %bp.id, "breakpoint inserted");
            Ok(bp)
        })
    }

    /// Delete breakpoint `id`.
    pub fn remove_breakpoint(&self, id: BreakpointId) -> impl Future<Output = Result<()>> + '_
    {
        self.serialized(move |inner| async move {
            inner.submit(&format!("-break-delete {id}"), Interpreter::Mi).await.map(drop)
        })
    }

    // ---- execution ------------------------------------------------------

    fn exec(&self, command: &'static str, scope: Scope) -> impl Future<Output = Result<()>> + '_
    {
        self.serialized(move |inner| async move { inner.run(scope, command, Interpreter::Mi).await.map(drop) })
    }

    /// Step into the next line.
    pub fn step_in(&self, scope: Scope) -> impl Future<Output = Result<()>> + '_
    {
        self.exec("-exec-step", scope)
    }

    /// Run until the current function returns.
    pub fn step_out(&self, scope: Scope) -> impl Future<Output = Result<()>> + '_
    {
        self.exec("-exec-finish", scope)
    }

    /// Step over the next line.
    pub fn step_over(&self, scope: Scope) -> impl Future<Output = Result<()>> + '_
    {
        self.exec("-exec-next", scope)
    }

    /// Step backwards into the previous line.
    pub fn reverse_step_in(&self, scope: Scope) -> impl Future<Output = Result<()>> + '_
    {
        self.exec("-exec-step --reverse", scope)
    }

    /// Run backwards to the caller.
    pub fn reverse_step_out(&self, scope: Scope) -> impl Future<Output = Result<()>> + '_
    {
        self.exec("-exec-finish --reverse", scope)
    }

    /// Step backwards over the previous line.
    pub fn reverse_step_over(&self, scope: Scope) -> impl Future<Output = Result<()>> + '_
    {
        self.exec("-exec-next --reverse", scope)
    }

    /// Start the program.
    pub fn run(&self, scope: Scope) -> impl Future<Output = Result<()>> + '_
    {
        self.exec("-exec-run", scope)
    }

    /// Continue execution.
    pub fn proceed(&self, scope: Scope) -> impl Future<Output = Result<()>> + '_
    {
        self.exec("-exec-continue", scope)
    }

    /// Continue execution backwards.
    pub fn reverse_proceed(&self, scope: Scope) -> impl Future<Output = Result<()>> + '_
    {
        self.exec("-exec-continue --reverse", scope)
    }

    // ---- inspection -----------------------------------------------------

    /// Variables visible from the selected frame.
    pub fn context(&self, scope: Scope) -> impl Future<Output = Result<Vec<Variable>>> + '_
    {
        self.serialized(move |inner| async move {
            let value = inner
                .run(scope, &extension_command("context", ""), Interpreter::Console)
                .await?;
            Ok(value.as_array().into_iter().flatten().filter_map(Variable::from_json).collect())
        })
    }

    /// Call stack, innermost frame first. Frames without source
    /// information are left out.
    pub fn callstack(&self, scope: Scope) -> impl Future<Output = Result<Vec<Frame>>> + '_
    {
        self.serialized(move |inner| async move {
            let value = inner.run(scope, "-stack-list-frames", Interpreter::Mi).await?;
            Ok(list(&value, "stack").iter().filter_map(Frame::from_json).collect())
        })
    }

    /// Absolute paths of source files, of one group or of every group
    /// (deduplicated), optionally filtered by a regular expression.
    pub fn source_files(&self, group: Option<GroupId>, pattern: Option<&str>) -> impl Future<Output = Result<Vec<String>>> + '_
    {
        let command = extension_command("sources", pattern.unwrap_or_default());
        self.serialized(move |inner| async move {
            let groups = match group {
                Some(id) => vec![id],
                None => inner.groups().await?.into_iter().map(|g| g.id).collect(),
            };
            let mut seen = HashSet::new();
            let mut files = Vec::new();
            for id in groups {
                let value = inner.run(Scope::Group(id), &command, Interpreter::Console).await?;
                for path in value.as_array().into_iter().flatten().filter_map(Json::as_str) {
                    if seen.insert(path.to_string()) {
                        files.push(path.to_string());
                    }
                }
            }
            Ok(files)
        })
    }

    /// Evaluate an expression in the selected frame.
    pub fn evaluate(&self, expression: &str, scope: Scope) -> impl Future<Output = Result<String>> + '_
    {
        let command = format!("-data-evaluate-expression {}", quote(expression));
        self.serialized(move |inner| async move {
            let value = inner.run(scope, &command, Interpreter::Mi).await?;
            str_field(&value, "value")
                .map(str::to_string)
                .ok_or_else(|| GdbError::unexpected(&command, "missing value"))
        })
    }

    // ---- raw execution --------------------------------------------------

    /// Run Python `source` inside gdb and return what it printed.
    pub fn exec_py(&self, source: &str, scope: Scope) -> impl Future<Output = Result<String>> + '_
    {
        self.exec_text(python_command(source), scope)
    }

    /// Run a CLI command and return what it printed.
    pub fn exec_cli(&self, command: &str, scope: Scope) -> impl Future<Output = Result<String>> + '_
    {
        self.exec_text(command.to_string(), scope)
    }

    fn exec_text(&self, cli: String, scope: Scope) -> impl Future<Output = Result<String>> + '_
    {
        let command = extension_command("exec", &cli);
        self.serialized(move |inner| async move {
            let value = inner.run(scope, &command, Interpreter::Console).await?;
            match value {
                Json::String(text) => Ok(text),
                other => Err(GdbError::unexpected(&command, format!("expected text, got {other}"))),
            }
        })
    }

    /// Run extension command `gdbjs-<name> <arg>` and return its JSON result.
    pub fn exec_cmd(&self, name: &str, arg: &str, scope: Scope) -> impl Future<Output = Result<Json>> + '_
    {
        let command = extension_command(name, arg);
        self.serialized(move |inner| async move { inner.run(scope, &command, Interpreter::Console).await })
    }

    /// Run a raw MI command and return its result payload.
    pub fn exec_mi(&self, command: &str, scope: Scope) -> impl Future<Output = Result<Json>> + '_
    {
        let command = command.to_string();
        self.serialized(move |inner| async move { inner.run(scope, &command, Interpreter::Mi).await })
    }
}

impl Inner
{
    /// Queue `command` and write it. Never takes a serializer ticket.
    async fn submit(&self, command: &str, interpreter: Interpreter) -> Result<Json>
    {
        let rx = {
            let mut writer = self.writer.lock().await;
            let rx = self.queue.push(command, interpreter)?;
            let mut line = interpreter.wire_text(command);
            debug!(command, ?interpreter, "submitting command");
            trace!(line = %line, "write");
            line.push('\n');
            let written = async {
                writer.write_all(line.as_bytes()).await?;
                writer.flush().await
            }
            .await;
            if let Err(err) = written {
                self.queue.close(&format!("writing to gdb failed: {err}"));
            }
            rx
        };
        rx.await
            .unwrap_or_else(|_| Err(GdbError::Process("result channel dropped".to_string())))
    }

    /// Execute `command` under `scope` following the resolver's plan.
    async fn run(&self, scope: Scope, command: &str, interpreter: Interpreter) -> Result<Json>
    {
        let plan = scope::resolve(scope, command, interpreter);
        let prior = if plan.restore_thread {
            self.selected_thread().await?.map(|(id, _)| id)
        } else {
            None
        };
        if let Some(select) = &plan.select {
            self.submit(&select.command, select.interpreter).await?;
        }
        let outcome = self.submit(&plan.run.command, plan.run.interpreter).await;
        match prior {
            Some(id) => {
                let restored = self.submit(&scope::select_thread_command(id), Interpreter::Mi).await;
                let value = outcome?;
                restored?;
                Ok(value)
            }
            None => outcome,
        }
    }

    async fn selected_thread(&self) -> Result<Option<(ThreadId, Option<GroupId>)>>
    {
        let value = self
            .submit(&extension_command("thread", ""), Interpreter::Console)
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        let id = num_field(&value, "id")
            .map(ThreadId)
            .ok_or_else(|| GdbError::unexpected("gdbjs-thread", "missing id"))?;
        let group = value.get("group").and_then(GroupId::from_json);
        Ok(Some((id, group)))
    }

    async fn groups(&self) -> Result<Vec<ThreadGroup>>
    {
        let value = self.submit("-list-thread-groups", Interpreter::Mi).await?;
        Ok(list(&value, "groups").iter().filter_map(ThreadGroup::from_json).collect())
    }

    async fn group_threads(&self, group: GroupId) -> Result<Vec<Thread>>
    {
        let value = self
            .submit(&format!("-list-thread-groups {}", group.mi()), Interpreter::Mi)
            .await?;
        Ok(list(&value, "threads")
            .iter()
            .filter_map(|entry| Thread::from_json(entry, Some(group)))
            .collect())
    }

    async fn all_threads(&self) -> Result<Vec<Thread>>
    {
        let mut threads = Vec::new();
        for group in self.groups().await? {
            threads.extend(self.group_threads(group.id).await?);
        }
        Ok(threads)
    }
}

fn list<'a>(value: &'a Json, key: &str) -> &'a [Json]
{
    value.get(key).and_then(Json::as_array).map(Vec::as_slice).unwrap_or_default()
}

async fn read_loop(reader: BoxedReader, demux: Arc<Demux>) -> String
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let reason = loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break "gdb closed its output".to_string(),
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\r', '\n']);
                trace!(line, "read");
                match parse_line(line) {
                    Ok(Some(record)) => demux.publish(record),
                    Ok(None) => {}
                    Err(err) => warn!(%err, line, "dropping malformed line"),
                }
            }
            Err(err) => break format!("reading from gdb failed: {err}"),
        }
    };
    demux.close();
    reason
}

async fn event_loop(mut branch: crate::demux::Branch, sender: broadcast::Sender<GdbEvent>, slot: EventSlot)
{
    while let Some(record) = branch.next().await {
        for event in derive(&record) {
            trace!(event = event.name(), "event");
            // no subscribers is fine
            let _ = sender.send(event);
        }
    }
    slot.lock().unwrap_or_else(PoisonError::into_inner).take();
}
