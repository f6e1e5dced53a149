//! # Events
//!
//! Domain events derived from gdb's asynchronous records.
//!
//! gdb reports target state changes on its own schedule, interleaved with
//! command results: `*stopped` / `*running` on the exec channel,
//! `=thread-created` and friends on the notify channel, and custom events
//! that debugger-side hooks print into the console. [`derive`] turns one
//! record into zero or more [`GdbEvent`]s; the client publishes them on a
//! broadcast channel so every subscriber sees every event and nobody can
//! block the reader.

use gdbmi_protocol::sentinel::find_events;
use gdbmi_protocol::{Channel, Record};
use serde_json::Value as Json;
use tokio::sync::broadcast;
use tracing::warn;

use crate::types::{Breakpoint, BreakpointId, Frame, GroupId, Thread, ThreadGroup, ThreadId, ThreadStatus};

/// `thread-id` value meaning every thread.
const ALL_THREADS: &str = "all";

/// Event derived from gdb's asynchronous output.
#[derive(Debug, Clone, PartialEq)]
pub enum GdbEvent
{
    /// The target stopped.
    Stopped
    {
        /// gdb's stop reason (`breakpoint-hit`, `end-stepping-range`, ...).
        /// Absent for some stops, e.g. after `-exec-interrupt` on some targets.
        reason: Option<String>,
        /// Thread that stopped, with its innermost frame.
        thread: Option<Thread>,
        /// Breakpoint that was hit; only set for `breakpoint-hit`.
        breakpoint: Option<Breakpoint>,
    },
    /// The target resumed. `thread` is `None` when every thread resumed.
    Running
    {
        /// Thread that resumed.
        thread: Option<Thread>,
    },
    /// A thread appeared.
    ThreadCreated(Thread),
    /// A thread went away.
    ThreadExited(Thread),
    /// An inferior started running.
    ThreadGroupStarted(ThreadGroup),
    /// An inferior exited.
    ThreadGroupExited(ThreadGroup),
    /// Event emitted by a debugger-side hook.
    Custom
    {
        /// Event name.
        name: String,
        /// Decoded payload.
        payload: Json,
    },
}

impl GdbEvent
{
    /// Wire name of the event.
    #[must_use]
    pub fn name(&self) -> &str
    {
        match self {
            Self::Stopped { .. } => "stopped",
            Self::Running { .. } => "running",
            Self::ThreadCreated(_) => "thread-created",
            Self::ThreadExited(_) => "thread-exited",
            Self::ThreadGroupStarted(_) => "thread-group-started",
            Self::ThreadGroupExited(_) => "thread-group-exited",
            Self::Custom { name, .. } => name,
        }
    }

    /// Human-readable description of the event.
    #[must_use]
    pub fn describe(&self) -> String
    {
        match self {
            Self::Stopped {
                reason,
                thread,
                breakpoint,
            } => {
                let mut description = format!("Stopped: {}", reason.as_deref().unwrap_or("unknown reason"));
                if let Some(bp) = breakpoint {
                    description.push_str(&format!(" (breakpoint {})", bp.id));
                }
                if let Some(thread) = thread {
                    description.push_str(&format!(" (thread {})", thread.id));
                    if let Some(frame) = &thread.frame {
                        description.push_str(&format!(" at {}:{}", frame.file, frame.line));
                    }
                }
                description
            }
            Self::Running { thread: Some(thread) } => format!("Running (thread {})", thread.id),
            Self::Running { thread: None } => "Running (all threads)".to_string(),
            Self::ThreadCreated(thread) => format!("Thread {} created", thread.id),
            Self::ThreadExited(thread) => format!("Thread {} exited", thread.id),
            Self::ThreadGroupStarted(group) => match group.pid {
                Some(pid) => format!("Inferior {} started (pid {pid})", group.id),
                None => format!("Inferior {} started", group.id),
            },
            Self::ThreadGroupExited(group) => format!("Inferior {} exited", group.id),
            Self::Custom { name, payload } => format!("{name}: {payload}"),
        }
    }
}

/// Derive the events carried by one record.
///
/// Records that carry no event (results, target and log text, unknown
/// async classes) yield nothing.
///
/// ```rust
/// use gdbmi_core::events::{derive, GdbEvent};
/// use gdbmi_protocol::parse_line;
///
/// let record = parse_line(r#"*running,thread-id="all""#).unwrap().unwrap();
/// assert_eq!(derive(&record), vec![GdbEvent::Running { thread: None }]);
/// ```
#[must_use]
pub fn derive(record: &Record) -> Vec<GdbEvent>
{
    match record.channel {
        Channel::Exec => exec_event(record).into_iter().collect(),
        Channel::Notify => notify_event(record).into_iter().collect(),
        Channel::Console => record
            .text()
            .map(find_events)
            .unwrap_or_default()
            .into_iter()
            .map(|event| GdbEvent::Custom {
                name: event.name,
                payload: event.payload,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn exec_event(record: &Record) -> Option<GdbEvent>
{
    let data = record.data.to_json();
    match record.class.as_str() {
        "stopped" => {
            let reason = data.get("reason").and_then(Json::as_str).map(str::to_string);
            let frame = data.get("frame").and_then(Frame::from_json);
            let thread = thread_id(&data).map(|id| Thread {
                id,
                status: ThreadStatus::Stopped,
                group: None,
                frame: frame.clone(),
            });
            let breakpoint = if reason.as_deref() == Some("breakpoint-hit") {
                hit_breakpoint(&data, frame.as_ref())
            } else {
                None
            };
            Some(GdbEvent::Stopped {
                reason,
                thread,
                breakpoint,
            })
        }
        "running" => {
            let thread = thread_id(&data).map(|id| Thread {
                status: ThreadStatus::Running,
                ..Thread::new(id)
            });
            Some(GdbEvent::Running { thread })
        }
        _ => None,
    }
}

fn notify_event(record: &Record) -> Option<GdbEvent>
{
    let data = record.data.to_json();
    match record.class.as_str() {
        "thread-created" | "thread-exited" => {
            let id = ThreadId(crate::types::num_field(&data, "id")?);
            let group = data.get("group-id").and_then(GroupId::from_json);
            let thread = Thread::new(id).with_group(group);
            if record.class == "thread-created" {
                Some(GdbEvent::ThreadCreated(thread))
            } else {
                Some(GdbEvent::ThreadExited(thread))
            }
        }
        "thread-group-started" => ThreadGroup::from_json(&data).map(GdbEvent::ThreadGroupStarted),
        "thread-group-exited" => ThreadGroup::from_json(&data).map(GdbEvent::ThreadGroupExited),
        _ => None,
    }
}

fn thread_id(data: &Json) -> Option<ThreadId>
{
    match data.get("thread-id")? {
        Json::String(s) if s == ALL_THREADS => None,
        other => crate::types::parse_num(other).map(ThreadId),
    }
}

fn hit_breakpoint(data: &Json, frame: Option<&Frame>) -> Option<Breakpoint>
{
    let id = BreakpointId(crate::types::num_field(data, "bkptno")?);
    let mut breakpoint = Breakpoint::new(id);
    if let Some(frame) = frame {
        breakpoint.file = Some(frame.file.clone());
        breakpoint.line = Some(frame.line);
        breakpoint.func = frame.func.clone().map(crate::types::FunctionName::Single);
    }
    Some(breakpoint)
}

/// Subscription to the domain event stream.
///
/// Each subscription sees every event published after it was created.
#[derive(Debug)]
pub struct EventStream
{
    rx: broadcast::Receiver<GdbEvent>,
}

impl EventStream
{
    pub(crate) fn new(rx: broadcast::Receiver<GdbEvent>) -> Self
    {
        Self { rx }
    }

    /// Next event, or `None` once the channel to gdb has closed.
    ///
    /// A subscriber that falls more than the configured capacity behind
    /// loses the oldest events; the loss is logged and the stream goes on.
    pub async fn next(&mut self) -> Option<GdbEvent>
    {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "event subscriber lagging, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
