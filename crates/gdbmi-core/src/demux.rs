//! # Channel Demultiplexer
//!
//! Fans the parsed record stream out into independent branches, each
//! filtered by record channel.
//!
//! A branch sees every matching record published after it was created, in
//! publication order. Branches are unbounded, so a slow consumer never
//! blocks the reader or any other branch, and no branch consumes records
//! from another. Closing the demultiplexer ends every branch once its
//! buffered records are drained.

use std::ops::BitOr;
use std::sync::{Arc, Mutex, MutexGuard};

use gdbmi_protocol::{Channel, Record};
use tokio::sync::mpsc;

/// Set of record channels a branch is interested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSet(u8);

impl ChannelSet
{
    /// `^` results only.
    pub const RESULTS: Self = Self::of(Channel::Result);
    /// `*`, `=` and `+` records.
    pub const ASYNC_ALL: Self = Self(Self::of(Channel::Exec).0 | Self::of(Channel::Notify).0 | Self::of(Channel::Status).0);
    /// `~` console text.
    pub const CONSOLE: Self = Self::of(Channel::Console);
    /// `@` target output.
    pub const TARGET: Self = Self::of(Channel::Target);
    /// `&` gdb log text.
    pub const LOG: Self = Self::of(Channel::Log);

    /// Set holding a single channel.
    #[must_use]
    pub const fn of(channel: Channel) -> Self
    {
        let bit = match channel {
            Channel::Result => 0,
            Channel::Exec => 1,
            Channel::Notify => 2,
            Channel::Status => 3,
            Channel::Console => 4,
            Channel::Target => 5,
            Channel::Log => 6,
        };
        Self(1 << bit)
    }

    /// `true` if `channel` is in the set.
    #[must_use]
    pub const fn contains(self, channel: Channel) -> bool
    {
        self.0 & Self::of(channel).0 != 0
    }
}

impl BitOr for ChannelSet
{
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self
    {
        Self(self.0 | rhs.0)
    }
}

struct Subscriber
{
    filter: ChannelSet,
    tx: mpsc::UnboundedSender<Arc<Record>>,
}

#[derive(Default)]
struct State
{
    subscribers: Vec<Subscriber>,
    closed: bool,
}

/// Shared upstream of all branches.
#[derive(Default)]
pub struct Demux
{
    state: Mutex<State>,
}

impl Demux
{
    /// Create an open demultiplexer with no branches.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State>
    {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Derive a new branch starting at the current upstream position.
    ///
    /// A branch created after [`Demux::close`] ends immediately.
    pub fn branch(&self, filter: ChannelSet) -> Branch
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.lock();
        if !state.closed {
            state.subscribers.push(Subscriber { filter, tx });
        }
        Branch { filter, rx }
    }

    /// Deliver `record` to every branch whose filter matches.
    ///
    /// Branches whose receiving side was dropped are forgotten.
    pub fn publish(&self, record: Record)
    {
        let record = Arc::new(record);
        let mut state = self.lock();
        state.subscribers.retain(|sub| {
            if sub.tx.is_closed() {
                return false;
            }
            if sub.filter.contains(record.channel) {
                // a failed send means the receiver is gone; drop it next round
                let _ = sub.tx.send(Arc::clone(&record));
            }
            true
        });
    }

    /// End the upstream. Branches drain what they already hold, then end.
    pub fn close(&self)
    {
        let mut state = self.lock();
        state.closed = true;
        state.subscribers.clear();
    }

    /// Number of live branches.
    #[must_use]
    pub fn branch_count(&self) -> usize
    {
        let mut state = self.lock();
        state.subscribers.retain(|sub| !sub.tx.is_closed());
        state.subscribers.len()
    }
}

/// One filtered observation branch.
#[derive(Debug)]
pub struct Branch
{
    filter: ChannelSet,
    rx: mpsc::UnboundedReceiver<Arc<Record>>,
}

impl Branch
{
    /// Next matching record, or `None` once the upstream has closed and the
    /// branch is drained.
    pub async fn next(&mut self) -> Option<Arc<Record>>
    {
        self.rx.recv().await
    }

    /// Channels this branch receives.
    #[must_use]
    pub fn filter(&self) -> ChannelSet
    {
        self.filter
    }
}

/// Text of a stream channel (console, target or log), one record at a time.
#[derive(Debug)]
pub struct TextStream
{
    branch: Branch,
}

impl TextStream
{
    pub(crate) fn new(branch: Branch) -> Self
    {
        Self { branch }
    }

    /// Next chunk of text, or `None` once the channel has closed.
    pub async fn next(&mut self) -> Option<String>
    {
        loop {
            let record = self.branch.next().await?;
            if let Some(text) = record.text() {
                return Some(text.to_string());
            }
        }
    }
}
