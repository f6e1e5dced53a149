//! # Execution Serializer
//!
//! A ticketed mutex. Every public operation takes a ticket the moment it is
//! called and runs its whole body, scope switches included, only once all
//! earlier tickets are finished. Operations therefore complete in call
//! order and never interleave their sub-steps.
//!
//! A ticket counts as finished when it is dropped, whether the operation
//! ran to completion, failed, or its future was abandoned before its turn.
//! Abandoned operations never stall the queue.
//!
//! Code running under a ticket must not take another one: it would wait on
//! itself forever.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tracing::debug;

#[derive(Debug, Default)]
struct State
{
    next: u64,
    serving: u64,
    /// Finished tickets ahead of `serving`.
    done: BTreeSet<u64>,
}

/// Ordered queue of operations.
#[derive(Debug, Default)]
pub struct Serializer
{
    state: Mutex<State>,
    turn: Notify,
}

impl Serializer
{
    /// Create an idle serializer.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State>
    {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take the next ticket. Position in the queue is fixed now, not when
    /// the ticket is first awaited.
    pub fn ticket(&self) -> Ticket<'_>
    {
        let mut state = self.lock();
        let number = state.next;
        state.next += 1;
        debug!(ticket = number, "operation queued");
        Ticket {
            serializer: self,
            number,
        }
    }

    fn is_serving(&self, number: u64) -> bool
    {
        self.lock().serving == number
    }

    fn finish(&self, number: u64)
    {
        {
            let mut state = self.lock();
            state.done.insert(number);
            loop {
                let serving = state.serving;
                if !state.done.remove(&serving) {
                    break;
                }
                state.serving += 1;
            }
        }
        debug!(ticket = number, "operation finished");
        self.turn.notify_waiters();
    }
}

/// A place in the [`Serializer`] queue.
#[derive(Debug)]
pub struct Ticket<'a>
{
    serializer: &'a Serializer,
    number: u64,
}

impl Ticket<'_>
{
    /// Wait until every earlier ticket has finished.
    pub async fn ready(&self)
    {
        loop {
            let notified = self.serializer.turn.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.serializer.is_serving(self.number) {
                debug!(ticket = self.number, "operation started");
                return;
            }
            notified.await;
        }
    }

    /// Position in the queue.
    #[must_use]
    pub fn number(&self) -> u64
    {
        self.number
    }
}

impl Drop for Ticket<'_>
{
    fn drop(&mut self)
    {
        self.serializer.finish(self.number);
    }
}
