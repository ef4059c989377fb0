//! Delays a rapidly changing value until input goes quiet.
//!
//! At most one timer is pending at a time. Scheduling replaces it, so an
//! update for one key also discards a pending emission for another key.
//! Every emission carries a [`Ticket`]; the receiver hands it back through
//! [`DebounceScheduler::settle`] so an event that was already queued when
//! its timer got replaced is recognised and dropped.

use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket<K> {
    pub key: K,
    id: u64,
}

struct Pending<K> {
    ticket: Ticket<K>,
    handle: JoinHandle<()>,
}

pub struct DebounceScheduler<K, E> {
    delay: Duration,
    sink: UnboundedSender<E>,
    pending: Option<Pending<K>>,
    next_id: u64,
    closed: bool,
}

impl<K, E> DebounceScheduler<K, E>
where
    K: Copy + PartialEq + std::fmt::Debug + Send + 'static,
    E: Send + 'static,
{
    pub fn new(delay: Duration, sink: UnboundedSender<E>) -> Self {
        Self {
            delay,
            sink,
            pending: None,
            next_id: 0,
            closed: false,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Restarts the timer for `key`. When it fires, `make_event` builds the
    /// event that gets sent to the sink.
    pub fn schedule<F>(&mut self, key: K, make_event: F)
    where
        F: FnOnce(Ticket<K>) -> E + Send + 'static,
    {
        if self.closed {
            return;
        }
        self.cancel();

        self.next_id += 1;
        let ticket = Ticket {
            key,
            id: self.next_id,
        };
        let delay = self.delay;
        let sink = self.sink.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the owner was torn down
            let _ = sink.send(make_event(ticket));
        });
        debug!(?key, ?delay, "Debounce scheduled");
        self.pending = Some(Pending { ticket, handle });
    }

    /// Consumes `ticket` if it belongs to the live timer and to `active`.
    pub fn settle(&mut self, ticket: &Ticket<K>, active: K) -> bool {
        match &self.pending {
            Some(pending) if pending.ticket == *ticket => {
                self.pending = None;
                if ticket.key != active {
                    debug!(key = ?ticket.key, "Debounced value lost activity, dropped");
                    return false;
                }
                true
            }
            _ => {
                debug!(key = ?ticket.key, "Superseded debounce ticket dropped");
                false
            }
        }
    }

    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle.abort();
            debug!(key = ?pending.ticket.key, "Debounce cancelled");
        }
    }

    /// Cancels the pending timer and refuses further scheduling.
    pub fn shutdown(&mut self) {
        self.cancel();
        self.closed = true;
    }
}

impl<K, E> Drop for DebounceScheduler<K, E> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle.abort();
        }
    }
}
