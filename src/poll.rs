//! Recurring poll tasks and response ordering.

use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use strum::Display;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// Kind of recurring poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum PollKind {
    /// User list refresh.
    Users,
    /// Health check.
    Health,
}

impl PollKind {
    /// Static label for metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            PollKind::Users => "users",
            PollKind::Health => "health",
        }
    }
}

/// Issues sequence numbers to requests of one kind and decides which
/// responses may still be applied.
#[derive(Debug, Default)]
pub struct RequestTracker {
    issued: AtomicU64,
    applied: AtomicU64,
    outstanding: Arc<AtomicUsize>,
}

/// One issued request. Counts as outstanding until dropped.
#[derive(Debug)]
pub struct RequestTicket {
    seq: u64,
    outstanding: Arc<AtomicUsize>,
}

impl RequestTicket {
    /// Sequence number of this request.
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl Drop for RequestTicket {
    fn drop(&mut self) {
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RequestTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new request.
    pub fn begin(&self) -> RequestTicket {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        RequestTicket {
            seq: self.issued.fetch_add(1, Ordering::SeqCst) + 1,
            outstanding: Arc::clone(&self.outstanding),
        }
    }

    /// Whether any request is still in flight.
    pub fn is_busy(&self) -> bool {
        self.outstanding.load(Ordering::SeqCst) > 0
    }

    /// Mark the ticket's response as applied.
    ///
    /// Returns `false` if a newer response was already applied, in which case
    /// the caller must drop this one.
    pub fn try_apply(&self, ticket: &RequestTicket) -> bool {
        self.applied.fetch_max(ticket.seq, Ordering::SeqCst) < ticket.seq
    }

    /// Sequence number of the last applied response.
    pub fn last_applied(&self) -> u64 {
        self.applied.load(Ordering::SeqCst)
    }
}

/// Handle to a running poll task.
#[derive(Debug)]
pub struct PollHandle {
    kind: PollKind,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Kind of poll this handle drives.
    pub fn kind(&self) -> PollKind {
        self.kind
    }

    /// Stop the poll. A request already in flight is dropped with the task.
    pub fn cancel(&self) {
        info!(kind = %self.kind, "Cancelling poll");
        self.task.abort();
    }

    /// Check if the task is still running.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

/// Spawn a task that runs `tick` now and then every `period`.
///
/// Each tick is awaited before the next one starts; ticks that fall due while
/// one is running are skipped, not queued.
pub fn spawn_poll<F, Fut>(kind: PollKind, period: Duration, mut tick: F) -> PollHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let task = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            debug!(kind = %kind, "Poll tick");
            tick().await;
        }
    });

    PollHandle { kind, task }
}
