#![forbid(unsafe_code)]

//! Cancellable deferred tasks.
//!
//! A step has two asynchronous boundaries: waiting for its target's next
//! layout pass, and the settle delay after the dim overlay is attached. Both
//! are modelled as a [`DeferredTask`] registered in a [`TaskRegistry`] under
//! a fresh [`TaskId`]. The host is handed only the id; when it fires the id
//! back, the registry hands the task out exactly once, and only if its
//! cancellation token is still live.
//!
//! # Invariants
//!
//! 1. Task ids are never reused within a registry.
//! 2. [`TaskRegistry::take`] removes the task, so a second firing finds
//!    nothing.
//! 3. A task whose token was cancelled is removed and reported as
//!    [`TaskLookup::Cancelled`], never as ready.

use std::fmt;

use ahash::AHashMap;
use web_time::{Duration, Instant};

use crate::cancellation::CancellationToken;
use crate::host::ElementId;

/// Identifier of a pending deferred task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    /// Raw numeric id, for hosts that key their timers by integer.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// What a deferred task is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// The element's next layout pass.
    Layout { element: ElementId },
    /// A fixed delay after the overlay was attached.
    Settle { delay: Duration },
}

impl TaskKind {
    /// Stable label for logs.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Layout { .. } => "layout",
            Self::Settle { .. } => "settle",
        }
    }
}

/// A registered task.
#[derive(Debug, Clone)]
pub struct DeferredTask {
    pub id: TaskId,
    pub kind: TaskKind,
    /// Index of the step that issued the task.
    pub step: usize,
    pub scheduled_at: Instant,
    token: CancellationToken,
}

impl DeferredTask {
    /// Whether the issuing step display has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Time since the task was registered.
    pub fn age(&self) -> Duration {
        self.scheduled_at.elapsed()
    }
}

/// Outcome of looking up a fired task.
#[derive(Debug, Clone)]
pub enum TaskLookup {
    /// The task is live and now consumed.
    Ready(DeferredTask),
    /// The task existed but its step was dismissed or torn down.
    Cancelled(DeferredTask),
    /// Unknown id, or the task already fired.
    Unknown,
}

/// Pending deferred tasks keyed by id.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    next_id: u64,
    pending: AHashMap<TaskId, DeferredTask>,
}

impl TaskRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task and return its id.
    pub fn issue(&mut self, kind: TaskKind, step: usize, token: CancellationToken) -> TaskId {
        self.next_id += 1;
        let id = TaskId(self.next_id);
        self.pending.insert(
            id,
            DeferredTask {
                id,
                kind,
                step,
                scheduled_at: Instant::now(),
                token,
            },
        );
        id
    }

    /// Consume a fired task.
    pub fn take(&mut self, id: TaskId) -> TaskLookup {
        match self.pending.remove(&id) {
            Some(task) if task.is_cancelled() => TaskLookup::Cancelled(task),
            Some(task) => TaskLookup::Ready(task),
            None => TaskLookup::Unknown,
        }
    }

    /// Drop a task without firing it. Returns it if it was pending.
    pub fn discard(&mut self, id: TaskId) -> Option<DeferredTask> {
        self.pending.remove(&id)
    }

    /// Drop every pending task, returning them sorted by id.
    pub fn drain(&mut self) -> Vec<DeferredTask> {
        let mut tasks: Vec<_> = self.pending.drain().map(|(_, task)| task).collect();
        tasks.sort_by_key(|task| task.id);
        tasks
    }

    /// Whether the id is still pending.
    pub fn contains(&self, id: TaskId) -> bool {
        self.pending.contains_key(&id)
    }

    /// Number of pending tasks.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Timer service provided by the host event loop.
///
/// The host fires scheduled tasks back through
/// [`Sequence::on_timer`](crate::sequence::Sequence::on_timer).
pub trait Scheduler {
    /// Fire `task` once after `delay`.
    fn schedule(&mut self, task: TaskId, delay: Duration);

    /// Forget a scheduled task. No-op if it already fired.
    fn cancel(&mut self, task: TaskId);
}
