// src/exec/tracker.rs

//! Ownership of background command executions.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::backend::Invoker;
use super::invocation::Invocation;

/// Identifier of one dispatched execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type RetentionSet = HashMap<TaskId, JoinHandle<()>>;

/// Shared between the tracker and every task it spawned.
struct Retention {
    tasks: Mutex<RetentionSet>,
    /// Woken every time the set becomes empty.
    idle: Notify,
}

impl Retention {
    fn lock(&self) -> MutexGuard<'_, RetentionSet> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, id: TaskId) {
        let mut tasks = self.lock();
        if tasks.remove(&id).is_some() {
            trace!(task = %id, remaining = tasks.len(), "released background task");
        }
        if tasks.is_empty() {
            self.idle.notify_waiters();
        }
    }
}

/// Removes its task from the retention set when dropped, which happens once
/// the task's future is dropped: after completion, panic or abort, or when
/// the runtime discards a task that never ran.
struct ReleaseOnDrop {
    retention: Arc<Retention>,
    id: TaskId,
}

impl Drop for ReleaseOnDrop {
    fn drop(&mut self) {
        self.retention.release(self.id);
    }
}

/// Spawns one Tokio task per invocation and keeps its handle until the task
/// is done.
///
/// Cloning is cheap; clones share the same retention set. The set is behind
/// a mutex because tasks complete on arbitrary runtime worker threads.
#[derive(Clone)]
pub struct TaskTracker {
    invoker: Arc<dyn Invoker>,
    retention: Arc<Retention>,
    next_id: Arc<AtomicU64>,
}

impl fmt::Debug for TaskTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskTracker")
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}

impl TaskTracker {
    pub fn new(invoker: Arc<dyn Invoker>) -> Self {
        Self {
            invoker,
            retention: Arc::new(Retention {
                tasks: Mutex::new(HashMap::new()),
                idle: Notify::new(),
            }),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Start `invocation` in the background and return immediately.
    ///
    /// The handle is in the retention set before the invocation starts
    /// running: the task waits on a start gate that is only opened after
    /// insertion.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn dispatch(&self, invocation: Invocation) -> TaskId {
        let id = TaskId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (start_tx, start_rx) = oneshot::channel::<()>();

        let release = ReleaseOnDrop {
            retention: Arc::clone(&self.retention),
            id,
        };
        let invoker = Arc::clone(&self.invoker);

        let handle = tokio::spawn(async move {
            let _release = release;
            if start_rx.await.is_err() {
                return;
            }
            invoker.invoke(&invocation).await;
        });

        self.retention.lock().insert(id, handle);
        debug!(task = %id, in_flight = self.in_flight(), "dispatched background task");

        if start_tx.send(()).is_err() {
            // Task was dropped before it could start.
            self.retention.release(id);
        }

        id
    }

    /// Number of executions currently in flight.
    pub fn in_flight(&self) -> usize {
        self.retention.lock().len()
    }

    /// Whether the execution with this id is still retained.
    pub fn is_tracked(&self, id: TaskId) -> bool {
        self.retention.lock().contains_key(&id)
    }

    /// Wait until no execution is in flight, or `timeout` elapses.
    ///
    /// Returns `true` if the set drained in time.
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        let drained = async {
            loop {
                let notified = self.retention.idle.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();
                if self.retention.lock().is_empty() {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, drained).await.is_ok()
    }
}
