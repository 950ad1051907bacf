// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A cooperative, single-thread-per-scheduler task scheduler (§4.1).
//!
//! Every [`Scheduler`] owns one dedicated OS thread. Tasks queued against it
//! — immediate or delayed — always run on that thread, so code that mutates
//! state reachable from scheduled callbacks never needs its own lock as
//! long as it only runs `runs_me()`-verified code. This mirrors the
//! original C scheduler's `prx_scheduler_queue`/`prx_scheduler_runs_me`
//! pair: one thread, a delay-ordered queue, no other synchronization
//! primitive required for tasks racing each other.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::ThreadId;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use edgeproxy_core::TimerId;

pub type TaskId = u64;
type TaskFn = Box<dyn FnOnce() + Send + 'static>;

struct TaskEntry {
    name: &'static str,
    key: Option<TimerId>,
    action: Option<TaskFn>,
}

struct Scheduled {
    run_at: Instant,
    id: TaskId,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.run_at == other.run_at && self.id == other.id
    }
}
impl Eq for Scheduled {}
impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the earliest run_at sorts first.
        other.run_at.cmp(&self.run_at).then_with(|| other.id.cmp(&self.id))
    }
}

enum Command {
    Queue { id: TaskId, name: &'static str, key: Option<TimerId>, action: TaskFn, run_at: Instant },
    Kill(TaskId),
    Clear(TimerId),
    ReleaseAll,
    Shutdown,
}

struct Worker {
    heap: BinaryHeap<Scheduled>,
    entries: HashMap<TaskId, TaskEntry>,
}

impl Worker {
    fn new() -> Self {
        Worker { heap: BinaryHeap::new(), entries: HashMap::new() }
    }

    fn insert(&mut self, id: TaskId, name: &'static str, key: Option<TimerId>, action: TaskFn, run_at: Instant) {
        self.entries.insert(id, TaskEntry { name, key, action: Some(action) });
        self.heap.push(Scheduled { run_at, id });
    }

    fn kill(&mut self, id: TaskId) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.action = None;
        }
    }

    fn clear(&mut self, key: &TimerId) {
        for entry in self.entries.values_mut() {
            if entry.key.as_ref() == Some(key) {
                entry.action = None;
            }
        }
    }

    fn release_all(&mut self) {
        for entry in self.entries.values_mut() {
            entry.action = None;
        }
    }

    /// Pops and runs every task whose deadline has passed.
    fn run_due(&mut self, now: Instant) {
        while let Some(scheduled) = self.heap.pop() {
            if scheduled.run_at > now {
                self.heap.push(scheduled);
                break;
            }
            let Some(entry) = self.entries.remove(&scheduled.id) else { continue };
            if let Some(action) = entry.action {
                tracing::trace!(task = entry.name, id = scheduled.id, "running scheduled task");
                if let Err(panic) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(action)) {
                    tracing::error!(task = entry.name, id = scheduled.id, ?panic, "scheduled task panicked");
                }
            }
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|s| s.run_at)
    }
}

/// A single-thread task scheduler, the building block every other
/// subsystem uses for timeouts, retries, and debounced work.
pub struct Scheduler {
    sender: mpsc::Sender<Command>,
    handle: Mutex<Option<std::thread::JoinHandle<()>>>,
    thread_id: ThreadId,
    next_id: AtomicU64,
    /// The scheduler this one was created under, if any. Not consulted for
    /// scheduling decisions today; kept so callers can walk the hierarchy
    /// the way `prx_scheduler_create(parent, ...)` implied one existed.
    #[allow(dead_code)]
    parent: Option<Arc<Scheduler>>,
}

impl Scheduler {
    /// Spawns a new scheduler thread, optionally nested under `parent`.
    #[allow(clippy::expect_used)]
    pub fn create(parent: Option<Arc<Scheduler>>) -> Arc<Scheduler> {
        let (tx, rx) = mpsc::channel::<Command>();
        let (thread_id_tx, thread_id_rx) = mpsc::channel::<ThreadId>();

        let handle = std::thread::Builder::new()
            .name("edgeproxy-scheduler".into())
            .spawn(move || {
                let _ = thread_id_tx.send(std::thread::current().id());
                Self::run(rx);
            })
            .expect("failed to spawn scheduler thread");

        let thread_id = thread_id_rx.recv().expect("scheduler thread reports its id");

        Arc::new(Scheduler {
            sender: tx,
            handle: Mutex::new(Some(handle)),
            thread_id,
            next_id: AtomicU64::new(1),
            parent,
        })
    }

    fn run(rx: mpsc::Receiver<Command>) {
        let mut worker = Worker::new();
        loop {
            let timeout = match worker.next_deadline() {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => Duration::from_secs(3600),
            };

            match rx.recv_timeout(timeout) {
                Ok(Command::Queue { id, name, key, action, run_at }) => {
                    worker.insert(id, name, key, action, run_at);
                }
                Ok(Command::Kill(id)) => worker.kill(id),
                Ok(Command::Clear(key)) => worker.clear(&key),
                Ok(Command::ReleaseAll) => worker.release_all(),
                Ok(Command::Shutdown) => break,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            worker.run_due(Instant::now());
        }
    }

    /// Queues `action` to run after `delay`. `name` is carried through to
    /// tracing spans only; it has no effect on scheduling.
    ///
    /// `key` ties this task to a [`TimerId`] so a later `clear` call can
    /// remove it before it fires — the debounce idiom `do_later` builds on.
    pub fn queue(
        &self,
        name: &'static str,
        delay: Duration,
        key: Option<TimerId>,
        action: impl FnOnce() + Send + 'static,
    ) -> TaskId {
        let id = self.next_id.fetch_add(1, AtomicOrdering::Relaxed);
        let run_at = Instant::now() + delay;
        let _ = self.sender.send(Command::Queue { id, name, key, action: Box::new(action), run_at });
        id
    }

    /// Cancels a specific task by id. A no-op if it already ran or was
    /// already killed.
    pub fn kill(&self, id: TaskId) {
        let _ = self.sender.send(Command::Kill(id));
    }

    /// Cancels every still-pending task registered under `key`.
    pub fn clear(&self, key: TimerId) {
        let _ = self.sender.send(Command::Clear(key));
    }

    /// Cancels every still-pending task on this scheduler, regardless of
    /// key. Used when a scheduler's owning object is torn down and all of
    /// its outstanding timers become moot at once.
    pub fn release_all(&self) {
        let _ = self.sender.send(Command::ReleaseAll);
    }

    /// True if the calling code is running on this scheduler's own thread.
    /// Mirrors `prx_scheduler_runs_me` / `dbg_assert_is_task`: callbacks
    /// that assume exclusive access to scheduler-owned state assert this.
    pub fn runs_me(&self) -> bool {
        std::thread::current().id() == self.thread_id
    }

    /// Signals the scheduler thread to stop after it drains any task whose
    /// deadline has already passed, without waiting for the thread to exit.
    pub fn shutdown(&self) {
        let _ = self.sender.send(Command::Shutdown);
    }

    /// Blocks until the scheduler thread has exited. Callers must
    /// `shutdown()` first (or drop every other `Arc` so `Drop` does it) —
    /// otherwise this waits forever, matching `prx_scheduler_at_exit`'s
    /// documented precondition.
    pub fn at_exit(&self) {
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(handle) = self.handle.lock().take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
