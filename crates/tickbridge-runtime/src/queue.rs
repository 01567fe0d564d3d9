use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tickbridge_core::ActionRequest;

struct QueueInner {
    pending: Vec<ActionRequest>,
    busy: bool,
}

/// Thread-safe mailbox between server workers and the host's mutation
/// thread. Appends may come from any thread; draining happens only on the
/// host thread, and the busy gate guarantees at most one in-flight batch.
pub struct ActionQueue {
    inner: Mutex<QueueInner>,
    next_generated_id: AtomicU64,
}

impl Default for ActionQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                pending: Vec::new(),
                busy: false,
            }),
            next_generated_id: AtomicU64::new(1),
        }
    }

    /// Appends well-formed action objects and returns how many were
    /// accepted. Non-object entries are dropped, not counted. Missing ids
    /// are generated here so a request is identifiable from enqueue on.
    pub fn enqueue(&self, values: &[Value]) -> usize {
        let mut accepted = Vec::new();
        for value in values {
            let n = self.next_generated_id.fetch_add(1, Ordering::Relaxed);
            if let Some(request) = ActionRequest::from_wire(value, format!("act_{n}")) {
                accepted.push(request);
            }
        }

        let count = accepted.len();
        if count > 0 {
            let mut inner = self.lock();
            inner.pending.append(&mut accepted);
        }
        count
    }

    /// Callable only from the host thread. Returns `None` while a previous
    /// batch is still running or the queue is empty; otherwise swaps the
    /// queue for an empty one under a single lock acquisition and hands the
    /// batch out. The busy gate clears when the returned batch is dropped.
    pub fn drain_if_idle(self: &Arc<Self>) -> Option<DrainedBatch> {
        let mut inner = self.lock();
        if inner.busy || inner.pending.is_empty() {
            return None;
        }
        inner.busy = true;
        let requests = std::mem::take(&mut inner.pending);
        drop(inner);
        Some(DrainedBatch {
            queue: Arc::clone(self),
            requests,
        })
    }

    pub fn pending_snapshot(&self) -> Vec<ActionRequest> {
        self.lock().pending.clone()
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_busy(&self) -> bool {
        self.lock().busy
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, QueueInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// One drained batch of actions. Runs to completion; dropping it clears the
/// busy gate.
pub struct DrainedBatch {
    queue: Arc<ActionQueue>,
    requests: Vec<ActionRequest>,
}

impl DrainedBatch {
    pub fn requests(&self) -> &[ActionRequest] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

impl Drop for DrainedBatch {
    fn drop(&mut self) {
        self.queue.lock().busy = false;
    }
}
