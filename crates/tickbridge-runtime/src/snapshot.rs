use std::sync::Mutex;

use serde_json::Value;

struct SnapshotInner {
    state: Option<Value>,
    execution: Option<Value>,
}

/// Last-published snapshots. Written only by the host thread at the end of a
/// tick; read by any server worker.
pub struct SnapshotStore {
    inner: Mutex<SnapshotInner>,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SnapshotInner {
                state: None,
                execution: None,
            }),
        }
    }

    pub fn publish_state(&self, state: Value) {
        self.lock().state = Some(state);
    }

    pub fn publish_execution(&self, execution: Value) {
        self.lock().execution = Some(execution);
    }

    pub fn state(&self) -> Option<Value> {
        self.lock().state.clone()
    }

    pub fn last_execution(&self) -> Option<Value> {
        self.lock().execution.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SnapshotInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
