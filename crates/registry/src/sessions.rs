//! Directory of live co-signing sessions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use common::InstanceId;
use saga::BidSessionHandle;

/// Live bid-session handles keyed by instance id.
///
/// Entries are inserted when a place-bid run starts and removed by the
/// spawned task when the run ends, so lookups after that point report the
/// instance as unknown and callers fall back to the persisted record.
#[derive(Clone, Default)]
pub struct SessionDirectory {
    sessions: Arc<Mutex<HashMap<InstanceId, BidSessionHandle>>>,
}

impl SessionDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a running session's handle.
    pub fn insert(&self, id: InstanceId, handle: BidSessionHandle) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.insert(id, handle);
        }
    }

    /// Removes a finished session.
    pub fn remove(&self, id: InstanceId) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.remove(&id);
        }
    }

    /// The handle for a live session, if any.
    pub fn get(&self, id: InstanceId) -> Option<BidSessionHandle> {
        self.sessions
            .lock()
            .ok()
            .and_then(|sessions| sessions.get(&id).cloned())
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// True when no session is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
