//! Per-profile update lock.
//!
//! A decision for a profile that already has one in flight is dropped,
//! not queued and not merged; callers re-invoke if they still want the
//! change. The claim releases exactly when it is dropped, which the
//! engine ties to completion of the persistence write.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

#[derive(Clone, Default)]
pub struct UpdateLock {
    ids: Arc<Mutex<HashSet<String>>>,
}

impl UpdateLock {
    pub fn new() -> Self {
        Self::default()
    }

    fn ids(&self) -> MutexGuard<'_, HashSet<String>> {
        self.ids.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Non-blocking acquire. Returns `None` when an update for `id` is
    /// already in flight.
    pub fn try_acquire(&self, id: &str) -> Option<UpdateClaim> {
        let mut ids = self.ids();
        if !ids.insert(id.to_string()) {
            debug!(id, "Update already in flight");
            return None;
        }

        Some(UpdateClaim {
            id: id.to_string(),
            ids: Arc::clone(&self.ids),
        })
    }

    pub fn is_held(&self, id: &str) -> bool {
        self.ids().contains(id)
    }
}

/// Exclusive claim on one profile id, released on drop.
pub struct UpdateClaim {
    id: String,
    ids: Arc<Mutex<HashSet<String>>>,
}

impl Drop for UpdateClaim {
    fn drop(&mut self) {
        let mut ids = self.ids.lock().unwrap_or_else(|e| e.into_inner());
        ids.remove(&self.id);
    }
}
