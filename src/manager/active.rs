//! Active-download registry.
//!
//! Maps a download id to its execution handle for as long as a worker has
//! claimed it. Presence in this map is the authoritative signal a worker
//! consults (via its abort token) to decide whether to keep running.
//! Mutated only by the coordinator task.

use std::collections::HashMap;

use tokio::task::JoinHandle;

use crate::engine::AbortToken;

/// Coarse execution phase, for listing/diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Queued,
    Downloading,
}

pub(crate) struct ActiveEntry {
    pub token: AbortToken,
    pub handle: JoinHandle<()>,
    pub phase: Phase,
    /// Attempt number the entry was registered under. Job messages carry
    /// the same number; a mismatch marks a message from a superseded
    /// attempt that must be ignored.
    pub attempt: u64,
}

#[derive(Default)]
pub(crate) struct ActiveRegistry {
    entries: HashMap<String, ActiveEntry>,
}

impl ActiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: String, attempt: u64, token: AbortToken, handle: JoinHandle<()>) {
        self.entries.insert(
            id,
            ActiveEntry {
                token,
                handle,
                phase: Phase::Queued,
                attempt,
            },
        );
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Whether the given attempt is the one currently registered for the id.
    pub fn is_current(&self, id: &str, attempt: u64) -> bool {
        self.entries
            .get(id)
            .is_some_and(|entry| entry.attempt == attempt)
    }

    pub fn set_phase(&mut self, id: &str, phase: Phase) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.phase = phase;
        }
    }

    /// Flip the abort token without removing the entry; the job observes it
    /// at its next progress tick.
    pub fn abort(&self, id: &str) {
        if let Some(entry) = self.entries.get(id) {
            entry.token.abort();
        }
    }

    /// Remove the entry, signalling the worker to stop. Returns the entry so
    /// the caller can also interrupt the join handle.
    pub fn remove(&mut self, id: &str) -> Option<ActiveEntry> {
        let entry = self.entries.remove(id)?;
        entry.token.abort();
        Some(entry)
    }

    pub fn ids(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
