//! Per-technician log of completed visits.
//!
//! Completed snapshots are appended to a JSON array under a key scoped to
//! the technician's username, so technicians sharing a device keep separate
//! histories. An unreadable history degrades to empty rather than blocking
//! the flow.

use crate::error::Result;
use crate::store::DurableStore;
use crate::visit::model::VisitSession;
use std::sync::Arc;

const HISTORY_KEY_PREFIX: &str = "terreno.visit.history.";

pub struct VisitHistory {
    store: Arc<dyn DurableStore>,
}

impl VisitHistory {
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self { store }
    }

    /// Appends a completed visit snapshot, newest last.
    pub fn append(&self, technician: &str, visit: &VisitSession) -> Result<()> {
        let mut visits = self.list(technician);
        visits.push(visit.clone());
        let json = serde_json::to_string(&visits)?;
        self.store.set(&history_key(technician), &json)
    }

    /// Returns the technician's recorded visits, newest last.
    pub fn list(&self, technician: &str) -> Vec<VisitSession> {
        let raw = match self.store.get(&history_key(technician)) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::warn!("[VisitHistory] Could not read history: {}", err);
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(visits) => visits,
            Err(err) => {
                tracing::warn!("[VisitHistory] Discarding unreadable history: {}", err);
                Vec::new()
            }
        }
    }

    /// Removes the entry at `index`. An out-of-range index is a no-op.
    pub fn remove(&self, technician: &str, index: usize) -> Result<()> {
        let mut visits = self.list(technician);
        if index >= visits.len() {
            return Ok(());
        }
        visits.remove(index);
        let json = serde_json::to_string(&visits)?;
        self.store.set(&history_key(technician), &json)
    }
}

fn history_key(technician: &str) -> String {
    format!("{}{}", HISTORY_KEY_PREFIX, technician)
}
