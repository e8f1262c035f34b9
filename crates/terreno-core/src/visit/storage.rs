//! Versioned persistence of the active visit session.
//!
//! The serialized session is wrapped in an envelope carrying a format
//! version and save timestamp. A version mismatch or structurally invalid
//! payload is treated as corrupt: the entry is removed so the state machine
//! starts from a clean slate instead of resuming garbage.

use crate::error::Result;
use crate::store::DurableStore;
use crate::visit::model::VisitSession;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Storage key holding the serialized active visit.
pub const ACTIVE_VISIT_KEY: &str = "terreno.visit.active.v1";

/// Envelope format version. Bump on incompatible `VisitSession` changes.
const STORAGE_VERSION: &str = "1.0";

#[derive(Debug, Serialize, Deserialize)]
struct StoredVisit {
    version: String,
    saved_at: DateTime<Utc>,
    data: VisitSession,
}

/// Reads and writes the active visit through the durable store.
pub struct VisitStorage {
    store: Arc<dyn DurableStore>,
}

impl VisitStorage {
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self { store }
    }

    /// Persists a full snapshot of the session.
    pub fn save(&self, session: &VisitSession) -> Result<()> {
        let envelope = StoredVisit {
            version: STORAGE_VERSION.to_string(),
            saved_at: Utc::now(),
            data: session.clone(),
        };
        let json = serde_json::to_string(&envelope)?;
        self.store.set(ACTIVE_VISIT_KEY, &json)
    }

    /// Loads the persisted session, discarding corrupt or old-version
    /// payloads.
    pub fn load(&self) -> Result<Option<VisitSession>> {
        let Some(raw) = self.store.get(ACTIVE_VISIT_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_str::<StoredVisit>(&raw) {
            Ok(envelope) if envelope.version == STORAGE_VERSION => Ok(Some(envelope.data)),
            Ok(envelope) => {
                tracing::warn!(
                    "[VisitStorage] Discarding stored visit with version {}",
                    envelope.version
                );
                self.store.remove(ACTIVE_VISIT_KEY)?;
                Ok(None)
            }
            Err(err) => {
                tracing::warn!("[VisitStorage] Discarding corrupt stored visit: {}", err);
                self.store.remove(ACTIVE_VISIT_KEY)?;
                Ok(None)
            }
        }
    }

    /// Erases the stored entry entirely.
    pub fn clear(&self) -> Result<()> {
        self.store.remove(ACTIVE_VISIT_KEY)
    }
}
