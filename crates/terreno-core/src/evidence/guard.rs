//! Duplicate-submission guard for delivery evidence.
//!
//! The guard is advisory and local-only: it prevents this device from
//! re-submitting the same logical evidence twice (a retried tap, a
//! network-timeout resubmit). Server-side uniqueness is a separate concern.

use crate::error::Result;
use crate::store::DurableStore;
use std::sync::{Arc, RwLock};

/// Storage key holding the JSON array of accepted fingerprints.
pub const FINGERPRINT_KEY: &str = "terreno.delivery.fingerprints.v1";

/// Tracks previously-accepted submission fingerprints in a bounded,
/// insertion-ordered set persisted through the durable store.
pub struct SubmissionGuard {
    store: Arc<dyn DurableStore>,
    /// Insertion order = recency; oldest first.
    accepted: RwLock<Vec<String>>,
    capacity: usize,
}

impl SubmissionGuard {
    /// Creates a guard, loading the persisted set. Unreadable or invalid
    /// stored data degrades to an empty set.
    pub fn new(store: Arc<dyn DurableStore>, capacity: usize) -> Self {
        let accepted = match store.get(FINGERPRINT_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(parsed) => parsed
                    .into_iter()
                    .filter(|fingerprint| !fingerprint.trim().is_empty())
                    .collect(),
                Err(err) => {
                    tracing::warn!(
                        "[SubmissionGuard] Discarding unreadable fingerprint set: {}",
                        err
                    );
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::warn!("[SubmissionGuard] Could not read fingerprint set: {}", err);
                Vec::new()
            }
        };

        Self {
            store,
            accepted: RwLock::new(accepted),
            capacity,
        }
    }

    /// Membership test against the persisted set.
    pub fn is_duplicate(&self, fingerprint: &str) -> bool {
        self.accepted
            .read()
            .unwrap()
            .iter()
            .any(|accepted| accepted == fingerprint)
    }

    /// Inserts a fingerprint, trims the set to capacity (oldest first) and
    /// persists. Re-accepting a known fingerprint is a no-op.
    pub fn accept(&self, fingerprint: &str) -> Result<()> {
        let snapshot = {
            let mut accepted = self.accepted.write().unwrap();
            if accepted.iter().any(|known| known == fingerprint) {
                return Ok(());
            }
            accepted.push(fingerprint.to_string());
            if accepted.len() > self.capacity {
                let excess = accepted.len() - self.capacity;
                accepted.drain(..excess);
            }
            accepted.clone()
        };

        let json = serde_json::to_string(&snapshot)?;
        self.store.set(FINGERPRINT_KEY, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MemoryStore {
        entries: Mutex<HashMap<String, String>>,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                entries: Mutex::new(HashMap::new()),
            }
        }
    }

    impl DurableStore for MemoryStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }
    }

    #[test]
    fn test_accept_then_duplicate() {
        let guard = SubmissionGuard::new(Arc::new(MemoryStore::new()), 50);

        assert!(!guard.is_duplicate("00c0ffee"));
        guard.accept("00c0ffee").unwrap();
        assert!(guard.is_duplicate("00c0ffee"));
        assert!(!guard.is_duplicate("deadbeef"));
    }

    #[test]
    fn test_set_survives_reload() {
        let store = Arc::new(MemoryStore::new());
        {
            let guard = SubmissionGuard::new(store.clone(), 50);
            guard.accept("00c0ffee").unwrap();
        }

        let reloaded = SubmissionGuard::new(store, 50);
        assert!(reloaded.is_duplicate("00c0ffee"));
    }

    #[test]
    fn test_capacity_evicts_oldest_first() {
        let store = Arc::new(MemoryStore::new());
        let guard = SubmissionGuard::new(store.clone(), 3);

        for fingerprint in ["aa", "bb", "cc", "dd"] {
            guard.accept(fingerprint).unwrap();
        }

        assert!(!guard.is_duplicate("aa"));
        assert!(guard.is_duplicate("bb"));
        assert!(guard.is_duplicate("dd"));

        // The trimmed set is what got persisted.
        let raw = store.get(FINGERPRINT_KEY).unwrap().unwrap();
        let persisted: Vec<String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted, vec!["bb", "cc", "dd"]);
    }

    #[test]
    fn test_reaccept_is_noop() {
        let guard = SubmissionGuard::new(Arc::new(MemoryStore::new()), 2);
        guard.accept("aa").unwrap();
        guard.accept("bb").unwrap();
        // Re-accepting must not evict anything.
        guard.accept("aa").unwrap();
        assert!(guard.is_duplicate("aa"));
        assert!(guard.is_duplicate("bb"));
    }

    #[test]
    fn test_invalid_stored_set_degrades_to_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set(FINGERPRINT_KEY, "{not an array}").unwrap();

        let guard = SubmissionGuard::new(store, 50);
        assert!(!guard.is_duplicate("aa"));
    }
}
