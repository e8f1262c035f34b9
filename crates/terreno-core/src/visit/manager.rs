//! Visit session lifecycle management.

use crate::error::{Result, TerrenoError};
use crate::geo::GeoPoint;
use crate::store::DurableStore;
use crate::visit::model::{ContactRef, VisitLocation, VisitSession, VisitStatus, VisitUpdate};
use crate::visit::storage::VisitStorage;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Owns the single active visit's state, transitions, and persistence.
///
/// `VisitSessionManager` is an explicit instance injected into whichever
/// components need it; there is no ambient global. It holds the single
/// in-memory `VisitSession` and serializes all mutations through it, so
/// concurrent updates from different sources never race on the persisted
/// representation: every write is a full snapshot of the current in-memory
/// state, never a field-level patch.
///
/// Start, complete and clear persist synchronously so a crash never loses a
/// state transition. Mid-session edits schedule a trailing-edge debounced
/// write; a newer edit supersedes the pending one.
pub struct VisitSessionManager {
    /// The single in-memory session.
    session: RwLock<VisitSession>,
    /// Versioned persistence over the durable store.
    storage: VisitStorage,
    /// Idle window before a mid-session edit is written out.
    persist_delay: Duration,
    /// Pending debounced write, superseded by newer edits.
    pending_persist: Mutex<Option<JoinHandle<()>>>,
}

impl VisitSessionManager {
    /// Creates a manager, resuming any persisted session.
    ///
    /// If the durable store holds an in-progress visit (e.g. the app was
    /// killed mid-visit), it is loaded as-is and exposed to the caller as a
    /// recovered visit. This is a first-class resume path, not an error.
    pub fn new(store: Arc<dyn DurableStore>, persist_delay: Duration) -> Self {
        let storage = VisitStorage::new(store);
        let session = match storage.load() {
            Ok(Some(loaded)) => {
                if loaded.is_in_progress() {
                    tracing::info!("[VisitSessionManager] Recovered in-progress visit");
                }
                loaded
            }
            Ok(None) => VisitSession::initial(),
            Err(err) => {
                tracing::warn!(
                    "[VisitSessionManager] Could not read stored visit, starting clean: {}",
                    err
                );
                VisitSession::initial()
            }
        };

        Self {
            session: RwLock::new(session),
            storage,
            persist_delay,
            pending_persist: Mutex::new(None),
        }
    }

    /// Starts a new visit.
    ///
    /// Clears any prior form draft, checklist and requester selection, sets
    /// `started_at` to now and persists synchronously.
    ///
    /// # Errors
    ///
    /// Returns `SessionAlreadyActive` if a visit is already in progress; the
    /// caller must `complete()` or `clear()` it first. Propagates storage
    /// errors from the synchronous persist.
    pub async fn start(&self, company_id: i64, client_id: i64) -> Result<()> {
        let snapshot = {
            let mut session = self.session.write().await;
            if session.is_in_progress() {
                return Err(TerrenoError::SessionAlreadyActive);
            }

            *session = VisitSession {
                company_id: Some(company_id),
                client_id: Some(client_id),
                started_at: Some(Utc::now()),
                status: VisitStatus::InProgress,
                ..VisitSession::initial()
            };
            session.clone()
        };

        self.cancel_pending();
        self.storage.save(&snapshot)?;
        tracing::info!(
            "[VisitSessionManager] Visit started (company {}, client {})",
            company_id,
            client_id
        );
        Ok(())
    }

    /// Merges a partial update into the in-progress visit and schedules a
    /// debounced persist. Returns immediately; the caller never awaits
    /// persistence for a mid-session edit.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveSession` when no visit is in progress.
    pub async fn update(self: &Arc<Self>, update: VisitUpdate) -> Result<()> {
        {
            let mut session = self.session.write().await;
            if !session.is_in_progress() {
                return Err(TerrenoError::NoActiveSession);
            }
            session.apply(update);
        }
        self.schedule_persist();
        Ok(())
    }

    /// Completes the in-progress visit.
    ///
    /// Sets `ended_at`, cancels any pending debounced write, persists
    /// synchronously and returns the now-frozen snapshot for the backend
    /// submission.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveSession` when no visit is in progress. Propagates
    /// storage errors from the synchronous persist.
    pub async fn complete(&self) -> Result<VisitSession> {
        self.cancel_pending();
        let snapshot = {
            let mut session = self.session.write().await;
            if !session.is_in_progress() {
                return Err(TerrenoError::NoActiveSession);
            }
            session.ended_at = Some(Utc::now());
            session.status = VisitStatus::Completed;
            session.clone()
        };

        self.storage.save(&snapshot)?;
        tracing::info!("[VisitSessionManager] Visit completed");
        Ok(snapshot)
    }

    /// Resets to the initial state and erases the durable store entry
    /// entirely, so a subsequent `start()` begins from a clean slate.
    pub async fn clear(&self) -> Result<()> {
        self.cancel_pending();
        {
            let mut session = self.session.write().await;
            *session = VisitSession::initial();
        }
        self.storage.clear()?;
        tracing::debug!("[VisitSessionManager] Visit state cleared");
        Ok(())
    }

    /// Records the backend-assigned session id once creation is confirmed.
    /// Persists synchronously.
    pub async fn set_session_id(&self, session_id: impl Into<String>) -> Result<()> {
        let snapshot = {
            let mut session = self.session.write().await;
            if !session.is_in_progress() {
                return Err(TerrenoError::NoActiveSession);
            }
            session.session_id = Some(session_id.into());
            session.clone()
        };
        self.storage.save(&snapshot)
    }

    /// Sets the visit coordinates. Any previously resolved label is dropped
    /// as stale; it is filled again asynchronously via
    /// [`set_location_label`](Self::set_location_label).
    pub async fn set_location(self: &Arc<Self>, point: GeoPoint) -> Result<()> {
        self.update(VisitUpdate {
            location: Some(VisitLocation {
                latitude: point.latitude,
                longitude: point.longitude,
                label: None,
            }),
            ..VisitUpdate::default()
        })
        .await
    }

    /// Fills the human-readable label of an already-set location. A missing
    /// location is not an error; the label is simply dropped.
    pub async fn set_location_label(self: &Arc<Self>, label: impl Into<String>) -> Result<()> {
        {
            let mut session = self.session.write().await;
            if !session.is_in_progress() {
                return Err(TerrenoError::NoActiveSession);
            }
            match session.location.as_mut() {
                Some(location) => location.label = Some(label.into()),
                None => {
                    tracing::debug!(
                        "[VisitSessionManager] Dropping location label, no coordinates set"
                    );
                    return Ok(());
                }
            }
        }
        self.schedule_persist();
        Ok(())
    }

    /// Appends a requester to the ordered selection. Re-adding a known
    /// contact is a no-op.
    pub async fn add_requester(self: &Arc<Self>, contact: ContactRef) -> Result<()> {
        {
            let mut session = self.session.write().await;
            if !session.is_in_progress() {
                return Err(TerrenoError::NoActiveSession);
            }
            if session
                .requesters
                .iter()
                .any(|existing| existing.contact_id == contact.contact_id)
            {
                return Ok(());
            }
            session.requesters.push(contact);
        }
        self.schedule_persist();
        Ok(())
    }

    /// Removes a requester from the selection.
    pub async fn remove_requester(self: &Arc<Self>, contact_id: i64) -> Result<()> {
        {
            let mut session = self.session.write().await;
            if !session.is_in_progress() {
                return Err(TerrenoError::NoActiveSession);
            }
            session
                .requesters
                .retain(|existing| existing.contact_id != contact_id);
        }
        self.schedule_persist();
        Ok(())
    }

    /// Returns a copy of the current session.
    pub async fn snapshot(&self) -> VisitSession {
        self.session.read().await.clone()
    }

    pub async fn has_active_visit(&self) -> bool {
        self.session.read().await.is_in_progress()
    }

    /// Renders the time since the visit started as `HH:MM`.
    pub async fn elapsed_label(&self) -> Option<String> {
        self.session.read().await.elapsed_label(Utc::now())
    }

    /// Forces a pending debounced write out immediately. Intended for screen
    /// teardown, where waiting out the idle window is not an option.
    pub async fn flush(&self) -> Result<()> {
        if let Some(pending) = self.take_pending() {
            pending.abort();
            let snapshot = self.session.read().await.clone();
            self.storage.save(&snapshot)?;
        }
        Ok(())
    }

    /// Schedules a trailing-edge debounced persist, superseding any pending
    /// one.
    fn schedule_persist(self: &Arc<Self>) {
        let manager = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(manager.persist_delay).await;
            let snapshot = manager.session.read().await.clone();
            if let Err(err) = manager.storage.save(&snapshot) {
                // There is no caller left to inform; log and carry on.
                tracing::warn!("[VisitSessionManager] Debounced persist failed: {}", err);
            }
        });

        if let Some(previous) = self.pending_persist.lock().unwrap().replace(handle) {
            previous.abort();
        }
    }

    fn cancel_pending(&self) {
        if let Some(pending) = self.take_pending() {
            pending.abort();
        }
    }

    fn take_pending(&self) -> Option<JoinHandle<()>> {
        self.pending_persist.lock().unwrap().take()
    }
}

impl Drop for VisitSessionManager {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

#[cfg(test)]
#[path = "manager_test.rs"]
mod manager_test;
