//! Debounced auto-save of in-progress form data.
//!
//! Form fields change on every keystroke and toggle; persisting each change
//! would thrash storage. Each field-change source gets its own trailing-edge
//! debouncer: on every incoming value the countdown resets, and on expiry
//! only the latest value is forwarded into the session. Ordering holds
//! within a source's own stream; nothing is promised across sources, which
//! own disjoint fields.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use terreno_core::visit::{VisitSessionManager, VisitUpdate};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

/// Form-draft key receiving the free-text notes source.
pub const NOTES_FIELD: &str = "notes";
/// Form-draft key receiving the selected-company source. The bound
/// `company_id` is immutable after start; the selection folds into the
/// draft.
pub const COMPANY_FIELD: &str = "company";

/// Fans three independent field-change sources into debounced session
/// updates. Teardown aborts the debounce tasks so no write can land after
/// the owning screen is gone.
pub struct AutoSaveCoordinator {
    checklist_tx: UnboundedSender<HashMap<String, bool>>,
    notes_tx: UnboundedSender<String>,
    company_tx: UnboundedSender<String>,
    tasks: Vec<JoinHandle<()>>,
}

impl AutoSaveCoordinator {
    pub fn new(manager: Arc<VisitSessionManager>, window: Duration) -> Self {
        let (checklist_tx, checklist_rx) = mpsc::unbounded_channel();
        let (notes_tx, notes_rx) = mpsc::unbounded_channel();
        let (company_tx, company_rx) = mpsc::unbounded_channel();

        let tasks = vec![
            spawn_debounce(checklist_rx, window, Arc::clone(&manager), |entries| {
                VisitUpdate::checklist(entries)
            }),
            spawn_debounce(notes_rx, window, Arc::clone(&manager), |notes: String| {
                VisitUpdate::form_field(NOTES_FIELD, notes)
            }),
            spawn_debounce(company_rx, window, manager, |company: String| {
                VisitUpdate::form_field(COMPANY_FIELD, company)
            }),
        ];

        Self {
            checklist_tx,
            notes_tx,
            company_tx,
            tasks,
        }
    }

    /// Feeds a checklist change into its debouncer.
    pub fn push_checklist(&self, entries: HashMap<String, bool>) {
        if self.checklist_tx.send(entries).is_err() {
            tracing::debug!("[AutoSaveCoordinator] Checklist source already torn down");
        }
    }

    /// Feeds a notes edit into its debouncer.
    pub fn push_notes(&self, notes: impl Into<String>) {
        if self.notes_tx.send(notes.into()).is_err() {
            tracing::debug!("[AutoSaveCoordinator] Notes source already torn down");
        }
    }

    /// Feeds a company selection into its debouncer.
    pub fn push_company(&self, company: impl Into<String>) {
        if self.company_tx.send(company.into()).is_err() {
            tracing::debug!("[AutoSaveCoordinator] Company source already torn down");
        }
    }

    /// Stops all sources immediately. Buffered values that have not reached
    /// their idle window are dropped, never written late.
    pub fn shutdown(mut self) {
        self.abort_tasks();
    }

    fn abort_tasks(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for AutoSaveCoordinator {
    fn drop(&mut self) {
        self.abort_tasks();
    }
}

/// One trailing-edge debouncer: buffer the latest value, reset the countdown
/// on every arrival, forward on expiry.
fn spawn_debounce<T, F>(
    mut rx: UnboundedReceiver<T>,
    window: Duration,
    manager: Arc<VisitSessionManager>,
    into_update: F,
) -> JoinHandle<()>
where
    T: Send + 'static,
    F: Fn(T) -> VisitUpdate + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(first) = rx.recv().await {
            let mut latest = first;
            loop {
                match tokio::time::timeout(window, rx.recv()).await {
                    // A newer value supersedes the buffered one.
                    Ok(Some(next)) => latest = next,
                    // Source closed mid-burst: tear down without writing.
                    Ok(None) => return,
                    // Idle window elapsed; forward the latest value.
                    Err(_) => {
                        if let Err(err) = manager.update(into_update(latest)).await {
                            tracing::debug!(
                                "[AutoSaveCoordinator] Dropped update without active visit: {}",
                                err
                            );
                        }
                        break;
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use terreno_core::error::Result;
    use terreno_core::store::DurableStore;

    struct CountingStore {
        entries: Mutex<HashMap<String, String>>,
        writes: AtomicUsize,
    }

    impl CountingStore {
        fn new() -> Self {
            Self {
                entries: Mutex::new(HashMap::new()),
                writes: AtomicUsize::new(0),
            }
        }

        fn write_count(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        fn reset_write_count(&self) {
            self.writes.store(0, Ordering::SeqCst);
        }
    }

    impl DurableStore for CountingStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
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

    const WINDOW: Duration = Duration::from_millis(40);
    const PERSIST_DELAY: Duration = Duration::from_millis(10);

    async fn started_manager(store: Arc<CountingStore>) -> Arc<VisitSessionManager> {
        let manager = Arc::new(VisitSessionManager::new(store, PERSIST_DELAY));
        manager.start(7, 42).await.unwrap();
        manager
    }

    fn checklist_entries(name: &str, done: bool) -> HashMap<String, bool> {
        let mut entries = HashMap::new();
        entries.insert(name.to_string(), done);
        entries
    }

    async fn settle() {
        tokio::time::sleep(WINDOW * 3 + PERSIST_DELAY * 3).await;
    }

    #[tokio::test]
    async fn test_burst_collapses_to_single_write() {
        let store = Arc::new(CountingStore::new());
        let manager = started_manager(store.clone()).await;
        let coordinator = AutoSaveCoordinator::new(Arc::clone(&manager), WINDOW);
        store.reset_write_count();

        coordinator.push_checklist(checklist_entries("a", true));
        coordinator.push_checklist(checklist_entries("a", false));
        coordinator.push_checklist(checklist_entries("a", true));

        settle().await;

        assert_eq!(store.write_count(), 1);
        assert_eq!(manager.snapshot().await.checklist.get("a"), Some(&true));
    }

    #[tokio::test]
    async fn test_sources_are_independent() {
        let store = Arc::new(CountingStore::new());
        let manager = started_manager(store).await;
        let coordinator = AutoSaveCoordinator::new(Arc::clone(&manager), WINDOW);

        coordinator.push_checklist(checklist_entries("printers", true));
        coordinator.push_notes("replaced toner");
        coordinator.push_company("Comercial Andes");

        settle().await;

        let snapshot = manager.snapshot().await;
        assert_eq!(snapshot.checklist.get("printers"), Some(&true));
        assert_eq!(
            snapshot.form_draft.get(NOTES_FIELD).map(String::as_str),
            Some("replaced toner")
        );
        assert_eq!(
            snapshot.form_draft.get(COMPANY_FIELD).map(String::as_str),
            Some("Comercial Andes")
        );
    }

    #[tokio::test]
    async fn test_last_value_wins_within_a_source() {
        let store = Arc::new(CountingStore::new());
        let manager = started_manager(store).await;
        let coordinator = AutoSaveCoordinator::new(Arc::clone(&manager), WINDOW);

        coordinator.push_notes("first");
        coordinator.push_notes("second");
        coordinator.push_notes("final");

        settle().await;

        assert_eq!(
            manager.snapshot().await.form_draft.get(NOTES_FIELD).map(String::as_str),
            Some("final")
        );
    }

    #[tokio::test]
    async fn test_shutdown_drops_buffered_values() {
        let store = Arc::new(CountingStore::new());
        let manager = started_manager(store.clone()).await;
        let coordinator = AutoSaveCoordinator::new(Arc::clone(&manager), WINDOW);
        store.reset_write_count();

        coordinator.push_notes("never persisted");
        coordinator.shutdown();

        settle().await;

        assert_eq!(store.write_count(), 0);
        assert!(manager.snapshot().await.form_draft.is_empty());
    }
}
