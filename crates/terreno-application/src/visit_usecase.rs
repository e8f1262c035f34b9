//! Visit and delivery-evidence use cases.
//!
//! Orchestrates the session state machine, the location resolver, the
//! compression loop, the fingerprint guard and the submission seam into the
//! two flows the screens drive: running a visit and registering a delivery.

use crate::location::LocationResolver;
use chrono::Utc;
use std::sync::Arc;
use terreno_core::error::{Result, TerrenoError};
use terreno_core::evidence::{DeliveryDraft, DeliveryRecord, SubmissionGuard, fingerprint};
use terreno_core::media::{CompressionBudget, ImageCodec, compress_to_budget};
use terreno_core::submit::{SubmissionClient, VisitReceipt};
use terreno_core::visit::{VisitHistory, VisitSessionManager};

/// Outcome of a delivery-evidence submission attempt.
///
/// `Duplicate` and `Incomplete` are normal guard outcomes the screen
/// surfaces as informational messages, not failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Submitted { delivery_id: String },
    Duplicate,
    Incomplete,
}

pub struct VisitUseCase {
    manager: Arc<VisitSessionManager>,
    guard: Arc<SubmissionGuard>,
    resolver: Arc<LocationResolver>,
    submitter: Arc<dyn SubmissionClient>,
    codec: Arc<dyn ImageCodec>,
    history: Arc<VisitHistory>,
    /// Username the history is recorded under.
    technician: String,
    upload_budget: CompressionBudget,
}

impl VisitUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        manager: Arc<VisitSessionManager>,
        guard: Arc<SubmissionGuard>,
        resolver: Arc<LocationResolver>,
        submitter: Arc<dyn SubmissionClient>,
        codec: Arc<dyn ImageCodec>,
        history: Arc<VisitHistory>,
        technician: impl Into<String>,
        upload_budget: CompressionBudget,
    ) -> Self {
        Self {
            manager,
            guard,
            resolver,
            submitter,
            codec,
            history,
            technician: technician.into(),
            upload_budget,
        }
    }

    /// Starts a visit and kicks off best-effort location resolution in the
    /// background: coordinates land in the session as soon as the fix
    /// arrives; the label follows once geocoding resolves.
    ///
    /// # Errors
    ///
    /// Returns `SessionAlreadyActive` if a visit is already in progress.
    pub async fn start_visit(self: &Arc<Self>, company_id: i64, client_id: i64) -> Result<()> {
        self.manager.start(company_id, client_id).await?;

        let usecase = Arc::clone(self);
        tokio::spawn(async move {
            usecase.fill_location().await;
        });
        Ok(())
    }

    async fn fill_location(&self) {
        let Some(point) = self.resolver.acquire_position().await else {
            return;
        };
        if let Err(err) = self.manager.set_location(point).await {
            tracing::debug!("[VisitUseCase] Dropping late position fix: {}", err);
            return;
        }

        let label = self.resolver.resolve(point).await;
        if let Err(err) = self.manager.set_location_label(label).await {
            tracing::debug!("[VisitUseCase] Dropping late location label: {}", err);
        }
    }

    /// Completes the visit and submits the frozen snapshot.
    ///
    /// On success the snapshot is appended to the technician's history and
    /// the store entry is cleared. On backend failure the session stays
    /// `Completed` so the caller can retry the submission.
    pub async fn complete_visit(&self) -> Result<VisitReceipt> {
        let snapshot = self.manager.complete().await?;

        let receipt = self
            .submitter
            .submit_visit(&snapshot)
            .await
            .map_err(|err| TerrenoError::submission(err.to_string()))?;

        if let Err(err) = self.history.append(&self.technician, &snapshot) {
            tracing::warn!("[VisitUseCase] Could not record visit history: {}", err);
        }
        self.manager.clear().await?;
        Ok(receipt)
    }

    /// Submits delivery evidence, guarded against duplicates.
    ///
    /// The photo is compressed to the upload budget before submission. The
    /// fingerprint is computed over the draft as picked, so a retried tap or
    /// a timeout-triggered resubmit of the same evidence reports
    /// `Duplicate` without touching the network.
    pub async fn submit_delivery(&self, draft: DeliveryDraft) -> Result<DeliveryOutcome> {
        let Some(candidate_fingerprint) = fingerprint(&draft) else {
            return Ok(DeliveryOutcome::Incomplete);
        };
        if self.guard.is_duplicate(&candidate_fingerprint) {
            tracing::info!("[VisitUseCase] Delivery already registered, blocking resubmit");
            return Ok(DeliveryOutcome::Duplicate);
        }

        // A fingerprint implies a complete draft.
        let (Some(photo), Some(signature)) = (draft.photo, draft.signature) else {
            return Ok(DeliveryOutcome::Incomplete);
        };

        let compressed = compress_to_budget(self.codec.as_ref(), &photo.image, &self.upload_budget);
        let record = DeliveryRecord {
            receiver_name: draft.receiver_name.trim().to_string(),
            company_name: draft.company_name.trim().to_string(),
            delivered_at: Utc::now(),
            photo_meta: photo.meta,
            photo: compressed,
            signature,
        };

        let receipt = self
            .submitter
            .submit_delivery(&record)
            .await
            .map_err(|err| TerrenoError::submission(err.to_string()))?;

        if let Err(err) = self.guard.accept(&candidate_fingerprint) {
            // The submission went through; a guard that failed to persist
            // only weakens future duplicate detection.
            tracing::warn!("[VisitUseCase] Could not persist fingerprint: {}", err);
        }

        Ok(DeliveryOutcome::Submitted {
            delivery_id: receipt.delivery_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result as AnyResult;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use terreno_core::config::LocationTunables;
    use terreno_core::evidence::{EvidenceFileMeta, EvidencePhoto};
    use terreno_core::geo::{
        Address, GeoPoint, PermissionStatus, PositionRequest, Positioning, ReverseGeocode,
    };
    use terreno_core::media::EncodedImage;
    use terreno_core::submit::DeliveryReceipt;
    use terreno_core::visit::{VisitSession, VisitStatus};
    use terreno_infrastructure::MemoryStore;

    struct FakeSubmitter {
        fail: bool,
        visits: Mutex<Vec<VisitSession>>,
        deliveries: Mutex<Vec<DeliveryRecord>>,
    }

    impl FakeSubmitter {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                visits: Mutex::new(Vec::new()),
                deliveries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SubmissionClient for FakeSubmitter {
        async fn submit_visit(&self, visit: &VisitSession) -> AnyResult<VisitReceipt> {
            if self.fail {
                anyhow::bail!("backend down");
            }
            self.visits.lock().unwrap().push(visit.clone());
            Ok(VisitReceipt {
                visit_id: "v-1".to_string(),
            })
        }

        async fn submit_delivery(&self, delivery: &DeliveryRecord) -> AnyResult<DeliveryReceipt> {
            if self.fail {
                anyhow::bail!("backend down");
            }
            self.deliveries.lock().unwrap().push(delivery.clone());
            Ok(DeliveryReceipt {
                delivery_id: "d-1".to_string(),
            })
        }
    }

    struct FakePositioning;

    #[async_trait]
    impl Positioning for FakePositioning {
        async fn request_permission(&self) -> AnyResult<PermissionStatus> {
            Ok(PermissionStatus::Granted)
        }

        async fn current_position(&self, _request: PositionRequest) -> AnyResult<GeoPoint> {
            Ok(GeoPoint {
                latitude: -33.43,
                longitude: -70.61,
            })
        }
    }

    struct FakeGeocoder;

    #[async_trait]
    impl ReverseGeocode for FakeGeocoder {
        async fn reverse(&self, _point: GeoPoint) -> AnyResult<Address> {
            Ok(Address {
                street: Some("Av. Providencia 1208".to_string()),
                neighborhood: None,
                city: Some("Santiago".to_string()),
                region: None,
            })
        }
    }

    /// Halves the byte count per attempt, so compression converges fast.
    struct FakeCodec;

    impl ImageCodec for FakeCodec {
        fn encode(
            &self,
            source: &EncodedImage,
            width: u32,
            height: u32,
            quality: f32,
        ) -> AnyResult<EncodedImage> {
            let size = (width as f32 * height as f32 * 0.1 * quality) as usize;
            Ok(EncodedImage {
                bytes: vec![0u8; size.min(source.bytes.len())],
                width,
                height,
                media_type: "image/jpeg".to_string(),
            })
        }
    }

    fn usecase_with(submitter: Arc<FakeSubmitter>) -> (Arc<VisitUseCase>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let manager = Arc::new(VisitSessionManager::new(
            store.clone(),
            Duration::from_millis(10),
        ));
        let guard = Arc::new(SubmissionGuard::new(store.clone(), 50));
        let resolver = Arc::new(LocationResolver::new(
            Arc::new(FakePositioning),
            Arc::new(FakeGeocoder),
            LocationTunables {
                position_timeout_ms: 200,
                geocode_timeout_ms: 100,
            },
        ));
        let history = Arc::new(VisitHistory::new(store.clone()));

        let usecase = Arc::new(VisitUseCase::new(
            manager,
            guard,
            resolver,
            submitter,
            Arc::new(FakeCodec),
            history,
            "maria",
            CompressionBudget {
                max_bytes: 220_000,
                max_dimension: 1280,
                initial_quality: 0.75,
            },
        ));
        (usecase, store)
    }

    fn complete_draft() -> DeliveryDraft {
        DeliveryDraft {
            receiver_name: "Ana Rojas".to_string(),
            company_name: "Comercial Andes".to_string(),
            photo: Some(EvidencePhoto {
                meta: EvidenceFileMeta {
                    name: "entrega.jpg".to_string(),
                    size: 2_000_000,
                    last_modified_ms: 1_715_000_000_000,
                    media_type: "image/jpeg".to_string(),
                },
                image: EncodedImage {
                    bytes: vec![0u8; 2_000_000],
                    width: 2000,
                    height: 2000,
                    media_type: "image/jpeg".to_string(),
                },
            }),
            signature: Some(vec![1, 2, 3, 4]),
        }
    }

    #[tokio::test]
    async fn test_start_visit_fills_location_asynchronously() {
        let (usecase, _store) = usecase_with(Arc::new(FakeSubmitter::new(false)));

        usecase.start_visit(7, 42).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let snapshot = usecase.manager.snapshot().await;
        let location = snapshot.location.expect("location should be filled");
        assert_eq!(location.latitude, -33.43);
        assert_eq!(
            location.label.as_deref(),
            Some("Av. Providencia 1208, Santiago")
        );
    }

    #[tokio::test]
    async fn test_complete_visit_submits_and_clears() {
        let submitter = Arc::new(FakeSubmitter::new(false));
        let (usecase, _store) = usecase_with(submitter.clone());

        usecase.start_visit(7, 42).await.unwrap();
        let receipt = usecase.complete_visit().await.unwrap();

        assert_eq!(receipt.visit_id, "v-1");
        assert_eq!(submitter.visits.lock().unwrap().len(), 1);
        // Cleared after a successful submission.
        assert_eq!(
            usecase.manager.snapshot().await.status,
            VisitStatus::NotStarted
        );
        // And recorded in the technician's history.
        assert_eq!(usecase.history.list("maria").len(), 1);
    }

    #[tokio::test]
    async fn test_failed_submission_leaves_completed_for_retry() {
        let (usecase, _store) = usecase_with(Arc::new(FakeSubmitter::new(true)));

        usecase.start_visit(7, 42).await.unwrap();
        let err = usecase.complete_visit().await.unwrap_err();
        assert!(matches!(err, TerrenoError::Submission(_)));

        // Still completed, not cleared: the snapshot survives for a retry.
        assert_eq!(
            usecase.manager.snapshot().await.status,
            VisitStatus::Completed
        );
        assert!(usecase.history.list("maria").is_empty());
    }

    #[tokio::test]
    async fn test_delivery_submit_then_duplicate() {
        let submitter = Arc::new(FakeSubmitter::new(false));
        let (usecase, _store) = usecase_with(submitter.clone());

        let outcome = usecase.submit_delivery(complete_draft()).await.unwrap();
        assert_eq!(
            outcome,
            DeliveryOutcome::Submitted {
                delivery_id: "d-1".to_string()
            }
        );

        // The same evidence again is blocked without touching the network.
        let outcome = usecase.submit_delivery(complete_draft()).await.unwrap();
        assert_eq!(outcome, DeliveryOutcome::Duplicate);
        assert_eq!(submitter.deliveries.lock().unwrap().len(), 1);

        // Different receiver, different fingerprint: goes through.
        let mut other = complete_draft();
        other.receiver_name = "Benito Soto".to_string();
        let outcome = usecase.submit_delivery(other).await.unwrap();
        assert!(matches!(outcome, DeliveryOutcome::Submitted { .. }));
    }

    #[tokio::test]
    async fn test_incomplete_draft_is_reported_not_submitted() {
        let submitter = Arc::new(FakeSubmitter::new(false));
        let (usecase, _store) = usecase_with(submitter.clone());

        let mut draft = complete_draft();
        draft.signature = None;
        let outcome = usecase.submit_delivery(draft).await.unwrap();

        assert_eq!(outcome, DeliveryOutcome::Incomplete);
        assert!(submitter.deliveries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submitted_photo_is_compressed_to_budget() {
        let submitter = Arc::new(FakeSubmitter::new(false));
        let (usecase, _store) = usecase_with(submitter.clone());

        usecase.submit_delivery(complete_draft()).await.unwrap();

        let deliveries = submitter.deliveries.lock().unwrap();
        assert_eq!(deliveries.len(), 1);
        assert!(deliveries[0].photo.bytes.len() <= 220_000);
        assert!(deliveries[0].photo.width <= 1280);
        // The original file identity is preserved for the backend.
        assert_eq!(deliveries[0].photo_meta.name, "entrega.jpg");
    }

    #[tokio::test]
    async fn test_failed_delivery_is_not_fingerprinted() {
        let (usecase, _store) = usecase_with(Arc::new(FakeSubmitter::new(true)));

        let err = usecase.submit_delivery(complete_draft()).await.unwrap_err();
        assert!(matches!(err, TerrenoError::Submission(_)));

        // The failed attempt must not poison the guard; a retry on a healthy
        // backend is not a duplicate.
        let fp = fingerprint(&complete_draft()).unwrap();
        assert!(!usecase.guard.is_duplicate(&fp));
    }
}
