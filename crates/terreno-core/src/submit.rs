//! Backend submission seam.
//!
//! The core only consumes a generic submit operation; the REST endpoints,
//! auth headers and retry policy live behind this trait in
//! `terreno-infrastructure` and the host shell.

use crate::evidence::DeliveryRecord;
use crate::visit::VisitSession;
use anyhow::Result;
use async_trait::async_trait;

/// Backend acknowledgement of a completed visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitReceipt {
    pub visit_id: String,
}

/// Backend acknowledgement of a delivery-evidence submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub delivery_id: String,
}

/// Submits frozen snapshots to the backend.
#[async_trait]
pub trait SubmissionClient: Send + Sync {
    /// Submits a completed visit snapshot.
    async fn submit_visit(&self, visit: &VisitSession) -> Result<VisitReceipt>;

    /// Submits a delivery-evidence record (photo + signature).
    async fn submit_delivery(&self, delivery: &DeliveryRecord) -> Result<DeliveryReceipt>;
}
