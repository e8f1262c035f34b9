//! Delivery-evidence domain model.

use crate::media::EncodedImage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of the evidence file as picked on the device. The fingerprint is
/// computed over this identity, not the (re-compressed) pixel data, so the
/// same picked file always fingerprints the same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceFileMeta {
    pub name: String,
    pub size: u64,
    /// Last-modified timestamp in milliseconds since the epoch, as reported
    /// by the device file picker.
    pub last_modified_ms: i64,
    pub media_type: String,
}

/// The picked evidence photo: file identity plus decoded image payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidencePhoto {
    pub meta: EvidenceFileMeta,
    pub image: EncodedImage,
}

/// An in-progress delivery-evidence form. Fields stay optional until the
/// technician fills them; an incomplete draft is never fingerprinted.
#[derive(Debug, Clone, Default)]
pub struct DeliveryDraft {
    pub receiver_name: String,
    pub company_name: String,
    pub photo: Option<EvidencePhoto>,
    /// Encoded signature image captured on the canvas.
    pub signature: Option<Vec<u8>>,
}

/// The frozen payload handed to the submission client once the draft passed
/// the fingerprint guard.
#[derive(Debug, Clone)]
pub struct DeliveryRecord {
    pub receiver_name: String,
    pub company_name: String,
    pub delivered_at: DateTime<Utc>,
    pub photo_meta: EvidenceFileMeta,
    /// Compressed to the upload budget.
    pub photo: EncodedImage,
    pub signature: Vec<u8>,
}
