//! Deterministic fingerprinting of delivery-evidence submissions.
//!
//! The fingerprint is a 32-bit FNV-1a hash over the normalized candidate
//! payload, rendered as zero-padded hex. The same hash collapses the
//! signature image to a short value before it is folded into the payload, so
//! the fingerprint input never embeds megabytes of image data.

use crate::evidence::model::DeliveryDraft;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a over a byte slice.
pub fn fnv1a_32(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for &byte in bytes {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// FNV-1a rendered as zero-padded 8-char lowercase hex.
pub fn fnv1a_hex(bytes: &[u8]) -> String {
    format!("{:08x}", fnv1a_32(bytes))
}

/// Computes the submission fingerprint for a draft.
///
/// Returns `None` when any required field (receiver name, company name,
/// photo, signature) is absent, so an incomplete candidate can never be
/// wrongly treated as new or duplicate.
pub fn fingerprint(draft: &DeliveryDraft) -> Option<String> {
    let receiver = normalized(&draft.receiver_name)?;
    let company = normalized(&draft.company_name)?;
    let photo = draft.photo.as_ref()?;
    let signature = draft.signature.as_deref().filter(|sig| !sig.is_empty())?;

    let meta = &photo.meta;
    let payload = format!(
        "receiver={}|company={}|file={}:{}:{}:{}|signature={}",
        receiver,
        company,
        meta.name,
        meta.size,
        meta.last_modified_ms,
        meta.media_type,
        fnv1a_hex(signature),
    );

    Some(fnv1a_hex(payload.as_bytes()))
}

fn normalized(value: &str) -> Option<String> {
    let folded = value.trim().to_lowercase();
    if folded.is_empty() { None } else { Some(folded) }
}
