//! Encoded-image types and the platform encoding seam.

use anyhow::Result;

/// An encoded image (JPEG/PNG bytes) plus its pixel dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Media type of the encoding, e.g. `image/jpeg`.
    pub media_type: String,
}

impl EncodedImage {
    pub fn byte_size(&self) -> usize {
        self.bytes.len()
    }

    pub fn max_dimension(&self) -> u32 {
        self.width.max(self.height)
    }
}

/// Re-encoding primitive provided by the host platform (hardware codec,
/// canvas, or a software library). The compression loop drives it; the seam
/// keeps the loop independent of any one encoder.
pub trait ImageCodec: Send + Sync {
    /// Re-encodes `source` at the given target dimensions and quality
    /// (quality in `0.0..=1.0`, JPEG-style).
    fn encode(
        &self,
        source: &EncodedImage,
        width: u32,
        height: u32,
        quality: f32,
    ) -> Result<EncodedImage>;
}
