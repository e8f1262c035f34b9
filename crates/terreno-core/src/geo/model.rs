//! Geolocation types and trait seams.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A raw coordinate pair from the positioning hardware.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Outcome of a location-permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Options forwarded to the positioning hardware.
#[derive(Debug, Clone, Copy)]
pub struct PositionRequest {
    pub high_accuracy: bool,
    /// Hint to the hardware; the caller still races the call against its own
    /// budget, so a misbehaving implementation cannot stall the flow.
    pub timeout: Duration,
}

/// Device positioning primitives, provided by the host platform.
#[async_trait]
pub trait Positioning: Send + Sync {
    /// Checks the current permission, requesting it if undetermined.
    async fn request_permission(&self) -> Result<PermissionStatus>;

    /// Acquires the current device position.
    async fn current_position(&self, request: PositionRequest) -> Result<GeoPoint>;
}

/// A structured reverse-geocoding response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub street: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
}

impl Address {
    /// Formats `"<street>, <neighborhood>, <city>, <region>"`, omitting
    /// unavailable parts. Returns `None` when every part is missing.
    pub fn format_label(&self) -> Option<String> {
        let parts: Vec<&str> = [
            self.street.as_deref(),
            self.neighborhood.as_deref(),
            self.city.as_deref(),
            self.region.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.trim().is_empty())
        .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// Network reverse geocoding, implemented in `terreno-infrastructure`.
#[async_trait]
pub trait ReverseGeocode: Send + Sync {
    async fn reverse(&self, point: GeoPoint) -> Result<Address>;
}
