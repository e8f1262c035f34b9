//! Location resolution with timeout races and offline fallback.
//!
//! Resolution is best-effort by design: every failure path degrades to a
//! less precise label, never to an error. The session carries whatever was
//! resolved; the coordinates alone stay authoritative for the backend.

use std::sync::Arc;
use terreno_core::config::LocationTunables;
use terreno_core::geo::{
    GeoPoint, PermissionStatus, PositionRequest, Positioning, ReverseGeocode, heuristic_label,
};
use terreno_core::race::{Raced, first_of};

/// Sentinel label when no coordinates could be acquired. The caller decides
/// whether to steer the user toward system settings.
pub const UNAVAILABLE_LABEL: &str = "Location unavailable";

/// Outcome of a full resolution pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub point: Option<GeoPoint>,
    pub label: String,
}

pub struct LocationResolver {
    positioning: Arc<dyn Positioning>,
    geocoder: Arc<dyn ReverseGeocode>,
    tunables: LocationTunables,
}

impl LocationResolver {
    pub fn new(
        positioning: Arc<dyn Positioning>,
        geocoder: Arc<dyn ReverseGeocode>,
        tunables: LocationTunables,
    ) -> Self {
        Self {
            positioning,
            geocoder,
            tunables,
        }
    }

    /// Full chain: permission, position fix, label.
    pub async fn locate(&self) -> ResolvedLocation {
        match self.acquire_position().await {
            Some(point) => ResolvedLocation {
                point: Some(point),
                label: self.resolve(point).await,
            },
            None => ResolvedLocation {
                point: None,
                label: UNAVAILABLE_LABEL.to_string(),
            },
        }
    }

    /// Acquires coordinates, racing the fix against the position budget so a
    /// stalled GPS never blocks the caller indefinitely.
    pub async fn acquire_position(&self) -> Option<GeoPoint> {
        match self.positioning.request_permission().await {
            Ok(PermissionStatus::Granted) => {}
            Ok(PermissionStatus::Denied) => {
                tracing::info!("[LocationResolver] Location permission denied");
                return None;
            }
            Err(err) => {
                tracing::warn!("[LocationResolver] Permission request failed: {}", err);
                return None;
            }
        }

        let request = PositionRequest {
            high_accuracy: true,
            timeout: self.tunables.position_timeout(),
        };
        match first_of(
            self.tunables.position_timeout(),
            self.positioning.current_position(request),
        )
        .await
        {
            Raced::Completed(Ok(point)) => Some(point),
            Raced::Completed(Err(err)) => {
                tracing::warn!("[LocationResolver] Position fix failed: {}", err);
                None
            }
            Raced::TimedOut => {
                tracing::warn!("[LocationResolver] Position fix timed out");
                None
            }
        }
    }

    /// Resolves a human-readable label for known coordinates: network
    /// reverse geocoding raced against the (shorter) geocode budget, falling
    /// back to the local bounding-box heuristic.
    pub async fn resolve(&self, point: GeoPoint) -> String {
        match first_of(self.tunables.geocode_timeout(), self.geocoder.reverse(point)).await {
            Raced::Completed(Ok(address)) => address
                .format_label()
                .unwrap_or_else(|| heuristic_label(point)),
            Raced::Completed(Err(err)) => {
                tracing::debug!(
                    "[LocationResolver] Reverse geocoding failed, using heuristic: {}",
                    err
                );
                heuristic_label(point)
            }
            Raced::TimedOut => {
                tracing::debug!("[LocationResolver] Reverse geocoding timed out, using heuristic");
                heuristic_label(point)
            }
        }
    }
}
