//! Tunable knobs for the visit subsystem.
//!
//! All values carry defaults matching the production app; hosts may override
//! any subset from a TOML file (see `terreno-infrastructure`).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Debounce windows for auto-save behavior, in milliseconds.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AutosaveTunables {
    /// Idle window applied per field-change source before forwarding the
    /// latest value into the session.
    #[serde(default = "default_source_debounce_ms")]
    pub source_debounce_ms: u64,
    /// Idle window applied by the session manager before a mid-session edit
    /// is written to the durable store.
    #[serde(default = "default_persist_debounce_ms")]
    pub persist_debounce_ms: u64,
}

/// Timeout budgets for location resolution, in milliseconds.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct LocationTunables {
    /// Budget for acquiring a device position fix.
    #[serde(default = "default_position_timeout_ms")]
    pub position_timeout_ms: u64,
    /// Budget for the network reverse-geocoding call. Kept shorter than the
    /// positioning budget so a stalled backend never dominates the flow.
    #[serde(default = "default_geocode_timeout_ms")]
    pub geocode_timeout_ms: u64,
}

/// Byte/dimension budget for evidence photos prior to upload.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct UploadTunables {
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: usize,
    #[serde(default = "default_max_upload_dimension")]
    pub max_dimension: u32,
    #[serde(default = "default_initial_quality")]
    pub initial_quality: f32,
}

/// Root tunables struct for the subsystem.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Tunables {
    #[serde(default)]
    pub autosave: AutosaveTunables,
    #[serde(default)]
    pub location: LocationTunables,
    #[serde(default)]
    pub upload: UploadTunables,
    /// Maximum number of remembered submission fingerprints.
    #[serde(default = "default_fingerprint_capacity")]
    pub fingerprint_capacity: usize,
}

impl AutosaveTunables {
    pub fn source_debounce(&self) -> Duration {
        Duration::from_millis(self.source_debounce_ms)
    }

    pub fn persist_debounce(&self) -> Duration {
        Duration::from_millis(self.persist_debounce_ms)
    }
}

impl LocationTunables {
    pub fn position_timeout(&self) -> Duration {
        Duration::from_millis(self.position_timeout_ms)
    }

    pub fn geocode_timeout(&self) -> Duration {
        Duration::from_millis(self.geocode_timeout_ms)
    }
}

impl Default for AutosaveTunables {
    fn default() -> Self {
        Self {
            source_debounce_ms: default_source_debounce_ms(),
            persist_debounce_ms: default_persist_debounce_ms(),
        }
    }
}

impl Default for LocationTunables {
    fn default() -> Self {
        Self {
            position_timeout_ms: default_position_timeout_ms(),
            geocode_timeout_ms: default_geocode_timeout_ms(),
        }
    }
}

impl Default for UploadTunables {
    fn default() -> Self {
        Self {
            max_bytes: default_max_upload_bytes(),
            max_dimension: default_max_upload_dimension(),
            initial_quality: default_initial_quality(),
        }
    }
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            autosave: AutosaveTunables::default(),
            location: LocationTunables::default(),
            upload: UploadTunables::default(),
            fingerprint_capacity: default_fingerprint_capacity(),
        }
    }
}

fn default_source_debounce_ms() -> u64 {
    1000
}

fn default_persist_debounce_ms() -> u64 {
    500
}

fn default_position_timeout_ms() -> u64 {
    8000
}

fn default_geocode_timeout_ms() -> u64 {
    3500
}

fn default_max_upload_bytes() -> usize {
    220_000
}

fn default_max_upload_dimension() -> u32 {
    1280
}

fn default_initial_quality() -> f32 {
    0.75
}

fn default_fingerprint_capacity() -> usize {
    50
}
