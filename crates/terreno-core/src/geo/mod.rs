//! Geolocation domain module.

mod heuristic;
mod model;

pub use heuristic::heuristic_label;
pub use model::{
    Address, GeoPoint, PermissionStatus, PositionRequest, Positioning, ReverseGeocode,
};
