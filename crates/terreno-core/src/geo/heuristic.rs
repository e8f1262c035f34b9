//! Offline fallback from coordinates to an administrative-area name.
//!
//! When reverse geocoding is unreachable, coordinates are matched against a
//! fixed table of bounding boxes covering the comunas where the company
//! operates. The boxes are coarse approximations with visible overlaps and
//! gaps; first match wins. Anything outside the table degrades to a compass
//! sector relative to the metro center.

use crate::geo::model::GeoPoint;

struct ComunaBox {
    name: &'static str,
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    max_lon: f64,
}

impl ComunaBox {
    fn contains(&self, point: GeoPoint) -> bool {
        point.latitude >= self.min_lat
            && point.latitude <= self.max_lat
            && point.longitude >= self.min_lon
            && point.longitude <= self.max_lon
    }
}

const COMUNA_BOXES: &[ComunaBox] = &[
    ComunaBox {
        name: "Providencia",
        min_lat: -33.455,
        max_lat: -33.405,
        min_lon: -70.645,
        max_lon: -70.585,
    },
    ComunaBox {
        name: "Las Condes",
        min_lat: -33.435,
        max_lat: -33.355,
        min_lon: -70.605,
        max_lon: -70.485,
    },
    ComunaBox {
        name: "Santiago",
        min_lat: -33.475,
        max_lat: -33.415,
        min_lon: -70.695,
        max_lon: -70.635,
    },
    ComunaBox {
        name: "Ñuñoa",
        min_lat: -33.475,
        max_lat: -33.425,
        min_lon: -70.635,
        max_lon: -70.565,
    },
    ComunaBox {
        name: "Maipú",
        min_lat: -33.535,
        max_lat: -33.465,
        min_lon: -70.805,
        max_lon: -70.695,
    },
    ComunaBox {
        name: "Pudahuel",
        min_lat: -33.465,
        max_lat: -33.375,
        min_lon: -70.855,
        max_lon: -70.725,
    },
    ComunaBox {
        name: "La Florida",
        min_lat: -33.555,
        max_lat: -33.495,
        min_lon: -70.625,
        max_lon: -70.535,
    },
    ComunaBox {
        name: "Puente Alto",
        min_lat: -33.625,
        max_lat: -33.545,
        min_lon: -70.605,
        max_lon: -70.515,
    },
];

/// Metro center used for the compass-sector fallback.
const CENTER_LAT: f64 = -33.4489;
const CENTER_LON: f64 = -70.6693;

/// Maps coordinates to a best-effort administrative label.
pub fn heuristic_label(point: GeoPoint) -> String {
    for comuna in COMUNA_BOXES {
        if comuna.contains(point) {
            return format!("{}, Región Metropolitana", comuna.name);
        }
    }

    let d_lat = point.latitude - CENTER_LAT;
    let d_lon = point.longitude - CENTER_LON;
    let sector = if d_lat.abs() >= d_lon.abs() {
        if d_lat >= 0.0 {
            "northern sector"
        } else {
            "southern sector"
        }
    } else if d_lon >= 0.0 {
        "eastern sector"
    } else {
        "western sector"
    };
    sector.to_string()
}
