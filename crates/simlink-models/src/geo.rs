//! Geographic coordinates and query boxes.

use serde::{Deserialize, Serialize};

use crate::cloud::AltitudeBand;

/// Approximate length of one degree of latitude, in kilometres.
pub const KM_PER_DEGREE_LAT: f64 = 111.0;

/// Half the edge of the box used for cloud-state queries, in kilometres.
pub const CLOUD_BOX_HALF_WIDTH_KM: f64 = 2.5;

/// A latitude / longitude pair in degrees.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in degrees, north positive.
    pub lat: f64,
    /// Longitude in degrees, east positive.
    pub lon: f64,
}

impl Coordinates {
    /// Create a coordinate pair.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A latitude / longitude / altitude box as sent to the host.
///
/// The host takes single-precision values; altitudes are in feet.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Southern edge.
    pub min_lat: f32,
    /// Western edge.
    pub min_lon: f32,
    /// Floor, in feet.
    pub min_alt: f32,
    /// Northern edge.
    pub max_lat: f32,
    /// Eastern edge.
    pub max_lon: f32,
    /// Ceiling, in feet.
    pub max_alt: f32,
}

impl BoundingBox {
    /// A square box of `half_width_km` either side of `center`, spanning `band`.
    ///
    /// The longitude half-width is scaled by `1 / cos(lat)`, which grows
    /// without bound towards the poles. No clamp is applied.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn around(center: Coordinates, half_width_km: f64, band: AltitudeBand) -> Self {
        let lat_offset = half_width_km / KM_PER_DEGREE_LAT;
        let lon_offset = half_width_km / (KM_PER_DEGREE_LAT * center.lat.to_radians().cos());

        Self {
            min_lat: (center.lat - lat_offset) as f32,
            min_lon: (center.lon - lon_offset) as f32,
            min_alt: band.min_ft as f32,
            max_lat: (center.lat + lat_offset) as f32,
            max_lon: (center.lon + lon_offset) as f32,
            max_alt: band.max_ft as f32,
        }
    }

    /// The default cloud-state query box around `center`.
    pub fn cloud_query(center: Coordinates, band: AltitudeBand) -> Self {
        Self::around(center, CLOUD_BOX_HALF_WIDTH_KM, band)
    }
}
