//! Cloud density samples.
//!
//! The host reports cloud density as one byte per grid cell. A byte is
//! mapped to a percentage and a METAR-style coverage bucket by
//! [`interpret_density`]; the mapping is total over `0..=255`.

use serde::{Deserialize, Serialize};

use crate::weather::Coverage;

/// Edge length of the density grid returned for a cloud-state query.
pub const CLOUD_GRID_SIZE: usize = 64;

/// Lowest altitude of a density scan, in feet.
pub const SCAN_FLOOR_FT: u32 = 0;

/// Altitude at which a density scan stops, in feet (exclusive band start).
pub const SCAN_CEILING_FT: u32 = 10_000;

/// Height of one density scan band, in feet.
pub const SCAN_STEP_FT: u32 = 500;

// ---------------------------------------------------------------------------
// AltitudeBand
// ---------------------------------------------------------------------------

/// A vertical slice of the atmosphere, in feet.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AltitudeBand {
    /// Bottom of the band.
    pub min_ft: u32,
    /// Top of the band.
    pub max_ft: u32,
}

impl AltitudeBand {
    /// The fixed band reported by the in-cloud fallback.
    pub const IN_CLOUD_FALLBACK: AltitudeBand = AltitudeBand {
        min_ft: 3000,
        max_ft: 3500,
    };

    /// Create a band.
    pub fn new(min_ft: u32, max_ft: u32) -> Self {
        Self { min_ft, max_ft }
    }
}

/// The bands of a full density scan, lowest first.
///
/// ```
/// use simlink_models::scan_bands;
///
/// let bands: Vec<_> = scan_bands().collect();
/// assert_eq!(bands.len(), 20);
/// assert_eq!((bands[0].min_ft, bands[0].max_ft), (0, 500));
/// assert_eq!((bands[19].min_ft, bands[19].max_ft), (9500, 10_000));
/// ```
pub fn scan_bands() -> impl Iterator<Item = AltitudeBand> {
    (SCAN_FLOOR_FT..SCAN_CEILING_FT)
        .step_by(SCAN_STEP_FT as usize)
        .map(|min| AltitudeBand::new(min, min + SCAN_STEP_FT))
}

// ---------------------------------------------------------------------------
// CloudDensitySample
// ---------------------------------------------------------------------------

/// Interpreted cloud density for one altitude band.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct CloudDensitySample {
    /// Raw density byte as reported by the host.
    pub value: u8,
    /// `value / 255 * 100`.
    pub percentage: f64,
    /// Coverage bucket.
    pub coverage: Coverage,
    /// Bottom of the sampled band, in feet.
    pub min_alt: u32,
    /// Top of the sampled band, in feet.
    pub max_alt: u32,
}

impl CloudDensitySample {
    /// Interpret `value` and attach it to `band`.
    pub fn in_band(value: u8, band: AltitudeBand) -> Self {
        Self {
            min_alt: band.min_ft,
            max_alt: band.max_ft,
            ..interpret_density(value)
        }
    }

    /// Synthesise a sample from the aircraft "in cloud" flag.
    ///
    /// This is not a measurement: `true` reads as fully overcast and
    /// `false` as clear, both in [`AltitudeBand::IN_CLOUD_FALLBACK`].
    pub fn from_in_cloud(in_cloud: bool) -> Self {
        let value = if in_cloud { u8::MAX } else { 0 };
        Self::in_band(value, AltitudeBand::IN_CLOUD_FALLBACK)
    }

    /// The band this sample was taken in.
    pub fn band(&self) -> AltitudeBand {
        AltitudeBand::new(self.min_alt, self.max_alt)
    }
}

/// Interpret a raw density byte. The altitude band is left at zero.
///
/// ```
/// use simlink_models::{interpret_density, Coverage};
///
/// assert_eq!(interpret_density(0).coverage, Coverage::Clear);
/// assert_eq!(interpret_density(255).coverage, Coverage::Overcast);
/// ```
pub fn interpret_density(value: u8) -> CloudDensitySample {
    let coverage = match value {
        0 => Coverage::Clear,
        1..=63 => Coverage::Few,
        64..=127 => Coverage::Scattered,
        128..=191 => Coverage::Broken,
        192..=255 => Coverage::Overcast,
    };

    CloudDensitySample {
        value,
        percentage: f64::from(value) / 255.0 * 100.0,
        coverage,
        min_alt: 0,
        max_alt: 0,
    }
}

/// The density byte at the centre cell (row 32, column 32) of a grid.
///
/// A grid too short to hold the centre cell reads as clear (`0`).
pub fn center_density(grid: &[u8]) -> u8 {
    let center = (CLOUD_GRID_SIZE / 2) * CLOUD_GRID_SIZE + CLOUD_GRID_SIZE / 2;
    grid.get(center).copied().unwrap_or(0)
}
