//! Airport radio frequencies.
//!
//! The host reports each frequency as a numeric type code, a frequency in
//! Hz and a fixed-width name. [`FrequencyRecord`] is the decoded form; the
//! type label comes from the closed [`FrequencyKind`] table.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// FrequencyKind
// ---------------------------------------------------------------------------

/// Frequency type codes as reported by the host.
///
/// The set is closed: codes outside `0..=15` have no variant and render as
/// `UNKNOWN_<code>` through [`frequency_label`].
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::FromRepr,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
#[repr(i32)]
pub enum FrequencyKind {
    /// No type assigned.
    #[strum(serialize = "NONE")]
    #[serde(rename = "NONE")]
    Unassigned = 0,
    /// Automatic terminal information service.
    Atis = 1,
    /// Multicom.
    Multicom = 2,
    /// Unicom.
    Unicom = 3,
    /// Common traffic advisory frequency.
    Ctaf = 4,
    /// Ground control.
    Ground = 5,
    /// Tower.
    Tower = 6,
    /// Clearance delivery.
    Clearance = 7,
    /// Approach control.
    Approach = 8,
    /// Departure control.
    Departure = 9,
    /// Area control centre.
    Center = 10,
    /// Flight service station.
    Fss = 11,
    /// Automated weather observing system.
    Awos = 12,
    /// Automated surface observing system.
    Asos = 13,
    /// Clearance pre-taxi.
    Cpt = 14,
    /// Ground communication outlet.
    Gco = 15,
}

impl FrequencyKind {
    /// Look up the kind for a raw host type code.
    pub fn from_code(code: i32) -> Option<Self> {
        Self::from_repr(code)
    }

    /// The raw host type code for this kind.
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Human label for a raw frequency type code.
///
/// ```
/// use simlink_models::frequency_label;
///
/// assert_eq!(frequency_label(6), "TOWER");
/// assert_eq!(frequency_label(42), "UNKNOWN_42");
/// ```
pub fn frequency_label(code: i32) -> String {
    match FrequencyKind::from_code(code) {
        Some(kind) => kind.to_string(),
        None => format!("UNKNOWN_{code}"),
    }
}

/// Convert a frequency in Hz to MHz.
///
/// Plain double-precision division; display rounding is left to callers.
pub fn hz_to_mhz(hz: i32) -> f64 {
    f64::from(hz) / 1_000_000.0
}

// ---------------------------------------------------------------------------
// FrequencyRecord
// ---------------------------------------------------------------------------

/// A single radio frequency published by an airport facility.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FrequencyRecord {
    /// Type label (`"TOWER"`, `"ATIS"`, `"UNKNOWN_99"`, …).
    #[serde(rename = "type")]
    pub kind: String,
    /// Raw host type code.
    pub type_code: i32,
    /// Facility-assigned name (e.g. `"Kennedy Tower"`).
    pub name: String,
    /// Frequency in Hz.
    pub hz: i32,
    /// Frequency in MHz.
    pub mhz: f64,
}

impl FrequencyRecord {
    /// Build a record from raw host values, deriving the label and MHz.
    pub fn new(type_code: i32, hz: i32, name: impl Into<String>) -> Self {
        Self {
            kind: frequency_label(type_code),
            type_code,
            name: name.into(),
            hz,
            mhz: hz_to_mhz(hz),
        }
    }
}
