//! Weather at a station: visibility and cloud layers.

use serde::{Deserialize, Serialize};

use crate::ident::FacilityCode;

// ---------------------------------------------------------------------------
// Coverage
// ---------------------------------------------------------------------------

/// Sky coverage in METAR notation.
///
/// Layers parsed from METAR text are never [`Coverage::Clear`]; that value
/// only appears on interpreted cloud density samples.
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum Coverage {
    /// No cloud.
    #[strum(serialize = "CLR")]
    #[serde(rename = "CLR")]
    Clear,
    /// 1/8 to 2/8.
    #[strum(serialize = "FEW")]
    #[serde(rename = "FEW")]
    Few,
    /// 3/8 to 4/8.
    #[strum(serialize = "SCT")]
    #[serde(rename = "SCT")]
    Scattered,
    /// 5/8 to 7/8.
    #[strum(serialize = "BKN")]
    #[serde(rename = "BKN")]
    Broken,
    /// 8/8.
    #[strum(serialize = "OVC")]
    #[serde(rename = "OVC")]
    Overcast,
}

impl Coverage {
    /// Parse one of the four layer prefixes (`FEW`, `SCT`, `BKN`, `OVC`).
    ///
    /// `CLR` is not a layer prefix and returns `None`.
    pub fn from_layer_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "FEW" => Some(Self::Few),
            "SCT" => Some(Self::Scattered),
            "BKN" => Some(Self::Broken),
            "OVC" => Some(Self::Overcast),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// CloudLayer
// ---------------------------------------------------------------------------

/// A single reported cloud layer.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloudLayer {
    /// Layer base in feet.
    pub base: u32,
    /// Layer coverage.
    pub coverage: Coverage,
}

// ---------------------------------------------------------------------------
// Weather
// ---------------------------------------------------------------------------

/// Weather observed at one station, parsed from its METAR.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Weather {
    /// The station the observation belongs to.
    pub waypoint: FacilityCode,
    /// Visibility in whole statute miles (0–10).
    pub visibility: u32,
    /// Cloud layers in the order they appear in the report.
    pub clouds: Vec<CloudLayer>,
    /// The METAR text as received from the host.
    pub raw_metar: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn coverage_display_codes() {
        let codes: Vec<String> = Coverage::iter().map(|c| c.to_string()).collect();
        assert_eq!(codes, vec!["CLR", "FEW", "SCT", "BKN", "OVC"]);
    }

    #[test]
    fn coverage_from_str() {
        assert_eq!(Coverage::from_str("BKN").unwrap(), Coverage::Broken);
        assert!(Coverage::from_str("XXX").is_err());
    }

    #[test]
    fn layer_prefix_excludes_clear() {
        assert_eq!(Coverage::from_layer_prefix("OVC"), Some(Coverage::Overcast));
        assert_eq!(Coverage::from_layer_prefix("CLR"), None);
        assert_eq!(Coverage::from_layer_prefix("SKC"), None);
    }

    #[test]
    fn weather_serde_roundtrip() {
        let weather = Weather {
            waypoint: FacilityCode::parse("KJFK").unwrap(),
            visibility: 10,
            clouds: vec![CloudLayer {
                base: 3500,
                coverage: Coverage::Few,
            }],
            raw_metar: "KJFK 121851Z 10SM FEW035".into(),
        };
        let json = serde_json::to_string(&weather).unwrap();
        assert!(json.contains("\"coverage\":\"FEW\""));
        let back: Weather = serde_json::from_str(&json).unwrap();
        assert_eq!(weather, back);
    }
}
