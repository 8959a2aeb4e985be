//! Facility and waypoint identifiers.
//!
//! The host accepts any airport or waypoint designator it knows about, so
//! a [`FacilityCode`] is only normalised (trimmed, upper-cased) and checked
//! for emptiness. Whether the host recognises it is decided by the host.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

// ---------------------------------------------------------------------------
// FacilityCode
// ---------------------------------------------------------------------------

/// A normalised airport or waypoint code (e.g. `"KJFK"`, `"EDDB"`).
///
/// # Examples
///
/// ```
/// use simlink_models::FacilityCode;
///
/// let code: FacilityCode = " kjfk ".parse().unwrap();
/// assert_eq!(code.as_str(), "KJFK");
///
/// assert!("   ".parse::<FacilityCode>().is_err());
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct FacilityCode(String);

impl FacilityCode {
    /// Normalise a raw code: trim surrounding whitespace and upper-case it.
    ///
    /// Fails with [`ModelError::InvalidCode`] when nothing is left.
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        let normalised = raw.trim().to_uppercase();
        if normalised.is_empty() {
            return Err(ModelError::InvalidCode {
                value: raw.to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(Self(normalised))
    }

    /// Return the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FacilityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for FacilityCode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for FacilityCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// List cleaning
// ---------------------------------------------------------------------------

/// Clean a caller-supplied list of codes.
///
/// Blank entries are dropped, the rest are normalised. Order is kept and
/// duplicates are not removed. An empty result is an error.
pub fn clean_codes<S: AsRef<str>>(raw: &[S]) -> Result<Vec<FacilityCode>, ModelError> {
    let cleaned: Vec<FacilityCode> = raw
        .iter()
        .filter_map(|s| FacilityCode::parse(s.as_ref()).ok())
        .collect();

    if cleaned.is_empty() {
        return Err(ModelError::NoCodes { given: raw.len() });
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_uppercases() {
        let code = FacilityCode::parse("  eddb\t").unwrap();
        assert_eq!(code.as_str(), "EDDB");
        assert_eq!(code.to_string(), "EDDB");
    }

    #[test]
    fn parse_rejects_blank() {
        let err = FacilityCode::parse(" \n ").unwrap_err();
        assert!(matches!(err, ModelError::InvalidCode { .. }));
    }

    #[test]
    fn clean_codes_drops_blanks_keeps_order_and_duplicates() {
        let cleaned = clean_codes(&["kjfk", " ", "eddb", "KJFK", ""]).unwrap();
        let names: Vec<&str> = cleaned.iter().map(FacilityCode::as_str).collect();
        assert_eq!(names, vec!["KJFK", "EDDB", "KJFK"]);
    }

    #[test]
    fn clean_codes_all_blank_is_error() {
        let err = clean_codes(&["", "  "]).unwrap_err();
        assert_eq!(err, ModelError::NoCodes { given: 2 });
    }

    #[test]
    fn clean_codes_empty_input_is_error() {
        let empty: [&str; 0] = [];
        assert_eq!(clean_codes(&empty).unwrap_err(), ModelError::NoCodes { given: 0 });
    }

    #[test]
    fn serializes_as_plain_string() {
        let code = FacilityCode::parse("lfpg").unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"LFPG\"");
    }
}
