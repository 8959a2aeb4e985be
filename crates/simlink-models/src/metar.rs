//! METAR text parsing.
//!
//! Only two facts are extracted from a report: visibility in whole statute
//! miles and the list of cloud layers. Tokens are scanned left to right and
//! every rule that matches a token applies, so a later visibility token
//! overwrites an earlier one.
//!
//! Fractional visibility (`1/2SM`, `M1/4SM`) is reported as `0`. The value is
//! not computed.

use crate::ident::FacilityCode;
use crate::weather::{CloudLayer, Coverage, Weather};

/// Visibility reported for `CAVOK` and `P6SM`.
pub const MAX_VISIBILITY_SM: u32 = 10;

/// Integer metres-per-statute-mile divisor used for metric visibility groups.
const METERS_PER_SM: u32 = 1609;

/// Parse a METAR report for `waypoint`.
///
/// ```
/// use simlink_models::{parse_metar, Coverage, FacilityCode};
///
/// let wx = parse_metar(
///     FacilityCode::parse("KJFK").unwrap(),
///     "KJFK 121851Z 18010KT 10SM FEW035 SCT250 22/12 A3001",
/// );
/// assert_eq!(wx.visibility, 10);
/// assert_eq!(wx.clouds[0].base, 3500);
/// assert_eq!(wx.clouds[0].coverage, Coverage::Few);
/// ```
pub fn parse_metar(waypoint: FacilityCode, metar: &str) -> Weather {
    let mut visibility = 0;
    let mut clouds = Vec::new();

    for (index, token) in metar.split_whitespace().enumerate() {
        if let Some(value) = token.strip_suffix("SM") {
            visibility = if value.contains('/') {
                0
            } else {
                leading_int(value).unwrap_or(0)
            };
        }

        if let Some(layer) = cloud_layer(token) {
            clouds.push(layer);
        }

        // CLR / SKC mean "no layers", which is already the default.

        if token == "CAVOK" || token == "P6SM" {
            visibility = MAX_VISIBILITY_SM;
        }

        if index > 0 && token.len() == 4 && token.bytes().all(|b| b.is_ascii_digit()) {
            if let Some(meters) = leading_int(token) {
                visibility = (meters / METERS_PER_SM).min(MAX_VISIBILITY_SM);
            }
        }
    }

    Weather {
        waypoint,
        visibility,
        clouds,
        raw_metar: metar.to_string(),
    }
}

/// Decode a `FEW035` / `OVC010CB` style group.
fn cloud_layer(token: &str) -> Option<CloudLayer> {
    if token.len() < 6 {
        return None;
    }
    let coverage = Coverage::from_layer_prefix(token.get(..3)?)?;
    let height = token.get(3..)?.trim_end_matches(|c: char| c.is_ascii_uppercase());
    let hundreds = leading_int(height)?;
    Some(CloudLayer {
        base: hundreds.saturating_mul(100),
        coverage,
    })
}

/// Parse the run of ASCII digits at the start of `s`.
fn leading_int(s: &str) -> Option<u32> {
    let end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    s[..end].parse().ok()
}
