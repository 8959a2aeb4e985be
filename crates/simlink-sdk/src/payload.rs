//! Typed views over facility and sim-object payloads.
//!
//! The layouts follow the field lists registered in
//! [`definitions`](crate::definitions): the host packs each registered field
//! in order, with no padding.

use simlink_models::{Coordinates, FrequencyRecord};

use crate::dispatch::{DecodeError, FieldReader};

/// Width of the fixed name buffer in a frequency record.
pub const FREQUENCY_NAME_LEN: usize = 64;

/// Size of a frequency payload: type, hertz and name.
pub const FREQUENCY_PAYLOAD_LEN: usize = 8 + FREQUENCY_NAME_LEN;

/// Size of a coordinate payload: latitude and longitude.
pub const COORDINATE_PAYLOAD_LEN: usize = 16;

/// Zero-terminated text from a fixed buffer.
///
/// Bytes are read as Latin-1, so every byte maps to exactly one character.
/// Without a terminator the whole buffer is used.
pub fn c_text(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| char::from(b))
        .collect()
}

/// Decode a frequency facility record.
pub fn decode_frequency(data: &[u8]) -> Result<FrequencyRecord, DecodeError> {
    let r = FieldReader::new(data);
    let type_code = r.i32_at(0, "frequency.type")?;
    let hz = r.i32_at(4, "frequency.hz")?;
    let name = c_text(r.bytes(8, FREQUENCY_NAME_LEN, "frequency.name")?);
    Ok(FrequencyRecord::new(type_code, hz, name))
}

/// Decode an airport or waypoint position record.
pub fn decode_coordinates(data: &[u8]) -> Result<Coordinates, DecodeError> {
    let r = FieldReader::new(data);
    Ok(Coordinates::new(
        r.f64_at(0, "coordinates.latitude")?,
        r.f64_at(8, "coordinates.longitude")?,
    ))
}

/// Decode a single 32-bit boolean datum. Any non-zero value is `true`.
pub fn decode_bool_scalar(data: &[u8]) -> Result<bool, DecodeError> {
    FieldReader::new(data)
        .i32_at(0, "datum.bool")
        .map(|v| v != 0)
}
