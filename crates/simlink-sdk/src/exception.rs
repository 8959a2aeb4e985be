//! Host-reported exceptions.

use serde::{Deserialize, Serialize};

/// Host exception names, indexed by exception code.
const EXCEPTION_NAMES: [&str; 38] = [
    "NONE",
    "ERROR",
    "SIZE_MISMATCH",
    "UNRECOGNIZED_ID",
    "UNOPENED",
    "VERSION_MISMATCH",
    "TOO_MANY_GROUPS",
    "NAME_UNRECOGNIZED",
    "TOO_MANY_EVENT_NAMES",
    "EVENT_ID_DUPLICATE",
    "TOO_MANY_MAPS",
    "TOO_MANY_OBJECTS",
    "TOO_MANY_REQUESTS",
    "WEATHER_INVALID_PORT",
    "WEATHER_INVALID_METAR",
    "WEATHER_UNABLE_TO_GET_OBSERVATION",
    "WEATHER_UNABLE_TO_CREATE_STATION",
    "WEATHER_UNABLE_TO_REMOVE_STATION",
    "INVALID_DATA_TYPE",
    "INVALID_DATA_SIZE",
    "DATA_ERROR",
    "INVALID_ARRAY",
    "CREATE_OBJECT_FAILED",
    "LOAD_FLIGHTPLAN_FAILED",
    "OPERATION_INVALID_FOR_OBJECT_TYPE",
    "ILLEGAL_OPERATION",
    "ALREADY_SUBSCRIBED",
    "INVALID_ENUM",
    "DEFINITION_ERROR",
    "DUPLICATE_ID",
    "DATUM_ID",
    "OUT_OF_BOUNDS",
    "ALREADY_CREATED",
    "OBJECT_OUTSIDE_REALITY_BUBBLE",
    "OBJECT_CONTAINER",
    "OBJECT_AI",
    "OBJECT_ATC",
    "OBJECT_SCHEDULE",
];

/// Best-effort name for a host exception code, `UNKNOWN_<code>` otherwise.
pub fn exception_label(code: u32) -> String {
    usize::try_from(code)
        .ok()
        .and_then(|i| EXCEPTION_NAMES.get(i))
        .map_or_else(|| format!("UNKNOWN_{code}"), |name| (*name).to_string())
}

/// An exception message received from the host.
///
/// Receiving one aborts the whole in-flight batch.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("host exception {code} ({name}) for send id {send_id}, field index {index}")]
pub struct ProtocolException {
    /// Raw exception code.
    pub code: u32,
    /// Name from the exception table.
    pub name: String,
    /// Id of the send that caused the exception.
    pub send_id: u32,
    /// Index of the offending parameter, when the host reports one.
    pub index: u32,
}

impl ProtocolException {
    /// Build an exception from raw host fields.
    pub fn new(code: u32, send_id: u32, index: u32) -> Self {
        Self {
            code,
            name: exception_label(code),
            send_id,
            index,
        }
    }
}
