//! Canonical definition ids, request ids, field lists and session names.
//!
//! Every id handed to the host is defined here so that the client, the
//! scripted double and replay files agree on one numbering.
//!
//! # Id layout
//!
//! ```text
//! 0x1xxx  data definitions
//! 0x2xxx  facility requests        (waypoint batches: base + index)
//! 0x3xxx  weather observations     (base + index)
//! 0x4xxx  cloud-state queries      (base + band index)
//! 0x5xxx  sim-object data requests
//! 0x6xxx  object creation
//! ```

// ------------------------------------------------------------------
// Airport frequencies
// ------------------------------------------------------------------

/// Facility definition for airport frequencies.
pub const FREQUENCY_DEFINE_ID: u32 = 0x1001;

/// Request id for an airport frequency query.
pub const FREQUENCY_REQUEST_ID: u32 = 0x2001;

/// Fields registered on [`FREQUENCY_DEFINE_ID`], in order.
pub const FREQUENCY_FIELDS: [&str; 7] = [
    "OPEN AIRPORT",
    "OPEN FREQUENCY",
    "TYPE",
    "FREQUENCY",
    "NAME",
    "CLOSE FREQUENCY",
    "CLOSE AIRPORT",
];

// ------------------------------------------------------------------
// Waypoint coordinates
// ------------------------------------------------------------------

/// Facility definition for airport positions.
pub const WAYPOINT_DEFINE_ID: u32 = 0x1002;

/// First request id of a coordinate batch.
pub const WAYPOINT_REQUEST_ID_BASE: u32 = 0x2002;

/// Fields registered on [`WAYPOINT_DEFINE_ID`], in order.
pub const COORDINATE_FIELDS: [&str; 4] = ["OPEN AIRPORT", "LATITUDE", "LONGITUDE", "CLOSE AIRPORT"];

// ------------------------------------------------------------------
// Weather and clouds
// ------------------------------------------------------------------

/// First request id of a weather batch.
pub const WEATHER_REQUEST_ID_BASE: u32 = 0x3001;

/// First request id of a cloud density scan.
pub const CLOUD_STATE_REQUEST_ID_BASE: u32 = 0x4001;

/// Sim-object definition holding the in-cloud flag.
pub const IN_CLOUD_DEFINE_ID: u32 = 0x1003;

/// Request id for the in-cloud flag.
pub const IN_CLOUD_REQUEST_ID: u32 = 0x5001;

/// Datum name of the in-cloud flag.
pub const IN_CLOUD_DATUM: &str = "AMBIENT IN CLOUD";

/// Units of the in-cloud flag.
pub const IN_CLOUD_UNITS: &str = "Bool";

// ------------------------------------------------------------------
// Object creation
// ------------------------------------------------------------------

/// Request id for a simulated-object creation.
pub const CREATE_OBJECT_REQUEST_ID: u32 = 0x6001;

// ------------------------------------------------------------------
// Session names
// ------------------------------------------------------------------

/// Session name for frequency queries.
pub const SESSION_FREQUENCIES: &str = "simlink-freq-client";
/// Session name for weather queries.
pub const SESSION_WEATHER: &str = "simlink-weather-client";
/// Session name for coordinate lookups.
pub const SESSION_COORDINATES: &str = "simlink-coords-client";
/// Session name for cloud density scans.
pub const SESSION_CLOUD_DENSITY: &str = "simlink-cloud-density-client";
/// Session name for the in-cloud flag.
pub const SESSION_IN_CLOUD: &str = "simlink-in-cloud-client";
/// Session name for object creation.
pub const SESSION_CREATE_OBJECT: &str = "simlink-create-object-client";

/// Request id for item `index` of a batch starting at `base`.
///
/// Saturates at `u32::MAX`; the correlator rejects the resulting duplicate.
pub fn batch_request_id(base: u32, index: u32) -> u32 {
    base.saturating_add(index)
}
