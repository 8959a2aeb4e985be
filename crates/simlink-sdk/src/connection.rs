//! The host connection boundary.
//!
//! [`Connection`] is the only contract with the simulator host. The SDK never
//! constructs one itself: a native binding or the
//! [`ScriptedConnection`](crate::scripted::ScriptedConnection) double is
//! handed to [`SimClient`](crate::SimClient) at construction time.
//!
//! A host session is scoped with [`Session`], which closes it on drop.

use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};
use simlink_models::BoundingBox;

use crate::dispatch::RawMessage;

// ---------------------------------------------------------------------------
// Operation / ConnectionError
// ---------------------------------------------------------------------------

/// Boundary operations that can fail with a host status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    /// Open a host session.
    Open,
    /// Append a field to a facility definition.
    AddField,
    /// Append a datum to a sim-object data definition.
    AddDataField,
    /// Request facility data.
    RequestFacilityData,
    /// Request a weather observation at a station.
    RequestWeatherObservation,
    /// Request the cloud state inside a box.
    RequestCloudState,
    /// Request data for sim objects of a type.
    RequestDataOnSimObjectType,
    /// Create a simulated object.
    CreateSimulatedObject,
}

/// A boundary call was rejected by the host.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation} failed HRESULT=0x{status:08X}")]
pub struct ConnectionError {
    /// The operation that failed.
    pub operation: Operation,
    /// Raw host status code.
    pub status: i32,
}

impl ConnectionError {
    /// Create an error for `operation` with host status `status`.
    pub fn new(operation: Operation, status: i32) -> Self {
        Self { operation, status }
    }
}

// ---------------------------------------------------------------------------
// Definition and request parameter types
// ---------------------------------------------------------------------------

/// Data types accepted when registering a sim-object datum.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[repr(u32)]
pub enum DataType {
    /// Invalid / unset.
    Invalid = 0,
    /// 32-bit signed integer.
    Int32 = 1,
    /// 64-bit signed integer.
    Int64 = 2,
    /// 32-bit float.
    Float32 = 3,
    /// 64-bit float.
    Float64 = 4,
}

impl DataType {
    /// The host discriminant.
    pub fn code(self) -> u32 {
        self as u32
    }
}

/// Sim object categories for type-wide data requests.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[repr(u32)]
pub enum SimObjectType {
    /// The user's own aircraft.
    User = 0,
    /// Every object.
    All = 1,
    /// Fixed-wing aircraft.
    Aircraft = 2,
    /// Helicopters.
    Helicopter = 3,
    /// Boats.
    Boat = 4,
    /// Ground vehicles.
    Ground = 5,
}

impl SimObjectType {
    /// The host discriminant.
    pub fn code(self) -> u32 {
        self as u32
    }
}

/// Initial placement for a created simulated object.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct InitPosition {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Altitude in feet.
    pub altitude: f64,
    /// Pitch in degrees.
    pub pitch: f64,
    /// Bank in degrees.
    pub bank: f64,
    /// Heading in degrees.
    pub heading: f64,
    /// Whether the object starts on the ground.
    pub on_ground: bool,
    /// Indicated airspeed in knots.
    pub airspeed: u32,
}

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

/// Capability to talk to a simulator host.
///
/// Every send method returns as soon as the host has accepted the request;
/// replies arrive later through [`poll_dispatch`](Self::poll_dispatch).
pub trait Connection {
    /// Open a session under `session_name`.
    fn open(&mut self, session_name: &str) -> Result<(), ConnectionError>;

    /// Close the current session. Closing an unopened session is a no-op.
    fn close(&mut self);

    /// Append `field_name` to facility definition `definition_id`.
    fn add_field(&mut self, field_name: &str, definition_id: u32) -> Result<(), ConnectionError>;

    /// Append a datum to sim-object data definition `definition_id`.
    fn add_data_field(
        &mut self,
        datum_name: &str,
        units: &str,
        datatype: DataType,
        definition_id: u32,
    ) -> Result<(), ConnectionError>;

    /// Request facility data for `key` using a registered definition.
    fn request_facility_data(
        &mut self,
        key: &str,
        region: &str,
        definition_id: u32,
        request_id: u32,
    ) -> Result<(), ConnectionError>;

    /// Request the current METAR observation at station `key`.
    fn request_weather_observation(&mut self, key: &str, request_id: u32)
        -> Result<(), ConnectionError>;

    /// Request the cloud density grid inside `bbox`.
    fn request_cloud_state(&mut self, bbox: BoundingBox, request_id: u32)
        -> Result<(), ConnectionError>;

    /// Request a data definition for every object of `object_type` within `radius` metres.
    fn request_data_on_sim_object_type(
        &mut self,
        request_id: u32,
        definition_id: u32,
        radius: u32,
        object_type: SimObjectType,
    ) -> Result<(), ConnectionError>;

    /// Create a simulated object from container `title` at `init_pos`.
    fn create_simulated_object(
        &mut self,
        title: &str,
        init_pos: InitPosition,
        request_id: u32,
    ) -> Result<(), ConnectionError>;

    /// Take the next pending dispatch message, if any. Never blocks.
    fn poll_dispatch(&mut self) -> Option<RawMessage>;
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// An open host session, closed when dropped.
///
/// If [`Session::open`] fails no session exists and `close` is not called.
pub struct Session<'a, C: Connection + ?Sized> {
    connection: &'a mut C,
}

impl<'a, C: Connection + ?Sized> Session<'a, C> {
    /// Open a session on `connection`.
    pub fn open(connection: &'a mut C, name: &str) -> Result<Self, ConnectionError> {
        connection.open(name)?;
        Ok(Self { connection })
    }
}

impl<C: Connection + ?Sized> Deref for Session<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.connection
    }
}

impl<C: Connection + ?Sized> DerefMut for Session<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.connection
    }
}

impl<C: Connection + ?Sized> Drop for Session<'_, C> {
    fn drop(&mut self) {
        self.connection.close();
    }
}
