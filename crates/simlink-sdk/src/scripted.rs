//! A scripted [`Connection`] for tests and offline replay.
//!
//! [`ScriptedConnection`] hands out a queue of prepared replies, one per
//! poll, and records every boundary call. Replies can be queued as raw
//! messages or described with [`ScriptedReply`], which deserializes from
//! JSON replay files.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use simlink_models::BoundingBox;

use crate::connection::{Connection, ConnectionError, DataType, InitPosition, Operation, SimObjectType};
use crate::dispatch::RawMessage;
use crate::frames;

/// One recorded boundary call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    /// `open(name)`.
    Open(String),
    /// `close()`.
    Close,
    /// `add_field(field, definition)`.
    AddField {
        /// Field name.
        field: String,
        /// Definition id.
        definition_id: u32,
    },
    /// `add_data_field(datum, units, datatype, definition)`.
    AddDataField {
        /// Datum name.
        datum: String,
        /// Units string.
        units: String,
        /// Datum type.
        datatype: DataType,
        /// Definition id.
        definition_id: u32,
    },
    /// `request_facility_data(key, region, definition, request)`.
    RequestFacilityData {
        /// Facility key.
        key: String,
        /// Region filter.
        region: String,
        /// Definition id.
        definition_id: u32,
        /// Request id.
        request_id: u32,
    },
    /// `request_weather_observation(key, request)`.
    RequestWeatherObservation {
        /// Station key.
        key: String,
        /// Request id.
        request_id: u32,
    },
    /// `request_cloud_state(bbox, request)`.
    RequestCloudState {
        /// Query box.
        bbox: BoundingBox,
        /// Request id.
        request_id: u32,
    },
    /// `request_data_on_sim_object_type(request, definition, radius, type)`.
    RequestDataOnSimObjectType {
        /// Request id.
        request_id: u32,
        /// Definition id.
        definition_id: u32,
        /// Radius in metres.
        radius: u32,
        /// Object category.
        object_type: SimObjectType,
    },
    /// `create_simulated_object(title, position, request)`.
    CreateSimulatedObject {
        /// Container title.
        title: String,
        /// Initial position.
        init_pos: InitPosition,
        /// Request id.
        request_id: u32,
    },
}

/// A replay step, as written in JSON replay files.
///
/// ```
/// use simlink_sdk::scripted::ScriptedReply;
///
/// let steps: Vec<ScriptedReply> = serde_json::from_str(r#"[
///     {"kind": "frequency", "request_id": 8193, "type_code": 6, "hz": 118700000, "name": "Tower"},
///     {"kind": "idle"},
///     {"kind": "facility_data_end", "request_id": 8193}
/// ]"#).unwrap();
/// assert_eq!(steps.len(), 3);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptedReply {
    /// A poll that returns nothing.
    Idle,
    /// A host exception.
    Exception {
        /// Exception code.
        code: u32,
        /// Offending send id.
        #[serde(default)]
        send_id: u32,
        /// Offending parameter index.
        #[serde(default)]
        index: u32,
    },
    /// A frequency facility record.
    Frequency {
        /// Request id.
        request_id: u32,
        /// Raw frequency type code.
        type_code: i32,
        /// Frequency in Hz.
        hz: i32,
        /// Facility name.
        name: String,
    },
    /// An airport position record.
    Coordinates {
        /// Request id.
        request_id: u32,
        /// Latitude in degrees.
        lat: f64,
        /// Longitude in degrees.
        lon: f64,
    },
    /// End of a facility request.
    FacilityDataEnd {
        /// Request id.
        request_id: u32,
    },
    /// A METAR observation.
    WeatherObservation {
        /// Request id.
        request_id: u32,
        /// METAR text.
        metar: String,
    },
    /// A full cloud grid filled with one density.
    CloudState {
        /// Request id.
        request_id: u32,
        /// Density of every cell.
        density: u8,
    },
    /// An assigned object id.
    AssignedObjectId {
        /// Request id.
        request_id: u32,
        /// Object id.
        object_id: u32,
    },
    /// The user aircraft's in-cloud flag.
    SimObjectFlag {
        /// Request id.
        request_id: u32,
        /// Flag value.
        value: bool,
    },
}

impl ScriptedReply {
    /// Encode this step; `None` for [`ScriptedReply::Idle`].
    pub fn to_message(&self) -> Option<RawMessage> {
        let raw = match self {
            Self::Idle => return None,
            Self::Exception { code, send_id, index } => frames::exception(*code, *send_id, *index),
            Self::Frequency { request_id, type_code, hz, name } => {
                frames::facility_frequency(*request_id, *type_code, *hz, name)
            }
            Self::Coordinates { request_id, lat, lon } => {
                frames::facility_coordinates(*request_id, *lat, *lon)
            }
            Self::FacilityDataEnd { request_id } => frames::facility_data_end(*request_id),
            Self::WeatherObservation { request_id, metar } => {
                frames::weather_observation(*request_id, metar)
            }
            Self::CloudState { request_id, density } => {
                frames::uniform_cloud_state(*request_id, *density)
            }
            Self::AssignedObjectId { request_id, object_id } => {
                frames::assigned_object_id(*request_id, *object_id)
            }
            Self::SimObjectFlag { request_id, value } => frames::sim_object_flag(*request_id, 1, *value),
        };
        Some(raw)
    }
}

/// In-memory host double.
#[derive(Debug, Default)]
pub struct ScriptedConnection {
    replies: VecDeque<Option<RawMessage>>,
    calls: Vec<Call>,
    failures: HashMap<Operation, i32>,
    open: bool,
    polls: usize,
    closes: usize,
}

impl ScriptedConnection {
    /// A connection with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// A connection that replays `steps` in order.
    pub fn from_replay(steps: &[ScriptedReply]) -> Self {
        let mut conn = Self::new();
        for step in steps {
            conn.replies.push_back(step.to_message());
        }
        conn
    }

    /// Queue a message for a later poll.
    pub fn push_reply(&mut self, message: RawMessage) -> &mut Self {
        self.replies.push_back(Some(message));
        self
    }

    /// Queue a poll that returns nothing.
    pub fn push_idle(&mut self) -> &mut Self {
        self.replies.push_back(None);
        self
    }

    /// Queue a replay step.
    pub fn push_step(&mut self, step: &ScriptedReply) -> &mut Self {
        self.replies.push_back(step.to_message());
        self
    }

    /// Make every later call of `operation` fail with `status`.
    pub fn fail(&mut self, operation: Operation, status: i32) -> &mut Self {
        self.failures.insert(operation, status);
        self
    }

    /// Calls made so far, in order.
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Number of `poll_dispatch` calls.
    pub fn poll_count(&self) -> usize {
        self.polls
    }

    /// Number of `close` calls.
    pub fn close_count(&self) -> usize {
        self.closes
    }

    /// Whether a session is currently open.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Replies not yet handed out.
    pub fn remaining(&self) -> usize {
        self.replies.len()
    }

    fn record(&mut self, operation: Operation, call: Call) -> Result<(), ConnectionError> {
        self.calls.push(call);
        match self.failures.get(&operation) {
            Some(&status) => Err(ConnectionError::new(operation, status)),
            None => Ok(()),
        }
    }
}

impl Connection for ScriptedConnection {
    fn open(&mut self, session_name: &str) -> Result<(), ConnectionError> {
        self.record(Operation::Open, Call::Open(session_name.to_string()))?;
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.calls.push(Call::Close);
        self.closes += 1;
        self.open = false;
    }

    fn add_field(&mut self, field_name: &str, definition_id: u32) -> Result<(), ConnectionError> {
        self.record(
            Operation::AddField,
            Call::AddField {
                field: field_name.to_string(),
                definition_id,
            },
        )
    }

    fn add_data_field(
        &mut self,
        datum_name: &str,
        units: &str,
        datatype: DataType,
        definition_id: u32,
    ) -> Result<(), ConnectionError> {
        self.record(
            Operation::AddDataField,
            Call::AddDataField {
                datum: datum_name.to_string(),
                units: units.to_string(),
                datatype,
                definition_id,
            },
        )
    }

    fn request_facility_data(
        &mut self,
        key: &str,
        region: &str,
        definition_id: u32,
        request_id: u32,
    ) -> Result<(), ConnectionError> {
        self.record(
            Operation::RequestFacilityData,
            Call::RequestFacilityData {
                key: key.to_string(),
                region: region.to_string(),
                definition_id,
                request_id,
            },
        )
    }

    fn request_weather_observation(&mut self, key: &str, request_id: u32) -> Result<(), ConnectionError> {
        self.record(
            Operation::RequestWeatherObservation,
            Call::RequestWeatherObservation {
                key: key.to_string(),
                request_id,
            },
        )
    }

    fn request_cloud_state(&mut self, bbox: BoundingBox, request_id: u32) -> Result<(), ConnectionError> {
        self.record(
            Operation::RequestCloudState,
            Call::RequestCloudState { bbox, request_id },
        )
    }

    fn request_data_on_sim_object_type(
        &mut self,
        request_id: u32,
        definition_id: u32,
        radius: u32,
        object_type: SimObjectType,
    ) -> Result<(), ConnectionError> {
        self.record(
            Operation::RequestDataOnSimObjectType,
            Call::RequestDataOnSimObjectType {
                request_id,
                definition_id,
                radius,
                object_type,
            },
        )
    }

    fn create_simulated_object(
        &mut self,
        title: &str,
        init_pos: InitPosition,
        request_id: u32,
    ) -> Result<(), ConnectionError> {
        self.record(
            Operation::CreateSimulatedObject,
            Call::CreateSimulatedObject {
                title: title.to_string(),
                init_pos,
                request_id,
            },
        )
    }

    fn poll_dispatch(&mut self) -> Option<RawMessage> {
        self.polls += 1;
        self.replies.pop_front().flatten()
    }
}
