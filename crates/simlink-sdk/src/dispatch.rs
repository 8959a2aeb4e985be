//! Dispatch message decoding.
//!
//! Every message returned by [`Connection::poll_dispatch`](crate::Connection::poll_dispatch)
//! starts with the same 12-byte header:
//!
//! ```text
//! ┌──────────┬──────────┬──────────┬──────────────────────────┐
//! │ Size     │ Version  │ Kind     │ kind-specific fields …   │
//! │ u32 LE   │ u32 LE   │ u32 LE   │                          │
//! └──────────┴──────────┴──────────┴──────────────────────────┘
//! ```
//!
//! The declared size is checked against the buffer first; every later read
//! is bounded by the declared size and fails with [`DecodeError`] instead of
//! reading past it.

use serde::{Deserialize, Serialize};

use crate::exception::ProtocolException;
use crate::payload;

/// Size of the common header in bytes.
pub const HEADER_SIZE: usize = 12;

/// Capacity of the METAR text buffer in a weather observation.
pub const METAR_BUFFER_LEN: usize = 512;

/// Facility data type discriminator for airport records.
pub const FACILITY_DATA_AIRPORT: u32 = 0;

/// Facility data type discriminator for frequency records.
pub const FACILITY_DATA_FREQUENCY: u32 = 3;

// Field offsets, relative to the start of the message.
const EXCEPTION_CODE: usize = 12;
const EXCEPTION_SEND_ID: usize = 16;
const EXCEPTION_INDEX: usize = 20;
const REQUEST_ID: usize = 12;
const FACILITY_UNIQUE_ID: usize = 16;
const FACILITY_PARENT_ID: usize = 20;
const FACILITY_TYPE: usize = 24;
const FACILITY_IS_LIST_ITEM: usize = 28;
const FACILITY_ITEM_INDEX: usize = 32;
const FACILITY_LIST_SIZE: usize = 36;
const FACILITY_DATA: usize = 40;
const WEATHER_METAR: usize = 16;
const CLOUD_ARRAY_SIZE: usize = 16;
const CLOUD_DATA: usize = 20;
const OBJECT_ID: usize = 16;
const SIM_OBJECT_DEFINE_ID: usize = 20;
const SIM_OBJECT_ENTRY: usize = 28;
const SIM_OBJECT_OUT_OF: usize = 32;
const SIM_OBJECT_DATA: usize = 40;

// ---------------------------------------------------------------------------
// DecodeError
// ---------------------------------------------------------------------------

/// A dispatch message could not be decoded safely.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// A field extends past the end of the message.
    #[error("message too short for {field}: need {needed} bytes, have {available}")]
    TooShort {
        /// The field being read.
        field: &'static str,
        /// Bytes required to read it.
        needed: usize,
        /// Bytes actually available.
        available: usize,
    },

    /// The header declares more bytes than were delivered.
    #[error("declared message size {declared} exceeds the {actual} bytes received")]
    SizeMismatch {
        /// Size from the header.
        declared: u32,
        /// Length of the received buffer.
        actual: usize,
    },
}

// ---------------------------------------------------------------------------
// Bounds-checked field reader
// ---------------------------------------------------------------------------

/// Little-endian reads over a byte slice, each checked against its length.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldReader<'a> {
    buf: &'a [u8],
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub(crate) fn bytes(
        &self,
        offset: usize,
        len: usize,
        field: &'static str,
    ) -> Result<&'a [u8], DecodeError> {
        let end = offset.checked_add(len).ok_or(DecodeError::TooShort {
            field,
            needed: usize::MAX,
            available: self.buf.len(),
        })?;
        self.buf.get(offset..end).ok_or(DecodeError::TooShort {
            field,
            needed: end,
            available: self.buf.len(),
        })
    }

    /// Everything from `offset` to the end; empty if `offset` is exactly the end.
    pub(crate) fn rest(&self, offset: usize, field: &'static str) -> Result<&'a [u8], DecodeError> {
        self.buf.get(offset..).ok_or(DecodeError::TooShort {
            field,
            needed: offset,
            available: self.buf.len(),
        })
    }

    fn array<const N: usize>(&self, offset: usize, field: &'static str) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(offset, N, field)?);
        Ok(out)
    }

    pub(crate) fn u32_at(&self, offset: usize, field: &'static str) -> Result<u32, DecodeError> {
        self.array(offset, field).map(u32::from_le_bytes)
    }

    pub(crate) fn i32_at(&self, offset: usize, field: &'static str) -> Result<i32, DecodeError> {
        self.array(offset, field).map(i32::from_le_bytes)
    }

    pub(crate) fn f64_at(&self, offset: usize, field: &'static str) -> Result<f64, DecodeError> {
        self.array(offset, field).map(f64::from_le_bytes)
    }
}

// ---------------------------------------------------------------------------
// RawMessage
// ---------------------------------------------------------------------------

/// One undecoded dispatch message, copied out of the host's buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage(Vec<u8>);

impl RawMessage {
    /// Wrap raw bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Decode this message. See [`decode`].
    pub fn decode(&self) -> Result<DispatchMessage, DecodeError> {
        decode(self.as_bytes())
    }
}

impl From<Vec<u8>> for RawMessage {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

// ---------------------------------------------------------------------------
// Header / RecvKind
// ---------------------------------------------------------------------------

/// The fixed message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Declared total message size in bytes.
    pub size: u32,
    /// Host protocol version.
    pub version: u32,
    /// Kind tag.
    pub kind: u32,
}

/// Message kinds this crate decodes, with their host tag values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::FromRepr)]
#[strum(serialize_all = "snake_case")]
#[repr(u32)]
pub enum RecvKind {
    /// The host rejected a request.
    Exception = 1,
    /// Data for one sim object.
    SimObjectData = 8,
    /// Data for one sim object, from a type-wide request.
    SimObjectDataByType = 9,
    /// A station METAR.
    WeatherObservation = 10,
    /// A cloud density grid.
    CloudState = 11,
    /// Object id assigned to a created object.
    AssignedObjectId = 12,
    /// One facility data record.
    FacilityData = 28,
    /// End of a facility data request.
    FacilityDataEnd = 29,
}

/// Read and validate the header, returning it with the message bytes
/// truncated to the declared size.
pub fn decode_header(bytes: &[u8]) -> Result<(Header, &[u8]), DecodeError> {
    let reader = FieldReader::new(bytes);
    let header = Header {
        size: reader.u32_at(0, "header.size")?,
        version: reader.u32_at(4, "header.version")?,
        kind: reader.u32_at(8, "header.kind")?,
    };

    let declared = usize::try_from(header.size).unwrap_or(usize::MAX);
    if declared > bytes.len() {
        return Err(DecodeError::SizeMismatch {
            declared: header.size,
            actual: bytes.len(),
        });
    }
    if declared < HEADER_SIZE {
        return Err(DecodeError::TooShort {
            field: "header",
            needed: HEADER_SIZE,
            available: declared,
        });
    }
    Ok((header, &bytes[..declared]))
}

// ---------------------------------------------------------------------------
// DispatchMessage
// ---------------------------------------------------------------------------

/// One facility data record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FacilityData {
    /// The caller's request id.
    pub request_id: u32,
    /// Host-assigned id of this record.
    pub unique_request_id: u32,
    /// Host-assigned id of the parent record.
    pub parent_unique_request_id: u32,
    /// Record type discriminator (airport, frequency, …).
    pub data_type: u32,
    /// Whether this record is one element of a list.
    pub is_list_item: bool,
    /// Position in the list.
    pub item_index: u32,
    /// Length of the list.
    pub list_size: u32,
    /// Record payload, laid out per the registered definition.
    pub data: Vec<u8>,
}

/// Data for one sim object.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SimObjectData {
    /// The caller's request id.
    pub request_id: u32,
    /// The object the data belongs to.
    pub object_id: u32,
    /// The data definition used.
    pub define_id: u32,
    /// 1-based index of this object in a type-wide reply.
    pub entry_number: u32,
    /// Number of objects in a type-wide reply.
    pub out_of: u32,
    /// Datum values, laid out per the definition.
    pub data: Vec<u8>,
}

/// A decoded dispatch message.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum DispatchMessage {
    /// The host rejected a request.
    Exception(ProtocolException),
    /// One facility data record.
    FacilityData(FacilityData),
    /// End of a facility request.
    FacilityDataEnd {
        /// The caller's request id.
        request_id: u32,
    },
    /// A station METAR.
    WeatherObservation {
        /// The caller's request id.
        request_id: u32,
        /// The METAR text.
        metar: String,
    },
    /// A cloud density grid.
    CloudState {
        /// The caller's request id.
        request_id: u32,
        /// One density byte per grid cell, row-major.
        data: Vec<u8>,
    },
    /// Id assigned to a created object.
    AssignedObjectId {
        /// The caller's request id.
        request_id: u32,
        /// The new object's id.
        object_id: u32,
    },
    /// Data for one sim object.
    SimObjectData(SimObjectData),
    /// Any kind this crate does not decode.
    Unhandled {
        /// Raw kind tag.
        kind: u32,
    },
}

impl DispatchMessage {
    /// The request id this message answers, when it carries one.
    pub fn request_id(&self) -> Option<u32> {
        match self {
            Self::FacilityData(data) => Some(data.request_id),
            Self::SimObjectData(data) => Some(data.request_id),
            Self::FacilityDataEnd { request_id }
            | Self::WeatherObservation { request_id, .. }
            | Self::CloudState { request_id, .. }
            | Self::AssignedObjectId { request_id, .. } => Some(*request_id),
            Self::Exception(_) | Self::Unhandled { .. } => None,
        }
    }

    /// Short name of the message kind, for logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Exception(_) => "exception",
            Self::FacilityData(_) => "facility_data",
            Self::FacilityDataEnd { .. } => "facility_data_end",
            Self::WeatherObservation { .. } => "weather_observation",
            Self::CloudState { .. } => "cloud_state",
            Self::AssignedObjectId { .. } => "assigned_object_id",
            Self::SimObjectData(_) => "sim_object_data",
            Self::Unhandled { .. } => "unhandled",
        }
    }
}

/// Decode one raw dispatch message.
///
/// Pure: the same bytes always decode to the same value.
pub fn decode(bytes: &[u8]) -> Result<DispatchMessage, DecodeError> {
    let (header, body) = decode_header(bytes)?;
    let r = FieldReader::new(body);

    let Some(kind) = RecvKind::from_repr(header.kind) else {
        return Ok(DispatchMessage::Unhandled { kind: header.kind });
    };

    let message = match kind {
        RecvKind::Exception => DispatchMessage::Exception(ProtocolException::new(
            r.u32_at(EXCEPTION_CODE, "exception.code")?,
            r.u32_at(EXCEPTION_SEND_ID, "exception.send_id")?,
            r.u32_at(EXCEPTION_INDEX, "exception.index")?,
        )),
        RecvKind::FacilityData => DispatchMessage::FacilityData(FacilityData {
            request_id: r.u32_at(REQUEST_ID, "facility_data.request_id")?,
            unique_request_id: r.u32_at(FACILITY_UNIQUE_ID, "facility_data.unique_request_id")?,
            parent_unique_request_id: r
                .u32_at(FACILITY_PARENT_ID, "facility_data.parent_unique_request_id")?,
            data_type: r.u32_at(FACILITY_TYPE, "facility_data.type")?,
            is_list_item: r.u32_at(FACILITY_IS_LIST_ITEM, "facility_data.is_list_item")? != 0,
            item_index: r.u32_at(FACILITY_ITEM_INDEX, "facility_data.item_index")?,
            list_size: r.u32_at(FACILITY_LIST_SIZE, "facility_data.list_size")?,
            data: r.rest(FACILITY_DATA, "facility_data.data")?.to_vec(),
        }),
        RecvKind::FacilityDataEnd => DispatchMessage::FacilityDataEnd {
            request_id: r.u32_at(REQUEST_ID, "facility_data_end.request_id")?,
        },
        RecvKind::WeatherObservation => {
            let request_id = r.u32_at(REQUEST_ID, "weather_observation.request_id")?;
            let text = r.rest(WEATHER_METAR, "weather_observation.metar")?;
            let text = &text[..text.len().min(METAR_BUFFER_LEN)];
            DispatchMessage::WeatherObservation {
                request_id,
                metar: payload::c_text(text),
            }
        }
        RecvKind::CloudState => {
            let request_id = r.u32_at(REQUEST_ID, "cloud_state.request_id")?;
            let size = r.u32_at(CLOUD_ARRAY_SIZE, "cloud_state.array_size")?;
            let size = usize::try_from(size).unwrap_or(usize::MAX);
            DispatchMessage::CloudState {
                request_id,
                data: r.bytes(CLOUD_DATA, size, "cloud_state.data")?.to_vec(),
            }
        }
        RecvKind::AssignedObjectId => DispatchMessage::AssignedObjectId {
            request_id: r.u32_at(REQUEST_ID, "assigned_object_id.request_id")?,
            object_id: r.u32_at(OBJECT_ID, "assigned_object_id.object_id")?,
        },
        RecvKind::SimObjectData | RecvKind::SimObjectDataByType => {
            DispatchMessage::SimObjectData(SimObjectData {
                request_id: r.u32_at(REQUEST_ID, "sim_object_data.request_id")?,
                object_id: r.u32_at(OBJECT_ID, "sim_object_data.object_id")?,
                define_id: r.u32_at(SIM_OBJECT_DEFINE_ID, "sim_object_data.define_id")?,
                entry_number: r.u32_at(SIM_OBJECT_ENTRY, "sim_object_data.entry_number")?,
                out_of: r.u32_at(SIM_OBJECT_OUT_OF, "sim_object_data.out_of")?,
                data: r.rest(SIM_OBJECT_DATA, "sim_object_data.data")?.to_vec(),
            })
        }
    };

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames;

    #[test]
    fn header_shorter_than_twelve_bytes() {
        let err = decode(&[0u8; 8]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TooShort { field: "header.kind", needed: 12, available: 8 }
        );
    }

    #[test]
    fn declared_size_larger_than_buffer() {
        let mut bytes = frames::facility_data_end(7).as_bytes().to_vec();
        bytes[0..4].copy_from_slice(&100u32.to_le_bytes());
        let err = decode(&bytes).unwrap_err();
        assert_eq!(err, DecodeError::SizeMismatch { declared: 100, actual: 16 });
    }

    #[test]
    fn declared_size_smaller_than_header() {
        let mut bytes = frames::facility_data_end(7).as_bytes().to_vec();
        bytes[0..4].copy_from_slice(&4u32.to_le_bytes());
        assert!(matches!(
            decode(&bytes).unwrap_err(),
            DecodeError::TooShort { field: "header", .. }
        ));
    }

    #[test]
    fn reads_are_bounded_by_declared_size_not_buffer() {
        // Buffer holds the request id but the header claims only 12 bytes.
        let mut bytes = frames::facility_data_end(7).as_bytes().to_vec();
        bytes[0..4].copy_from_slice(&12u32.to_le_bytes());
        assert!(matches!(
            decode(&bytes).unwrap_err(),
            DecodeError::TooShort { field: "facility_data_end.request_id", .. }
        ));
    }

    #[test]
    fn decodes_exception() {
        let msg = decode(frames::exception(7, 3, 2).as_bytes()).unwrap();
        let DispatchMessage::Exception(exc) = msg else {
            panic!("expected exception, got {msg:?}");
        };
        assert_eq!(exc.code, 7);
        assert_eq!(exc.name, "NAME_UNRECOGNIZED");
        assert_eq!(exc.send_id, 3);
        assert_eq!(exc.index, 2);
    }

    #[test]
    fn decodes_facility_frequency_header_fields() {
        let raw = frames::facility_frequency(0x2001, 6, 118_700_000, "Tower");
        let DispatchMessage::FacilityData(data) = raw.decode().unwrap() else {
            panic!("expected facility data");
        };
        assert_eq!(data.request_id, 0x2001);
        assert_eq!(data.data_type, FACILITY_DATA_FREQUENCY);
        assert_eq!(data.data.len(), 72);
    }

    #[test]
    fn decodes_weather_observation_text() {
        let raw = frames::weather_observation(0x3001, "EDDB 121850Z CAVOK");
        assert_eq!(
            raw.decode().unwrap(),
            DispatchMessage::WeatherObservation {
                request_id: 0x3001,
                metar: "EDDB 121850Z CAVOK".into(),
            }
        );
    }

    #[test]
    fn weather_text_is_capped_at_buffer_length() {
        let long = "A".repeat(600);
        let raw = frames::weather_observation(1, &long);
        let DispatchMessage::WeatherObservation { metar, .. } = raw.decode().unwrap() else {
            panic!("expected weather");
        };
        assert_eq!(metar.len(), METAR_BUFFER_LEN);
    }

    #[test]
    fn cloud_state_array_size_is_checked() {
        let mut bytes = frames::cloud_state(0x4001, &[1, 2, 3]).as_bytes().to_vec();
        bytes[16..20].copy_from_slice(&50u32.to_le_bytes());
        assert!(matches!(
            decode(&bytes).unwrap_err(),
            DecodeError::TooShort { field: "cloud_state.data", .. }
        ));
    }

    #[test]
    fn decodes_cloud_state_grid() {
        let raw = frames::cloud_state(0x4001, &[9, 8, 7]);
        assert_eq!(
            raw.decode().unwrap(),
            DispatchMessage::CloudState { request_id: 0x4001, data: vec![9, 8, 7] }
        );
    }

    #[test]
    fn decodes_assigned_object_id() {
        let raw = frames::assigned_object_id(0x6001, 42);
        assert_eq!(
            raw.decode().unwrap(),
            DispatchMessage::AssignedObjectId { request_id: 0x6001, object_id: 42 }
        );
    }

    #[test]
    fn by_type_replies_decode_as_sim_object_data() {
        let raw = frames::sim_object_flag(0x5001, 1, true);
        let msg = raw.decode().unwrap();
        assert_eq!(msg.request_id(), Some(0x5001));
        assert_eq!(msg.kind_name(), "sim_object_data");
    }

    #[test]
    fn unknown_kind_is_unhandled_not_error() {
        let mut bytes = frames::facility_data_end(1).as_bytes().to_vec();
        bytes[8..12].copy_from_slice(&3u32.to_le_bytes());
        assert_eq!(decode(&bytes).unwrap(), DispatchMessage::Unhandled { kind: 3 });
    }

    #[test]
    fn decoding_is_idempotent() {
        let raw = frames::facility_frequency(0x2001, 1, 127_650_000, "ATIS");
        assert_eq!(raw.decode().unwrap(), raw.decode().unwrap());
    }
}
