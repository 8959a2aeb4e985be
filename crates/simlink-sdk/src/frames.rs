//! Encoders for dispatch messages.
//!
//! These produce byte-exact messages in the layout [`decode`](crate::dispatch::decode)
//! reads. They feed [`ScriptedConnection`](crate::scripted::ScriptedConnection)
//! in tests and replay files.

use crate::definitions::IN_CLOUD_DEFINE_ID;
use crate::dispatch::{
    RawMessage, RecvKind, FACILITY_DATA_AIRPORT, FACILITY_DATA_FREQUENCY, HEADER_SIZE,
};
use crate::payload::FREQUENCY_NAME_LEN;

/// Protocol version written into encoded headers.
pub const FRAME_VERSION: u32 = 0;

struct FrameBuilder {
    buf: Vec<u8>,
}

impl FrameBuilder {
    fn new(kind: RecvKind) -> Self {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&FRAME_VERSION.to_le_bytes());
        buf.extend_from_slice(&(kind as u32).to_le_bytes());
        Self { buf }
    }

    fn u32(mut self, v: u32) -> Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn bytes(mut self, v: &[u8]) -> Self {
        self.buf.extend_from_slice(v);
        self
    }

    fn finish(mut self) -> RawMessage {
        // Frames built here stay far below u32::MAX.
        let size = u32::try_from(self.buf.len()).unwrap_or(u32::MAX);
        self.buf[..4].copy_from_slice(&size.to_le_bytes());
        debug_assert!(self.buf.len() >= HEADER_SIZE);
        RawMessage::new(self.buf)
    }
}

/// Text as Latin-1 bytes; characters outside the range become `?`.
fn latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// A host exception.
pub fn exception(code: u32, send_id: u32, index: u32) -> RawMessage {
    FrameBuilder::new(RecvKind::Exception)
        .u32(code)
        .u32(send_id)
        .u32(index)
        .finish()
}

/// A facility data record with an arbitrary payload.
pub fn facility_data(request_id: u32, data_type: u32, data: &[u8]) -> RawMessage {
    FrameBuilder::new(RecvKind::FacilityData)
        .u32(request_id)
        .u32(0) // unique request id
        .u32(0) // parent unique request id
        .u32(data_type)
        .u32(u32::from(data_type == FACILITY_DATA_FREQUENCY))
        .u32(0) // item index
        .u32(0) // list size
        .bytes(data)
        .finish()
}

/// A frequency record. `name` is truncated to the fixed name width.
pub fn facility_frequency(request_id: u32, type_code: i32, hz: i32, name: &str) -> RawMessage {
    let mut data = Vec::with_capacity(8 + FREQUENCY_NAME_LEN);
    data.extend_from_slice(&type_code.to_le_bytes());
    data.extend_from_slice(&hz.to_le_bytes());
    let mut name_buf = [0u8; FREQUENCY_NAME_LEN];
    let name = latin1(name);
    // Keep one byte for the terminator.
    let n = name.len().min(FREQUENCY_NAME_LEN - 1);
    name_buf[..n].copy_from_slice(&name[..n]);
    data.extend_from_slice(&name_buf);
    facility_data(request_id, FACILITY_DATA_FREQUENCY, &data)
}

/// An airport position record.
pub fn facility_coordinates(request_id: u32, latitude: f64, longitude: f64) -> RawMessage {
    let mut data = Vec::with_capacity(16);
    data.extend_from_slice(&latitude.to_le_bytes());
    data.extend_from_slice(&longitude.to_le_bytes());
    facility_data(request_id, FACILITY_DATA_AIRPORT, &data)
}

/// End of a facility request.
pub fn facility_data_end(request_id: u32) -> RawMessage {
    FrameBuilder::new(RecvKind::FacilityDataEnd)
        .u32(request_id)
        .finish()
}

/// A METAR observation, zero-terminated.
pub fn weather_observation(request_id: u32, metar: &str) -> RawMessage {
    FrameBuilder::new(RecvKind::WeatherObservation)
        .u32(request_id)
        .bytes(&latin1(metar))
        .bytes(&[0])
        .finish()
}

/// A cloud density grid.
pub fn cloud_state(request_id: u32, data: &[u8]) -> RawMessage {
    let size = u32::try_from(data.len()).unwrap_or(u32::MAX);
    FrameBuilder::new(RecvKind::CloudState)
        .u32(request_id)
        .u32(size)
        .bytes(data)
        .finish()
}

/// A full-size cloud grid with every cell set to `density`.
pub fn uniform_cloud_state(request_id: u32, density: u8) -> RawMessage {
    let size = simlink_models::CLOUD_GRID_SIZE;
    cloud_state(request_id, &vec![density; size * size])
}

/// The id assigned to a created object.
pub fn assigned_object_id(request_id: u32, object_id: u32) -> RawMessage {
    FrameBuilder::new(RecvKind::AssignedObjectId)
        .u32(request_id)
        .u32(object_id)
        .finish()
}

/// A single boolean datum for the in-cloud definition, as a type-wide reply.
pub fn sim_object_flag(request_id: u32, object_id: u32, flag: bool) -> RawMessage {
    FrameBuilder::new(RecvKind::SimObjectDataByType)
        .u32(request_id)
        .u32(object_id)
        .u32(IN_CLOUD_DEFINE_ID)
        .u32(0) // flags
        .u32(1) // entry number
        .u32(1) // out of
        .u32(1) // define count
        .u32(u32::from(flag))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_size_matches_length() {
        let raw = facility_data_end(5);
        let bytes = raw.as_bytes();
        assert_eq!(bytes.len(), 16);
        assert_eq!(u32::from_le_bytes(bytes[0..4].try_into().unwrap()), 16);
        assert_eq!(u32::from_le_bytes(bytes[8..12].try_into().unwrap()), 29);
    }

    #[test]
    fn frequency_name_is_truncated_and_terminated() {
        let raw = facility_frequency(1, 6, 118_700_000, &"X".repeat(100));
        // header + 7 facility fields + type + hz + name
        assert_eq!(raw.as_bytes().len(), 12 + 28 + 8 + FREQUENCY_NAME_LEN);
        assert_eq!(*raw.as_bytes().last().unwrap(), 0);
    }

    #[test]
    fn sim_object_flag_data_starts_at_offset_forty() {
        let raw = sim_object_flag(9, 1, true);
        assert_eq!(&raw.as_bytes()[40..44], &1u32.to_le_bytes());
    }
}
