//! Low-level client for a polled simulator host.
//!
//! [`SimClient`] runs one host session per call: it opens the session,
//! registers the data definitions it needs, sends a batch of requests, and
//! polls until the batch resolves, fails or times out. The session is
//! closed on every exit path.
//!
//! # Typical usage
//!
//! ```
//! use std::time::Duration;
//! use simlink_sdk::{frames, ManualClock, ScriptedConnection, SimClient};
//!
//! let mut conn = ScriptedConnection::new();
//! conn.push_reply(frames::facility_frequency(0x2001, 6, 118_700_000, "Tower"))
//!     .push_reply(frames::facility_data_end(0x2001));
//!
//! let mut client = SimClient::with_clock(conn, ManualClock::new());
//! let freqs = client.airport_frequencies("kjfk", Duration::from_secs(1)).unwrap();
//! assert_eq!(freqs[0].kind, "TOWER");
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use simlink_models::{
    center_density, clean_codes, parse_metar, scan_bands, AltitudeBand, BoundingBox,
    CloudDensitySample, Coordinates, FacilityCode, FrequencyRecord, Weather,
};
use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::DEFAULT_POLL_INTERVAL;
use crate::connection::{Connection, DataType, InitPosition, Session, SimObjectType};
use crate::correlator::{Correlator, PendingRequest, PollReport, RequestKind};
use crate::definitions::{
    batch_request_id, CLOUD_STATE_REQUEST_ID_BASE, COORDINATE_FIELDS, CREATE_OBJECT_REQUEST_ID,
    FREQUENCY_DEFINE_ID, FREQUENCY_FIELDS, FREQUENCY_REQUEST_ID, IN_CLOUD_DATUM, IN_CLOUD_DEFINE_ID,
    IN_CLOUD_REQUEST_ID, IN_CLOUD_UNITS, SESSION_CLOUD_DENSITY, SESSION_COORDINATES,
    SESSION_CREATE_OBJECT, SESSION_FREQUENCIES, SESSION_IN_CLOUD, SESSION_WEATHER,
    WAYPOINT_DEFINE_ID, WAYPOINT_REQUEST_ID_BASE, WEATHER_REQUEST_ID_BASE,
};
use crate::dispatch::{DispatchMessage, FACILITY_DATA_FREQUENCY};
use crate::error::{PartialResults, SdkError, TimeoutError};
use crate::payload::{decode_bool_scalar, decode_coordinates, decode_frequency};

/// Facility region filter meaning "any region".
const ANY_REGION: &str = "";

/// A host connection plus the clock that drives its poll loops.
///
/// Every operation takes an explicit timeout; [`SimService`](crate::SimService)
/// supplies them from [`ClientConfig`](crate::ClientConfig).
pub struct SimClient<C, K = SystemClock> {
    connection: C,
    clock: K,
    poll_interval: Duration,
}

impl<C: Connection> SimClient<C> {
    /// A client on the wall clock.
    pub fn new(connection: C) -> Self {
        Self::with_clock(connection, SystemClock)
    }
}

impl<C: Connection, K: Clock> SimClient<C, K> {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// A client on an explicit clock.
    pub fn with_clock(connection: C, clock: K) -> Self {
        Self {
            connection,
            clock,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Change the sleep used when the host has nothing pending.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// The underlying connection.
    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// Mutable access to the underlying connection.
    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.connection
    }

    /// The clock driving poll loops.
    pub fn clock(&self) -> &K {
        &self.clock
    }

    /// Give back the connection.
    pub fn into_inner(self) -> C {
        self.connection
    }

    // ------------------------------------------------------------------
    // Facilities
    // ------------------------------------------------------------------

    /// Radio frequencies published by airport `code`, in arrival order.
    pub fn airport_frequencies(
        &mut self,
        code: &str,
        timeout: Duration,
    ) -> Result<Vec<FrequencyRecord>, SdkError> {
        let code = FacilityCode::parse(code)?;
        info!(code = %code, "requesting airport frequencies");

        let mut session = Session::open(&mut self.connection, SESSION_FREQUENCIES)?;
        for field in FREQUENCY_FIELDS {
            session.add_field(field, FREQUENCY_DEFINE_ID)?;
        }
        session.request_facility_data(code.as_str(), ANY_REGION, FREQUENCY_DEFINE_ID, FREQUENCY_REQUEST_ID)?;

        let mut correlator = Correlator::new();
        correlator.track(PendingRequest::new(
            FREQUENCY_REQUEST_ID,
            code.as_str(),
            RequestKind::Facility { data_type: Some(FACILITY_DATA_FREQUENCY) },
        ))?;
        let report = correlator.run(&mut *session, &self.clock, timeout, self.poll_interval)?;
        drop(session);

        let records = messages(&report, FREQUENCY_REQUEST_ID)
            .iter()
            .filter_map(|m| match m {
                DispatchMessage::FacilityData(data) => Some(decode_frequency(&data.data)),
                _ => None,
            })
            .collect::<Result<Vec<_>, _>>()?;

        if !report.is_complete() {
            return Err(timed_out("airport frequencies", &report, PartialResults::Frequencies(records)));
        }
        info!(code = %code, count = records.len(), "airport frequencies received");
        Ok(records)
    }

    /// Positions of airports or waypoints.
    ///
    /// Codes the host returns no position for are absent from the map.
    /// When a code yields several records the last one wins.
    pub fn waypoint_coordinates<S: AsRef<str>>(
        &mut self,
        codes: &[S],
        timeout: Duration,
    ) -> Result<BTreeMap<FacilityCode, Coordinates>, SdkError> {
        let codes = clean_codes(codes)?;
        info!(count = codes.len(), "requesting waypoint coordinates");

        let mut session = Session::open(&mut self.connection, SESSION_COORDINATES)?;
        for field in COORDINATE_FIELDS {
            session.add_field(field, WAYPOINT_DEFINE_ID)?;
        }

        let mut correlator = Correlator::new();
        let mut ids = Vec::with_capacity(codes.len());
        for (index, code) in (0u32..).zip(&codes) {
            let request_id = batch_request_id(WAYPOINT_REQUEST_ID_BASE, index);
            correlator.track(PendingRequest::new(
                request_id,
                code.as_str(),
                RequestKind::Facility { data_type: None },
            ))?;
            session.request_facility_data(code.as_str(), ANY_REGION, WAYPOINT_DEFINE_ID, request_id)?;
            ids.push((request_id, code));
        }
        let report = correlator.run(&mut *session, &self.clock, timeout, self.poll_interval)?;
        drop(session);

        let mut positions = BTreeMap::new();
        for (request_id, code) in ids {
            let last = messages(&report, request_id).iter().rev().find_map(|m| match m {
                DispatchMessage::FacilityData(data) => Some(data),
                _ => None,
            });
            if let Some(data) = last {
                positions.insert(code.clone(), decode_coordinates(&data.data)?);
            }
        }

        if !report.is_complete() {
            return Err(timed_out("waypoint coordinates", &report, PartialResults::Coordinates(positions)));
        }
        info!(requested = codes.len(), found = positions.len(), "waypoint coordinates received");
        Ok(positions)
    }

    // ------------------------------------------------------------------
    // Weather
    // ------------------------------------------------------------------

    /// Current weather at each station, keyed by station code.
    ///
    /// A host exception for any station fails the whole batch.
    pub fn weather<S: AsRef<str>>(
        &mut self,
        codes: &[S],
        timeout: Duration,
    ) -> Result<BTreeMap<FacilityCode, Weather>, SdkError> {
        let codes = clean_codes(codes)?;
        info!(count = codes.len(), "requesting weather observations");

        let mut session = Session::open(&mut self.connection, SESSION_WEATHER)?;
        let mut correlator = Correlator::new();
        let mut ids = Vec::with_capacity(codes.len());
        for (index, code) in (0u32..).zip(&codes) {
            let request_id = batch_request_id(WEATHER_REQUEST_ID_BASE, index);
            correlator.track(PendingRequest::new(request_id, code.as_str(), RequestKind::WeatherObservation))?;
            session.request_weather_observation(code.as_str(), request_id)?;
            ids.push((request_id, code));
        }
        let report = correlator.run(&mut *session, &self.clock, timeout, self.poll_interval)?;
        drop(session);

        let mut weather = BTreeMap::new();
        for (request_id, code) in ids {
            for message in messages(&report, request_id) {
                if let DispatchMessage::WeatherObservation { metar, .. } = message {
                    weather.insert(code.clone(), parse_metar(code.clone(), metar));
                }
            }
        }

        if !report.is_complete() {
            return Err(timed_out("weather observations", &report, PartialResults::Weather(weather)));
        }
        info!(count = weather.len(), "weather observations received");
        Ok(weather)
    }

    // ------------------------------------------------------------------
    // Clouds
    // ------------------------------------------------------------------

    /// Cloud density above `position` in 500 ft bands from the surface to
    /// 10 000 ft, lowest band first.
    pub fn cloud_density_scan(
        &mut self,
        position: Coordinates,
        timeout: Duration,
    ) -> Result<Vec<CloudDensitySample>, SdkError> {
        let bands: Vec<AltitudeBand> = scan_bands().collect();
        self.sample_bands(position, &bands, timeout)
    }

    /// Cloud density above `position` in a single band.
    pub fn cloud_density_at(
        &mut self,
        position: Coordinates,
        band: AltitudeBand,
        timeout: Duration,
    ) -> Result<CloudDensitySample, SdkError> {
        let mut samples = self.sample_bands(position, &[band], timeout)?;
        Ok(samples.pop().unwrap_or_else(|| CloudDensitySample::in_band(0, band)))
    }

    fn sample_bands(
        &mut self,
        position: Coordinates,
        bands: &[AltitudeBand],
        timeout: Duration,
    ) -> Result<Vec<CloudDensitySample>, SdkError> {
        info!(lat = position.lat, lon = position.lon, bands = bands.len(), "requesting cloud density");

        let mut session = Session::open(&mut self.connection, SESSION_CLOUD_DENSITY)?;
        let mut correlator = Correlator::new();
        let mut ids = Vec::with_capacity(bands.len());
        for (index, band) in (0u32..).zip(bands) {
            let request_id = batch_request_id(CLOUD_STATE_REQUEST_ID_BASE, index);
            correlator.track(PendingRequest::new(
                request_id,
                format!("{}-{}ft", band.min_ft, band.max_ft),
                RequestKind::CloudState,
            ))?;
            session.request_cloud_state(BoundingBox::cloud_query(position, *band), request_id)?;
            ids.push((request_id, *band));
        }
        let report = correlator.run(&mut *session, &self.clock, timeout, self.poll_interval)?;
        drop(session);

        let samples: Vec<CloudDensitySample> = ids
            .into_iter()
            .filter_map(|(request_id, band)| {
                messages(&report, request_id).iter().find_map(|m| match m {
                    DispatchMessage::CloudState { data, .. } => {
                        Some(CloudDensitySample::in_band(center_density(data), band))
                    }
                    _ => None,
                })
            })
            .collect();

        if !report.is_complete() {
            return Err(timed_out("cloud density", &report, PartialResults::CloudDensity(samples)));
        }
        Ok(samples)
    }

    // ------------------------------------------------------------------
    // Sim objects
    // ------------------------------------------------------------------

    /// Whether the user aircraft is currently inside a cloud.
    pub fn user_aircraft_in_cloud(&mut self, timeout: Duration) -> Result<bool, SdkError> {
        let mut session = Session::open(&mut self.connection, SESSION_IN_CLOUD)?;
        session.add_data_field(IN_CLOUD_DATUM, IN_CLOUD_UNITS, DataType::Int32, IN_CLOUD_DEFINE_ID)?;
        session.request_data_on_sim_object_type(IN_CLOUD_REQUEST_ID, IN_CLOUD_DEFINE_ID, 0, SimObjectType::User)?;

        let mut correlator = Correlator::new();
        correlator.track(PendingRequest::new(IN_CLOUD_REQUEST_ID, "user", RequestKind::SimObjectData))?;
        let report = correlator.run(&mut *session, &self.clock, timeout, self.poll_interval)?;
        drop(session);

        let data = messages(&report, IN_CLOUD_REQUEST_ID).iter().find_map(|m| match m {
            DispatchMessage::SimObjectData(data) => Some(data),
            _ => None,
        });
        match data {
            Some(data) if report.is_complete() => Ok(decode_bool_scalar(&data.data)?),
            _ => Err(timed_out("in-cloud flag", &report, PartialResults::Nothing)),
        }
    }

    /// Create a simulated object from container `title` and return the
    /// object id the host assigned.
    pub fn create_simulated_object(
        &mut self,
        title: &str,
        init_pos: InitPosition,
        timeout: Duration,
    ) -> Result<u32, SdkError> {
        info!(title, "creating simulated object");

        let mut session = Session::open(&mut self.connection, SESSION_CREATE_OBJECT)?;
        session.create_simulated_object(title, init_pos, CREATE_OBJECT_REQUEST_ID)?;

        let mut correlator = Correlator::new();
        correlator.track(PendingRequest::new(CREATE_OBJECT_REQUEST_ID, title, RequestKind::AssignedObjectId))?;
        let report = correlator.run(&mut *session, &self.clock, timeout, self.poll_interval)?;
        drop(session);

        let assigned = messages(&report, CREATE_OBJECT_REQUEST_ID).iter().find_map(|m| match m {
            DispatchMessage::AssignedObjectId { object_id, .. } => Some(*object_id),
            _ => None,
        });
        match assigned {
            Some(object_id) => {
                info!(title, object_id, "simulated object created");
                Ok(object_id)
            }
            None => Err(timed_out("object creation", &report, PartialResults::Nothing)),
        }
    }
}

/// Messages collected for `request_id`, empty if none arrived.
fn messages(report: &PollReport, request_id: u32) -> &[DispatchMessage] {
    report
        .replies
        .get(&request_id)
        .map(|reply| reply.messages.as_slice())
        .unwrap_or_default()
}

fn timed_out(operation: &'static str, report: &PollReport, partial: PartialResults) -> SdkError {
    let resolved = report.resolved();
    let expected = resolved + report.unresolved.len();
    warn!(
        operation,
        resolved,
        expected,
        collected = partial.item_count(),
        "operation timed out"
    );
    TimeoutError {
        operation,
        expected,
        resolved,
        partial,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::connection::Operation;
    use crate::frames;
    use crate::scripted::{Call, ScriptedConnection};
    use simlink_models::Coverage;

    const TIMEOUT: Duration = Duration::from_secs(2);

    fn client(conn: ScriptedConnection) -> SimClient<ScriptedConnection, ManualClock> {
        SimClient::with_clock(conn, ManualClock::new())
    }

    #[test]
    fn frequencies_register_fields_in_order() {
        let mut conn = ScriptedConnection::new();
        conn.push_reply(frames::facility_data_end(FREQUENCY_REQUEST_ID));
        let mut client = client(conn);
        assert!(client.airport_frequencies(" kjfk ", TIMEOUT).unwrap().is_empty());

        let calls = client.connection().calls();
        assert_eq!(calls[0], Call::Open(SESSION_FREQUENCIES.into()));
        let fields: Vec<&str> = calls
            .iter()
            .filter_map(|c| match c {
                Call::AddField { field, definition_id: FREQUENCY_DEFINE_ID } => Some(field.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(fields, FREQUENCY_FIELDS);
        assert!(calls.contains(&Call::RequestFacilityData {
            key: "KJFK".into(),
            region: String::new(),
            definition_id: FREQUENCY_DEFINE_ID,
            request_id: FREQUENCY_REQUEST_ID,
        }));
        assert_eq!(calls.last(), Some(&Call::Close));
    }

    #[test]
    fn blank_code_fails_before_opening() {
        let mut client = client(ScriptedConnection::new());
        let err = client.airport_frequencies("   ", TIMEOUT).unwrap_err();
        assert!(matches!(err, SdkError::Validation(_)));
        assert!(client.connection().calls().is_empty());
    }

    #[test]
    fn frequency_timeout_carries_partial_records() {
        let mut conn = ScriptedConnection::new();
        conn.push_reply(frames::facility_frequency(FREQUENCY_REQUEST_ID, 1, 127_650_000, "ATIS"));
        let mut client = client(conn);

        let err = client.airport_frequencies("KJFK", TIMEOUT).unwrap_err();
        let SdkError::Timeout(timeout) = err else {
            panic!("expected timeout, got {err:?}");
        };
        assert_eq!(timeout.expected, 1);
        assert_eq!(timeout.resolved, 0);
        assert_eq!(timeout.partial.item_count(), 1);
        assert_eq!(client.connection().close_count(), 1);
    }

    #[test]
    fn send_failure_closes_session() {
        let mut conn = ScriptedConnection::new();
        conn.fail(Operation::RequestFacilityData, -1);
        let mut client = client(conn);
        let err = client.airport_frequencies("KJFK", TIMEOUT).unwrap_err();
        assert!(matches!(err, SdkError::Connection(_)));
        assert_eq!(client.connection().close_count(), 1);
    }

    #[test]
    fn weather_keyed_by_code() {
        let mut conn = ScriptedConnection::new();
        conn.push_reply(frames::weather_observation(0x3002, "LFPG 121830Z 9999 BKN012 12/10 Q1012"))
            .push_reply(frames::weather_observation(0x3001, "EDDB 121850Z 10SM FEW035"));
        let mut client = client(conn);

        let weather = client.weather(&["eddb", "", "lfpg"], TIMEOUT).unwrap();
        assert_eq!(weather.len(), 2);
        let eddb = &weather[&FacilityCode::parse("EDDB").unwrap()];
        assert_eq!(eddb.visibility, 10);
        let lfpg = &weather[&FacilityCode::parse("LFPG").unwrap()];
        assert_eq!(lfpg.clouds[0].base, 1200);
        assert_eq!(lfpg.clouds[0].coverage, Coverage::Broken);
    }

    #[test]
    fn coordinates_take_last_record_and_skip_missing() {
        let mut conn = ScriptedConnection::new();
        conn.push_reply(frames::facility_coordinates(0x2002, 1.0, 2.0))
            .push_reply(frames::facility_coordinates(0x2002, 52.36, 13.5))
            .push_reply(frames::facility_data_end(0x2002))
            .push_reply(frames::facility_data_end(0x2003));
        let mut client = client(conn);

        let positions = client.waypoint_coordinates(&["EDDB", "ZZZZ"], TIMEOUT).unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(
            positions[&FacilityCode::parse("EDDB").unwrap()],
            Coordinates::new(52.36, 13.5)
        );
    }

    #[test]
    fn cloud_scan_is_ordered_by_altitude() {
        let mut conn = ScriptedConnection::new();
        // Replies arrive highest band first.
        for band in (0..20u32).rev() {
            let density = u8::try_from(band * 10).unwrap();
            conn.push_reply(frames::uniform_cloud_state(CLOUD_STATE_REQUEST_ID_BASE + band, density));
        }
        let mut client = client(conn);

        let samples = client.cloud_density_scan(Coordinates::new(52.0, 13.0), TIMEOUT).unwrap();
        assert_eq!(samples.len(), 20);
        assert_eq!((samples[0].min_alt, samples[0].max_alt), (0, 500));
        assert_eq!(samples[0].value, 0);
        assert_eq!((samples[19].min_alt, samples[19].max_alt), (9500, 10_000));
        assert_eq!(samples[19].value, 190);

        let boxes = client
            .connection()
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::RequestCloudState { .. }))
            .count();
        assert_eq!(boxes, 20);
    }

    #[test]
    fn single_band_query() {
        let mut conn = ScriptedConnection::new();
        conn.push_reply(frames::uniform_cloud_state(CLOUD_STATE_REQUEST_ID_BASE, 200));
        let mut client = client(conn);
        let sample = client
            .cloud_density_at(Coordinates::new(0.0, 0.0), AltitudeBand::new(4000, 4500), TIMEOUT)
            .unwrap();
        assert_eq!(sample.coverage, Coverage::Overcast);
        assert_eq!(sample.band(), AltitudeBand::new(4000, 4500));
    }

    #[test]
    fn in_cloud_flag() {
        let mut conn = ScriptedConnection::new();
        conn.push_reply(frames::sim_object_flag(IN_CLOUD_REQUEST_ID, 1, true));
        let mut client = client(conn);
        assert!(client.user_aircraft_in_cloud(TIMEOUT).unwrap());
        assert!(client.connection().calls().contains(&Call::RequestDataOnSimObjectType {
            request_id: IN_CLOUD_REQUEST_ID,
            definition_id: IN_CLOUD_DEFINE_ID,
            radius: 0,
            object_type: SimObjectType::User,
        }));
    }

    #[test]
    fn in_cloud_timeout() {
        let mut client = client(ScriptedConnection::new());
        let err = client.user_aircraft_in_cloud(TIMEOUT).unwrap_err();
        assert!(matches!(err, SdkError::Timeout(_)));
    }

    #[test]
    fn created_object_id_is_returned() {
        let mut conn = ScriptedConnection::new();
        conn.push_idle()
            .push_reply(frames::assigned_object_id(CREATE_OBJECT_REQUEST_ID, 4711));
        let mut client = client(conn);
        let id = client
            .create_simulated_object("Cessna 172", InitPosition::default(), TIMEOUT)
            .unwrap();
        assert_eq!(id, 4711);
    }
}
