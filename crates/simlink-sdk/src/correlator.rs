//! Request correlation and the poll loop.
//!
//! A [`Correlator`] tracks the requests sent during one host session and
//! matches incoming dispatch messages to them by request id. [`Correlator::run`]
//! drives the connection until every request is resolved, the deadline
//! passes, or the host reports an exception.
//!
//! ```text
//!   track()            run()
//! Idle ──► AwaitingResponses ──┬──► Completed   (pending set empty)
//!                              ├──► TimedOut    (deadline reached)
//!                              └──► Failed      (exception / decode error)
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::{debug, warn};

use crate::clock::Clock;
use crate::connection::Connection;
use crate::dispatch::DispatchMessage;
use crate::error::SdkError;

/// What kind of reply resolves a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// A facility request: records accumulate until an end marker.
    ///
    /// With `data_type` set, records of any other type are skipped.
    Facility {
        /// Facility data type to keep.
        data_type: Option<u32>,
    },
    /// A single weather observation.
    WeatherObservation,
    /// A single cloud-state grid.
    CloudState,
    /// A single assigned object id.
    AssignedObjectId,
    /// A single sim-object data reply.
    SimObjectData,
}

/// A request awaiting its reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    /// Id the request was sent with.
    pub request_id: u32,
    /// Caller key (facility code, band, …), kept for reporting.
    pub key: String,
    /// Expected reply kind.
    pub kind: RequestKind,
}

impl PendingRequest {
    /// Describe a request.
    pub fn new(request_id: u32, key: impl Into<String>, kind: RequestKind) -> Self {
        Self {
            request_id,
            key: key.into(),
            kind,
        }
    }
}

/// Messages collected for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// The request these messages answer.
    pub request: PendingRequest,
    /// Matching messages, in arrival order. End markers are not kept.
    pub messages: Vec<DispatchMessage>,
    /// Whether the request was resolved.
    pub complete: bool,
}

/// How a poll loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every tracked request resolved.
    Completed,
    /// The deadline passed first.
    TimedOut,
}

/// Result of [`Correlator::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct PollReport {
    /// How the loop ended.
    pub outcome: Outcome,
    /// Replies keyed by request id, including incomplete ones that received
    /// at least one message.
    pub replies: BTreeMap<u32, Reply>,
    /// Requests still pending when the loop ended.
    pub unresolved: Vec<PendingRequest>,
}

impl PollReport {
    /// Number of resolved requests.
    pub fn resolved(&self) -> usize {
        self.replies.values().filter(|r| r.complete).count()
    }

    /// Whether every request resolved.
    pub fn is_complete(&self) -> bool {
        self.outcome == Outcome::Completed
    }
}

/// Matches dispatch messages to pending requests.
#[derive(Debug, Default)]
pub struct Correlator {
    pending: BTreeMap<u32, PendingRequest>,
    replies: BTreeMap<u32, Reply>,
}

impl Correlator {
    /// An empty correlator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `request`. Ids must be unique within one correlator.
    pub fn track(&mut self, request: PendingRequest) -> Result<(), SdkError> {
        let id = request.request_id;
        if self.pending.contains_key(&id) || self.replies.contains_key(&id) {
            return Err(SdkError::DuplicateRequest(id));
        }
        self.pending.insert(id, request);
        Ok(())
    }

    /// Requests not yet resolved.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Feed one decoded message.
    ///
    /// Fails only on a host exception. Messages that match no pending
    /// request, or match one of a different kind, are ignored.
    pub fn handle(&mut self, message: DispatchMessage) -> Result<(), SdkError> {
        if let DispatchMessage::Exception(exc) = message {
            warn!(
                code = exc.code,
                name = %exc.name,
                send_id = exc.send_id,
                index = exc.index,
                "host exception; abandoning batch"
            );
            return Err(exc.into());
        }

        let Some(request_id) = message.request_id() else {
            debug!(kind = message.kind_name(), "ignoring uncorrelated message");
            return Ok(());
        };
        let Some(request) = self.pending.get(&request_id).cloned() else {
            debug!(request_id, kind = message.kind_name(), "ignoring reply for unknown request");
            return Ok(());
        };

        let (keep, complete) = match (request.kind, &message) {
            (RequestKind::Facility { data_type }, DispatchMessage::FacilityData(data)) => {
                if data_type.is_some_and(|t| t != data.data_type) {
                    debug!(request_id, data_type = data.data_type, "skipping facility record of other type");
                    return Ok(());
                }
                (true, false)
            }
            (RequestKind::Facility { .. }, DispatchMessage::FacilityDataEnd { .. }) => (false, true),
            (RequestKind::WeatherObservation, DispatchMessage::WeatherObservation { .. })
            | (RequestKind::CloudState, DispatchMessage::CloudState { .. })
            | (RequestKind::AssignedObjectId, DispatchMessage::AssignedObjectId { .. })
            | (RequestKind::SimObjectData, DispatchMessage::SimObjectData(_)) => (true, true),
            (kind, _) => {
                debug!(request_id, ?kind, got = message.kind_name(), "ignoring reply of unexpected kind");
                return Ok(());
            }
        };

        if keep {
            self.reply_mut(&request).messages.push(message);
        }
        if complete {
            self.resolve(&request);
        }
        Ok(())
    }

    fn reply_mut(&mut self, request: &PendingRequest) -> &mut Reply {
        self.replies
            .entry(request.request_id)
            .or_insert_with(|| Reply {
                request: request.clone(),
                messages: Vec::new(),
                complete: false,
            })
    }

    fn resolve(&mut self, request: &PendingRequest) {
        self.reply_mut(request).complete = true;
        self.pending.remove(&request.request_id);
        debug!(
            request_id = request.request_id,
            key = %request.key,
            remaining = self.pending.len(),
            "request resolved"
        );
    }

    /// Poll `connection` until every tracked request resolves or `timeout`
    /// elapses. Sleeps `poll_interval` on the clock whenever nothing is
    /// pending on the connection.
    ///
    /// A host exception or an undecodable message ends the loop with an
    /// error. A timeout is not an error here: the report carries the
    /// partial replies and the unresolved requests.
    pub fn run<C, K>(
        mut self,
        connection: &mut C,
        clock: &K,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<PollReport, SdkError>
    where
        C: Connection + ?Sized,
        K: Clock + ?Sized,
    {
        let deadline = clock.now() + timeout;
        let mut outcome = Outcome::Completed;

        while !self.pending.is_empty() {
            if clock.now() >= deadline {
                warn!(
                    pending = self.pending.len(),
                    ?timeout,
                    "poll loop deadline reached"
                );
                outcome = Outcome::TimedOut;
                break;
            }

            let Some(raw) = connection.poll_dispatch() else {
                clock.sleep(poll_interval);
                continue;
            };

            let message = raw.decode()?;
            debug!(kind = message.kind_name(), request_id = ?message.request_id(), "dispatch");
            self.handle(message)?;
        }

        Ok(PollReport {
            outcome,
            replies: self.replies,
            unresolved: self.pending.into_values().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::dispatch::FACILITY_DATA_FREQUENCY;
    use crate::frames;
    use crate::scripted::ScriptedConnection;

    const TIMEOUT: Duration = Duration::from_secs(1);
    const POLL: Duration = Duration::from_millis(10);

    fn facility(id: u32) -> PendingRequest {
        PendingRequest::new(
            id,
            "KJFK",
            RequestKind::Facility { data_type: Some(FACILITY_DATA_FREQUENCY) },
        )
    }

    #[test]
    fn facility_completes_on_end_marker() {
        let mut conn = ScriptedConnection::new();
        conn.push_reply(frames::facility_frequency(1, 6, 118_700_000, "Tower"));
        conn.push_idle();
        conn.push_reply(frames::facility_frequency(1, 5, 121_900_000, "Ground"));
        conn.push_reply(frames::facility_data_end(1));

        let mut correlator = Correlator::new();
        correlator.track(facility(1)).unwrap();
        let report = correlator.run(&mut conn, &ManualClock::new(), TIMEOUT, POLL).unwrap();

        assert_eq!(report.outcome, Outcome::Completed);
        assert!(report.unresolved.is_empty());
        let reply = &report.replies[&1];
        assert!(reply.complete);
        assert_eq!(reply.messages.len(), 2);
    }

    #[test]
    fn records_of_other_type_are_skipped() {
        let mut conn = ScriptedConnection::new();
        conn.push_reply(frames::facility_coordinates(1, 40.6, -73.7));
        conn.push_reply(frames::facility_frequency(1, 6, 118_700_000, "Tower"));
        conn.push_reply(frames::facility_data_end(1));

        let mut correlator = Correlator::new();
        correlator.track(facility(1)).unwrap();
        let report = correlator.run(&mut conn, &ManualClock::new(), TIMEOUT, POLL).unwrap();
        assert_eq!(report.replies[&1].messages.len(), 1);
    }

    #[test]
    fn timeout_reports_unresolved_without_real_sleep() {
        let mut conn = ScriptedConnection::new();
        let clock = ManualClock::new();

        let mut correlator = Correlator::new();
        correlator.track(facility(1)).unwrap();
        let report = correlator.run(&mut conn, &clock, TIMEOUT, POLL).unwrap();

        assert_eq!(report.outcome, Outcome::TimedOut);
        assert_eq!(report.unresolved, vec![facility(1)]);
        assert!(report.replies.is_empty());
        assert_eq!(clock.elapsed(), TIMEOUT);
    }

    #[test]
    fn exception_fails_batch_after_other_replies() {
        let mut conn = ScriptedConnection::new();
        conn.push_reply(frames::weather_observation(0x3001, "EDDB CAVOK"));
        conn.push_reply(frames::exception(15, 4, 1));

        let mut correlator = Correlator::new();
        correlator
            .track(PendingRequest::new(0x3001, "EDDB", RequestKind::WeatherObservation))
            .unwrap();
        correlator
            .track(PendingRequest::new(0x3002, "XXXX", RequestKind::WeatherObservation))
            .unwrap();

        let err = correlator.run(&mut conn, &ManualClock::new(), TIMEOUT, POLL).unwrap_err();
        let SdkError::Protocol(exc) = err else {
            panic!("expected protocol error, got {err:?}");
        };
        assert_eq!(exc.name, "WEATHER_UNABLE_TO_GET_OBSERVATION");
    }

    #[test]
    fn unknown_and_mismatched_replies_are_ignored() {
        let mut conn = ScriptedConnection::new();
        conn.push_reply(frames::weather_observation(0x9999, "ZZZZ CAVOK"));
        conn.push_reply(frames::cloud_state(0x3001, &[1]));
        conn.push_reply(frames::weather_observation(0x3001, "EDDB CAVOK"));

        let mut correlator = Correlator::new();
        correlator
            .track(PendingRequest::new(0x3001, "EDDB", RequestKind::WeatherObservation))
            .unwrap();
        let report = correlator.run(&mut conn, &ManualClock::new(), TIMEOUT, POLL).unwrap();

        assert!(report.is_complete());
        assert_eq!(report.replies.len(), 1);
        assert_eq!(report.resolved(), 1);
    }

    #[test]
    fn single_shot_resolves_once() {
        let mut correlator = Correlator::new();
        correlator
            .track(PendingRequest::new(7, "obj", RequestKind::AssignedObjectId))
            .unwrap();
        correlator
            .handle(DispatchMessage::AssignedObjectId { request_id: 7, object_id: 1 })
            .unwrap();
        correlator
            .handle(DispatchMessage::AssignedObjectId { request_id: 7, object_id: 2 })
            .unwrap();
        assert_eq!(correlator.pending_count(), 0);
        assert_eq!(correlator.replies[&7].messages.len(), 1);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut correlator = Correlator::new();
        correlator.track(facility(1)).unwrap();
        assert!(matches!(
            correlator.track(facility(1)),
            Err(SdkError::DuplicateRequest(1))
        ));
    }

    #[test]
    fn decode_failure_ends_loop() {
        let mut conn = ScriptedConnection::new();
        conn.push_reply(crate::dispatch::RawMessage::new(vec![1, 2, 3]));

        let mut correlator = Correlator::new();
        correlator.track(facility(1)).unwrap();
        let err = correlator.run(&mut conn, &ManualClock::new(), TIMEOUT, POLL).unwrap_err();
        assert!(matches!(err, SdkError::Decode(_)));
    }

    #[test]
    fn empty_correlator_completes_without_polling() {
        let mut conn = ScriptedConnection::new();
        let report = Correlator::new()
            .run(&mut conn, &ManualClock::new(), TIMEOUT, POLL)
            .unwrap();
        assert!(report.is_complete());
        assert_eq!(conn.poll_count(), 0);
    }
}
