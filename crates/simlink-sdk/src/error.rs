//! SDK error types.
//!
//! [`SdkError`] is the single error type returned by every fallible
//! operation in the SDK. Nothing is retried: the first failure ends the
//! operation and the host session is closed on the way out.

use std::collections::BTreeMap;
use std::fmt;

use simlink_models::{CloudDensitySample, Coordinates, FacilityCode, FrequencyRecord, ModelError, Weather};

use crate::connection::ConnectionError;
use crate::dispatch::DecodeError;
use crate::exception::ProtocolException;

/// Error type for all SDK operations.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// Caller input rejected before any request was sent.
    #[error("invalid input: {0}")]
    Validation(#[from] ModelError),

    /// Opening the session or sending a request failed.
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// The host answered with an exception; the whole batch is abandoned.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolException),

    /// The deadline passed with requests still outstanding.
    #[error(transparent)]
    Timeout(Box<TimeoutError>),

    /// A dispatch message was truncated or inconsistent.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The same request id was tracked twice in one poll loop.
    #[error("request id 0x{0:04X} is already pending")]
    DuplicateRequest(u32),
}

impl From<TimeoutError> for SdkError {
    fn from(e: TimeoutError) -> Self {
        SdkError::Timeout(Box::new(e))
    }
}

// ---------------------------------------------------------------------------
// Timeout details
// ---------------------------------------------------------------------------

/// Whatever an operation had collected when its deadline passed.
#[derive(Debug, Clone, PartialEq)]
pub enum PartialResults {
    /// Frequency records received before the end marker.
    Frequencies(Vec<FrequencyRecord>),
    /// Stations whose observation arrived.
    Weather(BTreeMap<FacilityCode, Weather>),
    /// Codes whose position arrived.
    Coordinates(BTreeMap<FacilityCode, Coordinates>),
    /// Density bands that arrived.
    CloudDensity(Vec<CloudDensitySample>),
    /// The operation has no partial form.
    Nothing,
}

impl PartialResults {
    /// Number of items collected.
    pub fn item_count(&self) -> usize {
        match self {
            Self::Frequencies(v) => v.len(),
            Self::Weather(m) => m.len(),
            Self::Coordinates(m) => m.len(),
            Self::CloudDensity(v) => v.len(),
            Self::Nothing => 0,
        }
    }
}

/// A poll loop ran out of time.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeoutError {
    /// What was being waited for (`"airport frequencies"`, …).
    pub operation: &'static str,
    /// Requests sent.
    pub expected: usize,
    /// Requests resolved before the deadline.
    pub resolved: usize,
    /// Data collected so far.
    pub partial: PartialResults,
}

impl fmt::Display for TimeoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "timed out waiting for {}: {} of {} requests resolved ({} items collected so far)",
            self.operation,
            self.resolved,
            self.expected,
            self.partial.item_count()
        )
    }
}

impl std::error::Error for TimeoutError {}
