//! # SimLink SDK
//!
//! Request correlation and message decoding for a flight simulator host
//! that is driven by polling.
//!
//! The SDK provides:
//!
//! * [`Connection`]: the host boundary, injected at construction time.
//! * [`dispatch`]: bounds-checked decoding of host dispatch messages.
//! * [`Correlator`]: the poll loop matching replies to request ids.
//! * [`SimClient`]: one host session per query, explicit timeouts.
//! * [`SimService`]: the public surface, configured by [`ClientConfig`].
//! * [`SdkError`]: unified error type for all SDK operations.
//! * [`ScriptedConnection`]: an in-memory host for tests and replay.
//!
//! Model types from [`simlink_models`] are re-exported for convenience.
//!
//! # Quick start
//!
//! ```
//! use simlink_sdk::{frames, ClientConfig, ManualClock, ScriptedConnection, SimClient, SimService};
//!
//! let mut conn = ScriptedConnection::new();
//! conn.push_reply(frames::weather_observation(0x3001, "KJFK 121851Z 10SM FEW035 SCT250"));
//!
//! let client = SimClient::with_clock(conn, ManualClock::new());
//! let mut service = SimService::from_client(client, ClientConfig::default());
//! let weather = service.get_weather(&["kjfk"]).unwrap();
//! assert_eq!(weather.values().next().unwrap().clouds.len(), 2);
//! ```

pub mod client;
pub mod clock;
pub mod config;
pub mod connection;
pub mod correlator;
pub mod definitions;
pub mod dispatch;
pub mod error;
pub mod exception;
pub mod frames;
pub mod payload;
pub mod scripted;
pub mod service;

pub use client::SimClient;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ClientConfig, CloudDensityMode};
pub use connection::{
    Connection, ConnectionError, DataType, InitPosition, Operation, Session, SimObjectType,
};
pub use correlator::{Correlator, Outcome, PendingRequest, PollReport, RequestKind};
pub use dispatch::{decode, DecodeError, DispatchMessage, RawMessage};
pub use error::{PartialResults, SdkError, TimeoutError};
pub use exception::ProtocolException;
pub use scripted::{ScriptedConnection, ScriptedReply};
pub use service::SimService;

// Re-export model types for ergonomic usage.
pub use simlink_models::{
    AltitudeBand, CloudDensitySample, CloudLayer, Coordinates, Coverage, FacilityCode,
    FrequencyRecord, Weather,
};
