#![deny(missing_docs)]

//! # SimLink Models
//!
//! Core data types for facility and weather lookups against a running
//! flight simulator.
//!
//! Everything in this crate is pure: no I/O, no host session, no clocks.
//! The SDK crate decodes host messages into these types.
//!
//! ## Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`ident`] | Facility / waypoint codes and list cleaning |
//! | [`frequency`] | Radio frequency records and the frequency-type label table |
//! | [`weather`] | Parsed weather, cloud layers, coverage codes |
//! | [`metar`] | METAR tokenizer producing [`Weather`] |
//! | [`cloud`] | Cloud density samples and altitude bands |
//! | [`geo`] | Coordinates and the query bounding box |

pub mod cloud;
pub mod error;
pub mod frequency;
pub mod geo;
pub mod ident;
pub mod metar;
pub mod weather;

// Re-export all public types at crate root for convenience.
// Downstream crates can use `simlink_models::FrequencyRecord` directly.
pub use cloud::*;
pub use error::*;
pub use frequency::*;
pub use geo::*;
pub use ident::*;
pub use metar::*;
pub use weather::*;
