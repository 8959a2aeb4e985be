//! Error types for the `simlink-models` crate.
//!
//! All fallible constructors in this crate return variants of
//! [`ModelError`].

/// Errors produced when constructing or validating model types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A facility or waypoint code was blank after trimming.
    #[error("invalid facility code \"{value}\": {reason}")]
    InvalidCode {
        /// The value that failed validation.
        value: String,
        /// Human-readable explanation.
        reason: String,
    },

    /// A list of codes contained nothing usable after cleaning.
    #[error("no valid codes provided (got {given} entries)")]
    NoCodes {
        /// How many raw entries the caller supplied.
        given: usize,
    },
}
