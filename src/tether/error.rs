//! Error types for tether configuration and body leases.

use bevy::prelude::Entity;
use thiserror::Error;

/// Errors that can occur when loading or validating ability configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("Failed to read config '{path}': {details}")]
    ReadError { path: String, details: String },

    /// RON parsing failed.
    #[error("Parse error in '{path}': {details}")]
    ParseError { path: String, details: String },

    /// A value that must be strictly positive was not.
    #[error("{ability}: '{field}' must be positive, got {value}")]
    NonPositive {
        ability: &'static str,
        field: &'static str,
        value: f32,
    },

    /// Viewport padding outside the usable range.
    #[error("{ability}: viewport padding {value} outside [0, {max}]")]
    PaddingOutOfRange {
        ability: &'static str,
        value: f32,
        max: f32,
    },

    /// Sampled ease curve has too few or non-finite samples.
    #[error("{ability}: ease curve needs at least two finite samples")]
    MalformedCurve { ability: &'static str },
}

/// Errors raised when taking exclusive control of a body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeaseError {
    /// Another ability already holds this body.
    #[error("body {body} is already leased by {holder}")]
    AlreadyLeased { body: Entity, holder: Entity },

    /// The requesting ability already holds a body and must release it first.
    #[error("{holder} already holds a lease on {body}")]
    HolderBusy { holder: Entity, body: Entity },
}
