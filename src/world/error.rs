//! Error types for world data loading.

use thiserror::Error;

/// Errors that can occur when loading arena data.
#[derive(Debug, Error)]
pub enum DataLoadError {
    /// File could not be found.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// File could not be read.
    #[error("Failed to read file '{path}': {details}")]
    ReadError { path: String, details: String },

    /// RON parsing failed.
    #[error("Parse error in '{path}': {details}")]
    ParseError { path: String, details: String },

    /// A box or item has a zero or negative extent.
    #[error("{what} #{index} has a non-positive size")]
    InvalidSize { what: &'static str, index: usize },

    /// A moving platform path is too short or the platform cannot move.
    #[error("moving platform #{index} needs two distinct waypoints and a positive speed")]
    InvalidPath { index: usize },
}
