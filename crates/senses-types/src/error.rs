//! Error types for boundary parsing in senses-types.

use thiserror::Error;

/// Errors that can occur when parsing sense data arriving from a boundary
/// (persistence responses, provider callbacks, browser signals).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Unrecognized connection origin tag.
    #[error("Unknown connection origin: {0}")]
    UnknownOrigin(String),

    /// Unrecognized location entry kind.
    #[error("Unknown location kind: {0}")]
    UnknownLocationKind(String),

    /// The sense does not take a location list.
    #[error("Sense '{0}' is not location-backed")]
    NotLocationSense(String),

    /// Payload had the wrong overall shape.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias using senses-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
