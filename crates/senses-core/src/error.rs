//! Error types for senses-core.
//!
//! Two families of failure exist and they are kept apart on purpose:
//!
//! | Type | Raised by | Effect on local state |
//! |------|-----------|-----------------------|
//! | [`Rejection`] | Store mutations (`add_connection`, `add_location`, pre-flight checks) | Mutation does not apply |
//! | [`Error`] | Persistence boundary, configuration loading | None; optimistic state is kept |
//!
//! A [`Rejection`] is an expected outcome of user input and carries a
//! human-readable reason (its `Display` output) meant to be shown next to
//! the control that triggered it. It is returned, never panicked.
//!
//! An [`Error`] from the persistence boundary does **not** roll back the
//! optimistic local mutation. [`crate::EditorSession::apply`] turns it into a
//! [`crate::SyncIssue`] for a transient banner and editing continues.
//!
//! ## Retry
//!
//! Nothing in this crate retries a failed persistence call. A later full
//! reconciliation (re-fetch on navigation) is what eventually converges the
//! local view with the server.

use std::time::Duration;

use thiserror::Error;

use senses_types::{LocationSense, SenseId};

/// Errors that can occur at the persistence and configuration boundaries.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A persistence call failed (network, server error, bad response).
    #[error("Persistence call '{operation}' failed: {message}")]
    Persistence {
        /// The operation that failed, e.g. `create_connection`.
        operation: String,
        /// Description of the failure.
        message: String,
    },

    /// A persistence call did not complete in time.
    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The timeout duration.
        duration: Duration,
    },

    /// The persona has no durable id, so nothing can be persisted yet.
    #[error("Persona has not been created yet")]
    NoPersonaId,

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Malformed boundary data.
    #[error(transparent)]
    Parse(#[from] senses_types::ParseError),

    /// JSON (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a persistence failure with operation context.
    pub fn persistence(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Persistence {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a timeout error with operation context.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

/// Result type alias using senses-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// A validation rejection of a store mutation.
///
/// The `Display` output is the reason shown to the user.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new reasons
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Rejection {
    /// The current device is already registered as a device location.
    #[error("This device ({device}) is already connected to {sense}")]
    DuplicateDevice { sense: SenseId, device: String },

    /// The provider allows a single account and one is already connected.
    #[error("{provider} supports only one connected account")]
    SingleAccountOnly { provider: String },

    /// The provider's account limit is reached.
    #[error("{provider} supports at most {max} connected accounts")]
    AccountLimitReached { provider: String, max: usize },

    /// The same provider account is already connected to this sense.
    #[error("{account} is already connected through {provider}")]
    AlreadyConnected { provider: String, account: String },

    /// The connection record names a different sense than the store slot.
    #[error("Connection belongs to {actual}, not {expected}")]
    SenseMismatch { expected: SenseId, actual: SenseId },

    /// A global entry already exists for this sense-type.
    #[error("{sense} already has a global location")]
    DuplicateGlobal { sense: LocationSense },

    /// Global coverage is not offered for this sense-type.
    #[error("Global coverage is not available for {sense}")]
    GlobalNotSupported { sense: LocationSense },

    /// A device-location entry already exists for this sense-type.
    #[error("{sense} already uses your device location")]
    DuplicateDeviceLocation { sense: LocationSense },

    /// Device-based locations need the location sense connected first.
    #[error("Connect your device location before using it for {sense}")]
    LocationSenseNotConnected { sense: LocationSense },

    /// A place with the same name and country is already configured.
    #[error("{place} is already configured for {sense}")]
    DuplicatePlace { sense: LocationSense, place: String },

    /// The entry was built for a different sense-type.
    #[error("Location entry is for {actual}, not {expected}")]
    LocationSenseMismatch {
        expected: LocationSense,
        actual: LocationSense,
    },
}

impl Rejection {
    /// The human-readable reason string.
    pub fn reason(&self) -> String {
        self.to_string()
    }
}
