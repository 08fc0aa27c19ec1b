//! Platform-agnostic types for persona senses.
//!
//! This crate provides the shared data model used by the reconciliation core
//! (senses-core) and any front end that renders it.
//!
//! # Features
//!
//! - Canonical sense identifiers ([`SenseId`], [`normalize`])
//! - Connection records tagged with their origin ([`Connection`], [`ConnectionOrigin`])
//! - Device identity for duplicate detection ([`DeviceInfo`], [`DeviceFingerprint`])
//! - Location configuration entries ([`LocationEntry`], [`LocationKind`])
//! - Derived counters ([`SenseActivationState`], [`AggregateSummary`])
//! - Boundary parsing for provider payloads ([`ProviderMetadata`])
//!
//! # Example
//!
//! ```
//! use senses_types::{Connection, ConnectionOrigin, SenseId};
//!
//! let fitness = SenseId::new("fitness");
//! let conn = Connection::new(fitness, "fitbit", "a@x.com", ConnectionOrigin::Persisted);
//! assert_eq!(conn.key().provider_id, "fitbit");
//! ```

pub mod error;
pub mod metadata;
pub mod sense;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use metadata::ProviderMetadata;
pub use sense::{LocationSense, SenseId, known, normalize};
pub use types::{
    AggregateSummary, Connection, ConnectionGrant, ConnectionKey, ConnectionOrigin,
    DEVICE_LOCATION_PROVIDER, DeviceFingerprint, DeviceInfo, GeocodeCandidate, LocationEntry,
    LocationKind, SenseActivationState, UNKNOWN_SIGNAL,
};
