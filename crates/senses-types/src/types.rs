//! Core types for persona sense connections and location configurations.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ParseError;
use crate::sense::{LocationSense, SenseId};

/// Provider id used for browser/device location grants.
pub const DEVICE_LOCATION_PROVIDER: &str = "device_location";

/// Placeholder used when a device signal is unavailable.
pub const UNKNOWN_SIGNAL: &str = "unknown";

/// Where a connection record currently comes from.
///
/// Ordering follows precedence: `Persisted` wins over `Session`, which wins
/// over `Fallback`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ConnectionOrigin {
    /// Loaded from the durable store; authoritative.
    Persisted,
    /// Created during the current editing session, pending persistence.
    Session,
    /// Created before the persona had a durable id.
    Fallback,
}

impl ConnectionOrigin {
    /// Origins in precedence order, highest first.
    pub const PRECEDENCE: [ConnectionOrigin; 3] = [
        ConnectionOrigin::Persisted,
        ConnectionOrigin::Session,
        ConnectionOrigin::Fallback,
    ];

    /// Canonical lowercase tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionOrigin::Persisted => "persisted",
            ConnectionOrigin::Session => "session",
            ConnectionOrigin::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ConnectionOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionOrigin {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "persisted" => Ok(ConnectionOrigin::Persisted),
            "session" => Ok(ConnectionOrigin::Session),
            "fallback" => Ok(ConnectionOrigin::Fallback),
            other => Err(ParseError::UnknownOrigin(other.to_string())),
        }
    }
}

/// Browser/device attributes captured when a device-location grant completes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceInfo {
    /// Browser family (e.g. "Chrome").
    pub browser: String,
    /// Operating system family (e.g. "macOS").
    pub os: String,
    /// Raw platform string (e.g. "MacIntel").
    pub platform: String,
    /// Negotiated language (e.g. "en-US").
    pub language: String,
    /// Screen descriptor, `"<width>x<height>"`.
    pub screen: String,
}

impl DeviceInfo {
    /// Device info with every field set to [`UNKNOWN_SIGNAL`].
    pub fn unknown() -> Self {
        Self {
            browser: UNKNOWN_SIGNAL.to_string(),
            os: UNKNOWN_SIGNAL.to_string(),
            platform: UNKNOWN_SIGNAL.to_string(),
            language: UNKNOWN_SIGNAL.to_string(),
            screen: UNKNOWN_SIGNAL.to_string(),
        }
    }

    /// The comparison key for duplicate-device detection.
    pub fn fingerprint(&self) -> DeviceFingerprint {
        DeviceFingerprint {
            browser: self.browser.clone(),
            os: self.os.clone(),
            platform: self.platform.clone(),
            screen: self.screen.clone(),
        }
    }
}

/// Heuristic identity of a browser session on a physical device.
///
/// Compared field by field; two fingerprints denote the same device iff all
/// four fields are equal. Language is deliberately not part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceFingerprint {
    pub browser: String,
    pub os: String,
    pub platform: String,
    pub screen: String,
}

impl DeviceFingerprint {
    /// Account key used for device-location connections.
    ///
    /// ```
    /// use senses_types::DeviceFingerprint;
    ///
    /// let fp = DeviceFingerprint {
    ///     browser: "Chrome".into(),
    ///     os: "macOS".into(),
    ///     platform: "MacIntel".into(),
    ///     screen: "1920x1080".into(),
    /// };
    /// assert_eq!(fp.account_key(), "device:Chrome/macOS/MacIntel/1920x1080");
    /// ```
    pub fn account_key(&self) -> String {
        format!(
            "device:{}/{}/{}/{}",
            self.browser, self.os, self.platform, self.screen
        )
    }

    /// Human-readable label, e.g. "Chrome on macOS".
    pub fn label(&self) -> String {
        format!("{} on {}", self.browser, self.os)
    }

    /// Returns `true` if any field fell back to [`UNKNOWN_SIGNAL`].
    pub fn is_partial(&self) -> bool {
        [&self.browser, &self.os, &self.platform, &self.screen]
            .iter()
            .any(|f| f.as_str() == UNKNOWN_SIGNAL)
    }
}

/// Deduplication key for connections: `(provider_id, account_key)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionKey {
    pub provider_id: String,
    pub account_key: String,
}

/// One external account or device attached to one sense.
///
/// Connections are never mutated in place; a change is a remove plus an add.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Connection {
    /// Identifier local to the origin the record came from.
    pub id: String,
    /// Sense this connection backs.
    pub sense_id: SenseId,
    /// Provider id, e.g. `google_fit` or `device_location`.
    pub provider_id: String,
    /// Label shown to the user.
    pub display_name: String,
    /// Account email, or a fingerprint-derived key for device connections.
    pub account_key: String,
    /// When the connection flow completed.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub connected_at: OffsetDateTime,
    /// Device attributes, for device-location connections.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub device_info: Option<DeviceInfo>,
    /// Which source of truth this record came from.
    pub origin: ConnectionOrigin,
}

impl Connection {
    /// Create a connection with a fresh id, stamped now.
    pub fn new(
        sense_id: SenseId,
        provider_id: impl Into<String>,
        account_key: impl Into<String>,
        origin: ConnectionOrigin,
    ) -> Self {
        let provider_id = provider_id.into();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sense_id,
            display_name: provider_id.clone(),
            provider_id,
            account_key: account_key.into(),
            connected_at: OffsetDateTime::now_utc(),
            device_info: None,
            origin,
        }
    }

    /// Replace the id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Replace the display name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Attach device info.
    #[must_use]
    pub fn with_device_info(mut self, info: DeviceInfo) -> Self {
        self.device_info = Some(info);
        self
    }

    /// Replace the connection timestamp.
    #[must_use]
    pub fn with_connected_at(mut self, at: OffsetDateTime) -> Self {
        self.connected_at = at;
        self
    }

    /// Re-tag the origin.
    #[must_use]
    pub fn with_origin(mut self, origin: ConnectionOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// The composite deduplication key.
    pub fn key(&self) -> ConnectionKey {
        ConnectionKey {
            provider_id: self.provider_id.clone(),
            account_key: self.account_key.clone(),
        }
    }

    /// Whether this is a browser/device location grant.
    pub fn is_device_location(&self) -> bool {
        self.provider_id == DEVICE_LOCATION_PROVIDER
    }

    /// The device fingerprint carried by this connection, if any.
    pub fn fingerprint(&self) -> Option<DeviceFingerprint> {
        self.device_info.as_ref().map(DeviceInfo::fingerprint)
    }
}

/// The result of a completed provider or device-location flow.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConnectionGrant {
    pub provider_id: String,
    pub account_key: String,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub display_name: Option<String>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub device_info: Option<DeviceInfo>,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub connected_at: OffsetDateTime,
}

impl ConnectionGrant {
    /// Turn the grant into a connection record for `sense` tagged `origin`.
    pub fn into_connection(self, sense: SenseId, origin: ConnectionOrigin) -> Connection {
        let display_name = self
            .display_name
            .unwrap_or_else(|| self.provider_id.clone());
        let mut connection = Connection::new(sense, self.provider_id, self.account_key, origin)
            .with_display_name(display_name)
            .with_connected_at(self.connected_at);
        connection.device_info = self.device_info;
        connection
    }
}

/// What a location entry points at.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum LocationKind {
    /// Whole-world coverage (news only, at most one).
    Global,
    /// A named place with coordinates.
    Specific {
        name: String,
        country: String,
        latitude: f64,
        longitude: f64,
    },
    /// Follows the user's granted device location (at most one).
    Device,
}

impl LocationKind {
    /// Short tag for logs and wire formats.
    pub fn tag(&self) -> &'static str {
        match self {
            LocationKind::Global => "global",
            LocationKind::Specific { .. } => "specific",
            LocationKind::Device => "device",
        }
    }
}

/// One geographic or device-based target for a location-aware sense.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LocationEntry {
    pub id: String,
    pub sense: LocationSense,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub kind: LocationKind,
    pub display_name: String,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub added_at: OffsetDateTime,
}

impl LocationEntry {
    fn with_kind(sense: LocationSense, kind: LocationKind, display_name: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sense,
            kind,
            display_name,
            added_at: OffsetDateTime::now_utc(),
        }
    }

    /// A global (worldwide) entry.
    pub fn global(sense: LocationSense) -> Self {
        Self::with_kind(sense, LocationKind::Global, "Global".to_string())
    }

    /// An entry that follows the device location.
    pub fn device(sense: LocationSense) -> Self {
        Self::with_kind(sense, LocationKind::Device, "Device location".to_string())
    }

    /// A specific named place.
    pub fn specific(
        sense: LocationSense,
        name: impl Into<String>,
        country: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        let name = name.into();
        let country = country.into();
        let display_name = if country.is_empty() {
            name.clone()
        } else {
            format!("{}, {}", name, country)
        };
        Self::with_kind(
            sense,
            LocationKind::Specific {
                name,
                country,
                latitude,
                longitude,
            },
            display_name,
        )
    }

    /// Replace the id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Case-insensitive `(name, country)` key for specific entries.
    pub fn place_key(&self) -> Option<(String, String)> {
        match &self.kind {
            LocationKind::Specific { name, country, .. } => Some((
                name.trim().to_lowercase(),
                country.trim().to_lowercase(),
            )),
            _ => None,
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self.kind, LocationKind::Global)
    }

    pub fn is_device(&self) -> bool {
        matches!(self.kind, LocationKind::Device)
    }
}

/// A candidate place returned by the external geocoding lookup.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeocodeCandidate {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl GeocodeCandidate {
    /// Turn the candidate into a `Specific` entry for `sense`.
    pub fn into_entry(self, sense: LocationSense) -> LocationEntry {
        LocationEntry::specific(sense, self.name, self.country, self.latitude, self.longitude)
    }
}

/// Derived activation state of one sense. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SenseActivationState {
    pub active: bool,
    pub connection_count: usize,
    pub location_count: usize,
}

/// Derived summary counters for the whole persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AggregateSummary {
    pub essential_count: usize,
    pub additional_count: usize,
    /// Sub-statistic of `additional_count`; not added to the total.
    pub connected_service_count: usize,
    pub total_count: usize,
}

impl AggregateSummary {
    /// Whether `total_count` was capped below `essential_count + additional_count`.
    ///
    /// Happens when an essential sense is also backed and has data, so it
    /// appears in both counts.
    pub fn is_clamped(&self) -> bool {
        self.total_count < self.essential_count + self.additional_count
    }
}

impl fmt::Display for AggregateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} active senses ({} essential, {} additional, {} connected services)",
            self.total_count,
            self.essential_count,
            self.additional_count,
            self.connected_service_count
        )
    }
}
