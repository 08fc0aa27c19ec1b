//! The persistence boundary.
//!
//! The core never talks to the network itself. An [`EditorSession`] emits
//! [`crate::PendingOp`] values; [`crate::sync`] runs them against a
//! [`PersistenceService`] and hands the outcome back. Two implementations
//! ship with the crate: [`crate::MockPersistence`] for tests and, behind the
//! `service-client` feature, an HTTP client.
//!
//! Wire shapes:
//!
//! | Call | Request | Response |
//! |------|---------|----------|
//! | `PUT /personas/{id}` | [`PersonaDocument`] | empty |
//! | `POST /oauth-connections` | [`NewConnection`] | [`PersistedConnection`] |
//! | `DELETE /oauth-connections/{id}` | none | empty |
//!
//! [`EditorSession`]: crate::EditorSession

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use senses_types::{
    Connection, ConnectionOrigin, DEVICE_LOCATION_PROVIDER, LocationEntry, LocationSense,
    ParseResult, ProviderMetadata, SenseId,
};

use crate::error::Result;

/// Body of `PUT /personas/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaDocument {
    /// Enabled senses (toggle set plus every sense with backing evidence).
    pub senses: Vec<SenseId>,
    /// Every location list, keyed by sense-type.
    #[serde(default)]
    pub location_configs: BTreeMap<LocationSense, Vec<LocationEntry>>,
    /// The news list.
    #[serde(default)]
    pub news_configurations: Vec<LocationEntry>,
    /// The weather and air-quality lists, concatenated.
    #[serde(default)]
    pub weather_air_quality_configurations: Vec<LocationEntry>,
}

impl PersonaDocument {
    /// All location entries for `sense` found in the document.
    ///
    /// `location_configs` is preferred; the legacy per-family arrays are read
    /// when it has no list for `sense`.
    pub fn locations_for(&self, sense: LocationSense) -> Vec<LocationEntry> {
        if let Some(list) = self.location_configs.get(&sense) {
            return list.clone();
        }
        let legacy = match sense {
            LocationSense::News => &self.news_configurations,
            LocationSense::Weather | LocationSense::AirQuality => {
                &self.weather_air_quality_configurations
            }
        };
        legacy.iter().filter(|e| e.sense == sense).cloned().collect()
    }
}

/// Body of `POST /oauth-connections`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewConnection {
    pub persona_id: String,
    pub provider: String,
    pub sense_type: SenseId,
    pub display_name: String,
    pub account_key: String,
    /// Provider/device payload, stored verbatim by the server.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
}

impl NewConnection {
    /// Build the request for a locally created connection.
    pub fn from_connection(persona_id: &str, connection: &Connection) -> Result<Self> {
        let metadata = match &connection.device_info {
            Some(info) => serde_json::json!({ "device_info": serde_json::to_value(info)? }),
            None => serde_json::Value::Null,
        };
        Ok(Self {
            persona_id: persona_id.to_string(),
            provider: connection.provider_id.clone(),
            sense_type: connection.sense_id.clone(),
            display_name: connection.display_name.clone(),
            account_key: connection.account_key.clone(),
            metadata,
        })
    }
}

/// The authoritative connection record returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedConnection {
    pub id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub provider: String,
    pub sense_type: SenseId,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub account_key: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl PersistedConnection {
    /// Convert into a `Persisted` connection record.
    ///
    /// Missing fields fall back to the parsed metadata: account email, then a
    /// device fingerprint key, then the record id.
    ///
    /// # Errors
    ///
    /// Returns a parse error if `metadata` is neither an object nor `null`.
    pub fn into_connection(self) -> ParseResult<Connection> {
        let meta = ProviderMetadata::from_json(&self.metadata)?;

        let account_key = self
            .account_key
            .filter(|k| !k.is_empty())
            .or(meta.account_email)
            .or_else(|| {
                (self.provider == DEVICE_LOCATION_PROVIDER)
                    .then(|| meta.device.as_ref().map(|d| d.fingerprint().account_key()))
                    .flatten()
            })
            .unwrap_or_else(|| self.id.clone());
        let display_name = self
            .display_name
            .or(meta.display_name)
            .unwrap_or_else(|| self.provider.clone());

        let mut connection = Connection::new(
            self.sense_type,
            self.provider,
            account_key,
            ConnectionOrigin::Persisted,
        )
        .with_id(self.id)
        .with_display_name(display_name)
        .with_connected_at(self.created_at);
        connection.device_info = meta.device;
        Ok(connection)
    }
}

/// Durable storage for persona senses.
///
/// Implementations perform one network call per method and do not retry.
#[async_trait]
pub trait PersistenceService: Send + Sync {
    /// Save the persona's enabled senses and location lists.
    async fn update_persona(&self, persona_id: &str, document: &PersonaDocument) -> Result<()>;

    /// Create a connection record and return the authoritative copy.
    async fn create_connection(&self, request: &NewConnection) -> Result<PersistedConnection>;

    /// Delete a connection record by its persisted id.
    async fn delete_connection(&self, connection_id: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use senses_types::DeviceInfo;

    #[test]
    fn test_persona_document_camel_case() {
        let doc = PersonaDocument {
            senses: vec![SenseId::new("fitness")],
            ..PersonaDocument::default()
        };
        let value = serde_json::to_value(&doc).unwrap();
        assert!(value.get("locationConfigs").is_some());
        assert!(value.get("newsConfigurations").is_some());
        assert!(value.get("weatherAirQualityConfigurations").is_some());
        assert_eq!(value["senses"][0], "fitness");
    }

    #[test]
    fn test_locations_for_reads_legacy_arrays() {
        let doc = PersonaDocument {
            weather_air_quality_configurations: vec![
                LocationEntry::specific(LocationSense::Weather, "Paris", "FR", 48.85, 2.35),
                LocationEntry::device(LocationSense::AirQuality),
            ],
            ..PersonaDocument::default()
        };
        assert_eq!(doc.locations_for(LocationSense::Weather).len(), 1);
        assert_eq!(doc.locations_for(LocationSense::AirQuality).len(), 1);
        assert!(doc.locations_for(LocationSense::News).is_empty());
    }

    #[test]
    fn test_persisted_connection_into_connection() {
        let json = r#"{
            "id": "srv-1",
            "created_at": "2024-05-01T12:00:00Z",
            "provider": "fitbit",
            "sense_type": "fitness",
            "metadata": {"email": "a@x.com", "name": "Fitbit (a@x.com)"}
        }"#;
        let persisted: PersistedConnection = serde_json::from_str(json).unwrap();
        let conn = persisted.into_connection().unwrap();
        assert_eq!(conn.id, "srv-1");
        assert_eq!(conn.account_key, "a@x.com");
        assert_eq!(conn.display_name, "Fitbit (a@x.com)");
        assert_eq!(conn.origin, ConnectionOrigin::Persisted);
    }

    #[test]
    fn test_persisted_device_connection_uses_fingerprint_key() {
        let json = r#"{
            "id": "srv-2",
            "created_at": "2024-05-01T12:00:00Z",
            "provider": "device_location",
            "sense_type": "location",
            "metadata": {"deviceInfo": {"browser": "Chrome", "os": "macOS", "platform": "MacIntel", "screen": "1920x1080"}}
        }"#;
        let persisted: PersistedConnection = serde_json::from_str(json).unwrap();
        let conn = persisted.into_connection().unwrap();
        assert_eq!(conn.account_key, "device:Chrome/macOS/MacIntel/1920x1080");
        assert_eq!(conn.display_name, "device_location");
        assert!(conn.fingerprint().is_some());
    }

    #[test]
    fn test_persisted_connection_bad_metadata() {
        let persisted = PersistedConnection {
            id: "srv-3".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            provider: "fitbit".into(),
            sense_type: SenseId::new("fitness"),
            display_name: None,
            account_key: None,
            metadata: serde_json::json!([1, 2]),
        };
        assert!(persisted.into_connection().is_err());
    }

    #[test]
    fn test_new_connection_carries_device_info() {
        let conn = Connection::new(
            SenseId::new("location"),
            DEVICE_LOCATION_PROVIDER,
            "device:x",
            ConnectionOrigin::Session,
        )
        .with_device_info(DeviceInfo::unknown());
        let request = NewConnection::from_connection("persona-1", &conn).unwrap();
        assert_eq!(request.metadata["device_info"]["browser"], "unknown");

        let plain = Connection::new(SenseId::new("fitness"), "fitbit", "a@x.com", ConnectionOrigin::Session);
        let request = NewConnection::from_connection("persona-1", &plain).unwrap();
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("metadata"));
    }
}
