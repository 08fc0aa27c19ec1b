//! Serializable capture of an editing session.
//!
//! A snapshot holds raw store contents (every origin, both location lists)
//! rather than derived values, so loading it reproduces the same merge.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use senses_types::{Connection, ConnectionOrigin, LocationEntry, LocationSense, SenseId};

use crate::catalog::{ProviderLimits, SenseCatalog};
use crate::error::Result;
use crate::fingerprint::DeviceFingerprinter;
use crate::session::EditorSession;

/// Raw session state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSnapshot {
    pub persona_id: Option<String>,
    pub toggles: BTreeSet<SenseId>,
    /// Connections of every origin; each record carries its own origin.
    pub connections: Vec<Connection>,
    pub persisted_locations: Vec<LocationEntry>,
    pub local_locations: Vec<LocationEntry>,
}

impl SessionSnapshot {
    /// Parse a snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Capture the raw contents of a session.
    pub fn capture(session: &EditorSession) -> Self {
        let store = session.connections();
        let mut senses: BTreeSet<SenseId> = session.catalog().all_sense_ids().into_iter().collect();
        senses.extend(store.connections_by_sense().into_keys());

        let mut connections = Vec::new();
        for sense in &senses {
            for origin in ConnectionOrigin::PRECEDENCE {
                connections.extend(store.origin_list(sense, origin).iter().cloned());
            }
        }

        let locations = session.locations();
        let persisted_locations = LocationSense::ALL
            .into_iter()
            .flat_map(|s| locations.persisted(s).to_vec())
            .collect();
        let local_locations = LocationSense::ALL
            .into_iter()
            .flat_map(|s| locations.local(s).to_vec())
            .collect();

        Self {
            persona_id: session.persona_id().map(String::from),
            toggles: session.toggles().clone(),
            connections,
            persisted_locations,
            local_locations,
        }
    }

    /// Rebuild a session from this snapshot.
    pub fn into_session(
        self,
        catalog: SenseCatalog,
        limits: ProviderLimits,
        fingerprinter: DeviceFingerprinter,
    ) -> EditorSession {
        let mut session = EditorSession::new(catalog, limits, fingerprinter);
        if let Some(id) = self.persona_id {
            session = session.with_persona_id(id);
        }

        for sense in &self.toggles {
            session.toggle(sense, true);
        }

        let store = session.connections_mut();
        for conn in self.connections {
            let sense = conn.sense_id.clone();
            let origin = conn.origin;
            store.load(&sense, origin, [conn]);
        }

        let locations = session.locations_mut();
        for sense in LocationSense::ALL {
            let persisted: Vec<_> = self
                .persisted_locations
                .iter()
                .filter(|e| e.sense == sense)
                .cloned()
                .collect();
            let local: Vec<_> = self
                .local_locations
                .iter()
                .filter(|e| e.sense == sense)
                .cloned()
                .collect();
            locations.replace_persisted(sense, persisted);
            locations.replace_local(sense, local);
        }

        session
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "persona_id": "p-1",
        "toggles": ["lightLevel"],
        "connections": [
            {"id": "p1", "sense_id": "fitness", "provider_id": "fitbit", "display_name": "Fitbit",
             "account_key": "a@x.com", "connected_at": "2024-05-01T12:00:00Z", "origin": "persisted"},
            {"id": "s1", "sense_id": "fitness", "provider_id": "fitbit", "display_name": "Fitbit",
             "account_key": "a@x.com", "connected_at": "2024-05-02T12:00:00Z", "origin": "session"}
        ],
        "local_locations": [
            {"id": "l1", "sense": "news", "kind": "global", "display_name": "Global",
             "added_at": "2024-05-01T12:00:00Z"}
        ]
    }"#;

    #[test]
    fn test_snapshot_into_session() {
        let snapshot = SessionSnapshot::from_json(SNAPSHOT).unwrap();
        let session = snapshot.into_session(
            SenseCatalog::default(),
            ProviderLimits::default(),
            DeviceFingerprinter::default(),
        );

        assert_eq!(session.persona_id(), Some("p-1"));
        assert!(session.toggles().contains(&SenseId::new("light_level")));
        let fitness = session.activation(&SenseId::new("fitness"));
        assert_eq!(fitness.connection_count, 1);
        assert!(session.activation(&SenseId::new("news")).active);
    }

    #[test]
    fn test_capture_then_restore() {
        let session = SessionSnapshot::from_json(SNAPSHOT).unwrap().into_session(
            SenseCatalog::default(),
            ProviderLimits::default(),
            DeviceFingerprinter::default(),
        );
        let captured = SessionSnapshot::capture(&session);
        assert_eq!(captured.connections.len(), 2);
        assert_eq!(captured.local_locations.len(), 1);

        let restored = captured.into_session(
            SenseCatalog::default(),
            ProviderLimits::default(),
            DeviceFingerprinter::default(),
        );
        assert_eq!(restored.summary(), session.summary());
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = SessionSnapshot::from_json("{}").unwrap();
        assert!(snapshot.connections.is_empty());
        let session = snapshot.into_session(
            SenseCatalog::default(),
            ProviderLimits::default(),
            DeviceFingerprinter::default(),
        );
        assert_eq!(session.summary().total_count, 2);
    }
}
