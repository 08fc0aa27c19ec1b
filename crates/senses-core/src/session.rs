//! The editing session that owns the stores.
//!
//! User actions mutate the stores synchronously and return [`PendingOp`]
//! values describing the network call to make. The caller runs them through
//! [`crate::sync`] and folds each [`OpOutcome`] back with
//! [`EditorSession::apply`]. Derived values are always computed against the
//! latest local state.
//!
//! ```text
//! connect() ──► ConnectionStore (Session/Fallback) ──► PendingOp::CreateConnection
//!                                                         │
//!                         sync::execute ◄─────────────────┘
//!                               │
//! apply(OpOutcome::Created) ◄───┘  record_persisted(): merge by key
//! ```
//!
//! A failed call becomes a [`SyncIssue`]; the optimistic mutation stays.
//!
//! # Example
//!
//! ```
//! use senses_core::EditorSession;
//! use senses_types::{ConnectionGrant, SenseId};
//!
//! let mut session = EditorSession::default();
//! let fitness = SenseId::new("fitness");
//! let grant = ConnectionGrant {
//!     provider_id: "fitbit".into(),
//!     account_key: "a@x.com".into(),
//!     display_name: None,
//!     device_info: None,
//!     connected_at: time::OffsetDateTime::now_utc(),
//! };
//!
//! // No persona id yet: the connection is held as a fallback record.
//! let pending = session.connect(&fitness, grant).unwrap();
//! assert!(pending.is_none());
//! assert!(session.activation(&fitness).active);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use senses_types::{
    AggregateSummary, Connection, ConnectionGrant, ConnectionOrigin, LocationEntry, LocationSense,
    SenseActivationState, SenseId, known,
};

use crate::aggregate::AggregateCounter;
use crate::catalog::{ProviderLimits, SenseCatalog, SenseCategory};
use crate::connections::ConnectionStore;
use crate::enablement::EnablementResolver;
use crate::error::Rejection;
use crate::events::{EventDispatcher, EventReceiver, SenseEvent};
use crate::fingerprint::DeviceFingerprinter;
use crate::locations::LocationConfigStore;
use crate::persistence::{NewConnection, PersistedConnection, PersonaDocument};

/// A persistence failure kept for a non-fatal banner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncIssue {
    pub operation: String,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
}

/// A network call owed to the persistence service.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingOp {
    /// Persist a session connection. `local_id` is the session record's id.
    CreateConnection {
        sense: SenseId,
        local_id: String,
        request: NewConnection,
    },
    /// Delete a persisted connection.
    DeleteConnection {
        sense: SenseId,
        connection_id: String,
    },
    /// Save enabled senses and location lists. `revision` is the session's
    /// location revision when the document was built.
    UpdatePersona {
        persona_id: String,
        revision: u64,
        document: PersonaDocument,
    },
}

impl PendingOp {
    /// Operation name used in logs, events and errors.
    pub fn operation(&self) -> &'static str {
        match self {
            PendingOp::CreateConnection { .. } => "create_connection",
            PendingOp::DeleteConnection { .. } => "delete_connection",
            PendingOp::UpdatePersona { .. } => "update_persona",
        }
    }
}

/// The result of running a [`PendingOp`].
#[derive(Debug, Clone, PartialEq)]
pub enum OpOutcome {
    Created {
        sense: SenseId,
        local_id: String,
        record: PersistedConnection,
    },
    Deleted {
        sense: SenseId,
        connection_id: String,
    },
    PersonaUpdated {
        persona_id: String,
        revision: u64,
        document: PersonaDocument,
    },
    Failed {
        operation: String,
        message: String,
    },
}

/// State of one open persona editor.
#[derive(Debug, Clone)]
pub struct EditorSession {
    catalog: SenseCatalog,
    connections: ConnectionStore,
    locations: LocationConfigStore,
    toggles: BTreeSet<SenseId>,
    persona_id: Option<String>,
    /// Bumped on every location mutation; older persona echoes are stale.
    location_revision: u64,
    events: EventDispatcher,
    sync_issues: Vec<SyncIssue>,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(
            SenseCatalog::default(),
            ProviderLimits::default(),
            DeviceFingerprinter::default(),
        )
    }
}

impl EditorSession {
    /// Create an empty session.
    pub fn new(
        catalog: SenseCatalog,
        limits: ProviderLimits,
        fingerprinter: DeviceFingerprinter,
    ) -> Self {
        Self {
            catalog,
            connections: ConnectionStore::new(limits, fingerprinter),
            locations: LocationConfigStore::new(),
            toggles: BTreeSet::new(),
            persona_id: None,
            location_revision: 0,
            events: EventDispatcher::default(),
            sync_issues: Vec::new(),
        }
    }

    /// Start with a persona that already has a durable id.
    #[must_use]
    pub fn with_persona_id(mut self, persona_id: impl Into<String>) -> Self {
        self.persona_id = Some(persona_id.into());
        self
    }

    /// Share an existing event dispatcher.
    #[must_use]
    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }

    pub fn catalog(&self) -> &SenseCatalog {
        &self.catalog
    }

    pub fn connections(&self) -> &ConnectionStore {
        &self.connections
    }

    /// Direct store access, for hydration.
    pub fn connections_mut(&mut self) -> &mut ConnectionStore {
        &mut self.connections
    }

    pub fn locations(&self) -> &LocationConfigStore {
        &self.locations
    }

    /// Direct store access, for hydration.
    pub fn locations_mut(&mut self) -> &mut LocationConfigStore {
        &mut self.locations
    }

    pub fn toggles(&self) -> &BTreeSet<SenseId> {
        &self.toggles
    }

    pub fn persona_id(&self) -> Option<&str> {
        self.persona_id.as_deref()
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    /// Persistence failures recorded so far.
    pub fn sync_issues(&self) -> &[SyncIssue] {
        &self.sync_issues
    }

    /// Dismiss all recorded failures.
    pub fn clear_sync_issues(&mut self) {
        self.sync_issues.clear();
    }

    /// Hydrate from a fetched persona document and its connection records.
    ///
    /// Persisted lists are replaced wholesale; session and fallback records
    /// are kept.
    pub fn load_persona(&mut self, document: &PersonaDocument, connections: Vec<Connection>) {
        self.toggles = document.senses.iter().cloned().collect();

        let mut by_sense: BTreeMap<SenseId, Vec<Connection>> = BTreeMap::new();
        for conn in connections {
            by_sense.entry(conn.sense_id.clone()).or_default().push(conn);
        }
        for sense in self.catalog.all_sense_ids() {
            if self.catalog.is_connection_backed(&sense) {
                let list = by_sense.remove(&sense).unwrap_or_default();
                self.connections.replace_persisted(&sense, list);
            }
        }
        for (sense, list) in by_sense {
            self.connections.replace_persisted(&sense, list);
        }

        for sense in LocationSense::ALL {
            self.locations
                .replace_persisted(sense, document.locations_for(sense));
        }
        self.location_revision += 1;
        info!(
            toggles = self.toggles.len(),
            connections = self.connections.connections_by_sense().len(),
            "Loaded persona"
        );
    }

    /// Switch a toggle-backed sense on or off.
    ///
    /// Essential senses cannot be toggled. For backed senses the toggle is
    /// recorded but does not decide enablement.
    pub fn toggle(&mut self, sense: &SenseId, enabled: bool) -> Option<PendingOp> {
        if self.catalog.category(sense) == SenseCategory::Essential {
            debug!(sense = %sense, "Ignoring toggle of essential sense");
            return None;
        }

        let changed = if enabled {
            self.toggles.insert(sense.clone())
        } else {
            self.toggles.remove(sense)
        };
        if !changed {
            return None;
        }

        debug!(sense = %sense, enabled, "Sense toggled");
        self.events.send(SenseEvent::Toggled {
            sense: sense.clone(),
            enabled,
        });
        self.persona_update()
    }

    /// Advisory check before starting an external connection flow.
    pub fn check_connection(&self, sense: &SenseId, provider_id: &str) -> Result<(), Rejection> {
        self.connections.check_connection(sense, provider_id)
    }

    /// Record a completed provider or device-location flow.
    ///
    /// Without a persona id the record is held as a fallback and nothing is
    /// owed to the server yet.
    pub fn connect(
        &mut self,
        sense: &SenseId,
        grant: ConnectionGrant,
    ) -> Result<Option<PendingOp>, Rejection> {
        let origin = match self.persona_id {
            Some(_) => ConnectionOrigin::Session,
            None => ConnectionOrigin::Fallback,
        };
        let mut connection = grant.into_connection(sense.clone(), origin);
        if connection.display_name == connection.provider_id {
            connection.display_name = self.catalog.provider_name(&connection.provider_id);
        }

        let stored = match self.connections.add_connection(sense, connection) {
            Ok(stored) => stored,
            Err(rejection) => {
                self.events.send(SenseEvent::ConnectionRejected {
                    sense: sense.clone(),
                    reason: rejection.reason(),
                });
                return Err(rejection);
            }
        };

        self.events.send(SenseEvent::Connected {
            sense: sense.clone(),
            connection_id: stored.id.clone(),
            provider: stored.provider_id.clone(),
            origin: stored.origin,
        });
        Ok(self.create_op(&stored))
    }

    /// Remove a connection locally.
    ///
    /// Only persisted records owe a delete call. Returns `None` when the id
    /// is unknown or nothing is owed.
    pub fn disconnect(&mut self, sense: &SenseId, connection_id: &str) -> Option<PendingOp> {
        let removed = self.connections.remove_connection(sense, connection_id)?;
        self.events.send(SenseEvent::Disconnected {
            sense: sense.clone(),
            connection_id: removed.id.clone(),
        });

        match removed.origin {
            ConnectionOrigin::Persisted => Some(PendingOp::DeleteConnection {
                sense: sense.clone(),
                connection_id: removed.id,
            }),
            _ => None,
        }
    }

    /// Add a location entry. The merged `location` connections gate
    /// `Device` entries.
    pub fn add_location(
        &mut self,
        sense: LocationSense,
        entry: LocationEntry,
    ) -> Result<Option<PendingOp>, Rejection> {
        let location_connections = self.connections.merged(&SenseId::new(known::LOCATION));
        self.locations
            .add_location(sense, entry, &location_connections)?;
        self.location_revision += 1;
        self.locations_changed(sense);
        Ok(self.persona_update())
    }

    /// Remove a location entry. Unconditional.
    pub fn remove_location(&mut self, sense: LocationSense, id: &str) -> Option<PendingOp> {
        self.locations.remove_location(sense, id)?;
        self.location_revision += 1;
        self.locations_changed(sense);
        self.persona_update()
    }

    /// Give the persona its durable id.
    ///
    /// Fallback connections are re-tagged as session records and each owes a
    /// create call; the document owes one update.
    pub fn assign_persona_id(&mut self, persona_id: impl Into<String>) -> Vec<PendingOp> {
        let persona_id = persona_id.into();
        info!(persona_id = %persona_id, "Persona id assigned");
        self.persona_id = Some(persona_id);

        let mut ops: Vec<PendingOp> = self
            .connections
            .anchor_fallback()
            .iter()
            .filter_map(|conn| self.create_op(conn))
            .collect();
        ops.extend(self.persona_update());
        ops
    }

    /// Every call still owed for the current state: one create per session
    /// record, then the persona update. Empty without a persona id.
    ///
    /// Used to flush a session restored from a snapshot.
    pub fn pending_ops(&self) -> Vec<PendingOp> {
        let mut ops: Vec<PendingOp> = self
            .connections
            .connections_by_sense()
            .values()
            .flatten()
            .filter_map(|conn| self.create_op(conn))
            .collect();
        ops.extend(self.persona_update());
        ops
    }

    /// The `PUT /personas/{id}` body for the current state.
    ///
    /// `senses` holds the toggle set plus every backed sense with evidence.
    pub fn persona_document(&self) -> PersonaDocument {
        let mut senses = self.toggles.clone();
        senses.extend(self.connections.connections_by_sense().into_keys());
        senses.extend(
            self.locations
                .locations_by_sense()
                .into_keys()
                .map(|s| s.sense_id()),
        );

        let location_configs: BTreeMap<_, _> = LocationSense::ALL
            .into_iter()
            .map(|s| (s, self.locations.merged(s)))
            .collect();
        let news_configurations = location_configs
            .get(&LocationSense::News)
            .cloned()
            .unwrap_or_default();
        let weather_air_quality_configurations = [LocationSense::Weather, LocationSense::AirQuality]
            .iter()
            .filter_map(|s| location_configs.get(s))
            .flatten()
            .cloned()
            .collect();

        PersonaDocument {
            senses: senses.into_iter().collect(),
            location_configs,
            news_configurations,
            weather_air_quality_configurations,
        }
    }

    /// Derived state of one sense.
    pub fn activation(&self, sense: &SenseId) -> SenseActivationState {
        let connections = self.connections.merged(sense);
        let locations = LocationSense::try_from(sense)
            .map(|s| self.locations.merged(s))
            .unwrap_or_default();
        EnablementResolver::new(&self.catalog).activation(
            sense,
            &self.toggles,
            &connections,
            &locations,
        )
    }

    /// Derived state of every catalog sense, in catalog order.
    pub fn activations(&self) -> Vec<(SenseId, SenseActivationState)> {
        self.catalog
            .all_sense_ids()
            .into_iter()
            .map(|id| {
                let state = self.activation(&id);
                (id, state)
            })
            .collect()
    }

    /// Summary counters for the whole persona.
    pub fn summary(&self) -> AggregateSummary {
        AggregateCounter::new(&self.catalog).summarize(
            &self.catalog.all_sense_ids(),
            &self.catalog.essential,
            &self.toggles,
            &self.connections.connections_by_sense(),
            &self.locations.locations_by_sense(),
        )
    }

    /// Current location revision, carried by every persona update.
    pub fn location_revision(&self) -> u64 {
        self.location_revision
    }

    /// Fold the result of a persistence call back into the session.
    ///
    /// A persona echo built before the latest location edit leaves the
    /// location lists alone.
    pub fn apply(&mut self, outcome: OpOutcome) {
        match outcome {
            OpOutcome::Created {
                sense,
                local_id,
                record,
            } => match record.into_connection() {
                Ok(connection) => {
                    let superseded = self.connections.record_persisted(&sense, connection);
                    if !superseded.iter().any(|c| c.id == local_id) {
                        debug!(sense = %sense, local_id = %local_id, "Persisted record has no pending local twin");
                    }
                    self.persisted("create_connection");
                }
                Err(e) => self.record_issue("create_connection", e.to_string()),
            },
            OpOutcome::Deleted { connection_id, .. } => {
                debug!(connection_id = %connection_id, "Delete confirmed");
                self.persisted("delete_connection");
            }
            OpOutcome::PersonaUpdated {
                persona_id,
                revision,
                document,
            } => {
                if self.persona_id.as_deref() != Some(persona_id.as_str()) {
                    debug!(persona_id = %persona_id, "Ignoring update for another persona");
                    return;
                }
                if revision < self.location_revision {
                    debug!(
                        revision,
                        current = self.location_revision,
                        "Stale persona echo; keeping newer location edits"
                    );
                } else {
                    for sense in LocationSense::ALL {
                        self.locations
                            .replace_persisted(sense, document.locations_for(sense));
                    }
                }
                self.persisted("update_persona");
            }
            OpOutcome::Failed { operation, message } => self.record_issue(&operation, message),
        }
    }

    fn create_op(&self, connection: &Connection) -> Option<PendingOp> {
        let persona_id = self.persona_id.as_deref()?;
        if connection.origin != ConnectionOrigin::Session {
            return None;
        }
        match NewConnection::from_connection(persona_id, connection) {
            Ok(request) => Some(PendingOp::CreateConnection {
                sense: connection.sense_id.clone(),
                local_id: connection.id.clone(),
                request,
            }),
            Err(e) => {
                warn!(id = %connection.id, error = %e, "Could not build connection request");
                None
            }
        }
    }

    fn persona_update(&self) -> Option<PendingOp> {
        let persona_id = self.persona_id.clone()?;
        Some(PendingOp::UpdatePersona {
            persona_id,
            revision: self.location_revision,
            document: self.persona_document(),
        })
    }

    fn locations_changed(&self, sense: LocationSense) {
        self.events.send(SenseEvent::LocationsChanged {
            sense,
            count: self.locations.location_count(sense),
        });
    }

    fn persisted(&self, operation: &str) {
        info!(operation, "Persistence call succeeded");
        self.events.send(SenseEvent::Persisted {
            operation: operation.to_string(),
        });
    }

    fn record_issue(&mut self, operation: &str, message: String) {
        warn!(operation, message = %message, "Persistence call failed; keeping local state");
        self.events.send(SenseEvent::SyncFailed {
            operation: operation.to_string(),
            message: message.clone(),
        });
        self.sync_issues.push(SyncIssue {
            operation: operation.to_string(),
            message,
            at: OffsetDateTime::now_utc(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::StaticSignals;
    use senses_types::DEVICE_LOCATION_PROVIDER;

    fn grant(provider: &str, account: &str) -> ConnectionGrant {
        ConnectionGrant {
            provider_id: provider.into(),
            account_key: account.into(),
            display_name: None,
            device_info: None,
            connected_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn session_with_device() -> EditorSession {
        let fingerprinter = DeviceFingerprinter::new(
            StaticSignals::new()
                .user_agent("Mozilla/5.0 (Macintosh) Chrome/126.0 Safari/537.36")
                .platform("MacIntel")
                .screen(1920, 1080),
        );
        EditorSession::new(SenseCatalog::default(), ProviderLimits::default(), fingerprinter)
    }

    #[test]
    fn test_connect_without_persona_is_fallback() {
        let mut session = EditorSession::default();
        let fitness = SenseId::new("fitness");
        assert!(session.connect(&fitness, grant("fitbit", "a@x.com")).unwrap().is_none());

        let merged = session.connections().merged(&fitness);
        assert_eq!(merged[0].origin, ConnectionOrigin::Fallback);
        assert_eq!(merged[0].display_name, "Fitbit");
    }

    #[test]
    fn test_connect_with_persona_owes_create() {
        let mut session = EditorSession::default().with_persona_id("p-1");
        let op = session
            .connect(&SenseId::new("fitness"), grant("strava", "b@x.com"))
            .unwrap()
            .unwrap();
        match op {
            PendingOp::CreateConnection { request, .. } => {
                assert_eq!(request.persona_id, "p-1");
                assert_eq!(request.provider, "strava");
            }
            other => panic!("unexpected op {other:?}"),
        }
    }

    #[test]
    fn test_assign_persona_id_anchors_fallback() {
        let mut session = EditorSession::default();
        session
            .connect(&SenseId::new("fitness"), grant("fitbit", "a@x.com"))
            .unwrap();
        session
            .connect(&SenseId::new("sleep"), grant("oura", "a@x.com"))
            .unwrap();
        session.toggle(&SenseId::new("battery"), true);

        let ops = session.assign_persona_id("p-9");
        let creates = ops
            .iter()
            .filter(|op| matches!(op, PendingOp::CreateConnection { .. }))
            .count();
        assert_eq!(creates, 2);
        assert_eq!(ops.last().map(PendingOp::operation), Some("update_persona"));
    }

    #[test]
    fn test_pending_ops_skip_persisted_twins() {
        let mut session = EditorSession::default().with_persona_id("p-1");
        let fitness = SenseId::new("fitness");
        session.connections_mut().load(
            &fitness,
            ConnectionOrigin::Persisted,
            [Connection::new(fitness.clone(), "fitbit", "a@x.com", ConnectionOrigin::Persisted)],
        );
        session.connections_mut().load(
            &fitness,
            ConnectionOrigin::Session,
            [
                Connection::new(fitness.clone(), "fitbit", "a@x.com", ConnectionOrigin::Session),
                Connection::new(fitness.clone(), "strava", "b@x.com", ConnectionOrigin::Session),
            ],
        );

        let ops = session.pending_ops();
        let names: Vec<_> = ops.iter().map(PendingOp::operation).collect();
        assert_eq!(names, ["create_connection", "update_persona"]);
        assert!(EditorSession::default().pending_ops().is_empty());
    }

    #[test]
    fn test_toggle_essential_is_ignored() {
        let mut session = EditorSession::default().with_persona_id("p-1");
        assert!(session.toggle(&SenseId::new("time"), false).is_none());
        assert!(session.activation(&SenseId::new("time")).active);
    }

    #[test]
    fn test_toggle_twice_is_noop() {
        let mut session = EditorSession::default().with_persona_id("p-1");
        assert!(session.toggle(&SenseId::new("battery"), true).is_some());
        assert!(session.toggle(&SenseId::new("battery"), true).is_none());
    }

    #[test]
    fn test_disconnect_only_persisted_owes_delete() {
        let mut session = EditorSession::default().with_persona_id("p-1");
        let fitness = SenseId::new("fitness");
        session.connections_mut().load(
            &fitness,
            ConnectionOrigin::Persisted,
            [Connection::new(fitness.clone(), "fitbit", "a@x.com", ConnectionOrigin::Persisted).with_id("p1")],
        );
        session.connect(&fitness, grant("strava", "b@x.com")).unwrap();
        let session_id = session.connections().origin_list(&fitness, ConnectionOrigin::Session)[0]
            .id
            .clone();

        assert!(session.disconnect(&fitness, &session_id).is_none());
        assert_eq!(
            session.disconnect(&fitness, "p1"),
            Some(PendingOp::DeleteConnection {
                sense: fitness.clone(),
                connection_id: "p1".into()
            })
        );
        assert!(!session.activation(&fitness).active);
    }

    #[test]
    fn test_device_location_gates_weather_device_entry() {
        let mut session = session_with_device();
        let err = session
            .add_location(LocationSense::Weather, LocationEntry::device(LocationSense::Weather))
            .unwrap_err();
        assert!(matches!(err, Rejection::LocationSenseNotConnected { .. }));

        session
            .connect(&SenseId::new("location"), grant(DEVICE_LOCATION_PROVIDER, ""))
            .unwrap();
        session
            .add_location(LocationSense::Weather, LocationEntry::device(LocationSense::Weather))
            .unwrap();
        assert!(session.activation(&SenseId::new("weather")).active);
    }

    #[test]
    fn test_duplicate_device_emits_rejection_event() {
        let mut session = session_with_device();
        let mut rx = session.subscribe();
        let location = SenseId::new("location");
        session.connect(&location, grant(DEVICE_LOCATION_PROVIDER, "")).unwrap();
        assert!(session.connect(&location, grant(DEVICE_LOCATION_PROVIDER, "")).is_err());

        assert!(matches!(rx.try_recv(), Ok(SenseEvent::Connected { .. })));
        assert!(matches!(rx.try_recv(), Ok(SenseEvent::ConnectionRejected { .. })));
    }

    #[test]
    fn test_persona_document_contents() {
        let mut session = EditorSession::default().with_persona_id("p-1");
        session.toggle(&SenseId::new("battery"), true);
        session
            .connect(&SenseId::new("fitness"), grant("fitbit", "a@x.com"))
            .unwrap();
        session
            .add_location(LocationSense::News, LocationEntry::global(LocationSense::News))
            .unwrap();
        session
            .add_location(
                LocationSense::AirQuality,
                LocationEntry::specific(LocationSense::AirQuality, "Lyon", "FR", 45.76, 4.84),
            )
            .unwrap();

        let doc = session.persona_document();
        let names: Vec<_> = doc.senses.iter().map(SenseId::as_str).collect();
        assert_eq!(names, ["air_quality", "battery", "fitness", "news"]);
        assert_eq!(doc.news_configurations.len(), 1);
        assert_eq!(doc.weather_air_quality_configurations.len(), 1);
        assert_eq!(doc.location_configs.len(), 3);
    }

    #[test]
    fn test_apply_failure_keeps_local_state() {
        let mut session = EditorSession::default().with_persona_id("p-1");
        let fitness = SenseId::new("fitness");
        session.connect(&fitness, grant("fitbit", "a@x.com")).unwrap();

        session.apply(OpOutcome::Failed {
            operation: "create_connection".into(),
            message: "HTTP 500".into(),
        });
        assert_eq!(session.sync_issues().len(), 1);
        assert!(session.activation(&fitness).active);

        session.clear_sync_issues();
        assert!(session.sync_issues().is_empty());
    }

    #[test]
    fn test_apply_persona_update_replaces_locations() {
        let mut session = EditorSession::default().with_persona_id("p-1");
        session
            .add_location(
                LocationSense::Weather,
                LocationEntry::specific(LocationSense::Weather, "Paris", "FR", 48.85, 2.35),
            )
            .unwrap();
        let document = session.persona_document();

        session.apply(OpOutcome::PersonaUpdated {
            persona_id: "p-1".into(),
            revision: session.location_revision(),
            document,
        });
        assert_eq!(session.locations().persisted(LocationSense::Weather).len(), 1);
        assert!(session.locations().local(LocationSense::Weather).is_empty());
    }

    #[test]
    fn test_stale_persona_echo_keeps_newer_locations() {
        let mut session = EditorSession::default().with_persona_id("p-1");
        let Some(PendingOp::UpdatePersona { revision, document, .. }) =
            session.toggle(&SenseId::new("battery"), true)
        else {
            panic!("toggle should owe a persona update");
        };
        session
            .add_location(
                LocationSense::Weather,
                LocationEntry::specific(LocationSense::Weather, "Paris", "FR", 48.85, 2.35),
            )
            .unwrap();
        assert!(revision < session.location_revision());

        session.apply(OpOutcome::PersonaUpdated {
            persona_id: "p-1".into(),
            revision,
            document,
        });
        assert_eq!(session.locations().location_count(LocationSense::Weather), 1);
        assert!(session.activation(&SenseId::new("weather")).active);
        assert!(session.activation(&SenseId::new("battery")).active);
    }

    #[test]
    fn test_load_persona() {
        let mut session = EditorSession::default().with_persona_id("p-1");
        let document = PersonaDocument {
            senses: vec![SenseId::new("lightLevel")],
            news_configurations: vec![LocationEntry::global(LocationSense::News)],
            ..PersonaDocument::default()
        };
        let fitness = SenseId::new("fitness");
        let conns = vec![Connection::new(fitness.clone(), "fitbit", "a@x.com", ConnectionOrigin::Session)];
        session.load_persona(&document, conns);

        assert!(session.activation(&SenseId::new("light_level")).active);
        assert!(session.activation(&SenseId::new("news")).active);
        assert_eq!(
            session.connections().origin_list(&fitness, ConnectionOrigin::Persisted).len(),
            1
        );
    }
}
