//! Connection reconciliation across the three origins.
//!
//! Each sense keeps three lists, one per [`ConnectionOrigin`]. The visible
//! list is never stored; it is recomputed by [`merge`] from the three inputs:
//!
//! 1. Persisted records are inserted first.
//! 2. Session records are inserted only if their `(provider_id, account_key)`
//!    key is absent.
//! 3. Fallback records are inserted under the same rule.
//!
//! Insertion order is preserved, so merging the same inputs twice yields the
//! same list. Provider limits and duplicate-device detection are advisory and
//! live in [`ConnectionStore::check_connection`] and
//! [`ConnectionStore::add_connection`]; [`merge`] accepts whatever it is
//! given.
//!
//! # Example
//!
//! ```
//! use senses_core::connections::merge;
//! use senses_types::{Connection, ConnectionOrigin, SenseId};
//!
//! let fitness = SenseId::new("fitness");
//! let p = Connection::new(fitness.clone(), "google", "a@x.com", ConnectionOrigin::Persisted).with_id("p1");
//! let s = Connection::new(fitness.clone(), "google", "a@x.com", ConnectionOrigin::Session).with_id("s1");
//!
//! let merged = merge(&fitness, &[p], &[s], &[]);
//! assert_eq!(merged.len(), 1);
//! assert_eq!(merged[0].id, "p1");
//! ```

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info, warn};

use senses_types::{Connection, ConnectionKey, ConnectionOrigin, SenseId};

use crate::catalog::{Cardinality, ProviderLimits};
use crate::error::Rejection;
use crate::fingerprint::DeviceFingerprinter;

/// Merge the three origin lists for `sense` into one deduplicated list.
///
/// Records whose `sense_id` differs from `sense` are skipped.
pub fn merge(
    sense: &SenseId,
    persisted: &[Connection],
    session: &[Connection],
    fallback: &[Connection],
) -> Vec<Connection> {
    let mut seen: HashSet<ConnectionKey> = HashSet::new();
    let mut merged = Vec::with_capacity(persisted.len() + session.len() + fallback.len());

    for (origin, list) in ConnectionOrigin::PRECEDENCE
        .into_iter()
        .zip([persisted, session, fallback])
    {
        for conn in list {
            if &conn.sense_id != sense {
                debug!(sense = %sense, id = %conn.id, actual = %conn.sense_id, "Skipping connection for another sense");
                continue;
            }
            if seen.insert(conn.key()) {
                merged.push(conn.clone());
            } else {
                debug!(
                    sense = %sense,
                    id = %conn.id,
                    provider = %conn.provider_id,
                    %origin,
                    "Connection shadowed by higher-precedence record"
                );
            }
        }
    }

    merged
}

#[derive(Debug, Clone, Default)]
struct OriginLists {
    persisted: Vec<Connection>,
    session: Vec<Connection>,
    fallback: Vec<Connection>,
}

impl OriginLists {
    fn list(&self, origin: ConnectionOrigin) -> &Vec<Connection> {
        match origin {
            ConnectionOrigin::Persisted => &self.persisted,
            ConnectionOrigin::Session => &self.session,
            ConnectionOrigin::Fallback => &self.fallback,
        }
    }

    fn list_mut(&mut self, origin: ConnectionOrigin) -> &mut Vec<Connection> {
        match origin {
            ConnectionOrigin::Persisted => &mut self.persisted,
            ConnectionOrigin::Session => &mut self.session,
            ConnectionOrigin::Fallback => &mut self.fallback,
        }
    }

    fn is_empty(&self) -> bool {
        self.persisted.is_empty() && self.session.is_empty() && self.fallback.is_empty()
    }
}

/// Per-sense connection lists for all three origins.
///
/// Owned by one editing session. Mutations are synchronous and optimistic.
#[derive(Debug, Clone, Default)]
pub struct ConnectionStore {
    senses: BTreeMap<SenseId, OriginLists>,
    limits: ProviderLimits,
    fingerprinter: DeviceFingerprinter,
}

impl ConnectionStore {
    /// Create an empty store.
    pub fn new(limits: ProviderLimits, fingerprinter: DeviceFingerprinter) -> Self {
        Self {
            senses: BTreeMap::new(),
            limits,
            fingerprinter,
        }
    }

    /// Replace the provider limits.
    #[must_use]
    pub fn with_limits(mut self, limits: ProviderLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Replace the device fingerprinter.
    #[must_use]
    pub fn with_fingerprinter(mut self, fingerprinter: DeviceFingerprinter) -> Self {
        self.fingerprinter = fingerprinter;
        self
    }

    pub fn limits(&self) -> &ProviderLimits {
        &self.limits
    }

    pub fn fingerprinter(&self) -> &DeviceFingerprinter {
        &self.fingerprinter
    }

    /// Raw records of one origin for `sense`.
    pub fn origin_list(&self, sense: &SenseId, origin: ConnectionOrigin) -> &[Connection] {
        self.senses
            .get(sense)
            .map_or(&[][..], |lists| lists.list(origin).as_slice())
    }

    /// Append records to one origin without any checks.
    ///
    /// Used to hydrate the store from a fetched document or a snapshot.
    /// Records are re-tagged with `origin`.
    pub fn load(
        &mut self,
        sense: &SenseId,
        origin: ConnectionOrigin,
        connections: impl IntoIterator<Item = Connection>,
    ) {
        let list = self.senses.entry(sense.clone()).or_default().list_mut(origin);
        let before = list.len();
        list.extend(connections.into_iter().map(|c| c.with_origin(origin)));
        debug!(sense = %sense, %origin, loaded = list.len() - before, "Loaded connections");
    }

    /// The merged, deduplicated list for `sense`.
    pub fn merged(&self, sense: &SenseId) -> Vec<Connection> {
        match self.senses.get(sense) {
            Some(lists) => merge(sense, &lists.persisted, &lists.session, &lists.fallback),
            None => Vec::new(),
        }
    }

    /// Number of merged connections for `sense`.
    pub fn connection_count(&self, sense: &SenseId) -> usize {
        self.merged(sense).len()
    }

    /// Merged lists for every sense that has at least one connection.
    pub fn connections_by_sense(&self) -> BTreeMap<SenseId, Vec<Connection>> {
        self.senses
            .keys()
            .map(|sense| (sense.clone(), self.merged(sense)))
            .filter(|(_, list)| !list.is_empty())
            .collect()
    }

    /// Advisory check run before starting an external connection flow.
    ///
    /// Applies duplicate-device detection for `device_location` and the
    /// provider cardinality limits. Does not mutate.
    pub fn check_connection(&self, sense: &SenseId, provider_id: &str) -> Result<(), Rejection> {
        let merged = self.merged(sense);

        if provider_id == senses_types::DEVICE_LOCATION_PROVIDER {
            self.check_device(sense, &merged, &self.fingerprinter.fingerprint())?;
        }
        self.check_cardinality(&merged, provider_id)
    }

    /// Add a connection to the list of its origin.
    ///
    /// Device-location connections are stamped with the current device's
    /// info and a fingerprint-derived account key when those are missing,
    /// then checked against existing device connections. Afterwards the
    /// provider limits and the exact-key check apply.
    ///
    /// Returns the stored record on success. On rejection nothing changes.
    pub fn add_connection(
        &mut self,
        sense: &SenseId,
        mut connection: Connection,
    ) -> Result<Connection, Rejection> {
        if &connection.sense_id != sense {
            return Err(self.rejected(Rejection::SenseMismatch {
                expected: sense.clone(),
                actual: connection.sense_id.clone(),
            }));
        }

        let merged = self.merged(sense);

        if connection.is_device_location() {
            let info = connection
                .device_info
                .get_or_insert_with(|| self.fingerprinter.device_info());
            let fingerprint = info.fingerprint();
            if connection.account_key.is_empty() {
                connection.account_key = fingerprint.account_key();
            }
            self.check_device(sense, &merged, &fingerprint)
                .map_err(|r| self.rejected(r))?;
        }

        self.check_cardinality(&merged, &connection.provider_id)
            .map_err(|r| self.rejected(r))?;

        let key = connection.key();
        if merged.iter().any(|c| c.key() == key) {
            return Err(self.rejected(Rejection::AlreadyConnected {
                provider: connection.provider_id.clone(),
                account: connection.account_key.clone(),
            }));
        }

        info!(
            sense = %sense,
            provider = %connection.provider_id,
            id = %connection.id,
            origin = %connection.origin,
            "Connection added"
        );
        self.senses
            .entry(sense.clone())
            .or_default()
            .list_mut(connection.origin)
            .push(connection.clone());
        Ok(connection)
    }

    /// Remove a connection by id from whichever origin holds it.
    ///
    /// Returns the removed record, or `None` if no origin had it.
    pub fn remove_connection(&mut self, sense: &SenseId, connection_id: &str) -> Option<Connection> {
        let lists = self.senses.get_mut(sense)?;
        for origin in ConnectionOrigin::PRECEDENCE {
            let list = lists.list_mut(origin);
            if let Some(pos) = list.iter().position(|c| c.id == connection_id) {
                let removed = list.remove(pos);
                info!(sense = %sense, id = connection_id, %origin, "Connection removed");
                if lists.is_empty() {
                    self.senses.remove(sense);
                }
                return Some(removed);
            }
        }
        debug!(sense = %sense, id = connection_id, "No connection to remove");
        None
    }

    /// Merge one authoritative record by key.
    ///
    /// A persisted record with the same key is replaced in place; otherwise
    /// the record is appended. Session and fallback records with the same key
    /// are pruned and returned.
    pub fn record_persisted(&mut self, sense: &SenseId, connection: Connection) -> Vec<Connection> {
        let connection = connection.with_origin(ConnectionOrigin::Persisted);
        let key = connection.key();
        let lists = self.senses.entry(sense.clone()).or_default();

        let mut superseded = Vec::new();
        for origin in [ConnectionOrigin::Session, ConnectionOrigin::Fallback] {
            let list = lists.list_mut(origin);
            let (gone, kept): (Vec<_>, Vec<_>) =
                list.drain(..).partition(|c| c.key() == key);
            *list = kept;
            superseded.extend(gone);
        }

        match lists.persisted.iter_mut().find(|c| c.key() == key) {
            Some(existing) => *existing = connection,
            None => lists.persisted.push(connection),
        }

        info!(
            sense = %sense,
            provider = %key.provider_id,
            superseded = superseded.len(),
            "Persisted connection reconciled"
        );
        superseded
    }

    /// Install a full re-fetch of the persisted list for `sense`.
    ///
    /// Session and fallback records are kept; merge precedence hides any
    /// that the new list now covers.
    pub fn replace_persisted(&mut self, sense: &SenseId, connections: Vec<Connection>) {
        let lists = self.senses.entry(sense.clone()).or_default();
        lists.persisted = connections
            .into_iter()
            .filter(|c| &c.sense_id == sense)
            .map(|c| c.with_origin(ConnectionOrigin::Persisted))
            .collect();
        debug!(sense = %sense, count = lists.persisted.len(), "Replaced persisted connections");
    }

    /// Re-tag every fallback record as session once the persona has an id.
    ///
    /// Returns the re-tagged records, which now need persisting.
    pub fn anchor_fallback(&mut self) -> Vec<Connection> {
        let mut anchored = Vec::new();
        for (sense, lists) in &mut self.senses {
            let moved: Vec<Connection> = lists
                .fallback
                .drain(..)
                .map(|c| c.with_origin(ConnectionOrigin::Session))
                .collect();
            if !moved.is_empty() {
                debug!(sense = %sense, count = moved.len(), "Anchored fallback connections");
            }
            lists.session.extend(moved.iter().cloned());
            anchored.extend(moved);
        }
        anchored
    }

    /// Whether the merged list for `sense` is non-empty.
    pub fn has_connections(&self, sense: &SenseId) -> bool {
        !self.merged(sense).is_empty()
    }

    fn check_device(
        &self,
        sense: &SenseId,
        merged: &[Connection],
        fingerprint: &senses_types::DeviceFingerprint,
    ) -> Result<(), Rejection> {
        let duplicate = merged
            .iter()
            .filter(|c| c.is_device_location())
            .any(|c| c.fingerprint().as_ref() == Some(fingerprint));
        if duplicate {
            return Err(Rejection::DuplicateDevice {
                sense: sense.clone(),
                device: fingerprint.label(),
            });
        }
        Ok(())
    }

    fn check_cardinality(&self, merged: &[Connection], provider_id: &str) -> Result<(), Rejection> {
        let existing = merged.iter().filter(|c| c.provider_id == provider_id).count();
        match self.limits.cardinality(provider_id) {
            Cardinality::Single if existing >= 1 => Err(Rejection::SingleAccountOnly {
                provider: provider_id.to_string(),
            }),
            Cardinality::Limited(max) if existing >= max => Err(Rejection::AccountLimitReached {
                provider: provider_id.to_string(),
                max,
            }),
            _ => Ok(()),
        }
    }

    fn rejected(&self, rejection: Rejection) -> Rejection {
        warn!(reason = %rejection, "Connection rejected");
        rejection
    }
}
