//! Location list reconciliation for weather, air quality and news.
//!
//! Location lists are edited as a whole through one modal, so precedence is
//! coarser than for connections: a non-empty persisted list is authoritative
//! and the local list is ignored in full. The local list only matters while
//! the owning form has not round-tripped a save.
//!
//! Entry rules per sense-type:
//!
//! | Kind | Limit |
//! |------|-------|
//! | `Global` | At most one, news only |
//! | `Device` | At most one, requires a connected `location` sense |
//! | `Specific` | Unique by `(name, country)`, case-insensitive |

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info, warn};

use senses_types::{Connection, LocationEntry, LocationKind, LocationSense};

use crate::error::Rejection;

/// Merge the persisted and local lists for `sense`.
///
/// A non-empty `persisted` list wins wholesale. The chosen list is filtered
/// to `sense` and deduplicated, keeping the first Global, the first Device
/// and the first Specific per place key.
pub fn merge(
    sense: LocationSense,
    persisted: &[LocationEntry],
    local: &[LocationEntry],
) -> Vec<LocationEntry> {
    let source = if persisted.is_empty() { local } else { persisted };

    let mut has_global = false;
    let mut has_device = false;
    let mut places = HashSet::new();

    source
        .iter()
        .filter(|entry| entry.sense == sense)
        .filter(|entry| match &entry.kind {
            LocationKind::Global => !std::mem::replace(&mut has_global, true),
            LocationKind::Device => !std::mem::replace(&mut has_device, true),
            LocationKind::Specific { .. } => entry.place_key().is_some_and(|k| places.insert(k)),
        })
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Default)]
struct Lists {
    persisted: Vec<LocationEntry>,
    local: Vec<LocationEntry>,
}

impl Lists {
    /// The list edits land on: persisted when present, otherwise local.
    fn effective_mut(&mut self) -> &mut Vec<LocationEntry> {
        if self.persisted.is_empty() {
            &mut self.local
        } else {
            &mut self.persisted
        }
    }
}

/// Persisted and local location lists per sense-type.
#[derive(Debug, Clone, Default)]
pub struct LocationConfigStore {
    lists: BTreeMap<LocationSense, Lists>,
}

impl LocationConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the persisted list wholesale and drop the local list.
    ///
    /// This is how a successful persisted fetch or save lands.
    pub fn replace_persisted(&mut self, sense: LocationSense, entries: Vec<LocationEntry>) {
        let lists = self.lists.entry(sense).or_default();
        lists.persisted = entries.into_iter().filter(|e| e.sense == sense).collect();
        lists.local.clear();
        debug!(%sense, count = lists.persisted.len(), "Replaced persisted locations");
    }

    /// Replace the local list without touching the persisted one.
    pub fn replace_local(&mut self, sense: LocationSense, entries: Vec<LocationEntry>) {
        let lists = self.lists.entry(sense).or_default();
        lists.local = entries.into_iter().filter(|e| e.sense == sense).collect();
        debug!(%sense, count = lists.local.len(), "Replaced local locations");
    }

    pub fn persisted(&self, sense: LocationSense) -> &[LocationEntry] {
        self.lists
            .get(&sense)
            .map_or(&[][..], |l| l.persisted.as_slice())
    }

    pub fn local(&self, sense: LocationSense) -> &[LocationEntry] {
        self.lists.get(&sense).map_or(&[][..], |l| l.local.as_slice())
    }

    /// The merged list for `sense`.
    pub fn merged(&self, sense: LocationSense) -> Vec<LocationEntry> {
        match self.lists.get(&sense) {
            Some(lists) => merge(sense, &lists.persisted, &lists.local),
            None => Vec::new(),
        }
    }

    pub fn location_count(&self, sense: LocationSense) -> usize {
        self.merged(sense).len()
    }

    /// Merged lists for every sense-type that has at least one entry.
    pub fn locations_by_sense(&self) -> BTreeMap<LocationSense, Vec<LocationEntry>> {
        LocationSense::ALL
            .into_iter()
            .map(|sense| (sense, self.merged(sense)))
            .filter(|(_, list)| !list.is_empty())
            .collect()
    }

    /// Validate and add an entry to the effective list.
    ///
    /// `location_connections` is the merged connection list of the
    /// `location` sense; a `Device` entry needs it to be non-empty.
    pub fn add_location(
        &mut self,
        sense: LocationSense,
        entry: LocationEntry,
        location_connections: &[Connection],
    ) -> Result<LocationEntry, Rejection> {
        if let Err(rejection) = self.validate(sense, &entry, location_connections) {
            warn!(%sense, kind = entry.kind.tag(), reason = %rejection, "Location rejected");
            return Err(rejection);
        }

        info!(%sense, kind = entry.kind.tag(), name = %entry.display_name, "Location added");
        self.lists
            .entry(sense)
            .or_default()
            .effective_mut()
            .push(entry.clone());
        Ok(entry)
    }

    /// Remove an entry by id from both lists. Unconditional.
    pub fn remove_location(&mut self, sense: LocationSense, id: &str) -> Option<LocationEntry> {
        let lists = self.lists.get_mut(&sense)?;
        let mut removed = None;
        for list in [&mut lists.persisted, &mut lists.local] {
            if let Some(pos) = list.iter().position(|e| e.id == id) {
                removed.get_or_insert(list.remove(pos));
            }
        }
        match &removed {
            Some(entry) => info!(%sense, id, name = %entry.display_name, "Location removed"),
            None => debug!(%sense, id, "No location to remove"),
        }
        removed
    }

    fn validate(
        &self,
        sense: LocationSense,
        entry: &LocationEntry,
        location_connections: &[Connection],
    ) -> Result<(), Rejection> {
        if entry.sense != sense {
            return Err(Rejection::LocationSenseMismatch {
                expected: sense,
                actual: entry.sense,
            });
        }

        let existing = self.merged(sense);
        match &entry.kind {
            LocationKind::Global => {
                if !sense.supports_global() {
                    return Err(Rejection::GlobalNotSupported { sense });
                }
                if existing.iter().any(LocationEntry::is_global) {
                    return Err(Rejection::DuplicateGlobal { sense });
                }
            }
            LocationKind::Device => {
                if existing.iter().any(LocationEntry::is_device) {
                    return Err(Rejection::DuplicateDeviceLocation { sense });
                }
                if location_connections.is_empty() {
                    return Err(Rejection::LocationSenseNotConnected { sense });
                }
            }
            LocationKind::Specific { .. } => {
                let key = entry.place_key();
                if existing.iter().any(|e| e.place_key() == key) {
                    return Err(Rejection::DuplicatePlace {
                        sense,
                        place: entry.display_name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
