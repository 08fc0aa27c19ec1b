//! Per-sense enablement from the strongest available evidence.
//!
//! The toggle set is only authoritative for plain on/off senses. A
//! connection-backed sense is active iff it has a merged connection, and a
//! location-backed sense is active iff it has a merged location, whatever
//! the toggle set says. Essential senses are always active.

use std::collections::BTreeSet;

use senses_types::{Connection, LocationEntry, SenseActivationState, SenseId};

use crate::catalog::{SenseCatalog, SenseCategory};

/// Decides whether a sense is active.
#[derive(Debug, Clone, Copy)]
pub struct EnablementResolver<'a> {
    catalog: &'a SenseCatalog,
}

impl<'a> EnablementResolver<'a> {
    pub fn new(catalog: &'a SenseCatalog) -> Self {
        Self { catalog }
    }

    /// Whether `sense` is active given the toggle set and its merged lists.
    pub fn is_active(
        &self,
        sense: &SenseId,
        toggles: &BTreeSet<SenseId>,
        connections: &[Connection],
        locations: &[LocationEntry],
    ) -> bool {
        match self.catalog.category(sense) {
            SenseCategory::Essential => true,
            SenseCategory::ConnectionBacked => !connections.is_empty(),
            SenseCategory::LocationBacked => !locations.is_empty(),
            SenseCategory::Toggle => toggles.contains(sense),
        }
    }

    /// Activation state with the list counts attached.
    pub fn activation(
        &self,
        sense: &SenseId,
        toggles: &BTreeSet<SenseId>,
        connections: &[Connection],
        locations: &[LocationEntry],
    ) -> SenseActivationState {
        SenseActivationState {
            active: self.is_active(sense, toggles, connections, locations),
            connection_count: connections.len(),
            location_count: locations.len(),
        }
    }
}
