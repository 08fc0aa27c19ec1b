//! Summary counters across the whole persona.
//!
//! A backed sense-type counts once no matter how many connections or
//! locations it has. Connected services are a sub-statistic of the
//! additional count and are not added to the total.
//!
//! Backed senses count toward `additional_count` even when they are also
//! essential. `total_count` is clamped to the number of known senses, so it
//! can fall short of `essential_count + additional_count`; see
//! [`AggregateSummary::is_clamped`].

use std::collections::{BTreeMap, BTreeSet};

use tracing::info;

use senses_types::{AggregateSummary, Connection, LocationEntry, LocationSense, SenseId};

use crate::catalog::{Backing, SenseCatalog};

/// Computes [`AggregateSummary`] values.
#[derive(Debug, Clone, Copy)]
pub struct AggregateCounter<'a> {
    catalog: &'a SenseCatalog,
}

impl<'a> AggregateCounter<'a> {
    pub fn new(catalog: &'a SenseCatalog) -> Self {
        Self { catalog }
    }

    /// Summarize the persona.
    ///
    /// `connections_by_type` and `locations_by_type` hold merged lists;
    /// missing keys and empty lists are equivalent.
    pub fn summarize(
        &self,
        all_sense_ids: &[SenseId],
        essential_ids: &BTreeSet<SenseId>,
        toggles: &BTreeSet<SenseId>,
        connections_by_type: &BTreeMap<SenseId, Vec<Connection>>,
        locations_by_type: &BTreeMap<LocationSense, Vec<LocationEntry>>,
    ) -> AggregateSummary {
        let all: BTreeSet<&SenseId> = all_sense_ids.iter().collect();
        let has_connections =
            |id: &SenseId| connections_by_type.get(id).is_some_and(|c| !c.is_empty());
        let has_locations = |id: &SenseId| {
            LocationSense::try_from(id)
                .ok()
                .and_then(|sense| locations_by_type.get(&sense))
                .is_some_and(|l| !l.is_empty())
        };

        let toggled = toggles
            .iter()
            .filter(|id| all.contains(id))
            .filter(|id| !essential_ids.contains(*id))
            .filter(|id| self.catalog.backing(id) == Backing::Toggle)
            .count();

        let mut backed = 0;
        let mut connected_services = 0;
        for id in &all {
            match self.catalog.backing(id) {
                Backing::Connection if has_connections(*id) => {
                    backed += 1;
                    connected_services += 1;
                }
                Backing::Location if has_locations(*id) => backed += 1,
                _ => {}
            }
        }

        let essential_count = essential_ids.len();
        let additional_count = toggled + backed;
        let uncapped = essential_count + additional_count;
        let total_count = uncapped.min(all.len());
        if total_count < uncapped {
            info!(
                uncapped,
                known = all.len(),
                essential = essential_count,
                additional = additional_count,
                "Clamped total sense count"
            );
        }

        AggregateSummary {
            essential_count,
            additional_count,
            connected_service_count: connected_services,
            total_count,
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use senses_types::ConnectionOrigin;

    const NAMES: [&str; 13] = [
        "time", "date", "season", "weather", "air_quality", "news", "location", "fitness",
        "sleep", "calendar", "light_level", "noise_level", "battery",
    ];

    fn subset() -> impl Strategy<Value = BTreeSet<SenseId>> {
        prop::sample::subsequence(NAMES.to_vec(), 0..NAMES.len())
            .prop_map(|names| names.into_iter().map(SenseId::new).collect())
    }

    proptest! {
        #[test]
        fn total_never_exceeds_known_senses(
            essential in subset(),
            toggles in subset(),
            connected in subset(),
            located in prop::sample::subsequence(LocationSense::ALL.to_vec(), 0..=3),
            per_type in 1usize..6,
        ) {
            let catalog = SenseCatalog::default();
            let connections: BTreeMap<_, _> = connected
                .into_iter()
                .map(|id| {
                    let list = (0..per_type)
                        .map(|i| Connection::new(id.clone(), "fitbit", format!("{i}@x.com"), ConnectionOrigin::Session))
                        .collect();
                    (id, list)
                })
                .collect();
            let locations: BTreeMap<_, _> = located
                .into_iter()
                .map(|sense| (sense, vec![LocationEntry::device(sense); per_type]))
                .collect();

            let all = catalog.all_sense_ids();
            let summary = AggregateCounter::new(&catalog)
                .summarize(&all, &essential, &toggles, &connections, &locations);

            prop_assert!(summary.total_count <= all.len());
            prop_assert!(summary.connected_service_count <= summary.additional_count);
            prop_assert!(summary.additional_count <= all.len());
        }
    }
}
