//! Sense catalog and provider limits.
//!
//! The catalog is static configuration: which senses exist, which of them are
//! essential (always on, not user-toggleable), and what evidence backs each
//! one. Both types deserialize from TOML/JSON with every field optional, so a
//! configuration file only needs to list what it overrides.
//!
//! # Example
//!
//! ```
//! use senses_core::{Backing, SenseCatalog, SenseCategory};
//! use senses_types::SenseId;
//!
//! let catalog = SenseCatalog::default();
//! assert_eq!(catalog.backing(&SenseId::new("fitness")), Backing::Connection);
//! assert_eq!(catalog.category(&SenseId::new("time")), SenseCategory::Essential);
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use senses_types::{DEVICE_LOCATION_PROVIDER, LocationSense, SenseId, known};

use crate::error::{Error, Result};

/// The evidence that makes a sense active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backing {
    /// Active iff at least one connection exists.
    Connection,
    /// Active iff at least one location entry exists.
    Location,
    /// Active iff present in the toggle set.
    Toggle,
}

/// How the enablement rule treats a sense.
///
/// Essential membership takes priority over backing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SenseCategory {
    Essential,
    ConnectionBacked,
    LocationBacked,
    Toggle,
}

/// One entry in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenseDefinition {
    pub id: SenseId,
    pub name: String,
    pub backing: Backing,
}

impl SenseDefinition {
    pub fn new(id: &str, name: &str, backing: Backing) -> Self {
        Self {
            id: SenseId::new(id),
            name: name.to_string(),
            backing,
        }
    }
}

/// A known external provider and the sense it backs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDefinition {
    pub id: String,
    pub name: String,
    pub sense: SenseId,
}

impl ProviderDefinition {
    fn new(id: &str, name: &str, sense: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            sense: SenseId::new(sense),
        }
    }
}

/// Static sense configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SenseCatalog {
    /// Known senses in display order.
    pub senses: Vec<SenseDefinition>,
    /// Senses that are always active.
    pub essential: BTreeSet<SenseId>,
    /// Known providers.
    pub providers: Vec<ProviderDefinition>,
}

impl Default for SenseCatalog {
    fn default() -> Self {
        use Backing::*;

        Self {
            senses: vec![
                SenseDefinition::new(known::TIME, "Time", Toggle),
                SenseDefinition::new(known::DATE, "Date", Toggle),
                SenseDefinition::new(known::SEASON, "Season", Toggle),
                SenseDefinition::new(known::WEATHER, "Weather", Location),
                SenseDefinition::new(known::AIR_QUALITY, "Air Quality", Location),
                SenseDefinition::new(known::NEWS, "News", Location),
                SenseDefinition::new(known::LOCATION, "Location", Connection),
                SenseDefinition::new(known::FITNESS, "Fitness", Connection),
                SenseDefinition::new(known::SLEEP, "Sleep", Connection),
                SenseDefinition::new(known::CALENDAR, "Calendar", Connection),
                SenseDefinition::new(known::LIGHT_LEVEL, "Light Level", Toggle),
                SenseDefinition::new(known::NOISE_LEVEL, "Noise Level", Toggle),
                SenseDefinition::new(known::BATTERY, "Battery", Toggle),
            ],
            essential: [known::TIME, known::DATE]
                .into_iter()
                .map(SenseId::new)
                .collect(),
            providers: vec![
                ProviderDefinition::new(DEVICE_LOCATION_PROVIDER, "Device location", known::LOCATION),
                ProviderDefinition::new("google_fit", "Google Fit", known::FITNESS),
                ProviderDefinition::new("fitbit", "Fitbit", known::FITNESS),
                ProviderDefinition::new("strava", "Strava", known::FITNESS),
                ProviderDefinition::new("apple_health", "Apple Health", known::FITNESS),
                ProviderDefinition::new("samsung_health", "Samsung Health", known::FITNESS),
                ProviderDefinition::new("oura", "Oura", known::SLEEP),
                ProviderDefinition::new("whoop", "WHOOP", known::SLEEP),
                ProviderDefinition::new("google_calendar", "Google Calendar", known::CALENDAR),
                ProviderDefinition::new("outlook_calendar", "Outlook Calendar", known::CALENDAR),
            ],
        }
    }
}

impl SenseCatalog {
    /// Replace the essential set.
    #[must_use]
    pub fn with_essential<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.essential = ids.into_iter().map(|s| SenseId::new(s.as_ref())).collect();
        self
    }

    /// All sense ids, in catalog order.
    pub fn all_sense_ids(&self) -> Vec<SenseId> {
        self.senses.iter().map(|s| s.id.clone()).collect()
    }

    /// Look up a sense definition.
    pub fn definition(&self, id: &SenseId) -> Option<&SenseDefinition> {
        self.senses.iter().find(|s| &s.id == id)
    }

    /// Display name, falling back to the id itself.
    pub fn display_name(&self, id: &SenseId) -> String {
        self.definition(id)
            .map(|d| d.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Backing of a sense. Unknown senses are toggle-backed.
    pub fn backing(&self, id: &SenseId) -> Backing {
        self.definition(id).map_or(Backing::Toggle, |d| d.backing)
    }

    pub fn is_essential(&self, id: &SenseId) -> bool {
        self.essential.contains(id)
    }

    pub fn is_connection_backed(&self, id: &SenseId) -> bool {
        self.backing(id) == Backing::Connection
    }

    pub fn is_location_backed(&self, id: &SenseId) -> bool {
        self.backing(id) == Backing::Location
    }

    /// Category used by the enablement rule.
    pub fn category(&self, id: &SenseId) -> SenseCategory {
        if self.is_essential(id) {
            return SenseCategory::Essential;
        }
        match self.backing(id) {
            Backing::Connection => SenseCategory::ConnectionBacked,
            Backing::Location => SenseCategory::LocationBacked,
            Backing::Toggle => SenseCategory::Toggle,
        }
    }

    /// Look up a provider.
    pub fn provider(&self, id: &str) -> Option<&ProviderDefinition> {
        self.providers.iter().find(|p| p.id == id)
    }

    /// Provider display name, falling back to the id.
    pub fn provider_name(&self, id: &str) -> String {
        self.provider(id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Check internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a sense id repeats, an essential
    /// sense is not in the catalog, a location-backed sense has no location
    /// list type, or a provider points at a sense that is not
    /// connection-backed.
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for def in &self.senses {
            if !seen.insert(&def.id) {
                return Err(Error::invalid_config(format!(
                    "sense '{}' is listed twice",
                    def.id
                )));
            }
            if def.backing == Backing::Location && LocationSense::try_from(&def.id).is_err() {
                return Err(Error::invalid_config(format!(
                    "sense '{}' is location-backed but has no location list",
                    def.id
                )));
            }
        }
        if let Some(missing) = self.essential.iter().find(|id| !seen.contains(id)) {
            return Err(Error::invalid_config(format!(
                "essential sense '{}' is not in the catalog",
                missing
            )));
        }
        if let Some(p) = self
            .providers
            .iter()
            .find(|p| !self.is_connection_backed(&p.sense))
        {
            return Err(Error::invalid_config(format!(
                "provider '{}' backs '{}', which is not connection-backed",
                p.id, p.sense
            )));
        }
        Ok(())
    }
}

/// How many simultaneous connections a provider accepts per sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Single,
    Limited(usize),
    Unlimited,
}

/// Advisory per-provider account limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderLimits {
    /// Providers that accept exactly one account (long-lived personal health records).
    pub single_account: BTreeSet<String>,
    /// Providers that accept up to `limited_max` accounts.
    pub limited_account: BTreeSet<String>,
    pub limited_max: usize,
}

impl Default for ProviderLimits {
    fn default() -> Self {
        Self {
            single_account: ["apple_health", "samsung_health"]
                .into_iter()
                .map(String::from)
                .collect(),
            limited_account: ["oura", "whoop"].into_iter().map(String::from).collect(),
            limited_max: 2,
        }
    }
}

impl ProviderLimits {
    /// No limits at all.
    pub fn unlimited() -> Self {
        Self {
            single_account: BTreeSet::new(),
            limited_account: BTreeSet::new(),
            limited_max: 2,
        }
    }

    /// The cardinality class of a provider.
    pub fn cardinality(&self, provider_id: &str) -> Cardinality {
        if self.single_account.contains(provider_id) {
            Cardinality::Single
        } else if self.limited_account.contains(provider_id) {
            Cardinality::Limited(self.limited_max)
        } else {
            Cardinality::Unlimited
        }
    }
}
