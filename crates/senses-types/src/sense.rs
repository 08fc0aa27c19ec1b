//! Sense identifiers and their canonical form.
//!
//! Persisted persona documents carry sense ids in two spellings:
//! `snake_case` (current) and `camelCase` (older documents). Every lookup
//! and set-membership test in the workspace goes through [`normalize`] so
//! that `lightLevel` and `light_level` compare equal.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Well-known sense ids, already in canonical form.
pub mod known {
    pub const WEATHER: &str = "weather";
    pub const AIR_QUALITY: &str = "air_quality";
    pub const NEWS: &str = "news";
    pub const LOCATION: &str = "location";
    pub const FITNESS: &str = "fitness";
    pub const SLEEP: &str = "sleep";
    pub const CALENDAR: &str = "calendar";
    pub const TIME: &str = "time";
    pub const DATE: &str = "date";
    pub const LIGHT_LEVEL: &str = "light_level";
    pub const NOISE_LEVEL: &str = "noise_level";
    pub const BATTERY: &str = "battery";
    pub const SEASON: &str = "season";
}

/// A canonical sense identifier.
///
/// A `SenseId` can only be built through [`normalize`] (or the `From`
/// impls, which call it), so two ids that denote the same sense are always
/// byte-equal. Deserialization normalizes as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub struct SenseId(String);

impl SenseId {
    /// Normalize `raw` into a sense id.
    pub fn new(raw: &str) -> Self {
        normalize(raw)
    }

    /// The canonical string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if this id names the given canonical sense.
    pub fn is(&self, canonical: &str) -> bool {
        self.0 == canonical
    }
}

impl fmt::Display for SenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SenseId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SenseId {
    fn from(raw: &str) -> Self {
        normalize(raw)
    }
}

impl From<String> for SenseId {
    fn from(raw: String) -> Self {
        normalize(&raw)
    }
}

impl From<SenseId> for String {
    fn from(id: SenseId) -> Self {
        id.0
    }
}

/// Canonicalize a raw sense identifier.
///
/// Strings containing an underscore are treated as snake_case and only
/// lower-cased. Anything else is treated as camelCase: an underscore is
/// inserted wherever a lower-case letter is followed by a character that
/// lower-casing changes, and the result is lower-cased. Any input produces some id; whether it names a known sense
/// is for the caller to decide.
///
/// # Examples
///
/// ```
/// use senses_types::normalize;
///
/// assert_eq!(normalize("lightLevel"), normalize("light_level"));
/// assert_eq!(normalize("airQuality").as_str(), "air_quality");
/// assert_eq!(normalize("Weather").as_str(), "weather");
/// ```
#[must_use]
pub fn normalize(raw: &str) -> SenseId {
    if raw.contains('_') {
        return SenseId(raw.to_lowercase());
    }

    let mut out = String::with_capacity(raw.len() + 4);
    let mut prev_lower = false;
    for c in raw.chars() {
        // Boundary: a character that lowercasing changes.
        let changes = !c.to_lowercase().eq(std::iter::once(c));
        if prev_lower && changes {
            out.push('_');
        }
        prev_lower = c.is_lowercase();
        out.extend(c.to_lowercase());
    }
    SenseId(out)
}

/// The sense-types that own a location list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LocationSense {
    Weather,
    AirQuality,
    News,
}

impl LocationSense {
    /// All location-backed sense-types.
    pub const ALL: [LocationSense; 3] = [
        LocationSense::Weather,
        LocationSense::AirQuality,
        LocationSense::News,
    ];

    /// The sense id this location list belongs to.
    pub fn sense_id(&self) -> SenseId {
        SenseId(self.as_str().to_string())
    }

    /// Canonical string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationSense::Weather => known::WEATHER,
            LocationSense::AirQuality => known::AIR_QUALITY,
            LocationSense::News => known::NEWS,
        }
    }

    /// Whether a single `Global` entry is meaningful for this sense-type.
    pub fn supports_global(&self) -> bool {
        matches!(self, LocationSense::News)
    }
}

impl fmt::Display for LocationSense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationSense::Weather => write!(f, "Weather"),
            LocationSense::AirQuality => write!(f, "Air Quality"),
            LocationSense::News => write!(f, "News"),
        }
    }
}

impl TryFrom<&SenseId> for LocationSense {
    type Error = ParseError;

    fn try_from(id: &SenseId) -> Result<Self, Self::Error> {
        match id.as_str() {
            known::WEATHER => Ok(LocationSense::Weather),
            known::AIR_QUALITY => Ok(LocationSense::AirQuality),
            known::NEWS => Ok(LocationSense::News),
            other => Err(ParseError::NotLocationSense(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_camel_case() {
        assert_eq!(normalize("lightLevel").as_str(), "light_level");
        assert_eq!(normalize("airQuality").as_str(), "air_quality");
        assert_eq!(normalize("noiseLevelIndoor").as_str(), "noise_level_indoor");
    }

    #[test]
    fn test_normalize_snake_case_only_lowercases() {
        assert_eq!(normalize("light_level").as_str(), "light_level");
        assert_eq!(normalize("Air_Quality").as_str(), "air_quality");
        // Underscore present: no boundary splitting happens.
        assert_eq!(normalize("air_qualityIndex").as_str(), "air_qualityindex");
    }

    #[test]
    fn test_normalize_both_spellings_match() {
        assert_eq!(normalize("lightLevel"), normalize("light_level"));
        assert_eq!(SenseId::from("airQuality"), SenseId::from("air_quality"));
    }

    #[test]
    fn test_normalize_no_boundary() {
        assert_eq!(normalize("weather").as_str(), "weather");
        assert_eq!(normalize("GPS").as_str(), "gps");
        assert_eq!(normalize("").as_str(), "");
    }

    #[test]
    fn test_normalize_non_ascii_boundary_is_stable() {
        // U+03D2 is upper-case yet lowercases to itself.
        let once = normalize("A\u{3d2}");
        assert_eq!(once.as_str(), "a\u{3d2}");
        assert_eq!(normalize(once.as_str()), once);
        assert_eq!(normalize("\u{e9}t\u{c9}").as_str(), "\u{e9}t_\u{e9}");
    }

    #[test]
    fn test_normalize_unrecognized_still_normalizes() {
        assert_eq!(normalize("someFutureSense").as_str(), "some_future_sense");
    }

    #[test]
    fn test_location_sense_roundtrip() {
        for sense in LocationSense::ALL {
            assert_eq!(LocationSense::try_from(&sense.sense_id()), Ok(sense));
        }
        assert!(LocationSense::try_from(&SenseId::new("fitness")).is_err());
        assert_eq!(
            LocationSense::try_from(&SenseId::new("airQuality")),
            Ok(LocationSense::AirQuality)
        );
    }

    #[test]
    fn test_only_news_supports_global() {
        assert!(LocationSense::News.supports_global());
        assert!(!LocationSense::Weather.supports_global());
        assert!(!LocationSense::AirQuality.supports_global());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_sense_id_deserialize_normalizes() {
        let ids: Vec<SenseId> = serde_json::from_str(r#"["lightLevel","air_quality"]"#).unwrap();
        assert_eq!(ids[0].as_str(), "light_level");
        assert_eq!(ids[1].as_str(), "air_quality");
        assert_eq!(serde_json::to_string(&ids[0]).unwrap(), "\"light_level\"");
    }
}
