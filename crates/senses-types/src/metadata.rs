//! Parsing of loosely-typed provider and device payloads.
//!
//! Third-party OAuth callbacks and browser APIs hand back JSON whose shape
//! varies by provider and by age of the client. [`ProviderMetadata`] is the
//! closed record the rest of the workspace sees; anything not recognized here
//! is dropped at the boundary.

use serde_json::Value;

use crate::error::{ParseError, ParseResult};
use crate::types::{DeviceInfo, UNKNOWN_SIGNAL};

/// Closed view of a provider/device metadata payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderMetadata {
    /// Account email reported by the provider.
    pub account_email: Option<String>,
    /// Display name reported by the provider.
    pub display_name: Option<String>,
    /// Device attributes, for device-location grants.
    pub device: Option<DeviceInfo>,
}

impl ProviderMetadata {
    /// Parse a metadata object.
    ///
    /// `null` parses to empty metadata. Missing device fields fall back to
    /// `"unknown"` rather than failing.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidData`] if `value` is neither an object
    /// nor `null`.
    ///
    /// ```
    /// use senses_types::ProviderMetadata;
    ///
    /// let meta = ProviderMetadata::from_json(&serde_json::json!({
    ///     "email": "a@x.com",
    ///     "deviceInfo": { "browser": "Chrome", "screenWidth": 1920, "screenHeight": 1080 }
    /// })).unwrap();
    /// assert_eq!(meta.account_email.as_deref(), Some("a@x.com"));
    /// let device = meta.device.unwrap();
    /// assert_eq!(device.screen, "1920x1080");
    /// assert_eq!(device.os, "unknown");
    /// ```
    pub fn from_json(value: &Value) -> ParseResult<Self> {
        let obj = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(obj) => obj,
            other => {
                return Err(ParseError::InvalidData(format!(
                    "provider metadata must be an object, got {}",
                    json_kind(other)
                )));
            }
        };

        let account_email = first_string(obj, &["account_email", "accountEmail", "email"]);
        let display_name = first_string(obj, &["display_name", "displayName", "name"]);
        let device = ["device_info", "deviceInfo", "device"]
            .iter()
            .find_map(|k| obj.get(*k))
            .and_then(|v| v.as_object())
            .map(parse_device);

        Ok(Self {
            account_email,
            display_name,
            device,
        })
    }
}

fn parse_device(obj: &serde_json::Map<String, Value>) -> DeviceInfo {
    let screen = first_string(obj, &["screen", "screen_resolution", "screenResolution"])
        .or_else(|| {
            let w = first_u64(obj, &["screen_width", "screenWidth"])?;
            let h = first_u64(obj, &["screen_height", "screenHeight"])?;
            Some(format!("{}x{}", w, h))
        })
        .unwrap_or_else(|| UNKNOWN_SIGNAL.into());

    DeviceInfo {
        browser: string_or_unknown(obj, &["browser"]),
        os: string_or_unknown(obj, &["os", "operating_system", "operatingSystem"]),
        platform: string_or_unknown(obj, &["platform"]),
        language: string_or_unknown(obj, &["language", "lang"]),
        screen,
    }
}

fn first_string(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(String::from)
}

fn string_or_unknown(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> String {
    first_string(obj, keys).unwrap_or_else(|| UNKNOWN_SIGNAL.to_string())
}

fn first_u64(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<u64> {
    keys.iter().filter_map(|k| obj.get(*k)).find_map(Value::as_u64)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
