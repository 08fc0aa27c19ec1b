//! Device fingerprinting for duplicate device-location detection.
//!
//! A fingerprint is a low-entropy heuristic, not an identity: it only has to
//! stop the same browser session from being registered twice as "device
//! location" in one sitting. False negatives (a browser update changing the
//! fingerprint) are accepted.
//!
//! Signals are read through [`DeviceSignalProvider`] so the fingerprinter can
//! run without a real browser. Missing signals degrade to `"unknown"`.
//!
//! # Example
//!
//! ```
//! use senses_core::{DeviceFingerprinter, StaticSignals};
//!
//! let signals = StaticSignals::new()
//!     .user_agent("Mozilla/5.0 (Macintosh) AppleWebKit/537.36 Chrome/126.0 Safari/537.36")
//!     .platform("MacIntel")
//!     .screen(1920, 1080);
//! let fp = DeviceFingerprinter::new(signals).fingerprint();
//! assert_eq!(fp.browser, "Chrome");
//! assert_eq!(fp.os, "macOS");
//! assert_eq!(fp.screen, "1920x1080");
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use senses_types::{DeviceFingerprint, DeviceInfo, UNKNOWN_SIGNAL};

/// Browser families in match priority order. First substring match wins.
const BROWSERS: [&str; 4] = ["Chrome", "Firefox", "Safari", "Edge"];

/// Fallback when a user agent is present but no family matches.
pub const UNKNOWN_BROWSER: &str = "Unknown Browser";

/// Fallback when platform/user agent are present but no OS matches.
pub const UNKNOWN_OS: &str = "Unknown OS";

/// Source of the raw browser/platform signals.
pub trait DeviceSignalProvider: Send + Sync {
    /// The user-agent string.
    fn user_agent(&self) -> Option<String>;

    /// The platform string (e.g. `MacIntel`, `Win32`).
    fn platform(&self) -> Option<String>;

    /// The negotiated language (e.g. `en-US`).
    fn language(&self) -> Option<String>;

    /// Display width and height in pixels.
    fn screen_size(&self) -> Option<(u32, u32)>;
}

/// Fixed signal values, for tests and non-browser front ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticSignals {
    pub user_agent: Option<String>,
    pub platform: Option<String>,
    pub language: Option<String>,
    pub screen_width: Option<u32>,
    pub screen_height: Option<u32>,
}

impl StaticSignals {
    /// Signals with nothing set.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    #[must_use]
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    #[must_use]
    pub fn screen(mut self, width: u32, height: u32) -> Self {
        self.screen_width = Some(width);
        self.screen_height = Some(height);
        self
    }
}

impl DeviceSignalProvider for StaticSignals {
    fn user_agent(&self) -> Option<String> {
        self.user_agent.clone()
    }

    fn platform(&self) -> Option<String> {
        self.platform.clone()
    }

    fn language(&self) -> Option<String> {
        self.language.clone()
    }

    fn screen_size(&self) -> Option<(u32, u32)> {
        self.screen_width.zip(self.screen_height)
    }
}

/// Detect the browser family from a user-agent string.
///
/// Matching is a plain substring test in the order Chrome, Firefox, Safari,
/// Edge, so Chromium-based Edge reports as Chrome.
pub fn detect_browser(user_agent: &str) -> &'static str {
    BROWSERS
        .iter()
        .find(|b| user_agent.contains(*b))
        .copied()
        .unwrap_or(UNKNOWN_BROWSER)
}

/// Detect the OS family from the platform string, then the user agent.
pub fn detect_os(platform: Option<&str>, user_agent: Option<&str>) -> &'static str {
    if platform.is_none() && user_agent.is_none() {
        return UNKNOWN_SIGNAL;
    }

    if let Some(p) = platform {
        if p.contains("Win") {
            return "Windows";
        }
        if p.contains("Mac") {
            return "macOS";
        }
        if p.contains("Linux") {
            return "Linux";
        }
    }

    if let Some(ua) = user_agent {
        if ua.contains("Android") {
            return "Android";
        }
        if ua.contains("iPhone") || ua.contains("iPad") {
            return "iOS";
        }
    }

    UNKNOWN_OS
}

/// Derives [`DeviceInfo`] and [`DeviceFingerprint`] from a signal provider.
#[derive(Clone)]
pub struct DeviceFingerprinter {
    signals: Arc<dyn DeviceSignalProvider>,
}

impl fmt::Debug for DeviceFingerprinter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceFingerprinter")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

impl Default for DeviceFingerprinter {
    /// A fingerprinter with no signals; every field reads `"unknown"`.
    fn default() -> Self {
        Self::new(StaticSignals::new())
    }
}

impl DeviceFingerprinter {
    /// Create a fingerprinter reading from `signals`.
    pub fn new(signals: impl DeviceSignalProvider + 'static) -> Self {
        Self {
            signals: Arc::new(signals),
        }
    }

    /// Create a fingerprinter sharing an existing provider.
    pub fn from_arc(signals: Arc<dyn DeviceSignalProvider>) -> Self {
        Self { signals }
    }

    /// Full device attributes, including language.
    pub fn device_info(&self) -> DeviceInfo {
        let user_agent = self.signals.user_agent();
        let platform = self.signals.platform();

        let browser = match user_agent.as_deref() {
            Some(ua) => detect_browser(ua),
            None => UNKNOWN_SIGNAL,
        };
        let os = detect_os(platform.as_deref(), user_agent.as_deref());
        let screen = self
            .signals
            .screen_size()
            .map(|(w, h)| format!("{}x{}", w, h))
            .unwrap_or_else(|| UNKNOWN_SIGNAL.to_string());

        DeviceInfo {
            browser: browser.to_string(),
            os: os.to_string(),
            platform: platform.unwrap_or_else(|| UNKNOWN_SIGNAL.to_string()),
            language: self
                .signals
                .language()
                .unwrap_or_else(|| UNKNOWN_SIGNAL.to_string()),
            screen,
        }
    }

    /// The comparison key for the current device.
    pub fn fingerprint(&self) -> DeviceFingerprint {
        self.device_info().fingerprint()
    }
}
