//! Command-line inspector for persona sense snapshots.
//!
//! The `senses` binary loads a JSON session snapshot, replays it through the
//! reconciliation core and prints what the editor would show.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `normalize` | Print canonical sense ids |
//! | `fingerprint` | Derive a device fingerprint from signals |
//! | `summary` | Per-sense activation and aggregate counters of a snapshot |
//! | `push` | Persist a snapshot's pending records to the API |
//! | `config` | Show or initialize the configuration file |
//! | `completions` | Generate shell completions |
//!
//! # Configuration
//!
//! Configuration lives in `~/.config/persona-senses/config.toml` (or the
//! platform equivalent):
//!
//! ```toml
//! service_url = "http://localhost:8080"
//!
//! [catalog]
//! essential = ["time", "date"]
//!
//! [limits]
//! single_account = ["apple_health", "samsung_health"]
//! limited_account = ["oura", "whoop"]
//! limited_max = 2
//!
//! [device]
//! platform = "MacIntel"
//! screen_width = 1920
//! screen_height = 1080
//! ```
//!
//! # Environment Variables
//!
//! - `SENSES_SERVICE_URL`: API base URL (overridden by `--url`)
//! - `RUST_LOG`: log filter, default `warn`
//! - `NO_COLOR`: disable colored output
//!
//! # Examples
//!
//! ```bash
//! senses normalize lightLevel airQuality
//! senses fingerprint --platform Win32 --screen 1920x1080
//! senses summary persona.json --format json
//! senses push persona.json --dry-run
//! ```

// Re-export core dependencies for convenience
pub use senses_core;
pub use senses_types;
