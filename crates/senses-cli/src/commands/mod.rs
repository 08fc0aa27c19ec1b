//! Command implementations for the CLI.

mod config;
mod fingerprint;
mod normalize;
mod push;
mod summary;

pub use config::cmd_config;
pub use fingerprint::cmd_fingerprint;
pub use normalize::cmd_normalize;
pub use push::{PushArgs, cmd_push};
pub use summary::cmd_summary;
