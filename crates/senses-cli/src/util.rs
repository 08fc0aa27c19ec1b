//! Utility functions for CLI operations.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use senses_core::{DeviceFingerprinter, EditorSession, SessionSnapshot};

use crate::config::Config;

/// Write output to file or stdout
pub fn write_output(output: Option<&PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => {
            print!("{}", content);
            io::stdout().flush()?;
        }
    }
    Ok(())
}

/// Read a snapshot file.
pub fn read_snapshot(path: &Path) -> Result<SessionSnapshot> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
    SessionSnapshot::from_json(&json)
        .with_context(|| format!("Invalid snapshot: {}", path.display()))
}

/// Rebuild a session from a snapshot using the configured catalog, limits
/// and device signals.
pub fn load_session(path: &Path, config: &Config) -> Result<EditorSession> {
    let snapshot = read_snapshot(path)?;
    Ok(snapshot.into_session(
        config.catalog(),
        config.limits.clone(),
        DeviceFingerprinter::new(config.device.clone()),
    ))
}
