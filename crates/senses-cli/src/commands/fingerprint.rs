//! Fingerprint command implementation.

use std::path::PathBuf;

use anyhow::Result;
use tracing::debug;

use senses_core::{DeviceFingerprinter, StaticSignals};

use crate::cli::{OutputFormat, SignalArgs};
use crate::format::{FingerprintReport, FormatOptions, format_fingerprint_text};
use crate::util::write_output;

/// Flags override the config `[device]` table field by field.
pub fn merge_signals(args: SignalArgs, defaults: &StaticSignals) -> StaticSignals {
    let (screen_width, screen_height) = match args.screen {
        Some((w, h)) => (Some(w), Some(h)),
        None => (defaults.screen_width, defaults.screen_height),
    };
    StaticSignals {
        user_agent: args.user_agent.or_else(|| defaults.user_agent.clone()),
        platform: args.platform.or_else(|| defaults.platform.clone()),
        language: args.language.or_else(|| defaults.language.clone()),
        screen_width,
        screen_height,
    }
}

pub fn cmd_fingerprint(
    args: SignalArgs,
    defaults: &StaticSignals,
    format: OutputFormat,
    output: Option<&PathBuf>,
    opts: &FormatOptions,
) -> Result<()> {
    let signals = merge_signals(args, defaults);
    debug!(?signals, "Fingerprinting");
    let report = FingerprintReport::new(DeviceFingerprinter::new(signals).device_info());

    let content = match format {
        OutputFormat::Json => opts.as_json(&report)?,
        OutputFormat::Text => format_fingerprint_text(&report),
    };
    write_output(output, &content)
}
