//! Summary command implementation.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::format::{FormatOptions, SummaryReport, format_summary_text};
use crate::util::{load_session, write_output};

pub fn cmd_summary(
    snapshot: &Path,
    config: &Config,
    format: OutputFormat,
    output: Option<&PathBuf>,
    opts: &FormatOptions,
) -> Result<()> {
    let session = load_session(snapshot, config)?;
    let summary = session.summary();
    info!(%summary, "Snapshot loaded");

    let report = SummaryReport::new(
        session.catalog(),
        session.persona_id(),
        session.activations(),
        summary,
    );
    let content = match format {
        OutputFormat::Json => opts.as_json(&report)?,
        OutputFormat::Text => format_summary_text(&report, opts),
    };
    write_output(output, &content)
}
