//! Normalize command implementation.

use std::path::PathBuf;

use anyhow::Result;

use senses_types::normalize;

use crate::util::write_output;

pub fn cmd_normalize(ids: &[String], output: Option<&PathBuf>) -> Result<()> {
    let content: String = ids
        .iter()
        .map(|raw| format!("{}\n", normalize(raw)))
        .collect();
    write_output(output, &content)
}
