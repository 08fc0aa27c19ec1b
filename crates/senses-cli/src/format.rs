//! Output formatting for text and JSON.

use std::fmt::Write as _;

use anyhow::Result;
use owo_colors::OwoColorize;
use serde::Serialize;

use senses_core::{
    AggregateSummary, DeviceFingerprint, DeviceInfo, OpOutcome, PendingOp, SenseActivationState,
    SenseCatalog, SenseCategory, SenseId, SyncIssue,
};

/// Formatting options for output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
}

impl FormatOptions {
    pub fn new(no_color: bool) -> Self {
        Self { no_color }
    }

    /// Pretty JSON with a trailing newline.
    pub fn as_json<T: Serialize>(&self, value: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(value)? + "\n")
    }

    fn paint(&self, text: &str, active: bool) -> String {
        if self.no_color {
            text.to_string()
        } else if active {
            text.green().to_string()
        } else {
            text.dimmed().to_string()
        }
    }
}

/// One row of the summary table.
#[derive(Debug, Serialize)]
pub struct SenseRow {
    pub id: SenseId,
    pub name: String,
    pub category: &'static str,
    #[serde(flatten)]
    pub state: SenseActivationState,
}

/// JSON body of the `summary` command.
#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub persona_id: Option<String>,
    pub senses: Vec<SenseRow>,
    pub summary: AggregateSummary,
}

impl SummaryReport {
    pub fn new(
        catalog: &SenseCatalog,
        persona_id: Option<&str>,
        activations: Vec<(SenseId, SenseActivationState)>,
        summary: AggregateSummary,
    ) -> Self {
        let senses = activations
            .into_iter()
            .map(|(id, state)| SenseRow {
                name: catalog.display_name(&id),
                category: category_label(catalog.category(&id)),
                id,
                state,
            })
            .collect();
        Self {
            persona_id: persona_id.map(String::from),
            senses,
            summary,
        }
    }
}

fn category_label(category: SenseCategory) -> &'static str {
    match category {
        SenseCategory::Essential => "essential",
        SenseCategory::ConnectionBacked => "connection",
        SenseCategory::LocationBacked => "location",
        SenseCategory::Toggle => "toggle",
    }
}

pub fn format_summary_text(report: &SummaryReport, opts: &FormatOptions) -> String {
    let mut out = String::new();
    if let Some(id) = &report.persona_id {
        let _ = writeln!(out, "Persona {id}");
    } else {
        let _ = writeln!(out, "Persona (unsaved)");
    }
    let _ = writeln!(out);

    let width = report
        .senses
        .iter()
        .map(|r| r.name.len())
        .max()
        .unwrap_or(0);
    for row in &report.senses {
        let marker = if row.state.active { "●" } else { "○" };
        let mut detail = Vec::new();
        if row.state.connection_count > 0 {
            detail.push(plural(row.state.connection_count, "connection"));
        }
        if row.state.location_count > 0 {
            detail.push(plural(row.state.location_count, "location"));
        }
        let line = format!(
            "{marker} {:<width$}  {:<10}  {}",
            row.name,
            row.category,
            detail.join(", ")
        );
        let _ = writeln!(out, "{}", opts.paint(line.trim_end(), row.state.active));
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", report.summary);
    out
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

/// JSON body of the `fingerprint` command.
#[derive(Debug, Serialize)]
pub struct FingerprintReport {
    pub device: DeviceInfo,
    pub fingerprint: DeviceFingerprint,
    pub account_key: String,
    pub label: String,
    pub partial: bool,
}

impl FingerprintReport {
    pub fn new(device: DeviceInfo) -> Self {
        let fingerprint = device.fingerprint();
        Self {
            account_key: fingerprint.account_key(),
            label: fingerprint.label(),
            partial: fingerprint.is_partial(),
            device,
            fingerprint,
        }
    }
}

pub fn format_fingerprint_text(report: &FingerprintReport) -> String {
    let d = &report.device;
    let mut out = String::new();
    let _ = writeln!(out, "Device:      {}", report.label);
    let _ = writeln!(out, "Browser:     {}", d.browser);
    let _ = writeln!(out, "OS:          {}", d.os);
    let _ = writeln!(out, "Platform:    {}", d.platform);
    let _ = writeln!(out, "Language:    {}", d.language);
    let _ = writeln!(out, "Screen:      {}", d.screen);
    let _ = writeln!(out, "Account key: {}", report.account_key);
    if report.partial {
        let _ = writeln!(out, "Note: some signals were unavailable; matching is weaker");
    }
    out
}

/// One line per pending call.
pub fn format_pending_ops(ops: &[PendingOp]) -> String {
    let mut out = String::new();
    for op in ops {
        let _ = match op {
            PendingOp::CreateConnection { sense, request, .. } => writeln!(
                out,
                "POST   /oauth-connections          {sense} {} {}",
                request.provider, request.account_key
            ),
            PendingOp::DeleteConnection { connection_id, .. } => {
                writeln!(out, "DELETE /oauth-connections/{connection_id}")
            }
            PendingOp::UpdatePersona {
                persona_id,
                document,
                ..
            } => writeln!(
                out,
                "PUT    /personas/{persona_id}  ({} senses)",
                document.senses.len()
            ),
        };
    }
    out
}

/// One line per outcome, then the recorded sync issues.
pub fn format_outcomes(outcomes: &[OpOutcome], issues: &[SyncIssue], opts: &FormatOptions) -> String {
    let mut out = String::new();
    for outcome in outcomes {
        let line = match outcome {
            OpOutcome::Created { sense, record, .. } => {
                format!("created {} for {sense} ({})", record.id, record.provider)
            }
            OpOutcome::Deleted { connection_id, .. } => format!("deleted {connection_id}"),
            OpOutcome::PersonaUpdated { persona_id, .. } => format!("updated persona {persona_id}"),
            OpOutcome::Failed { operation, message } => format!("{operation} failed: {message}"),
        };
        let ok = !matches!(outcome, OpOutcome::Failed { .. });
        let _ = writeln!(out, "{}", opts.paint(&line, ok));
    }
    if !issues.is_empty() {
        let _ = writeln!(
            out,
            "{} call(s) failed; local state was kept",
            issues.len()
        );
    }
    out
}
