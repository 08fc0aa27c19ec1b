//! Push command implementation.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing::info;

use senses_core::service_client::ServiceClient;
use senses_core::{EditorSession, OpOutcome, PendingOp, PersistenceService, SessionSnapshot, sync};

use crate::config::{Config, resolve_service_url};
use crate::format::{FormatOptions, format_outcomes, format_pending_ops};
use crate::util::{load_session, write_output};

/// Arguments for the push command.
pub struct PushArgs {
    pub snapshot: PathBuf,
    pub url: Option<String>,
    pub dry_run: bool,
    pub write: bool,
}

pub async fn cmd_push(
    args: PushArgs,
    config: &Config,
    output: Option<&PathBuf>,
    opts: &FormatOptions,
) -> Result<()> {
    let mut session = load_session(&args.snapshot, config)?;
    if session.persona_id().is_none() {
        bail!(
            "Snapshot {} has no persona_id; nothing can be persisted yet",
            args.snapshot.display()
        );
    }

    let ops = session.pending_ops();
    if args.dry_run {
        return write_output(output, &format_pending_ops(&ops));
    }

    let url = resolve_service_url(args.url, config).context(
        "No service URL. Use --url, set SENSES_SERVICE_URL, or add service_url to the config file",
    )?;
    let client = ServiceClient::new(&url).context("Invalid service URL")?;
    let outcomes = push_ops(&mut session, ops, &client).await;

    if args.write {
        let json = SessionSnapshot::capture(&session).to_json()?;
        fs::write(&args.snapshot, json)
            .with_context(|| format!("Failed to write {}", args.snapshot.display()))?;
        info!(path = %args.snapshot.display(), "Snapshot updated");
    }

    write_output(output, &format_outcomes(&outcomes, session.sync_issues(), opts))
}

/// Run every op and fold the outcomes back into the session.
pub async fn push_ops(
    session: &mut EditorSession,
    ops: Vec<PendingOp>,
    service: &dyn PersistenceService,
) -> Vec<OpOutcome> {
    let outcomes = sync::execute_all(ops, service).await;
    for outcome in &outcomes {
        session.apply(outcome.clone());
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use senses_core::{ConnectionOrigin, MockPersistence, SenseId};

    const SNAPSHOT: &str = r#"{
        "persona_id": "p-1",
        "toggles": ["battery"],
        "connections": [
            {"id": "s1", "sense_id": "fitness", "provider_id": "strava", "display_name": "Strava",
             "account_key": "b@x.com", "connected_at": "2024-05-02T12:00:00Z", "origin": "session"}
        ]
    }"#;

    #[tokio::test]
    async fn test_push_ops_persists_session_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        fs::write(&path, SNAPSHOT).unwrap();

        let mut session = load_session(&path, &Config::default()).unwrap();
        let ops = session.pending_ops();
        assert_eq!(ops.len(), 2);

        let backend = MockPersistence::new();
        let outcomes = push_ops(&mut session, ops, &backend).await;
        assert_eq!(outcomes.len(), 2);
        assert!(session.sync_issues().is_empty());

        let merged = session.connections().merged(&SenseId::new("fitness"));
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].origin, ConnectionOrigin::Persisted);
        assert!(backend.persona("p-1").await.is_some());
    }

    #[tokio::test]
    async fn test_push_without_persona_id_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        fs::write(&path, "{}").unwrap();

        let args = PushArgs {
            snapshot: path,
            url: Some("http://localhost:1".into()),
            dry_run: false,
            write: false,
        };
        let err = cmd_push(args, &Config::default(), None, &FormatOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no persona_id"));
    }
}
