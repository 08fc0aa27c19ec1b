//! Running pending operations against a persistence service.
//!
//! Nothing here retries or cancels. Each [`PendingOp`] maps to exactly one
//! call and exactly one [`OpOutcome`]; errors become
//! [`OpOutcome::Failed`] so the caller can always hand the outcome straight
//! to [`crate::EditorSession::apply`].

use std::time::Duration;

use futures::future::join_all;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::persistence::PersistenceService;
use crate::session::{OpOutcome, PendingOp};

/// Default per-call timeout for [`execute_with_timeout`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Run one operation.
pub async fn execute(op: PendingOp, service: &dyn PersistenceService) -> OpOutcome {
    let operation = op.operation();
    debug!(operation, "Running persistence call");
    outcome(operation, run(op, service).await)
}

/// Run one operation, failing it with [`Error::Timeout`] after `limit`.
pub async fn execute_with_timeout(
    op: PendingOp,
    service: &dyn PersistenceService,
    limit: Duration,
) -> OpOutcome {
    let operation = op.operation();
    debug!(operation, ?limit, "Running persistence call with timeout");
    let result = timeout(limit, run(op, service))
        .await
        .map_err(|_| Error::timeout(operation, limit))
        .and_then(|r| r);
    outcome(operation, result)
}

/// Run several operations concurrently. Outcomes keep the input order.
///
/// Apply them in that order: the session resolves conflicts by key, so the
/// arrival order of responses does not matter.
pub async fn execute_all(ops: Vec<PendingOp>, service: &dyn PersistenceService) -> Vec<OpOutcome> {
    join_all(ops.into_iter().map(|op| execute(op, service))).await
}

async fn run(op: PendingOp, service: &dyn PersistenceService) -> Result<OpOutcome> {
    match op {
        PendingOp::CreateConnection {
            sense,
            local_id,
            request,
        } => {
            let record = service.create_connection(&request).await?;
            Ok(OpOutcome::Created {
                sense,
                local_id,
                record,
            })
        }
        PendingOp::DeleteConnection {
            sense,
            connection_id,
        } => {
            service.delete_connection(&connection_id).await?;
            Ok(OpOutcome::Deleted {
                sense,
                connection_id,
            })
        }
        PendingOp::UpdatePersona {
            persona_id,
            revision,
            document,
        } => {
            service.update_persona(&persona_id, &document).await?;
            Ok(OpOutcome::PersonaUpdated {
                persona_id,
                revision,
                document,
            })
        }
    }
}

fn outcome(operation: &str, result: Result<OpOutcome>) -> OpOutcome {
    result.unwrap_or_else(|e| {
        warn!(operation, error = %e, "Persistence call failed");
        OpOutcome::Failed {
            operation: operation.to_string(),
            message: e.to_string(),
        }
    })
}
