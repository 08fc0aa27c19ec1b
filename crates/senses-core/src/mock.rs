//! Mock persistence service for testing.
//!
//! [`MockPersistence`] keeps personas and connection records in memory and
//! implements [`PersistenceService`], so sessions can be driven end to end
//! without a server.
//!
//! # Features
//!
//! - **Failure injection**: fail every call, or only the next `n` calls
//! - **Latency simulation**: add an artificial delay to every call
//! - **Call recording**: inspect which operations ran, in order

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::persistence::{NewConnection, PersistedConnection, PersistenceService, PersonaDocument};

/// One recorded call against the mock.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    UpdatePersona { persona_id: String },
    CreateConnection { provider: String, account_key: String },
    DeleteConnection { connection_id: String },
}

/// In-memory [`PersistenceService`].
///
/// # Example
///
/// ```
/// use senses_core::{MockPersistence, PersistenceService, PersonaDocument};
///
/// #[tokio::main]
/// async fn main() {
///     let mock = MockPersistence::new();
///     mock.update_persona("p-1", &PersonaDocument::default()).await.unwrap();
///     assert!(mock.persona("p-1").await.is_some());
/// }
/// ```
#[derive(Default)]
pub struct MockPersistence {
    personas: RwLock<HashMap<String, PersonaDocument>>,
    connections: RwLock<Vec<PersistedConnection>>,
    calls: RwLock<Vec<MockCall>>,
    next_id: AtomicU64,
    should_fail: AtomicBool,
    fail_message: RwLock<String>,
    /// Simulated latency in milliseconds (0 = no delay).
    latency_ms: AtomicU64,
    /// Number of calls to fail before succeeding.
    remaining_failures: AtomicU32,
}

impl std::fmt::Debug for MockPersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockPersistence")
            .field("should_fail", &self.should_fail.load(Ordering::Relaxed))
            .field("latency_ms", &self.latency_ms.load(Ordering::Relaxed))
            .field(
                "remaining_failures",
                &self.remaining_failures.load(Ordering::Relaxed),
            )
            .finish()
    }
}

impl MockPersistence {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a connection record as if it already existed server-side.
    pub async fn seed_connection(&self, record: PersistedConnection) {
        self.connections.write().await.push(record);
    }

    /// The last document saved for `persona_id`.
    pub async fn persona(&self, persona_id: &str) -> Option<PersonaDocument> {
        self.personas.read().await.get(persona_id).cloned()
    }

    /// All stored connection records.
    pub async fn connections(&self) -> Vec<PersistedConnection> {
        self.connections.read().await.clone()
    }

    /// Calls received so far, in order.
    pub async fn calls(&self) -> Vec<MockCall> {
        self.calls.read().await.clone()
    }

    // --- Test control methods ---

    /// Make every call fail (or succeed again).
    pub async fn set_should_fail(&self, fail: bool, message: Option<&str>) {
        self.should_fail.store(fail, Ordering::Relaxed);
        if let Some(msg) = message {
            *self.fail_message.write().await = msg.to_string();
        }
    }

    /// Fail the next `count` calls, then succeed.
    pub fn set_transient_failures(&self, count: u32) {
        self.remaining_failures.store(count, Ordering::Relaxed);
    }

    /// Remaining transient failures.
    pub fn remaining_failures(&self) -> u32 {
        self.remaining_failures.load(Ordering::Relaxed)
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    async fn begin(&self, operation: &str, call: MockCall) -> Result<()> {
        let latency = self.latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        self.calls.write().await.push(call);

        // Check for transient failures first
        if self.remaining_failures.load(Ordering::Relaxed) > 0 {
            self.remaining_failures.fetch_sub(1, Ordering::Relaxed);
            return Err(self.failure(operation).await);
        }

        if self.should_fail.load(Ordering::Relaxed) {
            Err(self.failure(operation).await)
        } else {
            Ok(())
        }
    }

    async fn failure(&self, operation: &str) -> Error {
        let message = self.fail_message.read().await;
        let message = if message.is_empty() {
            "Mock failure"
        } else {
            message.as_str()
        };
        Error::persistence(operation, message)
    }
}

#[async_trait]
impl PersistenceService for MockPersistence {
    async fn update_persona(&self, persona_id: &str, document: &PersonaDocument) -> Result<()> {
        self.begin(
            "update_persona",
            MockCall::UpdatePersona {
                persona_id: persona_id.to_string(),
            },
        )
        .await?;
        self.personas
            .write()
            .await
            .insert(persona_id.to_string(), document.clone());
        Ok(())
    }

    async fn create_connection(&self, request: &NewConnection) -> Result<PersistedConnection> {
        self.begin(
            "create_connection",
            MockCall::CreateConnection {
                provider: request.provider.clone(),
                account_key: request.account_key.clone(),
            },
        )
        .await?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let record = PersistedConnection {
            id: format!("conn-{id}"),
            created_at: OffsetDateTime::now_utc(),
            provider: request.provider.clone(),
            sense_type: request.sense_type.clone(),
            display_name: Some(request.display_name.clone()),
            account_key: Some(request.account_key.clone()),
            metadata: request.metadata.clone(),
        };
        self.connections.write().await.push(record.clone());
        Ok(record)
    }

    async fn delete_connection(&self, connection_id: &str) -> Result<()> {
        self.begin(
            "delete_connection",
            MockCall::DeleteConnection {
                connection_id: connection_id.to_string(),
            },
        )
        .await?;

        let mut connections = self.connections.write().await;
        let before = connections.len();
        connections.retain(|c| c.id != connection_id);
        if connections.len() == before {
            return Err(Error::persistence(
                "delete_connection",
                format!("connection {connection_id} not found"),
            ));
        }
        Ok(())
    }
}
