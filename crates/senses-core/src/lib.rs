//! Reconciliation core for persona sense connections.
//!
//! A persona's senses are backed by three sources of truth that overlap and
//! race: records already persisted server-side, records created in the
//! current editing session, and fallback records created before the persona
//! had a durable id. This crate merges them into one consistent view and
//! derives from it whether each sense is active and how many senses are
//! active overall.
//!
//! # Features
//!
//! - **Identifier normalization**: snake_case and camelCase sense ids compare equal
//! - **Connection merge**: `Persisted` > `Session` > `Fallback`, keyed by provider and account
//! - **Provider limits**: single-account and limited-account providers
//! - **Duplicate device detection**: heuristic browser/device fingerprint
//! - **Location lists**: weather, air quality and news targets with per-kind rules
//! - **Enablement and counters**: derived from the strongest available evidence
//! - **Optimistic sessions**: local state is truth; failed persistence becomes a banner
//!
//! # Components
//!
//! | Component | Type |
//! |-----------|------|
//! | Identifier normalizer | [`normalize`] |
//! | Device fingerprinter | [`DeviceFingerprinter`] over a [`DeviceSignalProvider`] |
//! | Connection store | [`ConnectionStore`], [`connections::merge`] |
//! | Location store | [`LocationConfigStore`], [`locations::merge`] |
//! | Enablement | [`EnablementResolver`] |
//! | Counters | [`AggregateCounter`] |
//! | Orchestration | [`EditorSession`], [`sync`] |
//!
//! # Quick Start
//!
//! ```
//! use senses_core::{EditorSession, MockPersistence, sync};
//! use senses_types::{ConnectionGrant, SenseId};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = MockPersistence::new();
//!     let mut session = EditorSession::default().with_persona_id("persona-1");
//!
//!     let grant = ConnectionGrant {
//!         provider_id: "fitbit".into(),
//!         account_key: "a@x.com".into(),
//!         display_name: None,
//!         device_info: None,
//!         connected_at: time::OffsetDateTime::now_utc(),
//!     };
//!     let op = session.connect(&SenseId::new("fitness"), grant).unwrap();
//!
//!     // The store is already updated; persistence runs afterwards.
//!     assert_eq!(session.summary().connected_service_count, 1);
//!     if let Some(op) = op {
//!         let outcome = sync::execute(op, &backend).await;
//!         session.apply(outcome);
//!     }
//!     assert!(session.sync_issues().is_empty());
//! }
//! ```

pub mod aggregate;
pub mod catalog;
pub mod connections;
pub mod enablement;
pub mod error;
pub mod events;
pub mod fingerprint;
pub mod locations;
pub mod mock;
pub mod persistence;
#[cfg(feature = "service-client")]
pub mod service_client;
pub mod session;
pub mod snapshot;
pub mod sync;

// Core exports
pub use aggregate::AggregateCounter;
pub use catalog::{
    Backing, Cardinality, ProviderDefinition, ProviderLimits, SenseCatalog, SenseCategory,
    SenseDefinition,
};
pub use connections::ConnectionStore;
pub use enablement::EnablementResolver;
pub use error::{Error, Rejection, Result};
pub use events::{EventDispatcher, EventReceiver, EventSender, SenseEvent};
pub use fingerprint::{DeviceFingerprinter, DeviceSignalProvider, StaticSignals};
pub use locations::LocationConfigStore;
pub use mock::{MockCall, MockPersistence};
pub use persistence::{NewConnection, PersistedConnection, PersistenceService, PersonaDocument};
pub use session::{EditorSession, OpOutcome, PendingOp, SyncIssue};
pub use snapshot::SessionSnapshot;

// Re-export from senses-types
pub use senses_types::{
    AggregateSummary, Connection, ConnectionGrant, ConnectionOrigin, DeviceFingerprint,
    DeviceInfo, LocationEntry, LocationKind, LocationSense, SenseActivationState, SenseId,
    normalize,
};
