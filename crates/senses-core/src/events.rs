//! Session event system for sense changes and sync notifications.
//!
//! Front ends subscribe to an [`EventDispatcher`] to re-render when a store
//! changes or to show a transient banner when a persistence call fails.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use senses_types::{ConnectionOrigin, LocationSense, SenseId};

/// Events emitted by an editing session.
///
/// All events are serializable for logging and IPC.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new event types
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum SenseEvent {
    /// A toggle-backed sense was switched.
    Toggled { sense: SenseId, enabled: bool },
    /// A connection was added to a store.
    Connected {
        sense: SenseId,
        connection_id: String,
        provider: String,
        origin: ConnectionOrigin,
    },
    /// A connection was removed from a store.
    Disconnected { sense: SenseId, connection_id: String },
    /// A connection attempt was rejected by validation.
    ConnectionRejected { sense: SenseId, reason: String },
    /// A location list changed (add, remove, or persisted replace).
    LocationsChanged { sense: LocationSense, count: usize },
    /// A persistence call succeeded.
    Persisted { operation: String },
    /// A persistence call failed. Local state was kept.
    SyncFailed { operation: String, message: String },
}

/// Sender for session events.
pub type EventSender = broadcast::Sender<SenseEvent>;

/// Receiver for session events.
pub type EventReceiver = broadcast::Receiver<SenseEvent>;

/// Event dispatcher for sending events to multiple receivers.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    sender: EventSender,
}

impl EventDispatcher {
    /// Create a new event dispatcher.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events.
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Send an event.
    pub fn send(&self, event: SenseEvent) {
        // Ignore error if no receivers
        let _ = self.sender.send(event);
    }

    /// Get the number of active receivers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(100)
    }
}
