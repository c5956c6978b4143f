//! Event types for the GJP event system
//!
//! Session changes and draft lifecycle are broadcast explicitly through an
//! [`EventBus`] instead of ambient global notifications. Any component that
//! reacts to login or logout (for example the auth gate) holds its own
//! subscription.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// GJP event types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PortalEvent {
    /// A session token was stored
    LoggedIn {
        user_id: String,
        timestamp: DateTime<Utc>,
    },

    /// The session token was removed (explicit logout or auth failure)
    LoggedOut { timestamp: DateTime<Utc> },

    /// A stored token was found past its expiry
    SessionExpired {
        expired_at: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },

    /// One wizard step draft was written
    DraftSaved {
        key: String,
        timestamp: DateTime<Utc>,
    },

    /// All wizard drafts were removed
    DraftsCleared { timestamp: DateTime<Utc> },

    /// The backend accepted a submission
    SubmissionCompleted {
        submission_id: Option<String>,
        attempts: u32,
        timestamp: DateTime<Utc>,
    },
}

impl PortalEvent {
    /// Event type name, matching the serde tag
    pub fn event_type(&self) -> &'static str {
        match self {
            PortalEvent::LoggedIn { .. } => "LoggedIn",
            PortalEvent::LoggedOut { .. } => "LoggedOut",
            PortalEvent::SessionExpired { .. } => "SessionExpired",
            PortalEvent::DraftSaved { .. } => "DraftSaved",
            PortalEvent::DraftsCleared { .. } => "DraftsCleared",
            PortalEvent::SubmissionCompleted { .. } => "SubmissionCompleted",
        }
    }

    /// True for events that change whether a session is present
    pub fn affects_session(&self) -> bool {
        matches!(
            self,
            PortalEvent::LoggedIn { .. }
                | PortalEvent::LoggedOut { .. }
                | PortalEvent::SessionExpired { .. }
        )
    }
}

/// Broadcast channel for [`PortalEvent`]s
///
/// Cloning an `EventBus` yields another handle to the same channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PortalEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    ///
    /// # Examples
    ///
    /// ```
    /// use gjp_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(64);
    /// assert_eq!(event_bus.capacity(), 64);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<PortalEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: PortalEvent,
    ) -> Result<usize, broadcast::error::SendError<PortalEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// # Examples
    ///
    /// ```
    /// use gjp_common::events::{EventBus, PortalEvent};
    ///
    /// let event_bus = EventBus::new(16);
    /// event_bus.emit_lossy(PortalEvent::LoggedOut {
    ///     timestamp: chrono::Utc::now(),
    /// });
    /// ```
    pub fn emit_lossy(&self, event: PortalEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
