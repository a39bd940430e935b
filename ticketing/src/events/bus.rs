//! Event bus for helpdesk state changes
//!
//! Provides pub/sub messaging using Tokio broadcast channels with
//! optional persistence to an [`EventJournal`](crate::state::EventJournal).

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::types::DeskEvent;
use crate::state::{MemberId, SharedJournal, TicketId};

/// Channel capacity for broadcast
const CHANNEL_CAPACITY: usize = 256;

/// Error type for event bus operations
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Failed to serialize event: {0}")]
    SerializeFailed(String),

    #[error("Failed to persist event: {0}")]
    PersistFailed(String),
}

/// Result type for event bus operations
pub type EventBusResult<T> = Result<T, EventBusError>;

/// Shared reference to EventBus
pub type SharedEventBus = Arc<EventBus>;

/// Event bus with broadcast channels and optional persistence
pub struct EventBus {
    sender: broadcast::Sender<DeskEvent>,
    journal: Option<SharedJournal>,
}

impl EventBus {
    /// Create a new event bus without persistence
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            journal: None,
        }
    }

    /// Create an event bus that journals every event before broadcasting it
    pub fn with_persistence(journal: SharedJournal) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            journal: Some(journal),
        }
    }

    /// Create a shared reference to this event bus
    pub fn shared(self) -> SharedEventBus {
        Arc::new(self)
    }

    pub fn is_persistent(&self) -> bool {
        self.journal.is_some()
    }

    /// Publish an event to all subscribers.
    ///
    /// A journal failure is reported, but subscribers still receive the
    /// event: the state change it describes has already been committed.
    pub fn publish(&self, event: DeskEvent) -> EventBusResult<()> {
        let event_type = event.event_type();
        let persisted = self.persist(&event);

        match self.sender.send(event) {
            Ok(count) => debug!(event_type, receivers = count, "Event published"),
            Err(_) => debug!(event_type, "Event published (no receivers)"),
        }
        persisted
    }

    /// Publish from code that has already committed its change.
    ///
    /// Journal failures are logged by [`publish`](Self::publish) and dropped.
    pub fn notify(&self, event: DeskEvent) {
        let _ = self.publish(event);
    }

    fn persist(&self, event: &DeskEvent) -> EventBusResult<()> {
        let Some(journal) = &self.journal else {
            return Ok(());
        };
        let event_type = event.event_type();
        let event_id = DeskEvent::new_id();
        let timestamp_nanos = event.timestamp().timestamp_nanos_opt().unwrap_or(0);

        let payload = serde_json::to_value(event).map_err(|e| {
            warn!(event_type, "Failed to serialize event: {}", e);
            EventBusError::SerializeFailed(e.to_string())
        })?;
        if let Err(e) = journal.append_event(timestamp_nanos, &event_id, &payload) {
            warn!(event_type, "Failed to persist event: {}", e);
            return Err(EventBusError::PersistFailed(e.to_string()));
        }
        debug!(event_type, event_id, "Event persisted");
        Ok(())
    }

    /// Subscribe to receive events
    pub fn subscribe(&self) -> broadcast::Receiver<DeskEvent> {
        self.sender.subscribe()
    }

    /// Subscribe and only receive events matching `filter`
    pub fn subscribe_filtered(&self, filter: EventFilter) -> FilteredReceiver {
        FilteredReceiver::new(self.subscribe(), filter)
    }

    /// Get the number of current subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Event filter for selective subscription
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Filter by ticket ID
    pub ticket_id: Option<TicketId>,
    /// Filter by acting or affected member
    pub member_id: Option<MemberId>,
    /// Filter by event types
    pub event_types: Option<Vec<String>>,
}

impl EventFilter {
    /// Create a new empty filter (matches all events)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ticket(mut self, ticket_id: TicketId) -> Self {
        self.ticket_id = Some(ticket_id);
        self
    }

    pub fn member(mut self, member_id: MemberId) -> Self {
        self.member_id = Some(member_id);
        self
    }

    pub fn types(mut self, event_types: Vec<&str>) -> Self {
        self.event_types = Some(event_types.into_iter().map(String::from).collect());
        self
    }

    /// Check if an event matches this filter.
    ///
    /// An id filter rejects events that carry no such id.
    pub fn matches(&self, event: &DeskEvent) -> bool {
        if let Some(ticket_id) = self.ticket_id {
            if event.ticket_id() != Some(ticket_id) {
                return false;
            }
        }

        if let Some(member_id) = self.member_id {
            if event.member_id() != Some(member_id) {
                return false;
            }
        }

        if let Some(ref types) = self.event_types {
            if !types.iter().any(|t| t == event.event_type()) {
                return false;
            }
        }

        true
    }
}

/// Filtered event receiver that only yields matching events
pub struct FilteredReceiver {
    receiver: broadcast::Receiver<DeskEvent>,
    filter: EventFilter,
}

impl FilteredReceiver {
    pub fn new(receiver: broadcast::Receiver<DeskEvent>, filter: EventFilter) -> Self {
        Self { receiver, filter }
    }

    /// Receive the next matching event
    pub async fn recv(&mut self) -> Result<DeskEvent, broadcast::error::RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.filter.matches(&event) {
                return Ok(event);
            }
        }
    }
}
