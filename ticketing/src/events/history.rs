//! Event history and replay
//!
//! Reads journaled events back for audit and debugging.

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, warn};

use super::types::DeskEvent;
use crate::error::DeskError;
use crate::state::{SharedJournal, StoreError, TicketId};

/// Error type for history operations
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),
}

impl From<HistoryError> for DeskError {
    fn from(err: HistoryError) -> Self {
        match err {
            HistoryError::StoreError(e) => DeskError::from_store(e),
        }
    }
}

/// Result type for history operations
pub type HistoryResult<T> = Result<T, HistoryError>;

/// Query journaled events
pub struct EventHistory {
    journal: SharedJournal,
}

impl EventHistory {
    pub fn new(journal: SharedJournal) -> Self {
        Self { journal }
    }

    /// All events in a time range, oldest first.
    ///
    /// Payloads that no longer parse as a [`DeskEvent`] are skipped.
    pub fn get_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> HistoryResult<Vec<DeskEvent>> {
        let start_nanos = start.timestamp_nanos_opt().unwrap_or(0);
        let end_nanos = end.timestamp_nanos_opt().unwrap_or(i64::MAX);

        let events: Vec<DeskEvent> = self
            .journal
            .events_between(start_nanos, end_nanos)?
            .into_iter()
            .filter_map(|(ts, payload)| match serde_json::from_value(payload) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!(timestamp = ts, "Skipping unreadable journal entry: {}", e);
                    None
                }
            })
            .collect();

        debug!(count = events.len(), "Retrieved events from history");
        Ok(events)
    }

    /// Events for the last N minutes. Windows reaching past the earliest
    /// representable time cover the whole journal.
    pub fn get_recent_events(&self, minutes: i64) -> HistoryResult<Vec<DeskEvent>> {
        let end = Utc::now();
        let start = TimeDelta::try_minutes(minutes)
            .and_then(|window| end.checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.get_events(start, end)
    }

    /// Full journaled lifecycle of one ticket
    pub fn ticket_events(&self, ticket_id: TicketId) -> HistoryResult<Vec<DeskEvent>> {
        let events = self
            .get_events(DateTime::<Utc>::MIN_UTC, Utc::now())?
            .into_iter()
            .filter(|e| e.ticket_id() == Some(ticket_id))
            .collect();
        Ok(events)
    }
}
