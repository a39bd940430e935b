//! Event types for the helpdesk
//!
//! These events describe committed state changes. They are broadcast to
//! subscribers and optionally journaled for replay.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{CategoryLabel, MemberId, MemberStatus, TeamId, TicketId};

/// Unique identifier for events
pub type EventId = String;

/// All helpdesk events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeskEvent {
    /// Intake persisted a new ticket
    TicketCreated {
        ticket_id: TicketId,
        sender_id: String,
        category: CategoryLabel,
        routing_team: String,
        /// False when the classifier failed and the sentinel label was used
        classified: bool,
        text_preview: String,
        timestamp: DateTime<Utc>,
    },

    /// A member claimed a pending ticket
    TicketPicked {
        ticket_id: TicketId,
        member_id: MemberId,
        routing_team: String,
        timestamp: DateTime<Utc>,
    },

    /// The assignee closed a ticket
    TicketResolved {
        ticket_id: TicketId,
        member_id: MemberId,
        /// Member's solved count after this resolution
        solved_count: u64,
        timestamp: DateTime<Utc>,
    },

    /// A team was created or seeded
    TeamCreated {
        team_id: TeamId,
        name: String,
        category: Option<CategoryLabel>,
        timestamp: DateTime<Utc>,
    },

    /// A team now owns a different category
    TeamCategoryChanged {
        team_id: TeamId,
        category: Option<CategoryLabel>,
        timestamp: DateTime<Utc>,
    },

    /// A member joined a team
    MemberAdded {
        member_id: MemberId,
        team_id: TeamId,
        email: String,
        timestamp: DateTime<Utc>,
    },

    /// A member logged in or out
    MemberStatusChanged {
        member_id: MemberId,
        status: MemberStatus,
        timestamp: DateTime<Utc>,
    },
}

impl DeskEvent {
    /// Get the timestamp of this event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            DeskEvent::TicketCreated { timestamp, .. } => *timestamp,
            DeskEvent::TicketPicked { timestamp, .. } => *timestamp,
            DeskEvent::TicketResolved { timestamp, .. } => *timestamp,
            DeskEvent::TeamCreated { timestamp, .. } => *timestamp,
            DeskEvent::TeamCategoryChanged { timestamp, .. } => *timestamp,
            DeskEvent::MemberAdded { timestamp, .. } => *timestamp,
            DeskEvent::MemberStatusChanged { timestamp, .. } => *timestamp,
        }
    }

    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            DeskEvent::TicketCreated { .. } => "ticket_created",
            DeskEvent::TicketPicked { .. } => "ticket_picked",
            DeskEvent::TicketResolved { .. } => "ticket_resolved",
            DeskEvent::TeamCreated { .. } => "team_created",
            DeskEvent::TeamCategoryChanged { .. } => "team_category_changed",
            DeskEvent::MemberAdded { .. } => "member_added",
            DeskEvent::MemberStatusChanged { .. } => "member_status_changed",
        }
    }

    /// Get the ticket ID if this event is ticket-scoped
    pub fn ticket_id(&self) -> Option<TicketId> {
        match self {
            DeskEvent::TicketCreated { ticket_id, .. } => Some(*ticket_id),
            DeskEvent::TicketPicked { ticket_id, .. } => Some(*ticket_id),
            DeskEvent::TicketResolved { ticket_id, .. } => Some(*ticket_id),
            _ => None,
        }
    }

    /// Get the member ID if a member is the subject or actor
    pub fn member_id(&self) -> Option<MemberId> {
        match self {
            DeskEvent::TicketPicked { member_id, .. } => Some(*member_id),
            DeskEvent::TicketResolved { member_id, .. } => Some(*member_id),
            DeskEvent::MemberAdded { member_id, .. } => Some(*member_id),
            DeskEvent::MemberStatusChanged { member_id, .. } => Some(*member_id),
            _ => None,
        }
    }

    /// Create a new unique event ID
    pub fn new_id() -> EventId {
        uuid::Uuid::new_v4().to_string()
    }
}
