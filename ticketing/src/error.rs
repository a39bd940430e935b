//! Domain error types
//!
//! Every engine operation returns [`DeskResult`]. Tool servers convert a
//! [`DeskError`] into a [`StructuredError`] so callers get a machine-readable
//! code and a recovery hint instead of a bare message.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::state::{MemberId, StoreError, TicketId, TicketStatus};

/// Result type alias for engine operations
pub type DeskResult<T> = Result<T, DeskError>;

/// Kind of record a lookup failed to find
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Ticket,
    Team,
    Member,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ticket => write!(f, "ticket"),
            Self::Team => write!(f, "team"),
            Self::Member => write!(f, "member"),
        }
    }
}

/// Errors surfaced by intake, assignment, and the registry
#[derive(Error, Debug)]
pub enum DeskError {
    /// Ticket, team, or member does not exist
    #[error("{entity} not found: {key}")]
    NotFound { entity: Entity, key: String },

    /// Pick on a ticket that already has an assignee
    #[error("Ticket {ticket} is already assigned to member {assignee}")]
    AlreadyAssigned { ticket: TicketId, assignee: MemberId },

    /// Resolve by someone other than the assignee
    #[error("Member {member} is not the assignee of ticket {ticket}")]
    NotAssignee { ticket: TicketId, member: MemberId },

    /// Transition not allowed from the ticket's current status
    #[error("Ticket {ticket} cannot be {action} while {status}")]
    InvalidState {
        ticket: TicketId,
        status: TicketStatus,
        action: &'static str,
    },

    /// Pick by a member outside the owning team (only with the team restriction enabled)
    #[error("Member {member} does not belong to team '{team}' which owns ticket {ticket}")]
    NotTeamMember {
        ticket: TicketId,
        member: MemberId,
        team: String,
    },

    /// Member email already registered
    #[error("Email already registered: {email}")]
    DuplicateEmail { email: String },

    /// Team name already taken
    #[error("Team already exists: {name}")]
    DuplicateTeam { name: String },

    /// Rejected input
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Store unavailable or write failed; safe to retry
    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
}

impl DeskError {
    pub fn not_found(entity: Entity, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Lift a store failure, keeping missing keys and unique-constraint
    /// violations as domain errors instead of persistence failures
    pub fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(key) => match key.split_once(':') {
                Some(("ticket", id)) => Self::not_found(Entity::Ticket, id),
                Some(("team", id)) => Self::not_found(Entity::Team, id),
                Some(("member", id)) => Self::not_found(Entity::Member, id),
                _ => Self::Persistence(StoreError::NotFound(key)),
            },
            StoreError::Duplicate {
                field: "member.email",
                value,
            } => Self::DuplicateEmail { email: value },
            StoreError::Duplicate {
                field: "team.name",
                value,
            } => Self::DuplicateTeam { name: value },
            other => Self::Persistence(other),
        }
    }

    /// Whether the caller may retry the same request unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::AlreadyAssigned { .. } => "ALREADY_ASSIGNED",
            Self::NotAssignee { .. } => "NOT_ASSIGNEE",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::NotTeamMember { .. } => "NOT_TEAM_MEMBER",
            Self::DuplicateEmail { .. } => "DUPLICATE_EMAIL",
            Self::DuplicateTeam { .. } => "DUPLICATE_TEAM",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }

    fn recovery_action(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "Check the id; list queries or teams to find valid ids",
            Self::AlreadyAssigned { .. } => "Pick another ticket from the team queue",
            Self::NotAssignee { .. } => "Only the member who picked the ticket can resolve it",
            Self::InvalidState { .. } => "Pick the ticket first; solved tickets are final",
            Self::NotTeamMember { .. } => "Pick tickets routed to your own team",
            Self::DuplicateEmail { .. } => "Use a different email or look up the existing member",
            Self::DuplicateTeam { .. } => "Use a different team name",
            Self::Validation { .. } => "Fix the request parameters and retry",
            Self::Persistence(_) => "Retry the request; the store may be temporarily unavailable",
        }
    }

    /// Convert to the structured form returned by tool servers
    pub fn to_structured(&self) -> StructuredError {
        let mut structured =
            StructuredError::new(self.code(), self.to_string(), self.recovery_action());
        match self {
            Self::AlreadyAssigned { ticket, assignee } => {
                structured = structured
                    .with_context("ticket_id", *ticket)
                    .with_context("assignee", *assignee);
            }
            Self::NotAssignee { ticket, member } => {
                structured = structured
                    .with_context("ticket_id", *ticket)
                    .with_context("member_id", *member);
            }
            Self::InvalidState { ticket, status, .. } => {
                structured = structured
                    .with_context("ticket_id", *ticket)
                    .with_context("status", status.to_string());
            }
            _ => {}
        }
        if self.is_retryable() {
            structured = structured.retryable();
        }
        structured
    }
}

/// Structured error response that tells a caller what to do next.
///
/// # Example Response
/// ```json
/// {
///   "code": "ALREADY_ASSIGNED",
///   "message": "Ticket 12 is already assigned to member 3",
///   "recovery_action": "Pick another ticket from the team queue",
///   "context": { "ticket_id": 12, "assignee": 3 }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Machine-readable error code (e.g., "NOT_FOUND", "ALREADY_ASSIGNED")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Actionable recovery instruction
    pub recovery_action: String,

    /// Relevant context for debugging and recovery
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,

    /// Whether this error is retryable (transient failure)
    #[serde(default)]
    pub retryable: bool,
}

impl StructuredError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        recovery_action: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            recovery_action: recovery_action.into(),
            context: HashMap::new(),
            retryable: false,
        }
    }

    /// Add context key-value pair
    pub fn with_context(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Mark as retryable
    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }

    /// Serialize for a tool response
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.to_string())
    }
}

impl std::fmt::Display for StructuredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for StructuredError {}

impl From<DeskError> for StructuredError {
    fn from(err: DeskError) -> Self {
        err.to_structured()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_persistence_is_retryable() {
        assert!(DeskError::Persistence(StoreError::LockPoisoned).is_retryable());
        assert!(!DeskError::AlreadyAssigned {
            ticket: 1,
            assignee: 2
        }
        .is_retryable());
        assert!(!DeskError::not_found(Entity::Ticket, 9).is_retryable());
    }

    #[test]
    fn test_structured_conversion_carries_context() {
        let err = DeskError::AlreadyAssigned {
            ticket: 12,
            assignee: 3,
        };
        let structured = err.to_structured();
        assert_eq!(structured.code, "ALREADY_ASSIGNED");
        assert_eq!(structured.context["ticket_id"], serde_json::json!(12));
        assert_eq!(structured.context["assignee"], serde_json::json!(3));
        assert!(!structured.retryable);

        let json = structured.to_json();
        assert!(json.contains("\"recovery_action\""));
    }

    #[test]
    fn test_error_messages() {
        let err = DeskError::InvalidState {
            ticket: 4,
            status: TicketStatus::Pending,
            action: "resolved",
        };
        assert_eq!(err.to_string(), "Ticket 4 cannot be resolved while pending");

        let err = DeskError::not_found(Entity::Member, 17);
        assert_eq!(err.to_string(), "member not found: 17");
    }

    #[test]
    fn test_store_errors_map_to_domain_errors() {
        let err = DeskError::from_store(StoreError::NotFound("team:3".to_string()));
        assert!(matches!(
            err,
            DeskError::NotFound { entity: Entity::Team, ref key } if key == "3"
        ));

        let err = DeskError::from_store(StoreError::Duplicate {
            field: "member.email",
            value: "a@b.io".to_string(),
        });
        assert!(matches!(err, DeskError::DuplicateEmail { .. }));

        let err = DeskError::from_store(StoreError::LockPoisoned);
        assert!(err.is_retryable());
    }
}
