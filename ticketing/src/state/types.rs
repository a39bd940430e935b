//! Core types for ticket and registry persistence
//!
//! These types are stored by every backend and represent the persistent
//! state of the helpdesk: tickets, teams, and team members.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ticket identifier. Doubles as the per-system sequence number.
pub type TicketId = u64;

/// Team identifier
pub type TeamId = u64;

/// Member identifier
pub type MemberId = u64;

/// Classifier output, used verbatim as the routing key
pub type CategoryLabel = String;

/// Confidentiality level stamped on every new ticket
pub const DEFAULT_CONFIDENTIALITY: u8 = 80;

/// Routing target when no team owns a category
pub const FALLBACK_TEAM: &str = "Other";

/// Category recorded when the classifier could not answer
pub const UNCLASSIFIED_LABEL: &str = "Unclassified";

/// Lifecycle status of a ticket
///
/// Transitions are strictly linear: `Pending → InProgress → Solved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Waiting in the owning team's queue
    Pending,
    /// Claimed by a member
    InProgress,
    /// Closed by the assignee
    Solved,
}

impl TicketStatus {
    /// Whether a ticket in this status must carry an assignee
    pub fn requires_assignee(self) -> bool {
        matches!(self, Self::InProgress | Self::Solved)
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Solved => write!(f, "solved"),
        }
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "pending" => Ok(Self::Pending),
            "in_progress" | "inprogress" => Ok(Self::InProgress),
            "solved" | "resolved" => Ok(Self::Solved),
            other => Err(format!("unknown ticket status: {other}")),
        }
    }
}

/// The mutable assignment state of a ticket.
///
/// This pair is what pick and resolve compare-and-swap on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub status: TicketStatus,
    pub assignee: Option<MemberId>,
}

impl Assignment {
    /// State of a freshly created ticket
    pub fn unassigned() -> Self {
        Self {
            status: TicketStatus::Pending,
            assignee: None,
        }
    }

    /// Claimed by `member`
    pub fn claimed_by(member: MemberId) -> Self {
        Self {
            status: TicketStatus::InProgress,
            assignee: Some(member),
        }
    }

    /// Solved by `member`
    pub fn solved_by(member: MemberId) -> Self {
        Self {
            status: TicketStatus::Solved,
            assignee: Some(member),
        }
    }

    /// assignee is set iff status is InProgress or Solved
    pub fn is_consistent(&self) -> bool {
        self.assignee.is_some() == self.status.requires_assignee()
    }
}

/// A tracked unit of work created from one inbound message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Sequence number, unique and contiguous from 1
    pub id: TicketId,

    /// Channel identity of whoever sent the message
    pub sender_id: String,

    /// Original message text, stored verbatim
    pub text: String,

    /// Category label assigned at intake
    pub category: CategoryLabel,

    /// Name of the owning team (or the fallback team)
    pub routing_team: String,

    /// Confidentiality level
    pub confidentiality: u8,

    /// Current lifecycle status
    pub status: TicketStatus,

    /// Member who picked the ticket
    pub assignee: Option<MemberId>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last transition timestamp
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Materialize a draft with the sequence number allocated by the store
    pub fn from_draft(id: TicketId, draft: TicketDraft) -> Self {
        let now = Utc::now();
        Self {
            id,
            sender_id: draft.sender_id,
            text: draft.text,
            category: draft.category,
            routing_team: draft.routing_team,
            confidentiality: draft.confidentiality,
            status: TicketStatus::Pending,
            assignee: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Current assignment state
    pub fn assignment(&self) -> Assignment {
        Assignment {
            status: self.status,
            assignee: self.assignee,
        }
    }

    /// Overwrite the assignment state and touch the update timestamp
    pub fn set_assignment(&mut self, assignment: Assignment) {
        self.status = assignment.status;
        self.assignee = assignment.assignee;
        self.updated_at = Utc::now();
    }

    /// First characters of the message, for logs and events
    pub fn preview(&self, max_chars: usize) -> String {
        let mut preview: String = self.text.chars().take(max_chars).collect();
        if self.text.chars().count() > max_chars {
            preview.push('…');
        }
        preview
    }
}

/// Everything intake decides about a ticket before the store numbers it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketDraft {
    pub sender_id: String,
    pub text: String,
    pub category: CategoryLabel,
    pub routing_team: String,
    pub confidentiality: u8,
}

/// Conjunctive ticket query. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketFilter {
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub assignee: Option<MemberId>,
    #[serde(default)]
    pub status: Option<TicketStatus>,
    #[serde(default)]
    pub category: Option<CategoryLabel>,
}

impl TicketFilter {
    /// Filter matching every ticket
    pub fn all() -> Self {
        Self::default()
    }

    /// Unassigned queue of a team
    pub fn team_queue(team: impl Into<String>) -> Self {
        Self::all().with_team(team).with_status(TicketStatus::Pending)
    }

    /// A member's personal queue in the given status
    pub fn member_tasks(member: MemberId, status: TicketStatus) -> Self {
        Self::all().with_assignee(member).with_status(status)
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    pub fn with_assignee(mut self, member: MemberId) -> Self {
        self.assignee = Some(member);
        self
    }

    pub fn with_status(mut self, status: TicketStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Check a ticket against every set field
    pub fn matches(&self, ticket: &Ticket) -> bool {
        self.team.as_ref().map_or(true, |t| *t == ticket.routing_team)
            && self.assignee.map_or(true, |m| ticket.assignee == Some(m))
            && self.status.map_or(true, |s| ticket.status == s)
            && self.category.as_ref().map_or(true, |c| *c == ticket.category)
    }
}

/// A team owning one routing category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    /// Category label routed to this team, if any
    pub category: Option<CategoryLabel>,
    pub created_at: DateTime<Utc>,
}

impl Team {
    pub fn new(id: TeamId, name: String, category: Option<CategoryLabel>) -> Self {
        Self {
            id,
            name,
            category,
            created_at: Utc::now(),
        }
    }

    /// Category shown to admins: the explicit category, else the team name.
    ///
    /// Routing never uses this fallback.
    pub fn display_category(&self) -> &str {
        self.category.as_deref().unwrap_or(&self.name)
    }
}

/// Presence of a member, driven by login/logout outside the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Active,
    Inactive,
}

impl std::fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
        }
    }
}

impl std::str::FromStr for MemberStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(format!("unknown member status: {other}")),
        }
    }
}

/// A support agent belonging to exactly one team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub team_id: TeamId,
    pub name: String,
    /// Unique across the registry
    pub email: String,
    pub role: String,
    pub status: MemberStatus,
    /// Tickets resolved by this member; only resolve increments it
    pub solved_count: u64,
    pub created_at: DateTime<Utc>,
}

impl Member {
    /// Materialize a draft with the id allocated by the store
    pub fn from_draft(id: MemberId, draft: MemberDraft) -> Self {
        Self {
            id,
            team_id: draft.team_id,
            name: draft.name,
            email: draft.email,
            role: draft.role,
            status: MemberStatus::Inactive,
            solved_count: 0,
            created_at: Utc::now(),
        }
    }
}

/// Input for member creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDraft {
    pub team_id: TeamId,
    pub name: String,
    pub email: String,
    pub role: String,
}

/// A team together with its members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRoster {
    pub team: Team,
    pub members: Vec<Member>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(team: &str) -> TicketDraft {
        TicketDraft {
            sender_id: "whatsapp:+15550001".to_string(),
            text: "My invoice is wrong".to_string(),
            category: "Billing".to_string(),
            routing_team: team.to_string(),
            confidentiality: DEFAULT_CONFIDENTIALITY,
        }
    }

    #[test]
    fn test_new_ticket_is_pending_and_unassigned() {
        let ticket = Ticket::from_draft(1, draft("Billing Team"));
        assert_eq!(ticket.status, TicketStatus::Pending);
        assert!(ticket.assignee.is_none());
        assert!(ticket.assignment().is_consistent());
        assert_eq!(ticket.confidentiality, 80);
    }

    #[test]
    fn test_assignment_consistency() {
        assert!(Assignment::unassigned().is_consistent());
        assert!(Assignment::claimed_by(7).is_consistent());
        assert!(Assignment::solved_by(7).is_consistent());

        let broken = Assignment {
            status: TicketStatus::InProgress,
            assignee: None,
        };
        assert!(!broken.is_consistent());

        let broken = Assignment {
            status: TicketStatus::Pending,
            assignee: Some(3),
        };
        assert!(!broken.is_consistent());
    }

    #[test]
    fn test_filter_and_semantics() {
        let mut ticket = Ticket::from_draft(1, draft("Billing Team"));
        ticket.set_assignment(Assignment::claimed_by(4));

        assert!(TicketFilter::all().matches(&ticket));
        assert!(TicketFilter::all().with_team("Billing Team").matches(&ticket));
        assert!(TicketFilter::member_tasks(4, TicketStatus::InProgress).matches(&ticket));
        assert!(!TicketFilter::member_tasks(4, TicketStatus::Solved).matches(&ticket));
        assert!(!TicketFilter::team_queue("Billing Team").matches(&ticket));
        assert!(!TicketFilter::all()
            .with_team("Billing Team")
            .with_category("Shipping")
            .matches(&ticket));
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("In Progress".parse::<TicketStatus>(), Ok(TicketStatus::InProgress));
        assert_eq!("solved".parse::<TicketStatus>(), Ok(TicketStatus::Solved));
        assert_eq!("pending".parse::<TicketStatus>(), Ok(TicketStatus::Pending));
        assert!("closed".parse::<TicketStatus>().is_err());

        assert_eq!(" Active ".parse::<MemberStatus>(), Ok(MemberStatus::Active));
        assert!("away".parse::<MemberStatus>().is_err());
    }

    #[test]
    fn test_display_category_falls_back_to_name() {
        let team = Team::new(1, "Billing".to_string(), None);
        assert_eq!(team.display_category(), "Billing");

        let team = Team::new(2, "Finance".to_string(), Some("Payments".to_string()));
        assert_eq!(team.display_category(), "Payments");
    }

    #[test]
    fn test_preview_truncates() {
        let ticket = Ticket::from_draft(1, draft("x"));
        assert_eq!(ticket.preview(5), "My in…");
        assert_eq!(ticket.preview(100), "My invoice is wrong");
    }
}
