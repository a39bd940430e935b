//! Ticket lifecycle: legal transitions and transition planning.
//!
//! ```text
//! Pending ──pick──▶ InProgress ──resolve──▶ Solved
//! ```
//!
//! There are no backward edges and `Solved` is terminal. Planning functions
//! are pure: they look at one snapshot of a ticket and either return the
//! assignment to commit or the domain error to report. The engine commits the
//! plan with a compare-and-swap against that same snapshot.

use crate::error::{DeskError, DeskResult};
use crate::state::{Assignment, MemberId, Ticket, TicketStatus};

/// Valid edges in the ticket state graph
pub fn is_legal_transition(from: TicketStatus, to: TicketStatus) -> bool {
    use TicketStatus::*;

    matches!((from, to), (Pending, InProgress) | (InProgress, Solved))
}

/// Assignment to commit when `member` picks `ticket`.
///
/// Any existing assignee makes the pick fail, including the same member
/// picking twice.
pub fn plan_pick(ticket: &Ticket, member: MemberId) -> DeskResult<Assignment> {
    if let Some(assignee) = ticket.assignee {
        return Err(DeskError::AlreadyAssigned {
            ticket: ticket.id,
            assignee,
        });
    }
    if !is_legal_transition(ticket.status, TicketStatus::InProgress) {
        return Err(DeskError::InvalidState {
            ticket: ticket.id,
            status: ticket.status,
            action: "picked",
        });
    }
    Ok(Assignment::claimed_by(member))
}

/// Assignment to commit when `member` resolves `ticket`.
///
/// State is checked before identity, so resolving a ticket nobody picked is
/// an invalid state rather than a wrong assignee.
pub fn plan_resolve(ticket: &Ticket, member: MemberId) -> DeskResult<Assignment> {
    if !is_legal_transition(ticket.status, TicketStatus::Solved) {
        return Err(DeskError::InvalidState {
            ticket: ticket.id,
            status: ticket.status,
            action: "resolved",
        });
    }
    if ticket.assignee != Some(member) {
        return Err(DeskError::NotAssignee {
            ticket: ticket.id,
            member,
        });
    }
    Ok(Assignment::solved_by(member))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{TicketDraft, DEFAULT_CONFIDENTIALITY};

    fn ticket(assignment: Assignment) -> Ticket {
        let mut ticket = Ticket::from_draft(
            1,
            TicketDraft {
                sender_id: "sms:1".to_string(),
                text: "help".to_string(),
                category: "Billing".to_string(),
                routing_team: "Finance".to_string(),
                confidentiality: DEFAULT_CONFIDENTIALITY,
            },
        );
        ticket.set_assignment(assignment);
        ticket
    }

    #[test]
    fn test_only_forward_edges_are_legal() {
        use TicketStatus::*;
        assert!(is_legal_transition(Pending, InProgress));
        assert!(is_legal_transition(InProgress, Solved));

        assert!(!is_legal_transition(Pending, Solved));
        assert!(!is_legal_transition(InProgress, Pending));
        assert!(!is_legal_transition(Solved, InProgress));
        assert!(!is_legal_transition(Solved, Solved));
    }

    #[test]
    fn test_pick_plans() {
        let pending = ticket(Assignment::unassigned());
        assert_eq!(plan_pick(&pending, 7).unwrap(), Assignment::claimed_by(7));

        let claimed = ticket(Assignment::claimed_by(7));
        assert!(matches!(
            plan_pick(&claimed, 7),
            Err(DeskError::AlreadyAssigned { assignee: 7, .. })
        ));

        let solved = ticket(Assignment::solved_by(7));
        assert!(matches!(
            plan_pick(&solved, 8),
            Err(DeskError::AlreadyAssigned { .. })
        ));
    }

    #[test]
    fn test_resolve_checks_state_before_assignee() {
        let pending = ticket(Assignment::unassigned());
        assert!(matches!(
            plan_resolve(&pending, 7),
            Err(DeskError::InvalidState {
                status: TicketStatus::Pending,
                ..
            })
        ));

        let claimed = ticket(Assignment::claimed_by(7));
        assert!(matches!(
            plan_resolve(&claimed, 8),
            Err(DeskError::NotAssignee { member: 8, .. })
        ));
        assert_eq!(
            plan_resolve(&claimed, 7).unwrap(),
            Assignment::solved_by(7)
        );

        let solved = ticket(Assignment::solved_by(7));
        assert!(matches!(
            plan_resolve(&solved, 7),
            Err(DeskError::InvalidState {
                status: TicketStatus::Solved,
                ..
            })
        ));
    }
}
