//! Assignment engine: pick, resolve, and ticket queries
//!
//! Pick and resolve are single read-modify-write operations. The engine
//! reads a ticket, plans the transition with [`lifecycle`], and commits with
//! [`TicketStore::swap_assignment`](crate::state::TicketStore::swap_assignment).
//! When another writer got there first the swap comes back stale and the
//! engine plans again against the fresh ticket, so two concurrent picks can
//! never both succeed.

pub mod lifecycle;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{DeskError, DeskResult, Entity};
use crate::events::{DeskEvent, SharedEventBus};
use crate::state::{
    Assignment, Member, MemberId, SharedStore, StoreError, SwapOutcome, Ticket, TicketFilter,
    TicketId, TicketStatus,
};

pub use lifecycle::{is_legal_transition, plan_pick, plan_resolve};

/// Swap attempts before a transition gives up with a contention error
pub const MAX_SWAP_ATTEMPTS: u32 = 8;

/// Optional checks layered on top of the lifecycle rules
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignmentPolicy {
    /// Only members of the ticket's routing team may pick it
    pub restrict_to_owning_team: bool,
}

pub struct AssignmentEngine {
    store: SharedStore,
    policy: AssignmentPolicy,
    events: Option<SharedEventBus>,
}

impl AssignmentEngine {
    pub fn new(store: SharedStore, policy: AssignmentPolicy) -> Self {
        Self {
            store,
            policy,
            events: None,
        }
    }

    pub fn with_events(mut self, bus: SharedEventBus) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn policy(&self) -> AssignmentPolicy {
        self.policy
    }

    /// Claim a Pending ticket for `member_id`
    pub fn pick(&self, ticket_id: TicketId, member_id: MemberId) -> DeskResult<Ticket> {
        let mut ticket = self.ticket(ticket_id)?;
        let member = self.member(member_id)?;
        let member_team = if self.policy.restrict_to_owning_team {
            self.store.get_team(member.team_id)?.map(|t| t.name)
        } else {
            None
        };

        for attempt in 1..=MAX_SWAP_ATTEMPTS {
            let next = plan_pick(&ticket, member_id)?;
            if self.policy.restrict_to_owning_team
                && member_team.as_deref() != Some(ticket.routing_team.as_str())
            {
                return Err(DeskError::NotTeamMember {
                    ticket: ticket_id,
                    member: member_id,
                    team: ticket.routing_team,
                });
            }

            match self.swap(&ticket, next, None)? {
                SwapOutcome::Applied { ticket: picked, .. } => {
                    info!(
                        ticket_id,
                        member_id,
                        routing_team = %picked.routing_team,
                        "Ticket picked"
                    );
                    self.notify(DeskEvent::TicketPicked {
                        ticket_id,
                        member_id,
                        routing_team: picked.routing_team.clone(),
                        timestamp: picked.updated_at,
                    });
                    return Ok(picked);
                }
                SwapOutcome::Stale(current) => {
                    debug!(ticket_id, attempt, "Pick raced another writer, replanning");
                    ticket = current;
                }
            }
        }
        Err(self.contention(ticket_id))
    }

    /// Close an InProgress ticket and credit its assignee
    pub fn resolve(&self, ticket_id: TicketId, member_id: MemberId) -> DeskResult<Ticket> {
        let mut ticket = self.ticket(ticket_id)?;
        self.member(member_id)?;

        for attempt in 1..=MAX_SWAP_ATTEMPTS {
            let next = plan_resolve(&ticket, member_id)?;

            match self.swap(&ticket, next, Some(member_id))? {
                SwapOutcome::Applied {
                    ticket: solved,
                    solved_count,
                } => {
                    let solved_count = solved_count.unwrap_or_default();
                    info!(ticket_id, member_id, solved_count, "Ticket resolved");
                    self.notify(DeskEvent::TicketResolved {
                        ticket_id,
                        member_id,
                        solved_count,
                        timestamp: solved.updated_at,
                    });
                    return Ok(solved);
                }
                SwapOutcome::Stale(current) => {
                    debug!(ticket_id, attempt, "Resolve raced another writer, replanning");
                    ticket = current;
                }
            }
        }
        Err(self.contention(ticket_id))
    }

    /// Tickets matching every set field of `filter`, in sequence order
    pub fn list_queries(&self, filter: &TicketFilter) -> DeskResult<Vec<Ticket>> {
        Ok(self.store.list_tickets(filter)?)
    }

    /// Unassigned tickets routed to `team`
    pub fn team_queue(&self, team: &str) -> DeskResult<Vec<Ticket>> {
        self.list_queries(&TicketFilter::team_queue(team))
    }

    /// Tickets held by `member_id` in the given status
    pub fn member_tasks(&self, member_id: MemberId, status: TicketStatus) -> DeskResult<Vec<Ticket>> {
        self.list_queries(&TicketFilter::member_tasks(member_id, status))
    }

    /// Unassigned queue of the member's own team.
    ///
    /// Empty when the member's team no longer exists.
    pub fn queue_for_member(&self, member_id: MemberId) -> DeskResult<Vec<Ticket>> {
        let member = self.member(member_id)?;
        match self.store.get_team(member.team_id)? {
            Some(team) => self.team_queue(&team.name),
            None => Ok(Vec::new()),
        }
    }

    fn ticket(&self, ticket_id: TicketId) -> DeskResult<Ticket> {
        self.store
            .get_ticket(ticket_id)?
            .ok_or_else(|| DeskError::not_found(Entity::Ticket, ticket_id))
    }

    fn member(&self, member_id: MemberId) -> DeskResult<Member> {
        self.store
            .get_member(member_id)?
            .ok_or_else(|| DeskError::not_found(Entity::Member, member_id))
    }

    fn swap(
        &self,
        ticket: &Ticket,
        next: Assignment,
        credit: Option<MemberId>,
    ) -> DeskResult<SwapOutcome> {
        self.store
            .swap_assignment(ticket.id, ticket.assignment(), next, credit)
            .map_err(DeskError::from_store)
    }

    fn contention(&self, ticket_id: TicketId) -> DeskError {
        DeskError::Persistence(StoreError::Contention {
            ticket: ticket_id,
            attempts: MAX_SWAP_ATTEMPTS,
        })
    }

    fn notify(&self, event: DeskEvent) {
        if let Some(bus) = &self.events {
            bus.notify(event);
        }
    }
}
