//! In-process state store
//!
//! All records live behind one `RwLock`, so every mutation is serialized and
//! every query reads a single consistent snapshot. This is the default
//! backend and the one the test suites run against.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::store::*;
use super::types::*;

#[derive(Default)]
struct Inner {
    tickets: BTreeMap<TicketId, Ticket>,
    teams: BTreeMap<TeamId, Team>,
    members: BTreeMap<MemberId, Member>,
    member_emails: HashMap<String, MemberId>,
    events: BTreeMap<(i64, String), serde_json::Value>,
    last_ticket: TicketId,
    last_team: TeamId,
    last_member: MemberId,
}

/// Memory-backed implementation of every repository trait
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared reference to this store
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Inner>> {
        self.inner.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Inner>> {
        self.inner.write().map_err(|_| StoreError::LockPoisoned)
    }
}

impl TicketStore for MemoryStore {
    fn insert_ticket(&self, draft: TicketDraft) -> StoreResult<Ticket> {
        let mut inner = self.write()?;
        inner.last_ticket += 1;
        let ticket = Ticket::from_draft(inner.last_ticket, draft);
        inner.tickets.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    fn get_ticket(&self, id: TicketId) -> StoreResult<Option<Ticket>> {
        Ok(self.read()?.tickets.get(&id).cloned())
    }

    fn list_tickets(&self, filter: &TicketFilter) -> StoreResult<Vec<Ticket>> {
        Ok(self
            .read()?
            .tickets
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect())
    }

    fn swap_assignment(
        &self,
        id: TicketId,
        expected: Assignment,
        next: Assignment,
        credit: Option<MemberId>,
    ) -> StoreResult<SwapOutcome> {
        let mut inner = self.write()?;

        if let Some(member_id) = credit {
            if !inner.members.contains_key(&member_id) {
                return Err(StoreError::NotFound(format!("member:{member_id}")));
            }
        }

        let ticket = inner
            .tickets
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("ticket:{id}")))?;

        if ticket.assignment() != expected {
            return Ok(SwapOutcome::Stale(ticket.clone()));
        }

        ticket.set_assignment(next);
        let updated = ticket.clone();

        let solved_count = match credit {
            Some(member_id) => inner.members.get_mut(&member_id).map(|member| {
                member.solved_count += 1;
                member.solved_count
            }),
            None => None,
        };

        Ok(SwapOutcome::Applied {
            ticket: updated,
            solved_count,
        })
    }
}

impl RegistryStore for MemoryStore {
    fn insert_team(&self, name: &str, category: Option<&str>) -> StoreResult<Team> {
        let mut inner = self.write()?;
        if inner.teams.values().any(|t| t.name == name) {
            return Err(StoreError::Duplicate {
                field: "team.name",
                value: name.to_string(),
            });
        }
        inner.last_team += 1;
        let team = Team::new(
            inner.last_team,
            name.to_string(),
            category.map(str::to_string),
        );
        inner.teams.insert(team.id, team.clone());
        Ok(team)
    }

    fn update_team_category(&self, id: TeamId, category: Option<&str>) -> StoreResult<Team> {
        let mut inner = self.write()?;
        let team = inner
            .teams
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("team:{id}")))?;
        team.category = category.map(str::to_string);
        Ok(team.clone())
    }

    fn get_team(&self, id: TeamId) -> StoreResult<Option<Team>> {
        Ok(self.read()?.teams.get(&id).cloned())
    }

    fn find_team_by_name(&self, name: &str) -> StoreResult<Option<Team>> {
        Ok(self
            .read()?
            .teams
            .values()
            .find(|t| t.name == name)
            .cloned())
    }

    fn list_teams(&self) -> StoreResult<Vec<Team>> {
        Ok(self.read()?.teams.values().cloned().collect())
    }

    fn insert_member(&self, draft: MemberDraft) -> StoreResult<Member> {
        let mut inner = self.write()?;
        if !inner.teams.contains_key(&draft.team_id) {
            return Err(StoreError::NotFound(format!("team:{}", draft.team_id)));
        }
        if inner.member_emails.contains_key(&draft.email) {
            return Err(StoreError::Duplicate {
                field: "member.email",
                value: draft.email,
            });
        }
        inner.last_member += 1;
        let member = Member::from_draft(inner.last_member, draft);
        inner.member_emails.insert(member.email.clone(), member.id);
        inner.members.insert(member.id, member.clone());
        Ok(member)
    }

    fn get_member(&self, id: MemberId) -> StoreResult<Option<Member>> {
        Ok(self.read()?.members.get(&id).cloned())
    }

    fn find_member_by_email(&self, email: &str) -> StoreResult<Option<Member>> {
        let inner = self.read()?;
        Ok(inner
            .member_emails
            .get(email)
            .and_then(|id| inner.members.get(id))
            .cloned())
    }

    fn list_members(&self, team_id: TeamId) -> StoreResult<Vec<Member>> {
        Ok(self
            .read()?
            .members
            .values()
            .filter(|m| m.team_id == team_id)
            .cloned()
            .collect())
    }

    fn set_member_status(&self, id: MemberId, status: MemberStatus) -> StoreResult<Member> {
        let mut inner = self.write()?;
        let member = inner
            .members
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("member:{id}")))?;
        member.status = status;
        Ok(member.clone())
    }
}

impl EventJournal for MemoryStore {
    fn append_event(
        &self,
        timestamp_nanos: i64,
        event_id: &str,
        payload: &serde_json::Value,
    ) -> StoreResult<()> {
        self.write()?
            .events
            .insert((timestamp_nanos, event_id.to_string()), payload.clone());
        Ok(())
    }

    fn events_between(
        &self,
        start_nanos: i64,
        end_nanos: i64,
    ) -> StoreResult<Vec<(i64, serde_json::Value)>> {
        Ok(self
            .read()?
            .events
            .iter()
            .filter(|((ts, _), _)| *ts >= start_nanos && *ts <= end_nanos)
            .map(|((ts, _), payload)| (*ts, payload.clone()))
            .collect())
    }
}
