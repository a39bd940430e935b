//! Repository interfaces shared by every storage backend
//!
//! The engines never touch a backend directly: they see tickets through
//! [`TicketStore`], teams and members through [`RegistryStore`], and the
//! audit trail through [`EventJournal`]. Every method is a single atomic
//! operation against the backend.

use std::sync::Arc;

use super::types::*;

/// Error type for state store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[cfg(feature = "heavy-state")]
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Key not found: {0}")]
    NotFound(String),

    #[error("Unique constraint violated: {field} = {value}")]
    Duplicate { field: &'static str, value: String },

    #[error("Lock poisoned")]
    LockPoisoned,

    #[error("Column family not found: {0}")]
    ColumnFamilyNotFound(String),

    #[error("Gave up after {attempts} conflicting updates to ticket {ticket}")]
    Contention { ticket: TicketId, attempts: u32 },
}

/// Result type for state store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of a compare-and-swap on a ticket's assignment
#[derive(Debug, Clone, PartialEq)]
pub enum SwapOutcome {
    /// The expected state matched and the new state was written.
    /// `solved_count` is the credited member's count after the increment.
    Applied {
        ticket: Ticket,
        solved_count: Option<u64>,
    },
    /// Someone else moved the ticket first; carries the current state
    Stale(Ticket),
}

/// Persistent ticket collection
pub trait TicketStore: Send + Sync {
    /// Allocate the next sequence number and persist a Pending ticket
    fn insert_ticket(&self, draft: TicketDraft) -> StoreResult<Ticket>;

    /// Get a ticket by id
    fn get_ticket(&self, id: TicketId) -> StoreResult<Option<Ticket>>;

    /// Tickets matching `filter`, ordered by sequence number, read from one snapshot
    fn list_tickets(&self, filter: &TicketFilter) -> StoreResult<Vec<Ticket>>;

    /// Replace the ticket's assignment with `next` iff it still equals `expected`.
    ///
    /// When `credit` is set, that member's solved count is incremented in the
    /// same atomic unit. Fails with [`StoreError::NotFound`] when the ticket or
    /// the credited member does not exist; nothing is written in that case.
    fn swap_assignment(
        &self,
        id: TicketId,
        expected: Assignment,
        next: Assignment,
        credit: Option<MemberId>,
    ) -> StoreResult<SwapOutcome>;
}

/// Persistent team and member records
pub trait RegistryStore: Send + Sync {
    /// Create a team; names are unique
    fn insert_team(&self, name: &str, category: Option<&str>) -> StoreResult<Team>;

    /// Change the category a team owns
    fn update_team_category(&self, id: TeamId, category: Option<&str>) -> StoreResult<Team>;

    fn get_team(&self, id: TeamId) -> StoreResult<Option<Team>>;

    fn find_team_by_name(&self, name: &str) -> StoreResult<Option<Team>>;

    /// All teams ordered by id
    fn list_teams(&self) -> StoreResult<Vec<Team>>;

    /// Create a member in an existing team; emails are unique
    fn insert_member(&self, draft: MemberDraft) -> StoreResult<Member>;

    fn get_member(&self, id: MemberId) -> StoreResult<Option<Member>>;

    fn find_member_by_email(&self, email: &str) -> StoreResult<Option<Member>>;

    /// Members of a team ordered by id
    fn list_members(&self, team_id: TeamId) -> StoreResult<Vec<Member>>;

    fn set_member_status(&self, id: MemberId, status: MemberStatus) -> StoreResult<Member>;
}

/// Append-only event history for replay and audit
pub trait EventJournal: Send + Sync {
    /// Store an event payload under its timestamp
    fn append_event(
        &self,
        timestamp_nanos: i64,
        event_id: &str,
        payload: &serde_json::Value,
    ) -> StoreResult<()>;

    /// Events with `start_nanos <= timestamp <= end_nanos`, oldest first
    fn events_between(
        &self,
        start_nanos: i64,
        end_nanos: i64,
    ) -> StoreResult<Vec<(i64, serde_json::Value)>>;
}

/// Everything the engines need from a backend
pub trait DeskStore: TicketStore + RegistryStore {}

impl<T: TicketStore + RegistryStore> DeskStore for T {}

/// Shared reference to a backend
pub type SharedStore = Arc<dyn DeskStore>;

/// Shared reference to an event journal
pub type SharedJournal = Arc<dyn EventJournal>;
