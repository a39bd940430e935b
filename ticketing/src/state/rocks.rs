//! RocksDB-backed state store
//!
//! Provides persistent storage with column families for logical data separation.
//! Uses bincode for efficient binary serialization internally; events are kept
//! as JSON for debuggability.
//!
//! Read-modify-write operations (sequence allocation, assignment swaps,
//! unique-email checks) hold the write side of the database lock, and any
//! update touching more than one key is committed as a single `WriteBatch`.

use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rocksdb::{ColumnFamilyDescriptor, Options, WriteBatch, DB};
use serde::{de::DeserializeOwned, Serialize};

use super::schema::{self, ALL_CFS};
use super::store::*;
use super::types::*;

/// RocksDB-backed persistent state store
pub struct RocksStore {
    db: RwLock<DB>,
    path: PathBuf,
}

fn encode<T: Serialize>(value: &T) -> StoreResult<Vec<u8>> {
    bincode::serde::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
    bincode::serde::decode_from_slice(bytes, bincode::config::standard())
        .map(|(value, _)| value)
        .map_err(|e| StoreError::Deserialization(e.to_string()))
}

fn cf<'a>(db: &'a DB, name: &str) -> StoreResult<&'a rocksdb::ColumnFamily> {
    db.cf_handle(name)
        .ok_or_else(|| StoreError::ColumnFamilyNotFound(name.to_string()))
}

fn get<T: DeserializeOwned>(db: &DB, cf_name: &str, key: &str) -> StoreResult<Option<T>> {
    match db.get_cf(cf(db, cf_name)?, key.as_bytes())? {
        Some(bytes) => Ok(Some(decode(&bytes)?)),
        None => Ok(None),
    }
}

fn put<T: Serialize>(db: &DB, cf_name: &str, key: &str, value: &T) -> StoreResult<()> {
    db.put_cf(cf(db, cf_name)?, key.as_bytes(), encode(value)?)?;
    Ok(())
}

/// Decode every value under `prefix`, in key order
fn scan<T: DeserializeOwned>(db: &DB, cf_name: &str, prefix: &str) -> StoreResult<Vec<T>> {
    let mut values = Vec::new();
    for item in db.prefix_iterator_cf(cf(db, cf_name)?, prefix.as_bytes()) {
        let (key, value) = item?;
        if !key.starts_with(prefix.as_bytes()) {
            break; // Prefix no longer matches
        }
        values.push(decode(&value)?);
    }
    Ok(values)
}

/// Next value of an id sequence. Caller must hold the write lock.
fn next_id(db: &DB, batch: &mut WriteBatch, kind: &str) -> StoreResult<u64> {
    let key = schema::keys::sequence(kind);
    let last: u64 = get(db, schema::CF_META, &key)?.unwrap_or(0);
    let id = last + 1;
    batch.put_cf(cf(db, schema::CF_META)?, key.as_bytes(), encode(&id)?);
    Ok(id)
}

impl RocksStore {
    /// Open or create a state store at the given path
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = ALL_CFS
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&opts, &path, cf_descriptors)?;

        Ok(Self {
            db: RwLock::new(db),
            path,
        })
    }

    /// Create a shared reference to this store
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Get the database path
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, DB>> {
        self.db.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, DB>> {
        self.db.write().map_err(|_| StoreError::LockPoisoned)
    }
}

impl TicketStore for RocksStore {
    fn insert_ticket(&self, draft: TicketDraft) -> StoreResult<Ticket> {
        let db = self.write()?;
        let mut batch = WriteBatch::default();
        let id = next_id(&db, &mut batch, "ticket")?;
        let ticket = Ticket::from_draft(id, draft);
        batch.put_cf(
            cf(&db, schema::CF_TICKETS)?,
            schema::keys::ticket(id).as_bytes(),
            encode(&ticket)?,
        );
        db.write(batch)?;
        Ok(ticket)
    }

    fn get_ticket(&self, id: TicketId) -> StoreResult<Option<Ticket>> {
        let db = self.read()?;
        get(&db, schema::CF_TICKETS, &schema::keys::ticket(id))
    }

    fn list_tickets(&self, filter: &TicketFilter) -> StoreResult<Vec<Ticket>> {
        let db = self.read()?;
        let tickets: Vec<Ticket> = scan(&db, schema::CF_TICKETS, "ticket:")?;
        Ok(tickets.into_iter().filter(|t| filter.matches(t)).collect())
    }

    fn swap_assignment(
        &self,
        id: TicketId,
        expected: Assignment,
        next: Assignment,
        credit: Option<MemberId>,
    ) -> StoreResult<SwapOutcome> {
        let db = self.write()?;
        let ticket_key = schema::keys::ticket(id);

        let credited = match credit {
            Some(member_id) => Some(
                get::<Member>(&db, schema::CF_MEMBERS, &schema::keys::member(member_id))?
                    .ok_or_else(|| StoreError::NotFound(format!("member:{member_id}")))?,
            ),
            None => None,
        };

        let mut ticket: Ticket = get(&db, schema::CF_TICKETS, &ticket_key)?
            .ok_or_else(|| StoreError::NotFound(format!("ticket:{id}")))?;

        if ticket.assignment() != expected {
            return Ok(SwapOutcome::Stale(ticket));
        }
        ticket.set_assignment(next);

        let mut batch = WriteBatch::default();
        batch.put_cf(
            cf(&db, schema::CF_TICKETS)?,
            ticket_key.as_bytes(),
            encode(&ticket)?,
        );
        let solved_count = credited.as_ref().map(|member| member.solved_count + 1);
        if let Some(mut member) = credited {
            member.solved_count += 1;
            batch.put_cf(
                cf(&db, schema::CF_MEMBERS)?,
                schema::keys::member(member.id).as_bytes(),
                encode(&member)?,
            );
        }
        db.write(batch)?;

        Ok(SwapOutcome::Applied {
            ticket,
            solved_count,
        })
    }
}

impl RegistryStore for RocksStore {
    fn insert_team(&self, name: &str, category: Option<&str>) -> StoreResult<Team> {
        let db = self.write()?;
        let teams: Vec<Team> = scan(&db, schema::CF_TEAMS, "team:")?;
        if teams.iter().any(|t| t.name == name) {
            return Err(StoreError::Duplicate {
                field: "team.name",
                value: name.to_string(),
            });
        }

        let mut batch = WriteBatch::default();
        let id = next_id(&db, &mut batch, "team")?;
        let team = Team::new(id, name.to_string(), category.map(str::to_string));
        batch.put_cf(
            cf(&db, schema::CF_TEAMS)?,
            schema::keys::team(id).as_bytes(),
            encode(&team)?,
        );
        db.write(batch)?;
        Ok(team)
    }

    fn update_team_category(&self, id: TeamId, category: Option<&str>) -> StoreResult<Team> {
        let db = self.write()?;
        let key = schema::keys::team(id);
        let mut team: Team = get(&db, schema::CF_TEAMS, &key)?
            .ok_or_else(|| StoreError::NotFound(format!("team:{id}")))?;
        team.category = category.map(str::to_string);
        put(&db, schema::CF_TEAMS, &key, &team)?;
        Ok(team)
    }

    fn get_team(&self, id: TeamId) -> StoreResult<Option<Team>> {
        let db = self.read()?;
        get(&db, schema::CF_TEAMS, &schema::keys::team(id))
    }

    fn find_team_by_name(&self, name: &str) -> StoreResult<Option<Team>> {
        Ok(self.list_teams()?.into_iter().find(|t| t.name == name))
    }

    fn list_teams(&self) -> StoreResult<Vec<Team>> {
        let db = self.read()?;
        scan(&db, schema::CF_TEAMS, "team:")
    }

    fn insert_member(&self, draft: MemberDraft) -> StoreResult<Member> {
        let db = self.write()?;
        if get::<Team>(&db, schema::CF_TEAMS, &schema::keys::team(draft.team_id))?.is_none() {
            return Err(StoreError::NotFound(format!("team:{}", draft.team_id)));
        }

        let email_key = schema::keys::member_email(&draft.email);
        if get::<MemberId>(&db, schema::CF_META, &email_key)?.is_some() {
            return Err(StoreError::Duplicate {
                field: "member.email",
                value: draft.email,
            });
        }

        let mut batch = WriteBatch::default();
        let id = next_id(&db, &mut batch, "member")?;
        let member = Member::from_draft(id, draft);
        batch.put_cf(
            cf(&db, schema::CF_MEMBERS)?,
            schema::keys::member(id).as_bytes(),
            encode(&member)?,
        );
        batch.put_cf(cf(&db, schema::CF_META)?, email_key.as_bytes(), encode(&id)?);
        db.write(batch)?;
        Ok(member)
    }

    fn get_member(&self, id: MemberId) -> StoreResult<Option<Member>> {
        let db = self.read()?;
        get(&db, schema::CF_MEMBERS, &schema::keys::member(id))
    }

    fn find_member_by_email(&self, email: &str) -> StoreResult<Option<Member>> {
        let db = self.read()?;
        match get::<MemberId>(&db, schema::CF_META, &schema::keys::member_email(email))? {
            Some(id) => get(&db, schema::CF_MEMBERS, &schema::keys::member(id)),
            None => Ok(None),
        }
    }

    fn list_members(&self, team_id: TeamId) -> StoreResult<Vec<Member>> {
        let db = self.read()?;
        let members: Vec<Member> = scan(&db, schema::CF_MEMBERS, "member:")?;
        Ok(members.into_iter().filter(|m| m.team_id == team_id).collect())
    }

    fn set_member_status(&self, id: MemberId, status: MemberStatus) -> StoreResult<Member> {
        let db = self.write()?;
        let key = schema::keys::member(id);
        let mut member: Member = get(&db, schema::CF_MEMBERS, &key)?
            .ok_or_else(|| StoreError::NotFound(format!("member:{id}")))?;
        member.status = status;
        put(&db, schema::CF_MEMBERS, &key, &member)?;
        Ok(member)
    }
}

impl EventJournal for RocksStore {
    fn append_event(
        &self,
        timestamp_nanos: i64,
        event_id: &str,
        payload: &serde_json::Value,
    ) -> StoreResult<()> {
        let key = schema::keys::event(timestamp_nanos, event_id);
        let bytes =
            serde_json::to_vec(payload).map_err(|e| StoreError::Serialization(e.to_string()))?;

        let db = self.read()?;
        db.put_cf(cf(&db, schema::CF_EVENTS)?, key.as_bytes(), bytes)?;
        Ok(())
    }

    fn events_between(
        &self,
        start_nanos: i64,
        end_nanos: i64,
    ) -> StoreResult<Vec<(i64, serde_json::Value)>> {
        let db = self.read()?;
        let start_key = schema::keys::event(start_nanos, "");
        let iter = db.iterator_cf(
            cf(&db, schema::CF_EVENTS)?,
            rocksdb::IteratorMode::From(start_key.as_bytes(), rocksdb::Direction::Forward),
        );

        let mut events = Vec::new();
        for item in iter {
            let (key, value) = item?;
            let key_str = String::from_utf8(key.to_vec())
                .map_err(|e| StoreError::Deserialization(e.to_string()))?;

            if let Some(ts) = schema::keys::parse_event_timestamp(&key_str) {
                if ts > end_nanos {
                    break;
                }
                let payload = serde_json::from_slice(&value)
                    .map_err(|e| StoreError::Deserialization(e.to_string()))?;
                events.push((ts, payload));
            }
        }

        Ok(events)
    }
}
