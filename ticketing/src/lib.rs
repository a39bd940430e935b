//! Helpdesk ticket engine
//!
//! Turns inbound support messages into tracked tickets and moves them
//! through a strictly linear lifecycle:
//!
//! - [`intake`]: classify a message, route it to the owning team, persist a
//!   Pending ticket, and hand back the acknowledgement text
//! - [`router`]: classifier gateway, category → team routing table, and the
//!   configured category catalog
//! - [`assignment`]: pick / resolve with compare-and-swap commits, plus
//!   team and personal queues
//! - [`registry`]: teams, members, and member presence
//! - [`events`]: broadcast of committed changes with an optional journal
//! - [`state`]: repository traits with in-memory and RocksDB backends
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use ticketing::assignment::{AssignmentEngine, AssignmentPolicy};
//! use ticketing::intake::{IntakeConfig, IntakeEngine};
//! use ticketing::registry::TeamRegistry;
//! use ticketing::router::{KeywordClassifier, KeywordRule};
//! use ticketing::state::{MemberDraft, MemoryStore, SharedStore, TicketStatus};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ticketing::DeskError> {
//! let store: SharedStore = Arc::new(MemoryStore::new());
//! let registry = TeamRegistry::new(store.clone());
//! let finance = registry.create_team("Finance", Some("Billing"))?;
//! let dana = registry.add_member(MemberDraft {
//!     team_id: finance.id,
//!     name: "Dana".to_string(),
//!     email: "dana@desk.io".to_string(),
//!     role: "agent".to_string(),
//! })?;
//!
//! let classifier = KeywordClassifier::new(vec![KeywordRule::new("Billing", &["invoice"])]);
//! let intake = IntakeEngine::new(store.clone(), Arc::new(classifier), IntakeConfig::default());
//! let receipt = intake.ingest("sms:+15550001", "Wrong invoice total").await?;
//! assert_eq!(receipt.routing_team, "Finance");
//!
//! let assignment = AssignmentEngine::new(store, AssignmentPolicy::default());
//! assignment.pick(receipt.ticket_id, dana.id)?;
//! let ticket = assignment.resolve(receipt.ticket_id, dana.id)?;
//! assert_eq!(ticket.status, TicketStatus::Solved);
//! # Ok(())
//! # }
//! ```

pub mod assignment;
pub mod error;
pub mod events;
pub mod intake;
pub mod registry;
pub mod router;
pub mod state;

pub use error::{DeskError, DeskResult, Entity, StructuredError};
