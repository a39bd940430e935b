//! State persistence for tickets, teams, and members
//!
//! The engines depend only on the repository traits in [`store`]:
//!
//! - [`TicketStore`]: ticket insertion with atomic sequence allocation,
//!   filtered queries, and compare-and-swap on assignment state
//! - [`RegistryStore`]: teams and members with unique-name / unique-email
//!   constraints
//! - [`EventJournal`]: append-only event history for replay
//!
//! Two backends implement all three:
//!
//! - [`MemoryStore`]: a single `RwLock` over ordered maps (default)
//! - `RocksStore`: RocksDB column families (`heavy-state` feature)
//!
//! # Usage
//!
//! ```
//! use ticketing::state::{MemoryStore, TicketDraft, TicketStore, DEFAULT_CONFIDENTIALITY};
//!
//! let store = MemoryStore::new();
//! let ticket = store
//!     .insert_ticket(TicketDraft {
//!         sender_id: "whatsapp:+15550001".to_string(),
//!         text: "My card was charged twice".to_string(),
//!         category: "Billing".to_string(),
//!         routing_team: "Billing".to_string(),
//!         confidentiality: DEFAULT_CONFIDENTIALITY,
//!     })
//!     .unwrap();
//! assert_eq!(ticket.id, 1);
//! ```

pub mod memory;
#[cfg(feature = "heavy-state")]
pub mod rocks;
pub mod schema;
pub mod store;
pub mod types;

pub use memory::MemoryStore;
#[cfg(feature = "heavy-state")]
pub use rocks::RocksStore;
pub use store::{
    DeskStore, EventJournal, RegistryStore, SharedJournal, SharedStore, StoreError, StoreResult,
    SwapOutcome, TicketStore,
};
pub use types::*;
