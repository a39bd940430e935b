//! Helpdesk events
//!
//! Every committed state change (ticket created, picked, resolved, registry
//! edits) is announced on the [`EventBus`]. With a journal attached the bus
//! also persists events so [`EventHistory`] can replay them.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │   Engines    │────▶│  Event Bus   │────▶│  Subscribers │
//! │  (publish)   │     │  (broadcast) │     │   (recv)     │
//! └──────────────┘     └──────┬───────┘     └──────────────┘
//!                             │
//!                             ▼
//!                      ┌──────────────┐
//!                      │   Journal    │
//!                      └──────────────┘
//! ```

pub mod bus;
pub mod history;
pub mod types;

pub use bus::{
    EventBus, EventBusError, EventBusResult, EventFilter, FilteredReceiver, SharedEventBus,
};
pub use history::{EventHistory, HistoryError, HistoryResult};
pub use types::{DeskEvent, EventId};
