//! Helpdesk MCP server
//!
//! Wraps the [`ticketing`] engines in an MCP tool surface served over stdio:
//!
//! - [`config`]: layered TOML / environment / CLI configuration
//! - [`classifier`]: HTTP gateway to a remote category model
//! - [`desk`]: store, event bus, and engine wiring
//! - [`server`]: the `#[tool_router]` handler

pub mod classifier;
pub mod config;
pub mod desk;
pub mod server;

pub use config::DeskConfig;
pub use desk::Desk;
pub use server::DeskServer;
