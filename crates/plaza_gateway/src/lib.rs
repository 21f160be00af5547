//! HTTP and WebSocket boundary of the Plaza game.
//!
//! The floor tracker posts observation sets, display clients post manual
//! votes and listen for publications. Everything inbound becomes a command
//! for the game coordinator.

pub mod server;
pub mod types;

pub use server::GatewayServer;
pub use types::{GatewayResponse, InboundMessage, ZoneClickRequest};
