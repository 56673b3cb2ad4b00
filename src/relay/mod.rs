//! Online play relay
//!
//! Two peers share a room; the room keeps the authoritative board, validates
//! each move against it and rebroadcasts accepted moves to both seats.
//! Socket transport is left to the embedding application: [`RelayServer`]
//! consumes decoded messages and returns addressed replies.

pub mod protocol;
pub mod room;
pub mod server;

pub use protocol::{
    ClientMessage, GameOverReason, MoveRecord, ProtocolError, ServerMessage, Snapshot, WireColor,
    Winner,
};
pub use room::{ClientId, Room};
pub use server::{Outbound, RelayConfig, RelayServer};
