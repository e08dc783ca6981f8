//! Connection tracking for Brainfreeze.
//!
//! This crate answers two questions for the layers above it:
//!
//! 1. **Where is this connection?** ([`Registry`]) Every live connection
//!    has exactly one [`Membership`]: nowhere, waiting in a lobby, or
//!    playing in a session.
//! 2. **How do I reach it?** ([`Gateway`]) The only code path that
//!    writes to client connections. Lobbies and sessions hand it
//!    connection ids and a message; it encodes once and fans out.
//!
//! # How it fits in the stack
//!
//! ```text
//! Lobby / Session actors (above)  ← move connections between memberships
//!     ↕
//! Registry layer (this crate)     ← membership + outbound channels
//!     ↕
//! Protocol layer (below)          ← ConnectionId, ServerMessage, JsonCodec
//! ```

mod error;
mod gateway;
mod registry;

pub use error::RegistryError;
pub use gateway::Gateway;
pub use registry::{ConnectionSender, Frame, Membership, Registry};
