//! Lobbies for Brainfreeze.
//!
//! One lobby per game plus a mixed lobby. Each lobby runs as an isolated
//! Tokio task (actor model) that owns its member list and its start
//! countdown. When the countdown reaches zero the lobby hands its
//! members to the session layer and starts over, empty.
//!
//! # Key types
//!
//! - [`LobbyManager`]: creates lobbies on first use and routes joins/leaves
//! - [`LobbyHandle`]: send commands to a running lobby actor
//! - [`LobbyState`]: idle or counting down
//! - [`LobbyConfig`]: minimum players and countdown length

mod config;
mod error;
mod lobby;
mod manager;

pub use config::{LobbyConfig, LobbyState};
pub use error::LobbyError;
pub use lobby::{LobbyHandle, LobbyInfo};
pub use manager::LobbyManager;
