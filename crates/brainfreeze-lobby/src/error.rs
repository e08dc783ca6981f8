//! Error types for the lobby layer.

use brainfreeze_protocol::{ConnectionId, LobbyKind};

/// Errors that can occur during lobby operations.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    /// The connection is already waiting in this lobby.
    #[error("{0} is already in lobby {1}")]
    AlreadyMember(ConnectionId, LobbyKind),

    /// The lobby's command channel is full or closed.
    #[error("lobby {0} is unavailable")]
    Unavailable(LobbyKind),
}
