//! Error types for the registry layer.

use brainfreeze_protocol::ConnectionId;

use crate::Membership;

/// Errors returned when a membership change is not allowed.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The connection already belongs to a lobby or a session.
    /// A connection is in at most one place at a time.
    #[error("{0} is already in {1}")]
    AlreadyMember(ConnectionId, Membership),

    /// The connection is not waiting in any lobby.
    #[error("{0} is not in a lobby")]
    NotInLobby(ConnectionId),

    /// The connection is no longer registered.
    #[error("{0} is gone")]
    ConnectionGone(ConnectionId),
}
