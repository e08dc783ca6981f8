//! Unified error type for the Brainfreeze server.

use brainfreeze_lobby::LobbyError;
use brainfreeze_protocol::{ConnectionId, ProtocolError};
use brainfreeze_registry::RegistryError;
use brainfreeze_session::SessionError;
use brainfreeze_transport::TransportError;

use crate::StoreError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impl, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum BrainfreezeError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A membership change the registry refused.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A lobby refused the request or is gone.
    #[error(transparent)]
    Lobby(#[from] LobbyError),

    /// A session refused the result or is gone.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The record store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A result arrived from a connection that is not playing.
    #[error("{0} is not a participant of any session")]
    NotAParticipant(ConnectionId),
}
