//! Error types for the session layer.

use brainfreeze_protocol::{ConnectionId, GameType, SessionId};

/// Errors that can occur when talking to a session.
///
/// All of these are recoverable: the caller reports them to the offending
/// connection and carries on. None of them affect other participants.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The connection is not a (still connected) participant.
    #[error("{0} is not a participant of session {1}")]
    NotAParticipant(ConnectionId, SessionId),

    /// The session already resolved; late and duplicate results are dropped.
    #[error("session {0} has already ended")]
    AlreadyTerminal(SessionId),

    /// The result belongs to a different game than the session is playing.
    #[error("session {session} is playing {expected}, not {got}")]
    ResultMismatch {
        session: SessionId,
        expected: GameType,
        got: GameType,
    },

    /// The session actor is gone or its command queue is closed.
    #[error("session {0} is unavailable")]
    Unavailable(SessionId),
}
