//! The connection registry: every live connection and where it is.
//!
//! The registry is the single source of truth for membership. Lobbies and
//! sessions keep their own member lists for broadcasting, but whether a
//! connection *may* join, leave, or be promoted is always decided here,
//! under one lock. That is what keeps the "one place at a time" rule from
//! racing: a countdown promoting a lobby and a player leaving it both go
//! through the same mutex, and whichever gets there second sees the
//! other's result.
//!
//! # Lifecycle of an entry
//!
//! ```text
//! register() ──→ [None] ──enter_lobby()──→ [Lobby(kind)]
//!                  ↑  ↑                        │      │
//!                  │  └───────leave_lobby()────┘      │ promote()
//!                  │                                  ▼
//!                  └──────────release()──────── [Session(id)]
//!
//! remove() from any state ──→ gone (returns the last membership)
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use brainfreeze_protocol::{ConnectionId, LobbyKind, SessionId, UserId};
use tokio::sync::{Mutex, mpsc};

use crate::RegistryError;

/// One encoded message, shared by every recipient of a broadcast.
pub type Frame = Arc<[u8]>;

/// Channel sender for delivering encoded frames to a connection's writer.
///
/// Unbounded so that actors never wait on a slow client: a full socket
/// buffer stalls only that client's writer task.
pub type ConnectionSender = mpsc::UnboundedSender<Frame>;

/// Where a connection currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// Connected, but in no lobby or session.
    None,
    /// Waiting in the lobby of this kind.
    Lobby(LobbyKind),
    /// Playing in this session.
    Session(SessionId),
}

impl fmt::Display for Membership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "no lobby"),
            Self::Lobby(kind) => write!(f, "lobby {kind}"),
            Self::Session(id) => write!(f, "session {id}"),
        }
    }
}

struct Entry {
    membership: Membership,
    sender: ConnectionSender,
    user: Option<UserId>,
}

/// Tracks every live connection, its membership, and its outbound channel.
///
/// Shared as `Arc<Registry>`; all methods take `&self`. Each method holds
/// the internal lock only for its own duration and never across an
/// `.await` on anything else, so callers can't deadlock through it.
pub struct Registry {
    entries: Mutex<HashMap<ConnectionId, Entry>>,
    next_id: AtomicU64,
}

impl Registry {
    /// Creates an empty registry. Connection ids start at 1.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers a new connection and returns its id. Always succeeds.
    pub async fn register(&self, sender: ConnectionSender) -> ConnectionId {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.lock().await.insert(
            id,
            Entry {
                membership: Membership::None,
                sender,
                user: None,
            },
        );
        tracing::debug!(conn_id = %id, "connection registered");
        id
    }

    /// Removes a connection, returning the membership it had.
    ///
    /// Returns `None` if the connection was already removed, so calling
    /// this twice is harmless.
    pub async fn remove(&self, id: ConnectionId) -> Option<Membership> {
        let entry = self.entries.lock().await.remove(&id)?;
        tracing::debug!(conn_id = %id, membership = %entry.membership, "connection removed");
        Some(entry.membership)
    }

    /// Returns the connection's membership, or `None` if it is gone.
    pub async fn membership(&self, id: ConnectionId) -> Option<Membership> {
        self.entries.lock().await.get(&id).map(|e| e.membership)
    }

    /// Moves a free connection into a lobby.
    ///
    /// # Errors
    /// - [`RegistryError::AlreadyMember`] if it is in a lobby or session
    /// - [`RegistryError::ConnectionGone`] if it is not registered
    pub async fn enter_lobby(&self, id: ConnectionId, kind: LobbyKind) -> Result<(), RegistryError> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get_mut(&id).ok_or(RegistryError::ConnectionGone(id))?;
        match entry.membership {
            Membership::None => {
                entry.membership = Membership::Lobby(kind);
                Ok(())
            }
            other => Err(RegistryError::AlreadyMember(id, other)),
        }
    }

    /// Takes a connection out of its lobby and returns which lobby it was.
    ///
    /// # Errors
    /// - [`RegistryError::NotInLobby`] if it is free or already promoted
    /// - [`RegistryError::ConnectionGone`] if it is not registered
    pub async fn leave_lobby(&self, id: ConnectionId) -> Result<LobbyKind, RegistryError> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get_mut(&id).ok_or(RegistryError::ConnectionGone(id))?;
        match entry.membership {
            Membership::Lobby(kind) => {
                entry.membership = Membership::None;
                Ok(kind)
            }
            _ => Err(RegistryError::NotInLobby(id)),
        }
    }

    /// Atomically moves lobby members into a session.
    ///
    /// Only candidates still registered *and* still in lobby `kind` are
    /// promoted; anyone who left or disconnected a moment earlier is
    /// skipped. Returns the promoted connections, in candidate order,
    /// paired with the user they identified as.
    pub async fn promote(
        &self,
        kind: LobbyKind,
        candidates: &[ConnectionId],
        session: SessionId,
    ) -> Vec<(ConnectionId, Option<UserId>)> {
        let mut entries = self.entries.lock().await;
        let mut promoted = Vec::with_capacity(candidates.len());
        for id in candidates {
            let Some(entry) = entries.get_mut(id) else {
                continue;
            };
            if entry.membership == Membership::Lobby(kind) {
                entry.membership = Membership::Session(session);
                promoted.push((*id, entry.user));
            }
        }
        tracing::debug!(
            lobby = %kind,
            %session,
            candidates = candidates.len(),
            promoted = promoted.len(),
            "lobby members promoted"
        );
        promoted
    }

    /// Frees every listed connection that is still in `session`.
    pub async fn release(&self, ids: &[ConnectionId], session: SessionId) {
        let mut entries = self.entries.lock().await;
        for id in ids {
            if let Some(entry) = entries.get_mut(id) {
                if entry.membership == Membership::Session(session) {
                    entry.membership = Membership::None;
                }
            }
        }
    }

    /// Binds a connection to a user record.
    ///
    /// # Errors
    /// Returns [`RegistryError::ConnectionGone`] if it is not registered.
    pub async fn identify(&self, id: ConnectionId, user: UserId) -> Result<(), RegistryError> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get_mut(&id).ok_or(RegistryError::ConnectionGone(id))?;
        entry.user = Some(user);
        Ok(())
    }

    /// The user a connection identified as, if any.
    pub async fn user(&self, id: ConnectionId) -> Option<UserId> {
        self.entries.lock().await.get(&id).and_then(|e| e.user)
    }

    /// Number of live connections.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Returns `true` if no connections are registered.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Runs `f` with each listed, still-registered connection's sender
    /// under a single lock acquisition.
    pub(crate) async fn with_senders<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a ConnectionId>,
        mut f: impl FnMut(ConnectionId, &ConnectionSender),
    ) {
        let entries = self.entries.lock().await;
        for id in ids {
            if let Some(entry) = entries.get(id) {
                f(*id, &entry.sender);
            }
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
