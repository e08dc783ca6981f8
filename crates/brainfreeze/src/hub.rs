//! The coordination facade connection handlers talk to.
//!
//! Every client request goes through [`Hub`]: it checks and updates the
//! connection's membership in the registry, then forwards the request to
//! the lobby or session actor that owns the affected state.

use std::sync::Arc;

use brainfreeze_lobby::{LobbyConfig, LobbyManager};
use brainfreeze_protocol::{ClientMessage, ConnectionId, GameType, LobbyKind, Submission, UserId};
use brainfreeze_registry::{ConnectionSender, Gateway, Membership, Registry, RegistryError};
use brainfreeze_session::{SessionConfig, SessionManager};
use tokio::sync::mpsc;

use crate::recorder::run_recorder;
use crate::{BrainfreezeError, RecordStore};

/// Shared coordination state: registry, lobbies, sessions, and store.
///
/// Cheap to clone; every clone talks to the same actors.
pub struct Hub<S> {
    registry: Arc<Registry>,
    gateway: Gateway,
    lobbies: LobbyManager,
    sessions: SessionManager,
    store: Arc<S>,
}

impl<S> Clone for Hub<S> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            gateway: self.gateway.clone(),
            lobbies: self.lobbies.clone(),
            sessions: self.sessions.clone(),
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: RecordStore> Hub<S> {
    /// Creates the hub and spawns the task that records finished sessions.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(lobby_config: LobbyConfig, session_config: SessionConfig, store: S) -> Self {
        let store = Arc::new(store);
        let registry = Arc::new(Registry::new());
        let gateway = Gateway::new(Arc::clone(&registry));

        let (reports_tx, reports_rx) = mpsc::unbounded_channel();
        let sessions = SessionManager::with_reports(gateway.clone(), session_config, reports_tx);
        let lobbies = LobbyManager::new(lobby_config, gateway.clone(), sessions.clone());
        tokio::spawn(run_recorder(Arc::clone(&store), reports_rx));

        Self {
            registry,
            gateway,
            lobbies,
            sessions,
            store,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn lobbies(&self) -> &LobbyManager {
        &self.lobbies
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Registers a new connection. Frames for it arrive on `sender`'s
    /// receiving half.
    pub async fn register(&self, sender: ConnectionSender) -> ConnectionId {
        self.registry.register(sender).await
    }

    /// Runs the disconnect path: forget the connection, then take it out
    /// of whatever lobby or session it was in. Safe to call twice.
    pub async fn unregister(&self, conn: ConnectionId) {
        // Removing the registry entry first means no later broadcast can
        // reach this connection, and no promotion can pick it up.
        let Some(membership) = self.registry.remove(conn).await else {
            return;
        };

        match membership {
            Membership::None => {}
            Membership::Lobby(kind) => {
                if let Err(e) = self.lobbies.leave(kind, conn).await {
                    tracing::debug!(conn_id = %conn, error = %e, "lobby leave on disconnect failed");
                }
            }
            Membership::Session(session_id) => {
                if let Err(e) = self.sessions.disconnect(session_id, conn).await {
                    tracing::debug!(conn_id = %conn, %session_id, error = %e, "session already gone on disconnect");
                }
            }
        }
    }

    /// Puts a connection into the lobby for `game`, or the mixed lobby.
    pub async fn join_lobby(
        &self,
        conn: ConnectionId,
        game: Option<GameType>,
    ) -> Result<(), BrainfreezeError> {
        let kind = LobbyKind::from(game);
        self.registry.enter_lobby(conn, kind).await?;

        if let Err(e) = self.lobbies.join(kind, conn).await {
            // Roll back so the connection isn't stuck half-joined.
            let _ = self.registry.leave_lobby(conn).await;
            return Err(e.into());
        }
        Ok(())
    }

    /// Takes a connection out of its lobby. Not being in one is a no-op.
    pub async fn leave_lobby(&self, conn: ConnectionId) -> Result<(), BrainfreezeError> {
        match self.registry.leave_lobby(conn).await {
            Ok(kind) => {
                self.lobbies.leave(kind, conn).await?;
                Ok(())
            }
            Err(RegistryError::NotInLobby(_)) => {
                tracing::debug!(conn_id = %conn, "leave_lobby while not in a lobby");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Hands a result to the session the connection is playing in.
    pub async fn submit_result(
        &self,
        conn: ConnectionId,
        submission: Submission,
    ) -> Result<(), BrainfreezeError> {
        match self.registry.membership(conn).await {
            Some(Membership::Session(session_id)) => {
                self.sessions.submit(session_id, conn, submission).await?;
                Ok(())
            }
            Some(_) => Err(BrainfreezeError::NotAParticipant(conn)),
            None => Err(RegistryError::ConnectionGone(conn).into()),
        }
    }

    /// Binds a connection to a user record so its results get stored.
    ///
    /// Unknown users are logged and otherwise ignored.
    pub async fn identify(&self, conn: ConnectionId, user: UserId) -> Result<(), BrainfreezeError> {
        match self.store.find_user(user).await? {
            Some(record) => {
                self.registry.identify(conn, record.id).await?;
                tracing::info!(conn_id = %conn, user_id = %record.id, username = %record.username, "connection identified");
            }
            None => {
                tracing::debug!(conn_id = %conn, user_id = %user, "identify for unknown user ignored");
            }
        }
        Ok(())
    }

    /// Routes one decoded client message.
    pub async fn handle(&self, conn: ConnectionId, msg: ClientMessage) -> Result<(), BrainfreezeError> {
        match msg {
            ClientMessage::JoinLobby { game } => self.join_lobby(conn, game).await,
            ClientMessage::LeaveLobby => self.leave_lobby(conn).await,
            ClientMessage::Identify { user_id } => self.identify(conn, user_id).await,
            result => match result.submission() {
                Some(submission) => self.submit_result(conn, submission).await,
                None => Ok(()),
            },
        }
    }
}
