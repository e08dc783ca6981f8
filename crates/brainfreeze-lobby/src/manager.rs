//! Lobby manager: creates lobbies on first use and routes players to them.

use std::collections::HashMap;
use std::sync::Arc;

use brainfreeze_protocol::{ConnectionId, LobbyKind};
use brainfreeze_registry::Gateway;
use brainfreeze_session::SessionManager;
use tokio::sync::Mutex;

use crate::lobby::spawn_lobby;
use crate::{LobbyConfig, LobbyError, LobbyHandle, LobbyInfo};

/// Manages the lobbies, one per [`LobbyKind`].
///
/// A lobby is spawned on its first join and lives for the rest of the
/// process. Cheap to clone: every clone shares the same lobby table.
#[derive(Clone)]
pub struct LobbyManager {
    inner: Arc<Inner>,
}

struct Inner {
    lobbies: Mutex<HashMap<LobbyKind, LobbyHandle>>,
    config: LobbyConfig,
    gateway: Gateway,
    sessions: SessionManager,
}

impl LobbyManager {
    /// Creates a manager with no lobbies yet.
    pub fn new(config: LobbyConfig, gateway: Gateway, sessions: SessionManager) -> Self {
        Self {
            inner: Arc::new(Inner {
                lobbies: Mutex::new(HashMap::new()),
                config: config.validated(),
                gateway,
                sessions,
            }),
        }
    }

    /// The validated configuration every lobby runs with.
    pub fn config(&self) -> &LobbyConfig {
        &self.inner.config
    }

    /// Adds a connection to lobby `kind`, creating the lobby if needed.
    /// Returns the lobby's new member count.
    ///
    /// The caller is responsible for the registry side of the membership
    /// change; this only updates the lobby's own member list.
    pub async fn join(&self, kind: LobbyKind, conn: ConnectionId) -> Result<usize, LobbyError> {
        self.get_or_spawn(kind).await.join(conn).await
    }

    /// Removes a connection from lobby `kind`. Returns whether it was a
    /// member; leaving a lobby that was never created is a no-op.
    pub async fn leave(&self, kind: LobbyKind, conn: ConnectionId) -> Result<bool, LobbyError> {
        match self.handle(kind).await {
            Some(handle) => handle.leave(conn).await,
            None => Ok(false),
        }
    }

    /// Returns info about lobby `kind`, if it has been created.
    pub async fn info(&self, kind: LobbyKind) -> Option<LobbyInfo> {
        self.handle(kind).await?.info().await.ok()
    }

    /// Number of lobbies created so far.
    pub async fn lobby_count(&self) -> usize {
        self.inner.lobbies.lock().await.len()
    }

    async fn handle(&self, kind: LobbyKind) -> Option<LobbyHandle> {
        self.inner.lobbies.lock().await.get(&kind).cloned()
    }

    async fn get_or_spawn(&self, kind: LobbyKind) -> LobbyHandle {
        let mut lobbies = self.inner.lobbies.lock().await;
        lobbies
            .entry(kind)
            .or_insert_with(|| {
                tracing::info!(lobby = %kind, "lobby created");
                spawn_lobby(
                    kind,
                    self.inner.config.clone(),
                    self.inner.gateway.clone(),
                    self.inner.sessions.clone(),
                )
            })
            .clone()
    }
}
