//! Session manager: starts sessions and routes results to them.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use brainfreeze_protocol::{ConnectionId, GameType, LobbyKind, SessionId, Submission};
use brainfreeze_registry::Gateway;
use tokio::sync::{Mutex, mpsc};

use crate::session::session_actor;
use crate::{Participant, Round, SessionConfig, SessionError, SessionHandle, SessionInfo, SessionReport};

/// The outcome of [`SessionManager::start`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedSession {
    pub session_id: SessionId,
    pub game: GameType,
    /// The promoted connections, in join order.
    pub participants: Vec<ConnectionId>,
}

/// Tracks every running session.
///
/// Cheap to clone: every clone shares the same session table. A session
/// actor removes itself from the table when it stops, so resolved
/// sessions are dropped without any sweeping.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

struct Inner {
    sessions: Arc<Mutex<HashMap<SessionId, SessionHandle>>>,
    next_id: AtomicU64,
    gateway: Gateway,
    config: SessionConfig,
    reports: Option<mpsc::UnboundedSender<SessionReport>>,
}

impl SessionManager {
    /// Creates a manager whose sessions deliver through `gateway`.
    pub fn new(gateway: Gateway, config: SessionConfig) -> Self {
        Self::build(gateway, config, None)
    }

    /// Like [`new`](Self::new), but every resolved session also sends its
    /// [`SessionReport`] to `reports`.
    pub fn with_reports(
        gateway: Gateway,
        config: SessionConfig,
        reports: mpsc::UnboundedSender<SessionReport>,
    ) -> Self {
        Self::build(gateway, config, Some(reports))
    }

    fn build(
        gateway: Gateway,
        config: SessionConfig,
        reports: Option<mpsc::UnboundedSender<SessionReport>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                sessions: Arc::new(Mutex::new(HashMap::new())),
                next_id: AtomicU64::new(1),
                gateway,
                config,
                reports,
            }),
        }
    }

    /// Promotes the members of lobby `kind` into a new session of `game`.
    ///
    /// Promotion happens in the registry, under its lock, so only
    /// candidates still waiting in `kind` become participants. The new
    /// session is in the table before this returns and before anyone can
    /// observe the promotion, so a disconnect racing the start always
    /// finds it. Returns `None` if nobody was left to promote.
    pub async fn start(
        &self,
        kind: LobbyKind,
        game: GameType,
        candidates: &[ConnectionId],
    ) -> Option<StartedSession> {
        let mut sessions = self.inner.sessions.lock().await;

        let session_id = SessionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let promoted = self
            .inner
            .gateway
            .registry()
            .promote(kind, candidates, session_id)
            .await;
        if promoted.is_empty() {
            return None;
        }

        let participants: Vec<Participant> = promoted
            .into_iter()
            .map(|(conn, user)| Participant { conn, user })
            .collect();
        let ids = participants.iter().map(|p| p.conn).collect();

        let round = Round::new(session_id, game, participants);
        let (actor, handle) = session_actor(
            round,
            self.inner.gateway.clone(),
            self.inner.config.result_timeout,
            self.inner.reports.clone(),
            self.inner.config.channel_size,
        );
        sessions.insert(session_id, handle);

        let table = Arc::clone(&self.inner.sessions);
        tokio::spawn(async move {
            actor.run().await;
            table.lock().await.remove(&session_id);
        });

        Some(StartedSession {
            session_id,
            game,
            participants: ids,
        })
    }

    /// Routes a result submission to a session.
    pub async fn submit(
        &self,
        session_id: SessionId,
        conn: ConnectionId,
        submission: Submission,
    ) -> Result<(), SessionError> {
        self.handle(session_id).await?.submit(conn, submission).await
    }

    /// Tells a session one of its participants disconnected.
    pub async fn disconnect(&self, session_id: SessionId, conn: ConnectionId) -> Result<(), SessionError> {
        self.handle(session_id).await?.disconnect(conn).await
    }

    /// Returns info about a running session.
    pub async fn info(&self, session_id: SessionId) -> Result<SessionInfo, SessionError> {
        self.handle(session_id).await?.info().await
    }

    /// Number of running sessions.
    pub async fn session_count(&self) -> usize {
        self.inner.sessions.lock().await.len()
    }

    /// Clones the handle out so the table lock is not held while the
    /// actor processes the command.
    async fn handle(&self, session_id: SessionId) -> Result<SessionHandle, SessionError> {
        self.inner
            .sessions
            .lock()
            .await
            .get(&session_id)
            .cloned()
            .ok_or(SessionError::Unavailable(session_id))
    }
}
