//! Lobby actor: an isolated Tokio task that owns one lobby's members and
//! its start countdown.
//!
//! Joins, leaves, and countdown steps all pass through one `select!`
//! loop, so every `update_users` count and every `countdown` value a
//! client sees reflects the same, current member list.

use brainfreeze_countdown::{Countdown, CountdownStep};
use brainfreeze_protocol::{ConnectionId, GameType, LobbyKind, ServerMessage};
use brainfreeze_registry::Gateway;
use brainfreeze_session::SessionManager;
use rand::Rng;
use tokio::sync::{mpsc, oneshot};

use crate::{LobbyConfig, LobbyError, LobbyState};

/// Commands sent to a lobby actor through its channel.
pub(crate) enum LobbyCommand {
    /// Add a connection. Replies with the new member count.
    Join {
        conn: ConnectionId,
        reply: oneshot::Sender<Result<usize, LobbyError>>,
    },

    /// Remove a connection. Replies whether it was a member.
    Leave {
        conn: ConnectionId,
        reply: oneshot::Sender<bool>,
    },

    /// Request the current lobby info.
    GetInfo { reply: oneshot::Sender<LobbyInfo> },
}

/// A snapshot of a lobby.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbyInfo {
    pub kind: LobbyKind,
    pub state: LobbyState,
    /// Members in join order.
    pub members: Vec<ConnectionId>,
}

impl LobbyInfo {
    /// Number of waiting members.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

/// Handle to a running lobby actor.
///
/// This is cheap to clone; it's just an `mpsc::Sender` wrapper.
#[derive(Clone)]
pub struct LobbyHandle {
    kind: LobbyKind,
    sender: mpsc::Sender<LobbyCommand>,
}

impl LobbyHandle {
    /// Returns the lobby's kind.
    pub fn kind(&self) -> LobbyKind {
        self.kind
    }

    /// Sends a join request and returns the new member count.
    pub async fn join(&self, conn: ConnectionId) -> Result<usize, LobbyError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(LobbyCommand::Join {
                conn,
                reply: reply_tx,
            })
            .await
            .map_err(|_| LobbyError::Unavailable(self.kind))?;
        reply_rx.await.map_err(|_| LobbyError::Unavailable(self.kind))?
    }

    /// Sends a leave request. Returns whether the connection was a member.
    pub async fn leave(&self, conn: ConnectionId) -> Result<bool, LobbyError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(LobbyCommand::Leave {
                conn,
                reply: reply_tx,
            })
            .await
            .map_err(|_| LobbyError::Unavailable(self.kind))?;
        reply_rx.await.map_err(|_| LobbyError::Unavailable(self.kind))
    }

    /// Requests the current lobby info.
    pub async fn info(&self) -> Result<LobbyInfo, LobbyError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(LobbyCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| LobbyError::Unavailable(self.kind))?;
        reply_rx.await.map_err(|_| LobbyError::Unavailable(self.kind))
    }
}

/// The internal lobby actor state. Runs inside a Tokio task.
struct LobbyActor {
    kind: LobbyKind,
    config: LobbyConfig,
    /// Join order; only used for display.
    members: Vec<ConnectionId>,
    countdown: Countdown,
    gateway: Gateway,
    sessions: SessionManager,
    receiver: mpsc::Receiver<LobbyCommand>,
}

impl LobbyActor {
    /// Runs the actor loop until every handle is dropped.
    async fn run(mut self) {
        tracing::info!(lobby = %self.kind, "lobby actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => self.handle(cmd).await,
                    None => break,
                },
                step = self.countdown.wait_for_step() => match step {
                    CountdownStep::Tick { remaining } => {
                        tracing::trace!(lobby = %self.kind, remaining, "countdown tick");
                        self.broadcast(&ServerMessage::Countdown { seconds: remaining }).await;
                    }
                    CountdownStep::Elapsed => self.promote().await,
                },
            }
        }

        tracing::info!(lobby = %self.kind, "lobby actor stopped");
    }

    async fn handle(&mut self, cmd: LobbyCommand) {
        match cmd {
            LobbyCommand::Join { conn, reply } => {
                let result = self.handle_join(conn).await;
                let _ = reply.send(result);
            }
            LobbyCommand::Leave { conn, reply } => {
                let removed = self.handle_leave(conn).await;
                let _ = reply.send(removed);
            }
            LobbyCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
        }
    }

    async fn handle_join(&mut self, conn: ConnectionId) -> Result<usize, LobbyError> {
        if self.members.contains(&conn) {
            return Err(LobbyError::AlreadyMember(conn, self.kind));
        }

        self.members.push(conn);
        let players = self.members.len();
        tracing::info!(lobby = %self.kind, conn_id = %conn, players, "player joined lobby");
        self.broadcast(&ServerMessage::UpdateUsers { player_count: players }).await;

        // Eligibility: enough members and no countdown already running.
        if players >= self.config.min_players && !self.countdown.is_running() {
            let seconds = self.countdown.start();
            tracing::info!(lobby = %self.kind, players, seconds, "countdown started");
            self.broadcast(&ServerMessage::Countdown { seconds }).await;
        }

        Ok(players)
    }

    async fn handle_leave(&mut self, conn: ConnectionId) -> bool {
        let Some(pos) = self.members.iter().position(|c| *c == conn) else {
            return false;
        };
        self.members.remove(pos);
        let players = self.members.len();
        tracing::info!(lobby = %self.kind, conn_id = %conn, players, "player left lobby");

        if players > 0 {
            self.broadcast(&ServerMessage::UpdateUsers { player_count: players }).await;
        }
        if players < self.config.min_players && self.countdown.cancel() {
            tracing::info!(lobby = %self.kind, players, "countdown cancelled");
            self.broadcast(&ServerMessage::CountdownCancelled).await;
        }
        true
    }

    /// Countdown reached zero: freeze the member list into a session.
    async fn promote(&mut self) {
        let game = self.draw_game();
        let candidates = std::mem::take(&mut self.members);

        match self.sessions.start(self.kind, game, &candidates).await {
            Some(started) => {
                tracing::info!(
                    lobby = %self.kind,
                    session_id = %started.session_id,
                    %game,
                    players = started.participants.len(),
                    "lobby promoted to session"
                );
                self.gateway
                    .broadcast(&started.participants, &ServerMessage::GameStart { game })
                    .await;
            }
            None => {
                tracing::debug!(lobby = %self.kind, "countdown elapsed with nobody left to promote");
            }
        }
    }

    /// The game to start. The mixed lobby draws one at random.
    fn draw_game(&self) -> GameType {
        match self.kind {
            LobbyKind::Game(game) => game,
            LobbyKind::Mixed => {
                let i = rand::rng().random_range(0..GameType::ALL.len());
                GameType::ALL[i]
            }
        }
    }

    async fn broadcast(&self, msg: &ServerMessage) {
        self.gateway.broadcast(&self.members, msg).await;
    }

    fn info(&self) -> LobbyInfo {
        LobbyInfo {
            kind: self.kind,
            state: match self.countdown.remaining() {
                Some(remaining) => LobbyState::CountingDown { remaining },
                None => LobbyState::Idle,
            },
            members: self.members.clone(),
        }
    }
}

/// Spawns a new lobby actor task and returns a handle to communicate with it.
pub(crate) fn spawn_lobby(
    kind: LobbyKind,
    config: LobbyConfig,
    gateway: Gateway,
    sessions: SessionManager,
) -> LobbyHandle {
    let (tx, rx) = mpsc::channel(config.channel_size);

    let actor = LobbyActor {
        kind,
        countdown: Countdown::new(config.countdown_secs),
        config,
        members: Vec::new(),
        gateway,
        sessions,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    LobbyHandle { kind, sender: tx }
}
