//! Session actor: an isolated Tokio task that owns one [`Round`].
//!
//! Each session runs in its own task, communicating with the outside world
//! through an mpsc channel. Submissions and disconnects are processed one
//! at a time, so no two operations on a session ever interleave.

use std::time::Duration;

use brainfreeze_protocol::{ConnectionId, GameType, SessionId, Submission};
use brainfreeze_registry::Gateway;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant};

use crate::{Dispatch, Round, SessionError, SessionReport};

/// Commands sent to a session actor through its channel.
pub(crate) enum SessionCommand {
    /// Record a participant's result.
    Submit {
        conn: ConnectionId,
        submission: Submission,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },

    /// A participant's connection closed.
    Disconnect {
        conn: ConnectionId,
        reply: oneshot::Sender<()>,
    },

    /// Request a snapshot of the session.
    GetInfo { reply: oneshot::Sender<SessionInfo> },
}

/// A snapshot of session metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub game: GameType,
    pub participants: usize,
    pub connected: usize,
    pub submitted: usize,
    pub terminal: bool,
}

/// Handle to a running session actor.
///
/// This is cheap to clone; it's just an `mpsc::Sender` wrapper.
#[derive(Clone)]
pub struct SessionHandle {
    session_id: SessionId,
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Returns the session's id.
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Submits a participant's result and waits until it was processed
    /// (and any resulting messages were handed to the gateway).
    pub async fn submit(&self, conn: ConnectionId, submission: Submission) -> Result<(), SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Submit {
                conn,
                submission,
                reply: reply_tx,
            })
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))?;
        reply_rx
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))?
    }

    /// Tells the session a participant disconnected.
    pub async fn disconnect(&self, conn: ConnectionId) -> Result<(), SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Disconnect {
                conn,
                reply: reply_tx,
            })
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))?;
        reply_rx
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))
    }

    /// Requests the current session info.
    pub async fn info(&self) -> Result<SessionInfo, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))?;
        reply_rx
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))
    }
}

/// The internal session actor state. Runs inside a Tokio task.
pub(crate) struct SessionActor {
    round: Round,
    gateway: Gateway,
    receiver: mpsc::Receiver<SessionCommand>,
    result_timeout: Option<Duration>,
    deadline: Option<Instant>,
    reports: Option<mpsc::UnboundedSender<SessionReport>>,
    released: bool,
}

impl SessionActor {
    /// Runs the actor loop until the round is terminal, then releases the
    /// participants and publishes the report.
    pub(crate) async fn run(mut self) {
        let session_id = self.round.id();
        tracing::info!(
            %session_id,
            game = %self.round.game(),
            players = self.round.participants().len(),
            "session started"
        );
        self.reset_deadline();

        while !self.round.is_terminal() {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => self.handle(cmd).await,
                    None => break,
                },
                () = wait_until(self.deadline) => {
                    tracing::info!(%session_id, "session result timeout");
                    self.deadline = None;
                    let out = self.round.expire();
                    self.deliver(out).await;
                }
            }
        }

        self.release().await;
        if let (Some(report), Some(reports)) = (self.round.report(), &self.reports) {
            let _ = reports.send(report.clone());
        }
        tracing::info!(%session_id, "session actor stopped");
    }

    async fn handle(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Submit {
                conn,
                submission,
                reply,
            } => {
                let result = match self.round.submit(conn, submission) {
                    Ok(out) => {
                        tracing::debug!(
                            session_id = %self.round.id(),
                            conn_id = %conn,
                            score = %submission.score(),
                            "result submitted"
                        );
                        self.reset_deadline();
                        self.deliver(out).await;
                        Ok(())
                    }
                    Err(e) => Err(e),
                };
                let _ = reply.send(result);
            }
            SessionCommand::Disconnect { conn, reply } => {
                tracing::debug!(session_id = %self.round.id(), conn_id = %conn, "participant left");
                let out = self.round.disconnect(conn);
                self.deliver(out).await;
                let _ = reply.send(());
            }
            SessionCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
        }
    }

    /// Hands outbound messages to the gateway.
    ///
    /// When the round just resolved, the participants are freed first so a
    /// client reacting to `game_end` can rejoin a lobby immediately.
    async fn deliver(&mut self, out: Vec<Dispatch>) {
        if self.round.is_terminal() {
            self.release().await;
        }
        for dispatch in out {
            self.gateway.broadcast(&dispatch.to, &dispatch.message).await;
        }
    }

    async fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let ids: Vec<ConnectionId> = self.round.participants().iter().map(|p| p.conn).collect();
        self.gateway.registry().release(&ids, self.round.id()).await;
    }

    fn reset_deadline(&mut self) {
        self.deadline = self.result_timeout.map(|t| Instant::now() + t);
    }

    fn info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.round.id(),
            game: self.round.game(),
            participants: self.round.participants().len(),
            connected: self.round.connected_count(),
            submitted: self.round.submitted_count(),
            terminal: self.round.is_terminal(),
        }
    }
}

/// Sleeps until `deadline`, or forever when there is none.
async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Builds a session actor and its handle. The caller spawns
/// [`SessionActor::run`].
pub(crate) fn session_actor(
    round: Round,
    gateway: Gateway,
    result_timeout: Option<Duration>,
    reports: Option<mpsc::UnboundedSender<SessionReport>>,
    channel_size: usize,
) -> (SessionActor, SessionHandle) {
    let (tx, rx) = mpsc::channel(channel_size.max(1));
    let handle = SessionHandle {
        session_id: round.id(),
        sender: tx,
    };
    let actor = SessionActor {
        round,
        gateway,
        receiver: rx,
        result_timeout,
        deadline: None,
        reports,
        released: false,
    };
    (actor, handle)
}
