//! The round state machine: one session's participants and results.
//!
//! [`Round`] is deliberately synchronous and I/O-free. Every operation
//! returns the messages to deliver as a list of [`Dispatch`]es, and the
//! session actor hands those to the gateway. That keeps all the rules
//! testable without a runtime, and keeps the actor a thin shell.
//!
//! # State
//!
//! ```text
//!            submit / disconnect
//!           ┌──────────────────┐
//!           ▼                  │
//!      [collecting] ───────────┘
//!           │ completion, first finish, timeout, or nobody left
//!           ▼
//!      [terminal]  → report() is Some; every call after this is a no-op
//! ```

use std::collections::{HashMap, HashSet};

use brainfreeze_protocol::{
    ConnectionId, GameType, Score, ServerMessage, SessionId, Submission, UserId,
};

use crate::outcome::{self, Contender, Rule, SessionReport, Standing, Verdict};
use crate::SessionError;

/// A player taking part in a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Participant {
    pub conn: ConnectionId,
    /// The user record this connection identified as, if any.
    pub user: Option<UserId>,
}

/// A message for the gateway to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub to: Vec<ConnectionId>,
    pub message: ServerMessage,
}

impl Dispatch {
    fn one(to: ConnectionId, message: ServerMessage) -> Self {
        Self {
            to: vec![to],
            message,
        }
    }
}

/// One session's round: participants, results, and resolution.
#[derive(Debug)]
pub struct Round {
    id: SessionId,
    game: GameType,
    rule: Rule,
    /// Fixed at creation; no late joins.
    participants: Vec<Participant>,
    connected: HashSet<ConnectionId>,
    results: HashMap<ConnectionId, Score>,
    /// First `game_won`, for the first-finisher rule.
    finisher: Option<ConnectionId>,
    /// `Some` once terminal.
    report: Option<SessionReport>,
}

impl Round {
    /// Starts a round with every participant connected.
    pub fn new(id: SessionId, game: GameType, participants: Vec<Participant>) -> Self {
        let connected = participants.iter().map(|p| p.conn).collect();
        Self {
            id,
            game,
            rule: Rule::for_game(game),
            participants,
            connected,
            results: HashMap::new(),
            finisher: None,
            report: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn game(&self) -> GameType {
        self.game
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Number of participants still connected.
    pub fn connected_count(&self) -> usize {
        self.connected.len()
    }

    /// Number of participants who have submitted a result.
    pub fn submitted_count(&self) -> usize {
        self.results.len()
    }

    /// Whether the round has resolved.
    pub fn is_terminal(&self) -> bool {
        self.report.is_some()
    }

    /// The final standings, once terminal.
    pub fn report(&self) -> Option<&SessionReport> {
        self.report.as_ref()
    }

    /// Records a participant's result and resolves the round if it is
    /// now complete.
    ///
    /// Resubmitting before the round resolves overwrites the earlier
    /// result.
    ///
    /// # Errors
    /// - [`SessionError::AlreadyTerminal`] once resolved
    /// - [`SessionError::NotAParticipant`] for strangers and participants
    ///   who already disconnected
    /// - [`SessionError::ResultMismatch`] for another game's result
    pub fn submit(
        &mut self,
        conn: ConnectionId,
        submission: Submission,
    ) -> Result<Vec<Dispatch>, SessionError> {
        if self.is_terminal() {
            return Err(SessionError::AlreadyTerminal(self.id));
        }
        if !self.connected.contains(&conn) {
            return Err(SessionError::NotAParticipant(conn, self.id));
        }
        if submission.game() != self.game {
            return Err(SessionError::ResultMismatch {
                session: self.id,
                expected: self.game,
                got: submission.game(),
            });
        }

        self.results.insert(conn, submission.score());

        let mut out = Vec::new();
        if let Some(relay) = ServerMessage::peer_score(submission) {
            let peers = self.connected_except(conn);
            if !peers.is_empty() {
                out.push(Dispatch {
                    to: peers,
                    message: relay,
                });
            }
        }

        match self.rule {
            Rule::FirstFinisher => {
                self.finisher = Some(conn);
                out.extend(self.resolve());
            }
            Rule::HighestScore => {
                if self.all_connected_submitted() {
                    out.extend(self.resolve());
                }
            }
        }
        Ok(out)
    }

    /// Marks a participant as gone.
    ///
    /// Under the highest-score rule this may complete the round: the
    /// departed participant no longer holds everyone else up. When the
    /// last participant leaves the round ends without messages.
    pub fn disconnect(&mut self, conn: ConnectionId) -> Vec<Dispatch> {
        if self.is_terminal() || !self.connected.remove(&conn) {
            return Vec::new();
        }

        if self.connected.is_empty() {
            return self.resolve();
        }
        match self.rule {
            Rule::HighestScore if self.all_connected_submitted() => self.resolve(),
            _ => Vec::new(),
        }
    }

    /// Resolves the round with whatever results are on hand. Used when
    /// the result timeout fires.
    pub fn expire(&mut self) -> Vec<Dispatch> {
        if self.is_terminal() {
            return Vec::new();
        }
        self.resolve()
    }

    fn connected_except(&self, conn: ConnectionId) -> Vec<ConnectionId> {
        self.participants
            .iter()
            .map(|p| p.conn)
            .filter(|c| *c != conn && self.connected.contains(c))
            .collect()
    }

    fn all_connected_submitted(&self) -> bool {
        self.connected.iter().all(|c| self.results.contains_key(c))
    }

    /// Computes verdicts, stores the report, and builds the outcome
    /// messages for every still-connected participant.
    fn resolve(&mut self) -> Vec<Dispatch> {
        let contenders: Vec<Contender> = self
            .participants
            .iter()
            .map(|p| Contender {
                result: self.results.get(&p.conn).copied(),
                connected: self.connected.contains(&p.conn),
            })
            .collect();

        let verdicts = match self.rule {
            Rule::HighestScore => outcome::highest_score(&contenders),
            Rule::FirstFinisher => {
                let finisher = self
                    .finisher
                    .and_then(|f| self.participants.iter().position(|p| p.conn == f));
                outcome::first_finisher(&contenders, finisher)
            }
        };

        let mut out = Vec::new();
        for (i, (participant, verdict)) in self.participants.iter().zip(&verdicts).enumerate() {
            let won = match verdict {
                Verdict::Left => continue,
                Verdict::Won => true,
                Verdict::Lost => false,
            };
            let message = match self.rule {
                Rule::HighestScore => ServerMessage::GameEnd {
                    won,
                    peer_scores: self.peer_scores(i),
                },
                Rule::FirstFinisher if won => ServerMessage::GameEnd {
                    won,
                    peer_scores: Vec::new(),
                },
                Rule::FirstFinisher => ServerMessage::GameLost,
            };
            out.push(Dispatch::one(participant.conn, message));
        }

        let standings = self
            .participants
            .iter()
            .zip(verdicts)
            .map(|(p, verdict)| Standing {
                conn: p.conn,
                user: p.user,
                result: self.results.get(&p.conn).copied(),
                verdict,
            })
            .collect();
        self.report = Some(SessionReport {
            session: self.id,
            game: self.game,
            standings,
        });

        tracing::info!(
            session_id = %self.id,
            game = %self.game,
            connected = self.connected.len(),
            submitted = self.results.len(),
            "session resolved"
        );
        out
    }

    /// Every other participant's submitted result, in participant order.
    fn peer_scores(&self, index: usize) -> Vec<u32> {
        self.participants
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != index)
            .filter_map(|(_, p)| self.results.get(&p.conn))
            .map(|score| score.0)
            .collect()
    }
}

// =========================================================================
// Tests
// =========================================================================
