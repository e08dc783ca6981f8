//! Core protocol types for Brainfreeze's wire format.
//!
//! Every message that crosses a WebSocket is one of the two enums below:
//! [`ClientMessage`] (browser → server) or [`ServerMessage`]
//! (server → browser). Both are "internally tagged" JSON objects: the
//! variant name lives in a `type` field next to the payload fields.
//!
//! ```text
//! { "type": "update_users", "playerCount": 2 }
//! { "type": "simon_score", "score": 7 }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Opaque handle for one live client connection.
///
/// Allocated by the connection registry when a socket is accepted and
/// never reused for the lifetime of the process. This is a "newtype
/// wrapper": you can't pass a `SessionId` where a `ConnectionId` is
/// expected, even though both are `u64` underneath.
///
/// `#[serde(transparent)]` serializes it as the bare number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Identifies one game round: the players promoted together out of a
/// lobby at countdown-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

/// Identifies a user record in the external record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Games and lobbies
// ---------------------------------------------------------------------------

/// The three multiplayer games.
///
/// On the wire these are the lowercase names the browser routes on:
/// `"cardflip"`, `"simon"`, `"nrg"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    /// Card matching. No numeric score; first to finish wins.
    Cardflip,
    /// Colour-sequence memory. Score = longest sequence repeated.
    Simon,
    /// Number-sequence recall. Score = highest level reached.
    Nrg,
}

impl GameType {
    /// Every game, in a stable order.
    pub const ALL: [GameType; 3] = [GameType::Cardflip, GameType::Simon, GameType::Nrg];

    /// The numeric game type used by the record store's game table.
    pub fn record_code(self) -> u8 {
        match self {
            Self::Cardflip => 0,
            Self::Nrg => 1,
            Self::Simon => 2,
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cardflip => write!(f, "cardflip"),
            Self::Simon => write!(f, "simon"),
            Self::Nrg => write!(f, "nrg"),
        }
    }
}

/// Which lobby a connection is waiting in.
///
/// There is one lobby per game plus a single *mixed* lobby, whose game is
/// drawn at random when its countdown reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LobbyKind {
    /// Players who asked for a specific game.
    Game(GameType),
    /// Players who just want to play something.
    Mixed,
}

impl From<Option<GameType>> for LobbyKind {
    fn from(game: Option<GameType>) -> Self {
        game.map_or(Self::Mixed, Self::Game)
    }
}

impl fmt::Display for LobbyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Game(game) => write!(f, "{game}"),
            Self::Mixed => write!(f, "mixed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// A participant's final result for one round.
///
/// Semantically "highest correctly completed level/move-count". The
/// session only ever compares scores by magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(pub u32);

impl Score {
    /// Sentinel for "finished the game". Card matching has no numeric
    /// ceiling, so finishing is treated as the maximum attainable score.
    pub const FINISHED: Score = Score(u32::MAX);
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::FINISHED {
            write!(f, "finished")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// A result submission extracted from a [`ClientMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// `simon_score`
    Simon(Score),
    /// `nrg_score`
    Nrg(Score),
    /// `game_won` (card matching)
    Finished,
}

impl Submission {
    /// The game this submission belongs to.
    pub fn game(&self) -> GameType {
        match self {
            Self::Simon(_) => GameType::Simon,
            Self::Nrg(_) => GameType::Nrg,
            Self::Finished => GameType::Cardflip,
        }
    }

    /// The score carried by this submission.
    pub fn score(&self) -> Score {
        match self {
            Self::Simon(score) | Self::Nrg(score) => *score,
            Self::Finished => Score::FINISHED,
        }
    }
}

// ---------------------------------------------------------------------------
// ClientMessage
// ---------------------------------------------------------------------------

/// Messages a browser sends to the server.
///
/// `#[serde(tag = "type", rename_all = "snake_case")]` produces
/// internally tagged JSON with snake-case tags, matching what the
/// front-end already sends: `{ "type": "join_lobby" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join a lobby. Without `game` the connection joins the mixed lobby.
    JoinLobby {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        game: Option<GameType>,
    },

    /// Leave whatever lobby the connection is waiting in.
    LeaveLobby,

    /// Final result of a Simon round.
    SimonScore { score: u32 },

    /// Final result of an NRG round.
    NrgScore { score: u32 },

    /// The card-matching board was cleared.
    GameWon,

    /// Bind this connection to a user record so its results are stored.
    Identify {
        #[serde(rename = "userId")]
        user_id: UserId,
    },
}

impl ClientMessage {
    /// Returns the result submission carried by this message, if any.
    pub fn submission(&self) -> Option<Submission> {
        match self {
            Self::SimonScore { score } => Some(Submission::Simon(Score(*score))),
            Self::NrgScore { score } => Some(Submission::Nrg(Score(*score))),
            Self::GameWon => Some(Submission::Finished),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ServerMessage
// ---------------------------------------------------------------------------

/// Messages the server pushes to browsers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Current number of players waiting in the recipient's lobby.
    UpdateUsers {
        #[serde(rename = "playerCount")]
        player_count: usize,
    },

    /// Seconds left before the lobby's game starts.
    Countdown { seconds: u32 },

    /// A player left and the lobby fell below its minimum, so the
    /// countdown stopped.
    CountdownCancelled,

    /// The countdown reached zero; navigate into this game.
    GameStart { game: GameType },

    /// A peer finished their Simon round with this score.
    SimonScore { score: u32 },

    /// A peer finished their NRG round with this score.
    NrgScore { score: u32 },

    /// The round is over. `peer_scores` are the other participants'
    /// results, for display.
    GameEnd {
        won: bool,
        #[serde(rename = "peerScores")]
        peer_scores: Vec<u32>,
    },

    /// Someone else finished the card-matching board first.
    GameLost,

    /// A request from this connection was rejected.
    Error { message: String },
}

impl ServerMessage {
    /// The relay sent to peers when a participant submits, if the game
    /// relays scores at all.
    pub fn peer_score(submission: Submission) -> Option<Self> {
        match submission {
            Submission::Simon(Score(score)) => Some(Self::SimonScore { score }),
            Submission::Nrg(Score(score)) => Some(Self::NrgScore { score }),
            Submission::Finished => None,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
