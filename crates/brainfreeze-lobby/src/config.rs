//! Lobby configuration and state machine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// LobbyConfig
// ---------------------------------------------------------------------------

/// Configuration shared by every lobby.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LobbyConfig {
    /// Members needed before the countdown starts. At least 2.
    pub min_players: usize,

    /// Length of the start countdown in seconds.
    pub countdown_secs: u32,

    /// Capacity of each lobby's command queue.
    pub channel_size: usize,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            countdown_secs: 10,
            channel_size: 64,
        }
    }
}

impl LobbyConfig {
    /// Smallest allowed `min_players`: a multiplayer round needs company.
    pub const MIN_PLAYERS_FLOOR: usize = 2;

    /// Clamps out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`LobbyManager::new`](crate::LobbyManager::new).
    /// - `min_players` raised to [`Self::MIN_PLAYERS_FLOOR`]
    /// - `countdown_secs` raised to 1
    /// - `channel_size` raised to 1
    pub fn validated(mut self) -> Self {
        if self.min_players < Self::MIN_PLAYERS_FLOOR {
            tracing::warn!(
                min_players = self.min_players,
                floor = Self::MIN_PLAYERS_FLOOR,
                "min_players below floor, clamping"
            );
            self.min_players = Self::MIN_PLAYERS_FLOOR;
        }
        self.countdown_secs = self.countdown_secs.max(1);
        self.channel_size = self.channel_size.max(1);
        self
    }
}

// ---------------------------------------------------------------------------
// LobbyState
// ---------------------------------------------------------------------------

/// Whether a lobby is waiting or about to start.
///
/// ```text
/// Idle ──(members ≥ min)──→ CountingDown(n) ──tick──→ CountingDown(n-1) ...
///  ↑                              │                        │
///  └────(members < min: cancel)───┘                        │
///  └──────────────(zero: members promoted)─────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LobbyState {
    Idle,
    CountingDown { remaining: u32 },
}

impl LobbyState {
    /// Returns `true` while a countdown is running.
    pub fn is_counting_down(&self) -> bool {
        matches!(self, Self::CountingDown { .. })
    }
}

impl std::fmt::Display for LobbyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::CountingDown { remaining } => write!(f, "CountingDown({remaining})"),
        }
    }
}
