//! Integration tests for lobbies: membership broadcasts, the start
//! countdown, cancellation, and promotion into a session.
//!
//! All timing tests run with `start_paused = true`: the Tokio clock
//! jumps forward whenever every task is idle, so a ten-second countdown
//! completes instantly and deterministically.

use std::sync::Arc;
use std::time::Duration;

use brainfreeze_lobby::{LobbyConfig, LobbyError, LobbyManager, LobbyState};
use brainfreeze_protocol::{ConnectionId, GameType, LobbyKind, ServerMessage};
use brainfreeze_registry::{Frame, Gateway, Membership, Registry};
use brainfreeze_session::{SessionConfig, SessionManager};
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

struct Player {
    id: ConnectionId,
    rx: mpsc::UnboundedReceiver<Frame>,
}

impl Player {
    fn drain(&mut self) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(frame) = self.rx.try_recv() {
            out.push(serde_json::from_slice(&frame).unwrap());
        }
        out
    }
}

struct Fixture {
    registry: Arc<Registry>,
    sessions: SessionManager,
    lobbies: LobbyManager,
}

fn fixture(countdown_secs: u32) -> Fixture {
    let registry = Arc::new(Registry::new());
    let gateway = Gateway::new(Arc::clone(&registry));
    let sessions = SessionManager::new(gateway.clone(), SessionConfig::default());
    let lobbies = LobbyManager::new(
        LobbyConfig {
            countdown_secs,
            ..LobbyConfig::default()
        },
        gateway,
        sessions.clone(),
    );
    Fixture {
        registry,
        sessions,
        lobbies,
    }
}

impl Fixture {
    /// Registers a connection and joins it to `kind` the way the hub does:
    /// registry first, then the lobby actor.
    async fn join(&self, kind: LobbyKind) -> Player {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.registry.register(tx).await;
        self.registry.enter_lobby(id, kind).await.unwrap();
        self.lobbies.join(kind, id).await.unwrap();
        Player { id, rx }
    }

    async fn leave(&self, player: &Player) {
        let kind = self.registry.leave_lobby(player.id).await.unwrap();
        assert!(self.lobbies.leave(kind, player.id).await.unwrap());
    }
}

const NRG: LobbyKind = LobbyKind::Game(GameType::Nrg);

fn countdowns(msgs: &[ServerMessage]) -> Vec<u32> {
    msgs.iter()
        .filter_map(|m| match m {
            ServerMessage::Countdown { seconds } => Some(*seconds),
            _ => None,
        })
        .collect()
}

fn player_counts(msgs: &[ServerMessage]) -> Vec<usize> {
    msgs.iter()
        .filter_map(|m| match m {
            ServerMessage::UpdateUsers { player_count } => Some(*player_count),
            _ => None,
        })
        .collect()
}

// =========================================================================
// Membership broadcasts
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_player_count_tracks_joins_and_leaves() {
    let f = fixture(10);
    let mut a = f.join(NRG).await;
    let b = f.join(NRG).await;
    let c = f.join(NRG).await;
    f.leave(&b).await;
    f.leave(&c).await;

    assert_eq!(player_counts(&a.drain()), vec![1, 2, 3, 2, 1]);
    let info = f.lobbies.info(NRG).await.unwrap();
    assert_eq!(info.members, vec![a.id]);
}

#[tokio::test(start_paused = true)]
async fn test_disconnected_member_dropped_from_next_count() {
    let f = fixture(10);
    let mut a = f.join(NRG).await;
    let b = f.join(NRG).await;
    a.drain();

    // Disconnect path: registry entry removed first, then the lobby.
    assert_eq!(f.registry.remove(b.id).await, Some(Membership::Lobby(NRG)));
    f.lobbies.leave(NRG, b.id).await.unwrap();

    let seen = a.drain();
    assert_eq!(player_counts(&seen), vec![1]);
    assert_eq!(seen.last(), Some(&ServerMessage::CountdownCancelled));
}

#[tokio::test(start_paused = true)]
async fn test_join_twice_is_already_member() {
    let f = fixture(10);
    let a = f.join(NRG).await;
    let err = f.lobbies.join(NRG, a.id).await.unwrap_err();
    assert!(matches!(err, LobbyError::AlreadyMember(id, NRG) if id == a.id));
}

#[tokio::test(start_paused = true)]
async fn test_leave_non_member_is_noop() {
    let f = fixture(10);
    assert!(!f.lobbies.leave(NRG, ConnectionId(77)).await.unwrap());
    f.join(NRG).await;
    assert!(!f.lobbies.leave(NRG, ConnectionId(77)).await.unwrap());
}

// =========================================================================
// Countdown
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_single_member_never_counts_down() {
    let f = fixture(3);
    let mut a = f.join(NRG).await;
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(a.drain(), vec![ServerMessage::UpdateUsers { player_count: 1 }]);
    assert_eq!(f.lobbies.info(NRG).await.unwrap().state, LobbyState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_reaching_minimum_starts_countdown_once() {
    let f = fixture(5);
    let mut a = f.join(NRG).await;
    f.join(NRG).await;
    f.join(NRG).await;

    assert_eq!(
        f.lobbies.info(NRG).await.unwrap().state,
        LobbyState::CountingDown { remaining: 5 }
    );
    let seen = a.drain();
    assert_eq!(countdowns(&seen), vec![5], "a third joiner must not restart it");
    assert_eq!(
        seen,
        vec![
            ServerMessage::UpdateUsers { player_count: 1 },
            ServerMessage::UpdateUsers { player_count: 2 },
            ServerMessage::Countdown { seconds: 5 },
            ServerMessage::UpdateUsers { player_count: 3 },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_countdown_ticks_down_then_starts_game() {
    let f = fixture(4);
    let mut a = f.join(NRG).await;
    let mut b = f.join(NRG).await;
    tokio::time::sleep(Duration::from_secs(5)).await;

    let seen_a = a.drain();
    assert_eq!(countdowns(&seen_a), vec![4, 3, 2, 1]);
    assert_eq!(
        seen_a.last(),
        Some(&ServerMessage::GameStart { game: GameType::Nrg })
    );
    assert_eq!(
        b.drain().last(),
        Some(&ServerMessage::GameStart { game: GameType::Nrg })
    );
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_countdown_never_starts_game() {
    let f = fixture(5);
    let mut a = f.join(NRG).await;
    let b = f.join(NRG).await;
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    f.leave(&b).await;
    tokio::time::sleep(Duration::from_secs(30)).await;

    let seen = a.drain();
    assert_eq!(countdowns(&seen), vec![5, 4, 3]);
    assert_eq!(seen.last(), Some(&ServerMessage::CountdownCancelled));
    assert!(!seen.iter().any(|m| matches!(m, ServerMessage::GameStart { .. })));
    assert_eq!(f.lobbies.info(NRG).await.unwrap().state, LobbyState::Idle);
    assert_eq!(f.sessions.session_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_countdown_restarts_after_cancel() {
    let f = fixture(3);
    let mut a = f.join(NRG).await;
    let b = f.join(NRG).await;
    f.leave(&b).await;
    f.join(NRG).await;
    tokio::time::sleep(Duration::from_secs(4)).await;

    let seen = a.drain();
    assert_eq!(countdowns(&seen), vec![3, 3, 2, 1]);
    assert!(matches!(seen.last(), Some(ServerMessage::GameStart { .. })));
}

// =========================================================================
// Promotion
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_promotion_freezes_members_and_empties_lobby() {
    let f = fixture(2);
    let a = f.join(NRG).await;
    let b = f.join(NRG).await;
    tokio::time::sleep(Duration::from_secs(3)).await;

    let info = f.lobbies.info(NRG).await.unwrap();
    assert_eq!(info.state, LobbyState::Idle);
    assert_eq!(info.member_count(), 0);

    let Some(Membership::Session(sid)) = f.registry.membership(a.id).await else {
        panic!("a should be in a session");
    };
    assert_eq!(
        f.registry.membership(b.id).await,
        Some(Membership::Session(sid))
    );
    let session = f.sessions.info(sid).await.unwrap();
    assert_eq!(session.participants, 2);
    assert_eq!(session.game, GameType::Nrg);
}

#[tokio::test(start_paused = true)]
async fn test_late_joiner_waits_for_next_round() {
    let f = fixture(2);
    let a = f.join(NRG).await;
    f.join(NRG).await;
    tokio::time::sleep(Duration::from_secs(3)).await;

    let mut c = f.join(NRG).await;
    assert_eq!(c.drain(), vec![ServerMessage::UpdateUsers { player_count: 1 }]);
    assert!(matches!(
        f.registry.membership(a.id).await,
        Some(Membership::Session(_))
    ));
    assert_eq!(f.registry.membership(c.id).await, Some(Membership::Lobby(NRG)));
}

#[tokio::test(start_paused = true)]
async fn test_mixed_lobby_draws_one_game_for_everyone() {
    let f = fixture(2);
    let mut a = f.join(LobbyKind::Mixed).await;
    let mut b = f.join(LobbyKind::Mixed).await;
    tokio::time::sleep(Duration::from_secs(3)).await;

    let Some(ServerMessage::GameStart { game }) = a.drain().last().cloned() else {
        panic!("a should have received game_start");
    };
    assert!(GameType::ALL.contains(&game));
    assert_eq!(b.drain().last(), Some(&ServerMessage::GameStart { game }));
}

#[tokio::test(start_paused = true)]
async fn test_lobbies_are_independent() {
    let f = fixture(2);
    let mut nrg = f.join(NRG).await;
    let mut simon = f.join(LobbyKind::Game(GameType::Simon)).await;
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(nrg.drain(), vec![ServerMessage::UpdateUsers { player_count: 1 }]);
    assert_eq!(simon.drain(), vec![ServerMessage::UpdateUsers { player_count: 1 }]);
    assert_eq!(f.lobbies.lobby_count().await, 2);
}
