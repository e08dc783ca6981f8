//! Integration tests for session actors driven through the manager.
//!
//! Each test builds a real registry and gateway, registers a few fake
//! connections (plain channels standing in for sockets), puts them in a
//! lobby, and starts a session from it.

use std::sync::Arc;
use std::time::Duration;

use brainfreeze_protocol::{
    ConnectionId, GameType, LobbyKind, Score, ServerMessage, Submission,
};
use brainfreeze_registry::{Frame, Gateway, Membership, Registry};
use brainfreeze_session::{SessionConfig, SessionError, SessionManager, SessionReport, Verdict};
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

struct Player {
    id: ConnectionId,
    rx: mpsc::UnboundedReceiver<Frame>,
}

impl Player {
    /// Drains every message delivered so far.
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
    manager: SessionManager,
    reports: mpsc::UnboundedReceiver<SessionReport>,
}

fn fixture(config: SessionConfig) -> Fixture {
    let registry = Arc::new(Registry::new());
    let gateway = Gateway::new(Arc::clone(&registry));
    let (reports_tx, reports) = mpsc::unbounded_channel();
    let manager = SessionManager::with_reports(gateway, config, reports_tx);
    Fixture {
        registry,
        manager,
        reports,
    }
}

async fn lobby_players(registry: &Registry, kind: LobbyKind, n: usize) -> Vec<Player> {
    let mut players = Vec::new();
    for _ in 0..n {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = registry.register(tx).await;
        registry.enter_lobby(id, kind).await.unwrap();
        players.push(Player { id, rx });
    }
    players
}

fn ids(players: &[Player]) -> Vec<ConnectionId> {
    players.iter().map(|p| p.id).collect()
}

const SIMON: LobbyKind = LobbyKind::Game(GameType::Simon);

// =========================================================================
// Lifecycle
// =========================================================================

#[tokio::test]
async fn test_start_promotes_exact_member_set() {
    let f = fixture(SessionConfig::default());
    let players = lobby_players(&f.registry, SIMON, 3).await;

    let started = f
        .manager
        .start(SIMON, GameType::Simon, &ids(&players))
        .await
        .unwrap();

    assert_eq!(started.participants, ids(&players));
    for p in &players {
        assert_eq!(
            f.registry.membership(p.id).await,
            Some(Membership::Session(started.session_id))
        );
    }
    let info = f.manager.info(started.session_id).await.unwrap();
    assert_eq!(info.participants, 3);
    assert_eq!(info.connected, 3);
    assert!(!info.terminal);
}

#[tokio::test]
async fn test_start_with_nobody_left_creates_nothing() {
    let f = fixture(SessionConfig::default());
    let players = lobby_players(&f.registry, SIMON, 2).await;
    for p in &players {
        f.registry.leave_lobby(p.id).await.unwrap();
    }

    assert!(f.manager.start(SIMON, GameType::Simon, &ids(&players)).await.is_none());
    assert_eq!(f.manager.session_count().await, 0);
}

#[tokio::test]
async fn test_resolved_session_releases_members_and_reports() {
    let mut f = fixture(SessionConfig::default());
    let mut players = lobby_players(&f.registry, SIMON, 3).await;
    let started = f
        .manager
        .start(SIMON, GameType::Simon, &ids(&players))
        .await
        .unwrap();
    let sid = started.session_id;

    for (p, score) in players.iter().zip([5, 5, 3]) {
        f.manager
            .submit(sid, p.id, Submission::Simon(Score(score)))
            .await
            .unwrap();
    }

    let report = f.reports.recv().await.unwrap();
    assert_eq!(report.session, sid);
    let verdicts: Vec<Verdict> = report.standings.iter().map(|s| s.verdict).collect();
    assert_eq!(verdicts, vec![Verdict::Won, Verdict::Won, Verdict::Lost]);

    for p in &players {
        assert_eq!(f.registry.membership(p.id).await, Some(Membership::None));
    }

    // Third player saw both relays, then the outcome.
    let seen = players[2].drain();
    assert_eq!(
        seen,
        vec![
            ServerMessage::SimonScore { score: 5 },
            ServerMessage::SimonScore { score: 5 },
            ServerMessage::GameEnd {
                won: false,
                peer_scores: vec![5, 5]
            },
        ]
    );
    // Exactly one outcome each.
    for p in &mut players[..2] {
        let outcomes = p
            .drain()
            .into_iter()
            .filter(|m| matches!(m, ServerMessage::GameEnd { .. }))
            .count();
        assert_eq!(outcomes, 1);
    }

    // The actor removed itself from the table.
    tokio::task::yield_now().await;
    while f.manager.session_count().await > 0 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_late_submission_is_rejected_without_new_messages() {
    let mut f = fixture(SessionConfig::default());
    let mut players = lobby_players(&f.registry, LobbyKind::Game(GameType::Cardflip), 2).await;
    let started = f
        .manager
        .start(
            LobbyKind::Game(GameType::Cardflip),
            GameType::Cardflip,
            &ids(&players),
        )
        .await
        .unwrap();

    f.manager
        .submit(started.session_id, players[0].id, Submission::Finished)
        .await
        .unwrap();
    f.reports.recv().await.unwrap();

    assert_eq!(
        players[0].drain(),
        vec![ServerMessage::GameEnd {
            won: true,
            peer_scores: vec![]
        }]
    );
    assert_eq!(players[1].drain(), vec![ServerMessage::GameLost]);

    let late = f
        .manager
        .submit(started.session_id, players[1].id, Submission::Finished)
        .await;
    assert!(matches!(
        late,
        Err(SessionError::Unavailable(_) | SessionError::AlreadyTerminal(_))
    ));
    assert!(players[0].drain().is_empty());
    assert!(players[1].drain().is_empty());
}

#[tokio::test]
async fn test_disconnects_leave_sole_winner() {
    let mut f = fixture(SessionConfig::default());
    let mut players = lobby_players(&f.registry, SIMON, 3).await;
    let sid = f
        .manager
        .start(SIMON, GameType::Simon, &ids(&players))
        .await
        .unwrap()
        .session_id;

    f.manager
        .submit(sid, players[0].id, Submission::Simon(Score(5)))
        .await
        .unwrap();
    f.manager.disconnect(sid, players[1].id).await.unwrap();
    f.manager.disconnect(sid, players[2].id).await.unwrap();

    let report = f.reports.recv().await.unwrap();
    assert_eq!(report.winners().collect::<Vec<_>>(), vec![players[0].id]);
    assert_eq!(
        players[0].drain(),
        vec![ServerMessage::GameEnd {
            won: true,
            peer_scores: vec![]
        }]
    );
}

#[tokio::test]
async fn test_everyone_disconnects_session_ends_silently() {
    let mut f = fixture(SessionConfig::default());
    let mut players = lobby_players(&f.registry, SIMON, 2).await;
    let sid = f
        .manager
        .start(SIMON, GameType::Simon, &ids(&players))
        .await
        .unwrap()
        .session_id;

    for p in &players {
        f.manager.disconnect(sid, p.id).await.unwrap();
    }

    let report = f.reports.recv().await.unwrap();
    assert!(report.standings.iter().all(|s| s.verdict == Verdict::Left));
    for p in &mut players {
        assert!(p.drain().is_empty());
    }
}

#[tokio::test]
async fn test_wrong_game_result_is_mismatch() {
    let f = fixture(SessionConfig::default());
    let players = lobby_players(&f.registry, SIMON, 2).await;
    let sid = f
        .manager
        .start(SIMON, GameType::Simon, &ids(&players))
        .await
        .unwrap()
        .session_id;

    let err = f
        .manager
        .submit(sid, players[0].id, Submission::Nrg(Score(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::ResultMismatch { .. }));
}

// =========================================================================
// Result timeout
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_result_timeout_resolves_with_results_on_hand() {
    let mut f = fixture(SessionConfig {
        result_timeout: Some(Duration::from_secs(30)),
        ..SessionConfig::default()
    });
    let mut players = lobby_players(&f.registry, SIMON, 2).await;
    let sid = f
        .manager
        .start(SIMON, GameType::Simon, &ids(&players))
        .await
        .unwrap()
        .session_id;

    tokio::time::sleep(Duration::from_secs(20)).await;
    f.manager
        .submit(sid, players[0].id, Submission::Simon(Score(4)))
        .await
        .unwrap();

    // The submission reset the timer: nothing resolves at the 30 s mark.
    tokio::time::sleep(Duration::from_secs(15)).await;
    assert!(!f.manager.info(sid).await.unwrap().terminal);

    let report = f.reports.recv().await.unwrap();
    assert_eq!(report.winners().collect::<Vec<_>>(), vec![players[0].id]);
    assert_eq!(
        players[1].drain(),
        vec![
            ServerMessage::SimonScore { score: 4 },
            ServerMessage::GameEnd {
                won: false,
                peer_scores: vec![4]
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_no_result_timeout_waits_forever() {
    let mut f = fixture(SessionConfig {
        result_timeout: None,
        ..SessionConfig::default()
    });
    let players = lobby_players(&f.registry, SIMON, 2).await;
    f.manager
        .start(SIMON, GameType::Simon, &ids(&players))
        .await
        .unwrap();

    let waited = tokio::time::timeout(Duration::from_secs(3_600), f.reports.recv()).await;
    assert!(waited.is_err(), "session should still be waiting for results");
}
