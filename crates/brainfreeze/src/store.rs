//! Record store: where users, played games, and scores are kept.
//!
//! The coordination server only needs a handful of operations from the
//! store, captured by the [`RecordStore`] trait. [`MemoryStore`] keeps
//! everything in process and is what the binary and the tests use; a
//! database-backed store implements the same trait.

use std::collections::HashMap;
use std::fmt;

use brainfreeze_protocol::{GameType, Score, UserId};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Identifies one played game in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub u64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G-{}", self.0)
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
}

/// One played game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: GameId,
    pub game: GameType,
    pub multiplayer: bool,
}

/// One user's score in one played game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub user: UserId,
    pub game: GameId,
    pub score: Score,
}

/// Errors returned by a [`RecordStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unknown user {0}")]
    UnknownUser(UserId),

    #[error("unknown game {0}")]
    UnknownGame(GameId),

    #[error("username {0:?} is taken")]
    UsernameTaken(String),
}

// ---------------------------------------------------------------------------
// RecordStore
// ---------------------------------------------------------------------------

/// Persistence for users, games, and scores.
///
/// Plain request/response: no transactions, last write wins.
///
/// # Trait bounds
///
/// - `Send + Sync` → shared by every connection task and the recorder.
/// - `'static` → it lives as long as the server.
pub trait RecordStore: Send + Sync + 'static {
    /// Looks up a user by id.
    fn find_user(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<UserRecord>, StoreError>> + Send;

    /// Looks up a user by username.
    fn find_user_by_name(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<UserRecord>, StoreError>> + Send;

    /// Records a newly played game.
    fn create_game(
        &self,
        game: GameType,
        multiplayer: bool,
    ) -> impl Future<Output = Result<GameRecord, StoreError>> + Send;

    /// Records one user's score in a game created with
    /// [`create_game`](Self::create_game).
    fn create_score(
        &self,
        score: ScoreRecord,
    ) -> impl Future<Output = Result<ScoreRecord, StoreError>> + Send;

    /// The user's best score across every played game of this type.
    fn max_score(
        &self,
        user: UserId,
        game: GameType,
    ) -> impl Future<Output = Result<Option<Score>, StoreError>> + Send;
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// An in-process [`RecordStore`].
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, UserRecord>,
    games: HashMap<GameId, GameRecord>,
    scores: Vec<ScoreRecord>,
    next_user: u64,
    next_game: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user and returns its record.
    pub async fn add_user(&self, username: &str) -> Result<UserRecord, StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|u| u.username == username) {
            return Err(StoreError::UsernameTaken(username.to_string()));
        }
        tables.next_user += 1;
        let user = UserRecord {
            id: UserId(tables.next_user),
            username: username.to_string(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    /// Every game recorded so far, oldest first.
    pub async fn games(&self) -> Vec<GameRecord> {
        let tables = self.tables.lock().await;
        let mut games: Vec<_> = tables.games.values().cloned().collect();
        games.sort_by_key(|g| g.id.0);
        games
    }

    /// Every score recorded so far, in insertion order.
    pub async fn scores(&self) -> Vec<ScoreRecord> {
        self.tables.lock().await.scores.clone()
    }
}

impl RecordStore for MemoryStore {
    async fn find_user(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_name(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn create_game(&self, game: GameType, multiplayer: bool) -> Result<GameRecord, StoreError> {
        let mut tables = self.tables.lock().await;
        tables.next_game += 1;
        let record = GameRecord {
            id: GameId(tables.next_game),
            game,
            multiplayer,
        };
        tables.games.insert(record.id, record.clone());
        Ok(record)
    }

    async fn create_score(&self, score: ScoreRecord) -> Result<ScoreRecord, StoreError> {
        let mut tables = self.tables.lock().await;
        if !tables.users.contains_key(&score.user) {
            return Err(StoreError::UnknownUser(score.user));
        }
        if !tables.games.contains_key(&score.game) {
            return Err(StoreError::UnknownGame(score.game));
        }
        tables.scores.push(score.clone());
        Ok(score)
    }

    async fn max_score(&self, user: UserId, game: GameType) -> Result<Option<Score>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .scores
            .iter()
            .filter(|s| s.user == user)
            .filter(|s| tables.games.get(&s.game).is_some_and(|g| g.game == game))
            .map(|s| s.score)
            .max())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_and_find_user() {
        let store = MemoryStore::new();
        let alice = store.add_user("alice").await.unwrap();

        assert_eq!(store.find_user(alice.id).await.unwrap(), Some(alice.clone()));
        assert_eq!(store.find_user_by_name("alice").await.unwrap(), Some(alice));
        assert_eq!(store.find_user_by_name("bob").await.unwrap(), None);
        assert_eq!(store.find_user(UserId(99)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let store = MemoryStore::new();
        store.add_user("alice").await.unwrap();
        let err = store.add_user("alice").await.unwrap_err();
        assert!(matches!(err, StoreError::UsernameTaken(name) if name == "alice"));
    }

    #[tokio::test]
    async fn test_score_requires_known_user_and_game() {
        let store = MemoryStore::new();
        let alice = store.add_user("alice").await.unwrap();
        let game = store.create_game(GameType::Simon, true).await.unwrap();

        let err = store
            .create_score(ScoreRecord {
                user: UserId(42),
                game: game.id,
                score: Score(3),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownUser(UserId(42))));

        let err = store
            .create_score(ScoreRecord {
                user: alice.id,
                game: GameId(42),
                score: Score(3),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownGame(GameId(42))));
        assert!(store.scores().await.is_empty());
    }

    #[tokio::test]
    async fn test_max_score_is_per_game_type() {
        let store = MemoryStore::new();
        let alice = store.add_user("alice").await.unwrap();
        let simon1 = store.create_game(GameType::Simon, true).await.unwrap();
        let simon2 = store.create_game(GameType::Simon, false).await.unwrap();
        let nrg = store.create_game(GameType::Nrg, true).await.unwrap();

        for (game, score) in [(simon1.id, 4), (simon2.id, 9), (nrg.id, 20)] {
            store
                .create_score(ScoreRecord {
                    user: alice.id,
                    game,
                    score: Score(score),
                })
                .await
                .unwrap();
        }

        assert_eq!(store.max_score(alice.id, GameType::Simon).await.unwrap(), Some(Score(9)));
        assert_eq!(store.max_score(alice.id, GameType::Nrg).await.unwrap(), Some(Score(20)));
        assert_eq!(store.max_score(alice.id, GameType::Cardflip).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_games_listed_oldest_first() {
        let store = MemoryStore::new();
        for game in GameType::ALL {
            store.create_game(game, true).await.unwrap();
        }
        let games: Vec<_> = store.games().await.into_iter().map(|g| g.game).collect();
        assert_eq!(games, GameType::ALL.to_vec());
    }
}
