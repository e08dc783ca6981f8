//! Persists finished sessions to the record store.

use std::sync::Arc;

use brainfreeze_protocol::Score;
use brainfreeze_session::SessionReport;
use tokio::sync::mpsc;

use crate::{GameRecord, RecordStore, ScoreRecord, StoreError};

/// Writes one finished session to the store.
///
/// Creates one multiplayer game record, then one score record per
/// participant that identified as a user and submitted a numeric result.
/// A card-matching finish carries no score and is not stored.
pub async fn persist_report<S: RecordStore>(
    store: &S,
    report: &SessionReport,
) -> Result<GameRecord, StoreError> {
    let game = store.create_game(report.game, true).await?;

    for standing in &report.standings {
        let (Some(user), Some(score)) = (standing.user, standing.result) else {
            continue;
        };
        if score == Score::FINISHED {
            continue;
        }
        store
            .create_score(ScoreRecord {
                user,
                game: game.id,
                score,
            })
            .await?;
    }

    Ok(game)
}

/// Drains session reports into the store until every sender is dropped.
pub(crate) async fn run_recorder<S: RecordStore>(
    store: Arc<S>,
    mut reports: mpsc::UnboundedReceiver<SessionReport>,
) {
    while let Some(report) = reports.recv().await {
        match persist_report(store.as_ref(), &report).await {
            Ok(game) => tracing::debug!(
                session_id = %report.session,
                game_id = %game.id,
                "session recorded"
            ),
            Err(e) => tracing::warn!(
                session_id = %report.session,
                error = %e,
                "failed to record session"
            ),
        }
    }
}
