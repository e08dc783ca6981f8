//! Outcome rules: who won a round.
//!
//! These are pure functions over a slice of [`Contender`]s, one per
//! participant in participant order. No clocks, no channels; the
//! [`Round`](crate::Round) decides *when* to resolve and calls in here to
//! decide *who* won.
//!
//! # The two rules
//!
//! - **Highest score** (Simon, NRG): let `M` be the highest submitted
//!   result across every participant, including ones who submitted and
//!   then left. Every connected participant whose result equals `M` wins;
//!   everyone else connected loses. Ties produce several winners.
//! - **First finisher** (card matching): the first participant to clear
//!   the board wins; every other connected participant loses.
//!
//! Under both rules a participant who is the only one still connected
//! wins by default, and disconnected participants are [`Verdict::Left`].

use brainfreeze_protocol::{ConnectionId, GameType, Score, SessionId, UserId};

/// How a game's round is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Resolve once every connected participant submitted; highest wins.
    HighestScore,
    /// Resolve on the first finish; the finisher wins.
    FirstFinisher,
}

impl Rule {
    /// The rule a game is played under.
    pub fn for_game(game: GameType) -> Self {
        match game {
            GameType::Simon | GameType::Nrg => Self::HighestScore,
            GameType::Cardflip => Self::FirstFinisher,
        }
    }
}

/// One participant's final verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Won,
    Lost,
    /// Disconnected before the round resolved.
    Left,
}

/// Input to the outcome rules: one participant's state at resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contender {
    /// The participant's submitted result, if any.
    pub result: Option<Score>,
    /// Whether the participant is still connected.
    pub connected: bool,
}

/// Applies the highest-score rule. Returns one verdict per contender.
pub fn highest_score(contenders: &[Contender]) -> Vec<Verdict> {
    // A lone survivor wins by default only if nobody else put up a result.
    if let Some(sole) = sole_connected(contenders) {
        let others_submitted = contenders
            .iter()
            .enumerate()
            .any(|(i, c)| i != sole && c.result.is_some());
        if !others_submitted {
            return by_default(contenders, sole);
        }
    }

    let best = contenders.iter().filter_map(|c| c.result).max();
    contenders
        .iter()
        .map(|c| match (c.connected, c.result) {
            (false, _) => Verdict::Left,
            (true, Some(result)) if Some(result) == best => Verdict::Won,
            (true, _) => Verdict::Lost,
        })
        .collect()
}

/// Applies the first-finisher rule. `finisher` indexes into `contenders`;
/// `None` means nobody finished (the round timed out).
pub fn first_finisher(contenders: &[Contender], finisher: Option<usize>) -> Vec<Verdict> {
    let winner = finisher.or_else(|| sole_connected(contenders));
    contenders
        .iter()
        .enumerate()
        .map(|(i, c)| {
            if !c.connected {
                Verdict::Left
            } else if Some(i) == winner {
                Verdict::Won
            } else {
                Verdict::Lost
            }
        })
        .collect()
}

/// Index of the only connected contender, if exactly one is connected.
fn sole_connected(contenders: &[Contender]) -> Option<usize> {
    let mut connected = contenders.iter().enumerate().filter(|(_, c)| c.connected);
    match (connected.next(), connected.next()) {
        (Some((i, _)), None) => Some(i),
        _ => None,
    }
}

fn by_default(contenders: &[Contender], winner: usize) -> Vec<Verdict> {
    (0..contenders.len())
        .map(|i| if i == winner { Verdict::Won } else { Verdict::Left })
        .collect()
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// One participant's line in a [`SessionReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub conn: ConnectionId,
    /// The user this connection identified as, if it did.
    pub user: Option<UserId>,
    pub result: Option<Score>,
    pub verdict: Verdict,
}

/// The final standings of a resolved session.
///
/// Emitted once, when the session becomes terminal. The server persists
/// these through its record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub session: SessionId,
    pub game: GameType,
    /// One entry per participant, in participant order.
    pub standings: Vec<Standing>,
}

impl SessionReport {
    /// Participants who won.
    pub fn winners(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.standings
            .iter()
            .filter(|s| s.verdict == Verdict::Won)
            .map(|s| s.conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submitted(score: u32) -> Contender {
        Contender {
            result: Some(Score(score)),
            connected: true,
        }
    }

    fn waiting() -> Contender {
        Contender {
            result: None,
            connected: true,
        }
    }

    fn gone(result: Option<u32>) -> Contender {
        Contender {
            result: result.map(Score),
            connected: false,
        }
    }

    use Verdict::{Left, Lost, Won};

    #[test]
    fn test_highest_score_ties_are_all_winners() {
        // {A:5, B:5, C:3}
        let verdicts = highest_score(&[submitted(5), submitted(5), submitted(3)]);
        assert_eq!(verdicts, vec![Won, Won, Lost]);
    }

    #[test]
    fn test_highest_score_sole_survivor_wins() {
        // {A:5} after B and C disconnect without submitting.
        let verdicts = highest_score(&[submitted(5), gone(None), gone(None)]);
        assert_eq!(verdicts, vec![Won, Left, Left]);
    }

    #[test]
    fn test_highest_score_sole_survivor_without_result_wins_by_default() {
        let verdicts = highest_score(&[waiting(), gone(None)]);
        assert_eq!(verdicts, vec![Won, Left]);
    }

    #[test]
    fn test_highest_score_sole_survivor_loses_to_departed_result() {
        let verdicts = highest_score(&[waiting(), gone(Some(9))]);
        assert_eq!(verdicts, vec![Lost, Left]);

        let verdicts = highest_score(&[submitted(5), gone(Some(8))]);
        assert_eq!(verdicts, vec![Lost, Left]);
    }

    #[test]
    fn test_highest_score_sole_survivor_matching_departed_best_wins() {
        let verdicts = highest_score(&[submitted(8), gone(Some(8)), gone(None)]);
        assert_eq!(verdicts, vec![Won, Left, Left]);
    }

    #[test]
    fn test_highest_score_departed_result_still_counts() {
        // C scored 8 then left; A and B (4 and 6) both lose to it.
        let verdicts = highest_score(&[submitted(4), submitted(6), gone(Some(8))]);
        assert_eq!(verdicts, vec![Lost, Lost, Left]);
    }

    #[test]
    fn test_highest_score_missing_results_lose() {
        let verdicts = highest_score(&[submitted(2), waiting(), waiting()]);
        assert_eq!(verdicts, vec![Won, Lost, Lost]);
    }

    #[test]
    fn test_highest_score_nobody_submitted_everyone_loses() {
        let verdicts = highest_score(&[waiting(), waiting()]);
        assert_eq!(verdicts, vec![Lost, Lost]);
    }

    #[test]
    fn test_first_finisher_wins_others_lose() {
        let verdicts = first_finisher(&[waiting(), submitted(u32::MAX), gone(None)], Some(1));
        assert_eq!(verdicts, vec![Lost, Won, Left]);
    }

    #[test]
    fn test_first_finisher_timeout_sole_survivor_wins() {
        let verdicts = first_finisher(&[gone(None), waiting()], None);
        assert_eq!(verdicts, vec![Left, Won]);
    }

    #[test]
    fn test_first_finisher_timeout_nobody_wins() {
        let verdicts = first_finisher(&[waiting(), waiting()], None);
        assert_eq!(verdicts, vec![Lost, Lost]);
    }

    #[test]
    fn test_rule_for_game() {
        assert_eq!(Rule::for_game(GameType::Simon), Rule::HighestScore);
        assert_eq!(Rule::for_game(GameType::Nrg), Rule::HighestScore);
        assert_eq!(Rule::for_game(GameType::Cardflip), Rule::FirstFinisher);
    }
}
