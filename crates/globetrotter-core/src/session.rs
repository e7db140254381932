// Session state: the authoritative record of one game.
//
// `Session` values are never mutated in place. Each transition consumes the
// previous value and returns the next one, so the round controller can only
// change a session through the functions below.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::GameError;
use crate::model::{GameId, Score, UserId};

/// Number of questions in a game unless configured otherwise.
pub const DEFAULT_MAX_ROUNDS: u32 = 5;

/// One game instance spanning a fixed number of rounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    id: GameId,
    user_id: UserId,
    active: bool,
    round_index: u32,
    max_rounds: u32,
    score: Score,
    started_at: DateTime<Utc>,
}

impl Session {
    /// Start tracking a game the quiz service has just created.
    ///
    /// Fails with `AuthRequired` when no player identity is available.
    pub fn create(
        user_id: Option<UserId>,
        id: GameId,
        max_rounds: u32,
        started_at: DateTime<Utc>,
    ) -> Result<Session, GameError> {
        let user_id = user_id.ok_or(GameError::AuthRequired)?;
        Ok(Session {
            id,
            user_id,
            active: true,
            round_index: 0,
            max_rounds,
            score: Score::default(),
            started_at,
        })
    }

    /// Count one answer. Callers guarantee this runs once per round.
    #[must_use]
    pub fn record_answer(self, is_correct: bool) -> Session {
        Session {
            score: self.score.with_answer(is_correct),
            ..self
        }
    }

    /// Move the position to the next round.
    #[must_use]
    pub fn enter_next_round(self) -> Session {
        Session {
            round_index: self.round_index + 1,
            ..self
        }
    }

    /// Mark the game as over. Idempotent.
    #[must_use]
    pub fn mark_finished(self) -> Session {
        Session {
            active: false,
            ..self
        }
    }

    pub fn id(&self) -> &GameId {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Zero-based position of the round currently on screen.
    pub fn round_index(&self) -> u32 {
        self.round_index
    }

    /// One-based question number for display ("Question 2/5").
    pub fn question_number(&self) -> u32 {
        self.round_index + 1
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whether the question after the current one would exceed the limit.
    pub fn is_last_round(&self) -> bool {
        self.question_number() >= self.max_rounds
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Session {
        Session::create(
            UserId::parse("player-1"),
            GameId::new("game-1"),
            DEFAULT_MAX_ROUNDS,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn create_requires_identity() {
        let err = Session::create(None, GameId::new("g"), 5, Utc::now()).unwrap_err();
        assert_eq!(err, GameError::AuthRequired);
    }

    #[test]
    fn create_starts_active_at_round_zero() {
        let session = fresh();
        assert!(session.is_active());
        assert_eq!(session.round_index(), 0);
        assert_eq!(session.question_number(), 1);
        assert_eq!(session.score(), Score::default());
        assert_eq!(session.id().as_str(), "game-1");
    }

    #[test]
    fn record_answer_increments_exactly_one_side() {
        let session = fresh().record_answer(false);
        assert_eq!(
            session.score(),
            Score {
                correct: 0,
                incorrect: 1,
                total: 1
            }
        );

        let session = session.record_answer(true);
        assert_eq!(session.score().correct, 1);
        assert_eq!(session.score().incorrect, 1);
        assert_eq!(session.score().total, 2);
    }

    #[test]
    fn record_answer_is_pure() {
        let before = fresh();
        let after = before.clone().record_answer(true);
        assert_eq!(before.score().total, 0);
        assert_eq!(after.score().total, 1);
    }

    #[test]
    fn mark_finished_is_idempotent() {
        let once = fresh().mark_finished();
        let twice = once.clone().mark_finished();
        assert!(!once.is_active());
        assert_eq!(once, twice);
    }

    #[test]
    fn enter_next_round_moves_by_one() {
        let session = fresh().enter_next_round().enter_next_round();
        assert_eq!(session.round_index(), 2);
        assert_eq!(session.question_number(), 3);
    }

    #[test]
    fn last_round_detection() {
        let mut session = fresh();
        for _ in 0..3 {
            assert!(!session.is_last_round());
            session = session.enter_next_round();
        }
        assert!(!session.is_last_round());
        session = session.enter_next_round();
        assert_eq!(session.question_number(), 5);
        assert!(session.is_last_round());
    }
}
