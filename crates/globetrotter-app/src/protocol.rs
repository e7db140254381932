// Messages exchanged between the session actor and its callers.

use globetrotter_core::{AnswerResult, GameError, Round, Score, UserId};
use serde::Serialize;

use crate::controller::{GameSummary, Phase, RoundController};

/// Intents a presentation layer may send without waiting for the outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    NewGame(Option<UserId>),
    SubmitAnswer(String),
    Advance,
    Finish,
    Reset,
    Quit,
}

/// Updates pushed to the TUI render loop.
#[derive(Debug, Clone)]
pub enum UiUpdate {
    /// Full state after a transition.
    Snapshot(Box<Snapshot>),
    /// The actor has stopped; no further updates will arrive.
    Closed,
}

/// Outcome of a successful `advance`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advanced {
    /// The next round is on screen.
    Round(Round),
    /// That was the last question.
    Finished(GameSummary),
}

/// Read-only view of the session, published after every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub current_round: Option<Round>,
    pub result: Option<AnswerResult>,
    pub is_locked: bool,
    pub score: Score,
    pub is_active: bool,
    pub loading: bool,
    /// The round on screen has been scored and `advance` will be accepted.
    pub can_advance: bool,
    /// One-based; zero when no game is running.
    pub question_number: u32,
    pub max_rounds: u32,
    pub summary: Option<GameSummary>,
    /// Failures since the last accepted intent.
    #[serde(skip)]
    pub errors: Vec<GameError>,
}

impl Snapshot {
    /// An idle session with nothing on screen.
    pub fn idle(max_rounds: u32) -> Self {
        Snapshot {
            phase: Phase::Idle,
            current_round: None,
            result: None,
            is_locked: false,
            score: Score::default(),
            is_active: false,
            loading: false,
            can_advance: false,
            question_number: 0,
            max_rounds,
            summary: None,
            errors: Vec::new(),
        }
    }

    pub fn capture(controller: &RoundController, errors: &[GameError]) -> Self {
        let question_number = match controller.phase() {
            Phase::Idle => 0,
            _ => controller
                .session()
                .map(|s| s.question_number())
                .unwrap_or(0),
        };
        Snapshot {
            phase: controller.phase(),
            current_round: controller.current_round().cloned(),
            result: controller.result().cloned(),
            is_locked: controller.is_locked(),
            score: controller.score(),
            is_active: controller.is_active(),
            loading: controller.is_loading(),
            can_advance: controller.current_round_answered() && !controller.is_loading(),
            question_number,
            max_rounds: controller.max_rounds(),
            summary: controller.summary().cloned(),
            errors: errors.to_vec(),
        }
    }

    /// Most recent failure, if any.
    pub fn last_error(&self) -> Option<&GameError> {
        self.errors.last()
    }
}
