// Domain model shared by the controller, the transport adapter and the TUI.
//
// Everything here is plain data. `Round` is the only type with a shape
// contract (non-empty clues, at least two answer options, unique cities),
// enforced by `Round::new` so a malformed payload never becomes current.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Identity of the player, supplied by the external registration flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Build a `UserId`, returning `None` for blank input.
    pub fn parse(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(UserId(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-assigned identifier of one game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(String);

impl GameId {
    pub fn new(raw: impl Into<String>) -> Self {
        GameId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier of the destination a round is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DestinationId(String);

impl DestinationId {
    pub fn new(raw: impl Into<String>) -> Self {
        DestinationId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Rounds and answers
// ---------------------------------------------------------------------------

/// One selectable answer: a city and the country it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub city: String,
    pub country: String,
}

impl AnswerOption {
    pub fn new(city: impl Into<String>, country: impl Into<String>) -> Self {
        AnswerOption {
            city: city.into(),
            country: country.into(),
        }
    }
}

impl fmt::Display for AnswerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.city, self.country)
    }
}

/// A single question cycle. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Round {
    destination_id: DestinationId,
    clues: Vec<String>,
    answer_options: Vec<AnswerOption>,
    round_index: u32,
}

impl Round {
    /// Validate and build a round.
    ///
    /// Rejects rounds with no clues, fewer than two options, or two options
    /// naming the same city.
    pub fn new(
        destination_id: DestinationId,
        clues: Vec<String>,
        answer_options: Vec<AnswerOption>,
        round_index: u32,
    ) -> Result<Self, ServiceError> {
        if clues.iter().all(|c| c.trim().is_empty()) {
            return Err(ServiceError::InvalidPayload(format!(
                "round for destination {destination_id} has no clues"
            )));
        }
        if answer_options.len() < 2 {
            return Err(ServiceError::InvalidPayload(format!(
                "round for destination {destination_id} has {} answer option(s), need at least 2",
                answer_options.len()
            )));
        }
        let mut seen = HashSet::new();
        for option in &answer_options {
            if !seen.insert(option.city.as_str()) {
                return Err(ServiceError::InvalidPayload(format!(
                    "duplicate answer option `{}`",
                    option.city
                )));
            }
        }

        Ok(Round {
            destination_id,
            clues,
            answer_options,
            round_index,
        })
    }

    pub fn destination_id(&self) -> &DestinationId {
        &self.destination_id
    }

    pub fn clues(&self) -> &[String] {
        &self.clues
    }

    pub fn answer_options(&self) -> &[AnswerOption] {
        &self.answer_options
    }

    /// Index of this round as assigned by the quiz service.
    pub fn round_index(&self) -> u32 {
        self.round_index
    }
}

/// The revealed answer, as returned alongside the verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectAnswer {
    pub city: String,
    pub country: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Verdict for one submitted answer. Exists only while the round is locked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub is_correct: bool,
    pub fact: String,
    pub correct_answer: CorrectAnswer,
}

// ---------------------------------------------------------------------------
// Score
// ---------------------------------------------------------------------------

/// Running tally for the current session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub correct: u32,
    pub incorrect: u32,
    pub total: u32,
}

impl Score {
    /// Score after one more answer.
    pub fn with_answer(self, is_correct: bool) -> Self {
        if is_correct {
            Score {
                correct: self.correct + 1,
                total: self.total + 1,
                ..self
            }
        } else {
            Score {
                incorrect: self.incorrect + 1,
                total: self.total + 1,
                ..self
            }
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} correct / {} incorrect ({} answered)",
            self.correct, self.incorrect, self.total
        )
    }
}

// ---------------------------------------------------------------------------
// Service payloads
// ---------------------------------------------------------------------------

/// Server-side view of a game, echoed on most responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameStatus {
    pub id: GameId,
    pub active: bool,
}

/// Result of `StartGame`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedGame {
    pub game_id: GameId,
    pub active: bool,
}

/// Result of `FetchRound`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedRound {
    pub round: Round,
    pub game: Option<GameStatus>,
}

/// Result of `SubmitAnswer`. Carries no round by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub result: AnswerResult,
    pub game: Option<GameStatus>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
