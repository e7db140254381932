// JSON shapes exchanged with the quiz backend and their conversion into
// domain types.
//
// Decoding is kept free of I/O so it can be unit-tested against captured
// response bodies.

use globetrotter_core::{
    AnswerOption, AnswerResult, CorrectAnswer, DestinationId, FetchedRound, GameId, GameStatus,
    Round, ServiceError, StartedGame, Submission,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Shown when the backend scores an answer without a fact to go with it.
pub const FALLBACK_FACT: &str = "No fact available";

// ---------------------------------------------------------------------------
// Response documents
// ---------------------------------------------------------------------------

/// The `game` document. The backend serializes its id as `id` on creation
/// and as `_id` everywhere else.
#[derive(Debug, Deserialize)]
struct GameDoc {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "_id")]
    mongo_id: Option<String>,
    #[serde(default)]
    active: Option<bool>,
}

impl GameDoc {
    fn into_status(self) -> Result<GameStatus, ServiceError> {
        let id = self
            .id
            .or(self.mongo_id)
            .ok_or(ServiceError::MissingField("game.id"))?;
        Ok(GameStatus {
            id: GameId::new(id),
            active: self.active.unwrap_or(true),
        })
    }
}

#[derive(Debug, Deserialize)]
struct StartGameResponse {
    game: Option<GameDoc>,
}

#[derive(Debug, Deserialize)]
struct AnswerOptionDoc {
    city: String,
    country: String,
}

/// Round as sent by the backend. Its `correct_answer` field is deliberately
/// not declared so it never leaves this module.
#[derive(Debug, Deserialize)]
struct RoundDoc {
    destination_id: String,
    #[serde(default)]
    clues: Vec<String>,
    #[serde(default)]
    answer_options: Vec<AnswerOptionDoc>,
    #[serde(default)]
    round_index: u32,
}

#[derive(Debug, Deserialize)]
struct FetchRoundResponse {
    game: Option<GameDoc>,
    round: Option<RoundDoc>,
}

#[derive(Debug, Deserialize)]
struct CorrectAnswerDoc {
    city: String,
    country: String,
    #[serde(default)]
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubmitAnswerResponse {
    is_correct: bool,
    #[serde(default)]
    fact: Option<String>,
    correct_answer: CorrectAnswerDoc,
    game: Option<GameDoc>,
    #[serde(default)]
    next_round: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct EndGameResponse {
    game: Option<GameDoc>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

// ---------------------------------------------------------------------------
// Decoders
// ---------------------------------------------------------------------------

fn parse<'a, T: Deserialize<'a>>(body: &'a str) -> Result<T, ServiceError> {
    serde_json::from_str(body).map_err(|e| ServiceError::Decode(e.to_string()))
}

fn optional_status(game: Option<GameDoc>) -> Result<Option<GameStatus>, ServiceError> {
    game.map(GameDoc::into_status).transpose()
}

/// Decode a `POST /games` response.
pub fn decode_started_game(body: &str) -> Result<StartedGame, ServiceError> {
    let response: StartGameResponse = parse(body)?;
    let status = response
        .game
        .ok_or(ServiceError::MissingField("game"))?
        .into_status()?;
    Ok(StartedGame {
        game_id: status.id,
        active: status.active,
    })
}

/// Decode a `POST /games/{id}/round` response.
pub fn decode_fetched_round(body: &str) -> Result<FetchedRound, ServiceError> {
    let response: FetchRoundResponse = parse(body)?;
    let doc = response.round.ok_or(ServiceError::MissingField("round"))?;
    let options = doc
        .answer_options
        .into_iter()
        .map(|o| AnswerOption::new(o.city, o.country))
        .collect();
    let round = Round::new(
        DestinationId::new(doc.destination_id),
        doc.clues,
        options,
        doc.round_index,
    )?;
    Ok(FetchedRound {
        round,
        game: optional_status(response.game)?,
    })
}

/// Decode a `POST /games/{id}/answer` response.
///
/// Some backend versions attach the following round as `next_round`. It is
/// dropped here; only an explicit advance may fetch a round.
pub fn decode_submission(body: &str) -> Result<Submission, ServiceError> {
    let response: SubmitAnswerResponse = parse(body)?;
    if response.next_round.is_some() {
        debug!("Dropping next_round embedded in answer response");
    }
    let fact = response
        .fact
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_FACT.to_string());
    Ok(Submission {
        result: AnswerResult {
            is_correct: response.is_correct,
            fact,
            correct_answer: CorrectAnswer {
                city: response.correct_answer.city,
                country: response.correct_answer.country,
                image_url: response.correct_answer.image_url,
            },
        },
        game: optional_status(response.game)?,
    })
}

/// Decode a `POST /games/{id}/end` response.
pub fn decode_ended_game(body: &str) -> Result<GameStatus, ServiceError> {
    let response: EndGameResponse = parse(body)?;
    response
        .game
        .ok_or(ServiceError::MissingField("game"))?
        .into_status()
}

/// Pull the backend's `{"error": "..."}` message out of a failure body,
/// falling back to the raw text.
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(b) => b.error,
        Err(_) => body.trim().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
