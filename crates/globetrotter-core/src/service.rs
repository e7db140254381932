// Boundary to the remote quiz service.
//
// The round controller only ever talks to this trait. The HTTP adapter lives
// in `globetrotter-api`; tests supply scripted in-memory implementations.

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::model::{
    DestinationId, FetchedRound, GameId, GameStatus, StartedGame, Submission, UserId,
};

/// Stateless async operations offered by the quiz backend.
#[async_trait]
pub trait QuizService: Send + Sync {
    /// Create a new game for `user_id`.
    async fn start_game(&self, user_id: &UserId) -> Result<StartedGame, ServiceError>;

    /// Ask the service for the next round of `game_id`.
    ///
    /// When `user_id` is given the service excludes destinations the player
    /// has already seen.
    async fn fetch_round(
        &self,
        game_id: &GameId,
        user_id: Option<&UserId>,
    ) -> Result<FetchedRound, ServiceError>;

    /// Score `answer` for the round identified by `destination_id`/`round_index`.
    ///
    /// Implementations must not surface any follow-up round the backend
    /// attaches to the response.
    async fn submit_answer(
        &self,
        game_id: &GameId,
        destination_id: &DestinationId,
        answer: &str,
        round_index: u32,
    ) -> Result<Submission, ServiceError>;

    /// Close the game on the server. Callers treat failure as non-fatal.
    async fn end_game(&self, game_id: &GameId) -> Result<GameStatus, ServiceError>;
}
