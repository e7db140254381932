// HTTP implementation of `QuizService` using reqwest.
//
// Each call is a single JSON POST against the backend's `/games` routes. No
// retries are attempted here; the round controller decides what a failure
// means for the session.

use std::time::Duration;

use async_trait::async_trait;
use globetrotter_core::{
    DestinationId, FetchedRound, GameId, GameStatus, QuizService, ServiceError, StartedGame,
    Submission, UserId,
};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::wire;

// ---------------------------------------------------------------------------
// HttpQuizService
// ---------------------------------------------------------------------------

/// Quiz backend reached over HTTP.
pub struct HttpQuizService {
    http: reqwest::Client,
    base_url: String,
}

impl HttpQuizService {
    /// Build a client for `base_url` (e.g. `http://localhost:5000/api`).
    ///
    /// `timeout` bounds each request end to end.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(HttpQuizService {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST to `path`, returning the body of a 2xx response.
    async fn post(&self, path: &str, body: Option<&Value>) -> Result<String, ServiceError> {
        let url = self.url(path);
        debug!("POST {}", url);

        let mut request = self.http.post(&url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            warn!("Request to {} failed: {}", url, e);
            ServiceError::Transport(e.to_string())
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = wire::error_message(&text);
            warn!("{} returned {}: {}", url, status, message);
            return Err(ServiceError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(text)
    }
}

#[async_trait]
impl QuizService for HttpQuizService {
    async fn start_game(&self, user_id: &UserId) -> Result<StartedGame, ServiceError> {
        let body = json!({ "user_id": user_id.as_str() });
        let text = self.post("/games", Some(&body)).await?;
        wire::decode_started_game(&text)
    }

    async fn fetch_round(
        &self,
        game_id: &GameId,
        user_id: Option<&UserId>,
    ) -> Result<FetchedRound, ServiceError> {
        let body = match user_id {
            Some(user) => json!({ "user_id": user.as_str() }),
            None => json!({}),
        };
        let text = self
            .post(&format!("/games/{game_id}/round"), Some(&body))
            .await?;
        wire::decode_fetched_round(&text)
    }

    async fn submit_answer(
        &self,
        game_id: &GameId,
        destination_id: &DestinationId,
        answer: &str,
        round_index: u32,
    ) -> Result<Submission, ServiceError> {
        let body = json!({
            "destination_id": destination_id.as_str(),
            "answer": answer,
            "round_index": round_index,
            "auto_advance": false,
        });
        let text = self
            .post(&format!("/games/{game_id}/answer"), Some(&body))
            .await?;
        wire::decode_submission(&text)
    }

    async fn end_game(&self, game_id: &GameId) -> Result<GameStatus, ServiceError> {
        let text = self.post(&format!("/games/{game_id}/end"), None).await?;
        wire::decode_ended_game(&text)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
