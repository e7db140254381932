// Error taxonomy for the quiz session and its transport boundary.

use thiserror::Error;

// ---------------------------------------------------------------------------
// GameError
// ---------------------------------------------------------------------------

/// Outcome of a rejected or failed session operation.
///
/// Every variant is a value the caller can render; none of them is fatal to
/// the process. Variants carry owned strings so the façade can publish them
/// in snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// No user identity was available to start a game.
    #[error("a signed-in player is required to start a game")]
    AuthRequired,

    /// The service could not produce a round. Retryable.
    #[error("no round available: {0}")]
    RoundUnavailable(String),

    /// The answer could not be scored. The same answer may be resubmitted.
    #[error("answer submission failed: {0}")]
    SubmissionFailed(String),

    /// An answer for the current round is already in flight or accepted.
    #[error("an answer for this round has already been submitted")]
    AlreadySubmitting,

    /// A response belonging to a superseded session or round was discarded.
    #[error("discarded a response from a superseded session or round")]
    StaleResponse,

    /// A new round was offered while feedback for the current one is shown.
    #[error("the current round is locked until the player advances")]
    RoundLocked,

    /// The operation is not permitted in the controller's current phase.
    #[error("cannot {operation} while {phase}")]
    InvalidTransition {
        operation: &'static str,
        phase: &'static str,
    },

    /// The session actor is no longer running.
    #[error("the game session has shut down")]
    SessionClosed,
}

impl GameError {
    /// Whether this error belongs in the player-visible error list.
    ///
    /// Guard rejections and stale discards leave state untouched and are not
    /// shown.
    pub fn is_reportable(&self) -> bool {
        !matches!(self, GameError::AlreadySubmitting | GameError::StaleResponse)
    }
}

// ---------------------------------------------------------------------------
// ServiceError
// ---------------------------------------------------------------------------

/// Failure reported by a `QuizService` implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The request never produced a response (connect, timeout, ...).
    #[error("network error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("service returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// A required field was absent from an otherwise valid response.
    #[error("response is missing `{0}`")]
    MissingField(&'static str),

    /// The response decoded but violates the domain shape.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl ServiceError {
    /// True when the service rejected the caller's identity.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, ServiceError::Status { status, .. } if matches!(status, 400 | 401 | 403 | 404))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
