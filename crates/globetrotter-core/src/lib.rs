// Domain types and the service boundary for the globetrotter quiz client.

pub mod clock;
pub mod error;
pub mod model;
pub mod service;
pub mod session;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{GameError, ServiceError};
pub use model::{
    AnswerOption, AnswerResult, CorrectAnswer, DestinationId, FetchedRound, GameId, GameStatus,
    Round, Score, StartedGame, Submission, UserId,
};
pub use service::QuizService;
pub use session::{Session, DEFAULT_MAX_ROUNDS};
