// Round controller: the session/round state machine.
//
//   Idle -> Fetching -> Presenting -> Locked -> Fetching -> ... -> Finished
//
// The controller never performs I/O. Every network-bound transition is split
// in two: a `begin_*` call validates the transition, moves into the in-flight
// state and hands back a request carrying a `Ticket`; the caller performs the
// service call and feeds the outcome to the matching `complete_*` call. The
// ticket records the epoch it was issued under, so anything that completes
// after a reset or finish is recognised as stale and never applied.
//
// Only `begin_advance` (and the first fetch of `begin_new_game`) can produce a
// fetch request. A submission never produces one, which is what keeps the
// displayed round stable until the player explicitly moves on.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use globetrotter_core::{
    AnswerResult, Clock, DestinationId, FetchedRound, GameError, GameId, Round, Score,
    ServiceError, Session, StartedGame, Submission, UserId,
};
use serde::Serialize;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Externally visible phase of the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Idle,
    Fetching,
    Presenting,
    Locked,
    Finished,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Fetching => "fetching",
            Phase::Presenting => "presenting",
            Phase::Locked => "locked",
            Phase::Finished => "finished",
        }
    }
}

/// Identifies which controller state a request was issued from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    epoch: u64,
    /// Unknown until the service has created the game.
    game_id: Option<GameId>,
    round_index: u32,
}

/// Request to create a game on the service.
#[derive(Debug, Clone)]
pub struct StartRequest {
    pub ticket: Ticket,
    pub user_id: UserId,
}

/// Request for the next round.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub ticket: Ticket,
    pub game_id: GameId,
    pub user_id: UserId,
}

/// Request to score an answer.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub ticket: Ticket,
    pub game_id: GameId,
    pub destination_id: DestinationId,
    pub answer: String,
    pub round_index: u32,
}

/// Best-effort request to close the game on the service.
#[derive(Debug, Clone)]
pub struct EndRequest {
    pub game_id: GameId,
}

/// Final tally of a finished game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSummary {
    pub game_id: GameId,
    pub score: Score,
    pub rounds_played: u32,
    pub finished_at: DateTime<Utc>,
}

/// What an accepted `advance` asks the caller to do next.
#[derive(Debug, Clone)]
pub enum AdvanceStep {
    /// Fetch the next round.
    Fetch(FetchRequest),
    /// The game is over; notify the service.
    Finish {
        summary: GameSummary,
        end: EndRequest,
    },
}

/// What an accepted `finish` asks the caller to do next.
#[derive(Debug, Clone)]
pub enum FinishStep {
    /// The game just ended; notify the service.
    Ended {
        summary: GameSummary,
        end: EndRequest,
    },
    /// The game had already ended; nothing to send.
    AlreadyFinished(GameSummary),
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum State {
    Idle,
    /// `StartGame` in flight. No session yet.
    Starting { user_id: UserId },
    /// `FetchRound` in flight. `previous` is the round still on screen.
    Fetching { previous: Option<Round> },
    /// A round is on screen. `answered` is set when a failed advance brought
    /// an already-scored round back; such a round only accepts `advance`.
    Presenting {
        round: Round,
        answered: bool,
        submitting: bool,
    },
    /// Feedback is on screen; the round cannot change until `advance`.
    Locked { round: Round, result: AnswerResult },
    /// Game over. `last` is the round that was on screen when it ended.
    Finished { last: Option<Round> },
}

impl State {
    fn phase(&self) -> Phase {
        match self {
            State::Idle => Phase::Idle,
            State::Starting { .. } | State::Fetching { .. } => Phase::Fetching,
            State::Presenting { .. } => Phase::Presenting,
            State::Locked { .. } => Phase::Locked,
            State::Finished { .. } => Phase::Finished,
        }
    }
}

// ---------------------------------------------------------------------------
// RoundController
// ---------------------------------------------------------------------------

/// Sole owner of the session, the current round and the lock.
pub struct RoundController {
    state: State,
    session: Option<Session>,
    summary: Option<GameSummary>,
    /// Bumped on every teardown. Tickets from older epochs are stale.
    epoch: u64,
    max_rounds: u32,
    clock: Arc<dyn Clock>,
}

impl RoundController {
    pub fn new(max_rounds: u32, clock: Arc<dyn Clock>) -> Self {
        RoundController {
            state: State::Idle,
            session: None,
            summary: None,
            epoch: 0,
            max_rounds,
            clock,
        }
    }

    // -- Queries ------------------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The round on screen. Survives `Fetching` and `Finished`, so it only
    /// changes when a new round is presented or the session is torn down.
    pub fn current_round(&self) -> Option<&Round> {
        match &self.state {
            State::Presenting { round, .. } | State::Locked { round, .. } => Some(round),
            State::Fetching { previous } => previous.as_ref(),
            State::Finished { last } => last.as_ref(),
            _ => None,
        }
    }

    /// Feedback for the current round. Present only while locked.
    pub fn result(&self) -> Option<&AnswerResult> {
        match &self.state {
            State::Locked { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.state, State::Locked { .. })
    }

    /// Whether a service call issued by this controller is outstanding.
    pub fn is_loading(&self) -> bool {
        match &self.state {
            State::Starting { .. } | State::Fetching { .. } => true,
            State::Presenting { submitting, .. } => *submitting,
            _ => false,
        }
    }

    pub fn score(&self) -> Score {
        self.session.as_ref().map(Session::score).unwrap_or_default()
    }

    pub fn is_active(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_active)
    }

    pub fn summary(&self) -> Option<&GameSummary> {
        self.summary.as_ref()
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    /// Whether the on-screen round has already been scored, either locked
    /// with feedback or restored after a failed advance.
    pub fn current_round_answered(&self) -> bool {
        match &self.state {
            State::Locked { .. } => true,
            State::Presenting { answered, .. } => *answered,
            _ => false,
        }
    }

    // -- Reset --------------------------------------------------------------

    /// Tear down session, round and lock, returning to `Idle`.
    ///
    /// Any request still in flight becomes stale.
    pub fn reset(&mut self) {
        self.epoch += 1;
        if let Some(session) = &self.session {
            info!("Resetting game {} (epoch {})", session.id(), self.epoch);
        }
        self.state = State::Idle;
        self.session = None;
        self.summary = None;
    }

    // -- New game -----------------------------------------------------------

    /// Begin a new game for `user_id`, tearing down whatever was running.
    pub fn begin_new_game(&mut self, user_id: Option<UserId>) -> Result<StartRequest, GameError> {
        let user_id = user_id.ok_or(GameError::AuthRequired)?;
        if self.phase() != Phase::Idle || self.summary.is_some() {
            self.reset();
        }
        self.state = State::Starting {
            user_id: user_id.clone(),
        };
        info!("Starting new game for user {}", user_id);
        Ok(StartRequest {
            ticket: self.ticket(None, 0),
            user_id,
        })
    }

    /// Apply the `StartGame` outcome. On success the first round must be
    /// fetched with the returned request.
    pub fn complete_start(
        &mut self,
        ticket: &Ticket,
        outcome: Result<StartedGame, ServiceError>,
    ) -> Result<FetchRequest, GameError> {
        self.check_ticket(ticket)?;
        let State::Starting { user_id } = &self.state else {
            return Err(self.stale("start"));
        };
        let user_id = user_id.clone();

        let started = match outcome {
            Ok(started) => started,
            Err(e) => {
                warn!("Failed to start game: {}", e);
                self.state = State::Idle;
                return Err(if e.is_auth_rejection() {
                    GameError::AuthRequired
                } else {
                    GameError::RoundUnavailable(e.to_string())
                });
            }
        };

        if !started.active {
            self.state = State::Idle;
            return Err(GameError::RoundUnavailable(format!(
                "game {} was created inactive",
                started.game_id
            )));
        }

        let session = Session::create(
            Some(user_id.clone()),
            started.game_id.clone(),
            self.max_rounds,
            self.clock.now(),
        )?;
        info!("Game {} started", session.id());
        self.session = Some(session);
        self.state = State::Fetching { previous: None };

        Ok(FetchRequest {
            ticket: self.ticket(Some(started.game_id.clone()), 0),
            game_id: started.game_id,
            user_id,
        })
    }

    // -- Fetch --------------------------------------------------------------

    /// Apply a `FetchRound` outcome.
    ///
    /// On failure the previous round comes back on screen (already answered)
    /// or, for the first round, the machine returns to `Idle`.
    pub fn complete_fetch(
        &mut self,
        ticket: &Ticket,
        outcome: Result<FetchedRound, ServiceError>,
    ) -> Result<&Round, GameError> {
        self.check_ticket(ticket)?;
        if self.is_locked() {
            debug!("Fetch completed while locked; keeping current round");
            return Err(GameError::RoundLocked);
        }
        let expected_index = match (&self.state, &self.session) {
            (State::Fetching { previous: Some(_) }, Some(session)) => session.round_index() + 1,
            (State::Fetching { previous: None }, Some(_)) => 0,
            _ => return Err(self.stale("fetch")),
        };
        if ticket.round_index != expected_index {
            return Err(self.stale("fetch"));
        }
        let previous = match &mut self.state {
            State::Fetching { previous } => previous.take(),
            _ => None,
        };
        let session = self.session.take().ok_or(GameError::StaleResponse)?;

        let error = match outcome {
            Ok(fetched) => match fetched.game {
                Some(game) if &game.id != session.id() => Some(format!(
                    "round belongs to game {}, expected {}",
                    game.id,
                    session.id()
                )),
                _ => {
                    let session = if previous.is_some() {
                        session.enter_next_round()
                    } else {
                        session
                    };
                    info!(
                        "Presenting question {}/{} (destination {})",
                        session.question_number(),
                        session.max_rounds(),
                        fetched.round.destination_id()
                    );
                    self.session = Some(session);
                    self.state = State::Presenting {
                        round: fetched.round,
                        answered: false,
                        submitting: false,
                    };
                    return match &self.state {
                        State::Presenting { round, .. } => Ok(round),
                        _ => Err(GameError::StaleResponse),
                    };
                }
            },
            Err(e) => Some(e.to_string()),
        };

        let message = error.unwrap_or_default();
        warn!("Failed to fetch round: {}", message);
        match previous {
            Some(round) => {
                self.session = Some(session);
                self.state = State::Presenting {
                    round,
                    answered: true,
                    submitting: false,
                };
            }
            None => {
                self.state = State::Idle;
            }
        }
        Err(GameError::RoundUnavailable(message))
    }

    /// A round payload that nobody asked for. Never applied.
    pub fn offer_round(&self, round: &Round) -> Result<(), GameError> {
        if self.is_locked() {
            debug!(
                "Rejected out-of-band round {} while locked",
                round.destination_id()
            );
            return Err(GameError::RoundLocked);
        }
        debug!("Discarded out-of-band round {}", round.destination_id());
        Err(GameError::StaleResponse)
    }

    // -- Submit -------------------------------------------------------------

    /// Begin scoring `choice` for the current round. Single-flight.
    pub fn begin_submit(&mut self, choice: &str) -> Result<SubmitRequest, GameError> {
        let choice = choice.trim();
        let phase = self.phase();
        let round_index = self.session.as_ref().map(Session::round_index);
        let game_id = self.session.as_ref().map(|s| s.id().clone());

        match &mut self.state {
            State::Presenting {
                round,
                answered,
                submitting,
            } => {
                if *submitting || *answered {
                    return Err(GameError::AlreadySubmitting);
                }
                if choice.is_empty() {
                    return Err(GameError::SubmissionFailed("no answer selected".into()));
                }
                let (Some(round_index), Some(game_id)) = (round_index, game_id) else {
                    return Err(GameError::StaleResponse);
                };
                *submitting = true;
                let request = SubmitRequest {
                    ticket: Ticket {
                        epoch: self.epoch,
                        game_id: Some(game_id.clone()),
                        round_index,
                    },
                    game_id,
                    destination_id: round.destination_id().clone(),
                    answer: choice.to_string(),
                    round_index: round.round_index(),
                };
                info!(
                    "Submitting answer `{}` for destination {}",
                    request.answer, request.destination_id
                );
                Ok(request)
            }
            State::Locked { .. } => Err(GameError::AlreadySubmitting),
            _ => Err(GameError::InvalidTransition {
                operation: "submit an answer",
                phase: phase.label(),
            }),
        }
    }

    /// Apply a `SubmitAnswer` outcome. Success locks the round.
    pub fn complete_submit(
        &mut self,
        ticket: &Ticket,
        outcome: Result<Submission, ServiceError>,
    ) -> Result<&AnswerResult, GameError> {
        self.check_ticket(ticket)?;
        let current_index = self.session.as_ref().map(Session::round_index);
        if current_index != Some(ticket.round_index) {
            return Err(self.stale("submit"));
        }
        let round = match &self.state {
            State::Presenting {
                round,
                submitting: true,
                ..
            } => round.clone(),
            _ => return Err(self.stale("submit")),
        };

        let submission = match outcome {
            Ok(submission) => submission,
            Err(e) => {
                warn!("Answer submission failed: {}", e);
                self.state = State::Presenting {
                    round,
                    answered: false,
                    submitting: false,
                };
                return Err(GameError::SubmissionFailed(e.to_string()));
            }
        };

        let result = submission.result;
        if let Some(session) = self.session.take() {
            self.session = Some(session.record_answer(result.is_correct));
        }
        info!(
            "Answer for destination {} was {} (score: {})",
            round.destination_id(),
            if result.is_correct { "correct" } else { "incorrect" },
            self.score()
        );
        self.state = State::Locked { round, result };

        match &self.state {
            State::Locked { result, .. } => Ok(result),
            _ => Err(GameError::StaleResponse),
        }
    }

    // -- Advance ------------------------------------------------------------

    /// Release the lock and move on: fetch the next round, or finish the game
    /// once the last question has been answered.
    pub fn begin_advance(&mut self) -> Result<AdvanceStep, GameError> {
        let round = match &self.state {
            State::Locked { round, .. } => round.clone(),
            State::Presenting {
                round,
                answered: true,
                submitting: false,
            } => round.clone(),
            other => {
                return Err(GameError::InvalidTransition {
                    operation: "advance",
                    phase: other.phase().label(),
                })
            }
        };
        let session = self.session.as_ref().ok_or(GameError::StaleResponse)?;

        if session.is_last_round() {
            let (summary, end) = self.close_session()?;
            return Ok(AdvanceStep::Finish { summary, end });
        }

        let request = FetchRequest {
            ticket: self.ticket(Some(session.id().clone()), session.round_index() + 1),
            game_id: session.id().clone(),
            user_id: session.user_id().clone(),
        };
        debug!(
            "Advancing past question {} of game {}",
            session.question_number(),
            session.id()
        );
        self.state = State::Fetching {
            previous: Some(round),
        };
        Ok(AdvanceStep::Fetch(request))
    }

    // -- Finish -------------------------------------------------------------

    /// End the game now. Idempotent once finished.
    pub fn finish(&mut self) -> Result<FinishStep, GameError> {
        if let (State::Finished { .. }, Some(summary)) = (&self.state, &self.summary) {
            return Ok(FinishStep::AlreadyFinished(summary.clone()));
        }
        if self.session.is_none() {
            return Err(GameError::InvalidTransition {
                operation: "finish the game",
                phase: self.phase().label(),
            });
        }
        let (summary, end) = self.close_session()?;
        Ok(FinishStep::Ended { summary, end })
    }

    // -- Helpers ------------------------------------------------------------

    /// Move to `Finished`, invalidating anything in flight.
    fn close_session(&mut self) -> Result<(GameSummary, EndRequest), GameError> {
        let session = self
            .session
            .take()
            .ok_or(GameError::StaleResponse)?
            .mark_finished();
        self.epoch += 1;

        let summary = GameSummary {
            game_id: session.id().clone(),
            score: session.score(),
            rounds_played: session.score().total,
            finished_at: self.clock.now(),
        };
        info!("Game {} finished: {}", summary.game_id, summary.score);

        let end = EndRequest {
            game_id: session.id().clone(),
        };
        let last = self.current_round().cloned();
        self.session = Some(session);
        self.summary = Some(summary.clone());
        self.state = State::Finished { last };
        Ok((summary, end))
    }

    fn ticket(&self, game_id: Option<GameId>, round_index: u32) -> Ticket {
        Ticket {
            epoch: self.epoch,
            game_id,
            round_index,
        }
    }

    /// Reject tickets issued before the last teardown or for another game.
    fn check_ticket(&self, ticket: &Ticket) -> Result<(), GameError> {
        if ticket.epoch != self.epoch {
            debug!(
                "Discarding response from epoch {} (current epoch {})",
                ticket.epoch, self.epoch
            );
            return Err(GameError::StaleResponse);
        }
        if let (Some(issued_for), Some(session)) = (&ticket.game_id, &self.session) {
            if issued_for != session.id() {
                debug!(
                    "Discarding response for game {} (current game {})",
                    issued_for,
                    session.id()
                );
                return Err(GameError::StaleResponse);
            }
        }
        Ok(())
    }

    fn stale(&self, operation: &str) -> GameError {
        debug!(
            "Discarding {} response in phase {}",
            operation,
            self.phase().label()
        );
        GameError::StaleResponse
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
