//! Shared helpers for session actor integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use globetrotter_app::{spawn, SessionHandle, SessionOptions, Snapshot};
use globetrotter_core::{
    AnswerOption, AnswerResult, CorrectAnswer, DestinationId, FetchedRound, FixedClock, GameId,
    GameStatus, QuizService, Round, ServiceError, StartedGame, Submission, UserId,
};
use tokio::sync::{watch, Semaphore};

pub const GAME_ID: &str = "game-1";
pub const CORRECT_CITY: &str = "Paris";

pub fn user() -> Option<UserId> {
    UserId::parse("player-1")
}

/// A valid round at position `n` for `GAME_ID`.
pub fn round(n: u32) -> Round {
    Round::new(
        DestinationId::new(format!("dest-{n}")),
        vec![
            format!("Clue one for destination {n}"),
            format!("Clue two for destination {n}"),
        ],
        vec![
            AnswerOption::new("Paris", "France"),
            AnswerOption::new("Rome", "Italy"),
            AnswerOption::new("Tokyo", "Japan"),
            AnswerOption::new("Lima", "Peru"),
        ],
        n,
    )
    .unwrap()
}

pub fn fetched(n: u32) -> FetchedRound {
    FetchedRound {
        round: round(n),
        game: Some(GameStatus {
            id: GameId::new(GAME_ID),
            active: true,
        }),
    }
}

pub fn transport_error() -> ServiceError {
    ServiceError::Transport("connection refused".into())
}

// ---------------------------------------------------------------------------
// FakeQuizService
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Script {
    starts: VecDeque<Result<StartedGame, ServiceError>>,
    fetches: VecDeque<Result<FetchedRound, ServiceError>>,
    submissions: VecDeque<Result<Submission, ServiceError>>,
    ends: VecDeque<Result<GameStatus, ServiceError>>,
    rounds_served: u32,
}

type Gate = Mutex<Option<Arc<Semaphore>>>;

/// In-memory quiz backend.
///
/// Unscripted calls succeed: games are created as `GAME_ID`, rounds are
/// served in order, and an answer is correct when it equals `CORRECT_CITY`.
/// Queued outcomes take precedence. A held operation waits for a permit on
/// its gate before answering.
#[derive(Default)]
pub struct FakeQuizService {
    script: Mutex<Script>,
    start_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
    submit_calls: AtomicUsize,
    end_calls: AtomicUsize,
    submitted: Mutex<Vec<(String, u32)>>,
    start_gate: Gate,
    fetch_gate: Gate,
    submit_gate: Gate,
}

impl FakeQuizService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn queue_start(&self, outcome: Result<StartedGame, ServiceError>) {
        self.script.lock().unwrap().starts.push_back(outcome);
    }

    pub fn queue_fetch(&self, outcome: Result<FetchedRound, ServiceError>) {
        self.script.lock().unwrap().fetches.push_back(outcome);
    }

    pub fn queue_submission(&self, outcome: Result<Submission, ServiceError>) {
        self.script.lock().unwrap().submissions.push_back(outcome);
    }

    pub fn queue_end(&self, outcome: Result<GameStatus, ServiceError>) {
        self.script.lock().unwrap().ends.push_back(outcome);
    }

    /// Hold every later `start_game` until a permit is added.
    pub fn hold_starts(&self) -> Arc<Semaphore> {
        install_gate(&self.start_gate)
    }

    /// Hold every later `fetch_round` until a permit is added.
    pub fn hold_fetches(&self) -> Arc<Semaphore> {
        install_gate(&self.fetch_gate)
    }

    /// Hold every later `submit_answer` until a permit is added.
    pub fn hold_submits(&self) -> Arc<Semaphore> {
        install_gate(&self.submit_gate)
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn end_calls(&self) -> usize {
        self.end_calls.load(Ordering::SeqCst)
    }

    /// `(answer, round_index)` pairs in call order.
    pub fn submitted(&self) -> Vec<(String, u32)> {
        self.submitted.lock().unwrap().clone()
    }
}

fn install_gate(gate: &Gate) -> Arc<Semaphore> {
    let semaphore = Arc::new(Semaphore::new(0));
    *gate.lock().unwrap() = Some(Arc::clone(&semaphore));
    semaphore
}

async fn pass(gate: &Gate) {
    let semaphore = gate.lock().unwrap().clone();
    if let Some(semaphore) = semaphore {
        semaphore.acquire().await.unwrap().forget();
    }
}

fn verdict(answer: &str) -> Submission {
    Submission {
        result: AnswerResult {
            is_correct: answer == CORRECT_CITY,
            fact: format!("{CORRECT_CITY} has a lot of bridges."),
            correct_answer: CorrectAnswer {
                city: CORRECT_CITY.into(),
                country: "France".into(),
                image_url: None,
            },
        },
        game: None,
    }
}

#[async_trait]
impl QuizService for FakeQuizService {
    async fn start_game(&self, _user_id: &UserId) -> Result<StartedGame, ServiceError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        pass(&self.start_gate).await;
        let queued = self.script.lock().unwrap().starts.pop_front();
        queued.unwrap_or_else(|| {
            Ok(StartedGame {
                game_id: GameId::new(GAME_ID),
                active: true,
            })
        })
    }

    async fn fetch_round(
        &self,
        _game_id: &GameId,
        _user_id: Option<&UserId>,
    ) -> Result<FetchedRound, ServiceError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        pass(&self.fetch_gate).await;
        let mut script = self.script.lock().unwrap();
        let outcome = match script.fetches.pop_front() {
            Some(outcome) => outcome,
            None => Ok(fetched(script.rounds_served)),
        };
        if outcome.is_ok() {
            script.rounds_served += 1;
        }
        outcome
    }

    async fn submit_answer(
        &self,
        _game_id: &GameId,
        _destination_id: &DestinationId,
        answer: &str,
        round_index: u32,
    ) -> Result<Submission, ServiceError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted
            .lock()
            .unwrap()
            .push((answer.to_string(), round_index));
        pass(&self.submit_gate).await;
        let queued = self.script.lock().unwrap().submissions.pop_front();
        queued.unwrap_or_else(|| Ok(verdict(answer)))
    }

    async fn end_game(&self, game_id: &GameId) -> Result<GameStatus, ServiceError> {
        self.end_calls.fetch_add(1, Ordering::SeqCst);
        let queued = self.script.lock().unwrap().ends.pop_front();
        queued.unwrap_or_else(|| {
            Ok(GameStatus {
                id: game_id.clone(),
                active: false,
            })
        })
    }
}

// ---------------------------------------------------------------------------
// Session helpers
// ---------------------------------------------------------------------------

pub fn options(max_rounds: u32) -> SessionOptions {
    SessionOptions::new(max_rounds).with_clock(Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
    )))
}

/// Spawn a session actor backed by `service`.
pub fn start_session(service: &Arc<FakeQuizService>, max_rounds: u32) -> SessionHandle {
    let service: Arc<dyn QuizService> = service.clone();
    let (handle, _task) = spawn(service, options(max_rounds));
    handle
}

/// Wait until the published snapshot satisfies `predicate`.
pub async fn wait_for(
    rx: &mut watch::Receiver<Snapshot>,
    predicate: impl FnMut(&Snapshot) -> bool,
) -> Snapshot {
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
        .await
        .expect("timed out waiting for snapshot")
        .expect("session actor stopped")
        .clone()
}

/// Give spawned tasks and the actor a chance to drain their queues.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
