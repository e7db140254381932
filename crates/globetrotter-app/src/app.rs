// Session actor: the single owner of the round controller.
//
// Callers talk to the actor through a cloneable `SessionHandle`. Intents
// arrive on one mpsc channel, service outcomes on another, and the actor
// handles them strictly one at a time. Network calls never run on the actor
// itself; they are spawned and report back with the ticket they were issued
// under, which is how responses that outlive a reset get discarded.
//
// An intent whose outcome depends on a network call (new game, submit,
// advance) keeps its reply sender parked until the matching completion
// arrives. Anything that invalidates the game answers parked replies with
// `StaleResponse`.

use std::sync::Arc;

use globetrotter_core::{
    AnswerResult, Clock, FetchedRound, GameError, GameId, GameStatus, QuizService, Round,
    ServiceError, Session, StartedGame, Submission, SystemClock, UserId,
};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::controller::{
    AdvanceStep, EndRequest, FetchRequest, FinishStep, GameSummary, Phase, RoundController,
    StartRequest, SubmitRequest, Ticket,
};
use crate::protocol::{Advanced, Snapshot, UiUpdate, UserCommand};

const COMMAND_CHANNEL_SIZE: usize = 32;
const SERVICE_CHANNEL_SIZE: usize = 32;

type Reply<T> = oneshot::Sender<Result<T, GameError>>;

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

enum Command {
    NewGame {
        user_id: Option<UserId>,
        reply: Reply<Session>,
    },
    SubmitAnswer {
        choice: String,
        reply: Reply<AnswerResult>,
    },
    Advance {
        reply: Reply<Advanced>,
    },
    Finish {
        reply: Reply<GameSummary>,
    },
    Reset {
        reply: Reply<()>,
    },
    OfferRound {
        round: Round,
        reply: Reply<()>,
    },
    Shutdown,
}

enum ServiceEvent {
    Started {
        ticket: Ticket,
        outcome: Result<StartedGame, ServiceError>,
    },
    Fetched {
        ticket: Ticket,
        outcome: Result<FetchedRound, ServiceError>,
    },
    Submitted {
        ticket: Ticket,
        outcome: Result<Submission, ServiceError>,
    },
    Ended {
        game_id: GameId,
        outcome: Result<GameStatus, ServiceError>,
    },
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Settings for a session actor.
pub struct SessionOptions {
    pub max_rounds: u32,
    pub clock: Arc<dyn Clock>,
    /// Optional push channel for a render loop.
    pub ui_tx: Option<mpsc::Sender<UiUpdate>>,
}

impl SessionOptions {
    pub fn new(max_rounds: u32) -> Self {
        SessionOptions {
            max_rounds,
            clock: Arc::new(SystemClock),
            ui_tx: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ui(mut self, ui_tx: mpsc::Sender<UiUpdate>) -> Self {
        self.ui_tx = Some(ui_tx);
        self
    }
}

/// Start a session actor on the current tokio runtime.
pub fn spawn(
    service: Arc<dyn QuizService>,
    options: SessionOptions,
) -> (SessionHandle, JoinHandle<()>) {
    let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
    let (events_tx, events_rx) = mpsc::channel(SERVICE_CHANNEL_SIZE);
    let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::idle(options.max_rounds));

    let actor = SessionActor {
        controller: RoundController::new(options.max_rounds, options.clock),
        service,
        events_tx,
        snapshot_tx,
        ui_tx: options.ui_tx,
        errors: Vec::new(),
        last_phase: Phase::Idle,
        pending_new_game: None,
        pending_submit: None,
        pending_advance: None,
    };
    let task = tokio::spawn(actor.run(command_rx, events_rx));

    (
        SessionHandle {
            command_tx,
            snapshot_rx,
        },
        task,
    )
}

// ---------------------------------------------------------------------------
// SessionHandle
// ---------------------------------------------------------------------------

/// Cloneable entry point to a running session actor.
///
/// Every operation settles to either its outcome or a `GameError`. Once the
/// actor has stopped, operations fail with `SessionClosed`.
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<Command>,
    snapshot_rx: watch::Receiver<Snapshot>,
}

impl SessionHandle {
    /// Start a game and present its first round.
    ///
    /// Whatever was running is torn down first.
    pub async fn new_game(&self, user_id: Option<UserId>) -> Result<Session, GameError> {
        self.request(|reply| Command::NewGame { user_id, reply }).await
    }

    /// Submit `choice` for the round on screen.
    pub async fn submit_answer(&self, choice: impl Into<String>) -> Result<AnswerResult, GameError> {
        let choice = choice.into();
        self.request(|reply| Command::SubmitAnswer { choice, reply }).await
    }

    /// Acknowledge feedback and move to the next round (or finish).
    pub async fn advance(&self) -> Result<Advanced, GameError> {
        self.request(|reply| Command::Advance { reply }).await
    }

    /// End the game now.
    pub async fn finish(&self) -> Result<GameSummary, GameError> {
        self.request(|reply| Command::Finish { reply }).await
    }

    /// Drop the game and return to idle.
    pub async fn reset(&self) -> Result<(), GameError> {
        self.request(|reply| Command::Reset { reply }).await
    }

    /// Hand the actor a round payload nobody asked for.
    pub async fn offer_round(&self, round: Round) -> Result<(), GameError> {
        self.request(|reply| Command::OfferRound { round, reply }).await
    }

    /// Queue an intent without waiting for its outcome.
    ///
    /// The outcome still shows up in the published snapshot.
    pub async fn send(&self, command: UserCommand) -> Result<(), GameError> {
        let command = match command {
            UserCommand::NewGame(user_id) => Command::NewGame {
                user_id,
                reply: oneshot::channel().0,
            },
            UserCommand::SubmitAnswer(choice) => Command::SubmitAnswer {
                choice,
                reply: oneshot::channel().0,
            },
            UserCommand::Advance => Command::Advance {
                reply: oneshot::channel().0,
            },
            UserCommand::Finish => Command::Finish {
                reply: oneshot::channel().0,
            },
            UserCommand::Reset => Command::Reset {
                reply: oneshot::channel().0,
            },
            UserCommand::Quit => Command::Shutdown,
        };
        self.command_tx
            .send(command)
            .await
            .map_err(|_| GameError::SessionClosed)
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_rx.clone()
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Ask the actor to stop. Parked operations fail with `SessionClosed`.
    pub async fn shutdown(&self) {
        let _ = self.command_tx.send(Command::Shutdown).await;
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> Command) -> Result<T, GameError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| GameError::SessionClosed)?;
        reply_rx.await.map_err(|_| GameError::SessionClosed)?
    }
}

// ---------------------------------------------------------------------------
// SessionActor
// ---------------------------------------------------------------------------

struct SessionActor {
    controller: RoundController,
    service: Arc<dyn QuizService>,
    events_tx: mpsc::Sender<ServiceEvent>,
    snapshot_tx: watch::Sender<Snapshot>,
    ui_tx: Option<mpsc::Sender<UiUpdate>>,
    /// Reportable failures since the last accepted intent.
    errors: Vec<GameError>,
    last_phase: Phase,
    pending_new_game: Option<Reply<Session>>,
    pending_submit: Option<Reply<AnswerResult>>,
    pending_advance: Option<Reply<Advanced>>,
}

impl SessionActor {
    async fn run(
        mut self,
        mut command_rx: mpsc::Receiver<Command>,
        mut events_rx: mpsc::Receiver<ServiceEvent>,
    ) {
        info!("Session actor started");

        loop {
            tokio::select! {
                // --- Intents ---
                command = command_rx.recv() => {
                    match command {
                        Some(Command::Shutdown) => {
                            info!("Shutdown requested");
                            break;
                        }
                        Some(command) => self.handle_command(command).await,
                        None => {
                            info!("All session handles dropped, shutting down");
                            break;
                        }
                    }
                }

                // --- Service outcomes ---
                Some(event) = events_rx.recv() => {
                    self.handle_service_event(event).await;
                }
            }
        }

        self.abandon_pending(GameError::SessionClosed);
        if let Some(ui_tx) = &self.ui_tx {
            let _ = ui_tx.send(UiUpdate::Closed).await;
        }
        info!("Session actor exiting");
    }

    // -- Intents ------------------------------------------------------------

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::NewGame { user_id, reply } => match self.controller.begin_new_game(user_id) {
                Ok(request) => {
                    self.abandon_pending(GameError::StaleResponse);
                    self.errors.clear();
                    self.pending_new_game = Some(reply);
                    self.spawn_start(request);
                }
                Err(e) => self.reject(reply, e),
            },
            Command::SubmitAnswer { choice, reply } => match self.controller.begin_submit(&choice) {
                Ok(request) => {
                    self.errors.clear();
                    self.pending_submit = Some(reply);
                    self.spawn_submit(request);
                }
                Err(e) => self.reject(reply, e),
            },
            Command::Advance { reply } => match self.controller.begin_advance() {
                Ok(AdvanceStep::Fetch(request)) => {
                    self.errors.clear();
                    self.pending_advance = Some(reply);
                    self.spawn_fetch(request);
                }
                Ok(AdvanceStep::Finish { summary, end }) => {
                    self.errors.clear();
                    self.spawn_end(end);
                    let _ = reply.send(Ok(Advanced::Finished(summary)));
                }
                Err(e) => self.reject(reply, e),
            },
            Command::Finish { reply } => match self.controller.finish() {
                Ok(FinishStep::Ended { summary, end }) => {
                    self.abandon_pending(GameError::StaleResponse);
                    self.errors.clear();
                    self.spawn_end(end);
                    let _ = reply.send(Ok(summary));
                }
                Ok(FinishStep::AlreadyFinished(summary)) => {
                    let _ = reply.send(Ok(summary));
                }
                Err(e) => self.reject(reply, e),
            },
            Command::Reset { reply } => {
                self.controller.reset();
                self.abandon_pending(GameError::StaleResponse);
                self.errors.clear();
                let _ = reply.send(Ok(()));
            }
            Command::OfferRound { round, reply } => {
                let _ = reply.send(self.controller.offer_round(&round));
                return;
            }
            Command::Shutdown => return,
        }
        self.publish().await;
    }

    // -- Service outcomes ---------------------------------------------------

    async fn handle_service_event(&mut self, event: ServiceEvent) {
        match event {
            ServiceEvent::Started { ticket, outcome } => {
                match self.controller.complete_start(&ticket, outcome) {
                    Ok(request) => self.spawn_fetch(request),
                    Err(GameError::StaleResponse) => return,
                    Err(e) => {
                        self.report(&e);
                        if let Some(reply) = self.pending_new_game.take() {
                            let _ = reply.send(Err(e));
                        }
                    }
                }
            }
            ServiceEvent::Fetched { ticket, outcome } => {
                match self.controller.complete_fetch(&ticket, outcome) {
                    Ok(round) => {
                        let round = round.clone();
                        if let Some(reply) = self.pending_new_game.take() {
                            let session = self
                                .controller
                                .session()
                                .cloned()
                                .ok_or(GameError::StaleResponse);
                            let _ = reply.send(session);
                        } else if let Some(reply) = self.pending_advance.take() {
                            let _ = reply.send(Ok(Advanced::Round(round)));
                        }
                    }
                    Err(GameError::StaleResponse | GameError::RoundLocked) => return,
                    Err(e) => {
                        self.report(&e);
                        if let Some(reply) = self.pending_new_game.take() {
                            let _ = reply.send(Err(e));
                        } else if let Some(reply) = self.pending_advance.take() {
                            let _ = reply.send(Err(e));
                        }
                    }
                }
            }
            ServiceEvent::Submitted { ticket, outcome } => {
                match self.controller.complete_submit(&ticket, outcome) {
                    Ok(result) => {
                        let result = result.clone();
                        if let Some(reply) = self.pending_submit.take() {
                            let _ = reply.send(Ok(result));
                        }
                    }
                    Err(GameError::StaleResponse) => return,
                    Err(e) => {
                        self.report(&e);
                        if let Some(reply) = self.pending_submit.take() {
                            let _ = reply.send(Err(e));
                        }
                    }
                }
            }
            ServiceEvent::Ended { game_id, outcome } => {
                match outcome {
                    Ok(game) => info!("Game {} closed on server (active: {})", game_id, game.active),
                    Err(e) => warn!("Failed to end game {}: {}", game_id, e),
                }
                return;
            }
        }
        self.publish().await;
    }

    // -- Network calls ------------------------------------------------------

    fn spawn_start(&self, request: StartRequest) {
        let service = Arc::clone(&self.service);
        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = service.start_game(&request.user_id).await;
            let _ = events_tx
                .send(ServiceEvent::Started {
                    ticket: request.ticket,
                    outcome,
                })
                .await;
        });
    }

    fn spawn_fetch(&self, request: FetchRequest) {
        let service = Arc::clone(&self.service);
        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = service
                .fetch_round(&request.game_id, Some(&request.user_id))
                .await;
            let _ = events_tx
                .send(ServiceEvent::Fetched {
                    ticket: request.ticket,
                    outcome,
                })
                .await;
        });
    }

    fn spawn_submit(&self, request: SubmitRequest) {
        let service = Arc::clone(&self.service);
        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = service
                .submit_answer(
                    &request.game_id,
                    &request.destination_id,
                    &request.answer,
                    request.round_index,
                )
                .await;
            let _ = events_tx
                .send(ServiceEvent::Submitted {
                    ticket: request.ticket,
                    outcome,
                })
                .await;
        });
    }

    fn spawn_end(&self, request: EndRequest) {
        let service = Arc::clone(&self.service);
        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = service.end_game(&request.game_id).await;
            let _ = events_tx
                .send(ServiceEvent::Ended {
                    game_id: request.game_id,
                    outcome,
                })
                .await;
        });
    }

    // -- Helpers ------------------------------------------------------------

    fn reject<T>(&mut self, reply: Reply<T>, error: GameError) {
        debug!("Rejected intent: {}", error);
        self.report(&error);
        let _ = reply.send(Err(error));
    }

    fn report(&mut self, error: &GameError) {
        if error.is_reportable() {
            self.errors.push(error.clone());
        }
    }

    /// Settle every parked reply with `error`.
    fn abandon_pending(&mut self, error: GameError) {
        if let Some(reply) = self.pending_new_game.take() {
            let _ = reply.send(Err(error.clone()));
        }
        if let Some(reply) = self.pending_submit.take() {
            let _ = reply.send(Err(error.clone()));
        }
        if let Some(reply) = self.pending_advance.take() {
            let _ = reply.send(Err(error));
        }
    }

    async fn publish(&mut self) {
        let snapshot = Snapshot::capture(&self.controller, &self.errors);
        if snapshot.phase != self.last_phase {
            info!(
                "Session phase: {} -> {}",
                self.last_phase.label(),
                snapshot.phase.label()
            );
            self.last_phase = snapshot.phase;
        }
        self.snapshot_tx.send_replace(snapshot.clone());
        if let Some(ui_tx) = &self.ui_tx {
            let _ = ui_tx.send(UiUpdate::Snapshot(Box::new(snapshot))).await;
        }
    }
}
