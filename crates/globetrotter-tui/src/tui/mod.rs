// TUI: layout, input handling, and widget rendering.
//
// The TUI owns a `ViewState` holding the latest session snapshot. The session
// actor pushes `UiUpdate` messages over an mpsc channel; the TUI applies them
// and re-renders at ~30 fps. Key presses become `UserCommand`s sent through
// the `SessionHandle`; the TUI never changes session state itself.

pub mod input;
pub mod layout;
pub mod widgets;

use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use globetrotter_app::{SessionHandle, Snapshot, UiUpdate, UserCommand};
use globetrotter_core::UserId;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use layout::{build_layout, AppLayout};

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// TUI-local state for rendering.
pub struct ViewState {
    /// Latest snapshot published by the session actor.
    pub snapshot: Snapshot,
    /// Identity sent with "start".
    pub user_id: Option<UserId>,
    /// Option index the player picked for the round on screen.
    pub selected: Option<usize>,
    /// The session actor has stopped.
    pub closed: bool,
}

impl ViewState {
    pub fn new(user_id: Option<UserId>, max_rounds: u32) -> Self {
        ViewState {
            snapshot: Snapshot::idle(max_rounds),
            user_id,
            selected: None,
            closed: false,
        }
    }

    /// Replace the snapshot. A new round drops the previous pick.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        if snapshot.current_round != self.snapshot.current_round {
            self.selected = None;
        }
        self.snapshot = snapshot;
    }
}

/// Apply a single UiUpdate to the ViewState.
fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::Snapshot(snapshot) => state.apply_snapshot(*snapshot),
        UiUpdate::Closed => state.closed = true,
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the complete frame.
fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render(frame, layout.status_bar, state);
    widgets::clues::render(frame, layout.clues, state);
    widgets::options::render(frame, layout.options, state);
    widgets::feedback::render(frame, layout.feedback, state);
    render_message_bar(frame, &layout, state);
    render_help_bar(frame, &layout);
}

fn render_message_bar(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let text = match state.snapshot.last_error() {
        Some(error) => format!(" {}", error_message(error)),
        None => String::new(),
    };
    let paragraph = Paragraph::new(Line::from(Span::styled(
        text,
        Style::default().fg(Color::Red),
    )));
    frame.render_widget(paragraph, layout.message_bar);
}

/// Player-facing wording for a session error.
pub fn error_message(error: &globetrotter_core::GameError) -> String {
    use globetrotter_core::GameError;
    match error {
        GameError::AuthRequired => {
            "Please sign in first (set player.user_id or GLOBETROTTER_USER).".to_string()
        }
        GameError::RoundUnavailable(_) => {
            "Could not load the next destination. Press n to retry or r to restart.".to_string()
        }
        GameError::SubmissionFailed(_) => {
            "Could not submit your answer. Pick again to retry.".to_string()
        }
        GameError::SessionClosed => "The session has ended.".to_string(),
        other => other.to_string(),
    }
}

fn render_help_bar(frame: &mut Frame, layout: &AppLayout) {
    let text = " s:Start | 1-9:Answer | n/Enter:Next | f:Finish | r:Restart | q:Quit";
    let paragraph = Paragraph::new(Line::from(vec![Span::styled(
        text,
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::DIM),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, layout.help_bar);
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop until the player quits or the session stops.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    handle: SessionHandle,
    user_id: Option<UserId>,
    max_rounds: u32,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    // Restore the terminal before the default hook prints the panic.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ratatui::restore();
        original_hook(panic_info);
    }));

    let mut view_state = ViewState::new(user_id, max_rounds);
    let mut event_stream = EventStream::new();

    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            update = ui_rx.recv() => {
                match update {
                    Some(update) => {
                        apply_ui_update(&mut view_state, update);
                        if view_state.closed {
                            break;
                        }
                    }
                    None => break,
                }
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(command) = input::handle_key(key_event, &mut view_state) {
                            let quit = command == UserCommand::Quit;
                            debug!("Sending {:?}", command);
                            if let Err(e) = handle.send(command).await {
                                warn!("Session unavailable: {}", e);
                                break;
                            }
                            if quit {
                                break;
                            }
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("Terminal input error: {}", e);
                        break;
                    }
                    None => break,
                }
            }

            _ = render_tick.tick() => {
                terminal.draw(|frame| render_frame(frame, &view_state))?;
            }
        }
    }

    ratatui::restore();
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use globetrotter_app::Phase;
    use globetrotter_core::{AnswerOption, DestinationId, GameError, Round};

    fn round(id: &str) -> Round {
        Round::new(
            DestinationId::new(id),
            vec!["A clue".into()],
            vec![
                AnswerOption::new("Paris", "France"),
                AnswerOption::new("Rome", "Italy"),
            ],
            0,
        )
        .unwrap()
    }

    fn presenting(id: &str) -> Snapshot {
        Snapshot {
            phase: Phase::Presenting,
            current_round: Some(round(id)),
            is_active: true,
            question_number: 1,
            ..Snapshot::idle(5)
        }
    }

    #[test]
    fn view_state_starts_idle() {
        let state = ViewState::new(None, 5);
        assert_eq!(state.snapshot, Snapshot::idle(5));
        assert!(state.selected.is_none());
        assert!(!state.closed);
    }

    #[test]
    fn same_round_keeps_selection() {
        let mut state = ViewState::new(None, 5);
        state.apply_snapshot(presenting("d1"));
        state.selected = Some(1);

        let mut locked = presenting("d1");
        locked.phase = Phase::Locked;
        apply_ui_update(&mut state, UiUpdate::Snapshot(Box::new(locked)));
        assert_eq!(state.selected, Some(1));
        assert_eq!(state.snapshot.phase, Phase::Locked);
    }

    #[test]
    fn new_round_clears_selection() {
        let mut state = ViewState::new(None, 5);
        state.apply_snapshot(presenting("d1"));
        state.selected = Some(0);

        apply_ui_update(&mut state, UiUpdate::Snapshot(Box::new(presenting("d2"))));
        assert_eq!(state.selected, None);
    }

    #[test]
    fn closed_update_marks_state() {
        let mut state = ViewState::new(None, 5);
        apply_ui_update(&mut state, UiUpdate::Closed);
        assert!(state.closed);
    }

    #[test]
    fn error_messages_are_player_facing() {
        assert!(error_message(&GameError::AuthRequired).contains("sign in"));
        assert!(error_message(&GameError::RoundUnavailable("boom".into())).contains("retry"));
        assert_eq!(
            error_message(&GameError::RoundLocked),
            GameError::RoundLocked.to_string()
        );
    }

    #[test]
    fn render_frame_does_not_panic() {
        let backend = ratatui::backend::TestBackend::new(100, 30);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();

        let mut state = ViewState::new(None, 5);
        terminal.draw(|frame| render_frame(frame, &state)).unwrap();

        state.apply_snapshot(presenting("d1"));
        state.snapshot.errors = vec![GameError::SubmissionFailed("timeout".into())];
        terminal.draw(|frame| render_frame(frame, &state)).unwrap();
    }
}
