// Status bar widget: question counter, score, phase.

use globetrotter_app::Phase;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::tui::ViewState;

/// Render the status bar into the given area.
///
/// Layout: [title] [question n/max] [score] [phase]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let snapshot = &state.snapshot;
    let mut spans = vec![Span::styled(
        " Globetrotter ",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];

    spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));
    spans.push(Span::styled(
        question_label(snapshot.question_number, snapshot.max_rounds),
        Style::default().fg(Color::White),
    ));

    spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));
    spans.push(Span::styled(
        format!(
            "Score {}/{}",
            snapshot.score.correct, snapshot.score.total
        ),
        Style::default().fg(Color::White),
    ));

    spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));
    let (label, color) = phase_indicator(snapshot.phase, snapshot.loading);
    spans.push(Span::styled(label, Style::default().fg(color)));

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// "Question 2/5", or a dash when no game is running.
pub fn question_label(question_number: u32, max_rounds: u32) -> String {
    if question_number == 0 {
        format!("Question -/{}", max_rounds)
    } else {
        format!("Question {}/{}", question_number.min(max_rounds), max_rounds)
    }
}

/// Label and color for the current phase.
pub fn phase_indicator(phase: Phase, loading: bool) -> (&'static str, Color) {
    if loading {
        return ("Loading...", Color::Yellow);
    }
    match phase {
        Phase::Idle => ("Ready", Color::Gray),
        Phase::Fetching => ("Loading...", Color::Yellow),
        Phase::Presenting => ("Your answer?", Color::White),
        Phase::Locked => ("Answered", Color::Green),
        Phase::Finished => ("Game over", Color::Magenta),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
