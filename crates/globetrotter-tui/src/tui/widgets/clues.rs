// Clue panel: the clues for the round on screen.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use globetrotter_app::Phase;

use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let paragraph = Paragraph::new(build_lines(state))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Clues"));
    frame.render_widget(paragraph, area);
}

fn build_lines(state: &ViewState) -> Vec<Line<'static>> {
    let snapshot = &state.snapshot;
    let Some(round) = &snapshot.current_round else {
        return vec![dim_line(placeholder(snapshot.phase))];
    };

    let mut lines = Vec::new();
    for (i, clue) in round.clues().iter().filter(|c| !c.trim().is_empty()).enumerate() {
        lines.push(Line::from(vec![
            Span::styled(
                format!(" {}. ", i + 1),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(clue.clone(), Style::default().fg(Color::White)),
        ]));
        lines.push(Line::from(""));
    }
    lines
}

fn placeholder(phase: Phase) -> &'static str {
    match phase {
        Phase::Fetching => "  Loading destination...",
        Phase::Finished => "  Game over. Press s to play again.",
        _ => "  Press s to start a new game.",
    }
}

fn dim_line(text: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        text,
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM),
    ))
}
