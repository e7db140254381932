// Screen layout: panel arrangement and sizing.
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +-------------------------+------------------------+
// | Clues (55%)              | Answer Options (45%)   |
// +-------------------------+------------------------+
// | Feedback (7 rows)                                 |
// +--------------------------------------------------+
// | Message Bar (1 row)                               |
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Resolved screen areas for each zone.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Top row: question counter, score, phase.
    pub status_bar: Rect,
    /// Middle left: clues for the round on screen.
    pub clues: Rect,
    /// Middle right: numbered answer options.
    pub options: Rect,
    /// Verdict, fact and correct answer once an answer is scored.
    pub feedback: Rect,
    /// Latest error, if any.
    pub message_bar: Rect,
    /// Bottom row: keyboard shortcut hints.
    pub help_bar: Rect,
}

pub fn build_layout(area: Rect) -> AppLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Min(8),    // clues + options
            Constraint::Length(7), // feedback
            Constraint::Length(1), // message bar
            Constraint::Length(1), // help bar
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(vertical[1]);

    AppLayout {
        status_bar: vertical[0],
        clues: horizontal[0],
        options: horizontal[1],
        feedback: vertical[2],
        message_bar: vertical[3],
        help_bar: vertical[4],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
