// Feedback panel: verdict, fun fact, and the final summary.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use globetrotter_app::{GameSummary, Snapshot};
use globetrotter_core::AnswerResult;

use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let paragraph = Paragraph::new(build_lines(&state.snapshot))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Feedback"));
    frame.render_widget(paragraph, area);
}

pub fn build_lines(snapshot: &Snapshot) -> Vec<Line<'static>> {
    if let Some(result) = &snapshot.result {
        return verdict_lines(result, snapshot.question_number >= snapshot.max_rounds);
    }
    if let Some(summary) = &snapshot.summary {
        return summary_lines(summary);
    }
    if snapshot.can_advance {
        return vec![hint("  Press n to try loading the next destination again.")];
    }
    Vec::new()
}

fn verdict_lines(result: &AnswerResult, last_question: bool) -> Vec<Line<'static>> {
    let (verdict, color) = if result.is_correct {
        ("Correct!", Color::Green)
    } else {
        ("Not quite.", Color::Red)
    };
    let answer = &result.correct_answer;
    let mut lines = vec![
        Line::from(Span::styled(
            format!(" {verdict}"),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled(" It was ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}, {}", answer.city, answer.country),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(Span::styled(
            format!(" {}", result.fact),
            Style::default().fg(Color::White),
        )),
    ];
    if let Some(url) = &answer.image_url {
        lines.push(Line::from(Span::styled(
            format!(" {url}"),
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines.push(hint(if last_question {
        "  Press n to see your results."
    } else {
        "  Press n for the next destination."
    }));
    lines
}

fn summary_lines(summary: &GameSummary) -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(
            format!(
                " Final score: {} of {} correct",
                summary.score.correct, summary.rounds_played
            ),
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!(
                " Finished {}",
                summary.finished_at.format("%Y-%m-%d %H:%M UTC")
            ),
            Style::default().fg(Color::Gray),
        )),
        hint("  Press s to play again."),
    ]
}

fn hint(text: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        text,
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use globetrotter_app::Phase;
    use globetrotter_core::{CorrectAnswer, GameId, Score};

    fn result(is_correct: bool) -> AnswerResult {
        AnswerResult {
            is_correct,
            fact: "The Eiffel Tower grows in summer.".into(),
            correct_answer: CorrectAnswer {
                city: "Paris".into(),
                country: "France".into(),
                image_url: Some("https://example.org/paris.jpg".into()),
            },
        }
    }

    fn text(lines: &[Line]) -> String {
        lines
            .iter()
            .flat_map(|l| l.spans.iter().map(|s| s.content.to_string()))
            .collect()
    }

    #[test]
    fn empty_when_nothing_to_report() {
        assert!(build_lines(&Snapshot::idle(5)).is_empty());
    }

    #[test]
    fn verdict_shows_answer_fact_and_image() {
        let snapshot = Snapshot {
            phase: Phase::Locked,
            result: Some(result(false)),
            question_number: 2,
            ..Snapshot::idle(5)
        };
        let rendered = text(&build_lines(&snapshot));
        assert!(rendered.contains("Not quite."));
        assert!(rendered.contains("Paris, France"));
        assert!(rendered.contains("Eiffel Tower"));
        assert!(rendered.contains("paris.jpg"));
        assert!(rendered.contains("next destination"));
    }

    #[test]
    fn last_question_points_to_results() {
        let snapshot = Snapshot {
            phase: Phase::Locked,
            result: Some(result(true)),
            question_number: 5,
            ..Snapshot::idle(5)
        };
        let rendered = text(&build_lines(&snapshot));
        assert!(rendered.contains("Correct!"));
        assert!(rendered.contains("results"));
    }

    #[test]
    fn summary_shows_final_score() {
        let snapshot = Snapshot {
            phase: Phase::Finished,
            summary: Some(GameSummary {
                game_id: GameId::new("g1"),
                score: Score {
                    correct: 3,
                    incorrect: 2,
                    total: 5,
                },
                rounds_played: 5,
                finished_at: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
            }),
            ..Snapshot::idle(5)
        };
        let rendered = text(&build_lines(&snapshot));
        assert!(rendered.contains("3 of 5 correct"));
        assert!(rendered.contains("2026-01-15 10:00 UTC"));
    }
}
