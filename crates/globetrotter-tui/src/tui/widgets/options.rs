// Answer options: numbered choices, marked up once the verdict is in.

use globetrotter_core::{AnswerOption, AnswerResult};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let lines: Vec<Line> = match &state.snapshot.current_round {
        Some(round) => round
            .answer_options()
            .iter()
            .enumerate()
            .map(|(i, option)| {
                option_line(
                    i,
                    option,
                    state.selected == Some(i),
                    state.snapshot.result.as_ref(),
                )
            })
            .collect(),
        None => Vec::new(),
    };

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Where am I?"),
    );
    frame.render_widget(paragraph, area);
}

fn option_line(
    index: usize,
    option: &AnswerOption,
    selected: bool,
    result: Option<&AnswerResult>,
) -> Line<'static> {
    let style = option_style(option, selected, result);
    let marker = if selected { ">" } else { " " };
    Line::from(vec![
        Span::styled(format!("{marker}[{}] ", index + 1), style),
        Span::styled(option.to_string(), style),
    ])
}

/// Style for one option: green for the right city once revealed, red for a
/// wrong pick, bold for the pending pick.
pub fn option_style(
    option: &AnswerOption,
    selected: bool,
    result: Option<&AnswerResult>,
) -> Style {
    match result {
        Some(result) if result.correct_answer.city == option.city => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
        Some(_) if selected => Style::default().fg(Color::Red),
        Some(_) => Style::default().fg(Color::DarkGray),
        None if selected => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
        None => Style::default().fg(Color::White),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use globetrotter_core::CorrectAnswer;

    fn verdict(city: &str) -> AnswerResult {
        AnswerResult {
            is_correct: false,
            fact: String::new(),
            correct_answer: CorrectAnswer {
                city: city.into(),
                country: "France".into(),
                image_url: None,
            },
        }
    }

    #[test]
    fn correct_city_is_green_after_verdict() {
        let paris = AnswerOption::new("Paris", "France");
        let style = option_style(&paris, false, Some(&verdict("Paris")));
        assert_eq!(style.fg, Some(Color::Green));
    }

    #[test]
    fn wrong_pick_is_red_after_verdict() {
        let rome = AnswerOption::new("Rome", "Italy");
        assert_eq!(
            option_style(&rome, true, Some(&verdict("Paris"))).fg,
            Some(Color::Red)
        );
        assert_eq!(
            option_style(&rome, false, Some(&verdict("Paris"))).fg,
            Some(Color::DarkGray)
        );
    }

    #[test]
    fn pending_pick_is_highlighted() {
        let rome = AnswerOption::new("Rome", "Italy");
        assert_eq!(option_style(&rome, true, None).fg, Some(Color::Yellow));
        assert_eq!(option_style(&rome, false, None).fg, Some(Color::White));
    }

    #[test]
    fn option_line_is_numbered_from_one() {
        let line = option_line(2, &AnswerOption::new("Lima", "Peru"), false, None);
        assert_eq!(line.spans[0].content, " [3] ");
    }
}
