use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::record::{Phase, ResponseType};
use crate::session::{QuestionState, SessionRunner, COINS_ASSISTED, COINS_UNPROMPTED};

use super::{bold, dim};

/// Letter-spaced rendering of the target word when it fits the width
pub fn display_word(word: &str, max_width: u16) -> String {
    let spaced = word
        .chars()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    if spaced.width() <= max_width as usize {
        spaced
    } else {
        word.to_string()
    }
}

fn status_line(runner: &SessionRunner) -> Line<'static> {
    let phase = match runner.phase() {
        Phase::Baseline => "baseline".to_string(),
        Phase::Intervention => format!("{} prompt", runner.prompt_config().prompt_type),
    };
    Line::from(vec![
        Span::styled(
            format!(
                "Level {} · Session {} · {phase}",
                runner.level(),
                runner.session_number()
            ),
            bold(),
        ),
        Span::raw("   "),
        Span::raw(format!(
            "Question {}/{}",
            (runner.question_index() + 1).min(runner.question_count()),
            runner.question_count()
        )),
        Span::raw("   "),
        Span::styled(
            format!("Coins {}", runner.coins()),
            Style::default().fg(Color::Yellow),
        ),
    ])
}

fn cue_lines(runner: &SessionRunner, word: &str, width: u16) -> Vec<Line<'static>> {
    let big = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    match runner.state() {
        QuestionState::AwaitingPromptDelay { remaining } => vec![
            Line::from(Span::styled("Listen and choose the word", bold())),
            Line::from(Span::styled(
                format!("hint in {:.1}s", remaining.as_secs_f64()),
                dim(),
            )),
        ],
        QuestionState::Unprompted => vec![
            Line::from(Span::styled("Which word is it?", bold())),
            Line::from(Span::styled(format!("examiner says: {word}"), dim())),
        ],
        QuestionState::PromptShown => vec![
            Line::from(Span::styled(display_word(word, width), big)),
            Line::from(Span::styled("this is the word", dim())),
        ],
        QuestionState::Answered { response, .. } => {
            let (text, color) = match response {
                ResponseType::Correct => (
                    format!("Great job! +{COINS_UNPROMPTED} coins"),
                    Color::Green,
                ),
                ResponseType::Assisted => {
                    (format!("Good! +{COINS_ASSISTED} coins"), Color::Green)
                }
                ResponseType::NoAnswer => (format!("Time's up. The word was \"{word}\""), Color::Red),
            };
            vec![
                Line::from(Span::styled(display_word(word, width), big)),
                Line::from(Span::styled(text, bold().fg(color))),
            ]
        }
    }
}

pub fn render_quiz(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(runner) = app.session.as_ref() else {
        return;
    };
    let Some(question) = runner.current_question() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status
            Constraint::Length(1), // timer
            Constraint::Min(3),    // cue
            Constraint::Length(3), // options
            Constraint::Length(1), // try again
        ])
        .split(area);

    Paragraph::new(status_line(runner))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    if let Some(secs) = runner.seconds_left() {
        let style = if secs <= 3 {
            bold().fg(Color::Red)
        } else {
            dim()
        };
        Paragraph::new(Span::styled(format!("{secs}s"), style))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);
    }

    let cue_area = chunks[2];
    let padding = cue_area.height.saturating_sub(2) / 2;
    let mut lines = vec![Line::default(); padding as usize];
    lines.extend(cue_lines(runner, &question.word, cue_area.width));
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(cue_area, buf);

    let highlight = matches!(
        runner.state(),
        QuestionState::PromptShown | QuestionState::Answered { .. }
    );
    let option_count = question.options.len().max(1) as u32;
    let option_areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Ratio(1, option_count); option_count as usize])
        .split(chunks[3]);
    for (idx, (option, rect)) in question.options.iter().zip(option_areas.iter()).enumerate() {
        let is_target = option == &question.word;
        let border_style = if highlight && is_target {
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Paragraph::new(Span::styled(option.as_str(), bold()))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(border_style)
                    .title(format!("{}", idx + 1)),
            )
            .render(*rect, buf);
    }

    if runner.showing_try_again() {
        Paragraph::new(Span::styled(
            "Try again!",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);
    }
}
