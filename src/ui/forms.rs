use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::app::App;
use crate::participant::{GRADE_LEVELS, READING_LEVELS};
use crate::words::{MIN_TARGET_WORDS, QUICK_ADD_SUGGESTIONS};

use super::{bold, dim};

fn input_line(label: &str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label}: "), bold()),
        Span::raw(value.to_string()),
        Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
    ])
}

pub fn render_word_manager(app: &App, area: Rect, buf: &mut Buffer) {
    let editor = &app.word_editor;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // input
            Constraint::Min(3),    // list
            Constraint::Length(3), // suggestions
        ])
        .split(area);

    Paragraph::new(input_line("New word", &editor.input))
        .block(Block::default().borders(Borders::ALL).title("Target words"))
        .render(chunks[0], buf);

    let count = editor.draft.len();
    let title = if count >= MIN_TARGET_WORDS {
        format!("{count} words")
    } else {
        format!("{count} words, add {} more", MIN_TARGET_WORDS - count)
    };
    let visible = chunks[1].height.saturating_sub(2) as usize;
    let first = editor.selected.saturating_sub(visible.saturating_sub(1));
    let lines: Vec<Line> = editor
        .draft
        .words()
        .iter()
        .enumerate()
        .skip(first)
        .take(visible)
        .map(|(idx, word)| {
            if idx == editor.selected {
                Line::from(Span::styled(
                    format!("> {word}"),
                    bold().fg(Color::Cyan),
                ))
            } else {
                Line::from(format!("  {word}"))
            }
        })
        .collect();
    let title_style = if count >= MIN_TARGET_WORDS {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Red)
    };
    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(title, title_style)),
        )
        .render(chunks[1], buf);

    let suggestions: Vec<&str> = QUICK_ADD_SUGGESTIONS
        .iter()
        .filter(|w| !editor.draft.contains(w))
        .copied()
        .collect();
    Paragraph::new(Span::styled(suggestions.join("  "), dim()))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::TOP).title("Suggestions"))
        .render(chunks[2], buf);
}

fn level_picker(label: &str, value: u8, range: &std::ops::RangeInclusive<u8>) -> Line<'static> {
    let mut spans = vec![Span::styled(format!("{label:<14}"), bold())];
    for level in range.clone() {
        let style = if level == value {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            dim()
        };
        spans.push(Span::styled(format!(" {level} "), style));
    }
    Line::from(spans)
}

pub fn render_participant_setup(app: &App, area: Rect, buf: &mut Buffer) {
    let draft = app.setup_draft;
    let mut lines = vec![
        level_picker("Grade level", draft.grade_level, &GRADE_LEVELS),
        Line::default(),
        level_picker("Reading level", draft.reading_level, &READING_LEVELS),
        Line::default(),
    ];
    match draft.validate() {
        Ok(()) => {
            lines.push(Line::from(Span::styled("Word sources", bold())));
            lines.extend(
                draft
                    .word_sources()
                    .iter()
                    .map(|source| Line::from(format!("  {source}"))),
            );
        }
        Err(e) => lines.push(Line::from(Span::styled(
            e.to_string(),
            Style::default().fg(Color::Red),
        ))),
    }
    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Setup for {}", app.participant())),
        )
        .render(area, buf);
}

pub fn render_switch_participant(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(area);

    Paragraph::new(input_line("Participant ID", &app.participant_input))
        .block(Block::default().borders(Borders::ALL).title("Switch participant"))
        .render(chunks[0], buf);

    Paragraph::new(Span::styled(
        "Each participant keeps separate sessions, target words and placement. Leave blank for \"default\".",
        dim(),
    ))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .render(chunks[1], buf);
}
