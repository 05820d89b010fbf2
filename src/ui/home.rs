use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::app::App;
use crate::mastery::evaluate_level;
use crate::record::Phase;
use crate::words::{sight_words, BUILTIN_LEVELS, CUSTOM_LEVEL};

use super::{bold, dim};

/// One menu line per playable level
fn level_line(app: &App, level: u8) -> Line<'static> {
    let label = if level == CUSTOM_LEVEL {
        format!("({level}) My target words")
    } else {
        format!("({level}) Level {level}: {}...", sight_words(level)[..3].join(", "))
    };
    let mastery = evaluate_level(&app.history, level);
    let sessions = app
        .history
        .iter()
        .filter(|s| s.level == level && s.phase == Phase::Intervention)
        .count();

    let unlocked = app.level_unlocked(level);
    let label_style = if unlocked { bold() } else { dim() };
    let mut spans = vec![Span::styled(label, label_style)];
    if let Some(requires) = App::required_level(level).filter(|_| !unlocked) {
        spans.push(Span::styled(
            format!("  locked, master level {requires} first"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if level == CUSTOM_LEVEL && !app.target_words.is_ready() {
        spans.push(Span::styled(
            format!("  needs {} more word(s)", app.target_words.missing()),
            Style::default().fg(Color::Red),
        ));
    } else if mastery.achieved {
        spans.push(Span::styled("  ★ mastered", Style::default().fg(Color::Green)));
    } else if sessions > 0 {
        spans.push(Span::styled(format!("  {sessions} session(s)"), dim()));
    }
    Line::from(spans)
}

pub fn render_home(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(3),
        ])
        .split(area);

    Paragraph::new(Span::styled("Sight Word Practice", bold().fg(Color::Cyan)))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM))
        .render(chunks[0], buf);

    let mut lines: Vec<Line> = std::iter::once(CUSTOM_LEVEL)
        .chain(BUILTIN_LEVELS)
        .map(|level| level_line(app, level))
        .collect();
    lines.push(Line::default());
    let baseline_style = if app.target_words.is_ready() {
        bold()
    } else {
        dim()
    };
    lines.push(Line::from(Span::styled(
        "(b) Baseline probe over target words",
        baseline_style,
    )));

    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Start"))
        .render(chunks[1], buf);

    let placement = match app.participant_config {
        Some(cfg) => format!(
            "Grade {} · reading level {} · halfway level {}",
            cfg.grade_level,
            cfg.reading_level,
            cfg.halfway_level()
        ),
        None => "No grade/reading placement yet, press (c) to set one".to_string(),
    };
    Paragraph::new(vec![
        Line::from(placement),
        Line::from(Span::styled(
            format!("{} target word(s) saved", app.target_words.len()),
            dim(),
        )),
    ])
    .alignment(Alignment::Center)
    .render(chunks[2], buf);
}
