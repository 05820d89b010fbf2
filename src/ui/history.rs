use chrono::{DateTime, Utc};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, Widget,
    },
};
use time_humanize::HumanTime;

use crate::app::App;
use crate::mastery::{Criterion, MasteryReport};
use crate::record::{Phase, SessionRecord};

use super::charting::{accuracy_points, compute_chart_params, format_label};
use super::{accuracy_color, bold, dim};

/// "3 hours ago" style age of a session
pub fn humanize_age(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - date).num_seconds().max(0);
    HumanTime::from_seconds(-secs).to_string()
}

pub fn mastery_lines(report: &MasteryReport, level: u8) -> Vec<Line<'static>> {
    let headline = if report.achieved {
        let how = match report.criterion {
            Some(Criterion::Consecutive) => "two delayed sessions ≥ 90%",
            Some(Criterion::Average) => "three delayed sessions averaging ≥ 80%",
            None => "criteria met",
        };
        let at = report
            .achieved_at
            .map(|n| format!(" at session {n}"))
            .unwrap_or_default();
        Line::from(Span::styled(
            format!("Level {level} mastered{at} ({how})"),
            bold().fg(Color::Green),
        ))
    } else {
        Line::from(Span::styled(
            format!("Level {level}: working toward mastery"),
            bold(),
        ))
    };
    vec![
        headline,
        Line::from(format!(
            "Overall {:.1}%   Prompted {:.1}% ({} sessions)   Unprompted {:.1}% ({} sessions)",
            report.accuracy,
            report.prompted_accuracy,
            report.prompted_sessions,
            report.unprompted_accuracy,
            report.unprompted_sessions
        )),
    ]
}

pub fn present_row(s: &SessionRecord, now: DateTime<Utc>) -> Row<'static> {
    let prompt = match s.phase {
        Phase::Baseline => "baseline".to_string(),
        Phase::Intervention => s
            .effective_prompt_type()
            .map(|p| p.to_string())
            .unwrap_or_default(),
    };
    let response = s
        .mean_response_time()
        .map(|t| format!("{t:.1}s"))
        .unwrap_or_else(|| "-".to_string());
    Row::new(vec![
        Cell::from(s.session_number.to_string()).style(bold()),
        Cell::from(s.level.to_string()),
        Cell::from(prompt),
        Cell::from(format!("{:.1}%", s.accuracy))
            .style(Style::default().fg(accuracy_color(s.accuracy))),
        Cell::from(format!(
            "{}/{}/{}",
            s.correct_answers, s.assisted_answers, s.no_answers
        )),
        Cell::from(response),
        Cell::from(humanize_age(s.date, now)),
    ])
}

fn render_chart(app: &App, area: Rect, buf: &mut Buffer) {
    let points = accuracy_points(&app.history, app.level);
    let (sessions, top) = compute_chart_params(&points);
    let datasets = vec![Dataset::default()
        .marker(Marker::Braille)
        .style(Style::default().fg(Color::Magenta))
        .graph_type(GraphType::Line)
        .data(&points)];

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("session")
                .bounds([1.0, sessions])
                .labels(vec![
                    Span::styled("1", bold()),
                    Span::styled(format_label(sessions), bold()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("accuracy")
                .bounds([0.0, top])
                .labels(vec![
                    Span::styled("0", bold()),
                    Span::styled(format_label(top), bold()),
                ]),
        )
        .render(area, buf);
}

pub fn render_history(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),      // mastery
            Constraint::Percentage(40), // chart
            Constraint::Min(3),         // table
        ])
        .split(area);

    Paragraph::new(mastery_lines(&app.mastery(), app.level))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    if app.history.is_empty() {
        Paragraph::new(Span::styled("No sessions yet", dim()))
            .alignment(Alignment::Center)
            .render(chunks[2], buf);
        return;
    }

    render_chart(app, chunks[1], buf);

    let table_height = chunks[2].height.saturating_sub(3) as usize;
    let max_scroll = app.history.len().saturating_sub(table_height);
    let scroll = app.history_scroll.min(max_scroll);
    let now = Utc::now();

    let header = Row::new(vec![
        Cell::from("#"),
        Cell::from("Lvl"),
        Cell::from("Prompt"),
        Cell::from("Accuracy"),
        Cell::from("C/A/N"),
        Cell::from("Resp"),
        Cell::from("When"),
    ])
    .style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = app
        .history
        .iter()
        .rev()
        .skip(scroll)
        .take(table_height)
        .map(|s| present_row(s, now))
        .collect();

    Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Length(10),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(6),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Sessions ({})", app.history.len())),
    )
    .render(chunks[2], buf);
}
