pub mod charting;
pub mod forms;
pub mod history;
pub mod home;
pub mod quiz;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

use crate::app::{App, Screen};

pub const HORIZONTAL_MARGIN: u16 = 5;
pub const VERTICAL_MARGIN: u16 = 1;

pub(crate) fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

pub(crate) fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

pub(crate) fn italic() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

/// Green at or above the mastery bar, yellow when close, red otherwise
pub(crate) fn accuracy_color(accuracy: f64) -> Color {
    if accuracy >= 90.0 {
        Color::Green
    } else if accuracy >= 80.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // header
                Constraint::Length(1), // padding
                Constraint::Min(1),    // body
                Constraint::Length(1), // status
                Constraint::Length(1), // legend
            ])
            .split(area);

        render_header(self, chunks[0], buf);

        match self.screen {
            Screen::Home => home::render_home(self, chunks[2], buf),
            Screen::Playing => quiz::render_quiz(self, chunks[2], buf),
            Screen::History => history::render_history(self, chunks[2], buf),
            Screen::WordManager => forms::render_word_manager(self, chunks[2], buf),
            Screen::ParticipantSetup => forms::render_participant_setup(self, chunks[2], buf),
            Screen::SwitchParticipant => forms::render_switch_participant(self, chunks[2], buf),
        }

        if let Some(status) = &self.status {
            Paragraph::new(Span::styled(
                status.as_str(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::ITALIC),
            ))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[3], buf);
        }

        Paragraph::new(Span::styled(legend(self.screen), italic())).render(chunks[4], buf);
    }
}

fn render_header(app: &App, area: Rect, buf: &mut Buffer) {
    let progress = app.progress();
    let mut spans = vec![
        Span::styled(format!("Participant {}", app.participant()), bold()),
        Span::raw("   "),
        Span::styled(format!("Score {}", progress.total_score), Style::default().fg(Color::Yellow)),
        Span::raw("   "),
        Span::raw(format!("Words {}", progress.words_practiced)),
        Span::raw("   "),
        Span::raw(format!("Sessions {}", progress.sessions_completed)),
    ];
    if let Some(avg) = progress.mean_response_secs {
        spans.push(Span::raw("   "));
        spans.push(Span::styled(
            format!(
                "Avg response {avg:.1}s ± {:.1}",
                progress.response_secs_std_dev.unwrap_or(0.0)
            ),
            dim(),
        ));
    }
    let line = Line::from(spans);
    Paragraph::new(line).alignment(Alignment::Center).render(area, buf);
}

pub fn legend(screen: Screen) -> &'static str {
    match screen {
        Screen::Home => {
            "(0-3) level / (b)aseline / (w)ords / (c)onfig / (h)istory / (p)articipant / (q)uit"
        }
        Screen::Playing => "(1-4) choose / (esc) cancel",
        Screen::History => "(e)xport csv / (j)son / (↑↓) scroll / (n)ew / (esc)ape",
        Screen::WordManager => {
            "(enter) add / (del) remove / (tab) suggestion / (ctrl-s) save / (esc)ape"
        }
        Screen::ParticipantSetup => "(←→) grade / (↑↓) reading / (enter) save / (esc)ape",
        Screen::SwitchParticipant => "(enter) switch / (esc)ape",
    }
}
