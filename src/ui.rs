pub mod analytics;
pub mod charting;
pub mod screen;

use qclock::{
    question::{QuestionRecord, QuestionStatus},
    util::{format_duration_ms, format_remaining_ms},
};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Cell, Gauge, Paragraph, Row, StatefulWidget, Table, TableState, Widget,
    },
    Frame,
};

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

pub fn draw(app: &App, f: &mut Frame) {
    screen::current_screen(&app.state).render(app, f);
}

pub fn status_color(status: QuestionStatus) -> Color {
    match status {
        QuestionStatus::NotStarted => Color::DarkGray,
        QuestionStatus::Active => Color::Green,
        QuestionStatus::Paused => Color::Yellow,
        QuestionStatus::Skipped => Color::Magenta,
        QuestionStatus::Completed => Color::Cyan,
    }
}

fn question_row(record: &QuestionRecord, linked: bool) -> Row<'static> {
    let marker = if linked { "▶" } else { " " };
    let skipped = if record.was_skipped { "↺" } else { "" };

    Row::new(vec![
        Cell::from(format!("{marker} {}", record.id)),
        Cell::from(record.status.to_string()).style(Style::default().fg(status_color(record.status))),
        Cell::from(format_duration_ms(record.time_spent_ms)),
        Cell::from(skipped),
    ])
}

/// Session screen: countdown, budget gauge and the question list
impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let session = &self.session;
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(3), // countdown
                Constraint::Length(1), // budget gauge
                Constraint::Min(3),    // questions
                Constraint::Length(1), // status line
                Constraint::Length(1), // legend
            ])
            .split(area);

        let remaining = session.remaining_ms();
        let mut spans = vec![Span::styled(
            format_remaining_ms(remaining),
            if session.is_overtime() {
                bold_style.fg(Color::Red)
            } else {
                bold_style
            },
        )];
        if session.is_overtime() {
            spans.push(Span::styled(" OVERTIME", bold_style.fg(Color::Red)));
        }
        spans.push(Span::styled(
            format!(
                "  of {}",
                format_duration_ms(session.total_allocated_ms().max(0) as u64)
            ),
            Style::default().add_modifier(Modifier::DIM),
        ));
        if session.is_paused() {
            spans.push(Span::styled(
                "  PAUSED",
                bold_style.fg(Color::Yellow).add_modifier(Modifier::ITALIC),
            ));
        }

        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Time"))
            .render(chunks[0], buf);

        let total = session.total_allocated_ms().max(1) as f64;
        let used = (session.total_allocated_ms() - remaining).max(0) as f64;
        Gauge::default()
            .ratio((used / total).clamp(0.0, 1.0))
            .label(format!("{:.0}% of budget used", used / total * 100.0))
            .gauge_style(Style::default().fg(if session.is_overtime() {
                Color::Red
            } else {
                Color::Blue
            }))
            .render(chunks[1], buf);

        let linked = session.active_question_id();
        let rows: Vec<Row> = session
            .records()
            .iter()
            .map(|r| question_row(r, linked == Some(r.id)))
            .collect();
        let header = Row::new(vec!["Question", "Status", "Time", "Skipped"]).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
        let table = Table::new(
            rows,
            [
                Constraint::Length(10),
                Constraint::Length(12),
                Constraint::Length(10),
                Constraint::Min(7),
            ],
        )
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Questions"))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .column_spacing(2);

        let mut state = TableState::default().with_selected(Some(self.selected));
        StatefulWidget::render(table, chunks[2], buf, &mut state);

        if let Some(status) = &self.status_line {
            Paragraph::new(Span::styled(status.as_str(), italic_style.fg(Color::Cyan)))
                .alignment(Alignment::Center)
                .render(chunks[3], buf);
        }

        Paragraph::new(Span::styled(
            "(↑/↓) select  (enter) start/resume  (p)ause  (s)kip  (c)omplete  (g)lobal pause  (f)inish  (esc)ape",
            italic_style,
        ))
        .render(chunks[4], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qclock::config::SessionConfig;
    use qclock::question::QuestionId;
    use ratatui::{backend::TestBackend, Terminal};
    use std::path::PathBuf;

    fn rendered(app: &App) -> String {
        let area = Rect::new(0, 0, 100, 24);
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        buffer.content.iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_session_screen_lists_questions() {
        let app = App::new(3, SessionConfig::default(), PathBuf::from("unused"));
        let content = rendered(&app);

        assert!(content.contains("Q1"));
        assert!(content.contains("Q3"));
        assert!(content.contains("not started"));
        assert!(content.contains("6:00"));
    }

    #[test]
    fn test_session_screen_shows_pause_and_active() {
        let mut app = App::new(2, SessionConfig::default(), PathBuf::from("unused"));
        app.session
            .request_status_change(QuestionId(2), QuestionStatus::Active);
        app.session.pause_global_clock();

        let content = rendered(&app);
        assert!(content.contains("PAUSED"));
        assert!(content.contains("active"));
    }

    #[test]
    fn test_draw_through_terminal() {
        let app = App::new(2, SessionConfig::default(), PathBuf::from("unused"));
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();

        terminal.draw(|f| draw(&app, f)).unwrap();

        let content: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(content.contains("Questions"));
    }

    #[test]
    fn test_status_colors_are_distinct() {
        let colors: std::collections::HashSet<_> = QuestionStatus::ALL
            .iter()
            .map(|s| format!("{:?}", status_color(*s)))
            .collect();
        assert_eq!(colors.len(), QuestionStatus::ALL.len());
    }
}
