use qclock::{
    analytics::{Correctness, ReviewTag, StatusDistribution, Totals},
    question::QuestionRecord,
    util::format_duration_ms,
};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{BarChart, Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::{
    ui::{
        charting::{bar_width, bucket_bars, format_percent},
        status_color,
    },
    App,
};

fn totals_line(totals: &Totals) -> String {
    let mut text = format!(
        "{} on questions, {} of {} budget used",
        format_duration_ms(totals.question_time_ms),
        format_duration_ms(totals.elapsed_ms),
        format_duration_ms(totals.allocated_ms.max(0) as u64),
    );
    if totals.overtime_ms > 0 {
        text.push_str(&format!(
            " (+{} overtime)",
            format_duration_ms(totals.overtime_ms)
        ));
    }
    if let Some(avg) = totals.average_attempted_ms {
        text.push_str(&format!(
            "   avg {} over {} attempted",
            format_duration_ms(avg),
            totals.attempted
        ));
    }
    text
}

fn status_rows(dist: &StatusDistribution) -> Vec<Row<'static>> {
    let mut rows: Vec<Row> = dist
        .counts
        .iter()
        .map(|c| {
            Row::new(vec![
                Cell::from(c.status.to_string()).style(Style::default().fg(status_color(c.status))),
                Cell::from(c.count.to_string()),
                Cell::from(format_percent(c.percent)),
            ])
        })
        .collect();
    rows.push(Row::new(vec![
        Cell::from("clean completions"),
        Cell::from(dist.clean_completions.to_string()),
        Cell::from(""),
    ]));
    rows.push(Row::new(vec![
        Cell::from("completed after skip"),
        Cell::from(dist.completed_after_skip.to_string()),
        Cell::from(""),
    ]));
    rows
}

/// Pure presenter for a single long-question review row
pub fn review_row(record: &QuestionRecord, tag: ReviewTag) -> Row<'static> {
    let correctness_style = match tag.correctness {
        Some(Correctness::Correct) => Style::default().fg(Color::Green),
        Some(Correctness::Incorrect) => Style::default().fg(Color::Red),
        None => Style::default().add_modifier(Modifier::DIM),
    };

    Row::new(vec![
        Cell::from(record.id.to_string()).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(format_duration_ms(record.time_spent_ms)),
        Cell::from(record.status.to_string()).style(Style::default().fg(status_color(record.status))),
        Cell::from(
            tag.correctness
                .map_or_else(|| "-".to_string(), |c| c.to_string()),
        )
        .style(correctness_style),
        Cell::from(
            tag.difficulty
                .map_or_else(|| "-".to_string(), |d| d.to_string()),
        ),
    ])
}

/// Render the post-session analytics screen
pub fn render_analytics(app: &App, f: &mut Frame) {
    let area = f.area();
    let Some(analytics) = app.analytics.as_ref() else {
        f.render_widget(
            Paragraph::new("No finished session yet.").alignment(Alignment::Center),
            area,
        );
        return;
    };
    let report = &analytics.report;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),  // totals
            Constraint::Length(11), // distributions
            Constraint::Min(4),     // review
            Constraint::Length(1),  // status line
            Constraint::Length(2),  // instructions
        ])
        .split(area);

    let totals = Paragraph::new(totals_line(&report.totals))
        .block(Block::default().borders(Borders::ALL).title("Session"))
        .style(Style::default().add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    f.render_widget(totals, chunks[0]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);

    let bars = bucket_bars(&report.time_distribution);
    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Time per question"),
        )
        .bar_width(bar_width(&report.time_distribution))
        .bar_gap(2)
        .bar_style(Style::default().fg(Color::Magenta))
        .value_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )
        .data(&bars[..]);
    f.render_widget(chart, middle[0]);

    let status_table = Table::new(
        status_rows(&report.status_distribution),
        [
            Constraint::Min(20),
            Constraint::Length(5),
            Constraint::Length(7),
        ],
    )
    .header(
        Row::new(vec!["Status", "Count", "Share"]).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
    )
    .block(Block::default().borders(Borders::ALL).title("Statuses"));
    f.render_widget(status_table, middle[1]);

    let threshold = format_duration_ms(analytics.snapshot.config.long_question_threshold_ms());
    let review_title = format!(
        "Long questions (≥ {threshold}), {} tagged",
        analytics.review.tagged_count()
    );
    if report.long_questions.is_empty() {
        let none = Paragraph::new(format!("No question took {threshold} or longer."))
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray))
            .block(Block::default().borders(Borders::ALL).title(review_title));
        f.render_widget(none, chunks[2]);
    } else {
        let rows: Vec<Row> = report
            .long_questions
            .iter()
            .filter_map(|id| {
                let idx = (id.0 as usize).checked_sub(1)?;
                analytics.snapshot.records.get(idx)
            })
            .map(|r| review_row(r, analytics.review.get(r.id)))
            .collect();
        let table = Table::new(
            rows,
            [
                Constraint::Length(8),
                Constraint::Length(8),
                Constraint::Length(12),
                Constraint::Length(10),
                Constraint::Min(8),
            ],
        )
        .header(
            Row::new(vec!["Question", "Time", "Status", "Result", "Difficulty"]).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
        )
        .block(Block::default().borders(Borders::ALL).title(review_title))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .column_spacing(2);
        let mut state = TableState::default().with_selected(Some(analytics.cursor));
        f.render_stateful_widget(table, chunks[2], &mut state);
    }

    if let Some(status) = &app.status_line {
        f.render_widget(
            Paragraph::new(Line::from(status.as_str()))
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Cyan)),
            chunks[3],
        );
    }

    let instructions = Paragraph::new(
        "(↑/↓) select  (y) correct  (x) incorrect  (1-3) easy/medium/hard  (u) clear  (e)xport csv  (r)estart  (esc)ape",
    )
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
    f.render_widget(instructions, chunks[4]);
}
