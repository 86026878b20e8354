use itertools::Itertools;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use examify::{
    ledger::Answer,
    question::Question,
    scoring::{DomainPerformance, QuestionOutcome, DEFAULT_PAGE_SIZE},
    timer::format_clock,
};

use crate::App;

const QUESTION_COLUMN_WIDTH: usize = 40;
const ANSWER_COLUMN_WIDTH: usize = 24;

fn score_color(percentage: u8, pass_mark: u8) -> Color {
    if percentage >= pass_mark {
        Color::Green
    } else if percentage >= pass_mark / 2 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Cut `text` to at most `max` columns, marking the cut with an ellipsis
pub fn truncate_to_width(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

/// Human readable form of an answer, using option texts where the question is known
pub fn describe_answer(question: Option<&Question>, answer: &Answer) -> String {
    let text = |id: &str| {
        question
            .and_then(|q| q.option(id))
            .map_or_else(|| id.to_string(), |o| o.text.clone())
    };

    match answer {
        Answer::Single(id) => text(id),
        Answer::Multiple(ids) => ids.iter().map(|id| text(id)).join(", "),
        Answer::Matching(pairs) => pairs
            .iter()
            .map(|(task_id, option_id)| {
                let task = question
                    .and_then(|q| q.tasks().iter().find(|t| &t.id == task_id))
                    .map_or(task_id.as_str(), |t| t.text.as_str());
                format!("{task} -> {}", text(option_id))
            })
            .join("; "),
    }
}

/// Pure presenter for one domain row
pub fn present_domain_row(domain: &DomainPerformance, pass_mark: u8) -> Row<'static> {
    let pct = domain.percentage();
    Row::new(vec![
        Cell::from(domain.name.clone()).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(domain.correct.to_string()),
        Cell::from(domain.incorrect.to_string()),
        Cell::from(format!("{pct}%")).style(Style::default().fg(score_color(pct, pass_mark))),
    ])
}

/// Pure presenter for one reviewed question
pub fn present_outcome_row(
    number: usize,
    outcome: &QuestionOutcome,
    question: Option<&Question>,
) -> Row<'static> {
    let (mark, style) = match (&outcome.user_answer, outcome.is_correct) {
        (_, true) => ("✓", Style::default().fg(Color::Green)),
        (None, false) => ("–", Style::default().fg(Color::Gray)),
        (Some(_), false) => ("✗", Style::default().fg(Color::Red)),
    };
    let given = outcome
        .user_answer
        .as_ref()
        .map_or_else(|| "(no answer)".to_string(), |a| describe_answer(question, a));

    Row::new(vec![
        Cell::from(format!("{number} {mark}")).style(style.add_modifier(Modifier::BOLD)),
        Cell::from(truncate_to_width(&outcome.text, QUESTION_COLUMN_WIDTH)),
        Cell::from(truncate_to_width(&given, ANSWER_COLUMN_WIDTH)).style(style),
        Cell::from(truncate_to_width(
            &describe_answer(question, &outcome.correct_option),
            ANSWER_COLUMN_WIDTH,
        )),
        Cell::from(format!("{}s", outcome.time_taken)),
    ])
}

pub fn render_results(app: &App, f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(1), // Score
            Constraint::Length(1), // Counts
            Constraint::Length(1), // Timing
            Constraint::Length(1), // Padding
            Constraint::Min(0),    // Domains
            Constraint::Length(1), // Notice
            Constraint::Length(1), // Instructions
        ])
        .split(f.area());

    let title = Paragraph::new(app.settings.title.as_str())
        .block(Block::default().borders(Borders::ALL).title("Results"))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    if let Some(notice) = &app.notice {
        f.render_widget(
            Paragraph::new(notice.as_str())
                .style(Style::default().fg(Color::Yellow))
                .alignment(Alignment::Center),
            chunks[6],
        );
    }

    f.render_widget(
        Paragraph::new("(r)eview answers  (n)ew attempt  (esc) quit").alignment(Alignment::Center),
        chunks[7],
    );

    let Some(result) = app.result() else {
        f.render_widget(
            Paragraph::new("No result available.")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Gray)),
            chunks[5],
        );
        return;
    };

    let pass_mark = app.settings.pass_mark;
    let verdict = if result.passed(pass_mark) {
        "PASS"
    } else {
        "FAIL"
    };
    let score = Paragraph::new(Line::from(vec![
        Span::styled(
            format!("{}%  {verdict}", result.percentage),
            Style::default()
                .fg(score_color(result.percentage, pass_mark))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("   (pass mark {pass_mark}%)"),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(score, chunks[1]);

    let unanswered = result.unanswered();
    let counts = Paragraph::new(format!(
        "{} of {} correct   {} wrong   {} unanswered",
        result.correct_answers,
        result.total_questions,
        result.incorrect_answers() - unanswered,
        unanswered
    ))
    .alignment(Alignment::Center);
    f.render_widget(counts, chunks[2]);

    let timing = Paragraph::new(format!(
        "Time spent {}   avg answer {:.1}s   avg correct {:.1}s   avg incorrect {:.1}s",
        format_clock(result.time_spent),
        result.avg_answer_time,
        result.avg_correct_time,
        result.avg_incorrect_time
    ))
    .style(Style::default().add_modifier(Modifier::ITALIC))
    .alignment(Alignment::Center);
    f.render_widget(timing, chunks[3]);

    let header = Row::new(vec![
        Cell::from("Domain"),
        Cell::from("Correct"),
        Cell::from("Incorrect"),
        Cell::from("Score"),
    ])
    .style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = result
        .domain_performance
        .iter()
        .map(|d| present_domain_row(d, pass_mark))
        .collect();

    let widths = [
        Constraint::Min(20),
        Constraint::Length(9),
        Constraint::Length(10),
        Constraint::Length(7),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Performance by domain"),
        )
        .column_spacing(2);

    f.render_widget(table, chunks[5]);
}

pub fn render_review(app: &App, f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Outcomes
            Constraint::Length(2), // Instructions
        ])
        .split(f.area());

    let Some(result) = app.result() else {
        f.render_widget(
            Paragraph::new("Nothing to review.")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Gray)),
            chunks[1],
        );
        return;
    };

    let pages = result.total_pages(DEFAULT_PAGE_SIZE).max(1);
    let page = app.review_page();
    let title = Paragraph::new(format!("Review (page {page} of {pages})"))
        .block(Block::default().borders(Borders::ALL).title("Review"))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let header = Row::new(vec![
        Cell::from("#"),
        Cell::from("Question"),
        Cell::from("Your answer"),
        Cell::from("Correct answer"),
        Cell::from("Time"),
    ])
    .style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let offset = (page - 1) * DEFAULT_PAGE_SIZE;
    let rows: Vec<Row> = result
        .page(page, DEFAULT_PAGE_SIZE)
        .iter()
        .enumerate()
        .map(|(i, outcome)| {
            let question = app.questions.iter().find(|q| q.id == outcome.id);
            let row = present_outcome_row(offset + i + 1, outcome, question);
            if offset + i == app.review_cursor {
                row.style(Style::default().add_modifier(Modifier::REVERSED))
            } else {
                row
            }
        })
        .collect();

    let widths = [
        Constraint::Length(5),
        Constraint::Min(QUESTION_COLUMN_WIDTH as u16 / 2),
        Constraint::Length(ANSWER_COLUMN_WIDTH as u16),
        Constraint::Length(ANSWER_COLUMN_WIDTH as u16),
        Constraint::Length(6),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Answers"))
        .column_spacing(2);

    f.render_widget(table, chunks[1]);

    let instructions = Paragraph::new("(↑/↓) select  (enter) open  (←/→) page  (b/backspace) back  (esc) quit")
        .alignment(Alignment::Center)
        .wrap(ratatui::widgets::Wrap { trim: true });
    f.render_widget(instructions, chunks[2]);
}
