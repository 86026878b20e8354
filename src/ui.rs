pub mod results;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;
use webbrowser::Browser;

use examify::{
    ledger::Answer,
    question::{Question, QuestionKind},
    scoring::is_correct,
    session::SessionStatus,
    timer::format_clock,
};

use crate::{App, Selection};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

pub fn draw(app: &App, f: &mut Frame) {
    screen::current_screen(&app.state).render(app, f);
}

/// Rows a piece of text needs when wrapped to `width` columns
fn wrapped_height(text: &str, width: u16) -> u16 {
    let width = width.max(1) as usize;
    text.lines()
        .map(|line| line.width().max(1).div_ceil(width))
        .sum::<usize>()
        .max(1) as u16
}

fn is_chosen(answer: Option<&Answer>, option_id: &str) -> bool {
    match answer {
        Some(Answer::Single(id)) => id == option_id,
        Some(Answer::Multiple(ids)) => ids.contains(option_id),
        _ => false,
    }
}

/// Option rows, or task rows for matching. While `pending` is set the
/// candidate's unsubmitted choices are drawn with a cursor; otherwise the
/// answer key is revealed against `submitted`.
fn choice_lines<'a>(
    question: &'a Question,
    pending: Option<&Selection>,
    submitted: Option<&Answer>,
) -> Vec<Line<'a>> {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
    let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
    let dim_style = Style::default().add_modifier(Modifier::DIM);

    let cursor = |i: usize| match pending {
        Some(selection) if selection.cursor == i => "> ",
        _ => "  ",
    };

    match &question.kind {
        QuestionKind::Matching { tasks } => {
            let pairs = match submitted {
                Some(Answer::Matching(pairs)) => Some(pairs),
                _ => None,
            };
            tasks
                .iter()
                .enumerate()
                .map(|(i, task)| {
                    let assigned = match pending {
                        Some(selection) => selection
                            .assignments
                            .get(&i)
                            .and_then(|o| question.options.get(*o)),
                        None => pairs
                            .and_then(|p| p.get(&task.id))
                            .and_then(|id| question.option(id)),
                    };
                    let assigned_text = assigned.map_or("?", |o| o.text.as_str());
                    let mut spans = vec![
                        Span::raw(cursor(i)),
                        Span::styled(task.text.as_str(), bold_style),
                        Span::raw("  ->  "),
                    ];
                    if pending.is_some() {
                        spans.push(Span::raw(assigned_text.to_string()));
                    } else {
                        let right = assigned.is_some_and(|o| o.id == task.correct_option_id);
                        spans.push(Span::styled(
                            assigned_text.to_string(),
                            if right { green_bold_style } else { red_bold_style },
                        ));
                        if !right {
                            if let Some(correct) = question.option(&task.correct_option_id) {
                                spans.push(Span::styled(
                                    format!("  ({})", correct.text),
                                    green_bold_style,
                                ));
                            }
                        }
                    }
                    Line::from(spans)
                })
                .collect()
        }
        kind => {
            let multiple = matches!(kind, QuestionKind::MultipleChoice { .. });
            let correct = question.correct_answer();
            question
                .options
                .iter()
                .enumerate()
                .map(|(i, option)| {
                    let picked = match pending {
                        Some(selection) => selection.chosen.contains(&i),
                        None => is_chosen(submitted, &option.id),
                    };
                    let marker = match (multiple, picked) {
                        (true, true) => "[x] ",
                        (true, false) => "[ ] ",
                        (false, true) => "(*) ",
                        (false, false) => "( ) ",
                    };
                    let style = if pending.is_some() {
                        Style::default()
                    } else if is_chosen(Some(&correct), &option.id) {
                        green_bold_style
                    } else if picked {
                        red_bold_style
                    } else {
                        dim_style
                    };
                    Line::from(vec![
                        Span::raw(cursor(i)),
                        Span::styled(format!("{marker}{}", option.text), style),
                    ])
                })
                .collect()
        }
    }
}

/// Verdict, explanation and learn-more link for a submitted (or missing) answer
fn feedback_lines<'a>(question: &'a Question, submitted: Option<&Answer>) -> Vec<Line<'a>> {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let mut lines = vec![match submitted {
        Some(answer) if is_correct(question, answer) => Line::from(Span::styled(
            "Correct!",
            Style::default().patch(bold_style).fg(Color::Green),
        )),
        Some(_) => Line::from(Span::styled(
            "Incorrect",
            Style::default().patch(bold_style).fg(Color::Red),
        )),
        None => Line::from(Span::styled(
            "Not answered",
            Style::default().patch(bold_style).fg(Color::Gray),
        )),
    }];
    if !question.explanation.is_empty() {
        lines.push(Line::from(question.explanation.as_str()));
    }
    if let Some(link) = &question.learn_more_link {
        lines.push(Line::from(Span::styled(
            format!("{}: {}", link.text, link.url),
            italic_style,
        )));
    }
    lines
}

pub fn render_intro(app: &App, f: &mut Frame) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(f.area());

    let title = Paragraph::new(app.settings.title.as_str())
        .block(Block::default().borders(Borders::ALL).title("Exam"))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let config = &app.settings.session;
    let lines = vec![
        Line::from(Span::styled("Instructions", bold_style)),
        Line::from(""),
        Line::from(format!(
            "- This exam has {} questions.",
            app.session.question_count()
        )),
        Line::from(format!(
            "- You have {} to complete the whole exam.",
            format_clock(config.total_exam_seconds)
        )),
        Line::from(format!(
            "- Aim for about {} per question; the question clock is a guide only.",
            format_clock(config.per_question_seconds)
        )),
        Line::from("- Each answer is final once submitted and shows an explanation."),
        Line::from("- The exam ends when time runs out or after the last question."),
        Line::from(format!(
            "- Scores of {}% or more pass.",
            app.settings.pass_mark
        )),
    ];
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), chunks[1]);

    if let Some(notice) = &app.notice {
        f.render_widget(
            Paragraph::new(Span::styled(notice.as_str(), Style::default().fg(Color::Red))),
            chunks[2],
        );
    }

    f.render_widget(
        Paragraph::new(Span::styled("(enter) start / (esc)ape", italic_style)),
        chunks[3],
    );
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let session = &self.session;

        // styles
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        if session.status() == SessionStatus::Paused {
            let paused = Paragraph::new(vec![
                Line::from(Span::styled(
                    "PAUSED",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD | Modifier::ITALIC),
                )),
                Line::from(Span::styled(
                    format!("{} left", format_clock(session.total_remaining())),
                    dim_style,
                )),
                Line::from(Span::styled("(p) resume / (f)inish / (esc)ape", italic_style)),
            ])
            .alignment(Alignment::Center);

            let middle = area.height.saturating_sub(3) / 2;
            paused.render(
                Rect {
                    y: area.y + middle,
                    height: area.height.saturating_sub(middle),
                    ..area
                },
                buf,
            );
            return;
        }

        let question: &Question = session.current_question();
        let submitted = session.ledger().get(&question.id).map(|e| &e.answer);
        let answered = submitted.is_some();
        let width = area.width.saturating_sub(HORIZONTAL_MARGIN * 2);

        let pending = if answered { None } else { Some(&self.selection) };
        let rows = choice_lines(question, pending, submitted);
        let feedback = if answered {
            feedback_lines(question, submitted)
        } else {
            Vec::new()
        };

        let question_height = wrapped_height(&question.text, width);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1),               // progress and clocks
                Constraint::Length(1),               // padding
                Constraint::Length(question_height), // question
                Constraint::Length(1),               // padding
                Constraint::Length(rows.len() as u16),
                Constraint::Length(1), // padding
                Constraint::Min(1),    // feedback
                Constraint::Length(1), // notice
                Constraint::Length(1), // legend
            ])
            .split(area);

        let question_left = session.per_question_remaining();
        let total_left = session.total_remaining();
        let header = Paragraph::new(Line::from(vec![
            Span::styled(
                format!(
                    "Question {} of {}",
                    session.current_index() + 1,
                    session.question_count()
                ),
                bold_style,
            ),
            Span::styled(format!("   [{}]", question.question_type()), dim_style),
            Span::raw("   This question "),
            Span::styled(
                format_clock(question_left),
                if question_left == 0 {
                    red_bold_style
                } else {
                    bold_style
                },
            ),
            Span::raw("   Total "),
            Span::styled(
                format_clock(total_left),
                if total_left < 60 {
                    Style::default().patch(bold_style).fg(Color::Yellow)
                } else {
                    bold_style
                },
            ),
        ]));
        header.render(chunks[0], buf);

        Paragraph::new(Span::styled(question.text.as_str(), bold_style))
            .wrap(Wrap { trim: true })
            .render(chunks[2], buf);

        Paragraph::new(rows).render(chunks[4], buf);

        Paragraph::new(feedback)
            .wrap(Wrap { trim: true })
            .render(chunks[6], buf);

        if let Some(notice) = &self.notice {
            Paragraph::new(Span::styled(
                notice.as_str(),
                Style::default().fg(Color::Red),
            ))
            .render(chunks[7], buf);
        }

        let legend = match (&question.kind, answered) {
            (_, true) if question.learn_more_link.is_some() && Browser::is_available() => {
                "(enter) continue / (o)pen link / (p)ause / (f)inish / (esc)ape"
            }
            (_, true) => "(enter) continue / (p)ause / (f)inish / (esc)ape",
            (QuestionKind::Matching { .. }, false) => {
                "(↑/↓) task / (←/→) match / (enter) submit / (p)ause / (f)inish / (esc)ape"
            }
            (_, false) => "(↑/↓) move / (space) select / (enter) submit / (p)ause / (f)inish / (esc)ape",
        };
        Paragraph::new(Span::styled(legend, italic_style)).render(chunks[8], buf);
    }
}

/// One reviewed question in full, as it looked once answered
pub fn render_question_review(app: &App, f: &mut Frame) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let area = f.area();
    let Some((outcome, Some(question))) = app.reviewed() else {
        f.render_widget(
            Paragraph::new("Nothing to review.")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Gray)),
            area,
        );
        return;
    };

    let width = area.width.saturating_sub(HORIZONTAL_MARGIN * 2);
    let submitted = outcome.user_answer.as_ref();
    let rows = choice_lines(question, None, submitted);
    let total = app.result().map_or(0, |r| r.questions.len());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // position and time taken
            Constraint::Length(1),
            Constraint::Length(wrapped_height(&question.text, width)),
            Constraint::Length(1),
            Constraint::Length(rows.len() as u16),
            Constraint::Length(1),
            Constraint::Min(1), // feedback
            Constraint::Length(1), // legend
        ])
        .split(area);

    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(
                format!("Question {} of {total}", app.review_cursor + 1),
                bold_style,
            ),
            Span::styled(
                format!("   [{}]", question.question_type()),
                Style::default().add_modifier(Modifier::DIM),
            ),
            Span::raw(format!("   answered in {}s", outcome.time_taken)),
        ])),
        chunks[0],
    );
    f.render_widget(
        Paragraph::new(Span::styled(question.text.as_str(), bold_style)).wrap(Wrap { trim: true }),
        chunks[2],
    );
    f.render_widget(Paragraph::new(rows), chunks[4]);
    f.render_widget(
        Paragraph::new(feedback_lines(question, submitted)).wrap(Wrap { trim: true }),
        chunks[6],
    );

    let legend = if question.learn_more_link.is_some() && Browser::is_available() {
        "(←/→) question / (o)pen link / (b)ack / (esc)ape"
    } else {
        "(←/→) question / (b)ack / (esc)ape"
    };
    f.render_widget(Paragraph::new(Span::styled(legend, italic_style)), chunks[7]);
}
