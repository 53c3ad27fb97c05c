use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Gauge, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use kwiz::{
    config::Theme,
    input::option_label,
    session::{AnswerState, Feedback, QuizSession},
};

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

/// Colours for one theme
struct Palette {
    base: Style,
    accent: Color,
    good: Color,
    bad: Color,
    muted: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                base: Style::default().fg(Color::White).bg(Color::Reset),
                accent: Color::Cyan,
                good: Color::Green,
                bad: Color::Red,
                muted: Color::DarkGray,
            },
            Theme::Light => Self {
                base: Style::default().fg(Color::Black).bg(Color::White),
                accent: Color::Blue,
                good: Color::Rgb(0, 128, 0),
                bad: Color::Rgb(190, 0, 0),
                muted: Color::Gray,
            },
        }
    }

    fn bold(&self) -> Style {
        self.base.add_modifier(Modifier::BOLD)
    }

    fn dim(&self) -> Style {
        self.base.fg(self.muted)
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let palette = Palette::for_theme(self.theme);
        Block::default().style(palette.base).render(area, buf);

        let area = Layout::default()
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([Constraint::Min(0)])
            .split(area)[0];

        match (&self.state, self.session.as_ref()) {
            (AppState::LoadFailed(_), _) | (_, None) => {
                let reason = match &self.state {
                    AppState::LoadFailed(reason) => reason.as_str(),
                    _ => "",
                };
                render_load_failed(reason, &palette, area, buf)
            }
            (AppState::Ready, Some(session)) => render_ready(session, &palette, area, buf),
            (AppState::Quiz, Some(session)) => render_quiz(self, session, &palette, area, buf),
            (AppState::Results, Some(session)) => render_results(session, &palette, area, buf),
        }

        let footer = Rect {
            y: area.bottom().saturating_sub(1),
            height: area.height.min(1),
            ..area
        };
        render_footer(self, &palette, footer, buf);
    }
}

fn centered_lines(lines: Vec<Line<'_>>, area: Rect, buf: &mut Buffer) {
    let height = (lines.len() as u16).min(area.height);
    let top = area.y + (area.height - height) / 2;
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(
            Rect {
                y: top,
                height,
                ..area
            },
            buf,
        );
}

fn render_load_failed(reason: &str, palette: &Palette, area: Rect, buf: &mut Buffer) {
    let lines = vec![
        Line::from(Span::styled(
            "Failed to load the question bank.",
            palette.bold().fg(palette.bad),
        )),
        Line::from(""),
        Line::from(Span::styled(reason.to_string(), palette.dim())),
    ];
    centered_lines(lines, area, buf);
}

fn render_ready(session: &QuizSession, palette: &Palette, area: Rect, buf: &mut Buffer) {
    let settings = session.settings();
    let round = settings.round_size.min(session.bank().size());
    let lines = vec![
        Line::from(Span::styled("kwiz", palette.bold().fg(palette.accent))),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                "{} questions loaded · {} per round · {}s each",
                session.bank().size(),
                round,
                settings.time_per_question.as_secs()
            ),
            palette.base,
        )),
        Line::from(""),
        Line::from(Span::styled("Press Enter to start", palette.bold())),
    ];
    centered_lines(lines, area, buf);
}

fn render_quiz(app: &App, session: &QuizSession, palette: &Palette, area: Rect, buf: &mut Buffer) {
    let Some(question) = session.current_question() else {
        return;
    };

    let max_chars_per_line = area.width.max(1);
    let prompt_lines = (question.prompt.width() as f64 / max_chars_per_line as f64).ceil() as u16;
    let feedback = session.last_feedback();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status
            Constraint::Length(1), // timer
            Constraint::Length(1), // padding
            Constraint::Length(prompt_lines.max(1)),
            Constraint::Length(1), // padding
            Constraint::Length(4), // options
            Constraint::Length(1), // padding
            Constraint::Min(0),    // feedback
        ])
        .split(area);

    let points = session.points_for_current().unwrap_or(0);
    let status = Line::from(vec![
        Span::styled(
            format!(
                "Question {}/{}",
                session.current_index_1_based(),
                session.total_questions()
            ),
            palette.bold(),
        ),
        Span::styled("   ", palette.base),
        Span::styled(
            format!("Score {}", session.current_score()),
            palette.bold().fg(palette.accent),
        ),
        Span::styled("   ", palette.base),
        Span::styled(
            format!("{} · {} pts", question.difficulty, points),
            palette.dim(),
        ),
        Span::styled(
            if app.sound { "" } else { "   muted" },
            palette.dim(),
        ),
    ]);
    Paragraph::new(status).render(chunks[0], buf);

    let armed = session.answer_state() == AnswerState::Armed;
    let ratio = if armed {
        session.time_fraction_remaining()
    } else {
        0.0
    };
    let gauge_color = if ratio > 0.25 { palette.accent } else { palette.bad };
    Gauge::default()
        .gauge_style(palette.base.fg(gauge_color))
        .ratio(ratio)
        .label(Span::styled(
            format!("{}s", if armed { session.time_remaining() } else { 0 }),
            palette.bold(),
        ))
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(question.prompt.as_str(), palette.bold()))
        .wrap(Wrap { trim: true })
        .render(chunks[3], buf);

    let options: Vec<Line> = question
        .options
        .iter()
        .enumerate()
        .map(|(slot, text)| {
            let style = option_style(slot, feedback, palette);
            Line::from(Span::styled(
                format!("{}. {}", option_label(slot), text),
                style,
            ))
        })
        .collect();
    Paragraph::new(options).render(chunks[5], buf);

    if let Some(fb) = feedback {
        render_feedback(fb, &question.options[fb.correct_index], palette, chunks[7], buf);
    }
}

fn option_style(slot: usize, feedback: Option<&Feedback>, palette: &Palette) -> Style {
    match feedback {
        None => palette.base,
        Some(fb) if slot == fb.correct_index => palette.bold().fg(palette.good),
        Some(fb) if fb.chosen() == Some(slot) => palette
            .bold()
            .fg(palette.bad)
            .add_modifier(Modifier::CROSSED_OUT),
        Some(_) => palette.dim(),
    }
}

fn render_feedback(fb: &Feedback, correct_text: &str, palette: &Palette, area: Rect, buf: &mut Buffer) {
    let result = if fb.timed_out() {
        Span::styled("⏱ Time's up.", palette.bold().fg(palette.bad))
    } else if fb.correct {
        Span::styled(
            format!("✔ Correct! +{}", fb.points_awarded),
            palette.bold().fg(palette.good),
        )
    } else {
        Span::styled("✘ Wrong answer.", palette.bold().fg(palette.bad))
    };

    let lines = vec![
        Line::from(result),
        Line::from(Span::styled(
            format!(
                "Answer: {}. {}: {}",
                option_label(fb.correct_index),
                correct_text,
                fb.explanation
            ),
            palette.base,
        )),
        Line::from(""),
        Line::from(Span::styled("Enter for the next question", palette.dim())),
    ];
    Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .render(area, buf);
}

fn render_results(session: &QuizSession, palette: &Palette, area: Rect, buf: &mut Buffer) {
    let lines = vec![
        Line::from(Span::styled("Finished!", palette.bold().fg(palette.accent))),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                "Score: {} / {}",
                session.current_score(),
                session.max_score()
            ),
            palette.bold(),
        )),
        Line::from(Span::styled(
            format!(
                "{} of {} correct · {} timed out",
                session.correct_count(),
                session.total_questions(),
                session.timeout_count()
            ),
            palette.base,
        )),
        Line::from(""),
        Line::from(Span::styled("(r)estart or Esc to quit", palette.dim())),
    ];
    centered_lines(lines, area, buf);
}

fn render_footer(app: &App, palette: &Palette, area: Rect, buf: &mut Buffer) {
    let keys = match app.state {
        AppState::Quiz => "1-4 / a-d answer · enter next · r restart",
        AppState::Ready | AppState::Results => "enter start · r restart",
        AppState::LoadFailed(_) => "",
    };
    let hint = format!(
        "{keys}{}t theme ({}) · m sound ({}) · esc quit",
        if keys.is_empty() { "" } else { " · " },
        app.theme.to_string().to_lowercase(),
        if app.sound { "on" } else { "off" }
    );
    Paragraph::new(Span::styled(hint, palette.dim()))
        .alignment(Alignment::Center)
        .render(area, buf);
}
