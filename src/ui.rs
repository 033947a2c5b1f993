use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use unicode_width::UnicodeWidthChar;

use crate::app::{App, BannerKind, Field};
use crate::record::format_duration;
use crate::timer::{Clock, TimerStatus};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;
const CURSOR: &str = "▏";

/// Longest suffix of `text` that fits in `width` columns, so the end being
/// typed stays visible.
pub fn visible_tail(text: &str, width: usize) -> &str {
    let mut used = 0;
    let mut start = text.len();
    for (idx, c) in text.char_indices().rev() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        start = idx;
    }
    &text[start..]
}

fn input_box<'a>(title: &'a str, value: &'a str, focused: bool, area: Rect) -> Paragraph<'a> {
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().add_modifier(Modifier::DIM)
    };
    // borders take two columns, the cursor one more
    let inner_width = area.width.saturating_sub(3) as usize;
    let mut spans = vec![Span::raw(visible_tail(value, inner_width))];
    if focused {
        spans.push(Span::styled(
            CURSOR,
            Style::default().add_modifier(Modifier::SLOW_BLINK),
        ));
    }

    Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title),
    )
}

fn button(label: &str, enabled: bool, color: Color) -> Span<'_> {
    let style = if enabled {
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::DIM)
    };
    Span::styled(label, style)
}

impl<C: Clock> Widget for &App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let status = self.status();
        let bold = Style::default().add_modifier(Modifier::BOLD);

        let form_height = if status == TimerStatus::Ended { 6 } else { 0 };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1),           // title
                Constraint::Length(3),           // name
                Constraint::Length(1),           // buttons
                Constraint::Length(4),           // timer / summary
                Constraint::Length(form_height), // description + location
                Constraint::Length(1),           // banner
                Constraint::Min(0),
                Constraint::Length(1), // hints
            ])
            .split(area);

        Paragraph::new(Span::styled("⏱  focus · time tracker", bold))
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        let name = if status == TimerStatus::Idle {
            self.name_input.as_str()
        } else {
            self.controller.owner_name().unwrap_or_default()
        };
        input_box(
            "your name",
            name,
            status == TimerStatus::Idle && self.focus == Field::Name,
            chunks[1],
        )
        .render(chunks[1], buf);

        Paragraph::new(Line::from(vec![
            button("[ START ]", self.can_start(), Color::Green),
            Span::raw("   "),
            button("[ END ]", self.can_end(), Color::Red),
        ]))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

        let timer_lines = match status {
            TimerStatus::Idle => vec![Line::from(Span::styled(
                "no session running",
                Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC),
            ))],
            TimerStatus::Running => {
                let elapsed = self
                    .controller
                    .elapsed()
                    .map(format_duration)
                    .unwrap_or_default();
                vec![
                    Line::from("current session"),
                    Line::from(Span::styled(
                        elapsed,
                        Style::default().patch(bold).fg(Color::Yellow),
                    )),
                ]
            }
            TimerStatus::Ended => match self.controller.summary() {
                Some(summary) => vec![
                    Line::from(format!(
                        "start {}   end {}",
                        summary.start_clock(),
                        summary.end_clock()
                    )),
                    Line::from(Span::styled(
                        format!("duration {}", summary.duration_formatted),
                        Style::default().patch(bold).fg(Color::Magenta),
                    )),
                ],
                None => vec![],
            },
        };
        Paragraph::new(timer_lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::TOP))
            .render(chunks[3], buf);

        if status == TimerStatus::Ended {
            let form = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Length(3)])
                .split(chunks[4]);
            input_box(
                "what did you work on?",
                &self.description_input,
                self.focus == Field::Description,
                form[0],
            )
            .render(form[0], buf);
            input_box(
                "where did you work?",
                &self.location_input,
                self.focus == Field::Location,
                form[1],
            )
            .render(form[1], buf);
        }

        if let Some(banner) = &self.banner {
            let color = match banner.kind {
                BannerKind::Info => Color::Blue,
                BannerKind::Success => Color::Green,
                BannerKind::Warning => Color::Yellow,
                BannerKind::Error => Color::Red,
            };
            Paragraph::new(Span::styled(
                banner.text.as_str(),
                Style::default().patch(bold).fg(color),
            ))
            .alignment(Alignment::Center)
            .render(chunks[5], buf);
        }

        Paragraph::new(Span::styled(
            self.hints(),
            Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
        ))
        .alignment(Alignment::Center)
        .render(chunks[7], buf);
    }
}
