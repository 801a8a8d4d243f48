pub mod games;

use std::time::Instant;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::{app::App, display::Screen};

const HORIZONTAL_MARGIN: u16 = 2;
const HEADER_HEIGHT: u16 = 3;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([Constraint::Length(HEADER_HEIGHT), Constraint::Min(0)])
            .split(area);

        match self.controller.display().screen() {
            Screen::Game { label, summary, .. } => {
                let header = Paragraph::new(vec![
                    Line::from(vec![
                        Span::styled(label.clone(), bold_style.fg(Color::Magenta)),
                        Span::styled("   Esc to close", dim_style),
                    ]),
                    Line::from(Span::styled(summary.clone(), dim_style)),
                ])
                .block(Block::default().borders(Borders::BOTTOM));
                header.render(chunks[0], buf);

                if let Some(module) = self.controller.active_module() {
                    module.render(chunks[1], buf);
                }
            }
            Screen::Idle => {
                Paragraph::new(Line::from(Span::styled(
                    "microtaskrr",
                    bold_style.fg(Color::Magenta),
                )))
                .block(Block::default().borders(Borders::BOTTOM))
                .render(chunks[0], buf);

                let mut lines = vec![
                    Line::from(Span::styled(
                        "Waiting for something to wait on...",
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD | Modifier::ITALIC),
                    )),
                    Line::default(),
                ];
                if let Some(wake_at) = self.sleep.wake_at(Instant::now()) {
                    lines.push(Line::from(Span::styled(
                        format!("Sleeping until {}", wake_at.format("%H:%M")),
                        dim_style,
                    )));
                    lines.push(Line::default());
                }
                lines.push(Line::from(vec![
                    Span::styled("s", bold_style),
                    Span::styled(" play now   ", dim_style),
                    Span::styled("q", bold_style),
                    Span::styled(" quit", dim_style),
                ]));

                let body = chunks[1];
                let top = body.height.saturating_sub(lines.len() as u16) / 2;
                let centred = Rect {
                    y: body.y + top,
                    height: body.height - top,
                    ..body
                };
                Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true })
                    .render(centred, buf);
            }
        }
    }
}
