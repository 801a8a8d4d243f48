//! Per-game widgets. Each takes the game by reference and draws into `area`.

use std::time::Instant;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::games::{
    arithmetic::Feedback,
    memory::{Flash, MemoryState, Tile},
    reflex::ReflexState,
    snake::Cell,
    stroop::{Colour, Verdict},
    ArithmeticGame, MemoryGame, ReflexGame, SnakeGame, StroopGame, TypingGame,
};

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

/// Splits `area` into a centred body of `height` rows and a one-line footer
fn body_and_footer(area: Rect, height: u16) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);
    (chunks[1], chunks[3])
}

fn footer(text: String, area: Rect, buf: &mut Buffer) {
    Paragraph::new(Span::styled(text, dim()))
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn or_dash(value: Option<u32>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

pub fn render_reflex(game: &ReflexGame, area: Rect, buf: &mut Buffer) {
    let (zone, foot) = body_and_footer(area, 7);

    let (text, colour) = match game.state() {
        ReflexState::Idle => ("Press Space to start".to_string(), Color::Blue),
        ReflexState::Waiting => ("Wait for green...".to_string(), Color::Red),
        ReflexState::Ready => ("PRESS!".to_string(), Color::Green),
        ReflexState::Result => (
            format!("{} ms  -  Space to go again", or_dash(game.last_ms())),
            Color::Blue,
        ),
        ReflexState::TooEarly => ("Too early! Space to retry".to_string(), Color::Yellow),
    };

    let lines = vec![
        Line::default(),
        Line::default(),
        Line::from(Span::styled(text, bold().fg(Color::Black))),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().bg(colour))
        .block(Block::default().borders(Borders::ALL))
        .render(zone, buf);

    let avg = game.average_ms().map(crate::util::round_u32);
    footer(
        format!(
            "Tries: {} | Best: {}ms | Avg: {}ms | Early: {}",
            game.samples().len(),
            or_dash(game.best_ms()),
            or_dash(avg),
            game.early_presses()
        ),
        foot,
        buf,
    );
}

pub fn render_arithmetic(game: &ArithmeticGame, area: Rect, buf: &mut Buffer) {
    let (body, foot) = body_and_footer(area, 5);

    let feedback = match game.feedback() {
        Some(Feedback::Correct) => Span::styled("Correct!", bold().fg(Color::Green)),
        Some(Feedback::Wrong { answer }) => {
            Span::styled(format!("Wrong, it was {answer}"), bold().fg(Color::Red))
        }
        None => Span::raw(""),
    };

    let lines = vec![
        Line::from(Span::styled(format!("{} = ?", game.challenge()), bold())),
        Line::default(),
        Line::from(vec![
            Span::styled("> ", dim()),
            Span::styled(game.input().to_string(), bold().fg(Color::Cyan)),
            Span::styled("_", dim()),
        ]),
        Line::default(),
        Line::from(feedback),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(body, buf);

    footer(
        format!(
            "{}/{} | Streak: {} | Best: {}",
            game.correct(),
            game.total(),
            game.streak(),
            game.best_streak()
        ),
        foot,
        buf,
    );
}

pub fn render_snake(game: &SnakeGame, area: Rect, buf: &mut Buffer) {
    let board = game.board();
    let (body, foot) = body_and_footer(area, board.height() as u16 + 2);

    let head = board.head();
    let food = board.food();
    let lines = (0..board.height())
        .map(|y| {
            Line::from(
                (0..board.width())
                    .map(|x| {
                        let cell = Cell::new(x, y);
                        if cell == head {
                            let colour = if board.is_dead() { Color::Red } else { Color::Green };
                            Span::styled("██", bold().fg(colour))
                        } else if board.occupies(cell) {
                            Span::styled("██", Style::default().fg(Color::Green))
                        } else if food == Some(cell) {
                            Span::styled("◆ ", bold().fg(Color::Red))
                        } else {
                            Span::styled("· ", dim())
                        }
                    })
                    .collect::<Vec<_>>(),
            )
        })
        .collect::<Vec<_>>();

    let width = (board.width() as u16 * 2 + 2).min(body.width);
    let grid = Rect {
        x: body.x + (body.width - width) / 2,
        width,
        ..body
    };
    let title = if board.is_dead() {
        format!(" Game over - score {} ", board.score())
    } else {
        format!(" Score {} ", board.score())
    };
    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .render(grid, buf);

    footer(
        format!("Best this session: {} | Arrows/WASD to steer", game.high_score()),
        foot,
        buf,
    );
}

pub fn render_typing(game: &TypingGame, area: Rect, buf: &mut Buffer) {
    let max_width = area.width.saturating_sub(10).max(10) as usize;
    let sentence = game.words().join(" ");
    let rows = ((sentence.width() as f64 / max_width as f64).ceil() as u16).max(1);
    let (body, foot) = body_and_footer(area, rows + 3);

    let index = game.current_index();
    let styled = game.words().iter().enumerate().map(|(i, word)| {
        let style = match game.results().get(i) {
            Some(true) => bold().fg(Color::Green),
            Some(false) => bold().fg(Color::Red),
            None if i == index => bold().add_modifier(Modifier::UNDERLINED),
            None => dim(),
        };
        Span::styled(word.clone(), style)
    });
    let spans = Itertools::intersperse(styled, Span::raw(" ")).collect::<Vec<_>>();

    let status = if game.is_done() {
        Line::from(Span::styled(
            "Done! Space for another sentence",
            bold().fg(Color::Yellow),
        ))
    } else {
        Line::from(vec![
            Span::styled("> ", dim()),
            Span::styled(game.input().to_string(), bold().fg(Color::Cyan)),
            Span::styled("_", dim()),
        ])
    };

    let lines = vec![Line::from(spans), Line::default(), status];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(body, buf);

    footer(
        format!(
            "WPM: {} | Accuracy: {}% | Sentences: {}",
            crate::util::round_u32(game.words_per_minute(Instant::now())),
            crate::util::round_u32(game.accuracy()),
            game.sentences_completed()
        ),
        foot,
        buf,
    );
}

fn tile_label(tile: Tile) -> &'static str {
    match tile {
        Tile::Up => "▲",
        Tile::Down => "▼",
        Tile::Left => "◀",
        Tile::Right => "▶",
    }
}

pub fn render_memory(game: &MemoryGame, area: Rect, buf: &mut Buffer) {
    let (body, foot) = body_and_footer(area, 7);

    let tile_style = |tile: Tile| match (game.flash(), game.lit()) {
        (Some(Flash::Wrong(t)), _) if t == tile => bold().fg(Color::Black).bg(Color::Red),
        (Some(Flash::Correct(t)), _) if t == tile => bold().fg(Color::Black).bg(Color::Green),
        (_, Some(t)) if t == tile => bold().fg(Color::Black).bg(Color::Yellow),
        _ => dim(),
    };
    let tile = |t: Tile| Span::styled(format!(" {} ", tile_label(t)), tile_style(t));

    let status = match game.state() {
        MemoryState::Showing => Span::styled("Watch...", bold().fg(Color::Yellow)),
        MemoryState::Input => Span::styled("Your turn", bold().fg(Color::Cyan)),
        MemoryState::Idle => Span::styled("Nice!", bold().fg(Color::Green)),
        MemoryState::GameOver => Span::styled(
            format!("Wrong! Reached level {}", game.level()),
            bold().fg(Color::Red),
        ),
    };

    let lines = vec![
        Line::from(tile(Tile::Up)),
        Line::from(vec![tile(Tile::Left), Span::raw("   "), tile(Tile::Right)]),
        Line::from(tile(Tile::Down)),
        Line::default(),
        Line::from(status),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(body, buf);

    footer(
        format!("Level: {} | Best: {}", game.level(), game.best_level()),
        foot,
        buf,
    );
}

fn ink(colour: Colour) -> Color {
    match colour {
        Colour::Red => Color::Red,
        Colour::Blue => Color::Blue,
        Colour::Green => Color::Green,
        Colour::Yellow => Color::Yellow,
    }
}

pub fn render_stroop(game: &StroopGame, area: Rect, buf: &mut Buffer) {
    let (body, foot) = body_and_footer(area, 5);
    let round = game.round();

    let word = if game.is_locked() {
        Span::raw("")
    } else {
        Span::styled(round.word.name(), bold().fg(ink(round.ink)))
    };
    let verdict = match game.verdict() {
        Some(Verdict::Correct) => Span::styled("Correct!", bold().fg(Color::Green)),
        Some(Verdict::Wrong { ink }) => {
            Span::styled(format!("Wrong, it was {}", ink.name()), bold().fg(Color::Red))
        }
        None => Span::raw(""),
    };
    let keys = Colour::ALL
        .iter()
        .map(|c| format!("{} {}", c.key(), c.name().to_lowercase()))
        .join("  ");

    let lines = vec![
        Line::from(word),
        Line::default(),
        Line::from(verdict),
        Line::default(),
        Line::from(Span::styled(format!("Name the ink: {keys}"), dim())),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(body, buf);

    footer(
        format!(
            "{}/{} | Streak: {} | Best: {}",
            game.correct(),
            game.total(),
            game.streak(),
            game.best_streak()
        ),
        foot,
        buf,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Corpus;
    use crate::games::GameModule;
    use rand::{rngs::StdRng, SeedableRng};

    fn buffer_text(buf: &Buffer) -> String {
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn reflex_idle_prompt() {
        let mut game = ReflexGame::with_rng(StdRng::seed_from_u64(1));
        game.start(Instant::now());
        let area = Rect::new(0, 0, 60, 20);
        let mut buf = Buffer::empty(area);
        render_reflex(&game, area, &mut buf);
        assert!(buffer_text(&buf).contains("Press Space to start"));
    }

    #[test]
    fn snake_draws_score_title() {
        let mut game = SnakeGame::with_rng(StdRng::seed_from_u64(1));
        game.start(Instant::now());
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        render_snake(&game, area, &mut buf);
        assert!(buffer_text(&buf).contains("Score 0"));
    }

    #[test]
    fn typing_shows_first_word() {
        let corpus = Corpus::builtin().unwrap();
        let mut game = TypingGame::with_rng(corpus, StdRng::seed_from_u64(1));
        game.start(Instant::now());
        let area = Rect::new(0, 0, 120, 20);
        let mut buf = Buffer::empty(area);
        render_typing(&game, area, &mut buf);
        let first = game.words()[0].clone();
        assert!(buffer_text(&buf).contains(&first));
    }

    #[test]
    fn tiny_area_does_not_panic() {
        let area = Rect::new(0, 0, 4, 2);
        let mut buf = Buffer::empty(area);
        render_snake(&SnakeGame::new(), area, &mut buf);
        render_memory(&MemoryGame::new(), area, &mut buf);
        render_stroop(&StroopGame::new(), area, &mut buf);
        render_arithmetic(&ArithmeticGame::new(), area, &mut buf);
    }
}
