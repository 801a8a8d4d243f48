use super::{GameId, GameModule, SessionResult, SnakeResult};
use crate::timers::Timers;
use crossterm::event::{KeyCode, KeyEvent};
use rand::{rngs::StdRng, Rng, SeedableRng};
use ratatui::{buffer::Buffer, layout::Rect};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub const GRID_WIDTH: i32 = 24;
pub const GRID_HEIGHT: i32 = 13;

/// Fixed logic rate, independent of how often frames arrive (~8 moves/sec)
pub const TICK_MS: u64 = 125;

/// Pause on the crash screen before a fresh run starts
pub const RESTART_MS: u64 = 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Moved,
    Ate,
    Crashed,
    /// The board is showing a finished run and did not move
    Dead,
}

/// Pure snake simulation: one call to [`Board::step`] is one logic tick
#[derive(Debug, Clone)]
pub struct Board {
    width: i32,
    height: i32,
    body: VecDeque<Cell>,
    direction: Direction,
    next_direction: Direction,
    food: Option<Cell>,
    score: u32,
    dead: bool,
}

impl Board {
    /// Boards too narrow for the centred starting snake are widened to fit it
    pub fn new<R: Rng>(width: i32, height: i32, rng: &mut R) -> Self {
        let mut board = Self {
            width: width.max(4),
            height: height.max(1),
            body: VecDeque::new(),
            direction: Direction::Right,
            next_direction: Direction::Right,
            food: None,
            score: 0,
            dead: false,
        };
        board.reset(rng);
        board
    }

    /// Three cells in the middle heading right, score zero, fresh food
    pub fn reset<R: Rng>(&mut self, rng: &mut R) {
        let mid_x = self.width / 2;
        let mid_y = self.height / 2;
        self.body = (0..3).map(|i| Cell::new(mid_x - i, mid_y)).collect();
        self.direction = Direction::Right;
        self.next_direction = Direction::Right;
        self.score = 0;
        self.dead = false;
        self.place_food(rng);
    }

    /// Buffers a turn for the next tick; exact reversals are rejected
    pub fn turn(&mut self, direction: Direction) -> bool {
        if direction == self.direction.opposite() {
            return false;
        }
        self.next_direction = direction;
        true
    }

    pub fn step<R: Rng>(&mut self, rng: &mut R) -> StepOutcome {
        if self.dead {
            return StepOutcome::Dead;
        }

        self.direction = self.next_direction;
        let (dx, dy) = self.direction.delta();
        let head = self.head();
        let next = Cell::new(head.x + dx, head.y + dy);

        if !self.in_bounds(next) || self.occupies(next) {
            self.dead = true;
            return StepOutcome::Crashed;
        }

        self.body.push_front(next);
        if self.food == Some(next) {
            self.score += 1;
            self.place_food(rng);
            StepOutcome::Ate
        } else {
            self.body.pop_back();
            StepOutcome::Moved
        }
    }

    /// Uniform over free cells by rejection sampling; no food once the body fills the grid
    pub fn place_food<R: Rng>(&mut self, rng: &mut R) {
        if self.body.len() >= (self.width * self.height) as usize {
            self.food = None;
            return;
        }
        loop {
            let cell = Cell::new(rng.gen_range(0..self.width), rng.gen_range(0..self.height));
            if !self.occupies(cell) {
                self.food = Some(cell);
                return;
            }
        }
    }

    pub fn set_food(&mut self, food: Option<Cell>) {
        self.food = food;
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        (0..self.width).contains(&cell.x) && (0..self.height).contains(&cell.y)
    }

    pub fn occupies(&self, cell: Cell) -> bool {
        self.body.contains(&cell)
    }

    pub fn head(&self) -> Cell {
        self.body[0]
    }

    pub fn body(&self) -> &VecDeque<Cell> {
        &self.body
    }

    pub fn food(&self) -> Option<Cell> {
        self.food
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SnakeTimer {
    Restart,
}

/// Snake with a fixed-rate logic tick driven from the host's frame callback
#[derive(Debug)]
pub struct SnakeGame {
    board: Board,
    rng: StdRng,
    high_score: u32,
    last_tick: Option<Instant>,
    timers: Timers<SnakeTimer>,
    running: bool,
}

impl Default for SnakeGame {
    fn default() -> Self {
        Self::new()
    }
}

impl SnakeGame {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_rng(mut rng: StdRng) -> Self {
        let board = Board::new(GRID_WIDTH, GRID_HEIGHT, &mut rng);
        Self {
            board,
            rng,
            high_score: 0,
            last_tick: None,
            timers: Timers::new(),
            running: false,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Best finished run this session
    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn turn(&mut self, direction: Direction) -> bool {
        self.running && self.board.turn(direction)
    }

    /// Render-frame callback. Logic only advances once a full tick interval has passed
    /// since the previous logic tick, however often frames arrive.
    pub fn frame(&mut self, now: Instant) {
        if !self.running {
            return;
        }
        while let Some(timer) = self.timers.pop_due(now) {
            match timer {
                SnakeTimer::Restart => self.board.reset(&mut self.rng),
            }
        }

        let last = *self.last_tick.get_or_insert(now);
        if now.saturating_duration_since(last) >= Duration::from_millis(TICK_MS) {
            self.last_tick = Some(now);
            self.tick(now);
        }
    }

    /// One logic tick, regardless of timing
    pub fn tick(&mut self, now: Instant) -> StepOutcome {
        let outcome = self.board.step(&mut self.rng);
        if outcome == StepOutcome::Crashed {
            self.high_score = self.high_score.max(self.board.score());
            tracing::debug!("Snake run ended with score {}", self.board.score());
            self.timers.schedule_after(
                now,
                Duration::from_millis(RESTART_MS),
                SnakeTimer::Restart,
            );
        }
        outcome
    }
}

impl GameModule for SnakeGame {
    fn id(&self) -> GameId {
        GameId::Snake
    }

    fn start(&mut self, now: Instant) {
        self.timers.cancel_all();
        self.board.reset(&mut self.rng);
        self.high_score = 0;
        self.last_tick = Some(now);
        self.running = true;
    }

    fn stop(&mut self, _now: Instant) -> Option<SessionResult> {
        if !self.running {
            return None;
        }
        self.running = false;
        self.timers.cancel_all();

        Some(SessionResult::Snake(SnakeResult {
            score: self.board.score(),
            session_best: self.high_score.max(self.board.score()),
        }))
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn handle_key(&mut self, key: KeyEvent, _now: Instant) {
        let direction = match key.code {
            KeyCode::Up => Direction::Up,
            KeyCode::Down => Direction::Down,
            KeyCode::Left => Direction::Left,
            KeyCode::Right => Direction::Right,
            KeyCode::Char(c) => match c.to_ascii_lowercase() {
                'w' => Direction::Up,
                's' => Direction::Down,
                'a' => Direction::Left,
                'd' => Direction::Right,
                _ => return,
            },
            _ => return,
        };
        self.turn(direction);
    }

    fn advance(&mut self, now: Instant) {
        self.frame(now);
    }

    fn render(&self, area: Rect, buf: &mut Buffer) {
        crate::ui::games::render_snake(self, area, buf);
    }
}
