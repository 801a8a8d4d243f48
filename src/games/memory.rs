use super::{GameId, GameModule, MemoryResult, SessionResult};
use crate::timers::Timers;
use crossterm::event::{KeyCode, KeyEvent};
use rand::{rngs::StdRng, Rng, SeedableRng};
use ratatui::{buffer::Buffer, layout::Rect};
use std::time::{Duration, Instant};

const FIRST_LIGHT_MS: u64 = 300;
const LIGHT_ON_MS: u64 = 400;
const LIGHT_STEP_MS: u64 = 600;
const FLASH_MS: u64 = 200;
pub const NEXT_LEVEL_MS: u64 = 800;
pub const RESTART_MS: u64 = 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Up,
    Down,
    Left,
    Right,
}

impl Tile {
    pub const ALL: [Tile; 4] = [Tile::Up, Tile::Down, Tile::Left, Tile::Right];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryState {
    Idle,
    Showing,
    Input,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    Correct(Tile),
    Wrong(Tile),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemoryTimer {
    LightOn(usize),
    LightOff,
    InputPhase,
    ClearFlash,
    NextLevel,
    Restart,
}

/// Repeat a growing sequence of arrow tiles
#[derive(Debug)]
pub struct MemoryGame {
    sequence: Vec<Tile>,
    input_index: usize,
    level: u32,
    best_level: u32,
    state: MemoryState,
    lit: Option<Tile>,
    flash: Option<Flash>,
    timers: Timers<MemoryTimer>,
    rng: StdRng,
    running: bool,
}

impl Default for MemoryGame {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGame {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            sequence: Vec::new(),
            input_index: 0,
            level: 0,
            best_level: 0,
            state: MemoryState::Idle,
            lit: None,
            flash: None,
            timers: Timers::new(),
            rng,
            running: false,
        }
    }

    pub fn state(&self) -> MemoryState {
        self.state
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn best_level(&self) -> u32 {
        self.best_level
    }

    pub fn sequence(&self) -> &[Tile] {
        &self.sequence
    }

    /// Tile lit by playback, or the expected tile after a mistake
    pub fn lit(&self) -> Option<Tile> {
        self.lit
    }

    pub fn flash(&self) -> Option<Flash> {
        self.flash
    }

    /// Time at which playback of the current sequence hands over to the player
    fn playback_len(&self) -> Duration {
        Duration::from_millis(FIRST_LIGHT_MS + LIGHT_STEP_MS * self.sequence.len() as u64)
    }

    fn next_level(&mut self, now: Instant) {
        self.level += 1;
        self.best_level = self.best_level.max(self.level);
        let tile = Tile::ALL[self.rng.gen_range(0..Tile::ALL.len())];
        self.sequence.push(tile);
        self.input_index = 0;
        self.show_sequence(now);
    }

    fn show_sequence(&mut self, now: Instant) {
        self.state = MemoryState::Showing;
        self.lit = None;
        self.flash = None;

        for i in 0..self.sequence.len() {
            let on = FIRST_LIGHT_MS + LIGHT_STEP_MS * i as u64;
            self.timers
                .schedule_after(now, Duration::from_millis(on), MemoryTimer::LightOn(i));
            self.timers.schedule_after(
                now,
                Duration::from_millis(on + LIGHT_ON_MS),
                MemoryTimer::LightOff,
            );
        }
        self.timers
            .schedule_after(now, self.playback_len(), MemoryTimer::InputPhase);
    }

    pub fn press(&mut self, tile: Tile, now: Instant) {
        if !self.running || self.state != MemoryState::Input {
            return;
        }
        let expected = self.sequence[self.input_index];
        if tile == expected {
            self.flash = Some(Flash::Correct(tile));
            self.timers.schedule_after(
                now,
                Duration::from_millis(FLASH_MS),
                MemoryTimer::ClearFlash,
            );
            self.input_index += 1;
            if self.input_index >= self.sequence.len() {
                self.state = MemoryState::Idle;
                self.timers.schedule_after(
                    now,
                    Duration::from_millis(NEXT_LEVEL_MS),
                    MemoryTimer::NextLevel,
                );
            }
        } else {
            self.state = MemoryState::GameOver;
            self.flash = Some(Flash::Wrong(tile));
            self.lit = Some(expected);
            self.timers.schedule_after(
                now,
                Duration::from_millis(RESTART_MS),
                MemoryTimer::Restart,
            );
        }
    }

    fn fire(&mut self, timer: MemoryTimer, now: Instant) {
        match timer {
            MemoryTimer::LightOn(i) => self.lit = self.sequence.get(i).copied(),
            MemoryTimer::LightOff => self.lit = None,
            MemoryTimer::InputPhase => {
                self.lit = None;
                self.state = MemoryState::Input;
            }
            MemoryTimer::ClearFlash => {
                if matches!(self.flash, Some(Flash::Correct(_))) {
                    self.flash = None;
                }
            }
            MemoryTimer::NextLevel => self.next_level(now),
            MemoryTimer::Restart => {
                self.level = 0;
                self.sequence.clear();
                self.next_level(now);
            }
        }
    }
}

impl GameModule for MemoryGame {
    fn id(&self) -> GameId {
        GameId::Memory
    }

    fn start(&mut self, now: Instant) {
        self.timers.cancel_all();
        self.level = 0;
        self.best_level = 0;
        self.sequence.clear();
        self.running = true;
        self.next_level(now);
    }

    fn stop(&mut self, _now: Instant) -> Option<SessionResult> {
        if !self.running {
            return None;
        }
        self.running = false;
        self.timers.cancel_all();
        self.lit = None;
        self.flash = None;

        Some(SessionResult::Memory(MemoryResult {
            level: self.level,
            best_level: self.best_level,
        }))
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        let tile = match key.code {
            KeyCode::Up => Tile::Up,
            KeyCode::Down => Tile::Down,
            KeyCode::Left => Tile::Left,
            KeyCode::Right => Tile::Right,
            _ => return,
        };
        self.press(tile, now);
    }

    fn advance(&mut self, now: Instant) {
        if !self.running {
            return;
        }
        while let Some(timer) = self.timers.pop_due(now) {
            self.fire(timer, now);
        }
    }

    fn render(&self, area: Rect, buf: &mut Buffer) {
        crate::ui::games::render_memory(self, area, buf);
    }
}
