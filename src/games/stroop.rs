use super::{GameId, GameModule, SessionResult, StroopResult};
use crate::timers::Timers;
use crossterm::event::{KeyCode, KeyEvent};
use rand::{rngs::StdRng, Rng, SeedableRng};
use ratatui::{buffer::Buffer, layout::Rect};
use std::time::{Duration, Instant};

/// Input is locked for this long after each answer
pub const LOCKOUT_MS: u64 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colour {
    Red,
    Blue,
    Green,
    Yellow,
}

impl Colour {
    pub const ALL: [Colour; 4] = [Colour::Red, Colour::Blue, Colour::Green, Colour::Yellow];

    pub fn name(&self) -> &'static str {
        match self {
            Colour::Red => "RED",
            Colour::Blue => "BLUE",
            Colour::Green => "GREEN",
            Colour::Yellow => "YELLOW",
        }
    }

    pub fn key(&self) -> char {
        match self {
            Colour::Red => 'r',
            Colour::Blue => 'b',
            Colour::Green => 'g',
            Colour::Yellow => 'y',
        }
    }

    pub fn from_key(c: char) -> Option<Self> {
        let c = c.to_ascii_lowercase();
        Self::ALL.into_iter().find(|colour| colour.key() == c)
    }
}

/// A colour word drawn in a different ink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Round {
    pub word: Colour,
    pub ink: Colour,
}

impl Round {
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let word = Colour::ALL[rng.gen_range(0..Colour::ALL.len())];
        let others: Vec<Colour> = Colour::ALL.into_iter().filter(|c| *c != word).collect();
        let ink = others[rng.gen_range(0..others.len())];
        Self { word, ink }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Wrong { ink: Colour },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StroopTimer {
    NextRound,
}

#[derive(Debug)]
pub struct StroopGame {
    round: Round,
    verdict: Option<Verdict>,
    locked: bool,
    correct: u32,
    total: u32,
    streak: u32,
    best_streak: u32,
    timers: Timers<StroopTimer>,
    rng: StdRng,
    running: bool,
}

impl Default for StroopGame {
    fn default() -> Self {
        Self::new()
    }
}

impl StroopGame {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_rng(mut rng: StdRng) -> Self {
        let round = Round::generate(&mut rng);
        Self {
            round,
            verdict: None,
            locked: false,
            correct: 0,
            total: 0,
            streak: 0,
            best_streak: 0,
            timers: Timers::new(),
            rng,
            running: false,
        }
    }

    pub fn round(&self) -> Round {
        self.round
    }

    pub fn verdict(&self) -> Option<Verdict> {
        self.verdict
    }

    /// True while the answer banner is up and the word is hidden
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn correct(&self) -> u32 {
        self.correct
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    /// Returns `None` when the answer was not taken
    pub fn answer(&mut self, colour: Colour, now: Instant) -> Option<Verdict> {
        if !self.running || self.locked {
            return None;
        }

        self.total += 1;
        let verdict = if colour == self.round.ink {
            self.correct += 1;
            self.streak += 1;
            self.best_streak = self.best_streak.max(self.streak);
            Verdict::Correct
        } else {
            self.streak = 0;
            Verdict::Wrong {
                ink: self.round.ink,
            }
        };

        self.verdict = Some(verdict);
        self.locked = true;
        self.timers.schedule_after(
            now,
            Duration::from_millis(LOCKOUT_MS),
            StroopTimer::NextRound,
        );
        Some(verdict)
    }

    fn next_round(&mut self) {
        self.round = Round::generate(&mut self.rng);
        self.verdict = None;
        self.locked = false;
    }
}

impl GameModule for StroopGame {
    fn id(&self) -> GameId {
        GameId::Stroop
    }

    fn start(&mut self, _now: Instant) {
        self.timers.cancel_all();
        self.correct = 0;
        self.total = 0;
        self.streak = 0;
        self.best_streak = 0;
        self.running = true;
        self.next_round();
    }

    fn stop(&mut self, _now: Instant) -> Option<SessionResult> {
        if !self.running {
            return None;
        }
        self.running = false;
        self.timers.cancel_all();

        Some(SessionResult::Stroop(StroopResult {
            correct: self.correct,
            total: self.total,
            best_streak: self.best_streak,
        }))
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if let KeyCode::Char(c) = key.code {
            if let Some(colour) = Colour::from_key(c) {
                self.answer(colour, now);
            }
        }
    }

    fn advance(&mut self, now: Instant) {
        if !self.running {
            return;
        }
        while let Some(StroopTimer::NextRound) = self.timers.pop_due(now) {
            self.next_round();
        }
    }

    fn render(&self, area: Rect, buf: &mut Buffer) {
        crate::ui::games::render_stroop(self, area, buf);
    }
}
