use super::{GameId, GameModule, ReflexResult, SessionResult};
use crate::timers::{TimerId, Timers};
use crate::util::{mean, round_u32};
use crossterm::event::{KeyCode, KeyEvent};
use rand::{rngs::StdRng, Rng, SeedableRng};
use ratatui::{buffer::Buffer, layout::Rect};
use std::ops::Range;
use std::time::{Duration, Instant};

/// Random wait before the zone turns green, in milliseconds
pub const READY_DELAY_MS: Range<u64> = 1500..5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflexState {
    Idle,
    Waiting,
    Ready,
    Result,
    TooEarly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReflexTimer {
    GoGreen,
}

/// Reaction-time game: wait for green, then press Space as fast as possible
#[derive(Debug)]
pub struct ReflexGame {
    state: ReflexState,
    samples: Vec<u32>,
    best_ms: Option<u32>,
    last_ms: Option<u32>,
    ready_at: Option<Instant>,
    early_presses: u32,
    go_green: Option<TimerId>,
    timers: Timers<ReflexTimer>,
    rng: StdRng,
    running: bool,
}

impl Default for ReflexGame {
    fn default() -> Self {
        Self::new()
    }
}

impl ReflexGame {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            state: ReflexState::Idle,
            samples: Vec::new(),
            best_ms: None,
            last_ms: None,
            ready_at: None,
            early_presses: 0,
            go_green: None,
            timers: Timers::new(),
            rng,
            running: false,
        }
    }

    pub fn state(&self) -> ReflexState {
        self.state
    }

    pub fn samples(&self) -> &[u32] {
        &self.samples
    }

    pub fn best_ms(&self) -> Option<u32> {
        self.best_ms
    }

    pub fn last_ms(&self) -> Option<u32> {
        self.last_ms
    }

    pub fn average_ms(&self) -> Option<f64> {
        let samples: Vec<f64> = self.samples.iter().map(|&s| s as f64).collect();
        mean(&samples)
    }

    pub fn early_presses(&self) -> u32 {
        self.early_presses
    }

    pub fn ready_at(&self) -> Option<Instant> {
        self.ready_at
    }

    /// The single trigger action (Space)
    pub fn act(&mut self, now: Instant) {
        if !self.running {
            return;
        }
        match self.state {
            ReflexState::Idle | ReflexState::Result | ReflexState::TooEarly => {
                self.start_waiting(now)
            }
            ReflexState::Waiting => self.too_early(),
            ReflexState::Ready => self.record(now),
        }
    }

    fn start_waiting(&mut self, now: Instant) {
        self.state = ReflexState::Waiting;
        self.ready_at = None;
        let delay = Duration::from_millis(self.rng.gen_range(READY_DELAY_MS));
        self.go_green = Some(self.timers.schedule_after(now, delay, ReflexTimer::GoGreen));
    }

    fn too_early(&mut self) {
        if let Some(id) = self.go_green.take() {
            self.timers.cancel(id);
        }
        self.early_presses += 1;
        self.state = ReflexState::TooEarly;
    }

    fn go_green(&mut self, now: Instant) {
        self.go_green = None;
        self.state = ReflexState::Ready;
        self.ready_at = Some(now);
    }

    fn record(&mut self, now: Instant) {
        let Some(ready_at) = self.ready_at else {
            return;
        };
        let elapsed = now.saturating_duration_since(ready_at);
        let ms = round_u32(elapsed.as_secs_f64() * 1000.0);

        self.samples.push(ms);
        self.best_ms = Some(self.best_ms.map_or(ms, |best| best.min(ms)));
        self.last_ms = Some(ms);
        self.state = ReflexState::Result;
    }
}

impl GameModule for ReflexGame {
    fn id(&self) -> GameId {
        GameId::Reflex
    }

    fn start(&mut self, _now: Instant) {
        self.timers.cancel_all();
        self.state = ReflexState::Idle;
        self.samples.clear();
        self.best_ms = None;
        self.last_ms = None;
        self.ready_at = None;
        self.early_presses = 0;
        self.go_green = None;
        self.running = true;
    }

    fn stop(&mut self, _now: Instant) -> Option<SessionResult> {
        if !self.running {
            return None;
        }
        self.running = false;
        self.timers.cancel_all();
        self.go_green = None;

        Some(SessionResult::Reflex(ReflexResult {
            best_latency_ms: self.best_ms.unwrap_or(0),
            avg_latency_ms: self.average_ms().map_or(0, round_u32),
            attempts: self.samples.len() as u32,
        }))
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if key.code == KeyCode::Char(' ') {
            self.act(now);
        }
    }

    fn advance(&mut self, now: Instant) {
        if !self.running {
            return;
        }
        while let Some(timer) = self.timers.pop_due(now) {
            match timer {
                ReflexTimer::GoGreen => self.go_green(now),
            }
        }
    }

    fn render(&self, area: Rect, buf: &mut Buffer) {
        crate::ui::games::render_reflex(self, area, buf);
    }
}
