pub mod arithmetic;
pub mod memory;
pub mod reflex;
pub mod snake;
pub mod stroop;
pub mod typing;

pub use arithmetic::ArithmeticGame;
pub use memory::MemoryGame;
pub use reflex::ReflexGame;
pub use snake::SnakeGame;
pub use stroop::StroopGame;
pub use typing::TypingGame;

use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crossterm::event::KeyEvent;
use ratatui::{buffer::Buffer, layout::Rect};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

/// Stable identifier of a game variant
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameId {
    Reflex,
    Arithmetic,
    Snake,
    Typing,
    Memory,
    Stroop,
}

impl GameId {
    /// Games registered when nothing else is configured
    pub const CORE: [GameId; 4] = [
        GameId::Reflex,
        GameId::Arithmetic,
        GameId::Snake,
        GameId::Typing,
    ];

    pub const ALL: [GameId; 6] = [
        GameId::Reflex,
        GameId::Arithmetic,
        GameId::Snake,
        GameId::Typing,
        GameId::Memory,
        GameId::Stroop,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            GameId::Reflex => "Reaction",
            GameId::Arithmetic => "Math",
            GameId::Snake => "Snake",
            GameId::Typing => "Typing Test",
            GameId::Memory => "Memory",
            GameId::Stroop => "Stroop",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReflexResult {
    pub best_latency_ms: u32,
    pub avg_latency_ms: u32,
    pub attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArithmeticResult {
    pub correct: u32,
    pub total: u32,
    pub best_streak: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnakeResult {
    /// Score of the run in progress when the session stopped
    pub score: u32,
    /// Best run score seen during the session, including the current run
    pub session_best: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypingResult {
    pub words_per_minute: u32,
    pub accuracy_percent: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryResult {
    pub level: u32,
    pub best_level: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StroopResult {
    pub correct: u32,
    pub total: u32,
    pub best_streak: u32,
}

/// Snapshot returned by [`GameModule::stop`], one shape per game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionResult {
    Reflex(ReflexResult),
    Arithmetic(ArithmeticResult),
    Snake(SnakeResult),
    Typing(TypingResult),
    Memory(MemoryResult),
    Stroop(StroopResult),
}

impl SessionResult {
    pub fn game_id(&self) -> GameId {
        match self {
            SessionResult::Reflex(_) => GameId::Reflex,
            SessionResult::Arithmetic(_) => GameId::Arithmetic,
            SessionResult::Snake(_) => GameId::Snake,
            SessionResult::Typing(_) => GameId::Typing,
            SessionResult::Memory(_) => GameId::Memory,
            SessionResult::Stroop(_) => GameId::Stroop,
        }
    }
}

/// Lifecycle contract shared by every game.
///
/// A module is built once and reused: `start` resets it to session-zero, `stop`
/// cancels its timers, stops accepting input and returns a snapshot. Time is always
/// handed in by the caller.
pub trait GameModule {
    fn id(&self) -> GameId;

    fn label(&self) -> &'static str {
        self.id().label()
    }

    fn start(&mut self, now: Instant);

    /// Returns `None` if no session was running
    fn stop(&mut self, now: Instant) -> Option<SessionResult>;

    fn is_running(&self) -> bool;

    /// Ignored while the module is not running
    fn handle_key(&mut self, key: KeyEvent, now: Instant);

    /// Fires due timers and, for frame-driven games, runs the frame callback
    fn advance(&mut self, now: Instant);

    fn render(&self, area: Rect, buf: &mut Buffer);
}

/// Game modules keyed by id; the only place that maps an id to a concrete type
pub struct GameRegistry {
    modules: BTreeMap<GameId, Box<dyn GameModule>>,
}

impl GameRegistry {
    pub fn new(modules: impl IntoIterator<Item = Box<dyn GameModule>>) -> Result<Self> {
        let modules: BTreeMap<_, _> = modules.into_iter().map(|m| (m.id(), m)).collect();
        if modules.is_empty() {
            return Err(Error::EmptyRegistry);
        }
        Ok(Self { modules })
    }

    /// Builds the built-in implementation for each id
    pub fn standard(ids: &[GameId], corpus: &Corpus) -> Result<Self> {
        Self::new(ids.iter().map(|id| build_module(*id, corpus)))
    }

    pub fn ids(&self) -> Vec<GameId> {
        self.modules.keys().copied().collect()
    }

    pub fn get(&self, id: GameId) -> Option<&dyn GameModule> {
        self.modules.get(&id).map(|m| m.as_ref())
    }

    pub fn get_mut(&mut self, id: GameId) -> Option<&mut dyn GameModule> {
        self.modules.get_mut(&id).map(|m| m.as_mut() as &mut dyn GameModule)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

fn build_module(id: GameId, corpus: &Corpus) -> Box<dyn GameModule> {
    match id {
        GameId::Reflex => Box::new(ReflexGame::new()),
        GameId::Arithmetic => Box::new(ArithmeticGame::new()),
        GameId::Snake => Box::new(SnakeGame::new()),
        GameId::Typing => Box::new(TypingGame::new(corpus.clone())),
        GameId::Memory => Box::new(MemoryGame::new()),
        GameId::Stroop => Box::new(StroopGame::new()),
    }
}
