use crate::error::{Error, Result};
use crate::games::{
    ArithmeticResult, GameId, MemoryResult, ReflexResult, SessionResult, SnakeResult,
    StroopResult, TypingResult,
};
use crate::persistence::StatsStore;
use crate::util::{round_u32, weighted_mean};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReflexStats {
    pub attempts: u32,
    pub best_ms: Option<u32>,
    pub avg_ms: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArithmeticStats {
    pub total_problems: u32,
    pub correct: u32,
    pub best_streak: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnakeStats {
    pub games_played: u32,
    pub high_score: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypingStats {
    pub total_tests: u32,
    pub best_wpm: u32,
    pub avg_wpm: u32,
    pub avg_accuracy: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryStats {
    pub games_played: u32,
    pub best_level: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StroopStats {
    pub total_rounds: u32,
    pub correct: u32,
    pub best_streak: u32,
}

/// Lifetime aggregates for every game, persisted as one JSON object keyed by game id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsAggregate {
    pub reflex: ReflexStats,
    pub arithmetic: ArithmeticStats,
    pub snake: SnakeStats,
    pub typing: TypingStats,
    pub memory: MemoryStats,
    pub stroop: StroopStats,
}

impl StatsAggregate {
    /// Parses a persisted blob one game at a time.
    ///
    /// A record that is missing or malformed falls back to its default without
    /// affecting the others. Anything that is not a JSON object is an error.
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        let Value::Object(map) = value else {
            return Err(Error::MalformedStats);
        };

        Ok(Self {
            reflex: record_or_default(&map, GameId::Reflex),
            arithmetic: record_or_default(&map, GameId::Arithmetic),
            snake: record_or_default(&map, GameId::Snake),
            typing: record_or_default(&map, GameId::Typing),
            memory: record_or_default(&map, GameId::Memory),
            stroop: record_or_default(&map, GameId::Stroop),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

fn record_or_default<T: DeserializeOwned + Default>(map: &Map<String, Value>, id: GameId) -> T {
    let key = id.to_string();
    match map.get(&key) {
        None => T::default(),
        Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            tracing::warn!(game = %key, error = %e, "Discarding malformed stats record");
            T::default()
        }),
    }
}

/// In-memory statistics, loaded once from a [`StatsStore`] and folded per session
#[derive(Debug, Default)]
pub struct Stats {
    aggregate: StatsAggregate,
    loaded: bool,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aggregate(&self) -> &StatsAggregate {
        &self.aggregate
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Loads persisted aggregates on the first call only.
    ///
    /// Any failure leaves the defaults in place; the attempt still counts as loaded.
    pub fn load(&mut self, store: &dyn StatsStore) {
        if self.loaded {
            return;
        }
        self.loaded = true;

        match store.load() {
            Ok(Some(raw)) => match StatsAggregate::from_json(&raw) {
                Ok(aggregate) => self.aggregate = aggregate,
                Err(e) => tracing::warn!(error = %e, "Stats blob unreadable, using defaults"),
            },
            Ok(None) => tracing::debug!("No persisted stats yet"),
            Err(e) => tracing::warn!(error = %e, "Failed to load stats, using defaults"),
        }
    }

    /// Folds one finished session into the aggregate for `id`
    pub fn record(&mut self, id: GameId, result: SessionResult) {
        if result.game_id() != id {
            tracing::warn!(%id, result = ?result, "Ignoring result recorded for another game");
            return;
        }

        match result {
            SessionResult::Reflex(r) => fold_reflex(&mut self.aggregate.reflex, r),
            SessionResult::Arithmetic(r) => fold_arithmetic(&mut self.aggregate.arithmetic, r),
            SessionResult::Snake(r) => fold_snake(&mut self.aggregate.snake, r),
            SessionResult::Typing(r) => fold_typing(&mut self.aggregate.typing, r),
            SessionResult::Memory(r) => fold_memory(&mut self.aggregate.memory, r),
            SessionResult::Stroop(r) => fold_stroop(&mut self.aggregate.stroop, r),
        }
    }

    /// One-line summary shown next to a game's label
    pub fn summary(&self, id: GameId) -> String {
        let a = &self.aggregate;
        match id {
            GameId::Reflex => format!(
                "Best: {}ms | Avg: {}ms | Tries: {}",
                or_dash(a.reflex.best_ms),
                or_dash(a.reflex.avg_ms),
                a.reflex.attempts
            ),
            GameId::Arithmetic => format!(
                "Correct: {}/{} | Best streak: {}",
                a.arithmetic.correct, a.arithmetic.total_problems, a.arithmetic.best_streak
            ),
            GameId::Snake => format!(
                "High score: {} | Games: {}",
                a.snake.high_score, a.snake.games_played
            ),
            GameId::Typing => format!(
                "Best: {} WPM | Avg: {} WPM | Acc: {}% | Tests: {}",
                a.typing.best_wpm, a.typing.avg_wpm, a.typing.avg_accuracy, a.typing.total_tests
            ),
            GameId::Memory => format!(
                "Best level: {} | Games: {}",
                a.memory.best_level, a.memory.games_played
            ),
            GameId::Stroop => format!(
                "Correct: {}/{} | Best streak: {}",
                a.stroop.correct, a.stroop.total_rounds, a.stroop.best_streak
            ),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        self.aggregate.to_json()
    }
}

fn or_dash(value: Option<u32>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// One try per session that produced a time; the average is over session bests
fn fold_reflex(s: &mut ReflexStats, r: ReflexResult) {
    let ms = r.best_latency_ms;
    if r.attempts == 0 || ms == 0 {
        return;
    }
    let prev = s.attempts as u64;
    s.attempts = s.attempts.saturating_add(1);
    s.best_ms = Some(s.best_ms.map_or(ms, |b| b.min(ms)));
    s.avg_ms = Some(match s.avg_ms {
        None => ms,
        Some(avg) => round_u32(weighted_mean(avg as f64, prev, ms as f64, 1)),
    });
}

fn fold_arithmetic(s: &mut ArithmeticStats, r: ArithmeticResult) {
    s.total_problems = s.total_problems.saturating_add(r.total);
    s.correct = s.correct.saturating_add(r.correct);
    s.best_streak = s.best_streak.max(r.best_streak);
}

fn fold_snake(s: &mut SnakeStats, r: SnakeResult) {
    s.games_played = s.games_played.saturating_add(1);
    s.high_score = s.high_score.max(r.session_best.max(r.score));
}

fn fold_typing(s: &mut TypingStats, r: TypingResult) {
    let prev = s.total_tests as u64;
    s.total_tests = s.total_tests.saturating_add(1);
    s.best_wpm = s.best_wpm.max(r.words_per_minute);
    s.avg_wpm = round_u32(weighted_mean(
        s.avg_wpm as f64,
        prev,
        r.words_per_minute as f64,
        1,
    ));
    s.avg_accuracy = round_u32(weighted_mean(
        s.avg_accuracy as f64,
        prev,
        r.accuracy_percent as f64,
        1,
    ));
}

fn fold_memory(s: &mut MemoryStats, r: MemoryResult) {
    s.games_played = s.games_played.saturating_add(1);
    s.best_level = s.best_level.max(r.best_level.max(r.level));
}

fn fold_stroop(s: &mut StroopStats, r: StroopResult) {
    s.total_rounds = s.total_rounds.saturating_add(r.total);
    s.correct = s.correct.saturating_add(r.correct);
    s.best_streak = s.best_streak.max(r.best_streak);
}
