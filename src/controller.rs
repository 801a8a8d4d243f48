use crate::display::DisplaySurface;
use crate::error::Result;
use crate::focus::FocusRestorer;
use crate::games::{GameId, GameModule, GameRegistry, SessionResult};
use crate::persistence::{SaveWorker, StatsStore};
use crate::selection;
use crate::stats::Stats;
use crossterm::event::KeyEvent;
use rand::{rngs::StdRng, SeedableRng};
use std::sync::Arc;
use std::time::Instant;

/// Which game is running now and which one ran last
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub active: Option<GameId>,
    pub last: Option<GameId>,
}

/// Owns the games and decides which one is running.
///
/// Every dismissal path ends in [`SessionController::on_hide`]; at most one game
/// is active at a time and each `start` is paired with exactly one `stop`.
pub struct SessionController<D: DisplaySurface, F: FocusRestorer> {
    registry: GameRegistry,
    stats: Stats,
    store: Arc<dyn StatsStore>,
    saver: SaveWorker,
    context: SessionContext,
    display: D,
    focus: F,
    rng: StdRng,
}

impl<D: DisplaySurface, F: FocusRestorer> SessionController<D, F> {
    pub fn new(
        registry: GameRegistry,
        store: Arc<dyn StatsStore>,
        display: D,
        focus: F,
    ) -> Result<Self> {
        let saver = SaveWorker::spawn(store.clone())?;
        Ok(Self {
            registry,
            stats: Stats::new(),
            store,
            saver,
            context: SessionContext::default(),
            display,
            focus,
            rng: StdRng::from_entropy(),
        })
    }

    /// Replaces the selection rng, for reproducible game order
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Starts a new game unless one is already running.
    ///
    /// Returns whether a session started.
    pub fn on_show(&mut self, now: Instant) -> bool {
        if let Some(active) = self.context.active {
            tracing::debug!(%active, "Show ignored, a game is already running");
            return false;
        }

        self.stats.load(self.store.as_ref());

        let ids = self.registry.ids();
        let Some(id) = selection::next(&ids, self.context.last, &mut self.rng) else {
            tracing::warn!("No game available to show");
            return false;
        };
        let Some(module) = self.registry.get_mut(id) else {
            return false;
        };

        module.start(now);
        let label = module.label();
        self.context.active = Some(id);
        self.context.last = Some(id);

        let summary = self.stats.summary(id);
        self.display.show_game(id, label, &summary);
        tracing::info!(game = %id, "Session started");
        true
    }

    /// Stops the running game, records and saves its result, then hands focus back.
    ///
    /// Safe to call at any time; focus is restored even when nothing was running.
    pub fn on_hide(&mut self, now: Instant) -> Option<SessionResult> {
        let result = match self.context.active.take() {
            Some(id) => self.finish(id, now),
            None => {
                tracing::debug!("Hide with no active game");
                None
            }
        };

        self.display.show_idle();
        self.focus.restore_focus();
        result
    }

    fn finish(&mut self, id: GameId, now: Instant) -> Option<SessionResult> {
        let result = self.registry.get_mut(id)?.stop(now)?;
        self.stats.record(id, result);
        tracing::info!(game = %id, ?result, "Session finished");

        match self.stats.to_json() {
            Ok(json) => self.saver.enqueue(json),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize stats"),
        }
        Some(result)
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if let Some(module) = self.active_module_mut() {
            module.handle_key(key, now);
        }
    }

    pub fn advance(&mut self, now: Instant) {
        if let Some(module) = self.active_module_mut() {
            module.advance(now);
        }
    }

    pub fn active_game(&self) -> Option<GameId> {
        self.context.active
    }

    pub fn active_module(&self) -> Option<&dyn GameModule> {
        self.registry.get(self.context.active?)
    }

    fn active_module_mut(&mut self) -> Option<&mut dyn GameModule> {
        let id = self.context.active?;
        self.registry.get_mut(id)
    }

    pub fn context(&self) -> SessionContext {
        self.context
    }

    pub fn registry(&self) -> &GameRegistry {
        &self.registry
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn focus(&self) -> &F {
        &self.focus
    }

    /// Flushes queued saves and stops the save worker
    pub fn shutdown(&mut self) {
        self.saver.shutdown();
    }
}
