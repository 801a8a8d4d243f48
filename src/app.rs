use crate::controller::SessionController;
use crate::display::OverlaySurface;
use crate::focus::CommandFocusRestorer;
use crate::runtime::OverlayEvent;
use crate::trigger::{SleepGate, TriggerCommand};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Instant;

pub type OverlayController = SessionController<OverlaySurface, CommandFocusRestorer>;

/// Top-level overlay state driven by the event loop
pub struct App {
    pub controller: OverlayController,
    pub sleep: SleepGate,
    pub should_quit: bool,
}

impl App {
    pub fn new(controller: OverlayController) -> Self {
        Self {
            controller,
            sleep: SleepGate::new(),
            should_quit: false,
        }
    }

    pub fn handle_event(&mut self, ev: OverlayEvent, now: Instant) {
        match ev {
            OverlayEvent::Key(key) => self.handle_key(key, now),
            OverlayEvent::Trigger(cmd) => self.handle_trigger(cmd, now),
            OverlayEvent::Resize | OverlayEvent::Tick => {}
        }
        self.controller.advance(now);
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit(now);
            return;
        }

        if key.code == KeyCode::Esc {
            self.controller.on_hide(now);
            return;
        }

        if self.controller.active_game().is_some() {
            self.controller.handle_key(key, now);
            return;
        }

        match key.code {
            KeyCode::Char('s') | KeyCode::Enter => {
                self.controller.on_show(now);
            }
            KeyCode::Char('q') => self.quit(now),
            _ => {}
        }
    }

    fn handle_trigger(&mut self, cmd: TriggerCommand, now: Instant) {
        match cmd {
            TriggerCommand::Show => {
                if self.sleep.is_asleep(now) {
                    tracing::debug!("Show trigger ignored while asleep");
                } else {
                    self.controller.on_show(now);
                }
            }
            TriggerCommand::Hide => {
                self.controller.on_hide(now);
            }
            TriggerCommand::Sleep(minutes) => {
                self.sleep.sleep(minutes, now);
                tracing::info!(minutes, "Show triggers paused");
            }
            TriggerCommand::Wake => {
                self.sleep.wake();
                tracing::info!("Show triggers resumed");
            }
        }
    }

    /// Ends any running game so its result is recorded, then asks the loop to exit
    pub fn quit(&mut self, now: Instant) {
        if self.controller.active_game().is_some() {
            self.controller.on_hide(now);
        }
        self.should_quit = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::{GameId, GameRegistry, ReflexGame};
    use crate::persistence::MemoryStatsStore;
    use std::sync::Arc;
    use std::time::Duration;

    fn app() -> App {
        let registry = GameRegistry::new(vec![
            Box::new(ReflexGame::new()) as Box<dyn crate::games::GameModule>
        ])
        .unwrap();
        let controller = SessionController::new(
            registry,
            Arc::new(MemoryStatsStore::new()),
            OverlaySurface::new(),
            CommandFocusRestorer::default(),
        )
        .unwrap();
        App::new(controller)
    }

    fn key(code: KeyCode) -> OverlayEvent {
        OverlayEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn keys_show_and_dismiss() {
        let mut app = app();
        let now = Instant::now();

        app.handle_event(key(KeyCode::Char('s')), now);
        assert_eq!(app.controller.active_game(), Some(GameId::Reflex));

        // 'q' now belongs to the game
        app.handle_event(key(KeyCode::Char('q')), now);
        assert!(!app.should_quit);

        app.handle_event(key(KeyCode::Esc), now);
        assert_eq!(app.controller.active_game(), None);

        app.handle_event(key(KeyCode::Char('q')), now);
        assert!(app.should_quit);
    }

    #[test]
    fn sleep_blocks_show_triggers_until_wake() {
        let mut app = app();
        let now = Instant::now();

        app.handle_event(OverlayEvent::Trigger(TriggerCommand::Sleep(1)), now);
        app.handle_event(OverlayEvent::Trigger(TriggerCommand::Show), now);
        assert_eq!(app.controller.active_game(), None);

        let later = now + Duration::from_secs(61);
        app.handle_event(OverlayEvent::Trigger(TriggerCommand::Show), later);
        assert_eq!(app.controller.active_game(), Some(GameId::Reflex));

        app.handle_event(OverlayEvent::Trigger(TriggerCommand::Hide), later);
        app.handle_event(OverlayEvent::Trigger(TriggerCommand::Sleep(5)), later);
        app.handle_event(OverlayEvent::Trigger(TriggerCommand::Wake), later);
        app.handle_event(OverlayEvent::Trigger(TriggerCommand::Show), later);
        assert_eq!(app.controller.active_game(), Some(GameId::Reflex));
    }

    #[test]
    fn ctrl_c_quits_and_records_running_game() {
        let mut app = app();
        let now = Instant::now();
        app.handle_event(OverlayEvent::Trigger(TriggerCommand::Show), now);
        app.handle_event(
            OverlayEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            now,
        );
        assert!(app.should_quit);
        assert_eq!(app.controller.active_game(), None);
    }
}
