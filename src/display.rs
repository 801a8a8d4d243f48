use crate::games::GameId;

/// Where the controller announces what is on screen
pub trait DisplaySurface {
    fn show_game(&mut self, id: GameId, label: &str, summary: &str);
    fn show_idle(&mut self);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Screen {
    #[default]
    Idle,
    Game {
        id: GameId,
        label: String,
        summary: String,
    },
}

/// Terminal overlay: remembers the header to draw on the next frame
#[derive(Debug, Default)]
pub struct OverlaySurface {
    screen: Screen,
    shown: u32,
}

impl OverlaySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Number of games shown since startup
    pub fn shown(&self) -> u32 {
        self.shown
    }
}

impl DisplaySurface for OverlaySurface {
    fn show_game(&mut self, id: GameId, label: &str, summary: &str) {
        self.shown += 1;
        self.screen = Screen::Game {
            id,
            label: label.to_string(),
            summary: summary.to_string(),
        };
    }

    fn show_idle(&mut self) {
        self.screen = Screen::Idle;
    }
}
