use crate::app_dirs::AppDirs;
use crate::games::GameId;
use crate::trigger::DEFAULT_TRIGGER_ADDR;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Games eligible for selection
    pub games: Vec<GameId>,
    pub frame_interval_ms: u64,
    pub trigger_addr: String,
    /// argv run after every hide to hand focus back, e.g. `["wmctrl", "-a", "Terminal"]`
    pub focus_command: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            games: GameId::CORE.to_vec(),
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            trigger_addr: DEFAULT_TRIGGER_ADDR.to_string(),
            focus_command: None,
        }
    }
}

impl Config {
    /// Applies command-line overrides on top of the stored config
    pub fn with_overrides(mut self, o: &Overrides) -> Self {
        if let Some(games) = &o.games {
            self.games = games.clone();
        }
        if let Some(addr) = &o.trigger_addr {
            self.trigger_addr = addr.clone();
        }
        if let Some(ms) = o.frame_interval_ms {
            self.frame_interval_ms = ms;
        }
        self.normalized()
    }

    /// Drops duplicate games and clamps the frame interval; an empty game list
    /// falls back to the defaults
    pub fn normalized(mut self) -> Self {
        let mut seen = Vec::with_capacity(self.games.len());
        self.games.retain(|id| {
            if seen.contains(id) {
                false
            } else {
                seen.push(*id);
                true
            }
        });
        if self.games.is_empty() {
            tracing::warn!("No games configured, using defaults");
            self.games = GameId::CORE.to_vec();
        }
        self.frame_interval_ms = self.frame_interval_ms.clamp(1, 1000);
        self
    }
}

/// Values given on the command line; `None` keeps the stored setting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub games: Option<Vec<GameId>>,
    pub trigger_addr: Option<String>,
    pub frame_interval_ms: Option<u64>,
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path =
            AppDirs::config_path().unwrap_or_else(|| PathBuf::from("microtaskrr_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(_) => return Config::default(),
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg.normalized(),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Invalid config, using defaults"
                );
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
