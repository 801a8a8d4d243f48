use crate::app_dirs::AppDirs;
use crate::error::Result;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// Opaque storage for the serialized stats blob
pub trait StatsStore: Send + Sync {
    /// `Ok(None)` when nothing has been saved yet
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, json: &str) -> Result<()>;
}

/// JSON file under the state directory
#[derive(Debug, Clone)]
pub struct FileStatsStore {
    path: PathBuf,
}

impl FileStatsStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::stats_path().unwrap_or_else(|| PathBuf::from("microtaskrr_stats.json"));
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

impl Default for FileStatsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsStore for FileStatsStore {
    fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, json: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        // write-then-rename so a crash never leaves a half-written blob
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Keeps the blob in memory; nothing survives the process
#[derive(Debug, Default)]
pub struct MemoryStatsStore {
    contents: Mutex<Option<String>>,
}

impl MemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(json: &str) -> Self {
        Self {
            contents: Mutex::new(Some(json.to_string())),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.contents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl StatsStore for MemoryStatsStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.contents())
    }

    fn save(&self, json: &str) -> Result<()> {
        *self
            .contents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(json.to_string());
        Ok(())
    }
}

/// Background thread that writes stats blobs in the order they were queued.
///
/// Saves never block the caller and failures are only logged.
#[derive(Debug)]
pub struct SaveWorker {
    tx: Option<Sender<String>>,
    handle: Option<JoinHandle<()>>,
}

impl SaveWorker {
    pub fn spawn(store: Arc<dyn StatsStore>) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<String>();
        let handle = thread::Builder::new()
            .name("stats-save".into())
            .spawn(move || {
                for json in rx {
                    match store.save(&json) {
                        Ok(()) => tracing::debug!(bytes = json.len(), "Stats saved"),
                        Err(e) => tracing::warn!(error = %e, "Failed to save stats"),
                    }
                }
            })?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    pub fn enqueue(&self, json: String) {
        match &self.tx {
            Some(tx) => {
                if tx.send(json).is_err() {
                    tracing::warn!("Stats save worker is gone, dropping save");
                }
            }
            None => tracing::debug!("Save requested after shutdown, ignoring"),
        }
    }

    /// Drains queued saves and joins the thread. Idempotent.
    pub fn shutdown(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Stats save worker panicked");
            }
        }
    }
}

impl Drop for SaveWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
