use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

use crate::trigger::TriggerCommand;

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum OverlayEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    Trigger(TriggerCommand),
}

/// Source of overlay events (keyboard, resize, triggers)
pub trait OverlayEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<OverlayEvent, RecvTimeoutError>;
}

/// Event source fed through an mpsc channel; producers are the terminal reader,
/// the trigger listener, or a test
pub struct ChannelEventSource {
    rx: Receiver<OverlayEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<OverlayEvent>) -> Self {
        Self { rx }
    }
}

impl OverlayEventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<OverlayEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Forwards crossterm key presses and resizes into `tx` until the channel closes
pub fn spawn_terminal_reader(tx: Sender<OverlayEvent>) -> JoinHandle<()> {
    thread::spawn(move || loop {
        let ev = match event::read() {
            Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => OverlayEvent::Key(key),
            Ok(CtEvent::Resize(_, _)) => OverlayEvent::Resize,
            Ok(_) => continue,
            Err(e) => {
                tracing::error!(error = %e, "Terminal input failed");
                break;
            }
        };
        if tx.send(ev).is_err() {
            break;
        }
    })
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker; one tick per render frame
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: OverlayEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: OverlayEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout.
    ///
    /// Once every producer is gone the interval is slept out so frames keep
    /// their pace instead of spinning.
    pub fn step(&self) -> OverlayEvent {
        let interval = self.ticker.interval();
        match self.event_source.recv_timeout(interval) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => OverlayEvent::Tick,
            Err(RecvTimeoutError::Disconnected) => {
                thread::sleep(interval);
                OverlayEvent::Tick
            }
        }
    }
}
