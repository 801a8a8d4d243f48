//! Show/hide triggers from outside the overlay process.
//!
//! The overlay listens on a loopback TCP port; each line received is one
//! command. The same binary's `show`/`hide`/`sleep`/`wake` subcommands are the
//! clients.

use crate::error::{Error, Result};
use crate::runtime::OverlayEvent;
use chrono::{DateTime, Local};
use std::fmt;
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

pub const DEFAULT_TRIGGER_ADDR: &str = "127.0.0.1:47615";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// A client that sends nothing for this long is dropped
const IDLE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerCommand {
    Show,
    Hide,
    /// Ignore show triggers for this many minutes
    Sleep(u32),
    Wake,
}

impl FromStr for TriggerCommand {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            return Err(Error::UnknownTrigger(line.to_string()));
        };

        let cmd = match verb.to_ascii_lowercase().as_str() {
            "show" => TriggerCommand::Show,
            "hide" => TriggerCommand::Hide,
            "wake" => TriggerCommand::Wake,
            "sleep" => {
                let minutes = parts.next().ok_or_else(|| {
                    Error::TriggerArgument("sleep needs a number of minutes".into())
                })?;
                let minutes: u32 = minutes.parse().map_err(|_| {
                    Error::TriggerArgument(format!("not a minute count: {minutes}"))
                })?;
                if minutes == 0 {
                    return Err(Error::TriggerArgument("sleep needs at least one minute".into()));
                }
                TriggerCommand::Sleep(minutes)
            }
            _ => return Err(Error::UnknownTrigger(line.to_string())),
        };

        if parts.next().is_some() {
            return Err(Error::TriggerArgument(format!("trailing input in {line:?}")));
        }
        Ok(cmd)
    }
}

impl fmt::Display for TriggerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerCommand::Show => write!(f, "show"),
            TriggerCommand::Hide => write!(f, "hide"),
            TriggerCommand::Sleep(minutes) => write!(f, "sleep {minutes}"),
            TriggerCommand::Wake => write!(f, "wake"),
        }
    }
}

/// Accepts trigger connections on a background thread and forwards parsed
/// commands into the event channel.
///
/// Each connection is read on its own thread, so a client that stalls cannot
/// hold up the others.
pub struct TriggerListener {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TriggerListener {
    pub fn bind<A: ToSocketAddrs>(addr: A, tx: Sender<OverlayEvent>) -> Result<Self> {
        let listener = TcpListener::bind(addr)?;
        let addr = listener.local_addr()?;
        tracing::info!(%addr, "Listening for triggers");

        let handle = thread::Builder::new()
            .name("trigger-listener".into())
            .spawn(move || {
                let closed = Arc::new(AtomicBool::new(false));
                for stream in listener.incoming() {
                    if closed.load(Ordering::Relaxed) {
                        break;
                    }
                    match stream {
                        Ok(stream) => {
                            let tx = tx.clone();
                            let closed = closed.clone();
                            let spawned = thread::Builder::new()
                                .name("trigger-connection".into())
                                .spawn(move || {
                                    if !forward_commands(stream, &tx) {
                                        closed.store(true, Ordering::Relaxed);
                                    }
                                });
                            if let Err(e) = spawned {
                                tracing::warn!(error = %e, "Could not spawn trigger reader");
                            }
                        }
                        Err(e) => tracing::warn!(error = %e, "Trigger connection failed"),
                    }
                }
            })?;

        Ok(Self { addr, handle })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Returns false once the event channel is closed
fn forward_commands(stream: TcpStream, tx: &Sender<OverlayEvent>) -> bool {
    let peer = stream.peer_addr().ok();
    if let Err(e) = stream.set_read_timeout(Some(IDLE_TIMEOUT)) {
        tracing::warn!(?peer, error = %e, "Could not set trigger read timeout");
    }
    for line in BufReader::new(stream).lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::debug!(?peer, error = %e, "Trigger stream ended");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<TriggerCommand>() {
            Ok(cmd) => {
                tracing::debug!(?peer, %cmd, "Trigger received");
                if tx.send(OverlayEvent::Trigger(cmd)).is_err() {
                    return false;
                }
            }
            Err(e) => tracing::warn!(?peer, error = %e, "Ignoring bad trigger"),
        }
    }
    true
}

/// Sends one command to a running overlay
pub fn send<A: ToSocketAddrs>(addr: A, cmd: TriggerCommand) -> Result<()> {
    let addr = addr
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| Error::Config {
            message: "trigger address did not resolve".into(),
        })?;
    let mut stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)?;
    writeln!(stream, "{cmd}")?;
    stream.flush()?;
    Ok(())
}

/// Suppresses show triggers until a deadline passes
#[derive(Debug, Clone, Copy, Default)]
pub struct SleepGate {
    until: Option<Instant>,
    wake_at: Option<DateTime<Local>>,
}

impl SleepGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sleep(&mut self, minutes: u32, now: Instant) {
        let span = Duration::from_secs(u64::from(minutes) * 60);
        self.until = Some(now + span);
        self.wake_at = chrono::Duration::from_std(span)
            .ok()
            .map(|d| Local::now() + d);
    }

    pub fn wake(&mut self) {
        self.until = None;
        self.wake_at = None;
    }

    pub fn is_asleep(&self, now: Instant) -> bool {
        self.until.is_some_and(|until| now < until)
    }

    /// Wall-clock wake time for display while asleep
    pub fn wake_at(&self, now: Instant) -> Option<DateTime<Local>> {
        if self.is_asleep(now) {
            self.wake_at
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::mpsc;

    #[test]
    fn parses_commands() {
        assert_eq!("show".parse::<TriggerCommand>().unwrap(), TriggerCommand::Show);
        assert_eq!(" HIDE ".parse::<TriggerCommand>().unwrap(), TriggerCommand::Hide);
        assert_eq!(
            "sleep 15".parse::<TriggerCommand>().unwrap(),
            TriggerCommand::Sleep(15)
        );
        assert_eq!("wake".parse::<TriggerCommand>().unwrap(), TriggerCommand::Wake);
    }

    #[test]
    fn rejects_bad_commands() {
        assert_matches!("dance".parse::<TriggerCommand>(), Err(Error::UnknownTrigger(_)));
        assert_matches!("".parse::<TriggerCommand>(), Err(Error::UnknownTrigger(_)));
        assert_matches!("sleep".parse::<TriggerCommand>(), Err(Error::TriggerArgument(_)));
        assert_matches!("sleep soon".parse::<TriggerCommand>(), Err(Error::TriggerArgument(_)));
        assert_matches!("sleep 0".parse::<TriggerCommand>(), Err(Error::TriggerArgument(_)));
        assert_matches!("show now".parse::<TriggerCommand>(), Err(Error::TriggerArgument(_)));
    }

    #[test]
    fn display_parses_back() {
        for cmd in [
            TriggerCommand::Show,
            TriggerCommand::Hide,
            TriggerCommand::Sleep(30),
            TriggerCommand::Wake,
        ] {
            assert_eq!(cmd.to_string().parse::<TriggerCommand>().unwrap(), cmd);
        }
    }

    #[test]
    fn listener_forwards_commands() {
        let (tx, rx) = mpsc::channel();
        let listener = TriggerListener::bind("127.0.0.1:0", tx).unwrap();

        send(listener.local_addr(), TriggerCommand::Show).unwrap();
        send(listener.local_addr(), TriggerCommand::Sleep(5)).unwrap();

        // separate connections, so arrival order is not fixed
        let timeout = Duration::from_secs(5);
        let mut received: Vec<TriggerCommand> = (0..2)
            .filter_map(|_| match rx.recv_timeout(timeout) {
                Ok(OverlayEvent::Trigger(cmd)) => Some(cmd),
                _ => None,
            })
            .collect();
        received.sort_by_key(|cmd| cmd.to_string());
        assert_eq!(received, vec![TriggerCommand::Show, TriggerCommand::Sleep(5)]);
    }

    #[test]
    fn listener_skips_garbage_lines() {
        let (tx, rx) = mpsc::channel();
        let listener = TriggerListener::bind("127.0.0.1:0", tx).unwrap();

        let mut stream = TcpStream::connect(listener.local_addr()).unwrap();
        stream.write_all(b"bogus\n\nhide\n").unwrap();
        drop(stream);

        assert_matches!(
            rx.recv_timeout(Duration::from_secs(5)),
            Ok(OverlayEvent::Trigger(TriggerCommand::Hide))
        );
    }

    #[test]
    fn idle_client_does_not_block_others() {
        let (tx, rx) = mpsc::channel();
        let listener = TriggerListener::bind("127.0.0.1:0", tx).unwrap();

        let mut idle = TcpStream::connect(listener.local_addr()).unwrap();
        idle.write_all(b"sho").unwrap();
        send(listener.local_addr(), TriggerCommand::Hide).unwrap();

        assert_matches!(
            rx.recv_timeout(Duration::from_secs(3)),
            Ok(OverlayEvent::Trigger(TriggerCommand::Hide))
        );
        drop(idle);
    }

    #[test]
    fn sleep_gate_expires() {
        let mut gate = SleepGate::new();
        let t0 = Instant::now();
        assert!(!gate.is_asleep(t0));

        gate.sleep(2, t0);
        assert!(gate.is_asleep(t0 + Duration::from_secs(119)));
        assert!(gate.wake_at(t0).is_some());
        assert!(!gate.is_asleep(t0 + Duration::from_secs(120)));
        assert!(gate.wake_at(t0 + Duration::from_secs(120)).is_none());

        gate.sleep(10, t0);
        gate.wake();
        assert!(!gate.is_asleep(t0));
    }
}
