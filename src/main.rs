use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use microtaskrr::{
    app::App,
    config::{Config, ConfigStore, FileConfigStore, Overrides},
    controller::SessionController,
    corpus::Corpus,
    display::OverlaySurface,
    focus::CommandFocusRestorer,
    games::{GameId, GameRegistry},
    logging,
    persistence::{FileStatsStore, MemoryStatsStore, StatsStore},
    runtime::{
        spawn_terminal_reader, ChannelEventSource, FixedTicker, OverlayEventSource, Runner, Ticker,
    },
    trigger::{self, TriggerCommand, TriggerListener},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    sync::{mpsc, Arc},
    time::{Duration, Instant},
};

/// tiny terminal micro-games to play while a long-running task finishes
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Runs a terminal overlay that shows a random micro-game whenever a `show` trigger arrives and records your stats when it is dismissed. Run without a subcommand to start the overlay; the subcommands send triggers to a running overlay."
)]
struct Cli {
    #[clap(subcommand)]
    command: Option<TriggerCli>,

    /// games to choose from, comma separated
    #[clap(short = 'g', long, value_enum, value_delimiter = ',')]
    games: Option<Vec<GameId>>,

    /// address the overlay listens on for triggers
    #[clap(long)]
    trigger_addr: Option<String>,

    /// keep stats in memory only
    #[clap(long)]
    no_persist: bool,

    /// milliseconds between render frames
    #[clap(long = "frame-ms")]
    frame_ms: Option<u64>,

    /// start with a game on screen
    #[clap(long)]
    show: bool,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum TriggerCli {
    /// show a game in the running overlay
    Show,
    /// dismiss the current game
    Hide,
    /// ignore show triggers for a while
    Sleep {
        /// minutes to stay asleep
        minutes: u32,
    },
    /// accept show triggers again
    Wake,
}

impl From<TriggerCli> for TriggerCommand {
    fn from(cmd: TriggerCli) -> Self {
        match cmd {
            TriggerCli::Show => TriggerCommand::Show,
            TriggerCli::Hide => TriggerCommand::Hide,
            TriggerCli::Sleep { minutes } => TriggerCommand::Sleep(minutes),
            TriggerCli::Wake => TriggerCommand::Wake,
        }
    }
}

impl Cli {
    fn config(&self) -> Config {
        FileConfigStore::new().load().with_overrides(&self.overrides())
    }

    fn overrides(&self) -> Overrides {
        Overrides {
            games: self.games.clone(),
            trigger_addr: self.trigger_addr.clone(),
            frame_interval_ms: self.frame_ms,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(cmd) = cli.command {
        let config = cli.config();
        let cmd = TriggerCommand::from(cmd);
        if let Err(e) = trigger::send(&config.trigger_addr, cmd) {
            let mut clap_cmd = Cli::command();
            clap_cmd
                .error(
                    ErrorKind::Io,
                    format!("no overlay listening on {}: {e}", config.trigger_addr),
                )
                .exit();
        }
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Err(e) = logging::init() {
        eprintln!("microtaskrr: file logging disabled: {e}");
    }
    let config = cli.config();

    let corpus = Corpus::builtin()?;
    let registry = GameRegistry::standard(&config.games, &corpus)?;
    let store: Arc<dyn StatsStore> = if cli.no_persist {
        Arc::new(MemoryStatsStore::new())
    } else {
        Arc::new(FileStatsStore::new())
    };
    let controller = SessionController::new(
        registry,
        store,
        OverlaySurface::new(),
        CommandFocusRestorer::new(config.focus_command.clone()),
    )?;
    let mut app = App::new(controller);

    let (tx, rx) = mpsc::channel();
    let _listener = match TriggerListener::bind(&config.trigger_addr, tx.clone()) {
        Ok(listener) => Some(listener),
        Err(e) => {
            tracing::warn!(addr = %config.trigger_addr, error = %e, "Triggers disabled");
            None
        }
    };

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    spawn_terminal_reader(tx);
    let runner = Runner::new(
        ChannelEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(config.frame_interval_ms)),
    );

    if cli.show {
        app.controller.on_show(Instant::now());
    }
    let outcome = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    app.controller.shutdown();
    tracing::info!("microtaskrr exiting");
    outcome
}

fn start_tui<B: Backend, E: OverlayEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    while !app.should_quit {
        let ev = runner.step();
        app.handle_event(ev, Instant::now());
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;
    }

    Ok(())
}
