use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rand::{rngs::StdRng, SeedableRng};

use microtaskrr::app::App;
use microtaskrr::controller::SessionController;
use microtaskrr::display::{OverlaySurface, Screen};
use microtaskrr::focus::CommandFocusRestorer;
use microtaskrr::games::{ArithmeticGame, GameId, GameModule, GameRegistry, StroopGame};
use microtaskrr::persistence::MemoryStatsStore;
use microtaskrr::runtime::{ChannelEventSource, FixedTicker, OverlayEvent, Runner};
use microtaskrr::stats::StatsAggregate;
use microtaskrr::trigger::TriggerCommand;

fn key(code: KeyCode) -> OverlayEvent {
    OverlayEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn app_with(modules: Vec<Box<dyn GameModule>>, store: Arc<MemoryStatsStore>) -> App {
    let registry = GameRegistry::new(modules).unwrap();
    let controller = SessionController::new(
        registry,
        store,
        OverlaySurface::new(),
        CommandFocusRestorer::default(),
    )
    .unwrap();
    App::new(controller)
}

/// Drives the app until it quits or the step budget runs out
fn run<E, T>(app: &mut App, runner: &Runner<E, T>, max_steps: u32)
where
    E: microtaskrr::runtime::OverlayEventSource,
    T: microtaskrr::runtime::Ticker,
{
    for _ in 0..max_steps {
        let ev = runner.step();
        app.handle_event(ev, Instant::now());
        if app.should_quit {
            break;
        }
    }
}

// Headless flow through Runner/ChannelEventSource without a TTY:
// show trigger, one answer, dismiss, quit.
#[test]
fn headless_arithmetic_session_is_recorded() {
    let store = Arc::new(MemoryStatsStore::new());
    let mut app = app_with(
        vec![Box::new(ArithmeticGame::with_rng(StdRng::seed_from_u64(1)))],
        store.clone(),
    );

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        ChannelEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );

    tx.send(OverlayEvent::Trigger(TriggerCommand::Show)).unwrap();
    tx.send(key(KeyCode::Char('4'))).unwrap();
    tx.send(key(KeyCode::Char('2'))).unwrap();
    tx.send(key(KeyCode::Enter)).unwrap();
    tx.send(OverlayEvent::Tick).unwrap();
    tx.send(key(KeyCode::Esc)).unwrap();
    tx.send(key(KeyCode::Char('q'))).unwrap();

    run(&mut app, &runner, 100);

    assert!(app.should_quit, "app should have quit");
    assert_eq!(app.controller.active_game(), None);
    assert_eq!(app.controller.display().screen(), &Screen::Idle);
    assert_eq!(app.controller.stats().aggregate().arithmetic.total_problems, 1);

    app.controller.shutdown();
    let saved = StatsAggregate::from_json(&store.contents().unwrap()).unwrap();
    assert_eq!(saved.arithmetic.total_problems, 1);
}

#[test]
fn duplicate_show_triggers_start_one_session() {
    let store = Arc::new(MemoryStatsStore::new());
    let mut app = app_with(
        vec![
            Box::new(ArithmeticGame::new()),
            Box::new(StroopGame::new()),
        ],
        store,
    );

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        ChannelEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );
    for _ in 0..3 {
        tx.send(OverlayEvent::Trigger(TriggerCommand::Show)).unwrap();
    }
    run(&mut app, &runner, 3);

    assert_eq!(app.controller.display().shown(), 1);
    let first = app.controller.active_game();
    assert!(first.is_some());

    tx.send(OverlayEvent::Trigger(TriggerCommand::Hide)).unwrap();
    tx.send(OverlayEvent::Trigger(TriggerCommand::Hide)).unwrap();
    tx.send(OverlayEvent::Trigger(TriggerCommand::Show)).unwrap();
    run(&mut app, &runner, 3);

    let second = app.controller.active_game();
    assert!(second.is_some());
    assert_ne!(first, second);
}

#[test]
fn sleeping_overlay_ignores_show_until_woken() {
    let mut app = app_with(
        vec![Box::new(StroopGame::new())],
        Arc::new(MemoryStatsStore::new()),
    );

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        ChannelEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );
    tx.send(OverlayEvent::Trigger(TriggerCommand::Sleep(30))).unwrap();
    tx.send(OverlayEvent::Trigger(TriggerCommand::Show)).unwrap();
    run(&mut app, &runner, 2);
    assert_eq!(app.controller.active_game(), None);

    tx.send(OverlayEvent::Trigger(TriggerCommand::Wake)).unwrap();
    tx.send(OverlayEvent::Trigger(TriggerCommand::Show)).unwrap();
    run(&mut app, &runner, 2);
    assert_eq!(app.controller.active_game(), Some(GameId::Stroop));
}
