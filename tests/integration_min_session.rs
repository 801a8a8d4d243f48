// Minimal integration test that drives the compiled binary through a PTY.
// This exercises the real event loop and crossterm input handling across
// the main boundaries without relying on internal modules.
//
// Notes:
// - Requires a TTY; uses expectrl which allocates a pseudo terminal.
// - Marked Unix-only and ignored by default to avoid CI/platform issues.
// - Run manually via: `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};

fn overlay_cmd(extra: &str) -> String {
    let bin = assert_cmd::cargo::cargo_bin("microtaskrr");
    // port 0 so parallel runs never fight over the trigger port
    format!(
        "{} --no-persist --trigger-addr 127.0.0.1:0 {extra}",
        bin.display()
    )
}

#[test]
#[ignore]
fn show_dismiss_and_quit() -> Result<(), Box<dyn std::error::Error>> {
    let mut p = spawn(overlay_cmd(""))?;

    // Give the app a moment to initialize the terminal/alternate screen
    std::thread::sleep(Duration::from_millis(300));

    // Start a game from the idle screen
    p.send("s")?;
    std::thread::sleep(Duration::from_millis(200));

    // ESC dismisses whatever game came up
    p.send("\x1b")?;
    std::thread::sleep(Duration::from_millis(200));

    // Back on the idle screen, q quits
    p.send("q")?;

    p.expect(Eof)?;
    Ok(())
}

#[test]
#[ignore]
fn ctrl_c_exits_mid_game() -> Result<(), Box<dyn std::error::Error>> {
    let mut p = spawn(overlay_cmd("--show --games snake"))?;
    std::thread::sleep(Duration::from_millis(300));

    p.send("\x03")?; // Ctrl-C

    p.expect(Eof)?;
    Ok(())
}

#[test]
#[ignore]
fn invalid_config_warning_reaches_the_log() -> Result<(), Box<dyn std::error::Error>> {
    let home = tempfile::tempdir()?;
    let config_dir = home.path().join(".config").join("microtaskrr");
    std::fs::create_dir_all(&config_dir)?;
    std::fs::write(config_dir.join("config.json"), "{ not json")?;

    let mut p = spawn(format!(
        "env HOME={home} XDG_CONFIG_HOME={home}/.config {cmd}",
        home = home.path().display(),
        cmd = overlay_cmd(""),
    ))?;
    std::thread::sleep(Duration::from_millis(300));
    p.send("q")?;
    p.expect(Eof)?;

    let log_dir = home.path().join(".local/state/microtaskrr/logs");
    let mut logged = String::new();
    for entry in std::fs::read_dir(log_dir)? {
        logged.push_str(&std::fs::read_to_string(entry?.path())?);
    }
    assert!(logged.contains("Invalid config, using defaults"), "{logged}");
    Ok(())
}

#[test]
fn trigger_without_overlay_fails() {
    // nothing listens on port 9 of loopback in a test environment
    assert_cmd::Command::cargo_bin("microtaskrr")
        .unwrap()
        .args(["--trigger-addr", "127.0.0.1:9", "show"])
        .assert()
        .failure();
}
