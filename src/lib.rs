// Library surface for the overlay binary and integration tests.
// main.rs only parses arguments and owns the terminal.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod controller;
pub mod corpus;
pub mod display;
pub mod error;
pub mod focus;
pub mod games;
pub mod logging;
pub mod persistence;
pub mod runtime;
pub mod selection;
pub mod stats;
pub mod timers;
pub mod trigger;
pub mod ui;
pub mod util;

pub use error::{Error, Result};
