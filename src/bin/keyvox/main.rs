//! keyvox - play the synth from the computer keyboard
//!
//! Run with: cargo run
//! Set KEYVOX_LOG=<file> to capture engine logs; the terminal belongs to the UI.

mod app;
mod keymap;
mod ui;

use std::{fs::File, sync::Mutex};

use app::App;
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use keyvox::{Engine, EngineConfig};
use tracing_subscriber::filter::LevelFilter;

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    init_logging()?;

    let engine = Engine::new(EngineConfig::default());
    let mut terminal = ratatui::init();
    let result = App::new(engine).run(&mut terminal);
    ratatui::restore();
    result
}

fn init_logging() -> EyreResult<()> {
    let Some(path) = std::env::var_os("KEYVOX_LOG") else {
        return Ok(());
    };
    let file = File::create(&path)
        .wrap_err_with(|| format!("failed to create log file {}", path.to_string_lossy()))?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(LevelFilter::DEBUG)
        .init();
    Ok(())
}
