//! Minimal replay tool: feeds a byte-stream capture through a single
//! terminal session and prints the resulting visible grid.
//!
//! Usage: `replay <path-to-capture> [cols] [rows]`. No argument parsing
//! crate is pulled in for two flags; `std::env::args` is enough.

use anyhow::{Context, Result};
use vtcore::{Config, SessionRegistry};

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .context("usage: replay <path-to-capture> [cols] [rows]")?;
    let cols: u16 = args.next().and_then(|s| s.parse().ok()).unwrap_or(80);
    let rows: u16 = args.next().and_then(|s| s.parse().ok()).unwrap_or(24);

    let bytes = std::fs::read(&path).with_context(|| format!("reading {path}"))?;
    log::info!("replaying {} bytes from {path} at {cols}x{rows}", bytes.len());

    let mut registry = SessionRegistry::new();
    let config = Config {
        cols,
        rows,
        ..Config::default()
    };
    registry.create_buffer("replay", cols, rows, &config)?;
    registry.process_output("replay", &bytes)?;

    for line in registry.get_visible_lines("replay")? {
        println!("{line}");
    }

    let view = registry
        .get_buffer("replay")
        .context("session vanished mid-replay")?;
    log::info!(
        "cursor at ({}, {}), alternate buffer in use: {}",
        view.cursor.row,
        view.cursor.col,
        matches!(view.active, vtcore::ActiveBuffer::Alternate)
    );

    Ok(())
}
