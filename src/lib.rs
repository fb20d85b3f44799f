//! A VT100/xterm-compatible terminal emulator engine.
//!
//! Ingests a raw byte stream from a pseudo-tty-like producer and
//! maintains a faithful model of what a VT100/xterm-compatible terminal
//! would display: a 2-D grid of cells with attributes, a cursor, scroll
//! region, and an alternate screen buffer. Clients poll
//! [`SessionRegistry::get_visible_lines`] / [`SessionRegistry::get_buffer`]
//! for the rendered state and draw it through whatever display surface
//! they like; this crate does not render anything itself.
//!
//! ```
//! use vtcore::{Config, SessionRegistry};
//!
//! let mut registry = SessionRegistry::new();
//! let config = Config::default();
//! registry.create_buffer("session-1", 80, 24, &config).unwrap();
//! registry.process_output("session-1", b"Hello, world!").unwrap();
//! let lines = registry.get_visible_lines("session-1").unwrap();
//! assert!(lines[0].starts_with("Hello, world!"));
//! ```

pub mod buffer;
pub mod cell;
pub mod classifier;
pub mod config;
mod dispatch;
pub mod error;
pub mod line;
mod parser;
pub mod registry;
pub mod state;
mod utf8;

pub use buffer::{DisplayEraseMode, LineEraseMode, Region, ScreenBuffer};
pub use cell::{Attributes, Cell, CellWidth, Color, Grapheme};
pub use config::Config;
pub use error::{Result, TerminalError};
pub use line::Line;
pub use registry::{ChangeCallback, SessionRegistry, TerminalView};
pub use state::{ActiveBuffer, Cursor, Modes, SavedCursor, ScrollRegion, TerminalState};
