//! Engine configuration.
//!
//! Mirrors the teacher's `Config` shape (plain struct, documented fields,
//! a `Default` impl computing the baked-in defaults) without any of its
//! orchestration content — no server URL, no keyring, no worktrees.

use serde::{Deserialize, Serialize};

/// Hard ceiling on [`Config::max_buffer_lines`], regardless of what a
/// caller requests. Keeps per-session memory bounded even against a
/// misconfigured or hostile caller.
pub const MAX_BUFFER_LINES_CEILING: usize = 10_000;

/// Upper bound on a single line's length, in grapheme cells. Appends
/// beyond this are silently truncated.
pub const MAX_LINE_LENGTH: usize = 4_096;

/// Recognized engine options, all with defaults, as described in the
/// specification's external-interfaces section.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Initial column count for newly created sessions.
    pub cols: u16,
    /// Initial row count for newly created sessions.
    pub rows: u16,
    /// Scrollback bound for the primary buffer. Clamped to
    /// [`MAX_BUFFER_LINES_CEILING`].
    pub max_buffer_lines: usize,
    /// If `false`, a carriage return byte (`0x0D`) behaves like a line
    /// feed instead of only resetting the cursor column.
    pub handle_carriage_return: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cols: 80,
            rows: 24,
            max_buffer_lines: 1_000,
            handle_carriage_return: true,
        }
    }
}

impl Config {
    /// Returns `max_buffer_lines` clamped to the hard ceiling.
    #[must_use]
    pub fn effective_max_buffer_lines(&self) -> usize {
        self.max_buffer_lines.min(MAX_BUFFER_LINES_CEILING).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let config = Config::default();
        assert_eq!(config.cols, 80);
        assert_eq!(config.rows, 24);
        assert_eq!(config.max_buffer_lines, 1_000);
        assert!(config.handle_carriage_return);
    }

    #[test]
    fn clamps_to_hard_ceiling() {
        let config = Config {
            max_buffer_lines: 50_000,
            ..Config::default()
        };
        assert_eq!(config.effective_max_buffer_lines(), MAX_BUFFER_LINES_CEILING);
    }
}
