//! Terminal state (component E): cursor, modes, active buffer, size.

use crate::buffer::ScreenBuffer;
use crate::cell::Attributes;
use crate::line::Timestamp;
use crate::parser::ByteParser;

/// Cursor position and visibility.
///
/// `col` may transiently equal `cols` (the "pending wrap" position),
/// valid only between writing the last column and emitting the next
/// cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    /// Zero-based row.
    pub row: u16,
    /// Zero-based column; may equal `cols` transiently (pending wrap).
    pub col: u16,
    /// Whether the cursor should be rendered.
    pub visible: bool,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            row: 0,
            col: 0,
            visible: true,
        }
    }
}

/// A snapshot of cursor position taken by `ESC 7` / `CSI s` / DEC
/// private mode 1049, restored by `ESC 8` / `CSI u` / mode 1049 reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SavedCursor {
    /// Saved row/column/visibility.
    pub cursor: Cursor,
    /// Saved attributes at the time of the save.
    pub attrs: Attributes,
}

/// A 1-based, inclusive scroll region. Absent means the whole screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScrollRegion {
    /// First row of the region, 1-based inclusive.
    pub top: u16,
    /// Last row of the region, 1-based inclusive.
    pub bottom: u16,
}

impl ScrollRegion {
    /// Convert to a 0-based inclusive [`crate::buffer::Region`] clamped
    /// to `rows`.
    #[must_use]
    pub fn to_region(self, rows: u16) -> crate::buffer::Region {
        let top = self.top.saturating_sub(1).min(rows.saturating_sub(1));
        let bottom = self.bottom.saturating_sub(1).min(rows.saturating_sub(1));
        crate::buffer::Region {
            top: top.min(bottom),
            bottom: bottom.max(top),
        }
    }
}

/// Boolean terminal modes, per the specification's field list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Modes {
    /// DEC private mode 1: cursor keys send application sequences.
    /// Tracked for completeness; has no effect on output since this
    /// engine exposes no input channel.
    pub application_cursor: bool,
    /// DEC private mode 7 (default on): wrap at the right margin.
    pub autowrap: bool,
    /// Standard mode 4 / insert-mode: writes shift the line right
    /// instead of overwriting.
    pub insert_mode: bool,
    /// Not mutated by any recognized sequence; always true, matching
    /// the specification's field list and kept for interface parity.
    pub local_echo: bool,
}

impl Default for Modes {
    fn default() -> Self {
        Self {
            application_cursor: false,
            autowrap: true,
            insert_mode: false,
            local_echo: true,
        }
    }
}

/// Which screen buffer is currently active.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActiveBuffer {
    /// The scrollback-bearing primary buffer.
    Primary,
    /// The fixed-size alternate buffer.
    Alternate,
}

/// Per-session terminal state: the buffers, cursor, modes, and pending
/// parser state that together model one VT100/xterm-compatible screen.
#[derive(Clone, Debug)]
pub struct TerminalState {
    /// Opaque caller-assigned session id.
    pub session_id: String,
    /// The scrollback-bearing buffer.
    pub primary: ScreenBuffer,
    /// The fixed-size buffer used while an application holds the
    /// alternate screen.
    pub alternate: ScreenBuffer,
    /// Which buffer is currently active.
    pub active: ActiveBuffer,
    /// Current cursor.
    pub cursor: Cursor,
    /// Cursor snapshot from the most recent save, if any.
    pub saved_cursor: Option<SavedCursor>,
    /// Current grid size.
    pub cols: u16,
    /// Current grid size.
    pub rows: u16,
    /// Attributes applied to the next written cell.
    pub current_attrs: Attributes,
    /// Boolean terminal modes.
    pub modes: Modes,
    /// Active scroll region, if one has been set.
    pub scroll_region: Option<ScrollRegion>,
    /// True between writing the last column and the next printable.
    pub pending_wrap: bool,
    /// Last time this state was mutated by `process_output`.
    pub last_updated: Timestamp,
    /// Hard bound passed to both buffers at construction.
    pub max_buffer_lines: usize,
    /// If `false`, a carriage return byte behaves like a line feed
    /// instead of only resetting the cursor column (see
    /// `crate::config::Config::handle_carriage_return`).
    pub handle_carriage_return: bool,
    parser: ByteParser,
}

impl TerminalState {
    /// A fresh session with both buffers sized `cols x rows` and
    /// default (`handle_carriage_return = true`) CR behavior.
    #[must_use]
    pub fn new(session_id: String, cols: u16, rows: u16, max_buffer_lines: usize) -> Self {
        Self::with_config(session_id, cols, rows, max_buffer_lines, true)
    }

    /// A fresh session with the given CR-handling behavior, as set by
    /// `crate::config::Config::handle_carriage_return`.
    #[must_use]
    pub fn with_config(
        session_id: String,
        cols: u16,
        rows: u16,
        max_buffer_lines: usize,
        handle_carriage_return: bool,
    ) -> Self {
        Self {
            session_id,
            primary: ScreenBuffer::new(cols, rows, max_buffer_lines),
            alternate: ScreenBuffer::new(cols, rows, rows as usize),
            active: ActiveBuffer::Primary,
            cursor: Cursor::default(),
            saved_cursor: None,
            cols,
            rows,
            current_attrs: Attributes::default(),
            modes: Modes::default(),
            scroll_region: None,
            pending_wrap: false,
            last_updated: Timestamp::now(),
            max_buffer_lines,
            handle_carriage_return,
            parser: ByteParser::default(),
        }
    }

    /// Borrow the currently active buffer.
    #[must_use]
    pub fn active_buffer(&self) -> &ScreenBuffer {
        match self.active {
            ActiveBuffer::Primary => &self.primary,
            ActiveBuffer::Alternate => &self.alternate,
        }
    }

    /// Mutably borrow the currently active buffer.
    pub fn active_buffer_mut(&mut self) -> &mut ScreenBuffer {
        match self.active {
            ActiveBuffer::Primary => &mut self.primary,
            ActiveBuffer::Alternate => &mut self.alternate,
        }
    }

    /// The effective 0-based inclusive scroll region for the current
    /// size: the explicit region if set, else the whole screen.
    #[must_use]
    pub fn effective_region(&self) -> crate::buffer::Region {
        match self.scroll_region {
            Some(region) => region.to_region(self.rows),
            None => crate::buffer::Region {
                top: 0,
                bottom: self.rows.saturating_sub(1),
            },
        }
    }

    /// Feed raw bytes through the embedded parser. The parser is
    /// temporarily taken out of `self` so it can be given `&mut self`
    /// for dispatch without a self-referential borrow.
    pub fn process_output(&mut self, bytes: &[u8]) -> bool {
        let mut parser = std::mem::take(&mut self.parser);
        let mutated = parser.feed(self, bytes);
        self.parser = parser;
        if mutated {
            self.last_updated = Timestamp::now();
        }
        mutated
    }

    /// Clamp the cursor into `[0, cols-1] x [0, rows-1]` (or `cols` for
    /// the transient pending-wrap column), used after resize.
    pub fn clamp_cursor(&mut self) {
        self.cursor.row = self.cursor.row.min(self.rows.saturating_sub(1));
        self.cursor.col = self.cursor.col.min(self.cols);
        self.pending_wrap = false;
    }

    /// Reset to a freshly constructed state's cursor/attrs/modes,
    /// without touching buffer contents (used by `clearBuffer`, which
    /// additionally erases the active buffer).
    pub fn reset_transient_state(&mut self) {
        self.cursor = Cursor::default();
        self.current_attrs = Attributes::default();
        self.pending_wrap = false;
        self.saved_cursor = None;
        self.scroll_region = None;
    }
}
