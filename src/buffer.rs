//! 2-D screen grid with bounded scrollback (component B).
//!
//! A `ScreenBuffer` stores every line it has ever held — scrollback
//! history plus the currently visible rows — in one contiguous store.
//! The "visible window" is always the last `rows` lines; appending a
//! blank line at the tail is exactly what pushes the old top-of-screen
//! line back into history, so ordinary full-screen scrolling needs no
//! separate scrollback-migration step.

use crate::cell::{Attributes, Cell};
use crate::line::Line;
use std::collections::VecDeque;

/// Which half of a line `eraseInLine` should replace with blanks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineEraseMode {
    /// From the given column through the end of the line.
    ToEnd,
    /// From the start of the line through the given column.
    ToStart,
    /// The entire line.
    All,
}

/// Which part of the screen (and, for primary buffers, scrollback)
/// `eraseInDisplay` should replace with blanks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayEraseMode {
    /// From the cursor through the end of the screen.
    ToEnd,
    /// From the start of the screen through the cursor.
    ToStart,
    /// The entire visible screen; scrollback history is preserved.
    Screen,
    /// The entire screen and all scrollback history.
    ScreenAndScrollback,
}

/// An inclusive row range `[top, bottom]`, 0-based and relative to the
/// visible window, that LF-driven and explicit scrolling operate within.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    /// First row of the region (inclusive).
    pub top: u16,
    /// Last row of the region (inclusive).
    pub bottom: u16,
}

/// A 2-D grid of [`Line`]s bounded by `max_lines`, with scrollback for
/// the primary buffer and a fixed visible window for the alternate
/// buffer.
#[derive(Clone, Debug)]
pub struct ScreenBuffer {
    lines: VecDeque<Line>,
    max_lines: usize,
    trim_target: usize,
    scrolled_off_lines: u64,
    cols: u16,
    rows: u16,
}

impl ScreenBuffer {
    /// A fresh buffer sized `cols x rows`, pre-filled with `rows` blank
    /// lines and bounded by `max_lines` total stored lines.
    #[must_use]
    pub fn new(cols: u16, rows: u16, max_lines: usize) -> Self {
        let max_lines = max_lines.max(rows as usize);
        let mut lines = VecDeque::with_capacity(rows as usize);
        for _ in 0..rows {
            lines.push_back(Line::blank());
        }
        Self {
            lines,
            max_lines,
            trim_target: max_lines,
            scrolled_off_lines: 0,
            cols,
            rows,
        }
    }

    /// Current size.
    #[must_use]
    pub fn size(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }

    /// Number of lines that have ever scrolled off the head due to the
    /// `max_lines` bound.
    #[must_use]
    pub fn scrolled_off_lines(&self) -> u64 {
        self.scrolled_off_lines
    }

    /// Total stored lines (scrollback + visible window).
    #[must_use]
    pub fn stored_line_count(&self) -> usize {
        self.lines.len()
    }

    /// Index into `self.lines` where the visible window begins.
    fn visible_start(&self) -> usize {
        self.lines.len().saturating_sub(self.rows as usize)
    }

    fn abs(&self, row: u16) -> usize {
        self.visible_start() + row as usize
    }

    /// Borrow the visible line at `row` (0-based from the top of the
    /// visible window).
    #[must_use]
    pub fn visible_line(&self, row: u16) -> Option<&Line> {
        self.lines.get(self.abs(row))
    }

    /// Borrow a cell in the visible window.
    #[must_use]
    pub fn cell(&self, row: u16, col: u16) -> Option<&Cell> {
        self.visible_line(row)?.get(col as usize)
    }

    /// Append a line at the tail. If the bound is crossed, the oldest
    /// `lines.len() - trim_target` lines are dropped from the head.
    /// Returns the number of lines dropped.
    pub fn append_line(&mut self, line: Line) -> usize {
        self.lines.push_back(line);
        if self.lines.len() > self.max_lines {
            let excess = self.lines.len() - self.trim_target;
            for _ in 0..excess {
                self.lines.pop_front();
            }
            self.scrolled_off_lines += excess as u64;
            log::trace!(
                "scrollback trimmed {excess} line(s), {} total scrolled off",
                self.scrolled_off_lines
            );
            excess
        } else {
            0
        }
    }

    fn ensure_row(&mut self, row: u16) {
        while self.lines.len() <= self.visible_start() + row as usize {
            self.append_line(Line::blank());
        }
    }

    /// Replace the cell at `(row, col)`, padding with empty lines and
    /// default-attribute space cells as needed per the specification.
    pub fn write_cell_at(&mut self, row: u16, col: u16, cell: Cell) {
        self.ensure_row(row);
        let abs = self.abs(row);
        if let Some(line) = self.lines.get_mut(abs) {
            line.set(col as usize, cell);
        }
    }

    /// Insert-mode write: shifts subsequent cells in the line right;
    /// cells pushed past `cols` are discarded.
    pub fn insert_cell_at(&mut self, row: u16, col: u16, cell: Cell) {
        self.ensure_row(row);
        let cols = self.cols as usize;
        let abs = self.abs(row);
        if let Some(line) = self.lines.get_mut(abs) {
            line.insert(col as usize, cell, cols);
        }
    }

    /// ICH: insert `count` blank cells at `(row, col)`, shifting the
    /// remainder of the line right.
    pub fn insert_blanks_at(&mut self, row: u16, col: u16, count: u16, attrs: Attributes) {
        for _ in 0..count {
            self.insert_cell_at(row, col, Cell::blank(attrs));
        }
    }

    /// DCH: delete `count` cells at `(row, col)`, shifting the remainder
    /// of the line left and padding the freed tail with blanks.
    pub fn delete_cells_at(&mut self, row: u16, col: u16, count: u16) {
        self.ensure_row(row);
        let cols = self.cols as usize;
        let abs = self.abs(row);
        if let Some(line) = self.lines.get_mut(abs) {
            line.delete(col as usize, count as usize, cols);
        }
    }

    /// Merge a zero-width combining codepoint into the last addressable
    /// cell of `row`. Returns `true` if there was a cell to merge into.
    pub fn merge_combining_at(&mut self, row: u16, c: char) -> bool {
        self.ensure_row(row);
        let abs = self.abs(row);
        self.lines
            .get_mut(abs)
            .is_some_and(|line| line.merge_combining(c))
    }

    /// ECH: erase `count` cells at `(row, col)` in place (no shifting).
    pub fn erase_cells_at(&mut self, row: u16, col: u16, count: u16, attrs: Attributes) {
        self.ensure_row(row);
        let abs = self.abs(row);
        if let Some(line) = self.lines.get_mut(abs) {
            line.erase_range(col as usize, col as usize + count as usize, attrs);
        }
    }

    /// `eraseInLine`: mode 0 is `[col, end)`, mode 1 is `[0, col]`, mode 2
    /// is the whole line. Length is preserved; erasure uses default
    /// attributes.
    pub fn erase_in_line(&mut self, row: u16, col: u16, mode: LineEraseMode, attrs: Attributes) {
        self.ensure_row(row);
        let cols = self.cols as usize;
        let abs = self.abs(row);
        let Some(line) = self.lines.get_mut(abs) else {
            return;
        };
        match mode {
            LineEraseMode::ToEnd => line.erase_range(col as usize, cols, attrs),
            LineEraseMode::ToStart => line.erase_range(0, col as usize + 1, attrs),
            LineEraseMode::All => line.erase_all(attrs),
        }
    }

    /// `eraseInDisplay`. On mode 2, only the visible window is replaced
    /// with blanks; scrollback history below it is untouched. On mode 3
    /// the stored scrollback history is dropped entirely.
    pub fn erase_in_display(
        &mut self,
        cursor_row: u16,
        cursor_col: u16,
        mode: DisplayEraseMode,
        attrs: Attributes,
    ) {
        let rows = self.rows;
        match mode {
            DisplayEraseMode::ToEnd => {
                self.erase_in_line(cursor_row, cursor_col, LineEraseMode::ToEnd, attrs);
                for row in (cursor_row + 1)..rows {
                    self.erase_in_line(row, 0, LineEraseMode::All, attrs);
                }
            }
            DisplayEraseMode::ToStart => {
                for row in 0..cursor_row {
                    self.erase_in_line(row, 0, LineEraseMode::All, attrs);
                }
                self.erase_in_line(cursor_row, cursor_col, LineEraseMode::ToStart, attrs);
            }
            DisplayEraseMode::Screen => {
                for row in 0..rows {
                    self.erase_in_line(row, 0, LineEraseMode::All, attrs);
                }
            }
            DisplayEraseMode::ScreenAndScrollback => {
                let visible_start = self.visible_start();
                self.lines.drain(0..visible_start);
                for row in 0..rows {
                    self.erase_in_line(row, 0, LineEraseMode::All, attrs);
                }
            }
        }
    }

    /// Scroll the given region up by `n` lines: drops the top `n` rows
    /// of the region, appends `n` blanks at its bottom. When `region`
    /// spans the entire screen and `grows_scrollback` is true (the
    /// primary buffer scrolling as a whole), the dropped top line is
    /// preserved as scrollback via an ordinary tail append; otherwise
    /// the region is rotated in place and nothing is added to history.
    pub fn scroll_up(&mut self, region: Region, n: u16, grows_scrollback: bool) {
        let n = n.max(0);
        if n == 0 {
            return;
        }
        let full_screen = region.top == 0 && region.bottom + 1 == self.rows;
        if grows_scrollback && full_screen {
            for _ in 0..n {
                self.append_line(Line::blank());
            }
        } else {
            self.rotate_region(region, n, true);
        }
    }

    /// Scroll the given region down by `n` lines: drops the bottom `n`
    /// rows of the region, inserts `n` blanks at its top. Never
    /// contributes to scrollback.
    pub fn scroll_down(&mut self, region: Region, n: u16) {
        if n == 0 {
            return;
        }
        self.rotate_region(region, n, false);
    }

    fn rotate_region(&mut self, region: Region, n: u16, up: bool) {
        self.ensure_row(region.bottom);
        let abs_top = self.abs(region.top);
        let abs_bottom = self.abs(region.bottom);
        if abs_bottom < abs_top || abs_bottom >= self.lines.len() {
            return;
        }
        let region_len = abs_bottom - abs_top + 1;
        let n = (n as usize).min(region_len);
        let mut slice: Vec<Line> = self.lines.drain(abs_top..=abs_bottom).collect();
        if up {
            slice.rotate_left(n);
            for line in &mut slice[(region_len - n)..] {
                *line = Line::blank();
            }
        } else {
            slice.rotate_right(n);
            for line in &mut slice[..n] {
                *line = Line::blank();
            }
        }
        for (offset, line) in slice.into_iter().enumerate() {
            self.lines.insert(abs_top + offset, line);
        }
    }

    /// Resize the grid. Existing lines are not re-wrapped; the visible
    /// window simply grows or shrinks, padding with blank lines when it
    /// grows past the currently stored count.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        self.max_lines = self.max_lines.max(rows as usize);
        while self.lines.len() < rows as usize {
            self.lines.push_back(Line::blank());
        }
    }

    /// Replace every visible row with a fresh blank line and reset the
    /// scrollback entirely. Used when entering/clearing the alternate
    /// buffer.
    pub fn reset_to_blank(&mut self) {
        self.lines.clear();
        for _ in 0..self.rows {
            self.lines.push_back(Line::blank());
        }
    }

    /// Render the visible window as exactly `rows` plain-text strings,
    /// each padded with spaces to `cols` display columns.
    #[must_use]
    pub fn visible_plain_lines(&self) -> Vec<String> {
        (0..self.rows)
            .map(|row| {
                self.visible_line(row)
                    .map(|line| line.to_plain_text(self.cols as usize))
                    .unwrap_or_else(|| " ".repeat(self.cols as usize))
            })
            .collect()
    }
}
