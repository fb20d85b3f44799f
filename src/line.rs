//! A single row of cells within a [`crate::buffer::ScreenBuffer`].

use crate::cell::{Attributes, Cell, CellWidth, Grapheme};
use crate::config::MAX_LINE_LENGTH;
use std::time::{SystemTime, UNIX_EPOCH};
use unicode_segmentation::UnicodeSegmentation;

/// A point in time, used for `Line::created_at` and
/// `TerminalState::last_updated`. Wraps [`SystemTime`] so callers never
/// need to reach for `std::time` directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(SystemTime);

impl Timestamp {
    /// The current time.
    #[must_use]
    pub fn now() -> Self {
        Self(SystemTime::now())
    }

    /// Milliseconds since the Unix epoch, saturating at zero if the
    /// system clock is set before 1970.
    #[must_use]
    pub fn epoch_millis(self) -> u128 {
        self.0
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

/// An ordered sequence of cells making up one row.
///
/// `wrapped` is true iff this line was continued from the previous row
/// due to autowrap, rather than started by an explicit line feed.
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    cells: Vec<Cell>,
    /// True iff this line continues the previous one due to autowrap.
    pub wrapped: bool,
    /// When this line was created.
    pub created_at: Timestamp,
}

impl Line {
    /// An empty, unwrapped line created now.
    #[must_use]
    pub fn blank() -> Self {
        Self {
            cells: Vec::new(),
            wrapped: false,
            created_at: Timestamp::now(),
        }
    }

    /// Number of cells currently stored (not padded to any screen width).
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True if this line has no cells stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Borrow the cell at `col`, if stored.
    #[must_use]
    pub fn get(&self, col: usize) -> Option<&Cell> {
        self.cells.get(col)
    }

    fn pad_to(&mut self, len: usize, attrs: Attributes) {
        if self.cells.len() < len {
            self.cells.resize(len, Cell::blank(attrs));
        }
    }

    /// Replace the cell at `col`, padding with default-attribute space
    /// cells if the line is currently shorter than `col`. Bounded by
    /// [`MAX_LINE_LENGTH`]; writes beyond that bound are dropped.
    pub fn set(&mut self, col: usize, cell: Cell) {
        if col >= MAX_LINE_LENGTH {
            return;
        }
        self.pad_to(col, Attributes::default());
        let overwrote_lead = self
            .cells
            .get(col)
            .is_some_and(|c| matches!(c.width(), CellWidth::WideLead));
        let new_is_lead = matches!(cell.width(), CellWidth::WideLead);
        if col == self.cells.len() {
            self.cells.push(cell);
        } else {
            self.cells[col] = cell;
        }
        // Overwriting a wide lead with anything else orphans its
        // continuation cell one column over; blank it.
        if overwrote_lead && !new_is_lead {
            self.heal_orphaned_continuation_at(col + 1);
        }
        self.debug_assert_no_orphaned_continuations();
    }

    /// If `col` holds a continuation cell, blank it. Used after an
    /// operation at `col - 1` removes the wide-lead cell that `col` used
    /// to continue, so no stored line ever holds a continuation cell
    /// without an immediately preceding wide-lead cell.
    fn heal_orphaned_continuation_at(&mut self, col: usize) {
        if let Some(cell) = self.cells.get_mut(col) {
            if cell.is_continuation() {
                *cell = Cell::blank(cell.attrs());
            }
        }
    }

    /// Debug-only invariant check: every stored continuation cell is
    /// immediately preceded by a wide-lead cell. The mutators above heal
    /// this invariant proactively (so release builds never panic on
    /// adversarial input), but a violation slipping through would mean a
    /// bug in one of them, so it is still worth asserting loudly in
    /// debug/test builds rather than only ever silently self-healing.
    #[cfg(debug_assertions)]
    fn debug_assert_no_orphaned_continuations(&self) {
        for i in 0..self.cells.len() {
            if self.cells[i].is_continuation() {
                debug_assert!(
                    i > 0 && matches!(self.cells[i - 1].width(), CellWidth::WideLead),
                    "orphaned continuation cell at column {i}"
                );
            }
        }
    }

    #[cfg(not(debug_assertions))]
    fn debug_assert_no_orphaned_continuations(&self) {}

    /// Insert `cell` at `col`, shifting subsequent cells right within
    /// this line. Cells pushed past `max_cols` are discarded.
    pub fn insert(&mut self, col: usize, cell: Cell, max_cols: usize) {
        let col = col.min(self.cells.len()).min(MAX_LINE_LENGTH.saturating_sub(1));
        self.pad_to(col, Attributes::default());
        let inserted_is_lead = matches!(cell.width(), CellWidth::WideLead);
        self.cells.insert(col, cell);
        // Inserting between an existing wide lead and its trail would
        // otherwise orphan the continuation cell one column further on.
        if !inserted_is_lead {
            self.heal_orphaned_continuation_at(col + 1);
        }
        let cap = max_cols.min(MAX_LINE_LENGTH);
        if self.cells.len() > cap {
            self.cells.truncate(cap);
        }
        self.debug_assert_no_orphaned_continuations();
    }

    /// Delete `count` cells starting at `col`, shifting subsequent cells
    /// left and padding the freed tail with default-attribute space
    /// cells so the line keeps its prior length (up to `max_cols`).
    pub fn delete(&mut self, col: usize, count: usize, max_cols: usize) {
        if col >= self.cells.len() {
            return;
        }
        let end = (col + count).min(self.cells.len());
        self.cells.drain(col..end);
        // A deletion can shift a wide character's continuation cell into
        // a position no longer preceded by its lead; blank it so no
        // stored line ever holds an orphaned continuation cell.
        self.heal_orphaned_continuation_at(col);
        let target_len = self.cells.len().max(col).min(max_cols);
        // Re-pad to at least cover the columns freed by the deletion,
        // so subsequent reads see blanks rather than a shortened line.
        self.pad_to(target_len.max(col), Attributes::default());
        self.debug_assert_no_orphaned_continuations();
    }

    /// Replace `[start, end)` with default-attribute space cells,
    /// without changing the line's stored length.
    pub fn erase_range(&mut self, start: usize, end: usize, attrs: Attributes) {
        let end = end.min(self.cells.len());
        if start < end {
            for cell in self.cells.get_mut(start..end).into_iter().flatten() {
                *cell = Cell::blank(attrs);
            }
            // Erasing up to (but not including) a wide lead's
            // continuation cell would otherwise orphan it.
            self.heal_orphaned_continuation_at(end);
        }
        self.debug_assert_no_orphaned_continuations();
    }

    /// Erase the entire line (preserving its current stored length) with
    /// default-attribute space cells.
    pub fn erase_all(&mut self, attrs: Attributes) {
        let len = self.cells.len();
        self.erase_range(0, len, attrs);
    }

    /// Truncate or extend this line to exactly `len` cells, padding new
    /// cells with `attrs`.
    pub fn resize(&mut self, len: usize, attrs: Attributes) {
        if len < self.cells.len() {
            self.cells.truncate(len);
        } else {
            self.pad_to(len, attrs);
        }
    }

    /// Render this line as plain text padded (or truncated) to exactly
    /// `cols` display columns. Continuation cells contribute no text of
    /// their own (their glyph was already emitted by the preceding wide
    /// cell); missing trailing columns become spaces.
    #[must_use]
    pub fn to_plain_text(&self, cols: usize) -> String {
        let mut out = String::with_capacity(cols);
        let mut used = 0usize;
        for cell in &self.cells {
            if used >= cols {
                break;
            }
            if cell.is_continuation() {
                continue;
            }
            cell.grapheme().push_to(&mut out);
            used += cell.width().columns().max(1) as usize;
        }
        while used < cols {
            out.push(' ');
            used += 1;
        }
        out
    }

    /// Merge a zero-width combining codepoint into the grapheme of the
    /// last addressable (non-continuation) cell, if any. Declines the
    /// merge (returns `false`) if doing so would not actually form a
    /// single extended grapheme cluster — e.g. a zero-width character
    /// that is not a combining mark — so the caller can fall back to
    /// giving it its own cell.
    pub fn merge_combining(&mut self, c: char) -> bool {
        for cell in self.cells.iter_mut().rev() {
            if cell.is_continuation() {
                continue;
            }
            let mut merged = String::new();
            cell.grapheme().push_to(&mut merged);
            merged.push(c);
            if merged.graphemes(true).count() != 1 {
                return false;
            }
            let attrs = cell.attrs();
            let width = cell.width();
            let grapheme = Grapheme::Cluster(merged.into_boxed_str());
            *cell = match width {
                CellWidth::WideLead => Cell::wide_lead(grapheme, attrs),
                _ => Cell::narrow(grapheme, attrs),
            };
            return true;
        }
        false
    }
}

impl Default for Line {
    fn default() -> Self {
        Self::blank()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_pads_with_default_attrs() {
        let mut line = Line::blank();
        line.set(3, Cell::narrow(Grapheme::Char('x'), Attributes::default()));
        assert_eq!(line.len(), 4);
        assert_eq!(line.get(0).unwrap().grapheme(), &Grapheme::Char(' '));
    }

    #[test]
    fn insert_shifts_and_truncates_at_max_cols() {
        let mut line = Line::blank();
        for c in "abcde".chars() {
            let n = line.len();
            line.set(n, Cell::narrow(Grapheme::Char(c), Attributes::default()));
        }
        line.insert(0, Cell::narrow(Grapheme::Char('Z'), Attributes::default()), 5);
        assert_eq!(line.len(), 5);
        assert_eq!(line.to_plain_text(5), "Zabcd");
    }

    #[test]
    fn plain_text_skips_continuation_cells() {
        let mut line = Line::blank();
        line.set(0, Cell::wide_lead(Grapheme::Char('\u{4e2d}'), Attributes::default()));
        line.set(1, Cell::continuation(Attributes::default()));
        line.set(2, Cell::narrow(Grapheme::Char('y'), Attributes::default()));
        assert_eq!(line.to_plain_text(5), "\u{4e2d}y  ");
    }

    #[test]
    fn merge_combining_upgrades_to_cluster() {
        let mut line = Line::blank();
        line.set(0, Cell::narrow(Grapheme::Char('e'), Attributes::default()));
        assert!(line.merge_combining('\u{0301}'));
        assert_eq!(line.get(0).unwrap().grapheme().to_string(), "e\u{0301}");
    }

    #[test]
    fn max_line_length_is_enforced() {
        let mut line = Line::blank();
        line.set(MAX_LINE_LENGTH + 10, Cell::default_blank());
        assert!(line.len() <= MAX_LINE_LENGTH);
    }

    #[test]
    fn delete_never_leaves_an_orphaned_continuation_cell() {
        let mut line = Line::blank();
        line.set(0, Cell::wide_lead(Grapheme::Char('\u{4e2d}'), Attributes::default()));
        line.set(1, Cell::continuation(Attributes::default()));
        line.set(2, Cell::narrow(Grapheme::Char('y'), Attributes::default()));
        line.delete(0, 1, 5);
        assert!(!line.get(0).unwrap().is_continuation());
    }

    #[test]
    fn insert_between_a_wide_pair_never_leaves_an_orphaned_continuation_cell() {
        let mut line = Line::blank();
        line.set(0, Cell::wide_lead(Grapheme::Char('\u{4e2d}'), Attributes::default()));
        line.set(1, Cell::continuation(Attributes::default()));
        line.insert(1, Cell::narrow(Grapheme::Char('Z'), Attributes::default()), 5);
        assert!(!line.get(2).unwrap().is_continuation());
    }

    #[test]
    fn overwriting_a_wide_lead_heals_its_orphaned_continuation() {
        let mut line = Line::blank();
        line.set(0, Cell::wide_lead(Grapheme::Char('\u{4e2d}'), Attributes::default()));
        line.set(1, Cell::continuation(Attributes::default()));
        line.set(0, Cell::narrow(Grapheme::Char('x'), Attributes::default()));
        assert!(!line.get(1).unwrap().is_continuation());
    }

    #[test]
    fn erase_range_stopping_at_a_continuation_cell_heals_it() {
        let mut line = Line::blank();
        line.set(0, Cell::wide_lead(Grapheme::Char('\u{4e2d}'), Attributes::default()));
        line.set(1, Cell::continuation(Attributes::default()));
        line.set(2, Cell::narrow(Grapheme::Char('y'), Attributes::default()));
        line.erase_range(0, 1, Attributes::default());
        assert!(!line.get(1).unwrap().is_continuation());
    }
}
