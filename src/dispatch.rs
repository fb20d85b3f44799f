//! Action dispatcher (component F).
//!
//! Applies classified control characters, printable graphemes, simple
//! escapes, and CSI sequences to a [`TerminalState`] and its active
//! [`crate::buffer::ScreenBuffer`]. Every function here returns whether
//! it produced a visible state change, which `ByteParser::feed` folds
//! into the `mutated` flag the session registry uses to decide whether
//! to fire its change callback.

use crate::buffer::{DisplayEraseMode, LineEraseMode};
use crate::cell::{Cell, Color, Grapheme};
use crate::classifier::{ClassifiedCsi, SecurityLevel};
use crate::state::{ActiveBuffer, Cursor, SavedCursor, ScrollRegion, TerminalState};

/// Control characters handled while in GROUND, per the specification.
pub fn handle_control(state: &mut TerminalState, byte: u8) -> bool {
    match byte {
        0x07 => false, // BEL: ignored
        0x08 => {
            // BS: cursor col decrements, not below 0.
            if state.cursor.col > 0 {
                state.cursor.col -= 1;
                state.pending_wrap = false;
                true
            } else {
                false
            }
        }
        0x09 => {
            // HT: advance to next multiple of 8, not beyond cols - 1.
            let next = (state.cursor.col / 8 + 1) * 8;
            let clamped = next.min(state.cols.saturating_sub(1));
            if clamped != state.cursor.col {
                state.cursor.col = clamped;
                true
            } else {
                false
            }
        }
        0x0A => line_feed(state),
        0x0D => {
            if state.handle_carriage_return {
                if state.cursor.col != 0 || state.pending_wrap {
                    state.cursor.col = 0;
                    state.pending_wrap = false;
                    true
                } else {
                    false
                }
            } else {
                // `handleCarriageReturn = false`: CR behaves like LF.
                state.cursor.col = 0;
                line_feed(state)
            }
        }
        _ => false, // other < 0x20 and DEL: ignored
    }
}

/// Move to the next row; scroll the active region up by one if already
/// at its bottom.
fn line_feed(state: &mut TerminalState) -> bool {
    state.pending_wrap = false;
    let region = state.effective_region();
    if state.cursor.row >= region.bottom {
        let active = state.active;
        let grows = matches!(active, ActiveBuffer::Primary) && region.top == 0 && region.bottom + 1 == state.rows;
        state.active_buffer_mut().scroll_up(region, 1, grows);
    } else {
        state.cursor.row += 1;
    }
    true
}

fn wide_columns(c: char) -> u8 {
    use unicode_width::UnicodeWidthChar;
    match c.width() {
        Some(0) => 0,
        Some(w) if w >= 2 => 2,
        _ => 1,
    }
}

/// Write one decoded printable grapheme at the cursor, advancing it and
/// handling autowrap / pending-wrap per the specification.
pub fn handle_printable(state: &mut TerminalState, c: char) -> bool {
    let columns = wide_columns(c);
    if columns == 0 {
        let row = state.cursor.row;
        if state
            .active_buffer_mut()
            .merge_combining_at(row, c)
        {
            return true;
        }
        // Not a true combining mark after all (e.g. stray zero-width
        // character with nothing to attach to): fall through and give
        // it its own narrow cell so it is not silently dropped.
        return write_grapheme_cell(state, Grapheme::Char(c), 1);
    }
    write_grapheme_cell(state, Grapheme::Char(c), columns)
}

/// A UTF-8 decode failure: rendered as a width-1 `U+FFFD` cell.
pub fn handle_invalid_char(state: &mut TerminalState) -> bool {
    write_grapheme_cell(state, Grapheme::Char('\u{FFFD}'), 1)
}

fn write_grapheme_cell(state: &mut TerminalState, grapheme: Grapheme, columns: u8) -> bool {
    if state.pending_wrap {
        wrap_to_next_line(state);
    }

    // Deferred-wrap convention for wide characters straddling the
    // margin (open question #2): if the wide cell would not fit in the
    // remaining columns and autowrap is on, wrap first rather than
    // splitting it across the margin.
    if columns == 2 && state.cursor.col + 1 >= state.cols && state.modes.autowrap {
        wrap_to_next_line(state);
    }

    let col = state.cursor.col.min(state.cols.saturating_sub(1));
    let row = state.cursor.row;
    let attrs = state.current_attrs;

    let cell = if columns == 2 {
        Cell::wide_lead(grapheme, attrs)
    } else {
        Cell::narrow(grapheme, attrs)
    };

    if state.modes.insert_mode {
        state.active_buffer_mut().insert_cell_at(row, col, cell);
        if columns == 2 {
            state
                .active_buffer_mut()
                .insert_cell_at(row, col + 1, Cell::continuation(attrs));
        }
    } else {
        state.active_buffer_mut().write_cell_at(row, col, cell);
        if columns == 2 {
            state
                .active_buffer_mut()
                .write_cell_at(row, col + 1, Cell::continuation(attrs));
        }
    }

    let new_col = col + columns.max(1) as u16;
    if new_col >= state.cols {
        if state.modes.autowrap {
            state.cursor.col = state.cols;
            state.pending_wrap = true;
        } else {
            state.cursor.col = state.cols.saturating_sub(1);
        }
    } else {
        state.cursor.col = new_col;
    }
    true
}

fn wrap_to_next_line(state: &mut TerminalState) {
    state.pending_wrap = false;
    state.cursor.col = 0;
    let region = state.effective_region();
    if state.cursor.row >= region.bottom {
        let grows = matches!(state.active, ActiveBuffer::Primary)
            && region.top == 0
            && region.bottom + 1 == state.rows;
        state.active_buffer_mut().scroll_up(region, 1, grows);
    } else {
        state.cursor.row += 1;
    }
}

/// Dispatch `ESC` followed by a single final byte (no introducer).
pub fn dispatch_simple_escape(state: &mut TerminalState, final_byte: u8) -> bool {
    match final_byte {
        b'7' => {
            state.saved_cursor = Some(SavedCursor {
                cursor: state.cursor,
                attrs: state.current_attrs,
            });
            false
        }
        b'8' => restore_cursor(state),
        b'c' => {
            *state = crate::state::TerminalState::with_config(
                state.session_id.clone(),
                state.cols,
                state.rows,
                state.max_buffer_lines,
                state.handle_carriage_return,
            );
            true
        }
        b'D' => line_feed(state),
        b'M' => {
            // Reverse index: move up, scrolling down at region top.
            state.pending_wrap = false;
            let region = state.effective_region();
            if state.cursor.row <= region.top {
                state.active_buffer_mut().scroll_down(region, 1);
            } else {
                state.cursor.row -= 1;
            }
            true
        }
        b'E' => {
            state.cursor.col = 0;
            line_feed(state)
        }
        _ => false,
    }
}

fn restore_cursor(state: &mut TerminalState) -> bool {
    if let Some(saved) = state.saved_cursor {
        state.cursor = saved.cursor;
        state.current_attrs = saved.attrs;
        state.pending_wrap = false;
        true
    } else {
        false
    }
}

/// Dispatch a fully classified CSI sequence.
pub fn dispatch_csi(state: &mut TerminalState, classified: &ClassifiedCsi) -> bool {
    if classified.security != SecurityLevel::Safe {
        return false;
    }
    let p = &classified.params;
    match classified.final_byte {
        b'A' => move_cursor_vertical(state, -(p.get_nonzero(0, 1) as i32), true),
        b'B' => move_cursor_vertical(state, p.get_nonzero(0, 1) as i32, true),
        b'C' => move_cursor_horizontal(state, p.get_nonzero(0, 1) as i32),
        b'D' => move_cursor_horizontal(state, -(p.get_nonzero(0, 1) as i32)),
        b'G' => cursor_to_column(state, p.get_nonzero(0, 1)),
        b'd' => cursor_to_row(state, p.get_nonzero(0, 1)),
        b'H' | b'f' => cursor_position(state, p.get_nonzero(0, 1), p.get_nonzero(1, 1)),
        b'J' => erase_in_display(state, p.get(0, 0)),
        b'K' => erase_in_line(state, p.get(0, 0)),
        b's' => {
            state.saved_cursor = Some(SavedCursor {
                cursor: state.cursor,
                attrs: state.current_attrs,
            });
            false
        }
        b'u' => restore_cursor(state),
        b'r' => set_scroll_region(state, p.get(0, 0), p.get(1, 0)),
        b'm' => apply_sgr(state, p),
        b'h' => set_mode(state, p, true),
        b'l' => set_mode(state, p, false),
        b'@' => {
            insert_blanks(state, p.get_nonzero(0, 1));
            true
        }
        b'P' => {
            delete_chars(state, p.get_nonzero(0, 1));
            true
        }
        b'X' => {
            erase_chars(state, p.get_nonzero(0, 1));
            true
        }
        _ => false,
    }
}

fn move_cursor_vertical(state: &mut TerminalState, delta: i32, clamp_to_region: bool) -> bool {
    let region = state.effective_region();
    let (lo, hi) = if clamp_to_region {
        (region.top, region.bottom)
    } else {
        (0, state.rows.saturating_sub(1))
    };
    let new_row = (i32::from(state.cursor.row) + delta).clamp(i32::from(lo), i32::from(hi));
    let new_row = new_row as u16;
    if new_row != state.cursor.row {
        state.cursor.row = new_row;
        state.pending_wrap = false;
        true
    } else {
        false
    }
}

fn move_cursor_horizontal(state: &mut TerminalState, delta: i32) -> bool {
    let max_col = state.cols.saturating_sub(1);
    let new_col = (i32::from(state.cursor.col) + delta).clamp(0, i32::from(max_col));
    let new_col = new_col as u16;
    if new_col != state.cursor.col {
        state.cursor.col = new_col;
        state.pending_wrap = false;
        true
    } else {
        false
    }
}

fn cursor_to_column(state: &mut TerminalState, col_1based: u32) -> bool {
    let col = (col_1based.saturating_sub(1) as u16).min(state.cols.saturating_sub(1));
    state.pending_wrap = false;
    if col != state.cursor.col {
        state.cursor.col = col;
        true
    } else {
        false
    }
}

fn cursor_to_row(state: &mut TerminalState, row_1based: u32) -> bool {
    let row = (row_1based.saturating_sub(1) as u16).min(state.rows.saturating_sub(1));
    state.pending_wrap = false;
    if row != state.cursor.row {
        state.cursor.row = row;
        true
    } else {
        false
    }
}

/// CUP/HPA: `(r, c)` are 1-based. Origin mode is out of scope (open
/// question #1), so no region-relative clamping is applied here, only
/// clamping to the full screen size.
fn cursor_position(state: &mut TerminalState, row_1based: u32, col_1based: u32) -> bool {
    let row = (row_1based.saturating_sub(1) as u16).min(state.rows.saturating_sub(1));
    let col = (col_1based.saturating_sub(1) as u16).min(state.cols.saturating_sub(1));
    state.pending_wrap = false;
    if row != state.cursor.row || col != state.cursor.col {
        state.cursor.row = row;
        state.cursor.col = col;
        true
    } else {
        false
    }
}

fn erase_in_display(state: &mut TerminalState, mode: u32) -> bool {
    let Some(mode) = (match mode {
        0 => Some(DisplayEraseMode::ToEnd),
        1 => Some(DisplayEraseMode::ToStart),
        2 => Some(DisplayEraseMode::Screen),
        3 => Some(DisplayEraseMode::ScreenAndScrollback),
        _ => None,
    }) else {
        return false;
    };
    let (row, col) = (state.cursor.row, state.cursor.col);
    let attrs = state.current_attrs;
    state.active_buffer_mut().erase_in_display(row, col, mode, attrs);
    true
}

fn erase_in_line(state: &mut TerminalState, mode: u32) -> bool {
    let Some(mode) = (match mode {
        0 => Some(LineEraseMode::ToEnd),
        1 => Some(LineEraseMode::ToStart),
        2 => Some(LineEraseMode::All),
        _ => None,
    }) else {
        return false;
    };
    let (row, col) = (state.cursor.row, state.cursor.col);
    let attrs = state.current_attrs;
    state.active_buffer_mut().erase_in_line(row, col, mode, attrs);
    true
}

fn insert_blanks(state: &mut TerminalState, count: u32) {
    let (row, col) = (state.cursor.row, state.cursor.col);
    let attrs = state.current_attrs;
    state
        .active_buffer_mut()
        .insert_blanks_at(row, col, count as u16, attrs);
}

fn delete_chars(state: &mut TerminalState, count: u32) {
    let (row, col) = (state.cursor.row, state.cursor.col);
    state
        .active_buffer_mut()
        .delete_cells_at(row, col, count as u16);
}

fn erase_chars(state: &mut TerminalState, count: u32) {
    let (row, col) = (state.cursor.row, state.cursor.col);
    let attrs = state.current_attrs;
    state
        .active_buffer_mut()
        .erase_cells_at(row, col, count as u16, attrs);
}

fn set_scroll_region(state: &mut TerminalState, top: u32, bottom: u32) -> bool {
    if top == 0 && bottom == 0 {
        state.scroll_region = None;
    } else {
        let top = top.max(1) as u16;
        let bottom = if bottom == 0 { state.rows } else { bottom as u16 };
        if top >= bottom {
            return false;
        }
        state.scroll_region = Some(ScrollRegion { top, bottom });
    }
    state.cursor = Cursor::default();
    state.pending_wrap = false;
    true
}

/// Apply the SGR parameter list to `currentAttrs`. Unknown codes are
/// ignored; `38;5;n` / `48;5;n` / `38;2;r;g;b` / `48;2;r;g;b` consume
/// their trailing sub-parameters.
fn apply_sgr(state: &mut TerminalState, params: &crate::classifier::CsiParams) -> bool {
    if params.is_empty() {
        state.current_attrs = crate::cell::Attributes::default();
        return true;
    }
    let values: Vec<u32> = params.iter().map(|v| v.unwrap_or(0)).collect();
    let mut i = 0;
    while i < values.len() {
        match values[i] {
            0 => state.current_attrs = crate::cell::Attributes::default(),
            1 => state.current_attrs.bold = true,
            2 => state.current_attrs.dim = true,
            3 => state.current_attrs.italic = true,
            4 => state.current_attrs.underline = true,
            5 => state.current_attrs.blink = true,
            7 => state.current_attrs.reverse = true,
            9 => state.current_attrs.strikethrough = true,
            22 => {
                state.current_attrs.bold = false;
                state.current_attrs.dim = false;
            }
            23 => state.current_attrs.italic = false,
            24 => state.current_attrs.underline = false,
            25 => state.current_attrs.blink = false,
            27 => state.current_attrs.reverse = false,
            29 => state.current_attrs.strikethrough = false,
            v @ 30..=37 => state.current_attrs.foreground = Color::Indexed8((v - 30) as u8),
            39 => state.current_attrs.foreground = Color::Default,
            v @ 40..=47 => state.current_attrs.background = Color::Indexed8((v - 40) as u8),
            49 => state.current_attrs.background = Color::Default,
            38 => i += apply_extended_color(&values[i..], true, state),
            48 => i += apply_extended_color(&values[i..], false, state),
            _ => {}
        }
        i += 1;
    }
    true
}

/// Parses `38;5;n`, `38;2;r;g;b` (and the `48;...` background forms)
/// starting at `values[0] == 38|48`. Returns the number of *additional*
/// values consumed beyond the leading code, so the caller's `i` lands
/// on the last consumed index.
fn apply_extended_color(values: &[u32], foreground: bool, state: &mut TerminalState) -> usize {
    match values.get(1) {
        Some(&5) => {
            let Some(&n) = values.get(2) else {
                return 1;
            };
            let color = Color::Indexed256(n as u8);
            if foreground {
                state.current_attrs.foreground = color;
            } else {
                state.current_attrs.background = color;
            }
            2
        }
        Some(&2) => {
            let (Some(&r), Some(&g), Some(&b)) = (values.get(2), values.get(3), values.get(4))
            else {
                return 1;
            };
            let color = Color::Rgb(r as u8, g as u8, b as u8);
            if foreground {
                state.current_attrs.foreground = color;
            } else {
                state.current_attrs.background = color;
            }
            4
        }
        _ => 0,
    }
}

fn set_mode(state: &mut TerminalState, params: &crate::classifier::CsiParams, enable: bool) -> bool {
    let mut mutated = false;
    for value in params.iter().flatten() {
        mutated |= if params.private {
            set_dec_private_mode(state, value, enable)
        } else {
            set_standard_mode(state, value, enable)
        };
    }
    mutated
}

fn set_standard_mode(state: &mut TerminalState, code: u32, enable: bool) -> bool {
    match code {
        4 => {
            if state.modes.insert_mode != enable {
                state.modes.insert_mode = enable;
                true
            } else {
                false
            }
        }
        _ => false,
    }
}

fn set_dec_private_mode(state: &mut TerminalState, code: u32, enable: bool) -> bool {
    match code {
        1 => {
            if state.modes.application_cursor != enable {
                state.modes.application_cursor = enable;
                true
            } else {
                false
            }
        }
        7 => {
            if state.modes.autowrap != enable {
                state.modes.autowrap = enable;
                true
            } else {
                false
            }
        }
        25 => {
            if state.cursor.visible != enable {
                state.cursor.visible = enable;
                true
            } else {
                false
            }
        }
        47 => swap_alternate(state, enable, false),
        1047 => swap_alternate(state, enable, true),
        1049 => swap_alternate(state, enable, true),
        _ => false, // other private modes: recognized and ignored
    }
}

/// Alternate-buffer swap state machine. `clear_on_enter` covers modes
/// 1047/1049 (clear the alternate buffer on entry); mode 1049 also
/// saves/restores the cursor around the swap.
fn swap_alternate(state: &mut TerminalState, enable: bool, save_cursor: bool) -> bool {
    let is_1049 = save_cursor;
    match (enable, state.active) {
        (true, ActiveBuffer::Primary) => {
            state.alternate.reset_to_blank();
            if is_1049 {
                state.saved_cursor = Some(SavedCursor {
                    cursor: state.cursor,
                    attrs: state.current_attrs,
                });
            }
            state.active = ActiveBuffer::Alternate;
            state.pending_wrap = false;
            true
        }
        (false, ActiveBuffer::Alternate) => {
            state.active = ActiveBuffer::Primary;
            if is_1049 {
                restore_cursor(state);
            }
            state.pending_wrap = false;
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify_csi;

    fn new_state() -> TerminalState {
        TerminalState::new("s".to_string(), 80, 24, 1000)
    }

    #[test]
    fn sgr_reset_clears_all_attrs_regardless_of_prior_state() {
        let mut state = new_state();
        apply_sgr(&mut state, &classify_csi(b"1;4;31", b'm').params);
        assert!(state.current_attrs.bold);
        apply_sgr(&mut state, &classify_csi(b"0", b'm').params);
        assert_eq!(state.current_attrs, crate::cell::Attributes::default());
    }

    #[test]
    fn sgr_256_color_sets_indexed() {
        let mut state = new_state();
        apply_sgr(&mut state, &classify_csi(b"38;5;201", b'm').params);
        assert_eq!(state.current_attrs.foreground, Color::Indexed256(201));
    }

    #[test]
    fn sgr_truecolor_sets_rgb() {
        let mut state = new_state();
        apply_sgr(&mut state, &classify_csi(b"48;2;10;20;30", b'm').params);
        assert_eq!(state.current_attrs.background, Color::Rgb(10, 20, 30));
    }

    #[test]
    fn cursor_position_clamps_to_screen_size() {
        let mut state = new_state();
        cursor_position(&mut state, 999, 999);
        assert_eq!(state.cursor.row, 23);
        assert_eq!(state.cursor.col, 79);
    }

    #[test]
    fn alt_swap_round_trip_preserves_primary_and_restores_cursor() {
        let mut state = new_state();
        state.cursor.row = 3;
        state.cursor.col = 4;
        let before = state.primary.visible_plain_lines();

        set_dec_private_mode(&mut state, 1049, true);
        assert_eq!(state.active, ActiveBuffer::Alternate);
        write_grapheme_cell(&mut state, Grapheme::Char('z'), 1);
        set_dec_private_mode(&mut state, 1049, false);

        assert_eq!(state.active, ActiveBuffer::Primary);
        assert_eq!(state.primary.visible_plain_lines(), before);
        assert_eq!(state.cursor.row, 3);
        assert_eq!(state.cursor.col, 4);
    }

    #[test]
    fn insert_mode_shifts_existing_content_right() {
        let mut state = new_state();
        state.process_output(b"abc");
        state.cursor.col = 0;
        state.modes.insert_mode = true;
        write_grapheme_cell(&mut state, Grapheme::Char('Z'), 1);
        let line0 = state.active_buffer().visible_plain_lines()[0].clone();
        assert!(line0.starts_with("Zabc"));
    }
}
