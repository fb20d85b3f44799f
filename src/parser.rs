//! Byte-stream state machine (component D).
//!
//! `ByteParser` is the only piece of transient, cross-call parsing
//! state a session carries: everything else lives on
//! [`crate::state::TerminalState`]. It is re-entrant per session (one
//! `feed` call processes one arbitrarily sized chunk) and preserves
//! partial state — an escape sequence split across two calls still
//! parses correctly because the state tag and pending buffers are
//! fields here, not locals.

use crate::classifier::{self, SequenceType};
use crate::dispatch;
use crate::state::TerminalState;
use crate::utf8::{DecodedChar, Utf8Decoder};

/// Upper bound on bytes collected for a CSI parameter string or a
/// string-terminated (OSC/DCS/APC/PM) payload. Bytes beyond this are
/// discarded but the scan for the terminator continues, so a hostile
/// producer cannot grow these buffers without bound.
const MAX_SEQUENCE_BYTES: usize = 4096;

/// Parser automaton state tag.
#[derive(Clone, Debug, PartialEq, Eq)]
enum ParserState {
    /// Ordinary text / control-character processing.
    Ground,
    /// Just consumed `ESC`; branching on the next byte.
    Escape,
    /// Inside `ESC [ ... final`, collecting parameter bytes.
    Csi,
    /// Inside a string-terminated sequence (OSC/DCS/APC/PM), consumed
    /// silently until `BEL` or `ESC \`.
    StringTerminated(SequenceType),
}

impl Default for ParserState {
    fn default() -> Self {
        ParserState::Ground
    }
}

/// The byte-stream state machine. Embedded as a field of
/// [`TerminalState`]; see [`TerminalState::process_output`] for how it
/// is temporarily taken out to get an unaliased `&mut TerminalState`.
#[derive(Clone, Debug, Default)]
pub struct ByteParser {
    state: ParserState,
    csi_params: Vec<u8>,
    string_saw_esc: bool,
    decoder: Utf8Decoder,
}

impl ByteParser {
    /// Feed one chunk of bytes, mutating `state` as sequences complete.
    /// Returns `true` if any byte in the chunk produced a visible state
    /// change (a cell write, cursor move, attribute change, mode
    /// change, scroll, or buffer swap).
    pub fn feed(&mut self, state: &mut TerminalState, bytes: &[u8]) -> bool {
        let mut mutated = false;
        for &b in bytes {
            mutated |= self.feed_byte(state, b);
        }
        mutated
    }

    fn feed_byte(&mut self, state: &mut TerminalState, b: u8) -> bool {
        match self.state {
            ParserState::Ground => self.feed_ground(state, b),
            ParserState::Escape => self.feed_escape(state, b),
            ParserState::Csi => self.feed_csi(state, b),
            ParserState::StringTerminated(kind) => self.feed_string(state, kind, b),
        }
    }

    fn flush_decoder_invalid(&mut self, state: &mut TerminalState) -> bool {
        let mut mutated = false;
        let decoder = &mut self.decoder;
        decoder.flush_incomplete(|d| {
            if matches!(d, DecodedChar::Invalid) {
                mutated |= dispatch::handle_invalid_char(state);
            }
        });
        mutated
    }

    fn feed_ground(&mut self, state: &mut TerminalState, b: u8) -> bool {
        if b == 0x1B {
            let mutated = self.flush_decoder_invalid(state);
            self.state = ParserState::Escape;
            return mutated;
        }
        if b < 0x20 || b == 0x7F {
            let mutated = self.flush_decoder_invalid(state);
            return mutated | dispatch::handle_control(state, b);
        }
        let mut mutated = false;
        let decoder = &mut self.decoder;
        decoder.feed(&[b], |decoded| {
            mutated |= match decoded {
                DecodedChar::Valid(c) => dispatch::handle_printable(state, c),
                DecodedChar::Invalid => dispatch::handle_invalid_char(state),
            };
        });
        mutated
    }

    fn feed_escape(&mut self, state: &mut TerminalState, b: u8) -> bool {
        match b {
            b'[' => {
                self.csi_params.clear();
                self.state = ParserState::Csi;
                false
            }
            _ => {
                if let Some(kind) = classifier::string_sequence_type(b) {
                    log::trace!("consuming {kind:?} sequence, classified Dangerous");
                    self.string_saw_esc = false;
                    self.state = ParserState::StringTerminated(kind);
                    return false;
                }
                self.state = ParserState::Ground;
                dispatch::dispatch_simple_escape(state, b)
            }
        }
    }

    fn feed_csi(&mut self, state: &mut TerminalState, b: u8) -> bool {
        if (0x40..=0x7E).contains(&b) {
            let classified = classifier::classify_csi(&self.csi_params, b);
            self.csi_params.clear();
            self.state = ParserState::Ground;
            return dispatch::dispatch_csi(state, &classified);
        }
        if self.csi_params.len() < MAX_SEQUENCE_BYTES {
            self.csi_params.push(b);
        }
        false
    }

    /// Consume one byte of a string-terminated (OSC/DCS/APC/PM) payload.
    /// Per the specification, `BEL` only terminates OSC; DCS/APC/PM are
    /// terminated solely by `ESC \` (ST), so a bare `BEL` inside one of
    /// those payloads is ordinary data, not a terminator.
    fn feed_string(&mut self, state: &mut TerminalState, kind: SequenceType, b: u8) -> bool {
        if b == 0x07 && kind == SequenceType::Osc {
            self.state = ParserState::Ground;
            self.string_saw_esc = false;
            return false;
        }
        if self.string_saw_esc {
            self.string_saw_esc = false;
            if b == b'\\' {
                self.state = ParserState::Ground;
                return false;
            }
            // Not a valid ST; treat the ESC as having begun a new
            // escape sequence and reprocess this byte there.
            self.state = ParserState::Escape;
            return self.feed_byte(state, b);
        }
        if b == 0x1B {
            self.string_saw_esc = true;
            return false;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TerminalState;

    fn new_state() -> TerminalState {
        TerminalState::new("s".to_string(), 80, 24, 1000)
    }

    #[test]
    fn plain_text_advances_cursor() {
        let mut state = new_state();
        state.process_output(b"Hello");
        assert_eq!(state.cursor.col, 5);
        let line0 = state.active_buffer().visible_plain_lines()[0].clone();
        assert!(line0.starts_with("Hello"));
    }

    #[test]
    fn csi_split_across_two_calls_still_dispatches() {
        let mut state = new_state();
        state.process_output(b"\x1b[2");
        state.process_output(b";5H");
        assert_eq!(state.cursor.row, 1);
        assert_eq!(state.cursor.col, 4);
    }

    #[test]
    fn osc_terminated_by_bel_is_consumed_silently() {
        let mut state = new_state();
        let mutated = state.process_output(b"Before\x1b]0;title\x07After");
        assert!(mutated);
        let line0 = state.active_buffer().visible_plain_lines()[0].clone();
        assert!(line0.starts_with("BeforeAfter"));
    }

    #[test]
    fn osc_terminated_by_st_is_consumed_silently() {
        let mut state = new_state();
        state.process_output(b"X\x1b]0;t\x1b\\Y");
        let line0 = state.active_buffer().visible_plain_lines()[0].clone();
        assert!(line0.starts_with("XY"));
    }

    #[test]
    fn dcs_payload_ignores_bare_bel_and_only_ends_at_st() {
        let mut state = new_state();
        // A bare BEL inside a DCS payload must not end the sequence; only
        // `ESC \` (ST) does, unlike OSC.
        state.process_output(b"X\x1bPsome\x07payload\x1b\\Y");
        let line0 = state.active_buffer().visible_plain_lines()[0].clone();
        assert!(line0.starts_with("XY"));
    }

    #[test]
    fn apc_payload_ignores_bare_bel_and_only_ends_at_st() {
        let mut state = new_state();
        state.process_output(b"X\x1b_data\x07more\x1b\\Y");
        let line0 = state.active_buffer().visible_plain_lines()[0].clone();
        assert!(line0.starts_with("XY"));
    }

    #[test]
    fn unknown_escape_final_returns_to_ground() {
        let mut state = new_state();
        state.process_output(b"\x1b\x06more text");
        let line0 = state.active_buffer().visible_plain_lines()[0].clone();
        assert!(line0.starts_with("more text"));
    }

    #[test]
    fn adversarial_all_escape_input_never_panics() {
        let mut state = new_state();
        let bytes: Vec<u8> = (0u16..512).map(|v| (v % 256) as u8).collect();
        state.process_output(&bytes);
        assert!(state.primary.stored_line_count() <= 1000);
    }

    #[test]
    fn chunk_invariance_for_mixed_content() {
        let whole = b"Hello\x1b[2;5HWorld\x1b]0;t\x07Z";
        let mut one_shot = new_state();
        one_shot.process_output(whole);

        let mut chunked = new_state();
        for chunk in whole.chunks(3) {
            chunked.process_output(chunk);
        }

        assert_eq!(one_shot.cursor, chunked.cursor);
        assert_eq!(
            one_shot.active_buffer().visible_plain_lines(),
            chunked.active_buffer().visible_plain_lines()
        );
    }
}
