//! Incremental UTF-8 decoding across arbitrary chunk boundaries.
//!
//! `processOutput` may be called with a chunk that ends mid-codepoint;
//! the decoder carries the partial sequence forward rather than
//! emitting a replacement character prematurely. Invalid sequences are
//! replaced with `U+FFFD`, matching the specification's decode-time
//! substitution rule.

/// Decodes a byte stream to `char`s incrementally, carrying any partial
/// multi-byte sequence across calls to [`Utf8Decoder::feed`].
#[derive(Clone, Debug, Default)]
pub struct Utf8Decoder {
    pending: [u8; 4],
    pending_len: u8,
    expected_len: u8,
}

/// One decoded unit of input: a successfully decoded character, or a
/// replacement for an invalid byte sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodedChar {
    /// A valid Unicode scalar value.
    Valid(char),
    /// An invalid byte sequence, rendered as U+FFFD.
    Invalid,
}

impl Utf8Decoder {
    /// A fresh decoder with no carried-over partial state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self) {
        self.pending_len = 0;
        self.expected_len = 0;
    }

    /// Feed one chunk of bytes, invoking `emit` once per decoded
    /// character (or invalid-sequence replacement), in order. Any
    /// trailing partial multi-byte sequence is retained internally and
    /// resumed on the next call.
    pub fn feed(&mut self, bytes: &[u8], mut emit: impl FnMut(DecodedChar)) {
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            if self.pending_len == 0 {
                let len = utf8_seq_len(b);
                match len {
                    0 => {
                        emit(DecodedChar::Invalid);
                        i += 1;
                    }
                    1 => {
                        emit(DecodedChar::Valid(b as char));
                        i += 1;
                    }
                    _ => {
                        self.pending[0] = b;
                        self.pending_len = 1;
                        self.expected_len = len;
                        i += 1;
                    }
                }
                continue;
            }

            if !is_continuation(b) {
                // Broken sequence: emit one replacement for the bytes
                // collected so far and reprocess this byte fresh.
                emit(DecodedChar::Invalid);
                self.reset();
                continue;
            }

            self.pending[self.pending_len as usize] = b;
            self.pending_len += 1;
            i += 1;

            if self.pending_len == self.expected_len {
                let slice = &self.pending[..self.pending_len as usize];
                match std::str::from_utf8(slice) {
                    Ok(s) => {
                        for c in s.chars() {
                            emit(DecodedChar::Valid(c));
                        }
                    }
                    Err(_) => emit(DecodedChar::Invalid),
                }
                self.reset();
            }
        }
    }

    /// Flush any incomplete trailing sequence as a single replacement
    /// character. Callers that process one chunk per call and never
    /// intend to resume (e.g. end of stream) may invoke this; ordinary
    /// `processOutput` usage leaves pending state across calls instead.
    pub fn flush_incomplete(&mut self, mut emit: impl FnMut(DecodedChar)) {
        if self.pending_len > 0 {
            emit(DecodedChar::Invalid);
            self.reset();
        }
    }

    /// True iff a multi-byte sequence is awaiting more bytes.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending_len > 0
    }
}

/// Expected total byte length of a UTF-8 sequence starting with `b`, or
/// `0` if `b` cannot start a sequence (a stray continuation byte or an
/// invalid leading byte), or `1` for plain ASCII.
fn utf8_seq_len(b: u8) -> u8 {
    if b < 0x80 {
        1
    } else if b & 0xE0 == 0xC0 {
        2
    } else if b & 0xF0 == 0xE0 {
        3
    } else if b & 0xF8 == 0xF0 {
        4
    } else {
        0
    }
}

fn is_continuation(b: u8) -> bool {
    b & 0xC0 == 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(bytes: &[u8]) -> Vec<DecodedChar> {
        let mut decoder = Utf8Decoder::new();
        let mut out = Vec::new();
        decoder.feed(bytes, |d| out.push(d));
        decoder.flush_incomplete(|d| out.push(d));
        out
    }

    #[test]
    fn decodes_plain_ascii() {
        let out = decode_all(b"abc");
        assert_eq!(
            out,
            vec![
                DecodedChar::Valid('a'),
                DecodedChar::Valid('b'),
                DecodedChar::Valid('c'),
            ]
        );
    }

    #[test]
    fn decodes_multibyte_codepoint() {
        let out = decode_all("中".as_bytes());
        assert_eq!(out, vec![DecodedChar::Valid('中')]);
    }

    #[test]
    fn splits_multibyte_sequence_across_two_feeds() {
        let bytes = "中".as_bytes();
        let mut decoder = Utf8Decoder::new();
        let mut out = Vec::new();
        decoder.feed(&bytes[..1], |d| out.push(d));
        assert!(decoder.has_pending());
        decoder.feed(&bytes[1..], |d| out.push(d));
        assert_eq!(out, vec![DecodedChar::Valid('中')]);
    }

    #[test]
    fn invalid_lead_byte_is_replaced() {
        let out = decode_all(&[0xFF]);
        assert_eq!(out, vec![DecodedChar::Invalid]);
    }

    #[test]
    fn truncated_sequence_at_end_is_replaced_on_flush() {
        let bytes = "中".as_bytes();
        let out = decode_all(&bytes[..2]);
        assert_eq!(out, vec![DecodedChar::Invalid]);
    }

    #[test]
    fn broken_continuation_emits_invalid_and_resyncs() {
        // 0xE4 starts a 3-byte sequence but is immediately followed by
        // an ASCII byte, not a continuation byte.
        let out = decode_all(&[0xE4, b'x']);
        assert_eq!(out, vec![DecodedChar::Invalid, DecodedChar::Valid('x')]);
    }
}
