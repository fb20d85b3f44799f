//! Per-cell character and attribute model (component A).
//!
//! Attributes are a plain value type; copying is explicit and cheap.
//! Cells snapshot [`Attributes`] at write time — later attribute changes
//! never mutate cells already placed in a [`crate::buffer::ScreenBuffer`].

/// A terminal color: the default color, an 8-color or 256-color palette
/// index, or a truecolor triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    /// No color set; render using the surface's default.
    Default,
    /// One of the 8 base ANSI colors (SGR 30-37 / 40-47), index 0-7.
    Indexed8(u8),
    /// A 256-color palette index (SGR 38;5;n / 48;5;n).
    Indexed256(u8),
    /// A 24-bit truecolor triple (SGR 38;2;r;g;b / 48;2;r;g;b).
    Rgb(u8, u8, u8),
}

impl Default for Color {
    fn default() -> Self {
        Color::Default
    }
}

/// Text formatting flags plus foreground/background color.
///
/// `defaultAttributes()` from the specification is simply
/// `Attributes::default()`: every flag cleared, both colors unset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Attributes {
    /// Bold (SGR 1).
    pub bold: bool,
    /// Dim/faint (SGR 2).
    pub dim: bool,
    /// Italic (SGR 3).
    pub italic: bool,
    /// Underline (SGR 4).
    pub underline: bool,
    /// Blink (SGR 5).
    pub blink: bool,
    /// Reverse video (SGR 7).
    pub reverse: bool,
    /// Strikethrough (SGR 9).
    pub strikethrough: bool,
    /// Foreground color.
    pub foreground: Color,
    /// Background color.
    pub background: Color,
}

/// A user-visible character, possibly spanning multiple Unicode
/// codepoints (e.g. a base letter plus combining marks).
///
/// The common case (a single `char`) is stored inline; only genuine
/// multi-codepoint clusters allocate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Grapheme {
    /// A single codepoint — the overwhelming common case.
    Char(char),
    /// A multi-codepoint grapheme cluster (base + combining marks).
    Cluster(Box<str>),
}

impl Grapheme {
    /// Append this grapheme's text onto `out`.
    pub fn push_to(&self, out: &mut String) {
        match self {
            Grapheme::Char(c) => out.push(*c),
            Grapheme::Cluster(s) => out.push_str(s),
        }
    }

    /// Byte length of this grapheme's UTF-8 encoding.
    #[must_use]
    pub fn len_utf8(&self) -> usize {
        match self {
            Grapheme::Char(c) => c.len_utf8(),
            Grapheme::Cluster(s) => s.len(),
        }
    }
}

impl std::fmt::Display for Grapheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Grapheme::Char(c) => write!(f, "{c}"),
            Grapheme::Cluster(s) => write!(f, "{s}"),
        }
    }
}

impl Default for Grapheme {
    fn default() -> Self {
        Grapheme::Char(' ')
    }
}

/// A cell's occupancy within a row: a narrow (1-column) cell, the
/// leading column of a wide (2-column) cell, or the non-addressable
/// sentinel continuation that follows a wide cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellWidth {
    /// Occupies exactly one column.
    Narrow,
    /// Occupies two columns; this is the first of the pair.
    WideLead,
    /// The sentinel second column of a preceding [`CellWidth::WideLead`].
    /// Never independently addressable.
    WideTrail,
}

impl CellWidth {
    /// The column span this occupancy represents (1 or 2), matching the
    /// specification's `width: 1|2` field. A continuation cell reports
    /// 0: it contributes no additional column span of its own.
    #[must_use]
    pub fn columns(self) -> u8 {
        match self {
            CellWidth::Narrow => 1,
            CellWidth::WideLead => 2,
            CellWidth::WideTrail => 0,
        }
    }

    /// True for the sentinel continuation cell of a wide character.
    #[must_use]
    pub fn is_continuation(self) -> bool {
        matches!(self, CellWidth::WideTrail)
    }
}

/// One character position in the grid, with its attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    grapheme: Grapheme,
    width: CellWidth,
    attrs: Attributes,
}

impl Cell {
    /// A blank (space) cell with the given attributes.
    #[must_use]
    pub fn blank(attrs: Attributes) -> Self {
        Self {
            grapheme: Grapheme::Char(' '),
            width: CellWidth::Narrow,
            attrs,
        }
    }

    /// A blank cell with default attributes.
    #[must_use]
    pub fn default_blank() -> Self {
        Self::blank(Attributes::default())
    }

    /// A narrow (1-column) cell carrying `grapheme`.
    #[must_use]
    pub fn narrow(grapheme: Grapheme, attrs: Attributes) -> Self {
        Self {
            grapheme,
            width: CellWidth::Narrow,
            attrs,
        }
    }

    /// The leading column of a wide (2-column) cell.
    #[must_use]
    pub fn wide_lead(grapheme: Grapheme, attrs: Attributes) -> Self {
        Self {
            grapheme,
            width: CellWidth::WideLead,
            attrs,
        }
    }

    /// The sentinel continuation cell following a [`Cell::wide_lead`].
    #[must_use]
    pub fn continuation(attrs: Attributes) -> Self {
        Self {
            grapheme: Grapheme::Char(' '),
            width: CellWidth::WideTrail,
            attrs,
        }
    }

    /// This cell's grapheme.
    #[must_use]
    pub fn grapheme(&self) -> &Grapheme {
        &self.grapheme
    }

    /// This cell's column occupancy.
    #[must_use]
    pub fn width(&self) -> CellWidth {
        self.width
    }

    /// This cell's formatting, snapshot at write time.
    #[must_use]
    pub fn attrs(&self) -> Attributes {
        self.attrs
    }

    /// True for the sentinel continuation cell of a wide character.
    #[must_use]
    pub fn is_continuation(&self) -> bool {
        self.width.is_continuation()
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::default_blank()
    }
}
