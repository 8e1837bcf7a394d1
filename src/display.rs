//! Screen snapshot interface consumed by the renderer
//!
//! The session/protocol layer owns the screen state; the terminal layer
//! only reads it. [`DisplayView`] is the narrow capability interface the
//! renderer and the print-screen exporter consume: geometry, raw cell
//! bytes (attribute bytes interleaved with data bytes), cursor position,
//! the indicator bitmask, and the negotiated code-page mapping.
//!
//! [`ScreenBuffer`] is a concrete implementation backed by a flat byte
//! grid with an EBCDIC CP037 code page; the demo binary and the tests
//! use it in place of a live session.

/// Keyboard is inhibited (operator error or host lock).
pub const IND_INHIBIT: u16 = 0x0001;
/// A message is waiting for the operator.
pub const IND_MESSAGE_WAITING: u16 = 0x0002;
/// The host is busy ("X SYSTEM").
pub const IND_X_SYSTEM: u16 = 0x0004;
/// Short host wait ("X CLOCK").
pub const IND_X_CLOCK: u16 = 0x0008;
/// Insert mode is active.
pub const IND_INSERT: u16 = 0x0010;
/// Field error.
pub const IND_FER: u16 = 0x0020;
/// Macro recording/playback in progress.
pub const IND_MACRO: u16 = 0x0040;

/// A data byte is an attribute byte when its top three bits are `001`.
pub fn is_attribute_byte(c: u8) -> bool {
    (c & 0xe0) == 0x20
}

/// Read-only view of the current screen snapshot.
pub trait DisplayView {
    /// Screen width in columns (80 or 132).
    fn width(&self) -> usize;
    /// Screen height in rows (24 or 27).
    fn height(&self) -> usize;
    /// Raw buffer byte at the given position: either an attribute byte
    /// or a data byte in the negotiated code page.
    fn char_at(&self, row: usize, col: usize) -> u8;
    /// Cursor column, 0-based.
    fn cursor_x(&self) -> usize;
    /// Cursor row, 0-based.
    fn cursor_y(&self) -> usize;
    /// Indicator bitmask (`IND_*`).
    fn indicators(&self) -> u16;
    /// Map a data byte through the negotiated code page to a displayable
    /// character.
    fn to_local(&self, byte: u8) -> char;
    /// 11-byte macro recorder substate shown on the status line while
    /// `IND_MACRO` is set.
    fn macro_substate(&self) -> [u8; 11] {
        *b"           "
    }
}

/// EBCDIC CP037 to ASCII translation table (US/Canada code page, the
/// common default on the host side).
const EBCDIC_CP037_TO_ASCII: [char; 256] = [
    '\x00', '\x01', '\x02', '\x03', '\x37', '\x2D', '\x2E', '\x2F', //
    '\x16', '\x05', '\x25', '\x0B', '\x0C', '\r', '\x0E', '\x0F', //
    '\x10', '\x11', '\x12', '\x13', '\x3C', '\x3D', '\x32', '\x26', //
    '\x18', '\x19', '\x3F', '\x27', '\x1C', '\x1D', '\x1E', '\x1F', //
    '\x40', '\x5A', '\x7F', '\x7B', '\x5B', '\n', '\x17', '\x1B', //
    '\x60', '\x61', '\x62', '\x63', '\x64', '\x65', '\x66', '\x67', //
    '\x68', '\x69', '\x70', '\x71', '\x72', '\x73', '\x74', '\x75', //
    '\x76', '\x77', '\x78', '\x79', '\x7A', '\x7B', '\x7C', '\x7D', //
    ' ', ' ', ' ', ' ', ' ', ' ', ' ', ' ', //
    ' ', ' ', '[', '.', '<', '(', '+', '|', //
    '&', ' ', ' ', ' ', ' ', ' ', ' ', ' ', //
    ' ', ' ', '!', '$', '*', ')', ';', ' ', //
    '-', '/', ' ', ' ', ' ', ' ', ' ', ' ', //
    ' ', ' ', '|', ',', '%', '_', '>', '?', //
    ' ', ' ', ' ', ' ', ' ', ' ', ' ', ' ', //
    ' ', '`', ':', '#', '@', '\'', '=', '"', //
    ' ', 'a', 'b', 'c', 'd', 'e', 'f', 'g', //
    'h', 'i', ' ', ' ', ' ', ' ', ' ', ' ', //
    ' ', 'j', 'k', 'l', 'm', 'n', 'o', 'p', //
    'q', 'r', ' ', ' ', ' ', ' ', ' ', ' ', //
    ' ', '~', 's', 't', 'u', 'v', 'w', 'x', //
    'y', 'z', ' ', ' ', ' ', ' ', ' ', ' ', //
    '^', ' ', ' ', ' ', ' ', ' ', ' ', ' ', //
    ' ', ' ', '[', ']', ' ', ' ', ' ', ' ', //
    '{', 'A', 'B', 'C', 'D', 'E', 'F', 'G', //
    'H', 'I', ' ', ' ', ' ', ' ', ' ', ' ', //
    '}', 'J', 'K', 'L', 'M', 'N', 'O', 'P', //
    'Q', 'R', ' ', ' ', ' ', ' ', ' ', ' ', //
    '\\', ' ', 'S', 'T', 'U', 'V', 'W', 'X', //
    'Y', 'Z', ' ', ' ', ' ', ' ', ' ', ' ', //
    '0', '1', '2', '3', '4', '5', '6', '7', //
    '8', '9', ' ', ' ', ' ', ' ', ' ', ' ', //
];

/// EBCDIC space.
pub const EBCDIC_BLANK: u8 = 0x40;

/// Reverse lookup into the CP037 table. Linear over 256 entries; only
/// used when composing test and demo screens.
pub fn ascii_to_ebcdic(ch: char) -> u8 {
    // Scan the displayable range first so ambiguous blanks resolve to
    // the real EBCDIC space.
    if ch == ' ' {
        return EBCDIC_BLANK;
    }
    for (i, &c) in EBCDIC_CP037_TO_ASCII.iter().enumerate().skip(0x40) {
        if c == ch {
            return i as u8;
        }
    }
    EBCDIC_BLANK
}

/// A concrete screen snapshot: a width x height grid of attribute and
/// data bytes plus cursor and indicators.
#[derive(Debug, Clone)]
pub struct ScreenBuffer {
    width: usize,
    height: usize,
    cells: Vec<u8>,
    cursor_x: usize,
    cursor_y: usize,
    indicators: u16,
    macro_state: [u8; 11],
}

impl ScreenBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0u8; width * height],
            cursor_x: 0,
            cursor_y: 0,
            indicators: 0,
            macro_state: *b"           ",
        }
    }

    /// Clear every cell back to nul (rendered blank under attribute 0).
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Change dimensions, clearing the grid.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.cells = vec![0u8; width * height];
        self.cursor_x = 0;
        self.cursor_y = 0;
    }

    /// Store a raw buffer byte (attribute or data) at a position.
    pub fn set_byte(&mut self, row: usize, col: usize, byte: u8) {
        if row < self.height && col < self.width {
            self.cells[row * self.width + col] = byte;
        }
    }

    /// Place an attribute byte for the given attribute code.
    pub fn set_attr(&mut self, row: usize, col: usize, code: u8) {
        self.set_byte(row, col, 0x20 | (code & 0x1f));
    }

    /// Write an ASCII string as EBCDIC data bytes starting at a position.
    pub fn put_str(&mut self, row: usize, col: usize, s: &str) {
        for (i, ch) in s.chars().enumerate() {
            self.set_byte(row, col + i, ascii_to_ebcdic(ch));
        }
    }

    pub fn set_cursor(&mut self, row: usize, col: usize) {
        if row < self.height && col < self.width {
            self.cursor_y = row;
            self.cursor_x = col;
        }
    }

    pub fn set_indicators(&mut self, indicators: u16) {
        self.indicators = indicators;
    }

    pub fn set_macro_substate(&mut self, state: [u8; 11]) {
        self.macro_state = state;
    }
}

impl DisplayView for ScreenBuffer {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn char_at(&self, row: usize, col: usize) -> u8 {
        self.cells
            .get(row * self.width + col)
            .copied()
            .unwrap_or(0)
    }

    fn cursor_x(&self) -> usize {
        self.cursor_x
    }

    fn cursor_y(&self) -> usize {
        self.cursor_y
    }

    fn indicators(&self) -> u16 {
        self.indicators
    }

    fn to_local(&self, byte: u8) -> char {
        EBCDIC_CP037_TO_ASCII[byte as usize]
    }

    fn macro_substate(&self) -> [u8; 11] {
        self.macro_state
    }
}
