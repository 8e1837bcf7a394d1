//! Output/input device abstraction
//!
//! The renderer talks to a [`TerminalDevice`]: a character-cell surface
//! that can position the cursor, paint a character with an attribute,
//! pass raw escape bytes through, and hand back whatever keyboard bytes
//! are currently available without blocking. Three implementations:
//!
//! - [`CrosstermDevice`]: the interactive terminal, raw mode via
//!   crossterm, non-blocking stdin reads via `O_NONBLOCK`.
//! - [`CaptureDevice`]: an in-memory surface for tests and print-only
//!   use; records cells, raw writes and bell counts, and replays queued
//!   input bytes.
//! - [`DebugDevice`]: a decorator that traces every call through the
//!   `log` facade and forwards to the wrapped device.

use std::collections::VecDeque;
use std::io::{self, Write};

use crossterm::style::{Attribute, Color, Print, SetAttribute, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute, queue};
use log::debug;

use crate::attrs::{AttrFlags, CellAttr, TermColor};
use crate::caps::TermCaps;
use crate::error::TermResult;

/// A character-cell output surface plus its keyboard byte stream.
pub trait TerminalDevice {
    /// Physical rows currently available.
    fn rows(&self) -> usize;
    /// Physical columns currently available.
    fn cols(&self) -> usize;
    /// Clear the whole surface.
    fn clear(&mut self) -> TermResult<()>;
    /// Move the output position.
    fn move_to(&mut self, row: usize, col: usize) -> TermResult<()>;
    /// Paint one character at the output position and advance it.
    fn put(&mut self, ch: char, attr: CellAttr) -> TermResult<()>;
    /// Pass device-specific escape bytes straight through.
    fn write_raw(&mut self, bytes: &[u8]) -> TermResult<()>;
    /// Push buffered output to the device.
    fn flush(&mut self) -> TermResult<()>;
    /// Sound the bell.
    fn beep(&mut self) -> TermResult<()>;
    /// Drain currently available keyboard bytes into `buf` without
    /// blocking; returns the number of bytes stored.
    fn read_input(&mut self, buf: &mut [u8]) -> usize;
    /// Whether the device can show colors.
    fn has_colors(&self) -> bool {
        true
    }
    /// Whether the device supports the underline attribute.
    fn supports_underline(&self) -> bool {
        true
    }
}

impl<T: TerminalDevice + ?Sized> TerminalDevice for Box<T> {
    fn rows(&self) -> usize {
        (**self).rows()
    }
    fn cols(&self) -> usize {
        (**self).cols()
    }
    fn clear(&mut self) -> TermResult<()> {
        (**self).clear()
    }
    fn move_to(&mut self, row: usize, col: usize) -> TermResult<()> {
        (**self).move_to(row, col)
    }
    fn put(&mut self, ch: char, attr: CellAttr) -> TermResult<()> {
        (**self).put(ch, attr)
    }
    fn write_raw(&mut self, bytes: &[u8]) -> TermResult<()> {
        (**self).write_raw(bytes)
    }
    fn flush(&mut self) -> TermResult<()> {
        (**self).flush()
    }
    fn beep(&mut self) -> TermResult<()> {
        (**self).beep()
    }
    fn read_input(&mut self, buf: &mut [u8]) -> usize {
        (**self).read_input(buf)
    }
    fn has_colors(&self) -> bool {
        (**self).has_colors()
    }
    fn supports_underline(&self) -> bool {
        (**self).supports_underline()
    }
}

fn term_color(color: TermColor, bold: bool) -> Color {
    match (color, bold) {
        (TermColor::Black, false) => Color::Black,
        (TermColor::Black, true) => Color::DarkGrey,
        (TermColor::Red, false) => Color::DarkRed,
        (TermColor::Red, true) => Color::Red,
        (TermColor::Green, false) => Color::DarkGreen,
        (TermColor::Green, true) => Color::Green,
        (TermColor::Yellow, false) => Color::DarkYellow,
        (TermColor::Yellow, true) => Color::Yellow,
        (TermColor::Blue, false) => Color::DarkBlue,
        (TermColor::Blue, true) => Color::Blue,
        (TermColor::Magenta, false) => Color::DarkMagenta,
        (TermColor::Magenta, true) => Color::Magenta,
        (TermColor::Cyan, false) => Color::DarkCyan,
        (TermColor::Cyan, true) => Color::Cyan,
        (TermColor::White, false) => Color::Grey,
        (TermColor::White, true) => Color::White,
    }
}

/// The interactive terminal on stdout/stdin.
pub struct CrosstermDevice {
    out: io::Stdout,
    last_attr: Option<CellAttr>,
    underline_ok: bool,
    colors_ok: bool,
}

impl CrosstermDevice {
    /// Enter raw mode, switch to the alternate screen, put the keypad in
    /// transmit mode and make stdin non-blocking.
    pub fn open(caps: &dyn TermCaps) -> TermResult<Self> {
        terminal::enable_raw_mode()?;
        let mut out = io::stdout();
        execute!(out, EnterAlternateScreen, Clear(ClearType::All))?;
        if let Some(ks) = caps.keypad_transmit() {
            out.write_all(&ks)?;
            out.flush()?;
        }
        set_stdin_nonblocking();
        Ok(Self {
            out,
            last_attr: None,
            underline_ok: caps.has_underline(),
            colors_ok: true,
        })
    }

    fn apply_attr(&mut self, attr: CellAttr) -> TermResult<()> {
        if self.last_attr == Some(attr) {
            return Ok(());
        }
        queue!(self.out, SetAttribute(Attribute::Reset))?;
        if self.colors_ok {
            let bold = attr.flags.contains(AttrFlags::BOLD);
            queue!(self.out, SetForegroundColor(term_color(attr.color, bold)))?;
        }
        if attr.flags.contains(AttrFlags::BOLD) {
            queue!(self.out, SetAttribute(Attribute::Bold))?;
        }
        if attr.flags.contains(AttrFlags::UNDERLINE) && self.underline_ok {
            queue!(self.out, SetAttribute(Attribute::Underlined))?;
        }
        if attr.flags.contains(AttrFlags::REVERSE) {
            queue!(self.out, SetAttribute(Attribute::Reverse))?;
        }
        if attr.flags.contains(AttrFlags::BLINK) {
            queue!(self.out, SetAttribute(Attribute::SlowBlink))?;
        }
        self.last_attr = Some(attr);
        Ok(())
    }
}

impl TerminalDevice for CrosstermDevice {
    fn rows(&self) -> usize {
        terminal::size().map(|(_, r)| r as usize).unwrap_or(24)
    }

    fn cols(&self) -> usize {
        terminal::size().map(|(c, _)| c as usize).unwrap_or(80)
    }

    fn clear(&mut self) -> TermResult<()> {
        self.last_attr = None;
        queue!(self.out, Clear(ClearType::All))?;
        Ok(())
    }

    fn move_to(&mut self, row: usize, col: usize) -> TermResult<()> {
        queue!(self.out, cursor::MoveTo(col as u16, row as u16))?;
        Ok(())
    }

    fn put(&mut self, ch: char, attr: CellAttr) -> TermResult<()> {
        self.apply_attr(attr)?;
        queue!(self.out, Print(ch))?;
        Ok(())
    }

    fn write_raw(&mut self, bytes: &[u8]) -> TermResult<()> {
        self.out.write_all(bytes)?;
        Ok(())
    }

    fn flush(&mut self) -> TermResult<()> {
        self.out.flush()?;
        Ok(())
    }

    fn beep(&mut self) -> TermResult<()> {
        self.out.write_all(b"\x07")?;
        self.out.flush()?;
        Ok(())
    }

    fn read_input(&mut self, buf: &mut [u8]) -> usize {
        read_stdin_nonblocking(buf)
    }

    fn has_colors(&self) -> bool {
        self.colors_ok
    }

    fn supports_underline(&self) -> bool {
        self.underline_ok
    }
}

impl Drop for CrosstermDevice {
    fn drop(&mut self) {
        let _ = execute!(self.out, SetAttribute(Attribute::Reset), LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

#[cfg(unix)]
fn set_stdin_nonblocking() {
    unsafe {
        let flags = libc::fcntl(libc::STDIN_FILENO, libc::F_GETFL);
        if flags >= 0 {
            libc::fcntl(libc::STDIN_FILENO, libc::F_SETFL, flags | libc::O_NONBLOCK);
        }
    }
}

#[cfg(unix)]
fn read_stdin_nonblocking(buf: &mut [u8]) -> usize {
    let n = unsafe {
        libc::read(
            libc::STDIN_FILENO,
            buf.as_mut_ptr() as *mut libc::c_void,
            buf.len(),
        )
    };
    if n > 0 {
        n as usize
    } else {
        0
    }
}

#[cfg(not(unix))]
fn set_stdin_nonblocking() {}

#[cfg(not(unix))]
fn read_stdin_nonblocking(_buf: &mut [u8]) -> usize {
    0
}

const CAPTURE_DEFAULT_ATTR: CellAttr = CellAttr {
    color: TermColor::White,
    flags: AttrFlags::empty(),
};

/// In-memory device used by tests and print-only operation.
pub struct CaptureDevice {
    rows: usize,
    cols: usize,
    cur_row: usize,
    cur_col: usize,
    cells: Vec<(char, CellAttr)>,
    raw: Vec<u8>,
    input: VecDeque<u8>,
    pub clears: usize,
    pub flushes: usize,
    pub beeps: usize,
    underline_ok: bool,
}

impl CaptureDevice {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            rows,
            cols,
            cur_row: 0,
            cur_col: 0,
            cells: vec![(' ', CAPTURE_DEFAULT_ATTR); rows * cols],
            raw: Vec::new(),
            input: VecDeque::new(),
            clears: 0,
            flushes: 0,
            beeps: 0,
            underline_ok: true,
        }
    }

    pub fn without_underline(mut self) -> Self {
        self.underline_ok = false;
        self
    }

    /// Grow or shrink the simulated terminal.
    pub fn set_size(&mut self, cols: usize, rows: usize) {
        self.rows = rows;
        self.cols = cols;
        self.cells = vec![(' ', CAPTURE_DEFAULT_ATTR); rows * cols];
        self.cur_row = 0;
        self.cur_col = 0;
    }

    /// Queue bytes for `read_input` to return.
    pub fn push_input(&mut self, bytes: &[u8]) {
        self.input.extend(bytes.iter().copied());
    }

    pub fn cell(&self, row: usize, col: usize) -> (char, CellAttr) {
        self.cells[row * self.cols + col]
    }

    pub fn attr_at(&self, row: usize, col: usize) -> CellAttr {
        self.cell(row, col).1
    }

    /// The characters of one row as a string.
    pub fn row_text(&self, row: usize) -> String {
        (0..self.cols).map(|c| self.cell(row, c).0).collect()
    }

    /// Output position after the last `put`/`move_to`.
    pub fn cursor(&self) -> (usize, usize) {
        (self.cur_row, self.cur_col)
    }

    /// Raw escape bytes passed through `write_raw`.
    pub fn raw_output(&self) -> &[u8] {
        &self.raw
    }
}

impl TerminalDevice for CaptureDevice {
    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn clear(&mut self) -> TermResult<()> {
        self.cells.fill((' ', CAPTURE_DEFAULT_ATTR));
        self.cur_row = 0;
        self.cur_col = 0;
        self.clears += 1;
        Ok(())
    }

    fn move_to(&mut self, row: usize, col: usize) -> TermResult<()> {
        self.cur_row = row;
        self.cur_col = col;
        Ok(())
    }

    fn put(&mut self, ch: char, attr: CellAttr) -> TermResult<()> {
        if self.cur_row < self.rows && self.cur_col < self.cols {
            self.cells[self.cur_row * self.cols + self.cur_col] = (ch, attr);
        }
        self.cur_col += 1;
        if self.cur_col >= self.cols {
            self.cur_col = 0;
            self.cur_row += 1;
        }
        Ok(())
    }

    fn write_raw(&mut self, bytes: &[u8]) -> TermResult<()> {
        self.raw.extend_from_slice(bytes);
        Ok(())
    }

    fn flush(&mut self) -> TermResult<()> {
        self.flushes += 1;
        Ok(())
    }

    fn beep(&mut self) -> TermResult<()> {
        self.beeps += 1;
        Ok(())
    }

    fn read_input(&mut self, buf: &mut [u8]) -> usize {
        let mut n = 0;
        while n < buf.len() {
            match self.input.pop_front() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        n
    }

    fn supports_underline(&self) -> bool {
        self.underline_ok
    }
}

/// Decorator that traces device calls through the `log` facade.
pub struct DebugDevice<D: TerminalDevice> {
    inner: D,
}

impl<D: TerminalDevice> DebugDevice<D> {
    pub fn new(inner: D) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> D {
        self.inner
    }
}

impl<D: TerminalDevice> TerminalDevice for DebugDevice<D> {
    fn rows(&self) -> usize {
        self.inner.rows()
    }

    fn cols(&self) -> usize {
        self.inner.cols()
    }

    fn clear(&mut self) -> TermResult<()> {
        debug!("term: clear");
        self.inner.clear()
    }

    fn move_to(&mut self, row: usize, col: usize) -> TermResult<()> {
        debug!("term: move_to {},{}", row, col);
        self.inner.move_to(row, col)
    }

    fn put(&mut self, ch: char, attr: CellAttr) -> TermResult<()> {
        debug!("term: put {:?} {:?}", ch, attr.flags);
        self.inner.put(ch, attr)
    }

    fn write_raw(&mut self, bytes: &[u8]) -> TermResult<()> {
        debug!("term: write_raw {} bytes", bytes.len());
        self.inner.write_raw(bytes)
    }

    fn flush(&mut self) -> TermResult<()> {
        debug!("term: flush");
        self.inner.flush()
    }

    fn beep(&mut self) -> TermResult<()> {
        debug!("term: beep");
        self.inner.beep()
    }

    fn read_input(&mut self, buf: &mut [u8]) -> usize {
        let n = self.inner.read_input(buf);
        if n > 0 {
            debug!("term: read_input {} bytes", n);
        }
        n
    }

    fn has_colors(&self) -> bool {
        self.inner.has_colors()
    }

    fn supports_underline(&self) -> bool {
        self.inner.supports_underline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_put_advances_position() {
        let mut dev = CaptureDevice::new(4, 2);
        dev.move_to(0, 2).unwrap();
        dev.put('a', CAPTURE_DEFAULT_ATTR).unwrap();
        dev.put('b', CAPTURE_DEFAULT_ATTR).unwrap();
        // wrapped to the next row
        dev.put('c', CAPTURE_DEFAULT_ATTR).unwrap();
        assert_eq!(dev.row_text(0), "  ab");
        assert_eq!(dev.row_text(1), "c   ");
    }

    #[test]
    fn test_capture_input_replay() {
        let mut dev = CaptureDevice::new(80, 24);
        dev.push_input(b"\x1b1");
        let mut buf = [0u8; 8];
        assert_eq!(dev.read_input(&mut buf), 2);
        assert_eq!(&buf[..2], b"\x1b1");
        assert_eq!(dev.read_input(&mut buf), 0);
    }

    #[test]
    fn test_debug_decorator_forwards() {
        let mut dev = DebugDevice::new(CaptureDevice::new(10, 2));
        dev.move_to(1, 1).unwrap();
        dev.put('x', CAPTURE_DEFAULT_ATTR).unwrap();
        dev.beep().unwrap();
        let inner = dev.into_inner();
        assert_eq!(inner.row_text(1), " x        ");
        assert_eq!(inner.beeps, 1);
    }
}
