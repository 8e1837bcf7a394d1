//! Screen rendering: cell loop, ruler overlay, status line, resize
//!
//! The session layer pushes a full snapshot on every host update; the
//! renderer walks it in row-major order and paints each cell through the
//! attribute table. The only state it keeps between calls is the last
//! rendered geometry, used to detect 80<->132 column switches.

use std::thread;
use std::time::Duration;

use log::debug;

use crate::attrs::{AttrFlags, AttributeTable, CellAttr, TermColor};
use crate::caps::TermCaps;
use crate::config::TermConfig;
use crate::device::TerminalDevice;
use crate::display::{
    is_attribute_byte, DisplayView, IND_FER, IND_INHIBIT, IND_INSERT, IND_MACRO,
    IND_MESSAGE_WAITING, IND_X_CLOCK, IND_X_SYSTEM,
};
use crate::error::TermResult;

/// Data byte rendered as a blank cell with reverse video toggled. The
/// other sentinel, 0x3F, carries the attribute bit pattern and is
/// already handled as attribute code 31.
const SENTINEL_BLOCK: u8 = 0x1f;

/// Width of the status line buffer, fixed regardless of screen width.
const STATUS_WIDTH: usize = 80;

/// Renders snapshots onto a [`TerminalDevice`].
pub struct ScreenRenderer {
    attrs: AttributeTable,
    ruler: bool,
    underscores: bool,
    is_xterm: bool,
    fonts: Option<(Vec<u8>, Vec<u8>)>,
    resize_retries: u32,
    resize_wait: Duration,
    last_width: usize,
    last_height: usize,
}

impl ScreenRenderer {
    pub fn new(attrs: AttributeTable, config: &TermConfig, caps: &dyn TermCaps) -> Self {
        Self {
            attrs,
            ruler: config.ruler,
            underscores: config.underscores.unwrap_or(!caps.has_underline()),
            is_xterm: caps.is_xterm(),
            fonts: config.font_escapes(),
            resize_retries: config.resize_retries,
            resize_wait: Duration::from_millis(config.resize_wait_ms),
            last_width: 0,
            last_height: 0,
        }
    }

    /// Replace the option-derived settings, keeping the geometry state.
    pub fn configure(&mut self, config: &TermConfig, caps: &dyn TermCaps) {
        self.ruler = config.ruler;
        self.underscores = config.underscores.unwrap_or(!caps.has_underline());
        self.fonts = config.font_escapes();
        self.resize_retries = config.resize_retries;
        self.resize_wait = Duration::from_millis(config.resize_wait_ms);
    }

    pub fn ruler_enabled(&self) -> bool {
        self.ruler
    }

    pub fn set_ruler(&mut self, on: bool) {
        self.ruler = on;
    }

    /// Paint the whole snapshot, park the cursor, and redraw the status
    /// line. This is the one entry point the session layer calls after
    /// every host update.
    pub fn render<D: TerminalDevice + ?Sized>(
        &mut self,
        dev: &mut D,
        view: &dyn DisplayView,
    ) -> TermResult<()> {
        self.sync_geometry(dev, view)?;

        let underline_ok = dev.supports_underline();
        let max_rows = dev.rows();
        // The in-effect attribute persists until the next attribute byte;
        // before the first one the base attribute applies.
        let mut attr_code = 0u8;

        for y in 0..view.height() {
            if y >= max_rows {
                break;
            }
            dev.move_to(y, 0)?;
            for x in 0..view.width() {
                let c = view.char_at(y, x);
                if is_attribute_byte(c) {
                    attr_code = c - 0x20;
                    dev.put(' ', self.ruled(view, x, y, self.attrs.base()))?;
                    continue;
                }
                let mut attr = self.attrs.get(attr_code);
                if attr.is_nondisplay() {
                    dev.put(' ', self.ruled(view, x, y, self.attrs.base()))?;
                    continue;
                }
                let mut ch;
                if c == SENTINEL_BLOCK {
                    ch = ' ';
                    attr.flags.toggle(AttrFlags::REVERSE);
                } else if (c > 0x00 && c < 0x40) || c == 0xff {
                    ch = ' ';
                } else if c == 0x00 {
                    ch = ' ';
                } else {
                    ch = view.to_local(c);
                }
                // The protocol reuses one bit as "column separator" in
                // one attribute group; the terminal has no vertical-line
                // glyph attribute, so it renders as underline.
                if attr.flags.contains(AttrFlags::VERTICAL) {
                    attr.flags.remove(AttrFlags::VERTICAL);
                    attr.flags.insert(AttrFlags::UNDERLINE);
                }
                // Terminals without a usable underline attribute show
                // underlined blanks as literal underscores instead.
                if (self.underscores || !underline_ok)
                    && attr.flags.contains(AttrFlags::UNDERLINE)
                {
                    attr.flags.remove(AttrFlags::UNDERLINE);
                    if ch == ' ' {
                        ch = '_';
                    }
                }
                dev.put(ch, self.ruled(view, x, y, attr))?;
            }
        }

        dev.move_to(view.cursor_y(), view.cursor_x())?;
        self.render_indicators(dev, view)
    }

    /// Redraw only the status line (indicator changes without a screen
    /// update). Re-homes the cursor and flushes.
    pub fn render_indicators<D: TerminalDevice + ?Sized>(
        &self,
        dev: &mut D,
        view: &dyn DisplayView,
    ) -> TermResult<()> {
        let line = format_status_line(view);
        let attr = CellAttr {
            color: TermColor::White,
            flags: AttrFlags::empty(),
        };
        dev.move_to(view.height(), 0)?;
        for &b in line.iter() {
            dev.put(b as char, attr)?;
        }
        dev.move_to(view.cursor_y(), view.cursor_x())?;
        dev.flush()
    }

    /// Apply the ruler overlay: cells on the cursor's row or column get
    /// reverse video toggled onto their computed attribute.
    fn ruled(&self, view: &dyn DisplayView, x: usize, y: usize, mut attr: CellAttr) -> CellAttr {
        if self.ruler && (x == view.cursor_x() || y == view.cursor_y()) {
            attr.flags.toggle(AttrFlags::REVERSE);
        }
        attr
    }

    /// Handle a column-mode switch: clear, ask an xterm to change font
    /// and resize itself, then give the terminal driver a bounded amount
    /// of time to catch up before painting into the new geometry.
    fn sync_geometry<D: TerminalDevice + ?Sized>(
        &mut self,
        dev: &mut D,
        view: &dyn DisplayView,
    ) -> TermResult<()> {
        let (w, h) = (view.width(), view.height());
        if self.last_width == w && self.last_height == h {
            return Ok(());
        }
        debug!("term: geometry change {}x{} -> {}x{}", self.last_width, self.last_height, w, h);
        dev.clear()?;
        if self.is_xterm {
            if let Some((font_80, font_132)) = &self.fonts {
                dev.write_raw(if w > 100 { font_132 } else { font_80 })?;
            }
            dev.write_raw(format!("\x1b[8;{};{}t", h + 1, w).as_bytes())?;
            dev.flush()?;
        }
        self.last_width = w;
        self.last_height = h;

        // The emulator resizes asynchronously; poll the reported
        // geometry for a bounded budget and then proceed with whatever
        // we have.
        for _ in 0..self.resize_retries {
            if dev.cols() == w {
                break;
            }
            thread::sleep(self.resize_wait);
        }
        Ok(())
    }
}

/// Compose the fixed-format status line: 80 space-padded bytes with the
/// product tag, keyboard-inhibit state, indicator flags, macro substate
/// and the 1-based cursor position.
pub fn format_status_line(view: &dyn DisplayView) -> [u8; STATUS_WIDTH] {
    let mut buf = [b' '; STATUS_WIDTH];
    let inds = view.indicators();

    buf[0..4].copy_from_slice(b"5250");
    if inds & IND_MESSAGE_WAITING != 0 {
        buf[23..25].copy_from_slice(b"MW");
    }
    if inds & IND_INHIBIT != 0 {
        buf[9..13].copy_from_slice(b"X II");
    } else if inds & IND_X_CLOCK != 0 {
        buf[9..16].copy_from_slice(b"X CLOCK");
    } else if inds & IND_X_SYSTEM != 0 {
        buf[9..17].copy_from_slice(b"X SYSTEM");
    }
    if inds & IND_INSERT != 0 {
        buf[30..32].copy_from_slice(b"IM");
    }
    if inds & IND_FER != 0 {
        buf[33..36].copy_from_slice(b"FER");
    }
    if inds & IND_MACRO != 0 {
        buf[54..65].copy_from_slice(&view.macro_substate());
    }
    let pos = format!("{:03}/{:03}", view.cursor_x() + 1, view.cursor_y() + 1);
    buf[72..72 + pos.len()].copy_from_slice(pos.as_bytes());
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::XtermCaps;
    use crate::device::CaptureDevice;
    use crate::display::ScreenBuffer;

    fn renderer(config: &TermConfig) -> ScreenRenderer {
        ScreenRenderer::new(AttributeTable::default(), config, &XtermCaps::new("xterm"))
    }

    fn quiet_config() -> TermConfig {
        TermConfig {
            resize_retries: 0,
            ..TermConfig::default()
        }
    }

    #[test]
    fn test_blank_screen_renders_base_attribute() {
        let mut r = renderer(&quiet_config());
        let mut dev = CaptureDevice::new(80, 25);
        let buf = ScreenBuffer::new(80, 24);
        r.render(&mut dev, &buf).unwrap();
        let base = AttributeTable::default().base();
        for x in [0usize, 10, 79] {
            let (ch, attr) = dev.cell(3, x);
            assert_eq!(ch, ' ');
            assert_eq!(attr, base);
        }
    }

    #[test]
    fn test_attribute_byte_cell_is_blank_base() {
        let mut r = renderer(&quiet_config());
        let mut dev = CaptureDevice::new(80, 25);
        let mut buf = ScreenBuffer::new(80, 24);
        buf.set_attr(0, 0, 2); // white
        buf.put_str(0, 1, "HI");
        r.render(&mut dev, &buf).unwrap();
        let table = AttributeTable::default();
        assert_eq!(dev.cell(0, 0), (' ', table.base()));
        assert_eq!(dev.cell(0, 1).0, 'H');
        assert_eq!(dev.cell(0, 1).1, table.get(2));
        assert_eq!(dev.cell(0, 2).0, 'I');
    }

    #[test]
    fn test_nondisplay_hides_data() {
        let mut r = renderer(&quiet_config());
        let mut dev = CaptureDevice::new(80, 25);
        let mut buf = ScreenBuffer::new(80, 24);
        buf.set_attr(5, 0, 7); // reserved, non-display
        buf.put_str(5, 1, "SECRET");
        r.render(&mut dev, &buf).unwrap();
        for x in 1..7 {
            assert_eq!(dev.cell(5, x).0, ' ');
            assert_eq!(dev.cell(5, x).1, AttributeTable::default().base());
        }
    }

    #[test]
    fn test_sentinel_bytes_toggle_reverse() {
        let mut r = renderer(&quiet_config());
        let mut dev = CaptureDevice::new(80, 25);
        let mut buf = ScreenBuffer::new(80, 24);
        buf.set_byte(0, 0, 0x1f);
        buf.set_byte(0, 1, 0x3f);
        r.render(&mut dev, &buf).unwrap();
        let (ch, attr) = dev.cell(0, 0);
        assert_eq!(ch, ' ');
        assert!(attr.flags.contains(AttrFlags::REVERSE));
        // 0x3f carries the attribute bit pattern (code 31, reserved),
        // so it renders as a blank attribute cell, not a sentinel.
        let (ch, attr) = dev.cell(0, 1);
        assert_eq!(ch, ' ');
        assert_eq!(attr, AttributeTable::default().base());
    }

    #[test]
    fn test_vertical_line_becomes_underline() {
        let mut r = renderer(&quiet_config());
        let mut dev = CaptureDevice::new(80, 25);
        let mut buf = ScreenBuffer::new(80, 24);
        buf.set_attr(0, 0, 16); // turquoise + column separator
        buf.put_str(0, 1, "A");
        r.render(&mut dev, &buf).unwrap();
        let attr = dev.cell(0, 1).1;
        assert!(attr.flags.contains(AttrFlags::UNDERLINE));
        assert!(!attr.flags.contains(AttrFlags::VERTICAL));
    }

    #[test]
    fn test_underscore_fallback_substitutes_blanks() {
        let config = TermConfig {
            underscores: Some(true),
            ..quiet_config()
        };
        let mut r = renderer(&config);
        let mut dev = CaptureDevice::new(80, 25);
        let mut buf = ScreenBuffer::new(80, 24);
        buf.set_attr(0, 0, 4); // green underline
        buf.put_str(0, 1, "A ");
        r.render(&mut dev, &buf).unwrap();
        let (ch_a, attr_a) = dev.cell(0, 1);
        assert_eq!(ch_a, 'A');
        assert!(!attr_a.flags.contains(AttrFlags::UNDERLINE));
        // blank under an underlined field becomes a literal underscore
        assert_eq!(dev.cell(0, 2).0, '_');
    }

    #[test]
    fn test_ruler_toggles_reverse_on_cursor_cross() {
        let config = TermConfig {
            ruler: true,
            ..quiet_config()
        };
        let mut r = renderer(&config);
        let mut dev = CaptureDevice::new(80, 25);
        let mut buf = ScreenBuffer::new(80, 24);
        buf.set_cursor(3, 7);
        r.render(&mut dev, &buf).unwrap();
        for x in 0..80 {
            assert!(
                dev.attr_at(3, x).flags.contains(AttrFlags::REVERSE),
                "row 3 col {}",
                x
            );
        }
        for y in 0..24 {
            assert!(
                dev.attr_at(y, 7).flags.contains(AttrFlags::REVERSE),
                "col 7 row {}",
                y
            );
        }
        assert!(!dev.attr_at(0, 0).flags.contains(AttrFlags::REVERSE));
    }

    #[test]
    fn test_second_render_skips_resize_handling() {
        let mut r = renderer(&quiet_config());
        let mut dev = CaptureDevice::new(80, 25);
        let buf = ScreenBuffer::new(80, 24);
        r.render(&mut dev, &buf).unwrap();
        let clears_after_first = dev.clears;
        r.render(&mut dev, &buf).unwrap();
        assert_eq!(dev.clears, clears_after_first);
    }

    #[test]
    fn test_column_switch_emits_xterm_escapes() {
        let config = TermConfig {
            font_80: Some("f80".to_string()),
            font_132: Some("f132".to_string()),
            ..quiet_config()
        };
        let mut r = renderer(&config);
        let mut dev = CaptureDevice::new(132, 28);
        let buf = ScreenBuffer::new(132, 27);
        r.render(&mut dev, &buf).unwrap();
        let raw = dev.raw_output().to_vec();
        let raw_str = String::from_utf8_lossy(&raw);
        assert!(raw_str.contains("\x1b]50;f132\x07"));
        assert!(raw_str.contains("\x1b[8;28;132t"));
    }

    #[test]
    fn test_status_line_insert_and_cursor() {
        let mut buf = ScreenBuffer::new(80, 24);
        buf.set_indicators(IND_INSERT);
        buf.set_cursor(5, 10);
        let line = format_status_line(&buf);
        assert_eq!(&line[30..32], b"IM");
        assert_eq!(&line[72..79], b"011/006");
        assert_eq!(&line[0..4], b"5250");
        // all other indicator regions stay blank
        assert_eq!(&line[9..17], b"        ");
        assert_eq!(&line[23..25], b"  ");
        assert_eq!(&line[33..36], b"   ");
    }

    #[test]
    fn test_status_line_inhibit_priority() {
        let mut buf = ScreenBuffer::new(80, 24);
        buf.set_indicators(IND_INHIBIT | IND_X_CLOCK | IND_X_SYSTEM);
        let line = format_status_line(&buf);
        assert_eq!(&line[9..13], b"X II");

        buf.set_indicators(IND_X_CLOCK | IND_X_SYSTEM);
        let line = format_status_line(&buf);
        assert_eq!(&line[9..16], b"X CLOCK");

        buf.set_indicators(IND_X_SYSTEM);
        let line = format_status_line(&buf);
        assert_eq!(&line[9..17], b"X SYSTEM");
    }

    #[test]
    fn test_status_line_macro_substate() {
        let mut buf = ScreenBuffer::new(80, 24);
        buf.set_indicators(IND_MACRO);
        buf.set_macro_substate(*b"R 01   0022");
        let line = format_status_line(&buf);
        assert_eq!(&line[54..65], b"R 01   0022");
    }

    #[test]
    fn test_cursor_parked_after_render() {
        let mut r = renderer(&quiet_config());
        let mut dev = CaptureDevice::new(80, 25);
        let mut buf = ScreenBuffer::new(80, 24);
        buf.set_cursor(6, 40);
        r.render(&mut dev, &buf).unwrap();
        assert_eq!(dev.cursor(), (6, 40));
        assert!(dev.flushes >= 1);
    }
}
