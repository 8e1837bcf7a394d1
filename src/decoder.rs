//! Raw keyboard byte stream to logical key decoding
//!
//! The physical keyboard delivers an ambiguous byte stream: control
//! characters, multi-byte escape sequences and capability strings, where
//! one valid sequence can be a strict prefix of another (ESC alone vs
//! ESC '1'). The decoder keeps a bounded pending buffer and re-scans the
//! whole mapping table on every poll:
//!
//! - a *complete* match means some entry equals the buffer's leading
//!   bytes;
//! - an *incomplete* match means the entire buffer is a strict prefix of
//!   some entry, so more bytes could still disambiguate.
//!
//! Any incomplete match defers the decision, even when a complete match
//! was also found. With no match of either kind the leading byte is
//! delivered raw and matching restarts on the remainder. The table is
//! small (about 90 entries), so a per-poll scan beats building a DFA.

use log::debug;

use crate::caps::TermCaps;
use crate::device::TerminalDevice;
use crate::keys::{KeyCode, CAP_KEYS, CTRL_G, ESC, QUIT_BYTE, VT100_KEYS};

/// Upper bound on both pending input and any single mapped sequence.
pub const MAX_PENDING: usize = 20;

/// One byte sequence paired with the logical key it produces.
#[derive(Debug, Clone)]
pub struct KeyMapEntry {
    pub code: KeyCode,
    pub seq: Vec<u8>,
}

/// The byte-sequence to key-code mapping table.
#[derive(Debug, Clone, Default)]
pub struct KeyMap {
    entries: Vec<KeyMapEntry>,
}

impl KeyMap {
    /// Build the full table for a device: capability-derived sequences
    /// first, then the fixed vt100 table, then a Ctrl-G introduced copy
    /// of every ESC-introduced entry, and finally the two insert-key
    /// aging exceptions which depend on the device's delete sequence.
    pub fn build(caps: &dyn TermCaps) -> Self {
        let mut map = KeyMap::default();
        for (code, cap) in CAP_KEYS {
            if let Some(seq) = caps.sequence(cap) {
                debug!("keymap: cap '{}' -> {:?}", cap, seq);
                map.push(*code, seq);
            }
        }
        for (code, seq) in VT100_KEYS {
            map.push(*code, seq.to_vec());
        }
        for (code, seq) in VT100_KEYS {
            if seq[0] == ESC {
                let mut alt = seq.to_vec();
                alt[0] = CTRL_G;
                map.push(*code, alt);
            }
        }
        map.splice_insert_aging(caps);
        map
    }

    fn push(&mut self, code: KeyCode, seq: Vec<u8>) {
        if !seq.is_empty() && seq.len() <= MAX_PENDING {
            self.entries.push(KeyMapEntry { code, seq });
        }
    }

    /// The insert key can be aged via ESC (or Ctrl-G) followed by the
    /// device's delete sequence. That sequence is only known at runtime,
    /// so these two entries are appended after the static tables.
    fn splice_insert_aging(&mut self, caps: &dyn TermCaps) {
        if let Some(kd) = caps.sequence("kD") {
            for introducer in [ESC, CTRL_G] {
                let mut seq = Vec::with_capacity(kd.len() + 1);
                seq.push(introducer);
                seq.extend_from_slice(&kd);
                self.push(KeyCode::Insert, seq);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entries(&self) -> &[KeyMapEntry] {
        &self.entries
    }
}

enum Scan {
    /// No entry matches the buffer prefix at all.
    NoMatch,
    /// At least one entry needs more bytes to disambiguate.
    Incomplete,
    /// An entry's full sequence equals the buffer's leading bytes.
    Complete { code: KeyCode, len: usize },
}

/// Incremental, non-blocking decoder with a bounded pending buffer.
pub struct KeyDecoder {
    map: KeyMap,
    buf: [u8; MAX_PENDING],
    len: usize,
    quit: bool,
}

impl KeyDecoder {
    pub fn new(map: KeyMap) -> Self {
        Self {
            map,
            buf: [0; MAX_PENDING],
            len: 0,
            quit: false,
        }
    }

    /// True once the quit byte (Ctrl-Q) has been seen; key processing is
    /// over for the session.
    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    /// Bytes currently held back waiting for disambiguation.
    pub fn pending(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Append raw bytes to the pending buffer, up to capacity. Returns
    /// how many were taken.
    pub fn feed(&mut self, bytes: &[u8]) -> usize {
        let room = MAX_PENDING - self.len;
        let n = room.min(bytes.len());
        self.buf[self.len..self.len + n].copy_from_slice(&bytes[..n]);
        self.len += n;
        n
    }

    /// Drain whatever the device has ready, then classify. Called once
    /// per event-loop iteration; returns at most one key.
    pub fn poll(&mut self, dev: &mut dyn TerminalDevice) -> Option<KeyCode> {
        loop {
            if self.len >= MAX_PENDING {
                break;
            }
            let mut chunk = [0u8; MAX_PENDING];
            let room = MAX_PENDING - self.len;
            let n = dev.read_input(&mut chunk[..room]);
            if n == 0 {
                break;
            }
            for &b in &chunk[..n] {
                debug!("getkey: received 0x{:02X}", b);
            }
            self.feed(&chunk[..n]);
        }
        self.next_key()
    }

    /// Classify the current buffer contents; consumes matched bytes.
    pub fn next_key(&mut self) -> Option<KeyCode> {
        if self.len == 0 {
            return None;
        }
        let key = match self.scan() {
            Scan::Incomplete => {
                // A full buffer that still defers can never resolve;
                // force out the oldest byte so the stream cannot starve.
                if self.len >= MAX_PENDING {
                    debug!("getkey: pending buffer full, evicting oldest byte");
                    let b = self.consume_raw();
                    Some(KeyCode::Char(b))
                } else {
                    None
                }
            }
            Scan::Complete { code, len } => {
                self.consume(len);
                Some(code)
            }
            Scan::NoMatch => {
                let b = self.consume_raw();
                Some(KeyCode::Char(b))
            }
        };
        match key {
            Some(KeyCode::Char(QUIT_BYTE)) => {
                self.quit = true;
                None
            }
            // Linefeed arrives for the Enter key on some terminals.
            Some(KeyCode::Char(0x0a)) | Some(KeyCode::Char(0x0d)) => Some(KeyCode::Enter),
            other => other,
        }
    }

    fn scan(&self) -> Scan {
        let buf = &self.buf[..self.len];
        let mut complete: Option<(KeyCode, usize)> = None;
        let mut incomplete = false;

        for entry in self.map.entries() {
            let seq = &entry.seq;
            if seq.len() <= buf.len() {
                if buf[..seq.len()] == seq[..] && complete.is_none() {
                    complete = Some((entry.code, seq.len()));
                }
            } else if seq[..buf.len()] == buf[..] {
                debug!("getkey: incomplete match {:?}", seq);
                incomplete = true;
            }
        }

        if incomplete {
            Scan::Incomplete
        } else if let Some((code, len)) = complete {
            Scan::Complete { code, len }
        } else {
            Scan::NoMatch
        }
    }

    fn consume(&mut self, n: usize) {
        self.buf.copy_within(n..self.len, 0);
        self.len -= n;
    }

    fn consume_raw(&mut self) -> u8 {
        let b = self.buf[0];
        self.consume(1);
        b
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::XtermCaps;

    fn decoder() -> KeyDecoder {
        KeyDecoder::new(KeyMap::build(&XtermCaps::new("xterm")))
    }

    #[test]
    fn test_esc_digit_decodes_f1() {
        let mut d = decoder();
        d.feed(&[0x1b, 0x31]);
        assert_eq!(d.next_key(), Some(KeyCode::F1));
        assert!(d.pending().is_empty());
    }

    #[test]
    fn test_lone_esc_defers_then_completes() {
        let mut d = decoder();
        d.feed(&[0x1b]);
        assert_eq!(d.next_key(), None);
        assert_eq!(d.pending(), &[0x1b]);
        d.feed(&[0x31]);
        assert_eq!(d.next_key(), Some(KeyCode::F1));
        assert!(d.pending().is_empty());
    }

    #[test]
    fn test_unmatched_byte_returns_raw() {
        let mut d = decoder();
        d.feed(&[0x41]);
        assert_eq!(d.next_key(), Some(KeyCode::Char(0x41)));
        assert!(d.pending().is_empty());
    }

    #[test]
    fn test_capability_sequence_decodes() {
        let mut d = decoder();
        d.feed(b"\x1bOP");
        assert_eq!(d.next_key(), Some(KeyCode::F1));
    }

    #[test]
    fn test_broken_sequence_restarts_on_remainder() {
        let mut d = decoder();
        // ESC 'q' matches nothing: ESC comes back raw, then 'q'.
        d.feed(b"\x1bq");
        assert_eq!(d.next_key(), Some(KeyCode::Char(0x1b)));
        assert_eq!(d.next_key(), Some(KeyCode::Char(b'q')));
        assert_eq!(d.next_key(), None);
    }

    #[test]
    fn test_ctrl_g_introducer() {
        let mut d = decoder();
        d.feed(&[CTRL_G, b'1']);
        assert_eq!(d.next_key(), Some(KeyCode::F1));
    }

    #[test]
    fn test_ctrl_string() {
        let mut d = decoder();
        d.feed(&[0x01]);
        assert_eq!(d.next_key(), Some(KeyCode::Attention));
    }

    #[test]
    fn test_insert_aging_exception() {
        let mut d = decoder();
        // ESC + device delete sequence ages the insert key.
        d.feed(b"\x1b\x1b[3~");
        assert_eq!(d.next_key(), Some(KeyCode::Insert));
        d.feed(b"\x07\x1b[3~");
        assert_eq!(d.next_key(), Some(KeyCode::Insert));
    }

    #[test]
    fn test_delete_sequence() {
        let mut d = decoder();
        d.feed(b"\x1b[3~");
        assert_eq!(d.next_key(), Some(KeyCode::Delete));
    }

    #[test]
    fn test_quit_byte_sets_flag() {
        let mut d = decoder();
        d.feed(&[QUIT_BYTE]);
        assert_eq!(d.next_key(), None);
        assert!(d.quit_requested());
    }

    #[test]
    fn test_linefeed_normalizes_to_enter() {
        let mut d = decoder();
        d.feed(&[0x0a]);
        assert_eq!(d.next_key(), Some(KeyCode::Enter));
        d.feed(&[0x0d]);
        assert_eq!(d.next_key(), Some(KeyCode::Enter));
    }

    #[test]
    fn test_full_buffer_makes_progress() {
        let mut d = decoder();
        let mut stream = vec![0x1b, b'['];
        stream.extend(std::iter::repeat(b'9').take(MAX_PENDING));
        let taken = d.feed(&stream);
        assert_eq!(taken, MAX_PENDING);
        // \E[99... breaks every candidate, so the introducer comes back
        // raw and the buffer drains instead of starving.
        assert_eq!(d.next_key(), Some(KeyCode::Char(0x1b)));
        assert!(d.pending().len() < MAX_PENDING);
    }

    #[test]
    fn test_poll_drains_device() {
        use crate::device::CaptureDevice;
        let mut d = decoder();
        let mut dev = CaptureDevice::new(80, 24);
        dev.push_input(b"\x1b2");
        assert_eq!(d.poll(&mut dev), Some(KeyCode::F2));
        assert_eq!(d.poll(&mut dev), None);
    }

    #[test]
    fn test_keymap_has_expected_shape() {
        let map = KeyMap::build(&XtermCaps::new("xterm"));
        // caps (34 resolvable) + vt100 (60) + ctrl-g copies (43) + 2
        assert!(map.len() > 90, "len = {}", map.len());
        assert!(!map.is_empty());
    }
}
