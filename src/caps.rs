//! Device capability probing
//!
//! The key map mixes a fixed vt100 table with sequences the device itself
//! reports for its function and editing keys. The original terminfo query
//! is modeled as the [`TermCaps`] trait so other terminal families can
//! plug in their own provider; the builtin [`XtermCaps`] covers the
//! xterm family (and close relatives) with its well-known sequences,
//! keyed off `$TERM`.

use std::env;

/// Capability provider: answers termcap-style queries for the device the
/// terminal layer is running on.
pub trait TermCaps {
    /// The byte sequence the device sends for the given termcap
    /// capability name (`"k1"`, `"kD"`, ...), or `None` if the device
    /// does not report one.
    fn sequence(&self, cap: &str) -> Option<Vec<u8>>;

    /// Whether the device supports the underline attribute. When it does
    /// not, underlined blanks are rendered as literal `_` characters.
    fn has_underline(&self) -> bool;

    /// String to emit at init to switch the keypad into transmit mode,
    /// if the device wants one.
    fn keypad_transmit(&self) -> Option<Vec<u8>> {
        None
    }

    /// True for the xterm emulator family, which understands the resize
    /// and font-change escapes emitted on column-mode switches.
    fn is_xterm(&self) -> bool {
        false
    }
}

/// Builtin capability table for the xterm family.
#[derive(Debug, Clone)]
pub struct XtermCaps {
    term: String,
}

impl XtermCaps {
    pub fn new(term: &str) -> Self {
        Self {
            term: term.to_string(),
        }
    }

    /// Build a provider from the `TERM` environment variable.
    pub fn from_env() -> Self {
        Self::new(&env::var("TERM").unwrap_or_default())
    }

    pub fn term(&self) -> &str {
        &self.term
    }
}

impl TermCaps for XtermCaps {
    fn sequence(&self, cap: &str) -> Option<Vec<u8>> {
        let seq: &[u8] = match cap {
            "cr" => b"\r",
            "@8" => b"\x1bOM",
            "kB" => b"\x1b[Z",
            "k1" => b"\x1bOP",
            "k2" => b"\x1bOQ",
            "k3" => b"\x1bOR",
            "k4" => b"\x1bOS",
            "k5" => b"\x1b[15~",
            "k6" => b"\x1b[17~",
            "k7" => b"\x1b[18~",
            "k8" => b"\x1b[19~",
            "k9" => b"\x1b[20~",
            "k;" => b"\x1b[21~",
            "F1" => b"\x1b[23~",
            "F2" => b"\x1b[24~",
            "F3" => b"\x1b[25~",
            "F4" => b"\x1b[26~",
            "F5" => b"\x1b[28~",
            "F6" => b"\x1b[29~",
            "F7" => b"\x1b[31~",
            "F8" => b"\x1b[32~",
            "F9" => b"\x1b[33~",
            "FA" => b"\x1b[34~",
            "kl" => b"\x1b[D",
            "kr" => b"\x1b[C",
            "ku" => b"\x1b[A",
            "kd" => b"\x1b[B",
            "kP" => b"\x1b[5~",
            "kN" => b"\x1b[6~",
            "kb" => b"\x7f",
            "kh" => b"\x1b[H",
            "@7" => b"\x1b[F",
            "kI" => b"\x1b[2~",
            "kD" => b"\x1b[3~",
            _ => return None,
        };
        Some(seq.to_vec())
    }

    fn has_underline(&self) -> bool {
        // The VGA console is the classic case without a usable underline
        // attribute; everything else in this family has "us".
        !(self.term.is_empty() || self.term == "dumb" || self.term == "linux")
    }

    fn keypad_transmit(&self) -> Option<Vec<u8>> {
        Some(b"\x1b[?1h\x1b=".to_vec())
    }

    fn is_xterm(&self) -> bool {
        self.term.starts_with("xterm")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xterm_detection() {
        assert!(XtermCaps::new("xterm").is_xterm());
        assert!(XtermCaps::new("xterm-5250").is_xterm());
        assert!(XtermCaps::new("xterm-color").is_xterm());
        assert!(!XtermCaps::new("vt220").is_xterm());
    }

    #[test]
    fn test_underline_probe() {
        assert!(XtermCaps::new("xterm").has_underline());
        assert!(!XtermCaps::new("linux").has_underline());
        assert!(!XtermCaps::new("").has_underline());
    }

    #[test]
    fn test_function_key_sequences() {
        let caps = XtermCaps::new("xterm");
        assert_eq!(caps.sequence("k1").unwrap(), b"\x1bOP".to_vec());
        assert_eq!(caps.sequence("kD").unwrap(), b"\x1b[3~".to_vec());
        assert!(caps.sequence("%9").is_none());
    }
}
