//! Terminal configuration surface
//!
//! Options recognized by the terminal layer. Parsing a configuration file
//! is the caller's business; this layer only consumes the resolved values.
//! The structs carry serde derives so callers can embed them in whatever
//! session-profile format they use.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// An RGB triple used for per-color palette overrides. Overrides are
/// resolved to the nearest of the 8 fixed terminal colors plus a
/// bold/normal intensity choice; see [`crate::attrs::rgb_to_color`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Print-screen page options, used by the PostScript exporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintConfig {
    /// Command the generated PostScript is piped to.
    pub output_command: String,
    /// Page width in points.
    pub page_width: f64,
    /// Page length in points.
    pub page_length: f64,
    /// Left margin in points.
    pub left_margin: i32,
    /// Top margin in points.
    pub top_margin: i32,
    /// Font size used for 80-column screens.
    pub font_size_80: f64,
    /// Font size used for 132-column screens.
    pub font_size_132: f64,
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            output_command: "lpr".to_string(),
            page_width: 8.5 * 72.0,
            page_length: 11.0 * 72.0,
            left_margin: 18,
            top_margin: 36,
            font_size_80: 10.0,
            font_size_132: 7.0,
        }
    }
}

impl PrintConfig {
    /// Font size for a screen of the given column count.
    pub fn font_size_for_width(&self, width: usize) -> f64 {
        if width == 132 {
            self.font_size_132
        } else {
            self.font_size_80
        }
    }
}

/// Options recognized by the terminal interface layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TermConfig {
    /// Force underline-as-underscore rendering. `None` defers to the
    /// capability probe at terminal init.
    pub underscores: Option<bool>,
    /// Enable the cursor-tracking ruler overlay.
    pub ruler: bool,
    /// Rewrite the palette to black text on a white background.
    pub black_on_white: bool,
    /// Rewrite the palette to white text on a black background.
    pub white_on_black: bool,
    /// Per-color RGB overrides, keyed by screen color name
    /// ("green", "white", "red", "turquoise", "yellow", "pink", "blue",
    /// "black").
    pub colors: HashMap<String, Rgb>,
    /// Route the print-screen key to the local exporter instead of
    /// delivering it to the session layer.
    pub local_print_key: bool,
    /// xterm font for 80-column mode (bare font string, without the OSC
    /// wrapper).
    pub font_80: Option<String>,
    /// xterm font for 132-column mode.
    pub font_132: Option<String>,
    /// Number of geometry re-checks after a column-mode switch.
    pub resize_retries: u32,
    /// Delay between geometry re-checks, in milliseconds.
    pub resize_wait_ms: u64,
    /// Print-screen page options.
    pub print: PrintConfig,
}

impl Default for TermConfig {
    fn default() -> Self {
        Self {
            underscores: None,
            ruler: false,
            black_on_white: false,
            white_on_black: false,
            colors: HashMap::new(),
            local_print_key: false,
            font_80: None,
            font_132: None,
            resize_retries: 10,
            resize_wait_ms: 10,
            print: PrintConfig::default(),
        }
    }
}

impl TermConfig {
    /// Both xterm fonts, each wrapped in the OSC 50 escape the emulator
    /// understands, or `None` when no font pair was configured.
    pub fn font_escapes(&self) -> Option<(Vec<u8>, Vec<u8>)> {
        match (&self.font_80, &self.font_132) {
            (Some(f80), Some(f132)) => Some((
                format!("\x1b]50;{}\x07", f80).into_bytes(),
                format!("\x1b]50;{}\x07", f132).into_bytes(),
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_print_conventions() {
        let cfg = PrintConfig::default();
        assert_eq!(cfg.output_command, "lpr");
        assert_eq!(cfg.page_width, 612.0);
        assert_eq!(cfg.page_length, 792.0);
        assert_eq!(cfg.font_size_for_width(132), 7.0);
        assert_eq!(cfg.font_size_for_width(80), 10.0);
    }

    #[test]
    fn test_font_escape_wrapping() {
        let cfg = TermConfig {
            font_80: Some("6x13".to_string()),
            font_132: Some("5x8".to_string()),
            ..TermConfig::default()
        };
        let (f80, f132) = cfg.font_escapes().unwrap();
        assert_eq!(f80, b"\x1b]50;6x13\x07".to_vec());
        assert_eq!(f132, b"\x1b]50;5x8\x07".to_vec());
        assert!(TermConfig::default().font_escapes().is_none());
    }

    #[test]
    fn test_config_round_trips_through_serde() {
        let mut cfg = TermConfig::default();
        cfg.ruler = true;
        cfg.colors
            .insert("green".to_string(), Rgb { r: 0, g: 255, b: 0 });
        let json = serde_json::to_string(&cfg).unwrap();
        let back: TermConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }
}
