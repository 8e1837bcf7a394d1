//! 5250 attribute codes and their terminal presentation
//!
//! The protocol tags screen cells with a 6-bit attribute code (32 values
//! in 4 groups of 8). This module maps those codes to presentation
//! attributes: one of 8 terminal colors with a bold/normal intensity
//! choice, plus underline, reverse, blink, the column-separator
//! "vertical line" bit, and non-display. The table is built once from a
//! configurable palette and passed by reference to the renderer and the
//! print-screen exporter; there is no process-wide mutable state.

use std::collections::HashMap;

use bitflags::bitflags;

use crate::config::{Rgb, TermConfig};

bitflags! {
    /// Presentation attribute bits for a screen cell.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AttrFlags: u8 {
        const BOLD = 0x01;
        const UNDERLINE = 0x02;
        const REVERSE = 0x04;
        const BLINK = 0x08;
        /// Column-separator bit. The physical terminal has no vertical
        /// line glyph attribute, so rendering turns this into underline.
        const VERTICAL = 0x10;
        /// Cells under this attribute never show their data byte.
        const NONDISPLAY = 0x20;
    }
}

/// The 8 colors every character-cell terminal can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

/// The 5250 screen color names, as they appear in the attribute groups
/// and in the configuration surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Pink,
    Turquoise,
    White,
}

impl ScreenColor {
    pub const ALL: [ScreenColor; 8] = [
        ScreenColor::Black,
        ScreenColor::Red,
        ScreenColor::Green,
        ScreenColor::Yellow,
        ScreenColor::Blue,
        ScreenColor::Pink,
        ScreenColor::Turquoise,
        ScreenColor::White,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ScreenColor::Black => "black",
            ScreenColor::Red => "red",
            ScreenColor::Green => "green",
            ScreenColor::Yellow => "yellow",
            ScreenColor::Blue => "blue",
            ScreenColor::Pink => "pink",
            ScreenColor::Turquoise => "turquoise",
            ScreenColor::White => "white",
        }
    }

    fn index(self) -> usize {
        match self {
            ScreenColor::Black => 0,
            ScreenColor::Red => 1,
            ScreenColor::Green => 2,
            ScreenColor::Yellow => 3,
            ScreenColor::Blue => 4,
            ScreenColor::Pink => 5,
            ScreenColor::Turquoise => 6,
            ScreenColor::White => 7,
        }
    }
}

/// Resolved presentation of one screen color: a terminal color and
/// whether it renders at bold intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteEntry {
    pub color: TermColor,
    pub bold: bool,
}

/// Maps the 8 screen colors to terminal colors. Blue maps to bold cyan
/// by default because plain blue is unreadable on most displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: [PaletteEntry; 8],
}

impl Default for Palette {
    fn default() -> Self {
        let e = |color, bold| PaletteEntry { color, bold };
        Self {
            entries: [
                e(TermColor::Black, false),   // black
                e(TermColor::Red, true),      // red
                e(TermColor::Green, false),   // green
                e(TermColor::Yellow, true),   // yellow
                e(TermColor::Cyan, true),     // blue
                e(TermColor::Magenta, false), // pink
                e(TermColor::Cyan, false),    // turquoise
                e(TermColor::White, true),    // white
            ],
        }
    }
}

impl Palette {
    /// Build a palette from the configuration: monochrome rewrites first,
    /// then per-color RGB overrides resolved to the nearest terminal
    /// color.
    pub fn from_config(config: &TermConfig) -> Self {
        let mut palette = Palette::default();
        if config.black_on_white {
            for sc in ScreenColor::ALL {
                palette.set(
                    sc,
                    PaletteEntry {
                        color: TermColor::Black,
                        bold: false,
                    },
                );
            }
            palette.set(
                ScreenColor::Black,
                PaletteEntry {
                    color: TermColor::White,
                    bold: true,
                },
            );
        }
        if config.white_on_black {
            for sc in ScreenColor::ALL {
                palette.set(
                    sc,
                    PaletteEntry {
                        color: TermColor::White,
                        bold: true,
                    },
                );
            }
            palette.set(
                ScreenColor::Black,
                PaletteEntry {
                    color: TermColor::Black,
                    bold: false,
                },
            );
        }
        palette.apply_overrides(&config.colors);
        palette
    }

    pub fn get(&self, color: ScreenColor) -> PaletteEntry {
        self.entries[color.index()]
    }

    pub fn set(&mut self, color: ScreenColor, entry: PaletteEntry) {
        self.entries[color.index()] = entry;
    }

    fn apply_overrides(&mut self, overrides: &HashMap<String, Rgb>) {
        for sc in ScreenColor::ALL {
            if let Some(rgb) = overrides.get(sc.name()) {
                let (color, bold) = rgb_to_color(*rgb);
                self.set(sc, PaletteEntry { color, bold });
            }
        }
    }
}

/// Resolve an RGB triple to the nearest of the 16 colors a terminal can
/// show (8 colors at normal or bold intensity).
pub fn rgb_to_color(rgb: Rgb) -> (TermColor, bool) {
    const CANDIDATES: [(TermColor, bool, [i32; 3]); 16] = [
        (TermColor::Black, false, [0, 0, 0]),
        (TermColor::Red, false, [128, 0, 0]),
        (TermColor::Green, false, [0, 128, 0]),
        (TermColor::Yellow, false, [128, 128, 0]),
        (TermColor::Blue, false, [0, 0, 128]),
        (TermColor::Magenta, false, [128, 0, 128]),
        (TermColor::Cyan, false, [0, 128, 128]),
        (TermColor::White, false, [192, 192, 192]),
        (TermColor::Black, true, [96, 96, 96]),
        (TermColor::Red, true, [255, 0, 0]),
        (TermColor::Green, true, [0, 255, 0]),
        (TermColor::Yellow, true, [255, 255, 0]),
        (TermColor::Blue, true, [0, 0, 255]),
        (TermColor::Magenta, true, [255, 0, 255]),
        (TermColor::Cyan, true, [0, 255, 255]),
        (TermColor::White, true, [255, 255, 255]),
    ];

    let target = [rgb.r as i32, rgb.g as i32, rgb.b as i32];
    let mut best = (TermColor::White, true);
    let mut best_dist = i32::MAX;
    for (color, bold, ref_rgb) in CANDIDATES {
        let dist = (0..3).map(|i| (target[i] - ref_rgb[i]).pow(2)).sum();
        if dist < best_dist {
            best_dist = dist;
            best = (color, bold);
        }
    }
    best
}

/// Presentation attribute of a single cell: color plus attribute bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellAttr {
    pub color: TermColor,
    pub flags: AttrFlags,
}

impl CellAttr {
    pub fn is_nondisplay(&self) -> bool {
        self.flags.contains(AttrFlags::NONDISPLAY)
    }
}

/// The fixed mapping from the 32 attribute codes to presentation
/// attributes. Entries at relative position 7 of each group (7, 15, 23,
/// 31) are the reserved non-display codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeTable {
    entries: [CellAttr; 32],
}

impl AttributeTable {
    /// Build the table from a palette. The layout follows the four
    /// attribute groups of the data stream: green/white, red,
    /// turquoise/yellow (column separators), pink/blue.
    pub fn new(palette: &Palette) -> Self {
        let resolve = |sc: ScreenColor, extra: AttrFlags| {
            let entry = palette.get(sc);
            let mut flags = extra;
            if entry.bold {
                flags |= AttrFlags::BOLD;
            }
            CellAttr {
                color: entry.color,
                flags,
            }
        };
        let nondisplay = CellAttr {
            color: TermColor::Black,
            flags: AttrFlags::NONDISPLAY,
        };

        use AttrFlags as F;
        use ScreenColor as C;
        let ul = F::UNDERLINE;
        let rev = F::REVERSE;
        let blink = F::BLINK;
        let vert = F::VERTICAL;

        let entries = [
            resolve(C::Green, F::empty()),
            resolve(C::Green, rev),
            resolve(C::White, F::empty()),
            resolve(C::White, rev),
            resolve(C::Green, ul),
            resolve(C::Green, ul | rev),
            resolve(C::White, ul),
            nondisplay,
            resolve(C::Red, F::empty()),
            resolve(C::Red, rev),
            resolve(C::Red, blink),
            resolve(C::Red, blink | rev),
            resolve(C::Red, ul),
            resolve(C::Red, ul | rev),
            resolve(C::Red, ul | blink),
            nondisplay,
            resolve(C::Turquoise, vert),
            resolve(C::Turquoise, vert | rev),
            resolve(C::Yellow, vert),
            resolve(C::Yellow, vert | rev),
            resolve(C::Turquoise, ul | vert),
            resolve(C::Turquoise, ul | rev | vert),
            resolve(C::Yellow, ul | vert),
            nondisplay,
            resolve(C::Pink, F::empty()),
            resolve(C::Pink, rev),
            resolve(C::Blue, F::empty()),
            resolve(C::Blue, rev),
            resolve(C::Pink, ul),
            resolve(C::Pink, ul | rev),
            resolve(C::Blue, ul),
            nondisplay,
        ];
        Self { entries }
    }

    /// Presentation attribute for the given attribute code. Only the low
    /// 5 bits are significant.
    pub fn get(&self, code: u8) -> CellAttr {
        self.entries[(code & 0x1f) as usize]
    }

    /// The base attribute (code 0), used for attribute cells and
    /// non-display cells.
    pub fn base(&self) -> CellAttr {
        self.entries[0]
    }
}

impl Default for AttributeTable {
    fn default() -> Self {
        Self::new(&Palette::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_codes_are_nondisplay() {
        let table = AttributeTable::default();
        for code in [7u8, 15, 23, 31] {
            assert!(table.get(code).is_nondisplay(), "code {}", code);
        }
    }

    #[test]
    fn test_column_separator_group_carries_vertical() {
        let table = AttributeTable::default();
        for code in 16u8..23 {
            assert!(
                table.get(code).flags.contains(AttrFlags::VERTICAL),
                "code {}",
                code
            );
        }
    }

    #[test]
    fn test_base_attribute_is_plain_green() {
        let table = AttributeTable::default();
        let base = table.base();
        assert_eq!(base.color, TermColor::Green);
        assert_eq!(base.flags, AttrFlags::empty());
    }

    #[test]
    fn test_default_palette_bold_pairings() {
        let p = Palette::default();
        assert!(p.get(ScreenColor::White).bold);
        assert!(p.get(ScreenColor::Red).bold);
        assert!(p.get(ScreenColor::Yellow).bold);
        assert!(!p.get(ScreenColor::Green).bold);
        // Blue is shown as bold cyan.
        assert_eq!(p.get(ScreenColor::Blue).color, TermColor::Cyan);
        assert!(p.get(ScreenColor::Blue).bold);
    }

    #[test]
    fn test_rgb_resolution_picks_nearest() {
        assert_eq!(
            rgb_to_color(Rgb { r: 255, g: 0, b: 0 }),
            (TermColor::Red, true)
        );
        assert_eq!(
            rgb_to_color(Rgb { r: 120, g: 0, b: 0 }),
            (TermColor::Red, false)
        );
        assert_eq!(
            rgb_to_color(Rgb {
                r: 250,
                g: 250,
                b: 250
            }),
            (TermColor::White, true)
        );
        assert_eq!(
            rgb_to_color(Rgb {
                r: 0,
                g: 130,
                b: 125
            }),
            (TermColor::Cyan, false)
        );
    }

    #[test]
    fn test_black_on_white_rewrite() {
        let config = TermConfig {
            black_on_white: true,
            ..TermConfig::default()
        };
        let p = Palette::from_config(&config);
        assert_eq!(p.get(ScreenColor::Green).color, TermColor::Black);
        assert_eq!(p.get(ScreenColor::Black).color, TermColor::White);
        assert!(p.get(ScreenColor::Black).bold);
    }

    #[test]
    fn test_color_override_applies_to_palette() {
        let mut config = TermConfig::default();
        config
            .colors
            .insert("green".to_string(), Rgb { r: 0, g: 0, b: 255 });
        let p = Palette::from_config(&config);
        assert_eq!(p.get(ScreenColor::Green).color, TermColor::Blue);
        assert!(p.get(ScreenColor::Green).bold);
    }
}
