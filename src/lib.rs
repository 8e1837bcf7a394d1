//! term5250: the terminal interface layer of an IBM 5250 emulator
//!
//! Renders the protocol layer's attribute-tagged screen buffer onto a
//! character-cell terminal and decodes the raw keyboard byte stream into
//! logical 5250 keys. The session/protocol layer is an external
//! collaborator reached through the [`display::DisplayView`] trait.

/// Error types shared across the terminal layer
pub mod error;

/// Configuration surface (options, print page setup)
pub mod config;

/// Logical key codes and the static sequence tables
pub mod keys;

/// Device capability probing (termcap stand-in)
pub mod caps;

/// Attribute codes, palette, and the presentation attribute table
pub mod attrs;

/// Output/input device abstraction and its implementations
pub mod device;

/// Screen snapshot interface and a concrete buffer
pub mod display;

/// Raw byte stream to logical key decoding
pub mod decoder;

/// Screen rendering: cell loop, ruler, status line, resize
pub mod renderer;

/// Print-screen PostScript exporter
pub mod printer;

/// The composed terminal object
pub mod terminal;

pub use attrs::{AttrFlags, AttributeTable, CellAttr, Palette, ScreenColor, TermColor};
pub use caps::{TermCaps, XtermCaps};
pub use config::{PrintConfig, TermConfig};
pub use decoder::{KeyDecoder, KeyMap};
pub use device::{CaptureDevice, CrosstermDevice, DebugDevice, TerminalDevice};
pub use display::{DisplayView, ScreenBuffer};
pub use error::{TermError, TermResult};
pub use keys::KeyCode;
pub use renderer::ScreenRenderer;
pub use terminal::Terminal5250;
