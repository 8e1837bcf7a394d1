//! The composed terminal object handed to the session layer
//!
//! [`Terminal5250`] wires a device, the attribute table, the screen
//! renderer and the key decoder into the narrow interface the session
//! layer drives: push a snapshot, poll for a key, beep, reconfigure.

use crate::attrs::{AttributeTable, Palette};
use crate::caps::TermCaps;
use crate::config::TermConfig;
use crate::decoder::{KeyDecoder, KeyMap};
use crate::device::TerminalDevice;
use crate::display::DisplayView;
use crate::error::TermResult;
use crate::keys::KeyCode;
use crate::printer;
use crate::renderer::ScreenRenderer;

pub struct Terminal5250<D: TerminalDevice> {
    dev: D,
    attrs: AttributeTable,
    renderer: ScreenRenderer,
    decoder: KeyDecoder,
    config: TermConfig,
}

impl<D: TerminalDevice> Terminal5250<D> {
    /// Build the terminal: resolve the palette and attribute table from
    /// the options, the key map from the device capabilities.
    pub fn new(dev: D, config: TermConfig, caps: &dyn TermCaps) -> Self {
        let attrs = AttributeTable::new(&Palette::from_config(&config));
        let renderer = ScreenRenderer::new(attrs.clone(), &config, caps);
        let decoder = KeyDecoder::new(KeyMap::build(caps));
        Self {
            dev,
            attrs,
            renderer,
            decoder,
            config,
        }
    }

    /// Replace the option-derived settings. The key map is left alone;
    /// it only depends on device capabilities.
    pub fn configure(&mut self, config: TermConfig, caps: &dyn TermCaps) {
        self.attrs = AttributeTable::new(&Palette::from_config(&config));
        self.renderer.configure(&config, caps);
        self.config = config;
    }

    /// Paint a full snapshot. Called by the session layer on every host
    /// update.
    pub fn render(&mut self, view: &dyn DisplayView) -> TermResult<()> {
        self.renderer.render(&mut self.dev, view)
    }

    /// Redraw only the status line.
    pub fn render_indicators(&mut self, view: &dyn DisplayView) -> TermResult<()> {
        self.renderer.render_indicators(&mut self.dev, view)
    }

    /// Poll for one logical key. The print-screen key is intercepted
    /// here when local printing is enabled: the exporter runs
    /// synchronously against the current snapshot and a harmless reset
    /// is delivered in its place.
    pub fn poll_key(&mut self, view: &dyn DisplayView) -> TermResult<Option<KeyCode>> {
        match self.decoder.poll(&mut self.dev) {
            Some(KeyCode::Print) if self.config.local_print_key => {
                printer::print_screen(view, &self.attrs, &self.config.print)?;
                self.render(view)?;
                Ok(Some(KeyCode::Reset))
            }
            key => Ok(key),
        }
    }

    /// True once the operator has hit the quit key (Ctrl-Q).
    pub fn quit_requested(&self) -> bool {
        self.decoder.quit_requested()
    }

    pub fn beep(&mut self) -> TermResult<()> {
        self.dev.beep()
    }

    /// Physical terminal geometry, for the session layer's sizing
    /// decisions.
    pub fn size(&self) -> (usize, usize) {
        (self.dev.cols(), self.dev.rows())
    }

    pub fn ruler_enabled(&self) -> bool {
        self.renderer.ruler_enabled()
    }

    pub fn set_ruler(&mut self, on: bool) {
        self.renderer.set_ruler(on);
    }

    pub fn device(&self) -> &D {
        &self.dev
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.dev
    }

    /// Tear down, returning the device for reuse or inspection.
    pub fn into_device(self) -> D {
        self.dev
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::XtermCaps;
    use crate::device::CaptureDevice;
    use crate::display::ScreenBuffer;

    fn quiet_config() -> TermConfig {
        TermConfig {
            resize_retries: 0,
            ..TermConfig::default()
        }
    }

    fn terminal() -> Terminal5250<CaptureDevice> {
        Terminal5250::new(
            CaptureDevice::new(80, 25),
            quiet_config(),
            &XtermCaps::new("xterm"),
        )
    }

    #[test]
    fn test_render_and_poll_round_trip() {
        let mut term = terminal();
        let mut buf = ScreenBuffer::new(80, 24);
        buf.put_str(0, 0, "READY");
        term.render(&buf).unwrap();
        assert_eq!(&term.device().row_text(0)[..5], "READY");

        term.device_mut().push_input(b"\x1b1");
        assert_eq!(term.poll_key(&buf).unwrap(), Some(KeyCode::F1));
        assert_eq!(term.poll_key(&buf).unwrap(), None);
    }

    #[test]
    fn test_quit_via_ctrl_q() {
        let mut term = terminal();
        let buf = ScreenBuffer::new(80, 24);
        term.device_mut().push_input(&[0x11]);
        assert_eq!(term.poll_key(&buf).unwrap(), None);
        assert!(term.quit_requested());
    }

    #[test]
    fn test_print_key_passes_through_without_local_print() {
        let mut term = terminal();
        let buf = ScreenBuffer::new(80, 24);
        term.device_mut().push_input(b"\x1bP");
        assert_eq!(term.poll_key(&buf).unwrap(), Some(KeyCode::Print));
    }

    #[test]
    fn test_local_print_delivers_reset() {
        let mut config = quiet_config();
        config.local_print_key = true;
        config.print.output_command = "cat > /dev/null".to_string();
        let mut term = Terminal5250::new(
            CaptureDevice::new(80, 25),
            config,
            &XtermCaps::new("xterm"),
        );
        let buf = ScreenBuffer::new(80, 24);
        term.device_mut().push_input(b"\x1bP");
        assert_eq!(term.poll_key(&buf).unwrap(), Some(KeyCode::Reset));
    }

    #[test]
    fn test_beep_reaches_device() {
        let mut term = terminal();
        term.beep().unwrap();
        assert_eq!(term.device().beeps, 1);
    }
}
