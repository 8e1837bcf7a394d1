//! Demo binary: renders a sample sign-on screen and echoes decoded keys
//!
//! Drives the terminal layer without a live session: a static screen
//! buffer stands in for the protocol layer, arrow keys move the cursor
//! (useful with `--ruler`), and every decoded key is shown on screen.
//! Ctrl-Q quits.

use std::env;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use log::debug;

use term5250::display::{IND_INSERT, IND_X_SYSTEM};
use term5250::{
    CrosstermDevice, DebugDevice, DisplayView, KeyCode, ScreenBuffer, TermConfig, Terminal5250,
    TerminalDevice, XtermCaps,
};

fn sample_screen() -> ScreenBuffer {
    let mut buf = ScreenBuffer::new(80, 24);
    buf.set_attr(0, 24, 2); // white
    buf.put_str(0, 25, "term5250 terminal demo");
    buf.set_attr(2, 4, 0); // green
    buf.put_str(2, 5, "This screen is a static snapshot; no host is attached.");
    buf.set_attr(4, 4, 0);
    buf.put_str(4, 5, "User  . . . . . . :");
    buf.set_attr(4, 25, 4); // green underline (input field)
    buf.set_attr(4, 36, 0);
    buf.set_attr(5, 4, 0);
    buf.put_str(5, 5, "Password  . . . . :");
    buf.set_attr(5, 25, 7); // non-display (password field)
    buf.put_str(5, 26, "SECRET");
    buf.set_attr(5, 36, 0);
    buf.set_attr(7, 4, 16); // turquoise column separator
    buf.put_str(7, 5, "F1-F24 send function keys, arrows move the cursor.");
    buf.set_attr(9, 4, 1); // green reverse
    buf.put_str(9, 5, " Ctrl-Q quits. ");
    buf.set_attr(11, 4, 0);
    buf.put_str(11, 5, "Last key:");
    buf.set_cursor(4, 26);
    buf.set_indicators(IND_INSERT);
    buf
}

fn key_label(key: KeyCode) -> String {
    match key {
        KeyCode::Char(b) if (0x20..0x7f).contains(&b) => format!("'{}'", b as char),
        KeyCode::Char(b) => format!("0x{:02X}", b),
        other => format!("{:?}", other),
    }
}

fn usage() -> ! {
    eprintln!("Usage: term5250 [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --ruler            highlight the cursor row and column");
    eprintln!("  --underscores      render underlines as underscores");
    eprintln!("  --black-on-white   invert the palette");
    eprintln!("  --white-on-black   monochrome white palette");
    eprintln!("  --local-print      route the print key to the exporter");
    eprintln!("  --debug            trace device calls (RUST_LOG=debug)");
    eprintln!("  --help             show this help");
    std::process::exit(2);
}

fn main() -> Result<()> {
    env_logger::init();

    let mut config = TermConfig::default();
    let mut trace_device = false;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--ruler" => config.ruler = true,
            "--underscores" => config.underscores = Some(true),
            "--black-on-white" => config.black_on_white = true,
            "--white-on-black" => config.white_on_black = true,
            "--local-print" => config.local_print_key = true,
            "--debug" => trace_device = true,
            _ => usage(),
        }
    }
    debug!(
        "effective config: {}",
        serde_json::to_string(&config).unwrap_or_default()
    );

    let caps = XtermCaps::from_env();
    let dev = CrosstermDevice::open(&caps).context("cannot open terminal")?;
    let dev: Box<dyn TerminalDevice> = if trace_device {
        Box::new(DebugDevice::new(dev))
    } else {
        Box::new(dev)
    };
    let mut term = Terminal5250::new(dev, config, &caps);

    let mut screen = sample_screen();
    term.render(&screen)?;

    while !term.quit_requested() {
        let key = term.poll_key(&screen)?;
        match key {
            None => {
                thread::sleep(Duration::from_millis(10));
                continue;
            }
            Some(KeyCode::Up) => {
                let y = screen.cursor_y().saturating_sub(1);
                screen.set_cursor(y, screen.cursor_x());
            }
            Some(KeyCode::Down) => {
                screen.set_cursor(screen.cursor_y() + 1, screen.cursor_x());
            }
            Some(KeyCode::Left) => {
                let x = screen.cursor_x().saturating_sub(1);
                screen.set_cursor(screen.cursor_y(), x);
            }
            Some(KeyCode::Right) => {
                screen.set_cursor(screen.cursor_y(), screen.cursor_x() + 1);
            }
            Some(KeyCode::SysReq) => {
                screen.set_indicators(screen.indicators() ^ IND_X_SYSTEM);
                term.beep()?;
            }
            Some(other) => {
                screen.put_str(11, 15, &format!("{:<20}", key_label(other)));
            }
        }
        term.render(&screen)?;
    }

    Ok(())
}
