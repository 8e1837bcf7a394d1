//! Print-screen exporter
//!
//! Emits the current screen as a single-page PostScript document: one
//! positioned show per contiguous same-attribute run, reverse-video runs
//! drawn over a filled box, underlined runs with a rule below the text,
//! and a border sized to the screen's row/column count. The document is
//! piped to a configurable output command (`lpr` by default).

use std::io::{self, Write};
use std::process::{Command, Stdio};

use log::info;

use crate::attrs::{AttrFlags, AttributeTable, CellAttr};
use crate::config::PrintConfig;
use crate::display::{is_attribute_byte, DisplayView};
use crate::error::{TermError, TermResult};

/// Rows per page assumed by the layout, matching line-printer paper.
const PAGE_ROWS: f64 = 66.0;

/// Escape the characters PostScript strings reserve.
fn escape_ps(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == '\\' || ch == '(' || ch == ')' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Emit one attribute run. Non-display runs produce no output at all;
/// reverse runs get a filled box behind white text; underlined runs get
/// a rule drawn beneath them.
fn emit_run<W: Write>(out: &mut W, x: usize, y: usize, text: &str, attr: CellAttr) -> io::Result<()> {
    if attr.is_nondisplay() {
        return Ok(());
    }
    let text = escape_ps(text);
    let mut color = 0;
    if attr.flags.contains(AttrFlags::REVERSE) {
        color = 1;
        writeln!(out, "({}) {} {} blkbox", text, x, y)?;
    }
    writeln!(out, "({}) {} {} {} prtnorm", text, x, y, color)?;
    if attr.flags.contains(AttrFlags::UNDERLINE) {
        writeln!(out, "({}) {} {} {} drawunderline", text, x, y, color)?;
    }
    Ok(())
}

/// Write the complete PostScript document for the given snapshot.
pub fn write_postscript<W: Write>(
    out: &mut W,
    view: &dyn DisplayView,
    attrs: &AttributeTable,
    config: &PrintConfig,
) -> io::Result<()> {
    let width = view.width();
    let height = view.height();
    let font_size = config.font_size_for_width(width);
    let page_width = config.page_width;
    let page_length = config.page_length;
    let left_margin = config.left_margin;
    let top_margin = config.top_margin;
    let row_height = (page_length - f64::from(top_margin) * 2.0) / PAGE_ROWS;

    writeln!(out, "%!PS-Adobe-3.0")?;
    writeln!(out, "%%Pages: 1")?;
    writeln!(out, "%%Title: 5250 Print Screen")?;
    writeln!(out, "%%BoundingBox: 0 0 {:.0} {:.0}", page_width, page_length)?;
    writeln!(out, "%%LanguageLevel: 2")?;
    writeln!(out, "%%EndComments")?;
    writeln!(out)?;
    writeln!(out, "%%BeginProlog")?;
    writeln!(out, "%%BeginResource: procset general 1.0.0")?;
    writeln!(out, "%%Title: (General Procedures)")?;
    writeln!(out, "%%Version: 1.0")?;
    writeln!(out, "% Courier is a fixed-pitch font, so one character is as")?;
    writeln!(out, "%   good as another for determining the height/width")?;
    writeln!(out, "/Courier {:.2} selectfont", font_size)?;
    writeln!(out, "/chrwid (W) stringwidth pop def")?;
    writeln!(out, "/pglen {:.2} def", page_length)?;
    writeln!(out, "/pgwid {:.2} def", page_width)?;
    writeln!(out, "/chrhgt {:.2} def", row_height)?;
    writeln!(out, "/leftmar {} def", left_margin + 2)?;
    writeln!(out, "/topmar {} def", top_margin)?;
    writeln!(
        out,
        "/exploc {{           % expand x y to dot positions\n\
         \x20  chrhgt mul\n\
         \x20  topmar add\n\
         \x20  3 add\n\
         \x20  pglen exch sub\n\
         \x20  exch\n\
         \x20  chrwid mul\n\
         \x20  leftmar add\n\
         \x20  3 add\n\
         \x20  exch\n\
         }} bind def"
    )?;
    writeln!(
        out,
        "/prtnorm {{          % print text normally (text) x y color\n\
         \x20  setgray\n\
         \x20  exploc moveto\n\
         \x20  show\n\
         }} bind def"
    )?;
    writeln!(
        out,
        "/drawunderline  {{ % draw underline: (string) x y color\n\
         \x20  gsave\n\
         \x20  0 setlinewidth\n\
         \x20  setgray\n\
         \x20  exploc\n\
         \x20  2 sub\n\
         \x20  moveto\n\
         \x20  stringwidth pop 0\n\
         \x20  rlineto\n\
         \x20  stroke\n\
         \x20  grestore\n\
         }} bind def"
    )?;
    writeln!(
        out,
        "/blkbox {{       % draw a black box behind the text\n\
         \x20  gsave\n\
         \x20  newpath\n\
         \x20  0 setgray\n\
         \x20  exploc\n\
         \x20  3 sub\n\
         \x20  moveto\n\
         \x20  0 chrhgt rlineto\n\
         \x20  stringwidth pop 0 rlineto\n\
         \x20  0 0 chrhgt sub rlineto\n\
         \x20  closepath\n\
         \x20  fill\n\
         \x20  grestore\n\
         }} bind def"
    )?;
    writeln!(
        out,
        "/borderbox {{ % Print a border around screen dump\n\
         \x20  gsave\n\
         \x20  newpath\n\
         \x20  0 setlinewidth\n\
         \x20  0 setgray\n\
         \x20  leftmar\n\
         \x20  topmar chrhgt sub pglen exch sub\n\
         \x20  moveto\n\
         \x20  chrwid {w} mul 6 add 0 rlineto\n\
         \x20  0 0 chrhgt {h} mul 6 add sub rlineto\n\
         \x20  0 chrwid {w} mul 6 add sub 0 rlineto\n\
         \x20  closepath\n\
         \x20  stroke\n\
         \x20  grestore\n\
         }} bind def",
        w = width,
        h = height + 1,
    )?;
    writeln!(out, "%%EndResource")?;
    writeln!(out, "%%EndProlog")?;
    writeln!(out)?;
    writeln!(out, "%%Page 1 1")?;
    writeln!(out, "%%BeginPageSetup")?;
    writeln!(out, "/pgsave save def")?;
    writeln!(out, "%%EndPageSetup")?;

    let mut run_attr = attrs.get(7); // non-display until the first attribute byte
    let mut run = String::new();
    let mut run_x: Option<(usize, usize)> = None;

    for y in 0..height {
        for x in 0..width {
            let c = view.char_at(y, x);
            if is_attribute_byte(c) {
                if let Some((px, py)) = run_x.take() {
                    if !run.is_empty() {
                        emit_run(out, px, py, &run, run_attr)?;
                        run.clear();
                    }
                }
                run_attr = attrs.get(c - 0x20);
            } else {
                if run_x.is_none() {
                    run_x = Some((x, y));
                }
                let ch = if (c > 0x00 && c < 0x40) || c == 0xff || c == 0x00 {
                    ' '
                } else {
                    view.to_local(c)
                };
                run.push(ch);
            }
        }
        if let Some((px, py)) = run_x.take() {
            if !run.is_empty() {
                emit_run(out, px, py, &run, run_attr)?;
                run.clear();
            }
        }
    }

    writeln!(out, "borderbox")?;
    writeln!(out, "pgsave restore")?;
    writeln!(out, "showpage")?;
    writeln!(out, "%%PageTrailer")?;
    writeln!(out, "%%Trailer")?;
    writeln!(out, "%%Pages: 1")?;
    writeln!(out, "%%EOF")?;
    Ok(())
}

/// Generate the document and pipe it to the configured output command.
pub fn print_screen(
    view: &dyn DisplayView,
    attrs: &AttributeTable,
    config: &PrintConfig,
) -> TermResult<()> {
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(&config.output_command)
        .stdin(Stdio::piped())
        .spawn()
        .map_err(|e| TermError::Print {
            command: config.output_command.clone(),
            message: e.to_string(),
        })?;

    {
        let stdin = child.stdin.as_mut().ok_or_else(|| TermError::Print {
            command: config.output_command.clone(),
            message: "no stdin on child process".to_string(),
        })?;
        write_postscript(stdin, view, attrs, config)?;
    }

    let status = child.wait().map_err(|e| TermError::Print {
        command: config.output_command.clone(),
        message: e.to_string(),
    })?;
    if !status.success() {
        return Err(TermError::Print {
            command: config.output_command.clone(),
            message: format!("exited with {}", status),
        });
    }
    info!("print screen: sent to '{}'", config.output_command);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::ScreenBuffer;

    fn render_ps(buf: &ScreenBuffer) -> String {
        let mut out = Vec::new();
        write_postscript(&mut out, buf, &AttributeTable::default(), &PrintConfig::default())
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_document_structure() {
        let buf = ScreenBuffer::new(80, 24);
        let ps = render_ps(&buf);
        assert!(ps.starts_with("%!PS-Adobe-3.0"));
        assert!(ps.contains("/Courier 10.00 selectfont"));
        assert!(ps.contains("borderbox"));
        assert!(ps.trim_end().ends_with("%%EOF"));
    }

    #[test]
    fn test_wide_screen_uses_smaller_font() {
        let buf = ScreenBuffer::new(132, 27);
        let ps = render_ps(&buf);
        assert!(ps.contains("/Courier 7.00 selectfont"));
        assert!(ps.contains("chrwid 132 mul"));
    }

    #[test]
    fn test_text_run_positions() {
        let mut buf = ScreenBuffer::new(80, 24);
        buf.set_attr(2, 4, 2); // white
        buf.put_str(2, 5, "HELLO");
        let ps = render_ps(&buf);
        assert!(ps.contains("(HELLO"), "ps was: {}", ps);
        assert!(ps.contains(") 5 2 0 prtnorm"));
    }

    #[test]
    fn test_reverse_run_draws_box() {
        let mut buf = ScreenBuffer::new(80, 24);
        buf.set_attr(0, 0, 1); // green reverse
        buf.put_str(0, 1, "REV");
        let ps = render_ps(&buf);
        assert!(ps.contains("blkbox\n(REV"), "box must precede the text");
        assert!(ps.contains("1 prtnorm"));
    }

    #[test]
    fn test_underline_run_draws_rule() {
        let mut buf = ScreenBuffer::new(80, 24);
        buf.set_attr(0, 0, 4); // green underline
        buf.put_str(0, 1, "UL");
        let ps = render_ps(&buf);
        assert!(ps.contains("drawunderline"));
    }

    #[test]
    fn test_nondisplay_run_is_skipped() {
        let mut buf = ScreenBuffer::new(80, 24);
        buf.set_attr(0, 0, 7);
        buf.put_str(0, 1, "HIDDEN");
        let ps = render_ps(&buf);
        assert!(!ps.contains("HIDDEN"));
    }

    #[test]
    fn test_reserved_characters_escaped() {
        let mut buf = ScreenBuffer::new(80, 24);
        buf.set_attr(0, 0, 0);
        buf.put_str(0, 1, "(a)");
        let ps = render_ps(&buf);
        assert!(ps.contains("(\\(a\\)"), "ps was: {}", ps);
    }
}
