//! Display: the thin seam between the presentation decoder and the real
//! character-cell renderer. The decoder decides *what* to draw and
//! when a character must be suppressed (concealed/flash rules); `Display`
//! only turns that decision into a backend call, picking the color pair and
//! applying the monochrome/bold overrides the CLI exposes.
//!
//! The actual curses-style renderer sits behind [`TerminalBackend`], with
//! [`CrosstermBackend`] providing a real (if minimal) implementation on top
//! of `crossterm`.

use std::io::{self, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::{Color as CtColor, Print, ResetColor, SetForegroundColor};
use crossterm::{queue, terminal};

use crate::terminal::cell::Attr;
use crate::terminal::color::Color;

/// A character-cell renderer capable of placing a code point at `(row, col)`
/// with a chosen color and moving/hiding the text cursor. Implementations
/// decide how (or whether) to honor `color_pair`; a monochrome terminal may
/// ignore it entirely.
pub trait TerminalBackend {
    fn put(&mut self, row: usize, col: usize, codepoint: u32, fg: Color, bg: Color, bold: bool);
    fn move_cursor(&mut self, row: usize, col: usize);
    fn set_cursor_visible(&mut self, visible: bool);
    fn set_title(&mut self, title: &str);
    fn flush(&mut self);
}

/// Adapter between the decoder's `(row, col, codepoint, attr)` writes and a
/// [`TerminalBackend`]. Owns the CLI-level `--mono`/`--bold` overrides so the
/// decoder's stored attributes stay the ground truth for the round-trip
/// property regardless of how a given run chooses to render them.
pub struct Display<B: TerminalBackend> {
    backend: B,
    mono_mode: bool,
}

impl<B: TerminalBackend> Display<B> {
    pub fn new(backend: B, mono_mode: bool) -> Self {
        Display { backend, mono_mode }
    }

    pub fn put(&mut self, row: usize, col: usize, codepoint: u32, attr: Attr) {
        let (fg, bg) = if self.mono_mode {
            (Color::White, Color::Black)
        } else {
            unpack_color_pair(attr.color_pair)
        };
        let bold = attr.style_bits.contains(crate::terminal::cell::StyleBits::BOLD);
        self.backend.put(row, col, codepoint, fg, bg, bold);
    }

    pub fn move_cursor(&mut self, row: usize, col: usize) {
        self.backend.move_cursor(row, col);
    }

    pub fn set_cursor_visible(&mut self, visible: bool) {
        self.backend.set_cursor_visible(visible);
    }

    pub fn set_title(&mut self, title: &str) {
        self.backend.set_title(title);
    }

    pub fn flush(&mut self) {
        self.backend.flush();
    }
}

/// Inverse of `Attr::color_pair_number`: `(fg << 3) | bg`, with pair 0 always
/// white-on-black.
fn unpack_color_pair(pair: u8) -> (Color, Color) {
    if pair == 0 {
        return (Color::White, Color::Black);
    }

    let fg = Color::from_row_code((pair >> 3) & 0x07);
    let bg = Color::from_row_code(pair & 0x07);
    (fg, bg)
}

fn to_crossterm_color(color: Color) -> CtColor {
    match color {
        Color::Black => CtColor::Black,
        Color::Red => CtColor::DarkRed,
        Color::Green => CtColor::DarkGreen,
        Color::Yellow => CtColor::DarkYellow,
        Color::Blue => CtColor::DarkBlue,
        Color::Magenta => CtColor::DarkMagenta,
        Color::Cyan => CtColor::DarkCyan,
        Color::White => CtColor::Grey,
    }
}

fn to_crossterm_bright_color(color: Color) -> CtColor {
    match color {
        Color::Black => CtColor::Black,
        Color::Red => CtColor::Red,
        Color::Green => CtColor::Green,
        Color::Yellow => CtColor::Yellow,
        Color::Blue => CtColor::Blue,
        Color::Magenta => CtColor::Magenta,
        Color::Cyan => CtColor::Cyan,
        Color::White => CtColor::White,
    }
}

/// Real backend, writing directly to a raw-mode terminal via `crossterm`.
/// Raw mode, the alternate screen, and key decoding are set up by
/// `session::SessionLoop`; this struct only issues draw calls.
pub struct CrosstermBackend<W: Write> {
    out: W,
}

impl<W: Write> CrosstermBackend<W> {
    pub fn new(out: W) -> Self {
        CrosstermBackend { out }
    }
}

impl<W: Write> TerminalBackend for CrosstermBackend<W> {
    fn put(&mut self, row: usize, col: usize, codepoint: u32, fg: Color, bg: Color, bold: bool) {
        let ch = char::from_u32(codepoint).unwrap_or('?');
        let fg_color = if bold {
            to_crossterm_bright_color(fg)
        } else {
            to_crossterm_color(fg)
        };

        let _ = queue!(
            self.out,
            MoveTo(col as u16, row as u16),
            SetForegroundColor(fg_color),
            crossterm::style::SetBackgroundColor(to_crossterm_color(bg)),
            Print(ch),
            ResetColor,
        );
    }

    fn move_cursor(&mut self, row: usize, col: usize) {
        let _ = queue!(self.out, MoveTo(col as u16, row as u16));
    }

    fn set_cursor_visible(&mut self, visible: bool) {
        let _ = if visible {
            queue!(self.out, Show)
        } else {
            queue!(self.out, Hide)
        };
    }

    fn set_title(&mut self, title: &str) {
        let _ = queue!(self.out, terminal::SetTitle(title));
    }

    fn flush(&mut self) {
        let _ = self.out.flush();
    }
}

/// Clears the alternate screen and resets the cursor to the top-left corner.
/// Called once by `SessionLoop` after raw-mode/alternate-screen setup and on
/// every `FF` new-frame in the decoded stream.
pub fn clear_screen<W: Write>(out: &mut W) -> io::Result<()> {
    queue!(out, terminal::Clear(terminal::ClearType::All), MoveTo(0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingBackend {
        puts: Vec<(usize, usize, u32, Color, Color, bool)>,
        cursor: (usize, usize),
        cursor_visible: bool,
    }

    impl TerminalBackend for RecordingBackend {
        fn put(&mut self, row: usize, col: usize, codepoint: u32, fg: Color, bg: Color, bold: bool) {
            self.puts.push((row, col, codepoint, fg, bg, bold));
        }

        fn move_cursor(&mut self, row: usize, col: usize) {
            self.cursor = (row, col);
        }

        fn set_cursor_visible(&mut self, visible: bool) {
            self.cursor_visible = visible;
        }

        fn set_title(&mut self, _title: &str) {}

        fn flush(&mut self) {}
    }

    #[test]
    fn unpack_color_pair_zero_is_white_on_black() {
        assert_eq!(unpack_color_pair(0), (Color::White, Color::Black));
    }

    #[test]
    fn unpack_color_pair_round_trips() {
        let packed = Attr::color_pair_number(Color::Green, Color::Red);
        assert_eq!(unpack_color_pair(packed), (Color::Green, Color::Red));
    }

    #[test]
    fn mono_mode_overrides_stored_color() {
        let backend = RecordingBackend::default();
        let mut display = Display::new(backend, true);
        let mut attr = Attr::default();
        attr.color_pair = Attr::color_pair_number(Color::Green, Color::Red);
        display.put(0, 0, 'A' as u32, attr);
        assert_eq!(display.backend.puts[0].3, Color::White);
        assert_eq!(display.backend.puts[0].4, Color::Black);
    }
}
