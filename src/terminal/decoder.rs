//! PresentationDecoder: the main byte-stream state machine. Consumes
//! one byte at a time, maintains the cursor and presentation flags, and
//! drives writes into the grid (and, through [`Display`], onto the screen).

use std::io::{self, Write};

use crate::charmap::Font;
use crate::display::{Display, TerminalBackend};

use super::cell::{Attr, Cell, CharTriple, StyleBits};
use super::color::{Color, DeferredColor, Tristate};
use super::flags::{AfterFlags, Flags};
use super::grid::{Grid, MAX_COLS, MAX_ROWS};

const FRAME_BUFFER_MAX: usize = 2000;

pub struct PresentationDecoder {
    grid: Grid,
    flags: Flags,
    after_flags: AfterFlags,
    row: usize,
    col: usize,
    /// Row reserved as the lower half of an active double-height pair, or
    /// `None` when no row is reserved.
    dheight_low_row: Option<usize>,
    header_row: [u32; MAX_COLS],
    frame_buffer: Vec<u8>,
    screen_flash_state: bool,
    screen_revealed_state: bool,
    space: CharTriple,
    font: Font,
    bold_mode: bool,
}

impl PresentationDecoder {
    /// Allocates the grid, installs initial flags, precomputes the SPACE
    /// triple for the selected font, and draws a blank frame.
    pub fn new(font: Font) -> Self {
        let space = CharTriple {
            single: font.map_char(0, 2, true, false, false, false),
            upper: font.map_char(0, 2, true, false, true, false),
            lower: font.map_char(0, 2, true, false, true, true),
        };

        let mut decoder = PresentationDecoder {
            grid: Grid::new(),
            flags: Flags::default_with_space(space),
            after_flags: AfterFlags::default(),
            row: 0,
            col: 0,
            dheight_low_row: None,
            header_row: [0x20; MAX_COLS],
            frame_buffer: Vec::with_capacity(FRAME_BUFFER_MAX),
            screen_flash_state: false,
            screen_revealed_state: false,
            space,
            font,
            bold_mode: false,
        };
        decoder.reset_frame_state();
        decoder
    }

    pub fn set_bold_mode(&mut self, bold: bool) {
        self.bold_mode = bold;
    }

    pub fn toggle_bold_mode(&mut self) {
        self.bold_mode = !self.bold_mode;
    }

    pub fn cursor_position(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub fn is_cursor_on(&self) -> bool {
        self.flags.is_cursor_on
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The text written to row 0 so far, trimmed of trailing spaces, used to
    /// scrape a page number for the terminal title.
    pub fn header_text(&self) -> String {
        let text: String = self
            .header_row
            .iter()
            .map(|&cp| char::from_u32(cp).unwrap_or('?'))
            .collect();
        text.trim_end().to_string()
    }

    /// Writes the captured raw byte stream (capped at 2000 bytes) to `sink`.
    pub fn save_frame(&self, sink: &mut impl Write) -> io::Result<()> {
        sink.write_all(&self.frame_buffer)
    }

    /// Advances the state machine over `bytes`, issuing draw calls to `display`.
    pub fn decode<B: TerminalBackend>(&mut self, bytes: &[u8], display: &mut Display<B>) {
        for &b in bytes {
            if self.frame_buffer.len() < FRAME_BUFFER_MAX {
                self.frame_buffer.push(b);
            }

            if self.handle_control_code(b, display) {
                continue;
            }

            let row_code = b & 0x0F;
            let mut col_code = (b & 0x70) >> 4;

            if self.flags.is_escaped {
                col_code &= 1;
                self.flags.is_escaped = false;
            }

            if col_code == 0 {
                self.apply_group0(row_code);
            } else if col_code == 1 && self.apply_group1(row_code) {
                // ESC: do not draw, do not advance col.
                continue;
            }

            self.draw_step(row_code, col_code, display);

            self.after_flags.apply_to(&mut self.flags, self.space);
            if self.after_flags.is_double_height == Tristate::True {
                self.dheight_low_row = Some(self.row + 1);
            }
            self.after_flags.reset();

            self.col += 1;
            if self.col == MAX_COLS {
                self.next_row();
            }

            display.move_cursor(self.row, self.col.min(MAX_COLS - 1));
        }

        display.set_cursor_visible(self.flags.is_cursor_on);
    }

    pub fn toggle_flash<B: TerminalBackend>(&mut self, display: &mut Display<B>) {
        self.screen_flash_state = !self.screen_flash_state;
        self.repaint_where(display, |cell| cell.has_flash);
    }

    pub fn toggle_reveal<B: TerminalBackend>(&mut self, display: &mut Display<B>) {
        self.screen_revealed_state = !self.screen_revealed_state;
        self.repaint_where(display, |cell| cell.has_concealed);
    }

    fn repaint_where<B: TerminalBackend>(
        &mut self,
        display: &mut Display<B>,
        predicate: impl Fn(&Cell) -> bool,
    ) {
        let mut updates = Vec::new();
        for (row, col, cell) in self.grid.iter() {
            if predicate(cell) {
                updates.push((row, col, *cell));
            }
        }
        for (row, col, cell) in updates {
            let display_char = self.suppressed_char(cell.character, cell.attr);
            display.put(row, col, display_char, cell.attr);
        }
        display.move_cursor(self.row, self.col.min(MAX_COLS - 1));
    }

    /// Handles a control code byte. Returns true if `b` was a recognised
    /// control code (and was therefore fully handled, including `continue`).
    fn handle_control_code<B: TerminalBackend>(&mut self, b: u8, display: &mut Display<B>) -> bool {
        match b {
            0 => {}
            8 => {
                self.col = self.col.wrapping_sub(1);
                if self.col >= MAX_COLS {
                    self.col = MAX_COLS - 1;
                    self.row = if self.row == 0 { MAX_ROWS - 1 } else { self.row - 1 };
                }
            }
            9 => {
                self.col += 1;
                if self.col >= MAX_COLS {
                    self.col = 0;
                    self.row = if self.row + 1 >= MAX_ROWS { 0 } else { self.row + 1 };
                }
            }
            10 => {
                self.row = if self.row + 1 >= MAX_ROWS { 0 } else { self.row + 1 };
                self.col = 0;
                self.flags.reset_for_row(self.space);
                self.after_flags.reset();
            }
            11 => {
                self.row = if self.row == 0 { MAX_ROWS - 1 } else { self.row - 1 };
            }
            12 => {
                self.new_frame(display);
            }
            13 => {
                self.fill_end(display);
                self.col = 0;
            }
            17 => {
                self.flags.is_cursor_on = true;
            }
            20 => {
                self.flags.is_cursor_on = false;
            }
            30 => {
                self.fill_end(display);
                self.col = 0;
                self.row = 0;
            }
            _ => return false,
        }
        true
    }

    /// Attribute-group 0 (alpha color / box / height).
    fn apply_group0(&mut self, row_code: u8) {
        match row_code {
            0 | 14 | 15 => {}
            8 => self.after_flags.is_flashing = Tristate::True,
            9 => self.flags.is_flashing = false,
            10 => self.after_flags.is_boxing = Tristate::False,
            11 => self.after_flags.is_boxing = Tristate::True,
            12 => {
                self.flags.is_double_height = false;
                self.flags.held_mosaic = self.space;
            }
            13 => {
                if self.row < MAX_ROWS - 2 && Some(self.row) != self.dheight_low_row {
                    self.after_flags.is_double_height = Tristate::True;
                }
            }
            _ => self.after_flags.alpha_fg_color = DeferredColor::Set(Color::from_row_code(row_code)),
        }
    }

    /// Attribute-group 2 (mosaic color / conceal / hold graphics / ESC).
    /// Returns true only for the ESC code (row 11), which must not draw and
    /// must not advance the column.
    fn apply_group1(&mut self, row_code: u8) -> bool {
        match row_code {
            0 => {}
            8 => self.flags.is_concealed = true,
            9 => self.flags.is_contiguous = true,
            10 => self.flags.is_contiguous = false,
            11 => {
                self.flags.is_escaped = true;
                return true;
            }
            12 => self.flags.bg_color = Color::Black,
            13 => self.flags.bg_color = self.flags.effective_fg(),
            14 => self.flags.is_mosaic_held = true,
            15 => self.after_flags.is_mosaic_held = Tristate::False,
            _ => self.after_flags.mosaic_fg_color = DeferredColor::Set(Color::from_row_code(row_code)),
        }
        false
    }

    fn draw_step<B: TerminalBackend>(&mut self, row_code: u8, col_code: u8, display: &mut Display<B>) {
        if Some(self.row) == self.dheight_low_row {
            return;
        }

        let attr = self.current_attr();

        let triple = if col_code < 2 {
            if self.flags.is_mosaic_held && !self.flags.is_alpha {
                self.flags.held_mosaic
            } else {
                self.space
            }
        } else {
            let ch = CharTriple {
                single: self.font.map_char(row_code, col_code, self.flags.is_alpha, self.flags.is_contiguous, false, false),
                upper: self.font.map_char(row_code, col_code, self.flags.is_alpha, self.flags.is_contiguous, true, false),
                lower: self.font.map_char(row_code, col_code, self.flags.is_alpha, self.flags.is_contiguous, true, true),
            };
            if !self.flags.is_alpha {
                self.flags.held_mosaic = ch;
            }
            ch
        };

        let shown = if self.flags.is_double_height { triple.upper } else { triple.single };
        self.write_cell(self.row, self.col, shown, attr, display);

        if self.row == 0 {
            self.header_row[self.col] = triple.single;
        }

        if self.flags.is_double_height {
            if let Some(lower_row) = self.dheight_low_row {
                self.write_cell(lower_row, self.col, triple.lower, attr, display);
            }
        }
    }

    fn current_attr(&self) -> Attr {
        let mut style_bits = StyleBits::empty();
        if self.bold_mode {
            style_bits |= StyleBits::BOLD;
        }

        Attr {
            style_bits,
            color_pair: Attr::color_pair_number(self.flags.effective_fg(), self.flags.bg_color),
            has_flash: self.flags.is_flashing,
            has_concealed: self.flags.is_concealed,
        }
    }

    fn write_cell<B: TerminalBackend>(&mut self, row: usize, col: usize, character: u32, attr: Attr, display: &mut Display<B>) {
        let cell = Cell {
            character,
            attr,
            has_flash: attr.has_flash,
            has_concealed: attr.has_concealed,
        };
        self.grid.put(row, col, cell);

        let display_char = self.suppressed_char(character, attr);
        display.put(row, col, display_char, attr);
    }

    fn suppressed_char(&self, character: u32, attr: Attr) -> u32 {
        if attr.has_concealed && !self.screen_revealed_state {
            return 0x20;
        }
        if attr.has_flash && !self.screen_flash_state {
            return 0x20;
        }
        character
    }

    fn fill_end<B: TerminalBackend>(&mut self, display: &mut Display<B>) {
        if self.col == 0 {
            return;
        }

        let prev = *self.grid.get(self.row, self.col - 1);
        let attr = prev.attr;

        for col in self.col..MAX_COLS {
            let ch = self.grid.get(self.row, col).character;
            self.write_cell(self.row, col, ch, attr, display);
        }
    }

    fn next_row(&mut self) {
        self.row = if self.row + 1 >= MAX_ROWS { 0 } else { self.row + 1 };
        self.col = 0;
        self.flags.reset_for_row(self.space);
        self.after_flags.reset();
    }

    fn new_frame<B: TerminalBackend>(&mut self, display: &mut Display<B>) {
        self.reset_frame_state();

        for row in 0..MAX_ROWS {
            for col in 0..MAX_COLS {
                display.put(row, col, 0x20, Attr::default());
            }
        }
    }

    fn reset_frame_state(&mut self) {
        self.row = 0;
        self.col = 0;
        self.dheight_low_row = None;
        self.frame_buffer.clear();
        self.screen_revealed_state = false;
        self.flags = Flags::default_with_space(self.space);
        self.after_flags.reset();
        self.grid.clear();
        self.header_row = [0x20; MAX_COLS];
    }
}
