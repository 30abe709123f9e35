//! The seven teletext colors plus the deferred-change and tristate sentinels.

/// One of the eight named colors a Level 1 terminal can display.
///
/// Discriminants follow the row-code assignment used by the color attribute
/// bytes: `Black` is row code 0, `White` is 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Black = 0,
    Red = 1,
    Green = 2,
    Yellow = 3,
    Blue = 4,
    Magenta = 5,
    Cyan = 6,
    White = 7,
}

impl Color {
    /// Maps a color attribute's row code (0..=7) to its color.
    pub fn from_row_code(row_code: u8) -> Self {
        match row_code {
            0 => Color::Black,
            1 => Color::Red,
            2 => Color::Green,
            3 => Color::Yellow,
            4 => Color::Blue,
            5 => Color::Magenta,
            6 => Color::Cyan,
            7 => Color::White,
            _ => unreachable!("row code {row_code} is not a color code"),
        }
    }

    pub fn bits(self) -> u8 {
        self as u8
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::White
    }
}

/// Deferred color change in an [`super::flags::AfterFlags`] register.
/// `None` means "nothing pending".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredColor {
    None,
    Set(Color),
}

impl Default for DeferredColor {
    fn default() -> Self {
        DeferredColor::None
    }
}

/// A deferred boolean with three states. Plain `Option<bool>` would work but
/// naming the "leave alone" state keeps the after-flags bookkeeping readable
/// next to `Tristate::True`/`Tristate::False`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tristate {
    True,
    False,
    Undef,
}

impl Default for Tristate {
    fn default() -> Self {
        Tristate::Undef
    }
}
