//! Grid cell contents and the attribute set attached to each draw.

use bitflags::bitflags;

use super::color::Color;

bitflags! {
    /// Style bits carried on an [`Attr`]. Only bold survives as a style bit;
    /// double-height rows are tracked by the decoder's reserved lower-row
    /// bookkeeping instead of smuggled through the style mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct StyleBits: u8 {
        const BOLD = 1 << 0;
    }
}

/// The effective presentation attribute for a single drawn cell.
///
/// This is a value type: it is computed fresh from [`super::flags::Flags`]
/// before every draw and copied into the [`Cell`], never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Attr {
    pub style_bits: StyleBits,
    /// `(fg << 3) | bg`, packed into one byte. Pair 0 is always white-on-black.
    pub color_pair: u8,
    pub has_flash: bool,
    pub has_concealed: bool,
}

impl Attr {
    pub fn color_pair_number(fg: Color, bg: Color) -> u8 {
        if fg == Color::White && bg == Color::Black {
            return 0;
        }
        (fg.bits() << 3) | bg.bits()
    }
}

/// One grid position: the last code point written plus its effective attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub character: u32,
    pub attr: Attr,
    pub has_flash: bool,
    pub has_concealed: bool,
}

pub const SPACE_CODEPOINT: u32 = 0x20;

impl Default for Cell {
    fn default() -> Self {
        Cell {
            character: SPACE_CODEPOINT,
            attr: Attr::default(),
            has_flash: false,
            has_concealed: false,
        }
    }
}

/// The same logical character in its single-height, double-height-upper, and
/// double-height-lower forms, as produced by a `CharMap` lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CharTriple {
    pub single: u32,
    pub upper: u32,
    pub lower: u32,
}

impl CharTriple {
    pub const fn space() -> Self {
        CharTriple {
            single: SPACE_CODEPOINT,
            upper: SPACE_CODEPOINT,
            lower: SPACE_CODEPOINT,
        }
    }
}
