//! CharMap: the two pure `(row_code, col_code, mode) -> code_point` tables.
//! `default_font` is the rounded teletext font used out of the box;
//! `compat_font` is the high-compatibility alternate font selected with
//! `--galax`. Both are total functions with no dependency on decoder state.

/// Which mapping table [`map_char`] should consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Default,
    Compat,
}

impl Font {
    pub fn map_char(
        self,
        row_code: u8,
        col_code: u8,
        is_alpha: bool,
        is_contiguous: bool,
        is_dheight: bool,
        is_dheight_lower: bool,
    ) -> u32 {
        match self {
            Font::Default => {
                default_font(row_code, col_code, is_alpha, is_contiguous, is_dheight, is_dheight_lower)
            }
            Font::Compat => {
                compat_font(row_code, col_code, is_alpha, is_contiguous, is_dheight, is_dheight_lower)
            }
        }
    }
}

/// The default rounded-teletext font.
pub fn default_font(
    row_code: u8,
    col_code: u8,
    is_alpha: bool,
    is_contiguous: bool,
    is_dheight: bool,
    is_dheight_lower: bool,
) -> u32 {
    if row_code > 15 || col_code > 7 {
        return 0x20;
    }

    let is_graph = !is_alpha;
    let row = row_code as u32;

    let mut ch = match col_code {
        2 if is_alpha => match row_code {
            3 => 0xA3,
            _ => 0x20 + row,
        },
        2 if is_graph => (if is_contiguous { 0xEE00 } else { 0xEE20 }) + row,
        3 if is_alpha => 0x30 + row,
        3 if is_graph => (if is_contiguous { 0xEE10 } else { 0xEE30 }) + row,
        4 => 0x40 + row,
        5 => match row_code {
            11 => 0x2190,
            12 => 0xBD,
            13 => 0x2192,
            14 => 0x2191,
            15 => 0x23,
            _ => 0x50 + row,
        },
        6 if is_alpha => match row_code {
            0 => 0x2013,
            _ => 0x60 + row,
        },
        6 if is_graph => (if is_contiguous { 0xEE40 } else { 0xEE60 }) + row,
        7 if is_alpha => match row_code {
            11 => 0xBC,
            12 => 0x2016,
            13 => 0xBE,
            14 => 0xF7,
            15 => 0x25A0,
            _ => 0x70 + row,
        },
        7 if is_graph => (if is_contiguous { 0xEE50 } else { 0xEE70 }) + row,
        _ => 0x20,
    };

    if is_dheight {
        if is_graph {
            ch += if is_dheight_lower { 0x80 } else { 0x40 };
        } else {
            ch += if is_dheight_lower { 0xE100 } else { 0xE000 };
        }
    }

    ch
}

/// The high-compatibility alternate ("Mode 7") font selected by `--galax`.
pub fn compat_font(
    row_code: u8,
    col_code: u8,
    is_alpha: bool,
    is_contiguous: bool,
    is_dheight: bool,
    is_dheight_lower: bool,
) -> u32 {
    if row_code > 15 || col_code > 7 {
        return '?' as u32;
    }

    let is_graph = !is_alpha;
    let row = row_code as u32;
    let mut ch: u32 = 0x20;

    if is_graph {
        ch = match col_code {
            2 => 0xE200 + row,
            3 => 0xE210 + row,
            6 => 0xE220 + row,
            7 => 0xE230 + row,
            _ => ch,
        };

        if !is_contiguous {
            ch += 0xC0;
        }

        if is_dheight {
            ch += if is_dheight_lower { 0x80 } else { 0x40 };
        }
    } else {
        ch = match col_code {
            2 => match row_code {
                3 => 0xA3,
                _ => 0x20 + row,
            },
            3 => 0x30 + row,
            4 => 0x40 + row,
            5 => match row_code {
                12 => 0xBD,
                15 => 0x23,
                _ => 0x50 + row,
            },
            6 => 0x60 + row,
            7 => match row_code {
                11 => 0xBC,
                13 => 0xBE,
                14 => 0xF7,
                15 => 0xB6,
                _ => 0x70 + row,
            },
            _ => ch,
        };

        if is_dheight {
            ch += if is_dheight_lower { 0xE100 } else { 0xE000 };
        }
    }

    ch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_font_maps_pound_sign() {
        assert_eq!(default_font(3, 2, true, true, false, false), 0xA3);
    }

    #[test]
    fn default_font_ascii_passthrough_for_digits() {
        // col 3, row 5 -> '5' (0x35)
        assert_eq!(default_font(5, 3, true, true, false, false), 0x35);
    }

    #[test]
    fn default_font_out_of_range_is_space() {
        assert_eq!(default_font(0, 8, true, true, false, false), 0x20);
    }

    #[test]
    fn default_font_mosaic_separated_offsets_by_0x20() {
        let contiguous = default_font(4, 2, false, true, false, false);
        let separated = default_font(4, 2, false, false, false, false);
        assert_eq!(separated - contiguous, 0x20);
    }

    #[test]
    fn default_font_double_height_upper_lower_differ() {
        let single = default_font(5, 4, true, true, false, false);
        let upper = default_font(5, 4, true, true, true, false);
        let lower = default_font(5, 4, true, true, true, true);
        assert_ne!(single, upper);
        assert_ne!(upper, lower);
    }

    #[test]
    fn compat_font_maps_pound_sign() {
        assert_eq!(compat_font(3, 2, true, true, false, false), 0xA3);
    }

    #[test]
    fn compat_font_mosaic_uses_private_use_range() {
        let code = compat_font(0, 2, false, true, false, false);
        assert_eq!(code, 0xE200);
    }

    #[test]
    fn compat_font_out_of_range_is_question_mark() {
        assert_eq!(compat_font(16, 0, true, true, false, false), '?' as u32);
    }

    #[test]
    fn font_enum_dispatches_to_selected_table() {
        assert_eq!(
            Font::Default.map_char(3, 2, true, true, false, false),
            default_font(3, 2, true, true, false, false)
        );
        assert_eq!(
            Font::Compat.map_char(3, 2, true, true, false, false),
            compat_font(3, 2, true, true, false, false)
        );
    }
}
