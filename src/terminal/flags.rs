//! Current and deferred presentation state for the decoder.

use super::cell::CharTriple;
use super::color::{Color, DeferredColor, Tristate};

/// The decoder's current presentation state, mutated as control/attribute
/// bytes are processed. Reset to defaults at the start of every row, except
/// `is_cursor_on`, which persists across row boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flags {
    pub bg_color: Color,
    pub alpha_fg_color: Color,
    pub mosaic_fg_color: Color,
    pub is_alpha: bool,
    pub is_contiguous: bool,
    pub is_flashing: bool,
    pub is_boxing: bool,
    pub is_concealed: bool,
    pub is_mosaic_held: bool,
    pub is_double_height: bool,
    pub is_escaped: bool,
    pub is_cursor_on: bool,
    pub held_mosaic: CharTriple,
}

impl Flags {
    /// Resets every field that the Level 1 spec resets at the start of a
    /// row, leaving `is_cursor_on` untouched.
    pub fn reset_for_row(&mut self, space: CharTriple) {
        let is_cursor_on = self.is_cursor_on;
        *self = Flags::default_with_space(space);
        self.is_cursor_on = is_cursor_on;
    }

    pub fn default_with_space(space: CharTriple) -> Self {
        Flags {
            bg_color: Color::Black,
            alpha_fg_color: Color::White,
            mosaic_fg_color: Color::White,
            is_alpha: true,
            is_contiguous: true,
            is_flashing: false,
            is_boxing: false,
            is_concealed: false,
            is_mosaic_held: false,
            is_double_height: false,
            is_escaped: false,
            is_cursor_on: false,
            held_mosaic: space,
        }
    }

    pub fn effective_fg(&self) -> Color {
        if self.is_alpha {
            self.alpha_fg_color
        } else {
            self.mosaic_fg_color
        }
    }
}

/// Deferred changes queued by Set-After attribute bytes, applied once the
/// current cell has been drawn ("After-flags application").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AfterFlags {
    pub alpha_fg_color: DeferredColor,
    pub mosaic_fg_color: DeferredColor,
    pub is_flashing: Tristate,
    pub is_boxing: Tristate,
    pub is_mosaic_held: Tristate,
    pub is_double_height: Tristate,
}

impl AfterFlags {
    pub fn reset(&mut self) {
        *self = AfterFlags::default();
    }

    /// Applies pending changes to `flags` in a fixed order, then leaves
    /// `self` untouched — callers reset separately so a double-height
    /// pending-change can still be read right after this call.
    pub fn apply_to(&self, flags: &mut Flags, space: CharTriple) {
        let was_alpha = flags.is_alpha;

        if let DeferredColor::Set(color) = self.alpha_fg_color {
            flags.alpha_fg_color = color;
            flags.is_alpha = true;
            flags.is_concealed = false;
        } else if let DeferredColor::Set(color) = self.mosaic_fg_color {
            flags.mosaic_fg_color = color;
            flags.is_alpha = false;
            flags.is_concealed = false;
        }

        if flags.is_alpha != was_alpha {
            flags.held_mosaic = space;
        }

        if self.is_flashing == Tristate::True {
            flags.is_flashing = true;
        }

        if self.is_boxing != Tristate::Undef {
            flags.is_boxing = self.is_boxing == Tristate::True;
        }

        if self.is_mosaic_held == Tristate::False {
            flags.is_mosaic_held = false;
        }

        if self.is_double_height == Tristate::True {
            flags.is_double_height = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_reset_preserves_cursor_state() {
        let space = CharTriple::space();
        let mut flags = Flags::default_with_space(space);
        flags.is_cursor_on = true;
        flags.alpha_fg_color = Color::Green;
        flags.reset_for_row(space);
        assert!(flags.is_cursor_on);
        assert_eq!(flags.alpha_fg_color, Color::White);
    }

    #[test]
    fn apply_alpha_color_forces_alpha_and_clears_concealed() {
        let space = CharTriple::space();
        let mut flags = Flags::default_with_space(space);
        flags.is_alpha = false;
        flags.is_concealed = true;

        let mut after = AfterFlags::default();
        after.alpha_fg_color = DeferredColor::Set(Color::Green);
        after.apply_to(&mut flags, space);

        assert_eq!(flags.alpha_fg_color, Color::Green);
        assert!(flags.is_alpha);
        assert!(!flags.is_concealed);
    }

    #[test]
    fn mode_switch_resets_held_mosaic() {
        let space = CharTriple::space();
        let mut flags = Flags::default_with_space(space);
        flags.is_alpha = true;
        flags.held_mosaic = CharTriple {
            single: 0x1234,
            upper: 0x1234,
            lower: 0x1234,
        };

        let mut after = AfterFlags::default();
        after.mosaic_fg_color = DeferredColor::Set(Color::Red);
        after.apply_to(&mut flags, space);

        assert!(!flags.is_alpha);
        assert_eq!(flags.held_mosaic, space);
    }

    #[test]
    fn flash_set_after_has_no_symmetric_clear() {
        let space = CharTriple::space();
        let mut flags = Flags::default_with_space(space);
        let mut after = AfterFlags::default();
        after.is_flashing = Tristate::False;
        after.apply_to(&mut flags, space);
        // is_flashing only ever turns on via after-flags; Steady (0x09) is
        // the sole immediate clear, handled directly by the decoder.
        assert!(!flags.is_flashing);

        after.is_flashing = Tristate::True;
        after.apply_to(&mut flags, space);
        assert!(flags.is_flashing);
    }

    #[test]
    fn reset_clears_all_after_flags() {
        let mut after = AfterFlags::default();
        after.alpha_fg_color = DeferredColor::Set(Color::Red);
        after.is_boxing = Tristate::True;
        after.reset();
        assert_eq!(after, AfterFlags::default());
    }
}
