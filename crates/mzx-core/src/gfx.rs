//! Palette, charset, and the char-id context table.

use crate::limits::{
    CHARSET_BYTES, ID_CHARS_SIZE, ID_DMG_SIZE, PAL_SIZE, SMZX_INDEX_SIZE, SMZX_PAL_SIZE,
};

/// One palette entry. Each channel is a 6-bit VGA value, 0..=63.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgb6 {
    /// Red channel, 0..=63.
    pub r: u8,
    /// Green channel, 0..=63.
    pub g: u8,
    /// Blue channel, 0..=63.
    pub b: u8,
}

impl Rgb6 {
    /// Build an entry, clamping each channel to the 6-bit range.
    ///
    /// Files in the wild carry out-of-range channels; loaders clamp
    /// rather than reject.
    pub fn clamped(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r.min(63),
            g: g.min(63),
            b: b.min(63),
        }
    }
}

/// The world palette.
///
/// `screen_mode` 0 and 1 use 16 colors; modes 2 and 3 (SMZX) use 256
/// and may carry an index table. Intensities and the index table only
/// exist in savegames.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    /// Screen mode, 0..=3.
    pub screen_mode: u16,
    /// Color entries; 16 or 256 depending on mode.
    pub colors: Vec<Rgb6>,
    /// Per-color intensity percentages (savegames).
    pub intensities: Option<Vec<u8>>,
    /// SMZX color index table (savegames at mode >= 2).
    pub index_table: Option<Vec<u8>>,
    /// Whether the palette is currently faded out (savegames).
    pub faded: bool,
}

impl Palette {
    /// Number of colors the current screen mode uses.
    pub fn color_count(&self) -> usize {
        if self.screen_mode > 1 {
            SMZX_PAL_SIZE
        } else {
            PAL_SIZE
        }
    }

    /// True when an index table of the expected size is attached.
    pub fn has_index_table(&self) -> bool {
        matches!(&self.index_table, Some(t) if t.len() == SMZX_INDEX_SIZE)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            screen_mode: 0,
            colors: vec![Rgb6::default(); PAL_SIZE],
            intensities: None,
            index_table: None,
            faded: false,
        }
    }
}

/// Raw charset bitmap data.
///
/// Legacy worlds always carry exactly one charset (3584 bytes); zip
/// worlds may carry up to 15 contiguous charsets in the same entry, so
/// the payload length is kept as loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Charset {
    /// Glyph rows, 14 bytes per glyph.
    pub data: Vec<u8>,
}

impl Default for Charset {
    fn default() -> Self {
        Self {
            data: vec![0; CHARSET_BYTES],
        }
    }
}

/// Lookup tables mapping thing ids to glyphs, colors, and damage.
///
/// Carried explicitly on the [`crate::World`] and passed by reference
/// wherever it is needed rather than living in module globals.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharIdTable {
    /// Thing-to-glyph table.
    pub id_chars: [u8; ID_CHARS_SIZE],
    /// Missile display color.
    pub missile_color: u8,
    /// Bullet display chars for the three bullet types.
    pub bullet_color: [u8; 3],
    /// Thing damage table.
    pub id_dmg: [u8; ID_DMG_SIZE],
}

impl Default for CharIdTable {
    fn default() -> Self {
        Self {
            id_chars: [0; ID_CHARS_SIZE],
            missile_color: 0,
            bullet_color: [0; 3],
            id_dmg: [0; ID_DMG_SIZE],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_clamps_to_six_bits() {
        let c = Rgb6::clamped(64, 63, 200);
        assert_eq!(c, Rgb6 { r: 63, g: 63, b: 63 });
    }

    #[test]
    fn palette_mode_selects_color_count() {
        let mut p = Palette::default();
        assert_eq!(p.color_count(), 16);
        p.screen_mode = 2;
        assert_eq!(p.color_count(), 256);
    }
}
