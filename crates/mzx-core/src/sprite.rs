//! Sprite state carried by savegames.

use crate::limits::MAX_SPRITES;

/// One sprite slot.
///
/// Coordinates are signed; legacy files store them as 16-bit words and
/// sign-extend on load. `transparent_color` and `charset_offset` only
/// exist in the zip-era encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sprite {
    /// Screen x position.
    pub x: i32,
    /// Screen y position.
    pub y: i32,
    /// Source x on the reference board.
    pub ref_x: i32,
    /// Source y on the reference board.
    pub ref_y: i32,
    /// Display color.
    pub color: u8,
    /// Behavior flags.
    pub flags: u8,
    /// Width in chars.
    pub width: u8,
    /// Height in chars.
    pub height: u8,
    /// Collision rectangle x.
    pub col_x: u8,
    /// Collision rectangle y.
    pub col_y: u8,
    /// Collision rectangle width.
    pub col_width: u8,
    /// Collision rectangle height.
    pub col_height: u8,
    /// Color treated as transparent (zip only).
    pub transparent_color: i32,
    /// Charset offset applied when drawing (zip only).
    pub charset_offset: i32,
    /// Draw order depth (zip only).
    pub z: i32,
}

/// All sprite slots plus the global sprite bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpriteTable {
    /// The 256 sprite slots.
    pub sprites: Vec<Sprite>,
    /// Number of active sprites.
    pub active: i32,
    /// Whether sprites draw in y order.
    pub y_order: bool,
    /// Sprites recorded by the last collision check.
    pub collision_list: Vec<i32>,
    /// Value of the `spr_num` builtin (zip only).
    pub sprite_num: u16,
}

impl SpriteTable {
    /// Number of entries in the collision list.
    pub fn collision_count(&self) -> usize {
        self.collision_list.len()
    }
}

impl Default for SpriteTable {
    fn default() -> Self {
        Self {
            sprites: vec![Sprite::default(); MAX_SPRITES],
            active: 0,
            y_order: false,
            collision_list: Vec::new(),
            sprite_num: 0,
        }
    }
}
