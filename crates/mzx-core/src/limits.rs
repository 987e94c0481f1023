//! Fixed sizes shared by the data model and every file layout.

/// Bytes reserved for a world or board name on disk.
pub const BOARD_NAME_SIZE: usize = 25;

/// Bytes reserved for each shown status counter name.
pub const COUNTER_NAME_SIZE: usize = 15;

/// Number of status counter slots shown in the sidebar.
pub const NUM_STATUS_COUNTERS: usize = 6;

/// Number of door key slots a player can hold.
pub const NUM_KEYS: usize = 16;

/// Number of custom sound effect slots.
pub const NUM_SFX: usize = 50;

/// Maximum bytes in one custom sound effect string, NUL included.
pub const SFX_SIZE: usize = 69;

/// Glyphs in one charset.
pub const CHARSET_SIZE: usize = 256;

/// Bytes per glyph.
pub const CHAR_SIZE: usize = 14;

/// Byte length of one full charset.
pub const CHARSET_BYTES: usize = CHARSET_SIZE * CHAR_SIZE;

/// Charsets an extended (zip era) `chars` payload may carry.
pub const NUM_CHARSETS: usize = 15;

/// Sprite slots in a savegame.
pub const MAX_SPRITES: usize = 256;

/// Stored password length for protected worlds.
pub const MAX_PASSWORD_LENGTH: usize = 15;

/// Most boards a world may contain.
pub const MAX_BOARDS: usize = 250;

/// Entries in the thing-to-char lookup table.
pub const ID_CHARS_SIZE: usize = 323;

/// Entries in the thing damage table.
pub const ID_DMG_SIZE: usize = 128;

/// Colors in the regular palette.
pub const PAL_SIZE: usize = 16;

/// Colors in an SMZX palette.
pub const SMZX_PAL_SIZE: usize = 256;

/// Byte length of the SMZX color index table.
pub const SMZX_INDEX_SIZE: usize = 1024;

/// Upper bound on a legacy counter or string name length.
pub const MAX_LEGACY_NAME: usize = 512;
