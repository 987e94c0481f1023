//! The zip container used from version 2.90 on.
//!
//! A modern file is the legacy header prefix (world name, protection
//! byte, magic for worlds; the five-byte magic for savegames)
//! followed by a zip archive. Entry names identify world components;
//! the `world` entry is a property stream holding everything small,
//! and bulk data (charsets, palettes, layer planes, objects) gets an
//! entry each.

mod info;
mod load;
mod names;
mod save;

pub use load::{load_zip_world, validate_zip_world, ZipHeader};
pub use save::save_zip_world;

pub(crate) use names::{assign_id, entry_name, EntryIdent};

/// No identity: the entry is ignored.
pub(crate) const FILE_ID_NONE: u16 = 0x0000;
/// The `world` property stream.
pub(crate) const FILE_ID_WORLD_INFO: u16 = 0x0001;
/// The global robot record.
pub(crate) const FILE_ID_GLOBAL_ROBOT: u16 = 0x0004;
/// Custom SFX table.
pub(crate) const FILE_ID_SFX: u16 = 0x0007;
/// Charset data.
pub(crate) const FILE_ID_CHARS: u16 = 0x0008;
/// Palette RGB data.
pub(crate) const FILE_ID_PAL: u16 = 0x0009;
/// SMZX palette index table.
pub(crate) const FILE_ID_PAL_INDEX: u16 = 0x000A;
/// Vlayer colors.
pub(crate) const FILE_ID_VCO: u16 = 0x000C;
/// Vlayer chars.
pub(crate) const FILE_ID_VCH: u16 = 0x000D;
/// Palette intensities.
pub(crate) const FILE_ID_PAL_INTENSITY: u16 = 0x000E;
/// Sprite property stream.
pub(crate) const FILE_ID_SPRITES: u16 = 0x0080;
/// Counter stream.
pub(crate) const FILE_ID_COUNTERS: u16 = 0x0081;
/// String stream.
pub(crate) const FILE_ID_STRINGS: u16 = 0x0082;
/// Board info property stream.
pub(crate) const FILE_ID_BOARD_INFO: u16 = 0x0100;
/// First board layer plane id; the eight planes are contiguous.
pub(crate) const FILE_ID_BOARD_BID: u16 = 0x0101;
/// A robot on a board.
pub(crate) const FILE_ID_ROBOT: u16 = 0x1000;
/// A scroll on a board.
pub(crate) const FILE_ID_SCROLL: u16 = 0x2000;
/// A sensor on a board.
pub(crate) const FILE_ID_SENSOR: u16 = 0x3000;
