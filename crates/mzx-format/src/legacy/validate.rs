//! Read-only structural validation of legacy files.
//!
//! The validator walks exactly the byte ranges the loader will read,
//! without building any world state. Once it passes, the loader may
//! treat any remaining read failure as file corruption happening
//! underneath us.

use log::debug;

use crate::codec::{trim_padded, ByteReader};
use crate::error::WorldError;
use crate::legacy::{read_board_directory, WORLD_BLOCK_1_SIZE, WORLD_GLOBAL_OFFSET_OFFSET};
use crate::magic::{save_magic, world_magic};
use mzx_core::limits::{BOARD_NAME_SIZE, MAX_LEGACY_NAME, MAX_SPRITES};
use mzx_core::Version;

/// What validation learned about a legacy file.
#[derive(Clone, Debug)]
pub struct LegacyHeader {
    /// World name (empty for savegames, which store none).
    pub name: Vec<u8>,
    /// Version translated from the magic.
    pub version: Version,
    /// For savegames, the version of the world the save came from.
    pub world_version: Version,
    /// For savegames, the board the player is on.
    pub current_board: u8,
    /// Number of boards in the directory.
    pub num_boards: usize,
}

fn check_world_version(v: u16) -> Result<Version, WorldError> {
    match v {
        0 => Err(WorldError::InvalidMagic),
        v if v < Version::V200.0 => Err(WorldError::UnsupportedVersion {
            found: Version(v),
            newer: false,
        }),
        v if v > Version::V284.0 => Err(WorldError::UnsupportedVersion {
            found: Version(v),
            newer: true,
        }),
        v => Ok(Version(v)),
    }
}

fn check_save_version(v: u16) -> Result<Version, WorldError> {
    match v {
        0 => Err(WorldError::InvalidMagic),
        v if v != Version::LEGACY_FORMAT.0 => Err(WorldError::UnsupportedVersion {
            found: Version(v),
            newer: v > Version::V284.0,
        }),
        v => Ok(Version(v)),
    }
}

/// Walk the savegame block between the status counters and the
/// global settings.
fn walk_save_block_a(r: &mut ByteReader<'_>) -> Result<(), WorldError> {
    // Keys, potion durations, saved player positions and boards,
    // interface colors.
    r.skip(16 + 5 + 16 + 16 + 8 + 10)?;
    let mod_len = r.u16()? as usize;
    r.skip(mod_len)?;
    Ok(())
}

/// Walk the savegame trailer between the palette and the global robot
/// offset.
fn walk_save_block_b(r: &mut ByteReader<'_>) -> Result<(), WorldError> {
    // Intensities, fade flag, restart position, under-player state.
    r.skip(16 + 1 + 4 + 3)?;

    let num_counters = r.u32()? as usize;
    if num_counters > r.remaining() / 8 {
        return Err(WorldError::invalid(format!(
            "counter count {num_counters} cannot fit in the file"
        )));
    }
    for i in 0..num_counters {
        r.skip(4)?; // value
        let name_len = r.u32()? as usize;
        if name_len >= MAX_LEGACY_NAME {
            return Err(WorldError::invalid(format!(
                "counter {i} name is {name_len} bytes"
            )));
        }
        r.skip(name_len)?;
    }

    let num_strings = r.u32()? as usize;
    if num_strings > r.remaining() / 8 {
        return Err(WorldError::invalid(format!(
            "string count {num_strings} cannot fit in the file"
        )));
    }
    for i in 0..num_strings {
        let name_len = r.u32()? as usize;
        let value_len = r.u32()? as usize;
        if name_len >= MAX_LEGACY_NAME {
            return Err(WorldError::invalid(format!(
                "string {i} name is {name_len} bytes"
            )));
        }
        r.skip(name_len)?;
        r.skip(value_len)?;
    }

    // Sprite block, misc words, builtin status bytes.
    r.skip(MAX_SPRITES * 16 + 2 + 2 + MAX_SPRITES * 2 + 12)?;

    let input_len = r.u16()? as usize;
    r.skip(input_len + 4)?;
    let output_len = r.u16()? as usize;
    r.skip(output_len + 4)?;

    let screen_mode = r.u16()?;
    if screen_mode > 3 {
        return Err(WorldError::invalid(format!(
            "impossible screen mode {screen_mode}"
        )));
    }
    if screen_mode > 1 {
        r.skip(768)?;
    }

    r.skip(4)?; // commands

    let vlayer_size = r.u32()? as usize;
    let width = r.u16()? as usize;
    let height = r.u16()? as usize;
    if width * height > vlayer_size {
        return Err(WorldError::invalid(format!(
            "vlayer {width}x{height} exceeds its size {vlayer_size}"
        )));
    }
    r.skip(vlayer_size)?;
    r.skip(vlayer_size)?;
    Ok(())
}

/// Validate a legacy world or savegame without loading anything.
pub fn validate_legacy_world(data: &[u8], savegame: bool) -> Result<LegacyHeader, WorldError> {
    let mut r = ByteReader::new(data);
    let mut name = Vec::new();
    let version;
    let world_version;
    let mut current_board = 0;

    if savegame {
        let magic: [u8; 5] = r.take(5)?.try_into().unwrap_or([0; 5]);
        version = check_save_version(save_magic(&magic))?;
        world_version = Version(r.u16()?);
        current_board = r.u8()?;
    } else {
        name = trim_padded(r.take(BOARD_NAME_SIZE)?).to_vec();
        match r.u8()? {
            0 => {}
            1..=3 => {
                return Err(WorldError::invalid(
                    "world is protected and has not been decrypted",
                ))
            }
            // Not a protection method, so not a world header at all.
            _ => return Err(WorldError::InvalidMagic),
        }
        let magic: [u8; 3] = r.take(3)?.try_into().unwrap_or([0; 3]);
        version = check_world_version(world_magic(&magic))?;
        world_version = version;
    }
    debug!("validating legacy {} version {version}", if savegame { "save" } else { "world" });

    r.skip(WORLD_BLOCK_1_SIZE)?;
    if savegame {
        walk_save_block_a(&mut r)?;
    }
    r.skip(24)?;
    let palette = r.take(48)?;
    if !savegame && palette.iter().any(|&b| b > 63) {
        // Every palette channel is 0..=63 on disk; anything else means
        // a misidentified file.
        return Err(WorldError::invalid("impossible palette value"));
    }
    if savegame {
        walk_save_block_b(&mut r)?;
    } else {
        debug_assert_eq!(r.pos(), WORLD_GLOBAL_OFFSET_OFFSET);
    }

    let gl_offset = r.u32()? as usize;
    if gl_offset >= data.len() {
        return Err(WorldError::invalid(format!(
            "global robot offset {gl_offset} past end of file ({})",
            data.len()
        )));
    }

    let dir = read_board_directory(&mut r)?;

    Ok(LegacyHeader {
        name,
        version,
        world_version,
        current_board,
        num_boards: dir.table.len(),
    })
}
