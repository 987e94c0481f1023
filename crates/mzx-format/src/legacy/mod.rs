//! The flat binary container used through version 2.84.
//!
//! Layout of a world file:
//!
//! ```text
//! offset 0    25-byte name, protection byte, 3-byte magic
//!        29   block 1: charset (3584), id tables (455),
//!             status counters (90)
//!        4158 block 2: global settings (24), palette (48)
//!        4230 u32 absolute offset of the global robot
//!             optional custom SFX block, board count
//!             board names (25 each), board size/offset table (8 each)
//!             board records, global robot record
//! ```
//!
//! Savegames insert runtime blocks after the status counters and after
//! the palette, and start with a five-byte magic instead of the name
//! header. Protected worlds insert a 15-byte password before the magic
//! and XOR everything after the header with one keystream byte.

mod decrypt;
mod load;
mod save;
mod validate;

pub use decrypt::{decrypt_world, is_protected};
#[cfg(test)]
pub(crate) use decrypt::encrypt_world;
pub use load::load_legacy_world;
pub use save::save_legacy_world;
pub use validate::{validate_legacy_world, LegacyHeader};

use crate::codec::ByteReader;
use crate::error::WorldError;
use mzx_core::limits::{BOARD_NAME_SIZE, MAX_BOARDS, NUM_SFX, SFX_SIZE};

/// Bytes before the body of an unprotected world.
pub const WORLD_HEADER_SIZE: usize = 29;

/// Bytes before the body of a protected world (password included).
pub const PROTECTED_HEADER_SIZE: usize = WORLD_HEADER_SIZE + 15;

/// Byte length of block 1 (charset, id tables, status counters).
pub const WORLD_BLOCK_1_SIZE: usize = 4129;

/// Byte length of block 2 (global settings, palette).
pub const WORLD_BLOCK_2_SIZE: usize = 72;

/// Absolute offset of the global robot offset field in a world file.
pub const WORLD_GLOBAL_OFFSET_OFFSET: usize =
    WORLD_HEADER_SIZE + WORLD_BLOCK_1_SIZE + WORLD_BLOCK_2_SIZE;

/// The board directory at the tail of a legacy file: the optional
/// custom SFX block, the board count, names, and the size/offset
/// table.
#[derive(Clone, Debug)]
pub(crate) struct BoardDirectory {
    /// Parsed custom SFX strings, when the block was present.
    pub sfx: Option<Vec<Vec<u8>>>,
    /// Board names, NUL padding stripped.
    pub names: Vec<Vec<u8>>,
    /// Per-board (size, absolute offset) pairs. Size 0 marks a
    /// deleted slot with no body.
    pub table: Vec<(u32, u32)>,
}

/// Walk the board directory at the reader's current position.
///
/// Shared by the validator, the loader, and the decryptor so all
/// three agree on the structure byte for byte.
pub(crate) fn read_board_directory(r: &mut ByteReader<'_>) -> Result<BoardDirectory, WorldError> {
    let mut num_boards = r.u8()? as usize;
    let mut sfx = None;

    if num_boards == 0 {
        // A zero count means a custom SFX block precedes the real
        // count.
        let declared = r.u16()? as usize;
        let start = r.pos();
        let mut effects = Vec::with_capacity(NUM_SFX);
        for slot in 0..NUM_SFX {
            let len = r.u8()? as usize;
            if len >= SFX_SIZE {
                return Err(WorldError::invalid(format!(
                    "custom SFX slot {slot} is {len} bytes (limit {})",
                    SFX_SIZE - 1
                )));
            }
            effects.push(r.bytes(len)?);
        }
        if r.pos() - start != declared {
            return Err(WorldError::invalid(format!(
                "custom SFX block is {} bytes but declares {declared}",
                r.pos() - start
            )));
        }
        sfx = Some(effects);
        num_boards = r.u8()? as usize;
    }

    if num_boards == 0 || num_boards > MAX_BOARDS {
        return Err(WorldError::invalid(format!(
            "impossible board count {num_boards}"
        )));
    }

    let mut names = Vec::with_capacity(num_boards);
    for _ in 0..num_boards {
        let field = r.take(BOARD_NAME_SIZE)?;
        names.push(crate::codec::trim_padded(field).to_vec());
    }

    let mut table = Vec::with_capacity(num_boards);
    for i in 0..num_boards {
        let size = r.u32()?;
        let offset = r.u32()?;
        if size != 0 {
            let end = offset as usize + size as usize;
            if end > r.len() {
                return Err(WorldError::invalid(format!(
                    "board {i} spans {offset}..{end} past end of file ({})",
                    r.len()
                )));
            }
        }
        table.push((size, offset));
    }

    Ok(BoardDirectory { sfx, names, table })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{put_u16, put_u32};

    fn directory_bytes(sfx: bool, boards: &[(&[u8], &[u8])]) -> Vec<u8> {
        let mut out = Vec::new();
        if sfx {
            out.push(0);
            let mut block = Vec::new();
            for i in 0..NUM_SFX {
                if i == 0 {
                    block.push(3);
                    block.extend_from_slice(b"5c+");
                } else {
                    block.push(0);
                }
            }
            put_u16(&mut out, block.len() as u16);
            out.extend_from_slice(&block);
        }
        out.push(boards.len() as u8);
        for (name, _) in boards {
            crate::codec::put_padded(&mut out, name, BOARD_NAME_SIZE);
        }
        // Bodies follow the table directly in this fixture.
        let mut offset = out.len() + boards.len() * 8;
        for (_, body) in boards {
            put_u32(&mut out, body.len() as u32);
            put_u32(&mut out, offset as u32);
            offset += body.len();
        }
        for (_, body) in boards {
            out.extend_from_slice(body);
        }
        out
    }

    #[test]
    fn directory_without_sfx() {
        let data = directory_bytes(false, &[(b"title", b"abc"), (b"level 1", b"defg")]);
        let mut r = ByteReader::new(&data);
        let dir = read_board_directory(&mut r).unwrap();
        assert!(dir.sfx.is_none());
        assert_eq!(dir.names, vec![b"title".to_vec(), b"level 1".to_vec()]);
        assert_eq!(dir.table[0].0, 3);
        assert_eq!(dir.table[1].0, 4);
    }

    #[test]
    fn directory_with_sfx_block() {
        let data = directory_bytes(true, &[(b"title", b"abc")]);
        let mut r = ByteReader::new(&data);
        let dir = read_board_directory(&mut r).unwrap();
        let sfx = dir.sfx.unwrap();
        assert_eq!(sfx.len(), NUM_SFX);
        assert_eq!(sfx[0], b"5c+");
        assert!(sfx[1].is_empty());
    }

    #[test]
    fn oversize_sfx_slot_is_rejected() {
        let mut data = vec![0u8]; // count 0: SFX follows
        put_u16(&mut data, 70);
        data.push(69); // slot length at the limit
        data.extend_from_slice(&[b'x'; 69]);
        let mut r = ByteReader::new(&data);
        let err = read_board_directory(&mut r).unwrap_err();
        assert!(err.to_string().contains("SFX"));
    }

    #[test]
    fn board_spanning_past_eof_is_rejected() {
        let mut data = vec![1u8];
        crate::codec::put_padded(&mut data, b"title", BOARD_NAME_SIZE);
        put_u32(&mut data, 100); // size
        put_u32(&mut data, 10); // offset: 10 + 100 > len
        let mut r = ByteReader::new(&data);
        assert!(read_board_directory(&mut r).is_err());
    }
}
