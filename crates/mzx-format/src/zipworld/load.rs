//! Validation and loading of zip-container worlds.
//!
//! Validation opens the archive, maps every entry name to an identity,
//! and structurally checks the `world` property stream, all without
//! touching any world state. Loading then makes one linear pass over
//! the entries in (board, file id, object id) order.

use std::io::{Cursor, Read};

use log::warn;
use zip::{CompressionMethod, ZipArchive};

use super::info::{
    check_world_info, load_counters, load_sfx, load_sprites, load_strings, load_world_info,
    peek_world_info,
};
use super::{assign_id, EntryIdent};
use super::{
    FILE_ID_BOARD_INFO, FILE_ID_CHARS, FILE_ID_COUNTERS, FILE_ID_GLOBAL_ROBOT, FILE_ID_NONE,
    FILE_ID_PAL, FILE_ID_PAL_INDEX, FILE_ID_PAL_INTENSITY, FILE_ID_ROBOT, FILE_ID_SCROLL,
    FILE_ID_SENSOR, FILE_ID_SFX, FILE_ID_SPRITES, FILE_ID_STRINGS, FILE_ID_VCH, FILE_ID_VCO,
    FILE_ID_WORLD_INFO,
};
use crate::dispatch::LoadContext;
use crate::error::WorldError;
use crate::legacy::WORLD_HEADER_SIZE;
use crate::magic::{save_magic, world_magic};
use mzx_core::limits::{CHARSET_BYTES, MAX_BOARDS, NUM_CHARSETS, SMZX_PAL_SIZE};
use mzx_core::{Board, Rgb6, SaveState, Version, World};

/// Savegame prefix: five magic bytes, a world version word, and the
/// current board.
pub(crate) const SAVE_PREFIX_SIZE: usize = 8;

fn archive_err(e: zip::result::ZipError) -> WorldError {
    WorldError::Archive {
        detail: e.to_string(),
    }
}

/// One archive entry the loader will visit.
#[derive(Clone, Copy, Debug)]
struct Entry {
    ident: EntryIdent,
    index: usize,
}

/// What validation learned about a zip-container file.
#[derive(Clone, Debug)]
pub struct ZipHeader {
    /// World name from the `world` property stream.
    pub name: Vec<u8>,
    /// Version translated from the magic.
    pub version: Version,
    /// Version of the editor that created the world.
    pub world_version: Version,
    /// For savegames, the board the player is on.
    pub current_board: u8,
    /// Number of boards the world declares.
    pub num_boards: usize,
    /// Entries in load order.
    entries: Vec<Entry>,
    /// Decompressed `world` property stream, kept so the loader does
    /// not inflate it twice.
    world_info: Vec<u8>,
}

fn check_zip_version(v: u16) -> Result<Version, WorldError> {
    match v {
        0 => Err(WorldError::InvalidMagic),
        v if v > Version::CURRENT.0 => Err(WorldError::UnsupportedVersion {
            found: Version(v),
            newer: true,
        }),
        v if v < Version::V290.0 => Err(WorldError::invalid(format!(
            "version {} predates the zip container",
            Version(v)
        ))),
        v => Ok(Version(v)),
    }
}

/// Parse the legacy-style prefix in front of the archive.
///
/// Returns the file version, the embedded world version, and the
/// current board byte (savegames only).
fn read_prefix(data: &[u8], savegame: bool) -> Result<(Version, Version, u8), WorldError> {
    if savegame {
        if data.len() < SAVE_PREFIX_SIZE {
            return Err(WorldError::InvalidMagic);
        }
        let mut magic = [0u8; 5];
        magic.copy_from_slice(&data[..5]);
        let version = check_zip_version(save_magic(&magic))?;
        let world_version = Version(u16::from_le_bytes([data[5], data[6]]));
        Ok((version, world_version, data[7]))
    } else {
        if data.len() < WORLD_HEADER_SIZE {
            return Err(WorldError::InvalidMagic);
        }
        if data[25] != 0 {
            return Err(WorldError::invalid(
                "world carries a protection byte but uses the zip container",
            ));
        }
        let mut magic = [0u8; 3];
        magic.copy_from_slice(&data[26..29]);
        let version = check_zip_version(world_magic(&magic))?;
        Ok((version, version, 0))
    }
}

fn compression_allowed(method: CompressionMethod) -> bool {
    matches!(method, CompressionMethod::Stored | CompressionMethod::Deflated)
}

fn read_entry(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    index: usize,
) -> Result<Vec<u8>, WorldError> {
    let mut file = archive.by_index(index).map_err(archive_err)?;
    let mut buf = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Validate a zip-container world or savegame without loading it.
///
/// On success the returned header carries everything the loader needs;
/// the file bytes have not been used to build any world state.
pub fn validate_zip_world(data: &[u8], savegame: bool) -> Result<ZipHeader, WorldError> {
    let (version, prefix_world_version, current_board) = read_prefix(data, savegame)?;

    let mut archive = ZipArchive::new(Cursor::new(data)).map_err(archive_err)?;
    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let file = archive.by_index(index).map_err(archive_err)?;
        let ident = if compression_allowed(file.compression()) {
            assign_id(file.name())
        } else {
            warn!(
                "ignoring entry {:?}: unsupported compression {}",
                file.name(),
                file.compression()
            );
            EntryIdent::default()
        };
        if ident.file_id == FILE_ID_NONE {
            warn!("ignoring unrecognized entry {:?}", file.name());
            continue;
        }
        let offset = file.data_start();
        entries.push((ident.sort_key(offset), Entry { ident, index }));
    }
    entries.sort_unstable_by_key(|(key, _)| *key);
    let entries: Vec<Entry> = entries.into_iter().map(|(_, e)| e).collect();

    let world_entry = entries
        .iter()
        .find(|e| e.ident.file_id == FILE_ID_WORLD_INFO)
        .ok_or_else(|| WorldError::invalid("archive has no world entry"))?;
    let world_info = read_entry(&mut archive, world_entry.index)?;
    check_world_info(&world_info, savegame)?;

    let info = peek_world_info(&world_info);
    if info.file_version > version.0 {
        return Err(WorldError::UnsupportedVersion {
            found: Version(info.file_version),
            newer: true,
        });
    }
    if info.num_boards == 0 || info.num_boards > MAX_BOARDS {
        return Err(WorldError::invalid(format!(
            "world declares {} boards",
            info.num_boards
        )));
    }
    for board_id in 0..info.num_boards as u32 {
        let present = entries
            .iter()
            .any(|e| e.ident.file_id == FILE_ID_BOARD_INFO && e.ident.board_id == board_id);
        if !present {
            return Err(WorldError::invalid(format!(
                "board {board_id:02x} has no info entry"
            )));
        }
    }

    let world_version = if savegame {
        prefix_world_version
    } else {
        Version(info.world_version)
    };
    Ok(ZipHeader {
        name: info.name,
        version,
        world_version,
        current_board,
        num_boards: info.num_boards,
        entries,
        world_info,
    })
}

/// Load a validated zip-container file into a [`World`].
pub fn load_zip_world(
    data: &[u8],
    header: &ZipHeader,
    savegame: bool,
    ctx: &mut LoadContext,
) -> Result<World, WorldError> {
    let mut archive = ZipArchive::new(Cursor::new(data)).map_err(archive_err)?;

    let mut world = World {
        version: header.version,
        world_version: header.world_version,
        current_board: header.current_board,
        boards: vec![Board::default(); header.num_boards],
        save_state: savegame.then(SaveState::default),
        ..World::default()
    };

    ctx.meter.start("Loading world...", header.entries.len());
    for entry in &header.entries {
        let buf = if entry.ident.file_id == FILE_ID_WORLD_INFO {
            header.world_info.clone()
        } else {
            read_entry(&mut archive, entry.index)?
        };
        load_entry(&mut world, entry.ident, buf, savegame, ctx)?;
        ctx.meter.advance(1);
    }
    ctx.meter.done();

    // Worlds carry no vlayer geometry properties; deduce the height
    // from however much data the entries held.
    let width = world.vlayer.width.max(1) as usize;
    if !savegame {
        let size = world.vlayer.chars.len();
        world.vlayer.height = (size / width) as u16;
    }
    let size = width * world.vlayer.height as usize;
    world.vlayer.chars.resize(size, b' ');
    world.vlayer.colors.resize(size, 7);

    Ok(world)
}

fn load_entry(
    world: &mut World,
    ident: EntryIdent,
    buf: Vec<u8>,
    savegame: bool,
    ctx: &mut LoadContext,
) -> Result<(), WorldError> {
    let version = world.version;
    match ident.file_id {
        FILE_ID_WORLD_INFO => {
            let mut st = world.save_state.take();
            load_world_info(&buf, world, st.as_mut());
            world.save_state = st;
        }
        FILE_ID_GLOBAL_ROBOT => {
            world.global_robot = ctx.robots.load_robot(&buf, savegame, version)?;
        }
        FILE_ID_SFX => world.custom_sfx = Some(load_sfx(&buf)),
        FILE_ID_CHARS => {
            let mut data = buf;
            data.truncate(NUM_CHARSETS * CHARSET_BYTES);
            world.charset.data = data;
        }
        FILE_ID_PAL => {
            world.palette.colors = buf
                .chunks_exact(3)
                .take(SMZX_PAL_SIZE)
                .map(|c| Rgb6::clamped(c[0], c[1], c[2]))
                .collect();
            // Worlds have no screen mode property; a full 256-color
            // palette implies SMZX.
            if !savegame && world.palette.colors.len() == SMZX_PAL_SIZE {
                world.palette.screen_mode = 2;
            }
        }
        FILE_ID_PAL_INDEX => world.palette.index_table = Some(buf),
        FILE_ID_PAL_INTENSITY => world.palette.intensities = Some(buf),
        FILE_ID_VCO => world.vlayer.colors = buf,
        FILE_ID_VCH => world.vlayer.chars = buf,
        FILE_ID_SPRITES => {
            if let Some(st) = world.save_state.as_mut() {
                st.sprites = load_sprites(&buf);
            }
        }
        FILE_ID_COUNTERS => {
            if let Some(st) = world.save_state.as_mut() {
                st.counters = load_counters(&buf);
            }
        }
        FILE_ID_STRINGS => {
            if let Some(st) = world.save_state.as_mut() {
                st.strings = load_strings(&buf);
            }
        }
        FILE_ID_BOARD_INFO => {
            if let Some(slot) = world.boards.get_mut(ident.board_id as usize) {
                *slot = ctx.boards.load_board(&buf, savegame, version)?;
            } else {
                warn!("ignoring info for out-of-range board {:02x}", ident.board_id);
            }
        }
        FILE_ID_ROBOT => {
            if let Some(board) = world.boards.get_mut(ident.board_id as usize) {
                let robot = ctx.robots.load_robot(&buf, savegame, version)?;
                board.robots.push((ident.robot_id as u8, robot));
            } else {
                warn!("ignoring robot on out-of-range board {:02x}", ident.board_id);
            }
        }
        FILE_ID_SCROLL => {
            if let Some(board) = world.boards.get_mut(ident.board_id as usize) {
                board.scrolls.push((ident.robot_id as u8, buf));
            }
        }
        FILE_ID_SENSOR => {
            if let Some(board) = world.boards.get_mut(ident.board_id as usize) {
                board.sensors.push((ident.robot_id as u8, buf));
            }
        }
        plane_id => match ident.plane() {
            Some(plane) => {
                if let Some(board) = world.boards.get_mut(ident.board_id as usize) {
                    board.planes.insert(plane, buf);
                }
            }
            None => warn!("no loader for entry id {plane_id:#06x}"),
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zipworld::save::save_zip_world;
    use std::io::Write;
    use zip::write::FileOptions;

    fn world_fixture() -> World {
        let mut world = World {
            name: "Caverns".into(),
            version: Version::CURRENT,
            world_version: Version::CURRENT,
            ..World::default()
        };
        world
            .boards
            .push(Board::from_body(String::new(), vec![1, 2, 3]));
        world
    }

    #[test]
    fn short_or_garbage_prefixes_are_invalid_magic() {
        assert!(matches!(
            validate_zip_world(b"MZ", false),
            Err(WorldError::InvalidMagic)
        ));
        let mut data = vec![0u8; 64];
        data[26..29].copy_from_slice(b"ZZZ");
        assert!(matches!(
            validate_zip_world(&data, false),
            Err(WorldError::InvalidMagic)
        ));
    }

    #[test]
    fn protected_prefix_is_rejected() {
        let mut ctx = LoadContext::default();
        let mut data = save_zip_world(&world_fixture(), false, &mut ctx).unwrap();
        data[25] = 2;
        let err = validate_zip_world(&data, false).unwrap_err();
        assert!(err.to_string().contains("protection"));
    }

    #[test]
    fn future_versions_are_reported_as_newer() {
        let mut ctx = LoadContext::default();
        let mut data = save_zip_world(&world_fixture(), false, &mut ctx).unwrap();
        data[26..29].copy_from_slice(b"M\x02\x63");
        match validate_zip_world(&data, false) {
            Err(WorldError::UnsupportedVersion { found, newer }) => {
                assert_eq!(found, Version(0x0263));
                assert!(newer);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn truncated_archive_is_an_archive_error() {
        let mut ctx = LoadContext::default();
        let data = save_zip_world(&world_fixture(), false, &mut ctx).unwrap();
        assert!(matches!(
            validate_zip_world(&data[..data.len() - 10], false),
            Err(WorldError::Archive { .. })
        ));
    }

    #[test]
    fn archive_without_world_entry_fails() {
        let mut prefix = Vec::new();
        crate::codec::put_padded(&mut prefix, b"empty", 25);
        prefix.push(0);
        prefix.extend_from_slice(&crate::magic::world_magic_bytes(Version::CURRENT));

        let mut cursor = Cursor::new(prefix);
        cursor.set_position(WORLD_HEADER_SIZE as u64);
        let mut zw = zip::ZipWriter::new(cursor);
        zw.start_file("chars", FileOptions::default()).unwrap();
        zw.write_all(&[0; 64]).unwrap();
        let data = zw.finish().unwrap().into_inner();

        let err = validate_zip_world(&data, false).unwrap_err();
        assert!(err.to_string().contains("no world entry"));
    }

    #[test]
    fn unknown_entries_are_ignored_not_errors() {
        let mut ctx = LoadContext::default();
        let data = save_zip_world(&world_fixture(), false, &mut ctx).unwrap();

        // Rewrite the archive with an extra junk entry.
        let mut src = ZipArchive::new(Cursor::new(&data[..])).unwrap();
        let mut cursor = Cursor::new(data[..WORLD_HEADER_SIZE].to_vec());
        cursor.set_position(WORLD_HEADER_SIZE as u64);
        let mut zw = zip::ZipWriter::new(cursor);
        for i in 0..src.len() {
            let file = src.by_index(i).unwrap();
            zw.raw_copy_file(file).unwrap();
        }
        zw.start_file("Thumbs.db", FileOptions::default()).unwrap();
        zw.write_all(b"junk").unwrap();
        let data = zw.finish().unwrap().into_inner();

        let header = validate_zip_world(&data, false).unwrap();
        let world = load_zip_world(&data, &header, false, &mut LoadContext::default()).unwrap();
        assert_eq!(world.name, "Caverns");
        assert_eq!(world.num_boards(), 1);
    }

    #[test]
    fn header_reports_directory_fields() {
        let mut world = world_fixture();
        world.boards.push(Board::default());
        let mut ctx = LoadContext::default();
        let data = save_zip_world(&world, false, &mut ctx).unwrap();

        let header = validate_zip_world(&data, false).unwrap();
        assert_eq!(header.name, b"Caverns");
        assert_eq!(header.version, Version::CURRENT);
        assert_eq!(header.num_boards, 2);
    }
}
