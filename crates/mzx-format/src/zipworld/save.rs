//! Writing zip-container worlds and savegames.

use std::io::{Cursor, Write};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::info::{save_counters, save_sfx, save_sprites, save_strings, save_world_info};
use super::{entry_name, EntryIdent};
use super::{
    FILE_ID_BOARD_INFO, FILE_ID_CHARS, FILE_ID_COUNTERS, FILE_ID_GLOBAL_ROBOT, FILE_ID_PAL,
    FILE_ID_PAL_INDEX, FILE_ID_PAL_INTENSITY, FILE_ID_ROBOT, FILE_ID_SCROLL, FILE_ID_SENSOR,
    FILE_ID_SFX, FILE_ID_SPRITES, FILE_ID_STRINGS, FILE_ID_VCH, FILE_ID_VCO, FILE_ID_WORLD_INFO,
};
use crate::codec::{put_padded, put_u16};
use crate::dispatch::LoadContext;
use crate::error::WorldError;
use crate::legacy::WORLD_HEADER_SIZE;
use crate::magic::{save_magic_bytes, world_magic_bytes};
use mzx_core::limits::{BOARD_NAME_SIZE, MAX_BOARDS};
use mzx_core::{BoardPlane, Version, World};

fn archive_err(e: zip::result::ZipError) -> WorldError {
    WorldError::Archive {
        detail: e.to_string(),
    }
}

struct EntryWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    options: FileOptions,
}

impl EntryWriter {
    fn top(&mut self, file_id: u16, data: &[u8]) -> Result<(), WorldError> {
        self.entry(
            EntryIdent {
                file_id,
                board_id: 0,
                robot_id: 0,
            },
            data,
        )
    }

    fn entry(&mut self, ident: EntryIdent, data: &[u8]) -> Result<(), WorldError> {
        self.zip
            .start_file(entry_name(&ident), self.options)
            .map_err(archive_err)?;
        self.zip.write_all(data)?;
        Ok(())
    }
}

/// Encode a world or savegame as a zip-container file.
///
/// The output is the legacy-style prefix followed by the archive, with
/// entry offsets absolute in the file.
pub fn save_zip_world(
    world: &World,
    savegame: bool,
    ctx: &mut LoadContext,
) -> Result<Vec<u8>, WorldError> {
    if world.boards.is_empty() || world.boards.len() > MAX_BOARDS {
        return Err(WorldError::invalid(format!(
            "cannot save a world with {} boards",
            world.boards.len()
        )));
    }
    let version = Version::CURRENT;

    let mut prefix = Vec::with_capacity(WORLD_HEADER_SIZE);
    if savegame {
        if world.save_state.is_none() {
            return Err(WorldError::invalid("savegame output needs runtime state"));
        }
        prefix.extend_from_slice(&save_magic_bytes(version));
        put_u16(&mut prefix, world.world_version.0);
        prefix.push(world.current_board);
    } else {
        put_padded(&mut prefix, world.name.as_bytes(), BOARD_NAME_SIZE);
        prefix.push(0);
        prefix.extend_from_slice(&world_magic_bytes(version));
    }

    let mut cursor = Cursor::new(prefix);
    cursor.set_position(cursor.get_ref().len() as u64);
    let mut w = EntryWriter {
        zip: ZipWriter::new(cursor),
        options: FileOptions::default().compression_method(CompressionMethod::Deflated),
    };

    ctx.meter.start("Saving world...", 2 + world.boards.len());
    w.top(FILE_ID_WORLD_INFO, &save_world_info(world, savegame, version))?;
    w.top(
        FILE_ID_GLOBAL_ROBOT,
        &ctx.robots.save_robot(&world.global_robot, savegame, version),
    )?;
    if let Some(sfx) = &world.custom_sfx {
        w.top(FILE_ID_SFX, &save_sfx(sfx))?;
    }
    w.top(FILE_ID_CHARS, &world.charset.data)?;
    let mut pal = Vec::with_capacity(world.palette.colors.len() * 3);
    for c in &world.palette.colors {
        pal.extend_from_slice(&[c.r, c.g, c.b]);
    }
    w.top(FILE_ID_PAL, &pal)?;
    if savegame {
        if world.palette.screen_mode > 1 && world.palette.has_index_table() {
            if let Some(idx) = &world.palette.index_table {
                w.top(FILE_ID_PAL_INDEX, idx)?;
            }
        }
        if let Some(intensities) = &world.palette.intensities {
            w.top(FILE_ID_PAL_INTENSITY, intensities)?;
        }
    }
    w.top(FILE_ID_VCO, &world.vlayer.colors)?;
    w.top(FILE_ID_VCH, &world.vlayer.chars)?;
    if let (true, Some(st)) = (savegame, world.save_state.as_ref()) {
        w.top(FILE_ID_SPRITES, &save_sprites(&st.sprites))?;
        w.top(FILE_ID_COUNTERS, &save_counters(&st.counters))?;
        w.top(FILE_ID_STRINGS, &save_strings(&st.strings))?;
    }
    ctx.meter.advance(2);

    for (i, board) in world.boards.iter().enumerate() {
        let board_id = i as u32;
        let ident = |file_id: u16, robot_id: u32| EntryIdent {
            file_id,
            board_id,
            robot_id,
        };
        w.entry(
            ident(FILE_ID_BOARD_INFO, 0),
            &ctx.boards.save_board(board, savegame, version),
        )?;
        for plane in [
            BoardPlane::LevelId,
            BoardPlane::LevelParam,
            BoardPlane::LevelColor,
            BoardPlane::UnderId,
            BoardPlane::UnderParam,
            BoardPlane::UnderColor,
            BoardPlane::OverlayChar,
            BoardPlane::OverlayColor,
        ] {
            if let Some(data) = board.planes.get(&plane) {
                w.entry(ident(plane_file_id(plane), 0), data)?;
            }
        }
        for (id, robot) in &board.robots {
            w.entry(
                ident(FILE_ID_ROBOT, *id as u32),
                &ctx.robots.save_robot(robot, savegame, version),
            )?;
        }
        for (id, data) in &board.scrolls {
            w.entry(ident(FILE_ID_SCROLL, *id as u32), data)?;
        }
        for (id, data) in &board.sensors {
            w.entry(ident(FILE_ID_SENSOR, *id as u32), data)?;
        }
        ctx.meter.advance(1);
    }

    let cursor = w.zip.finish().map_err(archive_err)?;
    ctx.meter.done();
    Ok(cursor.into_inner())
}

fn plane_file_id(plane: BoardPlane) -> u16 {
    match plane {
        BoardPlane::LevelId => 0x0101,
        BoardPlane::LevelParam => 0x0102,
        BoardPlane::LevelColor => 0x0103,
        BoardPlane::UnderId => 0x0104,
        BoardPlane::UnderParam => 0x0105,
        BoardPlane::UnderColor => 0x0106,
        BoardPlane::OverlayChar => 0x0107,
        BoardPlane::OverlayColor => 0x0108,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zipworld::load::{load_zip_world, validate_zip_world};
    use mzx_core::{Board, Rgb6, Robot, SaveState, SfxTable, Sprite};

    fn world_fixture() -> World {
        let mut world = World {
            name: "Forest of Ruin".into(),
            version: Version::CURRENT,
            world_version: Version::CURRENT,
            ..World::default()
        };
        world.settings.starting_lives = 5;
        world.settings.first_board = 1;
        world.charset.data[100] = 0xAA;
        world.char_id_table.id_chars[0] = b'E';
        world.status_counters[0][..5].copy_from_slice(b"GEMS\0");
        world.palette.colors[1] = Rgb6::clamped(10, 20, 30);
        world.global_robot = Robot {
            data: vec![0xFF, 1, 2],
        };

        let mut board = Board::from_body(String::new(), vec![9, 9, 9]);
        board
            .planes
            .insert(BoardPlane::LevelId, vec![0; 100 * 100]);
        board.planes.insert(BoardPlane::LevelColor, vec![7; 100 * 100]);
        board.robots.push((1, Robot { data: vec![4, 5] }));
        board.scrolls.push((2, vec![6]));
        world.boards.push(board);
        world.boards.push(Board::from_body(String::new(), vec![1]));
        world
    }

    #[test]
    fn world_round_trips() {
        let world = world_fixture();
        let mut ctx = LoadContext::default();
        let data = save_zip_world(&world, false, &mut ctx).unwrap();

        let header = validate_zip_world(&data, false).unwrap();
        let loaded = load_zip_world(&data, &header, false, &mut ctx).unwrap();
        assert_eq!(loaded, world);
    }

    #[test]
    fn savegame_round_trips() {
        let mut world = world_fixture();
        world.world_version = Version::V290;
        world.current_board = 1;
        world.custom_sfx = Some(SfxTable::default());

        world.palette.screen_mode = 2;
        world.palette.colors = vec![Rgb6::clamped(1, 2, 3); 256];
        world.palette.index_table = Some(vec![3; 1024]);
        world.palette.intensities = Some(vec![100; 256]);
        world.palette.faded = true;

        world.vlayer.width = 4;
        world.vlayer.height = 2;
        world.vlayer.chars = vec![b'x'; 8];
        world.vlayer.colors = vec![9; 8];

        let mut st = SaveState {
            mzx_speed: 4,
            lock_speed: true,
            temporary_board: Some(1),
            commands: 40,
            commands_stop: 2_000_000,
            max_samples: -1,
            smzx_message: 1,
            joy_simulate_keys: 1,
            saved_pl_color: 27,
            player_restart_x: 12,
            player_restart_y: 34,
            real_mod_playing: b"caves.mod".to_vec(),
            input_file_name: b"input.txt".to_vec(),
            input_pos: 77,
            multiplier: 10000,
            fread_delimiter: b'*' as u16,
            ..SaveState::default()
        };
        st.keys[3] = 1;
        st.pl_saved_x[0] = 40;
        st.pl_saved_y[0] = 12;
        st.counters.set(b"score", 1234);
        st.counters.set(b"LOBOUND", -99);
        st.strings.set(b"$name", b"inventor".to_vec());
        st.sprites.active = 2;
        st.sprites.sprites[7] = Sprite {
            x: -4,
            y: 9,
            width: 2,
            height: 2,
            charset_offset: 256,
            z: 3,
            ..Sprite::default()
        };
        st.sprites.collision_list = vec![7];
        world.save_state = Some(st);

        let mut ctx = LoadContext::default();
        let data = save_zip_world(&world, true, &mut ctx).unwrap();

        let header = validate_zip_world(&data, true).unwrap();
        assert_eq!(header.world_version, Version::V290);
        assert_eq!(header.current_board, 1);

        let loaded = load_zip_world(&data, &header, true, &mut ctx).unwrap();
        assert_eq!(loaded, world);
    }

    #[test]
    fn saving_a_savegame_needs_runtime_state() {
        let world = world_fixture();
        let err = save_zip_world(&world, true, &mut LoadContext::default()).unwrap_err();
        assert!(err.to_string().contains("runtime state"));
    }

    #[test]
    fn smzx_world_palette_implies_screen_mode() {
        let mut world = world_fixture();
        world.palette.screen_mode = 2;
        world.palette.colors = vec![Rgb6::clamped(5, 5, 5); 256];

        let mut ctx = LoadContext::default();
        let data = save_zip_world(&world, false, &mut ctx).unwrap();
        let header = validate_zip_world(&data, false).unwrap();
        let loaded = load_zip_world(&data, &header, false, &mut ctx).unwrap();
        assert_eq!(loaded.palette.screen_mode, 2);
        assert_eq!(loaded.palette.colors.len(), 256);
    }

    #[test]
    fn board_count_limits_are_enforced() {
        let mut world = world_fixture();
        world.boards.clear();
        assert!(save_zip_world(&world, false, &mut LoadContext::default()).is_err());

        world.boards = vec![Board::default(); MAX_BOARDS + 1];
        assert!(save_zip_world(&world, false, &mut LoadContext::default()).is_err());
    }
}
