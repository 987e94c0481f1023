//! Legacy (2.84 layout) world and savegame writing.
//!
//! The writer appends to one buffer and backpatches the global robot
//! offset and the board size/offset table once the variable-length
//! records are in place, the same way the layout was originally
//! produced.

use crate::codec::{patch_u32, put_i32, put_padded, put_u16, put_u32};
use crate::dispatch::LoadContext;
use crate::error::WorldError;
use crate::legacy::WORLD_GLOBAL_OFFSET_OFFSET;
use crate::magic::{save_magic_bytes, world_magic_bytes};
use mzx_core::limits::{
    BOARD_NAME_SIZE, CHARSET_BYTES, MAX_BOARDS, MAX_SPRITES, NUM_SFX, PAL_SIZE, SMZX_PAL_SIZE,
};
use mzx_core::{Palette, SaveState, Version, World};

fn put_settings(out: &mut Vec<u8>, world: &World) {
    let s = &world.settings;
    out.push(s.edge_color);
    out.push(s.first_board);
    out.push(s.endgame_board);
    out.push(s.death_board);
    put_u16(out, s.endgame_x);
    put_u16(out, s.endgame_y);
    out.push(s.game_over_sfx);
    put_u16(out, s.death_x);
    put_u16(out, s.death_y);
    put_u16(out, s.starting_lives);
    put_u16(out, s.lives_limit);
    put_u16(out, s.starting_health);
    put_u16(out, s.health_limit);
    out.push(s.enemy_hurt_enemy);
    out.push(s.clear_on_exit);
    out.push(s.only_from_swap);
}

fn put_palette(out: &mut Vec<u8>, palette: &Palette, count: usize) {
    for i in 0..count {
        let c = palette.colors.get(i).copied().unwrap_or_default();
        out.push(c.r);
        out.push(c.g);
        out.push(c.b);
    }
}

fn put_counter(out: &mut Vec<u8>, name: &[u8], value: i32) {
    put_i32(out, value);
    put_u32(out, name.len() as u32);
    out.extend_from_slice(name);
}

fn put_save_block_a(out: &mut Vec<u8>, st: &SaveState) {
    out.extend_from_slice(&st.keys);
    out.push(st.blind_dur);
    out.push(st.firewalker_dur);
    out.push(st.freeze_time_dur);
    out.push(st.slow_time_dur);
    out.push(st.wind_dur);
    for x in st.pl_saved_x {
        put_u16(out, x);
    }
    for y in st.pl_saved_y {
        put_u16(out, y);
    }
    out.extend_from_slice(&st.pl_saved_board);
    out.push(st.saved_pl_color);
    out.push(st.under_player_id);
    out.push(st.under_player_color);
    out.push(st.under_player_param);
    out.push(st.mesg_edges);
    out.push(st.scroll_base_color);
    out.push(st.scroll_corner_color);
    out.push(st.scroll_pointer_color);
    out.push(st.scroll_title_color);
    out.push(st.scroll_arrow_color);
    put_u16(out, st.real_mod_playing.len() as u16);
    out.extend_from_slice(&st.real_mod_playing);
}

fn put_save_block_b(out: &mut Vec<u8>, world: &World, st: &SaveState) {
    let palette = &world.palette;
    for i in 0..PAL_SIZE {
        let v = palette
            .intensities
            .as_ref()
            .and_then(|t| t.get(i).copied())
            .unwrap_or(100);
        out.push(v);
    }
    out.push(palette.faded as u8);
    put_u16(out, st.player_restart_x);
    put_u16(out, st.player_restart_y);
    out.push(st.under_player_id);
    out.push(st.under_player_color);
    out.push(st.under_player_param);

    // The speed counters ride along at the end of the counter list.
    put_u32(out, st.counters.len() as u32 + 2);
    for c in st.counters.iter() {
        put_counter(out, &c.name, c.value);
    }
    put_counter(out, b"mzx_speed", st.mzx_speed as i32);
    put_counter(out, b"_____lock_speed", st.lock_speed as i32);

    put_u32(out, st.strings.len() as u32);
    for s in st.strings.iter() {
        put_u32(out, s.name.len() as u32);
        put_u32(out, s.value.len() as u32);
        out.extend_from_slice(&s.name);
        out.extend_from_slice(&s.value);
    }

    for sprite in &st.sprites.sprites {
        put_u16(out, sprite.x as u16);
        put_u16(out, sprite.y as u16);
        put_u16(out, sprite.ref_x as u16);
        put_u16(out, sprite.ref_y as u16);
        out.push(sprite.color);
        out.push(sprite.flags);
        out.push(sprite.width);
        out.push(sprite.height);
        out.push(sprite.col_x);
        out.push(sprite.col_y);
        out.push(sprite.col_width);
        out.push(sprite.col_height);
    }
    out.push(st.sprites.active as u8);
    out.push(st.sprites.y_order as u8);
    put_u16(out, st.sprites.collision_count() as u16);
    for i in 0..MAX_SPRITES {
        let v = st.sprites.collision_list.get(i).copied().unwrap_or(0);
        put_u16(out, v as u16);
    }

    put_u16(out, st.multiplier);
    put_u16(out, st.divider);
    put_u16(out, st.c_divisions);
    put_u16(out, st.fread_delimiter);
    put_u16(out, st.fwrite_delimiter);
    out.push(st.bi_shoot_status);
    out.push(st.bi_mesg_status);

    put_u16(out, st.input_file_name.len() as u16);
    out.extend_from_slice(&st.input_file_name);
    put_u32(out, st.input_pos);
    put_u16(out, st.output_file_name.len() as u16);
    out.extend_from_slice(&st.output_file_name);
    put_u32(out, st.output_pos);

    put_u16(out, palette.screen_mode);
    if palette.screen_mode > 1 {
        put_palette(out, palette, SMZX_PAL_SIZE);
    }

    put_u32(out, st.commands);

    put_u32(out, world.vlayer.size() as u32);
    put_u16(out, world.vlayer.width);
    put_u16(out, world.vlayer.height);
    out.extend_from_slice(&world.vlayer.chars);
    out.extend_from_slice(&world.vlayer.colors);
}

/// Encode a world or savegame in the legacy layout.
pub fn save_legacy_world(
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
    let version = Version::LEGACY_FORMAT;
    let mut out = Vec::new();

    if savegame {
        out.extend_from_slice(&save_magic_bytes(version));
        put_u16(&mut out, world.world_version.0);
        out.push(world.current_board);
    } else {
        put_padded(&mut out, world.name.as_bytes(), BOARD_NAME_SIZE);
        out.push(0); // no protection
        out.extend_from_slice(&world_magic_bytes(version));
    }

    let st = match (savegame, world.save_state.as_ref()) {
        (true, None) => {
            return Err(WorldError::invalid(
                "saving a savegame requires runtime state",
            ))
        }
        (true, Some(st)) => Some(st),
        (false, _) => None,
    };

    if world.charset.data.len() < CHARSET_BYTES {
        return Err(WorldError::invalid("charset is shorter than one set"));
    }
    out.extend_from_slice(&world.charset.data[..CHARSET_BYTES]);
    out.extend_from_slice(&world.char_id_table.id_chars);
    out.push(world.char_id_table.missile_color);
    out.extend_from_slice(&world.char_id_table.bullet_color);
    out.extend_from_slice(&world.char_id_table.id_dmg);
    for slot in &world.status_counters {
        out.extend_from_slice(slot);
    }

    if let Some(st) = st {
        put_save_block_a(&mut out, st);
    }
    put_settings(&mut out, world);
    put_palette(&mut out, &world.palette, PAL_SIZE);
    if let Some(st) = st {
        put_save_block_b(&mut out, world, st);
    }

    if !savegame {
        debug_assert_eq!(out.len(), WORLD_GLOBAL_OFFSET_OFFSET);
    }
    let gl_slot = out.len();
    put_u32(&mut out, 0);

    if let Some(sfx) = &world.custom_sfx {
        if !sfx.is_valid() {
            return Err(WorldError::invalid("custom SFX table has oversize slots"));
        }
        out.push(0);
        let size_slot = out.len();
        put_u16(&mut out, 0);
        let start = out.len();
        for i in 0..NUM_SFX {
            let effect = &sfx.effects[i];
            out.push(effect.len() as u8);
            out.extend_from_slice(effect);
        }
        let total = (out.len() - start) as u16;
        out[size_slot..size_slot + 2].copy_from_slice(&total.to_le_bytes());
    }

    ctx.meter.start("Saving...", 2 + world.boards.len());
    out.push(world.boards.len() as u8);
    for board in &world.boards {
        put_padded(&mut out, board.name.as_bytes(), BOARD_NAME_SIZE);
    }

    let table_pos = out.len();
    out.resize(table_pos + 8 * world.boards.len(), 0);
    ctx.meter.advance(1);

    for (i, board) in world.boards.iter().enumerate() {
        let offset = out.len();
        let body = ctx.boards.save_board(board, savegame, version);
        out.extend_from_slice(&body);
        patch_u32(&mut out, table_pos + i * 8, body.len() as u32);
        if !body.is_empty() {
            patch_u32(&mut out, table_pos + i * 8 + 4, offset as u32);
        }
        ctx.meter.advance(1);
    }

    let gl_offset = out.len();
    let robot = ctx.robots.save_robot(&world.global_robot, savegame, version);
    out.extend_from_slice(&robot);
    patch_u32(&mut out, gl_slot, gl_offset as u32);
    ctx.meter.advance(1);
    ctx.meter.done();

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legacy::{load_legacy_world, validate_legacy_world};
    use mzx_core::{Board, Robot, SfxTable, Sprite};

    pub(crate) fn world_fixture() -> World {
        let mut world = World {
            name: "Caverns of Zeux".into(),
            version: Version::LEGACY_FORMAT,
            world_version: Version::LEGACY_FORMAT,
            ..World::default()
        };
        world.settings.first_board = 1;
        world.settings.starting_lives = 5;
        world.settings.health_limit = 200;
        world.char_id_table.missile_color = 8;
        world.char_id_table.id_chars[0] = 32;
        world.palette.colors[1] = mzx_core::Rgb6::clamped(0, 0, 42);
        world.status_counters[0][..5].copy_from_slice(b"GEMS\0");
        world.charset.data[0] = 0x7E;
        world.boards = vec![
            Board::from_body("title".into(), vec![1, 2, 3, 4]),
            Board::from_body("mines".into(), vec![9, 9, 9]),
        ];
        world.global_robot = Robot {
            data: vec![0xAB, 0xCD],
        };
        world
    }

    pub(crate) fn save_fixture() -> World {
        let mut world = world_fixture();
        let mut st = SaveState {
            mzx_speed: 4,
            player_restart_x: 10,
            player_restart_y: 11,
            commands: 40,
            ..SaveState::default()
        };
        st.keys[2] = 1;
        st.real_mod_playing = b"caves.mod".to_vec();
        st.counters.set(b"score", 1234);
        st.counters.set(b"AMMO", -5);
        st.strings.set(b"$greeting", b"hello".to_vec());
        st.sprites.sprites[0] = Sprite {
            x: -3,
            y: 7,
            width: 2,
            height: 2,
            ..Sprite::default()
        };
        st.sprites.active = 1;
        st.sprites.collision_list = vec![0, 5];
        world.palette.intensities = Some(vec![100; PAL_SIZE]);
        world.current_board = 1;
        world.save_state = Some(st);
        world
    }

    #[test]
    fn world_round_trips() {
        let world = world_fixture();
        let mut ctx = LoadContext::default();
        let data = save_legacy_world(&world, false, &mut ctx).unwrap();

        let header = validate_legacy_world(&data, false).unwrap();
        assert_eq!(header.version, Version::LEGACY_FORMAT);
        assert_eq!(header.num_boards, 2);
        assert_eq!(header.name, b"Caverns of Zeux");

        let loaded = load_legacy_world(&data, &header, false, &mut ctx).unwrap();
        assert_eq!(loaded, world);
    }

    #[test]
    fn savegame_round_trips() {
        let world = save_fixture();
        let mut ctx = LoadContext::default();
        let data = save_legacy_world(&world, true, &mut ctx).unwrap();

        let header = validate_legacy_world(&data, true).unwrap();
        assert_eq!(header.world_version, Version::LEGACY_FORMAT);
        assert_eq!(header.current_board, 1);

        let loaded = load_legacy_world(&data, &header, true, &mut ctx).unwrap();
        // Savegames store no world name.
        let mut expected = world.clone();
        expected.name.clear();
        assert_eq!(loaded, expected);
    }

    #[test]
    fn custom_sfx_round_trips() {
        let mut world = world_fixture();
        let mut sfx = SfxTable::default();
        sfx.effects[0] = b"5c+c-g".to_vec();
        sfx.effects[49] = b"zn".to_vec();
        world.custom_sfx = Some(sfx);

        let mut ctx = LoadContext::default();
        let data = save_legacy_world(&world, false, &mut ctx).unwrap();
        let header = validate_legacy_world(&data, false).unwrap();
        let loaded = load_legacy_world(&data, &header, false, &mut ctx).unwrap();
        assert_eq!(loaded.custom_sfx, world.custom_sfx);
        assert_eq!(loaded.boards.len(), 2);
    }

    #[test]
    fn impossible_screen_mode_fails_validation() {
        let mut world = save_fixture();
        world.palette.screen_mode = 4;
        let mut ctx = LoadContext::default();
        let data = save_legacy_world(&world, true, &mut ctx).unwrap();
        let err = validate_legacy_world(&data, true).unwrap_err();
        assert!(err.to_string().contains("screen mode"));
    }

    #[test]
    fn impossible_palette_values_fail_validation() {
        let world = world_fixture();
        let mut ctx = LoadContext::default();
        let mut data = save_legacy_world(&world, false, &mut ctx).unwrap();
        // Palette channels are 0..=63; 200 marks a misidentified file.
        data[WORLD_GLOBAL_OFFSET_OFFSET - 48 + 7] = 200;
        let err = validate_legacy_world(&data, false).unwrap_err();
        assert!(err.to_string().contains("palette"));
    }

    #[test]
    fn speed_counters_route_regardless_of_case() {
        let world = save_fixture();
        let mut ctx = LoadContext::default();
        let mut data = save_legacy_world(&world, true, &mut ctx).unwrap();
        let pos = data
            .windows(9)
            .position(|w| w == b"mzx_speed")
            .unwrap();
        data[pos..pos + 9].copy_from_slice(b"MZX_SPEED");

        let header = validate_legacy_world(&data, true).unwrap();
        let loaded = load_legacy_world(&data, &header, true, &mut ctx).unwrap();
        let st = loaded.save_state.unwrap();
        assert_eq!(st.mzx_speed, 4);
        assert!(st.counters.get(b"mzx_speed").is_none());
    }

    #[test]
    fn oversize_counter_names_fail_validation() {
        let mut world = save_fixture();
        let st = world.save_state.as_mut().unwrap();
        st.counters.set(&[b'n'; 600], 1);
        let mut ctx = LoadContext::default();
        let data = save_legacy_world(&world, true, &mut ctx).unwrap();
        let err = validate_legacy_world(&data, true).unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn corrupting_the_board_table_fails_validation() {
        let world = world_fixture();
        let mut ctx = LoadContext::default();
        let mut data = save_legacy_world(&world, false, &mut ctx).unwrap();
        // Point board 0 past the end of the file.
        let len = data.len() as u32;
        let pos = WORLD_GLOBAL_OFFSET_OFFSET + 4 + 1 + 2 * BOARD_NAME_SIZE + 4;
        data[pos..pos + 4].copy_from_slice(&len.to_le_bytes());
        assert!(validate_legacy_world(&data, false).is_err());
    }
}
