//! Legacy world and savegame loading.
//!
//! Runs only after [`crate::legacy::validate_legacy_world`] has
//! passed on the same bytes; every range read here was already walked
//! there, so failures are reported as plain truncation.

use log::debug;

use crate::codec::ByteReader;
use crate::dispatch::LoadContext;
use crate::error::WorldError;
use crate::legacy::{read_board_directory, validate::LegacyHeader, WORLD_BLOCK_1_SIZE};
use mzx_core::limits::{
    BOARD_NAME_SIZE, CHARSET_BYTES, COUNTER_NAME_SIZE, ID_CHARS_SIZE, ID_DMG_SIZE, MAX_SPRITES,
    NUM_KEYS, PAL_SIZE, SMZX_PAL_SIZE,
};
use mzx_core::{
    Board, CharIdTable, Charset, GlobalSettings, Palette, Rgb6, SaveState, SfxTable, Sprite,
    Vlayer, World,
};

fn read_char_id_table(r: &mut ByteReader<'_>) -> Result<CharIdTable, WorldError> {
    let mut table = CharIdTable::default();
    table.id_chars.copy_from_slice(r.take(ID_CHARS_SIZE)?);
    table.missile_color = r.u8()?;
    table.bullet_color.copy_from_slice(r.take(3)?);
    table.id_dmg.copy_from_slice(r.take(ID_DMG_SIZE)?);
    Ok(table)
}

fn read_settings(r: &mut ByteReader<'_>) -> Result<GlobalSettings, WorldError> {
    Ok(GlobalSettings {
        edge_color: r.u8()?,
        first_board: r.u8()?,
        endgame_board: r.u8()?,
        death_board: r.u8()?,
        endgame_x: r.u16()?,
        endgame_y: r.u16()?,
        game_over_sfx: r.u8()?,
        death_x: r.u16()?,
        death_y: r.u16()?,
        starting_lives: r.u16()?,
        lives_limit: r.u16()?,
        starting_health: r.u16()?,
        health_limit: r.u16()?,
        enemy_hurt_enemy: r.u8()?,
        clear_on_exit: r.u8()?,
        only_from_swap: r.u8()?,
    })
}

fn read_palette16(r: &mut ByteReader<'_>) -> Result<Vec<Rgb6>, WorldError> {
    let mut colors = Vec::with_capacity(PAL_SIZE);
    for _ in 0..PAL_SIZE {
        let rgb = r.take(3)?;
        colors.push(Rgb6::clamped(rgb[0], rgb[1], rgb[2]));
    }
    Ok(colors)
}

fn read_save_block_a(r: &mut ByteReader<'_>, st: &mut SaveState) -> Result<(), WorldError> {
    st.keys.copy_from_slice(r.take(NUM_KEYS)?);
    st.blind_dur = r.u8()?;
    st.firewalker_dur = r.u8()?;
    st.freeze_time_dur = r.u8()?;
    st.slow_time_dur = r.u8()?;
    st.wind_dur = r.u8()?;
    for x in st.pl_saved_x.iter_mut() {
        *x = r.u16()?;
    }
    for y in st.pl_saved_y.iter_mut() {
        *y = r.u16()?;
    }
    st.pl_saved_board.copy_from_slice(r.take(8)?);
    st.saved_pl_color = r.u8()?;
    st.under_player_id = r.u8()?;
    st.under_player_color = r.u8()?;
    st.under_player_param = r.u8()?;
    st.mesg_edges = r.u8()?;
    st.scroll_base_color = r.u8()?;
    st.scroll_corner_color = r.u8()?;
    st.scroll_pointer_color = r.u8()?;
    st.scroll_title_color = r.u8()?;
    st.scroll_arrow_color = r.u8()?;
    let mod_len = r.u16()? as usize;
    st.real_mod_playing = r.bytes(mod_len)?;
    Ok(())
}

fn read_save_block_b(
    r: &mut ByteReader<'_>,
    st: &mut SaveState,
    palette: &mut Palette,
    vlayer: &mut Vlayer,
) -> Result<(), WorldError> {
    palette.intensities = Some(r.bytes(PAL_SIZE)?);
    palette.faded = r.u8()? != 0;
    st.player_restart_x = r.u16()?;
    st.player_restart_y = r.u16()?;
    st.under_player_id = r.u8()?;
    st.under_player_color = r.u8()?;
    st.under_player_param = r.u8()?;

    let num_counters = r.u32()? as usize;
    for _ in 0..num_counters {
        let value = r.i32()?;
        let name_len = r.u32()? as usize;
        let name = r.bytes(name_len)?;
        // The speed counters are runtime state smuggled through the
        // counter list. Counter names compare case-insensitively.
        if name.eq_ignore_ascii_case(b"mzx_speed") {
            st.mzx_speed = value.clamp(1, 16) as u8;
        } else if name.eq_ignore_ascii_case(b"_____lock_speed") {
            st.lock_speed = value != 0;
        } else {
            st.counters.set(&name, value);
        }
    }

    let num_strings = r.u32()? as usize;
    for _ in 0..num_strings {
        let name_len = r.u32()? as usize;
        let value_len = r.u32()? as usize;
        let name = r.bytes(name_len)?;
        let value = r.bytes(value_len)?;
        st.strings.set(&name, value);
    }

    for sprite in st.sprites.sprites.iter_mut() {
        *sprite = Sprite {
            x: r.u16()? as i16 as i32,
            y: r.u16()? as i16 as i32,
            ref_x: r.u16()? as i16 as i32,
            ref_y: r.u16()? as i16 as i32,
            color: r.u8()?,
            flags: r.u8()?,
            width: r.u8()?,
            height: r.u8()?,
            col_x: r.u8()?,
            col_y: r.u8()?,
            col_width: r.u8()?,
            col_height: r.u8()?,
            ..Sprite::default()
        };
    }
    st.sprites.active = r.u8()? as i32;
    st.sprites.y_order = r.u8()? != 0;
    let collision_count = (r.u16()? as usize).min(MAX_SPRITES);
    let mut collisions = Vec::with_capacity(MAX_SPRITES);
    for _ in 0..MAX_SPRITES {
        collisions.push(r.u16()? as i32);
    }
    collisions.truncate(collision_count);
    st.sprites.collision_list = collisions;

    st.multiplier = r.u16()?;
    st.divider = r.u16()?;
    st.c_divisions = r.u16()?;
    st.fread_delimiter = r.u16()?;
    st.fwrite_delimiter = r.u16()?;
    st.bi_shoot_status = r.u8()?;
    st.bi_mesg_status = r.u8()?;

    let input_len = r.u16()? as usize;
    st.input_file_name = r.bytes(input_len)?;
    st.input_pos = r.u32()?;
    let output_len = r.u16()? as usize;
    st.output_file_name = r.bytes(output_len)?;
    st.output_pos = r.u32()?;

    palette.screen_mode = r.u16()?;
    if palette.screen_mode > 1 {
        let mut colors = Vec::with_capacity(SMZX_PAL_SIZE);
        for _ in 0..SMZX_PAL_SIZE {
            let rgb = r.take(3)?;
            colors.push(Rgb6::clamped(rgb[0], rgb[1], rgb[2]));
        }
        palette.colors = colors;
    }

    st.commands = r.u32()?;

    let vlayer_size = r.u32()? as usize;
    vlayer.width = r.u16()?;
    vlayer.height = r.u16()?;
    vlayer.chars = r.bytes(vlayer_size)?;
    vlayer.colors = r.bytes(vlayer_size)?;
    Ok(())
}

/// Load a validated legacy world or savegame.
pub fn load_legacy_world(
    data: &[u8],
    header: &LegacyHeader,
    savegame: bool,
    ctx: &mut LoadContext,
) -> Result<World, WorldError> {
    let mut r = ByteReader::new(data);
    let mut world = World::default();
    world.version = header.version;
    world.world_version = header.world_version;
    world.current_board = header.current_board;
    world.name = String::from_utf8_lossy(&header.name).into_owned();

    if savegame {
        r.skip(5 + 2 + 1)?;
    } else {
        r.skip(BOARD_NAME_SIZE + 1 + 3)?;
    }

    world.charset = Charset {
        data: r.bytes(CHARSET_BYTES)?,
    };
    world.char_id_table = read_char_id_table(&mut r)?;
    for slot in world.status_counters.iter_mut() {
        slot.copy_from_slice(r.take(COUNTER_NAME_SIZE)?);
    }
    debug_assert_eq!(
        r.pos(),
        (if savegame { 8 } else { 29 }) + WORLD_BLOCK_1_SIZE
    );

    let mut save_state = savegame.then(SaveState::default);
    if let Some(st) = save_state.as_mut() {
        read_save_block_a(&mut r, st)?;
    }

    world.settings = read_settings(&mut r)?;
    world.palette.colors = read_palette16(&mut r)?;

    if let Some(st) = save_state.as_mut() {
        let mut vlayer = Vlayer::default();
        read_save_block_b(&mut r, st, &mut world.palette, &mut vlayer)?;
        world.vlayer = vlayer;
    }

    let gl_offset = r.u32()? as usize;
    let dir = read_board_directory(&mut r)?;

    ctx.meter.start("Loading...", 2 + dir.table.len());
    if let Some(effects) = dir.sfx {
        world.custom_sfx = Some(SfxTable { effects });
    }
    ctx.meter.advance(1);

    for (i, &(size, offset)) in dir.table.iter().enumerate() {
        let name = String::from_utf8_lossy(&dir.names[i]).into_owned();
        let mut board = if size == 0 {
            Board::default()
        } else {
            let body = data
                .get(offset as usize..offset as usize + size as usize)
                .ok_or_else(|| WorldError::truncated("board data"))?;
            ctx.boards.load_board(body, savegame, header.version)?
        };
        board.name = name;
        world.boards.push(board);
        ctx.meter.advance(1);
    }

    let robot_data = data
        .get(gl_offset..)
        .ok_or_else(|| WorldError::truncated("global robot"))?;
    world.global_robot = ctx.robots.load_robot(robot_data, savegame, header.version)?;
    ctx.meter.advance(1);
    ctx.meter.done();

    world.save_state = save_state;
    debug!(
        "loaded legacy {} \"{}\" with {} boards",
        if savegame { "save" } else { "world" },
        world.name,
        world.num_boards()
    );
    Ok(world)
}
