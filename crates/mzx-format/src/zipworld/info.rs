//! Payload codecs for the `world`, `spr`, `counter`, `string`, and
//! `sfx` entries.

use crate::codec::{put_u32, trim_padded, ByteReader};
use crate::error::WorldError;
use crate::props::{check_required, PropIter, PropWriter, Required};
use mzx_core::limits::{
    BOARD_NAME_SIZE, ID_CHARS_SIZE, ID_DMG_SIZE, MAX_SPRITES, NUM_KEYS, NUM_SFX,
    NUM_STATUS_COUNTERS, SFX_SIZE,
};
use mzx_core::{CounterTable, SaveState, SpriteTable, StringTable, Version, World};

// ── World property tags ─────────────────────────────────────────

const WPROP_WORLD_NAME: u16 = 0x0001;
const WPROP_WORLD_VERSION: u16 = 0x0002;
const WPROP_FILE_VERSION: u16 = 0x0003;
const WPROP_SAVE_START_BOARD: u16 = 0x0004;
const WPROP_SAVE_TEMPORARY_BOARD: u16 = 0x0005;
const WPROP_NUM_BOARDS: u16 = 0x0008;
const WPROP_ID_CHARS: u16 = 0x0010;
const WPROP_ID_MISSILE_COLOR: u16 = 0x0011;
const WPROP_ID_BULLET_COLOR: u16 = 0x0012;
const WPROP_ID_DMG: u16 = 0x0013;
const WPROP_STATUS_COUNTERS: u16 = 0x0018;
const WPROP_EDGE_COLOR: u16 = 0x0020;
const WPROP_FIRST_BOARD: u16 = 0x0021;
const WPROP_ENDGAME_BOARD: u16 = 0x0022;
const WPROP_DEATH_BOARD: u16 = 0x0023;
const WPROP_ENDGAME_X: u16 = 0x0024;
const WPROP_ENDGAME_Y: u16 = 0x0025;
const WPROP_GAME_OVER_SFX: u16 = 0x0026;
const WPROP_DEATH_X: u16 = 0x0027;
const WPROP_DEATH_Y: u16 = 0x0028;
const WPROP_STARTING_LIVES: u16 = 0x0029;
const WPROP_LIVES_LIMIT: u16 = 0x002A;
const WPROP_STARTING_HEALTH: u16 = 0x002B;
const WPROP_HEALTH_LIMIT: u16 = 0x002C;
const WPROP_ENEMY_HURT_ENEMY: u16 = 0x002D;
const WPROP_CLEAR_ON_EXIT: u16 = 0x002E;
const WPROP_ONLY_FROM_SWAP: u16 = 0x002F;
const WPROP_SMZX_MODE: u16 = 0x8030;
const WPROP_VLAYER_WIDTH: u16 = 0x8031;
const WPROP_VLAYER_HEIGHT: u16 = 0x8032;
const WPROP_VLAYER_SIZE: u16 = 0x8033;
const WPROP_REAL_MOD_PLAYING: u16 = 0x8040;
const WPROP_MZX_SPEED: u16 = 0x8041;
const WPROP_LOCK_SPEED: u16 = 0x8042;
const WPROP_COMMANDS: u16 = 0x8043;
const WPROP_COMMANDS_STOP: u16 = 0x8044;
const WPROP_SAVED_POSITIONS: u16 = 0x8048;
const WPROP_UNDER_PLAYER: u16 = 0x8049;
const WPROP_PLAYER_RESTART_X: u16 = 0x804A;
const WPROP_PLAYER_RESTART_Y: u16 = 0x804B;
const WPROP_SAVED_PL_COLOR: u16 = 0x804C;
const WPROP_KEYS: u16 = 0x804D;
const WPROP_BLIND_DUR: u16 = 0x8050;
const WPROP_FIREWALKER_DUR: u16 = 0x8051;
const WPROP_FREEZE_TIME_DUR: u16 = 0x8052;
const WPROP_SLOW_TIME_DUR: u16 = 0x8053;
const WPROP_WIND_DUR: u16 = 0x8054;
const WPROP_SCROLL_BASE_COLOR: u16 = 0x8058;
const WPROP_SCROLL_CORNER_COLOR: u16 = 0x8059;
const WPROP_SCROLL_POINTER_COLOR: u16 = 0x805A;
const WPROP_SCROLL_TITLE_COLOR: u16 = 0x805B;
const WPROP_SCROLL_ARROW_COLOR: u16 = 0x805C;
const WPROP_MESG_EDGES: u16 = 0x8060;
const WPROP_BI_SHOOT_STATUS: u16 = 0x8061;
const WPROP_BI_MESG_STATUS: u16 = 0x8062;
const WPROP_FADED: u16 = 0x8063;
const WPROP_INPUT_FILE_NAME: u16 = 0x8070;
const WPROP_INPUT_POS: u16 = 0x8074;
const WPROP_FREAD_DELIMITER: u16 = 0x8075;
const WPROP_OUTPUT_FILE_NAME: u16 = 0x8078;
const WPROP_OUTPUT_POS: u16 = 0x807C;
const WPROP_FWRITE_DELIMITER: u16 = 0x807D;
const WPROP_MULTIPLIER: u16 = 0x8080;
const WPROP_DIVIDER: u16 = 0x8081;
const WPROP_C_DIVISIONS: u16 = 0x8082;
const WPROP_MAX_SAMPLES: u16 = 0x8090;
const WPROP_SMZX_MESSAGE: u16 = 0x8091;
const WPROP_JOY_SIMULATE_KEYS: u16 = 0x8092;

/// Tags every world info stream must carry, in stream order.
const WORLD_REQUIRED: &[Required] = &[
    Required::fixed(WPROP_WORLD_NAME, BOARD_NAME_SIZE as u32),
    Required::fixed(WPROP_WORLD_VERSION, 2),
    Required::fixed(WPROP_FILE_VERSION, 2),
    Required::fixed(WPROP_NUM_BOARDS, 1),
    Required::fixed(WPROP_ID_CHARS, ID_CHARS_SIZE as u32),
    Required::fixed(WPROP_ID_MISSILE_COLOR, 1),
    Required::fixed(WPROP_ID_BULLET_COLOR, 3),
    Required::fixed(WPROP_ID_DMG, ID_DMG_SIZE as u32),
    Required::fixed(
        WPROP_STATUS_COUNTERS,
        (NUM_STATUS_COUNTERS * mzx_core::limits::COUNTER_NAME_SIZE) as u32,
    ),
    Required::fixed(WPROP_EDGE_COLOR, 1),
    Required::fixed(WPROP_FIRST_BOARD, 1),
    Required::fixed(WPROP_ENDGAME_BOARD, 1),
    Required::fixed(WPROP_DEATH_BOARD, 1),
    Required::fixed(WPROP_ENDGAME_X, 2),
    Required::fixed(WPROP_ENDGAME_Y, 2),
    Required::fixed(WPROP_GAME_OVER_SFX, 1),
    Required::fixed(WPROP_DEATH_X, 2),
    Required::fixed(WPROP_DEATH_Y, 2),
    Required::fixed(WPROP_STARTING_LIVES, 2),
    Required::fixed(WPROP_LIVES_LIMIT, 2),
    Required::fixed(WPROP_STARTING_HEALTH, 2),
    Required::fixed(WPROP_HEALTH_LIMIT, 2),
    Required::fixed(WPROP_ENEMY_HURT_ENEMY, 1),
    Required::fixed(WPROP_CLEAR_ON_EXIT, 1),
    Required::fixed(WPROP_ONLY_FROM_SWAP, 1),
];

/// Additional tags every savegame's world info stream must carry.
const SAVE_REQUIRED: &[Required] = &[
    Required::fixed(WPROP_SAVE_START_BOARD, 1),
    Required::fixed(WPROP_SMZX_MODE, 1),
    Required::fixed(WPROP_VLAYER_WIDTH, 2),
    Required::fixed(WPROP_VLAYER_HEIGHT, 2),
    Required::fixed(WPROP_VLAYER_SIZE, 4),
    Required::any(WPROP_REAL_MOD_PLAYING),
    Required::fixed(WPROP_MZX_SPEED, 1),
    Required::fixed(WPROP_LOCK_SPEED, 1),
    Required::fixed(WPROP_COMMANDS, 4),
    Required::fixed(WPROP_SAVED_POSITIONS, 40),
    Required::fixed(WPROP_UNDER_PLAYER, 3),
    Required::fixed(WPROP_KEYS, NUM_KEYS as u32),
];

/// Strict structural check of a world info stream.
pub(crate) fn check_world_info(data: &[u8], savegame: bool) -> Result<(), WorldError> {
    check_required(data, WORLD_REQUIRED, "world info")?;
    if savegame {
        check_required(data, SAVE_REQUIRED, "savegame info")?;
    }
    Ok(())
}

/// Parsed fixed fields of a world info stream.
#[derive(Clone, Debug, Default)]
pub(crate) struct WorldInfo {
    pub name: Vec<u8>,
    pub world_version: u16,
    pub file_version: u16,
    pub num_boards: usize,
    pub current_board: u8,
}

/// The fields the validator needs from a world info stream.
pub(crate) fn peek_world_info(data: &[u8]) -> WorldInfo {
    let mut info = WorldInfo::default();
    for prop in PropIter::new(data) {
        match prop.tag {
            WPROP_WORLD_NAME => info.name = trim_padded(prop.payload).to_vec(),
            WPROP_WORLD_VERSION => info.world_version = prop.word(),
            WPROP_FILE_VERSION => info.file_version = prop.word(),
            WPROP_SAVE_START_BOARD => info.current_board = prop.byte(),
            WPROP_NUM_BOARDS => info.num_boards = prop.byte() as usize,
            _ => {}
        }
    }
    info
}

/// Apply a validated world info stream to a world.
pub(crate) fn load_world_info(data: &[u8], world: &mut World, st: Option<&mut SaveState>) {
    let mut vlayer_size = world.vlayer.size();
    let mut st = st;
    for prop in PropIter::new(data) {
        match prop.tag {
            WPROP_WORLD_NAME => {
                world.name = String::from_utf8_lossy(trim_padded(prop.payload)).into_owned();
            }
            WPROP_ID_CHARS => {
                if prop.payload.len() == ID_CHARS_SIZE {
                    world.char_id_table.id_chars.copy_from_slice(prop.payload);
                }
            }
            WPROP_ID_MISSILE_COLOR => world.char_id_table.missile_color = prop.byte(),
            WPROP_ID_BULLET_COLOR => {
                if prop.payload.len() == 3 {
                    world.char_id_table.bullet_color.copy_from_slice(prop.payload);
                }
            }
            WPROP_ID_DMG => {
                if prop.payload.len() == ID_DMG_SIZE {
                    world.char_id_table.id_dmg.copy_from_slice(prop.payload);
                }
            }
            WPROP_STATUS_COUNTERS => {
                let width = mzx_core::limits::COUNTER_NAME_SIZE;
                for (i, slot) in world.status_counters.iter_mut().enumerate() {
                    if let Some(chunk) = prop.payload.get(i * width..(i + 1) * width) {
                        slot.copy_from_slice(chunk);
                    }
                }
            }
            WPROP_EDGE_COLOR => world.settings.edge_color = prop.byte(),
            WPROP_FIRST_BOARD => world.settings.first_board = prop.byte(),
            WPROP_ENDGAME_BOARD => world.settings.endgame_board = prop.byte(),
            WPROP_DEATH_BOARD => world.settings.death_board = prop.byte(),
            WPROP_ENDGAME_X => world.settings.endgame_x = prop.word(),
            WPROP_ENDGAME_Y => world.settings.endgame_y = prop.word(),
            WPROP_GAME_OVER_SFX => world.settings.game_over_sfx = prop.byte(),
            WPROP_DEATH_X => world.settings.death_x = prop.word(),
            WPROP_DEATH_Y => world.settings.death_y = prop.word(),
            WPROP_STARTING_LIVES => world.settings.starting_lives = prop.word(),
            WPROP_LIVES_LIMIT => world.settings.lives_limit = prop.word(),
            WPROP_STARTING_HEALTH => world.settings.starting_health = prop.word(),
            WPROP_HEALTH_LIMIT => world.settings.health_limit = prop.word(),
            WPROP_ENEMY_HURT_ENEMY => world.settings.enemy_hurt_enemy = prop.byte(),
            WPROP_CLEAR_ON_EXIT => world.settings.clear_on_exit = prop.byte(),
            WPROP_ONLY_FROM_SWAP => world.settings.only_from_swap = prop.byte(),
            WPROP_SMZX_MODE => world.palette.screen_mode = prop.byte() as u16,
            WPROP_VLAYER_WIDTH => world.vlayer.width = prop.word(),
            WPROP_VLAYER_HEIGHT => world.vlayer.height = prop.word(),
            WPROP_VLAYER_SIZE => vlayer_size = prop.int().max(0) as usize,
            _ => {
                if let Some(st) = st.as_deref_mut() {
                    load_save_prop(&prop, st, world);
                }
            }
        }
    }
    world.vlayer.chars.resize(vlayer_size, b' ');
    world.vlayer.colors.resize(vlayer_size, 7);
}

fn load_save_prop(prop: &crate::props::Prop<'_>, st: &mut SaveState, world: &mut World) {
    match prop.tag {
        WPROP_SAVE_TEMPORARY_BOARD => st.temporary_board = Some(prop.byte()),
        WPROP_REAL_MOD_PLAYING => st.real_mod_playing = prop.payload.to_vec(),
        WPROP_MZX_SPEED => st.mzx_speed = prop.byte().clamp(1, 16),
        WPROP_LOCK_SPEED => st.lock_speed = prop.byte() != 0,
        WPROP_COMMANDS => st.commands = prop.int() as u32,
        WPROP_COMMANDS_STOP => st.commands_stop = prop.int() as u32,
        WPROP_SAVED_POSITIONS => {
            if prop.payload.len() == 40 {
                let mut r = ByteReader::new(prop.payload);
                for i in 0..8 {
                    st.pl_saved_x[i] = r.u16().unwrap_or(0);
                    st.pl_saved_y[i] = r.u16().unwrap_or(0);
                    st.pl_saved_board[i] = r.u8().unwrap_or(0);
                }
            }
        }
        WPROP_UNDER_PLAYER => {
            if let [id, color, param] = prop.payload {
                st.under_player_id = *id;
                st.under_player_color = *color;
                st.under_player_param = *param;
            }
        }
        WPROP_PLAYER_RESTART_X => st.player_restart_x = prop.word(),
        WPROP_PLAYER_RESTART_Y => st.player_restart_y = prop.word(),
        WPROP_SAVED_PL_COLOR => st.saved_pl_color = prop.byte(),
        WPROP_KEYS => {
            if prop.payload.len() == NUM_KEYS {
                st.keys.copy_from_slice(prop.payload);
            }
        }
        WPROP_BLIND_DUR => st.blind_dur = prop.byte(),
        WPROP_FIREWALKER_DUR => st.firewalker_dur = prop.byte(),
        WPROP_FREEZE_TIME_DUR => st.freeze_time_dur = prop.byte(),
        WPROP_SLOW_TIME_DUR => st.slow_time_dur = prop.byte(),
        WPROP_WIND_DUR => st.wind_dur = prop.byte(),
        WPROP_SCROLL_BASE_COLOR => st.scroll_base_color = prop.byte(),
        WPROP_SCROLL_CORNER_COLOR => st.scroll_corner_color = prop.byte(),
        WPROP_SCROLL_POINTER_COLOR => st.scroll_pointer_color = prop.byte(),
        WPROP_SCROLL_TITLE_COLOR => st.scroll_title_color = prop.byte(),
        WPROP_SCROLL_ARROW_COLOR => st.scroll_arrow_color = prop.byte(),
        WPROP_MESG_EDGES => st.mesg_edges = prop.byte(),
        WPROP_BI_SHOOT_STATUS => st.bi_shoot_status = prop.byte(),
        WPROP_BI_MESG_STATUS => st.bi_mesg_status = prop.byte(),
        WPROP_FADED => world.palette.faded = prop.byte() != 0,
        WPROP_INPUT_FILE_NAME => st.input_file_name = prop.payload.to_vec(),
        WPROP_INPUT_POS => st.input_pos = prop.int() as u32,
        WPROP_FREAD_DELIMITER => st.fread_delimiter = prop.int() as u16,
        WPROP_OUTPUT_FILE_NAME => st.output_file_name = prop.payload.to_vec(),
        WPROP_OUTPUT_POS => st.output_pos = prop.int() as u32,
        WPROP_FWRITE_DELIMITER => st.fwrite_delimiter = prop.int() as u16,
        WPROP_MULTIPLIER => st.multiplier = prop.int() as u16,
        WPROP_DIVIDER => st.divider = prop.int() as u16,
        WPROP_C_DIVISIONS => st.c_divisions = prop.int() as u16,
        WPROP_MAX_SAMPLES => st.max_samples = prop.int(),
        WPROP_SMZX_MESSAGE => st.smzx_message = prop.byte(),
        WPROP_JOY_SIMULATE_KEYS => st.joy_simulate_keys = prop.byte(),
        _ => {}
    }
}

/// Encode the world info stream for a world or savegame.
pub(crate) fn save_world_info(world: &World, savegame: bool, file_version: Version) -> Vec<u8> {
    let mut w = PropWriter::new();
    let mut name = Vec::new();
    crate::codec::put_padded(&mut name, world.name.as_bytes(), BOARD_NAME_SIZE);
    w.prop_s(WPROP_WORLD_NAME, &name);
    w.prop_w(WPROP_WORLD_VERSION, world.world_version.0);
    w.prop_w(WPROP_FILE_VERSION, file_version.0);
    if savegame {
        w.prop_c(WPROP_SAVE_START_BOARD, world.current_board);
        if let Some(b) = world.save_state.as_ref().and_then(|st| st.temporary_board) {
            w.prop_c(WPROP_SAVE_TEMPORARY_BOARD, b);
        }
    }
    w.prop_c(WPROP_NUM_BOARDS, world.boards.len() as u8);
    w.prop_s(WPROP_ID_CHARS, &world.char_id_table.id_chars);
    w.prop_c(WPROP_ID_MISSILE_COLOR, world.char_id_table.missile_color);
    w.prop_s(WPROP_ID_BULLET_COLOR, &world.char_id_table.bullet_color);
    w.prop_s(WPROP_ID_DMG, &world.char_id_table.id_dmg);
    let mut status = Vec::new();
    for slot in &world.status_counters {
        status.extend_from_slice(slot);
    }
    w.prop_s(WPROP_STATUS_COUNTERS, &status);

    let s = &world.settings;
    w.prop_c(WPROP_EDGE_COLOR, s.edge_color);
    w.prop_c(WPROP_FIRST_BOARD, s.first_board);
    w.prop_c(WPROP_ENDGAME_BOARD, s.endgame_board);
    w.prop_c(WPROP_DEATH_BOARD, s.death_board);
    w.prop_w(WPROP_ENDGAME_X, s.endgame_x);
    w.prop_w(WPROP_ENDGAME_Y, s.endgame_y);
    w.prop_c(WPROP_GAME_OVER_SFX, s.game_over_sfx);
    w.prop_w(WPROP_DEATH_X, s.death_x);
    w.prop_w(WPROP_DEATH_Y, s.death_y);
    w.prop_w(WPROP_STARTING_LIVES, s.starting_lives);
    w.prop_w(WPROP_LIVES_LIMIT, s.lives_limit);
    w.prop_w(WPROP_STARTING_HEALTH, s.starting_health);
    w.prop_w(WPROP_HEALTH_LIMIT, s.health_limit);
    w.prop_c(WPROP_ENEMY_HURT_ENEMY, s.enemy_hurt_enemy);
    w.prop_c(WPROP_CLEAR_ON_EXIT, s.clear_on_exit);
    w.prop_c(WPROP_ONLY_FROM_SWAP, s.only_from_swap);

    if let (true, Some(st)) = (savegame, world.save_state.as_ref()) {
        w.prop_c(WPROP_SMZX_MODE, world.palette.screen_mode as u8);
        w.prop_w(WPROP_VLAYER_WIDTH, world.vlayer.width);
        w.prop_w(WPROP_VLAYER_HEIGHT, world.vlayer.height);
        w.prop_d(WPROP_VLAYER_SIZE, world.vlayer.size() as u32);
        w.prop_s(WPROP_REAL_MOD_PLAYING, &st.real_mod_playing);
        w.prop_c(WPROP_MZX_SPEED, st.mzx_speed);
        w.prop_c(WPROP_LOCK_SPEED, st.lock_speed as u8);
        w.prop_d(WPROP_COMMANDS, st.commands);
        w.prop_d(WPROP_COMMANDS_STOP, st.commands_stop);
        let mut positions = Vec::with_capacity(40);
        for i in 0..8 {
            crate::codec::put_u16(&mut positions, st.pl_saved_x[i]);
            crate::codec::put_u16(&mut positions, st.pl_saved_y[i]);
            positions.push(st.pl_saved_board[i]);
        }
        w.prop_s(WPROP_SAVED_POSITIONS, &positions);
        w.prop_s(
            WPROP_UNDER_PLAYER,
            &[
                st.under_player_id,
                st.under_player_color,
                st.under_player_param,
            ],
        );
        w.prop_w(WPROP_PLAYER_RESTART_X, st.player_restart_x);
        w.prop_w(WPROP_PLAYER_RESTART_Y, st.player_restart_y);
        w.prop_c(WPROP_SAVED_PL_COLOR, st.saved_pl_color);
        w.prop_s(WPROP_KEYS, &st.keys);
        w.prop_c(WPROP_BLIND_DUR, st.blind_dur);
        w.prop_c(WPROP_FIREWALKER_DUR, st.firewalker_dur);
        w.prop_c(WPROP_FREEZE_TIME_DUR, st.freeze_time_dur);
        w.prop_c(WPROP_SLOW_TIME_DUR, st.slow_time_dur);
        w.prop_c(WPROP_WIND_DUR, st.wind_dur);
        w.prop_c(WPROP_SCROLL_BASE_COLOR, st.scroll_base_color);
        w.prop_c(WPROP_SCROLL_CORNER_COLOR, st.scroll_corner_color);
        w.prop_c(WPROP_SCROLL_POINTER_COLOR, st.scroll_pointer_color);
        w.prop_c(WPROP_SCROLL_TITLE_COLOR, st.scroll_title_color);
        w.prop_c(WPROP_SCROLL_ARROW_COLOR, st.scroll_arrow_color);
        w.prop_c(WPROP_MESG_EDGES, st.mesg_edges);
        w.prop_c(WPROP_BI_SHOOT_STATUS, st.bi_shoot_status);
        w.prop_c(WPROP_BI_MESG_STATUS, st.bi_mesg_status);
        w.prop_c(WPROP_FADED, world.palette.faded as u8);
        w.prop_s(WPROP_INPUT_FILE_NAME, &st.input_file_name);
        w.prop_d(WPROP_INPUT_POS, st.input_pos);
        w.prop_d(WPROP_FREAD_DELIMITER, st.fread_delimiter as u32);
        w.prop_s(WPROP_OUTPUT_FILE_NAME, &st.output_file_name);
        w.prop_d(WPROP_OUTPUT_POS, st.output_pos);
        w.prop_d(WPROP_FWRITE_DELIMITER, st.fwrite_delimiter as u32);
        w.prop_d(WPROP_MULTIPLIER, st.multiplier as u32);
        w.prop_d(WPROP_DIVIDER, st.divider as u32);
        w.prop_d(WPROP_C_DIVISIONS, st.c_divisions as u32);
        w.prop_d(WPROP_MAX_SAMPLES, st.max_samples as u32);
        w.prop_c(WPROP_SMZX_MESSAGE, st.smzx_message);
        w.prop_c(WPROP_JOY_SIMULATE_KEYS, st.joy_simulate_keys);
    }
    w.finish()
}

// ── Sprite property stream ──────────────────────────────────────

const SPROP_SET_ID: u16 = 0x01;
const SPROP_X: u16 = 0x02;
const SPROP_Y: u16 = 0x03;
const SPROP_REF_X: u16 = 0x04;
const SPROP_REF_Y: u16 = 0x05;
const SPROP_COLOR: u16 = 0x06;
const SPROP_FLAGS: u16 = 0x07;
const SPROP_WIDTH: u16 = 0x08;
const SPROP_HEIGHT: u16 = 0x09;
const SPROP_COL_X: u16 = 0x0A;
const SPROP_COL_Y: u16 = 0x0B;
const SPROP_COL_WIDTH: u16 = 0x0C;
const SPROP_COL_HEIGHT: u16 = 0x0D;
const SPROP_TRANSPARENT_COLOR: u16 = 0x0E;
const SPROP_CHARSET_OFFSET: u16 = 0x0F;
const SPROP_Z: u16 = 0x10;
const SPROP_ACTIVE_SPRITES: u16 = 0x8000;
const SPROP_SPRITE_Y_ORDER: u16 = 0x8001;
const SPROP_COLLISION_COUNT: u16 = 0x8002;
const SPROP_COLLISION_LIST: u16 = 0x8003;
const SPROP_SPRITE_NUM: u16 = 0x8004;

/// Encode the `spr` entry.
pub(crate) fn save_sprites(table: &SpriteTable) -> Vec<u8> {
    let mut w = PropWriter::new();
    for (i, sprite) in table.sprites.iter().enumerate() {
        w.prop_c(SPROP_SET_ID, i as u8);
        w.prop_d(SPROP_X, sprite.x as u32);
        w.prop_d(SPROP_Y, sprite.y as u32);
        w.prop_d(SPROP_REF_X, sprite.ref_x as u32);
        w.prop_d(SPROP_REF_Y, sprite.ref_y as u32);
        w.prop_c(SPROP_COLOR, sprite.color);
        w.prop_c(SPROP_FLAGS, sprite.flags);
        w.prop_c(SPROP_WIDTH, sprite.width);
        w.prop_c(SPROP_HEIGHT, sprite.height);
        w.prop_c(SPROP_COL_X, sprite.col_x);
        w.prop_c(SPROP_COL_Y, sprite.col_y);
        w.prop_c(SPROP_COL_WIDTH, sprite.col_width);
        w.prop_c(SPROP_COL_HEIGHT, sprite.col_height);
        w.prop_d(SPROP_TRANSPARENT_COLOR, sprite.transparent_color as u32);
        w.prop_d(SPROP_CHARSET_OFFSET, sprite.charset_offset as u32);
        w.prop_d(SPROP_Z, sprite.z as u32);
    }
    w.prop_c(SPROP_ACTIVE_SPRITES, table.active as u8);
    w.prop_c(SPROP_SPRITE_Y_ORDER, table.y_order as u8);
    w.prop_w(SPROP_COLLISION_COUNT, table.collision_count() as u16);
    let mut list = Vec::with_capacity(table.collision_list.len() * 4);
    for v in &table.collision_list {
        put_u32(&mut list, *v as u32);
    }
    w.prop_s(SPROP_COLLISION_LIST, &list);
    w.prop_d(SPROP_SPRITE_NUM, table.sprite_num as u32);
    w.finish()
}

/// Decode the `spr` entry.
pub(crate) fn load_sprites(data: &[u8]) -> SpriteTable {
    let mut table = SpriteTable::default();
    let mut cur = 0usize;
    let mut collision_count = 0usize;
    for prop in PropIter::new(data) {
        if prop.tag == SPROP_SET_ID {
            cur = (prop.byte() as usize).min(MAX_SPRITES - 1);
            continue;
        }
        let sprite = &mut table.sprites[cur];
        match prop.tag {
            SPROP_X => sprite.x = prop.int(),
            SPROP_Y => sprite.y = prop.int(),
            SPROP_REF_X => sprite.ref_x = prop.int(),
            SPROP_REF_Y => sprite.ref_y = prop.int(),
            SPROP_COLOR => sprite.color = prop.byte(),
            SPROP_FLAGS => sprite.flags = prop.byte(),
            SPROP_WIDTH => sprite.width = prop.byte(),
            SPROP_HEIGHT => sprite.height = prop.byte(),
            SPROP_COL_X => sprite.col_x = prop.byte(),
            SPROP_COL_Y => sprite.col_y = prop.byte(),
            SPROP_COL_WIDTH => sprite.col_width = prop.byte(),
            SPROP_COL_HEIGHT => sprite.col_height = prop.byte(),
            SPROP_TRANSPARENT_COLOR => sprite.transparent_color = prop.int(),
            SPROP_CHARSET_OFFSET => sprite.charset_offset = prop.int(),
            SPROP_Z => sprite.z = prop.int(),
            SPROP_ACTIVE_SPRITES => table.active = prop.int(),
            SPROP_SPRITE_Y_ORDER => table.y_order = prop.byte() != 0,
            SPROP_COLLISION_COUNT => collision_count = prop.word() as usize,
            SPROP_COLLISION_LIST => {
                table.collision_list = prop
                    .payload
                    .chunks_exact(4)
                    .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect();
            }
            SPROP_SPRITE_NUM => table.sprite_num = prop.word(),
            _ => {}
        }
    }
    table
        .collision_list
        .truncate(collision_count.min(MAX_SPRITES));
    table
}

// ── Counter, string, and SFX streams ────────────────────────────

/// Encode the `counter` entry.
pub(crate) fn save_counters(counters: &CounterTable) -> Vec<u8> {
    let mut out = Vec::new();
    put_u32(&mut out, counters.len() as u32);
    for c in counters.iter() {
        crate::codec::put_i32(&mut out, c.value);
        put_u32(&mut out, c.name.len() as u32);
        out.extend_from_slice(&c.name);
    }
    out
}

/// Decode the `counter` entry. Truncated tails end the stream.
pub(crate) fn load_counters(data: &[u8]) -> CounterTable {
    let mut table = CounterTable::new();
    let mut r = ByteReader::new(data);
    let Ok(count) = r.u32() else { return table };
    for _ in 0..count {
        let Ok(value) = r.i32() else { break };
        let Ok(len) = r.u32() else { break };
        let Ok(name) = r.bytes(len as usize) else { break };
        table.set(&name, value);
    }
    table
}

/// Encode the `string` entry.
pub(crate) fn save_strings(strings: &StringTable) -> Vec<u8> {
    let mut out = Vec::new();
    put_u32(&mut out, strings.len() as u32);
    for s in strings.iter() {
        put_u32(&mut out, s.name.len() as u32);
        put_u32(&mut out, s.value.len() as u32);
        out.extend_from_slice(&s.name);
        out.extend_from_slice(&s.value);
    }
    out
}

/// Decode the `string` entry.
pub(crate) fn load_strings(data: &[u8]) -> StringTable {
    let mut table = StringTable::new();
    let mut r = ByteReader::new(data);
    let Ok(count) = r.u32() else { return table };
    for _ in 0..count {
        let Ok(name_len) = r.u32() else { break };
        let Ok(value_len) = r.u32() else { break };
        let Ok(name) = r.bytes(name_len as usize) else { break };
        let Ok(value) = r.bytes(value_len as usize) else { break };
        table.set(&name, value);
    }
    table
}

/// Encode the `sfx` entry: 50 NUL-padded 69-byte slots.
pub(crate) fn save_sfx(sfx: &mzx_core::SfxTable) -> Vec<u8> {
    let mut out = Vec::with_capacity(NUM_SFX * SFX_SIZE);
    for effect in &sfx.effects {
        crate::codec::put_padded(&mut out, effect, SFX_SIZE);
    }
    out
}

/// Decode the `sfx` entry.
pub(crate) fn load_sfx(data: &[u8]) -> mzx_core::SfxTable {
    let mut sfx = mzx_core::SfxTable::default();
    for (i, chunk) in data.chunks(SFX_SIZE).take(NUM_SFX).enumerate() {
        sfx.effects[i] = trim_padded(chunk).to_vec();
    }
    sfx
}

#[cfg(test)]
mod tests {
    use super::*;
    use mzx_core::Sprite;

    #[test]
    fn world_info_round_trips() {
        let mut world = World {
            name: "Zeux 3".into(),
            world_version: Version::CURRENT,
            ..World::default()
        };
        world.boards.push(mzx_core::Board::default());
        world.settings.starting_health = 100;
        world.settings.death_board = 255;
        world.char_id_table.id_dmg[5] = 10;

        let data = save_world_info(&world, false, Version::CURRENT);
        check_world_info(&data, false).unwrap();

        let info = peek_world_info(&data);
        assert_eq!(info.name, b"Zeux 3");
        assert_eq!(info.num_boards, 1);
        assert_eq!(info.file_version, Version::CURRENT.0);

        let mut loaded = World::default();
        load_world_info(&data, &mut loaded, None);
        assert_eq!(loaded.name, "Zeux 3");
        assert_eq!(loaded.settings, world.settings);
        assert_eq!(loaded.char_id_table, world.char_id_table);
    }

    #[test]
    fn save_info_requires_runtime_tags() {
        let world = World {
            boards: vec![mzx_core::Board::default()],
            ..World::default()
        };
        // A world stream is not a valid savegame stream.
        let data = save_world_info(&world, false, Version::CURRENT);
        assert!(check_world_info(&data, false).is_ok());
        assert!(check_world_info(&data, true).is_err());
    }

    #[test]
    fn sprite_stream_round_trips() {
        let mut table = SpriteTable::default();
        table.sprites[3] = Sprite {
            x: -20,
            y: 4,
            width: 3,
            height: 2,
            transparent_color: 16,
            z: -2,
            ..Sprite::default()
        };
        table.active = 1;
        table.y_order = true;
        table.collision_list = vec![3, -1];
        table.sprite_num = 3;

        let data = save_sprites(&table);
        assert_eq!(load_sprites(&data), table);
    }

    #[test]
    fn counter_and_string_streams_round_trip() {
        let mut counters = CounterTable::new();
        counters.set(b"loot", 99);
        counters.set(b"LIVES_BONUS", -2);
        let data = save_counters(&counters);
        assert_eq!(load_counters(&data), counters);

        let mut strings = StringTable::new();
        strings.set(b"$title", b"the mines".to_vec());
        let data = save_strings(&strings);
        assert_eq!(load_strings(&data), strings);

        // A truncated stream keeps what it can.
        let data = save_counters(&counters);
        assert!(load_counters(&data[..2]).is_empty());
        assert_eq!(load_counters(&data[..data.len() - 1]).len(), 1);
    }

    #[test]
    fn sfx_table_round_trips() {
        let mut sfx = mzx_core::SfxTable::default();
        sfx.effects[0] = b"5c#gec".to_vec();
        sfx.effects[10] = b"z".to_vec();
        let data = save_sfx(&sfx);
        assert_eq!(data.len(), NUM_SFX * SFX_SIZE);
        assert_eq!(load_sfx(&data), sfx);
    }
}
