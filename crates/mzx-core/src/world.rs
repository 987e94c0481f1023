//! The [`World`] aggregate and its savegame-only state.

use crate::board::{Board, Robot};
use crate::counters::{CounterTable, StringTable};
use crate::gfx::{CharIdTable, Charset, Palette};
use crate::limits::{COUNTER_NAME_SIZE, NUM_KEYS, NUM_SFX, NUM_STATUS_COUNTERS, SFX_SIZE};
use crate::sprite::SpriteTable;
use crate::version::Version;

/// Global gameplay settings stored by every world file.
///
/// Field order mirrors the on-disk global settings block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GlobalSettings {
    /// Color drawn outside the board edge.
    pub edge_color: u8,
    /// Board the game starts on.
    pub first_board: u8,
    /// Board jumped to on endgame, or 255 for none.
    pub endgame_board: u8,
    /// Board jumped to on death, or 255 for restart.
    pub death_board: u8,
    /// Endgame teleport x.
    pub endgame_x: u16,
    /// Endgame teleport y.
    pub endgame_y: u16,
    /// Whether the built-in game over sfx plays.
    pub game_over_sfx: u8,
    /// Death teleport x.
    pub death_x: u16,
    /// Death teleport y.
    pub death_y: u16,
    /// Lives the player starts with.
    pub starting_lives: u16,
    /// Upper bound on lives.
    pub lives_limit: u16,
    /// Health the player starts with.
    pub starting_health: u16,
    /// Upper bound on health.
    pub health_limit: u16,
    /// Whether enemy shots hurt other enemies.
    pub enemy_hurt_enemy: u8,
    /// Whether played worlds clear on exit.
    pub clear_on_exit: u8,
    /// Whether the world may only start via a swap.
    pub only_from_swap: u8,
}

/// Custom sound effect table: 50 slots of at most 68 bytes plus NUL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SfxTable {
    /// The effect strings, without NUL terminators.
    pub effects: Vec<Vec<u8>>,
}

impl Default for SfxTable {
    fn default() -> Self {
        Self {
            effects: vec![Vec::new(); NUM_SFX],
        }
    }
}

impl SfxTable {
    /// True when every slot fits its on-disk field.
    pub fn is_valid(&self) -> bool {
        self.effects.len() == NUM_SFX && self.effects.iter().all(|e| e.len() < SFX_SIZE)
    }
}

/// The virtual layer: an off-screen char/color scratch plane.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vlayer {
    /// Width in chars.
    pub width: u16,
    /// Height in chars.
    pub height: u16,
    /// Char per cell.
    pub chars: Vec<u8>,
    /// Color per cell.
    pub colors: Vec<u8>,
}

impl Vlayer {
    /// Cell count.
    pub fn size(&self) -> usize {
        self.chars.len()
    }
}

impl Default for Vlayer {
    fn default() -> Self {
        // 0x8000 cells of blank-on-gray, 256 wide.
        Self {
            width: 256,
            height: 128,
            chars: vec![b' '; 0x8000],
            colors: vec![7; 0x8000],
        }
    }
}

/// Runtime state that only savegames carry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SaveState {
    /// Door keys held, one slot per color.
    pub keys: [u8; NUM_KEYS],
    /// Blind effect ticks remaining.
    pub blind_dur: u8,
    /// Firewalker effect ticks remaining.
    pub firewalker_dur: u8,
    /// Freeze-time effect ticks remaining.
    pub freeze_time_dur: u8,
    /// Slow-time effect ticks remaining.
    pub slow_time_dur: u8,
    /// Wind effect ticks remaining.
    pub wind_dur: u8,
    /// Saved player x positions, one per save slot.
    pub pl_saved_x: [u16; 8],
    /// Saved player y positions, one per save slot.
    pub pl_saved_y: [u16; 8],
    /// Saved player boards, one per save slot.
    pub pl_saved_board: [u8; 8],
    /// Player color before any color effect.
    pub saved_pl_color: u8,
    /// Thing id under the player.
    pub under_player_id: u8,
    /// Color under the player.
    pub under_player_color: u8,
    /// Param under the player.
    pub under_player_param: u8,
    /// Whether messages wrap at board edges.
    pub mesg_edges: u8,
    /// Scroll window base color.
    pub scroll_base_color: u8,
    /// Scroll window corner color.
    pub scroll_corner_color: u8,
    /// Scroll window pointer color.
    pub scroll_pointer_color: u8,
    /// Scroll window title color.
    pub scroll_title_color: u8,
    /// Scroll window arrow color.
    pub scroll_arrow_color: u8,
    /// File name of the module actually playing.
    pub real_mod_playing: Vec<u8>,
    /// Player restart x.
    pub player_restart_x: u16,
    /// Player restart y.
    pub player_restart_y: u16,
    /// Gameplay speed, 1..=16.
    pub mzx_speed: u8,
    /// Whether the speed is locked against the F2 menu.
    pub lock_speed: bool,
    /// Board the player swapped out of mid subroutine, when one
    /// exists.
    pub temporary_board: Option<u8>,
    /// Counter table.
    pub counters: CounterTable,
    /// String table.
    pub strings: StringTable,
    /// Sprite state.
    pub sprites: SpriteTable,
    /// `multiply` builtin.
    pub multiplier: u16,
    /// `divide` builtin.
    pub divider: u16,
    /// Circle divisions builtin.
    pub c_divisions: u16,
    /// `fread` delimiter.
    pub fread_delimiter: u16,
    /// `fwrite` delimiter.
    pub fwrite_delimiter: u16,
    /// Built-in shooting enabled state.
    pub bi_shoot_status: u8,
    /// Built-in messages enabled state.
    pub bi_mesg_status: u8,
    /// Open input file name.
    pub input_file_name: Vec<u8>,
    /// Position within the input file.
    pub input_pos: u32,
    /// Open output file name.
    pub output_file_name: Vec<u8>,
    /// Position within the output file.
    pub output_pos: u32,
    /// Commands-per-cycle counter.
    pub commands: u32,
    /// Commands-per-cycle hard stop.
    pub commands_stop: u32,
    /// Cap on simultaneously playing samples, or -1 for none.
    pub max_samples: i32,
    /// Whether mode changes print the on-screen message.
    pub smzx_message: u8,
    /// Whether joystick input simulates key presses.
    pub joy_simulate_keys: u8,
}

/// A loaded world or savegame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct World {
    /// World title, at most 24 bytes on disk.
    pub name: String,
    /// Version of the file this world was loaded from.
    pub version: Version,
    /// Version of the editor that created the world. Differs from
    /// `version` when a newer MZX saved a game of an older world.
    pub world_version: Version,
    /// All boards, indexed by board id.
    pub boards: Vec<Board>,
    /// Board the player is on (savegames) or the title board.
    pub current_board: u8,
    /// The global robot.
    pub global_robot: Robot,
    /// Charset bitmap data.
    pub charset: Charset,
    /// Thing id lookup tables.
    pub char_id_table: CharIdTable,
    /// Status counter names shown in the sidebar, NUL padded.
    pub status_counters: [[u8; COUNTER_NAME_SIZE]; NUM_STATUS_COUNTERS],
    /// Global gameplay settings.
    pub settings: GlobalSettings,
    /// The palette.
    pub palette: Palette,
    /// Custom sound effects, when the world overrides the built-ins.
    pub custom_sfx: Option<SfxTable>,
    /// The virtual layer.
    pub vlayer: Vlayer,
    /// Runtime state; present after loading a savegame.
    pub save_state: Option<SaveState>,
}

impl World {
    /// Number of boards.
    pub fn num_boards(&self) -> usize {
        self.boards.len()
    }

    /// Whether this world was loaded from (or will be saved as) a
    /// savegame.
    pub fn is_savegame(&self) -> bool {
        self.save_state.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vlayer_default_dimensions() {
        let v = Vlayer::default();
        assert_eq!(v.size(), 0x8000);
        assert_eq!(v.width as usize * v.height as usize, v.size());
        assert!(v.chars.iter().all(|&c| c == b' '));
        assert!(v.colors.iter().all(|&c| c == 7));
    }

    #[test]
    fn sfx_table_rejects_oversize_slot() {
        let mut t = SfxTable::default();
        assert!(t.is_valid());
        t.effects[3] = vec![b'c'; SFX_SIZE];
        assert!(!t.is_valid());
    }
}
