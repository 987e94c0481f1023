//! Entry name to identity mapping.
//!
//! Names are at most 8 significant characters and match
//! case-insensitively. Anything that fails to parse maps to the
//! ignored identity; bad names in an archive are never an error, they
//! are simply invisible to the loader.

use super::*;
use mzx_core::BoardPlane;

/// Identity of one archive entry, plus its sort position.
///
/// Entries sort by (board, file id, object id, archive offset) so one
/// linear pass visits every component in load order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct EntryIdent {
    /// One of the `FILE_ID_*` constants; `FILE_ID_NONE` is ignored.
    pub file_id: u16,
    /// Board the entry belongs to; 0 for top-level entries.
    pub board_id: u32,
    /// Robot/scroll/sensor id within the board; 0 otherwise.
    pub robot_id: u32,
}

impl EntryIdent {
    fn top(file_id: u16) -> Self {
        Self {
            file_id,
            board_id: 0,
            robot_id: 0,
        }
    }

    /// Plane kind for the eight board layer entry ids.
    pub fn plane(&self) -> Option<BoardPlane> {
        Some(match self.file_id {
            0x0101 => BoardPlane::LevelId,
            0x0102 => BoardPlane::LevelParam,
            0x0103 => BoardPlane::LevelColor,
            0x0104 => BoardPlane::UnderId,
            0x0105 => BoardPlane::UnderParam,
            0x0106 => BoardPlane::UnderColor,
            0x0107 => BoardPlane::OverlayChar,
            0x0108 => BoardPlane::OverlayColor,
            _ => return None,
        })
    }

    /// Sort key for the linear load pass.
    pub fn sort_key(&self, offset: u64) -> (u32, u16, u32, u64) {
        (self.board_id, self.file_id, self.robot_id, offset)
    }
}

fn hex_value(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    u32::from_str_radix(s, 16).ok()
}

fn parse_board(rest: &str) -> EntryIdent {
    // "<2 hex digits>" then nothing, a plane suffix, or an object id.
    let none = EntryIdent::default();
    if rest.len() < 2 || rest.len() > 6 {
        return none;
    }
    let Some(board_id) = hex_value(&rest[..2]) else {
        return none;
    };
    let suffix = &rest[2..];
    if suffix.is_empty() {
        return EntryIdent {
            file_id: FILE_ID_BOARD_INFO,
            board_id,
            robot_id: 0,
        };
    }

    if let Some(id) = suffix.strip_prefix('r') {
        return match hex_value(id) {
            Some(robot_id) if robot_id != 0 => EntryIdent {
                file_id: FILE_ID_ROBOT,
                board_id,
                robot_id,
            },
            _ => none,
        };
    }
    if let Some(id) = suffix.strip_prefix("sc") {
        return match hex_value(id) {
            Some(robot_id) if robot_id != 0 => EntryIdent {
                file_id: FILE_ID_SCROLL,
                board_id,
                robot_id,
            },
            _ => none,
        };
    }
    if let Some(id) = suffix.strip_prefix("se") {
        return match hex_value(id) {
            Some(robot_id) if robot_id != 0 => EntryIdent {
                file_id: FILE_ID_SENSOR,
                board_id,
                robot_id,
            },
            _ => none,
        };
    }

    let file_id = match suffix {
        "bid" => FILE_ID_BOARD_BID,
        "bpr" => 0x0102,
        "bco" => 0x0103,
        "uid" => 0x0104,
        "upr" => 0x0105,
        "uco" => 0x0106,
        "och" => 0x0107,
        "oco" => 0x0108,
        _ => return none,
    };
    EntryIdent {
        file_id,
        board_id,
        robot_id: 0,
    }
}

/// Translate an archive entry name to its identity.
pub(crate) fn assign_id(name: &str) -> EntryIdent {
    if name.len() > 8 || name.is_empty() || !name.is_ascii() {
        return EntryIdent::default();
    }
    let lower = name.to_ascii_lowercase();
    if let Some(rest) = lower.strip_prefix('b') {
        return parse_board(rest);
    }
    match lower.as_str() {
        "world" => EntryIdent::top(FILE_ID_WORLD_INFO),
        "gr" => EntryIdent::top(FILE_ID_GLOBAL_ROBOT),
        "sfx" => EntryIdent::top(FILE_ID_SFX),
        "chars" => EntryIdent::top(FILE_ID_CHARS),
        "pal" => EntryIdent::top(FILE_ID_PAL),
        "palidx" => EntryIdent::top(FILE_ID_PAL_INDEX),
        "palint" => EntryIdent::top(FILE_ID_PAL_INTENSITY),
        "vco" => EntryIdent::top(FILE_ID_VCO),
        "vch" => EntryIdent::top(FILE_ID_VCH),
        "spr" => EntryIdent::top(FILE_ID_SPRITES),
        "counter" => EntryIdent::top(FILE_ID_COUNTERS),
        "string" => EntryIdent::top(FILE_ID_STRINGS),
        _ => EntryIdent::default(),
    }
}

/// Canonical entry name for an identity. Inverse of [`assign_id`] for
/// every identity the writer produces.
pub(crate) fn entry_name(id: &EntryIdent) -> String {
    match id.file_id {
        FILE_ID_WORLD_INFO => "world".into(),
        FILE_ID_GLOBAL_ROBOT => "gr".into(),
        FILE_ID_SFX => "sfx".into(),
        FILE_ID_CHARS => "chars".into(),
        FILE_ID_PAL => "pal".into(),
        FILE_ID_PAL_INDEX => "palidx".into(),
        FILE_ID_PAL_INTENSITY => "palint".into(),
        FILE_ID_VCO => "vco".into(),
        FILE_ID_VCH => "vch".into(),
        FILE_ID_SPRITES => "spr".into(),
        FILE_ID_COUNTERS => "counter".into(),
        FILE_ID_STRINGS => "string".into(),
        FILE_ID_BOARD_INFO => format!("b{:02x}", id.board_id),
        FILE_ID_ROBOT => format!("b{:02x}r{:x}", id.board_id, id.robot_id),
        FILE_ID_SCROLL => format!("b{:02x}sc{:x}", id.board_id, id.robot_id),
        FILE_ID_SENSOR => format!("b{:02x}se{:x}", id.board_id, id.robot_id),
        plane @ 0x0101..=0x0108 => {
            let suffix = match plane {
                0x0101 => "bid",
                0x0102 => "bpr",
                0x0103 => "bco",
                0x0104 => "uid",
                0x0105 => "upr",
                0x0106 => "uco",
                0x0107 => "och",
                _ => "oco",
            };
            format!("b{:02x}{suffix}", id.board_id)
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(file_id: u16, board_id: u32, robot_id: u32) -> EntryIdent {
        EntryIdent {
            file_id,
            board_id,
            robot_id,
        }
    }

    #[test]
    fn top_level_names() {
        assert_eq!(assign_id("world"), id(FILE_ID_WORLD_INFO, 0, 0));
        assert_eq!(assign_id("WORLD"), id(FILE_ID_WORLD_INFO, 0, 0));
        assert_eq!(assign_id("gr"), id(FILE_ID_GLOBAL_ROBOT, 0, 0));
        assert_eq!(assign_id("counter"), id(FILE_ID_COUNTERS, 0, 0));
        assert_eq!(assign_id("palint"), id(FILE_ID_PAL_INTENSITY, 0, 0));
    }

    #[test]
    fn board_names() {
        assert_eq!(assign_id("b00"), id(FILE_ID_BOARD_INFO, 0, 0));
        assert_eq!(assign_id("bFA"), id(FILE_ID_BOARD_INFO, 0xFA, 0));
        assert_eq!(assign_id("b01bid"), id(FILE_ID_BOARD_BID, 1, 0));
        assert_eq!(assign_id("B01OCO"), id(0x0108, 1, 0));
        assert_eq!(assign_id("b02r1"), id(FILE_ID_ROBOT, 2, 1));
        assert_eq!(assign_id("b02rFF"), id(FILE_ID_ROBOT, 2, 0xFF));
        assert_eq!(assign_id("b02sc3"), id(FILE_ID_SCROLL, 2, 3));
        assert_eq!(assign_id("b02se4"), id(FILE_ID_SENSOR, 2, 4));
    }

    #[test]
    fn bad_names_are_ignored_not_errors() {
        for name in [
            "",
            "b",
            "b0",
            "b00r0",   // object id must be nonzero
            "b00sc0",
            "b00xyz",  // unknown suffix
            "bZZ",     // not hex
            "muzak",
            "sprites9",
            "overlong9", // more than 8 chars
            "readme.txt",
        ] {
            assert_eq!(assign_id(name), EntryIdent::default(), "name {name:?}");
        }
    }

    #[test]
    fn canonical_names_round_trip() {
        for ident in [
            id(FILE_ID_WORLD_INFO, 0, 0),
            id(FILE_ID_SFX, 0, 0),
            id(FILE_ID_BOARD_INFO, 0x1B, 0),
            id(0x0105, 3, 0),
            id(FILE_ID_ROBOT, 0x0A, 0x2F),
            id(FILE_ID_SCROLL, 1, 2),
            id(FILE_ID_SENSOR, 1, 9),
        ] {
            assert_eq!(assign_id(&entry_name(&ident)), ident);
        }
    }

    #[test]
    fn sort_orders_one_linear_pass() {
        let mut entries = vec![
            (id(FILE_ID_BOARD_INFO, 1, 0), 50u64),
            (id(FILE_ID_ROBOT, 0, 2), 40),
            (id(FILE_ID_WORLD_INFO, 0, 0), 90),
            (id(FILE_ID_BOARD_INFO, 0, 0), 10),
            (id(FILE_ID_ROBOT, 0, 1), 70),
            (id(FILE_ID_CHARS, 0, 0), 5),
        ];
        entries.sort_by_key(|(ident, off)| ident.sort_key(*off));
        let files: Vec<u16> = entries.iter().map(|(i, _)| i.file_id).collect();
        assert_eq!(
            files,
            [
                FILE_ID_WORLD_INFO,
                FILE_ID_CHARS,
                FILE_ID_BOARD_INFO,
                FILE_ID_ROBOT,
                FILE_ID_ROBOT,
                FILE_ID_BOARD_INFO,
            ]
        );
        // Robots on the same board order by id.
        assert_eq!(entries[3].0.robot_id, 1);
        assert_eq!(entries[4].0.robot_id, 2);
    }
}
