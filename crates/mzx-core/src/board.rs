//! Boards and the opaque payloads attached to them.
//!
//! Board interiors and robot programs are not decoded here; they pass
//! through the [`crate::traits::BoardCodec`] and
//! [`crate::traits::RobotCodec`] seams as byte payloads. A board still
//! owns the zip-era layer planes and per-object payloads so a loaded
//! world can be written back out entry for entry.

use indexmap::IndexMap;
use smallvec::SmallVec;
use std::fmt;

/// A robot payload: the program and header bytes of one robot.
///
/// The encoding is the robot codec's concern. The default opaque codec
/// keeps the bytes verbatim, which round-trips exactly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Robot {
    /// Raw robot record bytes.
    pub data: Vec<u8>,
}

/// Layer planes a zip-era board splits into separate archive entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BoardPlane {
    /// Top-layer thing ids.
    LevelId,
    /// Top-layer thing params.
    LevelParam,
    /// Top-layer colors.
    LevelColor,
    /// Under-layer thing ids.
    UnderId,
    /// Under-layer thing params.
    UnderParam,
    /// Under-layer colors.
    UnderColor,
    /// Overlay chars.
    OverlayChar,
    /// Overlay colors.
    OverlayColor,
}

impl fmt::Display for BoardPlane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BoardPlane::LevelId => "bid",
            BoardPlane::LevelParam => "bpr",
            BoardPlane::LevelColor => "bco",
            BoardPlane::UnderId => "uid",
            BoardPlane::UnderParam => "upr",
            BoardPlane::UnderColor => "uco",
            BoardPlane::OverlayChar => "och",
            BoardPlane::OverlayColor => "oco",
        };
        f.write_str(s)
    }
}

/// One board of a world.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Board {
    /// Board name, at most 24 bytes on disk.
    pub name: String,
    /// The board body: the whole legacy record, or the zip `bXX`
    /// info record, depending on which container loaded it.
    pub body: Vec<u8>,
    /// Zip-era layer planes, keyed by plane kind.
    pub planes: IndexMap<BoardPlane, Vec<u8>>,
    /// Robots, keyed by their nonzero object id.
    pub robots: SmallVec<[(u8, Robot); 4]>,
    /// Scroll payloads, keyed by object id.
    pub scrolls: SmallVec<[(u8, Vec<u8>); 2]>,
    /// Sensor payloads, keyed by object id.
    pub sensors: SmallVec<[(u8, Vec<u8>); 2]>,
}

impl Board {
    /// A board with only a name and an opaque body.
    pub fn from_body(name: String, body: Vec<u8>) -> Self {
        Self {
            name,
            body,
            ..Self::default()
        }
    }
}
