//! Seam traits between the container codecs and the payloads they
//! carry, plus the progress meter hook.
//!
//! The world containers treat board interiors and robot programs as
//! opaque records. Callers that understand those layouts implement
//! [`BoardCodec`] and [`RobotCodec`]; everyone else uses the opaque
//! implementations, which keep the bytes verbatim and round-trip
//! exactly.

use crate::board::{Board, Robot};
use crate::error::ObjectError;
use crate::version::Version;

/// Decodes and encodes board bodies.
pub trait BoardCodec {
    /// Build a [`Board`] from one board record.
    fn load_board(&self, data: &[u8], savegame: bool, version: Version)
        -> Result<Board, ObjectError>;

    /// Encode a board back into one record.
    fn save_board(&self, board: &Board, savegame: bool, version: Version) -> Vec<u8>;
}

/// Decodes and encodes robot records.
pub trait RobotCodec {
    /// Build a [`Robot`] from one robot record.
    fn load_robot(&self, data: &[u8], savegame: bool, version: Version)
        -> Result<Robot, ObjectError>;

    /// Encode a robot back into one record.
    fn save_robot(&self, robot: &Robot, savegame: bool, version: Version) -> Vec<u8>;
}

/// Board codec that keeps record bytes verbatim.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpaqueBoardCodec;

impl BoardCodec for OpaqueBoardCodec {
    fn load_board(
        &self,
        data: &[u8],
        _savegame: bool,
        _version: Version,
    ) -> Result<Board, ObjectError> {
        Ok(Board::from_body(String::new(), data.to_vec()))
    }

    fn save_board(&self, board: &Board, _savegame: bool, _version: Version) -> Vec<u8> {
        board.body.clone()
    }
}

/// Robot codec that keeps record bytes verbatim.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpaqueRobotCodec;

impl RobotCodec for OpaqueRobotCodec {
    fn load_robot(
        &self,
        data: &[u8],
        _savegame: bool,
        _version: Version,
    ) -> Result<Robot, ObjectError> {
        Ok(Robot {
            data: data.to_vec(),
        })
    }

    fn save_robot(&self, robot: &Robot, _savegame: bool, _version: Version) -> Vec<u8> {
        robot.data.clone()
    }
}

/// Progress reporting hook driven by long load and save loops.
///
/// The codecs call this once per board or archive entry; a UI can draw
/// a meter, tests use [`SilentMeter`].
pub trait ProgressMeter {
    /// A new operation begins with `target` units of work.
    fn start(&mut self, title: &str, target: usize);
    /// `n` more units of work finished.
    fn advance(&mut self, n: usize);
    /// The operation completed.
    fn done(&mut self);
}

/// Progress meter that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentMeter;

impl ProgressMeter for SilentMeter {
    fn start(&mut self, _title: &str, _target: usize) {}
    fn advance(&mut self, _n: usize) {}
    fn done(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_codecs_round_trip_bytes() {
        let data = vec![1u8, 2, 3, 250];
        let board = OpaqueBoardCodec
            .load_board(&data, false, Version::V284)
            .unwrap();
        assert_eq!(
            OpaqueBoardCodec.save_board(&board, false, Version::V284),
            data
        );

        let robot = OpaqueRobotCodec
            .load_robot(&data, true, Version::CURRENT)
            .unwrap();
        assert_eq!(
            OpaqueRobotCodec.save_robot(&robot, true, Version::CURRENT),
            data
        );
    }
}
