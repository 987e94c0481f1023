//! Core data model for MegaZeux world and savegame files.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the [`World`] aggregate and everything it owns (boards, counters,
//! strings, sprites, palette, charset, the char-id context table), the
//! [`Version`] newtype with the named format versions, and the seam
//! traits the format codecs call through for board and robot payloads.
//!
//! The on-disk encodings themselves live in `mzx-format`; this crate is
//! only the in-memory shape of a loaded world.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod board;
pub mod counters;
pub mod error;
pub mod gfx;
pub mod limits;
pub mod sprite;
pub mod traits;
pub mod version;
pub mod world;

pub use board::{Board, BoardPlane, Robot};
pub use counters::{Counter, CounterTable, StringTable, StringVar};
pub use error::ObjectError;
pub use gfx::{CharIdTable, Charset, Palette, Rgb6};
pub use sprite::{Sprite, SpriteTable};
pub use traits::{
    BoardCodec, OpaqueBoardCodec, OpaqueRobotCodec, ProgressMeter, RobotCodec, SilentMeter,
};
pub use version::Version;
pub use world::{GlobalSettings, SaveState, SfxTable, Vlayer, World};
