//! Readers, writers, and validators for MegaZeux world and savegame
//! files.
//!
//! # Containers
//!
//! Two container layouts exist:
//!
//! - **Legacy** (through 2.84): a flat binary layout of fixed-offset
//!   blocks, with an absolute size/offset table locating each board.
//!   Worlds may be *protected*: a password sits between the protection
//!   byte and the magic, and everything after the header is XORed with
//!   a single keystream byte derived from that password.
//! - **Zip** (2.90 and later): the legacy header prefix followed by a
//!   zip archive whose entry names identify world components. The
//!   `world` entry holds tag/length/value property records.
//!
//! # Loading discipline
//!
//! Loading is two-phase. [`dispatch::detect_world`] sniffs the magic,
//! handles decryption (behind a confirmation hook), and runs the
//! matching validator as a read-only dry run over the same byte ranges
//! the loader will visit. Only after validation succeeds does
//! [`dispatch::load_world`] build a [`mzx_core::World`]; a read failure
//! past that point means the file changed under us and is reported as
//! plain truncation.
//!
//! Board interiors and robot programs are carried opaquely through the
//! [`mzx_core::BoardCodec`] and [`mzx_core::RobotCodec`] seams.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod dispatch;
pub mod error;
pub mod legacy;
pub mod magic;
pub mod props;
pub mod zipworld;

pub use dispatch::{
    detect_world, detect_world_file, load_world, save_world, save_world_file, AlwaysUnlock,
    Container, DetectedWorld, LoadContext, NeverUnlock, SaveOptions, UnlockPrompt,
};
pub use error::WorldError;
