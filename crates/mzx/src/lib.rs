//! Mzx: a toolkit for MegaZeux world and savegame files.
//!
//! This is the top-level facade crate that re-exports the public API
//! from the sub-crates. For most users, adding `mzx` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use mzx::prelude::*;
//!
//! // Build a tiny world and write it in the modern container.
//! let mut world = World::default();
//! world.name = "demo".into();
//! world.boards.push(Board::from_body(String::new(), vec![0; 16]));
//!
//! let mut ctx = LoadContext::default();
//! let bytes = save_world(&world, false, SaveOptions::default(), &mut ctx).unwrap();
//!
//! // Read it back. Detection sniffs the magic, decrypts protected
//! // legacy worlds behind the prompt, and validates before loading.
//! let detected = detect_world(bytes, false, &mut AlwaysUnlock).unwrap();
//! assert_eq!(detected.container(), Container::Zip);
//! let loaded = load_world(&detected, &mut ctx).unwrap();
//! assert_eq!(loaded.name, "demo");
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `mzx-core` | The in-memory world model, versions, codec seams |
//! | [`format`] | `mzx-format` | Legacy and zip containers, detection, validation |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// The in-memory world model (`mzx-core`).
///
/// Contains the [`types::World`] aggregate, the [`types::Version`]
/// newtype, and the [`types::BoardCodec`] / [`types::RobotCodec`]
/// seams for board and robot payloads.
pub use mzx_core as types;

/// Container codecs and the load pipeline (`mzx-format`).
///
/// [`format::detect_world`] is the front door; it routes between the
/// flat legacy layout and the zip container by translated version.
pub use mzx_format as format;

/// Common imports for typical usage.
///
/// ```rust
/// use mzx::prelude::*;
/// ```
pub mod prelude {
    // World model
    pub use mzx_core::{
        Board, BoardCodec, Counter, CounterTable, Robot, RobotCodec, SaveState, StringTable,
        Version, World,
    };

    // Errors
    pub use mzx_core::ObjectError;
    pub use mzx_format::WorldError;

    // Detection, loading, saving
    pub use mzx_format::{
        detect_world, detect_world_file, load_world, save_world, save_world_file, AlwaysUnlock,
        Container, DetectedWorld, LoadContext, NeverUnlock, SaveOptions, UnlockPrompt,
    };
}
