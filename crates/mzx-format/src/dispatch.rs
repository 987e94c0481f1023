//! The front door: container detection, decryption, and the
//! validate-then-load pipeline.

use std::fs;
use std::path::Path;

use log::{debug, info};

use crate::error::WorldError;
use crate::legacy::{
    self, decrypt_world, is_protected, LegacyHeader, WORLD_HEADER_SIZE,
};
use crate::magic::{save_magic, world_magic};
use crate::zipworld::{self, ZipHeader};
use mzx_core::limits::BOARD_NAME_SIZE;
use mzx_core::{
    BoardCodec, OpaqueBoardCodec, OpaqueRobotCodec, ProgressMeter, RobotCodec, SilentMeter,
    Version, World,
};

/// Codec seams and the progress hook threaded through every load and
/// save.
///
/// The default context keeps board and robot records verbatim and
/// reports no progress, which is what format tools want; an engine
/// plugs in real codecs and a real meter.
pub struct LoadContext {
    /// Board body codec.
    pub boards: Box<dyn BoardCodec>,
    /// Robot record codec.
    pub robots: Box<dyn RobotCodec>,
    /// Progress reporting hook.
    pub meter: Box<dyn ProgressMeter>,
}

impl Default for LoadContext {
    fn default() -> Self {
        Self {
            boards: Box::new(OpaqueBoardCodec),
            robots: Box::new(OpaqueRobotCodec),
            meter: Box::new(SilentMeter),
        }
    }
}

/// Decides whether a protected world may be decrypted.
///
/// Decryption rewrites the file image in memory; nothing on disk
/// changes either way.
pub trait UnlockPrompt {
    /// Called once when a protected world is detected. Returning
    /// false aborts the load with [`WorldError::DecryptDeclined`].
    fn allow_unlock(&mut self, name: &str, pro_method: u8) -> bool;
}

/// Prompt that always decrypts.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysUnlock;

impl UnlockPrompt for AlwaysUnlock {
    fn allow_unlock(&mut self, _name: &str, _pro_method: u8) -> bool {
        true
    }
}

/// Prompt that never decrypts.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverUnlock;

impl UnlockPrompt for NeverUnlock {
    fn allow_unlock(&mut self, _name: &str, _pro_method: u8) -> bool {
        false
    }
}

/// Which container layout a detected file uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Container {
    /// Flat binary layout, through 2.84.
    Legacy,
    /// Zip archive behind the legacy prefix, 2.90 on.
    Zip,
}

#[derive(Debug)]
enum Validated {
    Legacy(LegacyHeader),
    Zip(ZipHeader),
}

/// A detected and validated file, ready to load.
///
/// Owns the file image; for a protected world this is the decrypted
/// copy, not the original bytes.
#[derive(Debug)]
pub struct DetectedWorld {
    data: Vec<u8>,
    savegame: bool,
    header: Validated,
}

impl DetectedWorld {
    /// Container layout.
    pub fn container(&self) -> Container {
        match self.header {
            Validated::Legacy(_) => Container::Legacy,
            Validated::Zip(_) => Container::Zip,
        }
    }

    /// Version translated from the magic.
    pub fn version(&self) -> Version {
        match &self.header {
            Validated::Legacy(h) => h.version,
            Validated::Zip(h) => h.version,
        }
    }

    /// World name, as far as the header knows it.
    pub fn name(&self) -> &[u8] {
        match &self.header {
            Validated::Legacy(h) => &h.name,
            Validated::Zip(h) => &h.name,
        }
    }

    /// Number of boards the file declares.
    pub fn num_boards(&self) -> usize {
        match &self.header {
            Validated::Legacy(h) => h.num_boards,
            Validated::Zip(h) => h.num_boards,
        }
    }

    /// Whether the file is a savegame.
    pub fn is_savegame(&self) -> bool {
        self.savegame
    }

    /// The validated file image.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Sniff the version without validating anything else.
fn sniff_version(data: &[u8], savegame: bool) -> Result<u16, WorldError> {
    if savegame {
        if data.len() < 8 {
            return Err(WorldError::InvalidMagic);
        }
        let mut magic = [0u8; 5];
        magic.copy_from_slice(&data[..5]);
        Ok(save_magic(&magic))
    } else {
        if data.len() < WORLD_HEADER_SIZE {
            return Err(WorldError::InvalidMagic);
        }
        let mut magic = [0u8; 3];
        magic.copy_from_slice(&data[26..29]);
        Ok(world_magic(&magic))
    }
}

/// Detect and validate a world or savegame image.
///
/// Takes ownership of the bytes: a protected world is decrypted in
/// memory (after `prompt` agrees) and the decrypted image replaces the
/// original. Validation is a read-only dry run over the same byte
/// ranges the loader will visit; no world state is built here.
pub fn detect_world(
    data: Vec<u8>,
    savegame: bool,
    prompt: &mut dyn UnlockPrompt,
) -> Result<DetectedWorld, WorldError> {
    let mut data = data;

    if !savegame {
        if let Some(pro_method) = is_protected(&data) {
            let name = crate::codec::trim_padded(&data[..BOARD_NAME_SIZE]);
            let name = String::from_utf8_lossy(name).into_owned();
            if !prompt.allow_unlock(&name, pro_method) {
                return Err(WorldError::DecryptDeclined);
            }
            info!("decrypting protected world \"{name}\" (method {pro_method})");
            data = decrypt_world(&data)?;
        }
    }

    let version = sniff_version(&data, savegame)?;
    debug!("detected version {} ({version:#06x})", Version(version));
    let header = if Version(version).is_zip() {
        Validated::Zip(zipworld::validate_zip_world(&data, savegame)?)
    } else {
        Validated::Legacy(legacy::validate_legacy_world(&data, savegame)?)
    };
    Ok(DetectedWorld {
        data,
        savegame,
        header,
    })
}

/// Load a detected file into a [`World`].
pub fn load_world(detected: &DetectedWorld, ctx: &mut LoadContext) -> Result<World, WorldError> {
    match &detected.header {
        Validated::Legacy(h) => {
            legacy::load_legacy_world(&detected.data, h, detected.savegame, ctx)
        }
        Validated::Zip(h) => zipworld::load_zip_world(&detected.data, h, detected.savegame, ctx),
    }
}

/// Output options for [`save_world`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SaveOptions {
    /// Write the flat 2.84 layout instead of the zip container.
    pub legacy: bool,
}

/// Encode a world or savegame in the selected container.
pub fn save_world(
    world: &World,
    savegame: bool,
    options: SaveOptions,
    ctx: &mut LoadContext,
) -> Result<Vec<u8>, WorldError> {
    if options.legacy {
        legacy::save_legacy_world(world, savegame, ctx)
    } else {
        zipworld::save_zip_world(world, savegame, ctx)
    }
}

/// Read a file from disk and run [`detect_world`] on it.
pub fn detect_world_file(
    path: impl AsRef<Path>,
    savegame: bool,
    prompt: &mut dyn UnlockPrompt,
) -> Result<DetectedWorld, WorldError> {
    let data = fs::read(path)?;
    detect_world(data, savegame, prompt)
}

/// Encode a world with [`save_world`] and write it to disk.
pub fn save_world_file(
    path: impl AsRef<Path>,
    world: &World,
    savegame: bool,
    options: SaveOptions,
    ctx: &mut LoadContext,
) -> Result<(), WorldError> {
    let data = save_world(world, savegame, options, ctx)?;
    fs::write(path, data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mzx_core::{Board, Robot};

    fn world_fixture() -> World {
        let mut world = World {
            name: "Labyrinth".into(),
            version: Version::LEGACY_FORMAT,
            world_version: Version::LEGACY_FORMAT,
            ..World::default()
        };
        world.settings.starting_health = 120;
        world.boards = vec![
            Board::from_body("entry".into(), vec![1, 2, 3]),
            Board::from_body("maze".into(), vec![4, 5]),
        ];
        world.global_robot = Robot { data: vec![7, 7] };
        world
    }

    #[test]
    fn legacy_worlds_route_to_the_legacy_loader() {
        let world = world_fixture();
        let mut ctx = LoadContext::default();
        let data = save_world(&world, false, SaveOptions { legacy: true }, &mut ctx).unwrap();

        let detected = detect_world(data, false, &mut AlwaysUnlock).unwrap();
        assert_eq!(detected.container(), Container::Legacy);
        assert_eq!(detected.version(), Version::LEGACY_FORMAT);
        assert_eq!(detected.name(), b"Labyrinth");
        assert_eq!(detected.num_boards(), 2);

        let loaded = load_world(&detected, &mut ctx).unwrap();
        assert_eq!(loaded, world);
    }

    #[test]
    fn zip_worlds_route_to_the_zip_loader() {
        let mut world = world_fixture();
        world.version = Version::CURRENT;
        world.world_version = Version::CURRENT;
        // Zip board names live inside the opaque body.
        for board in &mut world.boards {
            board.name.clear();
        }
        let mut ctx = LoadContext::default();
        let data = save_world(&world, false, SaveOptions::default(), &mut ctx).unwrap();

        let detected = detect_world(data, false, &mut AlwaysUnlock).unwrap();
        assert_eq!(detected.container(), Container::Zip);
        assert_eq!(detected.version(), Version::CURRENT);

        let loaded = load_world(&detected, &mut ctx).unwrap();
        assert_eq!(loaded, world);
    }

    #[test]
    fn protected_worlds_decrypt_behind_the_prompt() {
        let world = world_fixture();
        let mut ctx = LoadContext::default();
        let plain = save_world(&world, false, SaveOptions { legacy: true }, &mut ctx).unwrap();
        let protected = crate::legacy::encrypt_world(&plain, b"squidward", 2);

        // Declined: nothing is loaded.
        assert!(matches!(
            detect_world(protected.clone(), false, &mut NeverUnlock),
            Err(WorldError::DecryptDeclined)
        ));

        // Accepted: the decrypted image loads like the plain one.
        struct Recorder(Option<(String, u8)>);
        impl UnlockPrompt for Recorder {
            fn allow_unlock(&mut self, name: &str, pro_method: u8) -> bool {
                self.0 = Some((name.to_owned(), pro_method));
                true
            }
        }
        let mut prompt = Recorder(None);
        let detected = detect_world(protected, false, &mut prompt).unwrap();
        assert_eq!(prompt.0, Some(("Labyrinth".into(), 2)));
        let loaded = load_world(&detected, &mut ctx).unwrap();
        assert_eq!(loaded, world);
    }

    #[test]
    fn garbage_is_invalid_magic() {
        assert!(matches!(
            detect_world(vec![0; 4], false, &mut AlwaysUnlock),
            Err(WorldError::InvalidMagic)
        ));
        let junk = vec![0x55; 200];
        assert!(matches!(
            detect_world(junk, false, &mut AlwaysUnlock),
            Err(WorldError::InvalidMagic)
        ));
    }

    #[test]
    fn savegames_route_on_their_own_magic() {
        let mut world = world_fixture();
        world.save_state = Some(mzx_core::SaveState {
            mzx_speed: 4,
            ..mzx_core::SaveState::default()
        });
        world.current_board = 1;
        let mut ctx = LoadContext::default();
        let data = save_world(&world, true, SaveOptions { legacy: true }, &mut ctx).unwrap();

        let detected = detect_world(data, true, &mut AlwaysUnlock).unwrap();
        assert_eq!(detected.container(), Container::Legacy);
        assert!(detected.is_savegame());

        let loaded = load_world(&detected, &mut ctx).unwrap();
        assert_eq!(loaded.current_board, 1);
        assert!(loaded.is_savegame());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = detect_world_file("/no/such/world.mzx", false, &mut AlwaysUnlock).unwrap_err();
        assert!(matches!(err, WorldError::Io(_)));
    }
}
