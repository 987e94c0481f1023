//! Magic byte translation for world and savegame headers.
//!
//! Early releases used string magics (`MZX`, `MZ2`, `MZA`); 2.51 and
//! later embed the version directly as `M` plus big-endian version
//! bytes. Savegames use a five-byte variant. A translation of 0 means
//! the bytes are not a recognized magic at all.

use mzx_core::Version;

/// Translate a world header magic to a version word, or 0.
pub fn world_magic(magic: &[u8; 3]) -> u16 {
    if magic[0] != b'M' {
        return 0;
    }
    if magic[1] == b'Z' {
        match magic[2] {
            b'X' => Version::V100.0,
            b'2' => Version::V200.0,
            b'A' => Version::V208.0,
            _ => 0,
        }
    } else if magic[1] > 1 && magic[1] < 10 {
        ((magic[1] as u16) << 8) | magic[2] as u16
    } else {
        0
    }
}

/// Translate a savegame header magic to a version word, or 0.
pub fn save_magic(magic: &[u8; 5]) -> u16 {
    if magic[0] != b'M' || magic[1] != b'Z' {
        return 0;
    }
    match magic[2] {
        b'S' => {
            if magic[3] == b'V' && magic[4] == b'2' {
                Version::V200.0
            } else if magic[3] > 1 && magic[3] <= 10 {
                ((magic[3] as u16) << 8) | magic[4] as u16
            } else {
                0
            }
        }
        b'X' => {
            if magic[3] == b'S' && magic[4] == b'A' {
                Version::V208.0
            } else {
                0
            }
        }
        _ => 0,
    }
}

/// The three magic bytes written for a world of `version`.
pub fn world_magic_bytes(version: Version) -> [u8; 3] {
    [b'M', version.major(), version.minor()]
}

/// The five magic bytes written for a savegame of `version`.
pub fn save_magic_bytes(version: Version) -> [u8; 5] {
    [b'M', b'Z', b'S', version.major(), version.minor()]
}
