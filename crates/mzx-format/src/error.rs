//! Error type shared by every container codec in this crate.

use mzx_core::{ObjectError, Version};
use std::error::Error;
use std::fmt;
use std::io;

/// Failure while detecting, validating, loading, or saving a world.
#[derive(Debug)]
pub enum WorldError {
    /// Underlying I/O failure, including a missing file.
    Io(io::Error),
    /// The magic bytes do not translate to any known version.
    InvalidMagic,
    /// The file is structurally wrong.
    Invalid {
        /// What the validator tripped over.
        detail: String,
    },
    /// The file's version is real but outside what this codec loads.
    UnsupportedVersion {
        /// Version translated from the magic.
        found: Version,
        /// True when the file is newer than this codec, false when it
        /// predates what the codec supports.
        newer: bool,
    },
    /// A protected world was found and the caller declined to decrypt.
    DecryptDeclined,
    /// The zip archive itself failed to parse.
    Archive {
        /// Error text from the archive reader.
        detail: String,
    },
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldError::Io(e) => write!(f, "i/o error: {e}"),
            WorldError::InvalidMagic => write!(f, "not a MegaZeux world or savegame"),
            WorldError::Invalid { detail } => write!(f, "corrupt world file: {detail}"),
            WorldError::UnsupportedVersion { found, newer } => {
                if *newer {
                    write!(f, "world version {found} is newer than this loader supports")
                } else {
                    write!(f, "world version {found} is too old for this loader")
                }
            }
            WorldError::DecryptDeclined => {
                write!(f, "world is password protected; decryption declined")
            }
            WorldError::Archive { detail } => write!(f, "bad zip archive: {detail}"),
        }
    }
}

impl Error for WorldError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WorldError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for WorldError {
    fn from(e: io::Error) -> Self {
        WorldError::Io(e)
    }
}

impl From<ObjectError> for WorldError {
    fn from(e: ObjectError) -> Self {
        WorldError::Invalid {
            detail: e.to_string(),
        }
    }
}

impl WorldError {
    /// Shorthand for a structural error.
    pub fn invalid(detail: impl Into<String>) -> Self {
        WorldError::Invalid {
            detail: detail.into(),
        }
    }

    /// Generic truncation error used after validation has passed;
    /// anything failing here means the bytes changed underneath us.
    pub fn truncated(what: &str) -> Self {
        WorldError::Invalid {
            detail: format!("unexpected end of file in {what}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_messages_name_the_version() {
        let e = WorldError::UnsupportedVersion {
            found: Version(0x025F),
            newer: true,
        };
        assert!(e.to_string().contains("2.95"));
        let e = WorldError::UnsupportedVersion {
            found: Version::V100,
            newer: false,
        };
        assert!(e.to_string().contains("1.00"));
    }
}
