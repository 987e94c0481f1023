//! The [`Version`] newtype and the named format versions.

use std::fmt;

/// A MegaZeux version word: major in the high byte, minor in the low.
///
/// The minor byte is a plain decimal count, so `Version(0x025A)` is
/// version 2.90 and `Version(0x0254)` is 2.84. Ordering on the raw word
/// matches release order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version(pub u16);

impl Version {
    /// MZX 1.x worlds (`MZX` magic).
    pub const V100: Version = Version(0x0100);
    /// MZX 2.00 through 2.05 (`MZ2` magic).
    pub const V200: Version = Version(0x0205);
    /// MZX 2.08 (`MZA` magic).
    pub const V208: Version = Version(0x0208);
    /// Magic historically stamped onto decrypted worlds.
    pub const DECRYPT: Version = Version(0x0211);
    /// First version using the two-byte version magic.
    pub const V251: Version = Version(0x0251);
    /// Last version of the flat legacy binary layout.
    pub const V284: Version = Version(0x0254);
    /// First version of the zip container layout.
    pub const V290: Version = Version(0x025A);

    /// Version written on save: the newest this codec produces.
    pub const CURRENT: Version = Version(0x025D);
    /// Version written when saving in the legacy layout.
    pub const LEGACY_FORMAT: Version = Version(0x0254);

    /// Major component (high byte).
    pub fn major(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Minor component (low byte, decimal).
    pub fn minor(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// Whether this version uses the zip container rather than the
    /// flat legacy layout.
    pub fn is_zip(self) -> bool {
        self >= Version::V290
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.major(), self.minor())
    }
}

impl From<u16> for Version {
    fn from(v: u16) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_major_dot_decimal_minor() {
        assert_eq!(Version::V290.to_string(), "2.90");
        assert_eq!(Version::V284.to_string(), "2.84");
        assert_eq!(Version::V200.to_string(), "2.05");
        assert_eq!(Version(0x025D).to_string(), "2.93");
        assert_eq!(Version::V100.to_string(), "1.00");
    }

    #[test]
    fn ordering_matches_release_order() {
        assert!(Version::V100 < Version::V200);
        assert!(Version::V284 < Version::V290);
        assert!(Version::V290 <= Version::CURRENT);
        assert!(!Version::V284.is_zip());
        assert!(Version::CURRENT.is_zip());
    }
}
