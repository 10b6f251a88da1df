use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::FIPS_VERSION_RANGE;

/// Token firmware version. Ordering is lexicographic over (major, minor, patch).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("expected MAJOR.MINOR.PATCH, got {0:?}")]
    Format(String),
    #[error("version component out of range: {0:?}")]
    Component(String),
}

impl Version {
    pub const fn new(major: u8, minor: u8, patch: u8) -> Self {
        Self { major, minor, patch }
    }

    pub fn is_fips(&self) -> bool {
        let (lower, upper) = FIPS_VERSION_RANGE;
        lower <= *self && *self < upper
    }

    /// True if `lower < self < upper`.
    pub fn is_strictly_between(&self, lower: Version, upper: Version) -> bool {
        lower < *self && *self < upper
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        let [major, minor, patch] = parts.as_slice() else {
            return Err(VersionError::Format(s.to_string()));
        };
        let parse = |part: &str| {
            part.parse::<u8>()
                .map_err(|_| VersionError::Component(part.to_string()))
        };
        Ok(Self::new(parse(major)?, parse(minor)?, parse(patch)?))
    }
}

impl From<(u8, u8, u8)> for Version {
    fn from((major, minor, patch): (u8, u8, u8)) -> Self {
        Self::new(major, minor, patch)
    }
}
