use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// On-disk layout revision of a package.yml file.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u32", into = "u32")]
pub enum FormatVersion {
    /// No `YPKG` marker; dependencies and flags live at the top level.
    #[default]
    V2,
    /// `YPKG: 3`; nested `deps:` and `flags:` sections.
    V3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unsupported format version {0}")]
pub struct UnsupportedVersion(pub u32);

impl FormatVersion {
    pub const ALL: [FormatVersion; 2] = [FormatVersion::V2, FormatVersion::V3];
    pub const LATEST: FormatVersion = FormatVersion::V3;

    pub fn number(self) -> u32 {
        match self {
            FormatVersion::V2 => 2,
            FormatVersion::V3 => 3,
        }
    }
}

impl TryFrom<u32> for FormatVersion {
    type Error = UnsupportedVersion;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(FormatVersion::V2),
            3 => Ok(FormatVersion::V3),
            other => Err(UnsupportedVersion(other)),
        }
    }
}

impl From<FormatVersion> for u32 {
    fn from(value: FormatVersion) -> Self {
        value.number()
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}
