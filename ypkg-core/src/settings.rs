//! Clap-free settings for package operations.

use ypkg_types::{Codec, FormatVersion};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSettings {
    /// Collection codec, including the reserved variant key.
    pub codec: Codec,
    /// Version written by `init`.
    pub init_version: FormatVersion,
    /// Version `convert` targets when the caller does not pick one.
    pub convert_target: FormatVersion,
}

impl Default for PackageSettings {
    fn default() -> Self {
        Self {
            codec: Codec::default(),
            init_version: FormatVersion::V2,
            convert_target: FormatVersion::LATEST,
        }
    }
}
