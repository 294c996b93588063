use std::fmt;

use ypkg_types::{Codec, FormatVersion, PackageSpec};
use ypkg_yaml::Node;

use crate::error::SchemaError;
use crate::{v2, v3};

/// One on-disk layout of package.yml.
///
/// A record is decoded from a document tree, converted to the canonical
/// [`PackageSpec`], updated from one with [`modify`](Self::modify), and
/// encoded back into a tree.
pub trait VersionedRecord: fmt::Debug + Send {
    fn version(&self) -> FormatVersion;

    /// Replace the record's contents with `doc`.
    fn decode(&mut self, doc: &Node) -> Result<(), SchemaError>;

    fn encode(&self) -> Result<Node, SchemaError>;

    /// Lift into the canonical model. Does not change the record.
    fn convert(&self) -> Result<PackageSpec, SchemaError>;

    /// Project the canonical model into this layout.
    fn modify(&mut self, spec: &PackageSpec);
}

/// Allocate an empty record for a detected version number.
pub fn new_record(version: i64, codec: Codec) -> Result<Box<dyn VersionedRecord>, SchemaError> {
    let format = u32::try_from(version)
        .ok()
        .and_then(|v| FormatVersion::try_from(v).ok())
        .ok_or(SchemaError::UnsupportedVersion { version })?;
    Ok(record_for(format, codec))
}

pub fn record_for(version: FormatVersion, codec: Codec) -> Box<dyn VersionedRecord> {
    match version {
        FormatVersion::V2 => Box::new(v2::PackageYml::new(codec)),
        FormatVersion::V3 => Box::new(v3::PackageYml::new(codec)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_supported_versions() {
        assert_eq!(
            new_record(2, Codec::default()).unwrap().version(),
            FormatVersion::V2
        );
        assert_eq!(
            new_record(3, Codec::default()).unwrap().version(),
            FormatVersion::V3
        );
    }

    #[test]
    fn rejects_unknown_versions() {
        for version in [-1, 0, 1, 4, 99, i64::from(u32::MAX) + 2] {
            assert!(matches!(
                new_record(version, Codec::default()),
                Err(SchemaError::UnsupportedVersion { version: v }) if v == version
            ));
        }
    }
}
