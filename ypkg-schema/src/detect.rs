//! Format detection from the `YPKG` marker.

use tracing::debug;
use ypkg_yaml::{Node, parse_document};

use crate::error::SchemaError;

/// Key of the version marker.
pub const MARKER: &str = "YPKG";

/// Documents without a marker are version 2.
pub const UNMARKED_VERSION: i64 = 2;

/// Read the version number a document declares.
///
/// Only the marker is looked at. Any integer that fits in an `i64` is
/// accepted, negative ones included; whether it names a supported version
/// is decided by [`crate::new_record`].
pub fn detect(doc: &Node) -> Result<i64, SchemaError> {
    let version = match doc.get(MARKER) {
        None | Some(Node::Null) => UNMARKED_VERSION,
        Some(Node::Scalar(marker)) if marker.value.trim().is_empty() => UNMARKED_VERSION,
        Some(Node::Scalar(marker)) => {
            marker
                .value
                .trim()
                .parse()
                .map_err(|_| SchemaError::Format {
                    marker: marker.value.clone(),
                })?
        }
        Some(other) => {
            return Err(SchemaError::Format {
                marker: format!("<{}>", other.kind()),
            });
        }
    };
    debug!(version, "detected format");
    Ok(version)
}

/// Parse `text` and detect its version.
pub fn detect_str(text: &str) -> Result<i64, SchemaError> {
    detect(&parse_document(text)?)
}
