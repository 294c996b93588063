//! Versioned package.yml records.
//!
//! Flow: [`detect`] reads the `YPKG` marker, [`new_record`] allocates the
//! matching [`VersionedRecord`], which decodes the document tree and
//! converts it to a [`ypkg_types::PackageSpec`] (and back via `modify`).

mod detect;
mod error;
mod record;
mod sections;
pub mod v2;
pub mod v3;

pub use detect::{MARKER, UNMARKED_VERSION, detect, detect_str};
pub use error::SchemaError;
pub use record::{VersionedRecord, new_record, record_for};
pub use sections::{DepsLayout, FlagPlacement, Files, Header, Recipe};
