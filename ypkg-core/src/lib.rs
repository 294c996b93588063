//! Embeddable core library for ypkg.
//!
//! Clap-free entry points for working with package.yml files:
//!
//! - [`Package`]: an open file plus its versioned record
//!   (load, convert, modify, save, close).
//! - [`ops`]: bump, convert, init and the reserved lint/update/auto
//!   operations.
//! - [`PackageSettings`]: codec and default format versions.

mod error;
pub mod ops;
mod package;
pub mod settings;

pub use error::{PackageError, PackageResult};
pub use package::Package;
pub use settings::PackageSettings;

// Re-export so embedders don't need ypkg-types directly.
pub use ypkg_types::{Codec, FormatVersion, PackageSpec};
