//! Error type for package operations.
//!
//! Exit codes:
//! - 2: the document is invalid (bad shape, unknown version, conflicting keys)
//! - 3: the operation exists but is not implemented
//! - 1: everything else (I/O, closed handles)

use camino::Utf8PathBuf;
use thiserror::Error;
use ypkg_schema::SchemaError;

#[derive(Debug, Error)]
pub enum PackageError {
    /// Passed through untouched; `fs_err` already names the path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{path}: {source}")]
    Schema {
        path: Utf8PathBuf,
        source: SchemaError,
    },

    #[error("`{operation}` is not implemented")]
    NotImplemented { operation: &'static str },

    #[error("{path}: package file is closed")]
    Closed { path: Utf8PathBuf },
}

impl PackageError {
    pub(crate) fn schema(path: &camino::Utf8Path) -> impl FnOnce(SchemaError) -> PackageError {
        let path = path.to_owned();
        move |source| PackageError::Schema { path, source }
    }

    /// Returns true if the document itself is at fault.
    pub fn is_document_error(&self) -> bool {
        matches!(self, PackageError::Schema { .. })
    }

    /// Returns the recommended exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            PackageError::Schema { .. } => 2,
            PackageError::NotImplemented { .. } => 3,
            PackageError::Io(_) | PackageError::Closed { .. } => 1,
        }
    }
}

pub type PackageResult<T> = Result<T, PackageError>;
