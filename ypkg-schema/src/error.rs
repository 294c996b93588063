use thiserror::Error;
use ypkg_types::{ShapeError, UnsupportedVersion};
use ypkg_yaml::YamlError;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error(transparent)]
    Yaml(#[from] YamlError),

    #[error("invalid `{field}`: {source}")]
    Shape { field: String, source: ShapeError },

    #[error("format marker `{marker}` is not a version number")]
    Format { marker: String },

    #[error("unsupported format version {version}")]
    UnsupportedVersion { version: i64 },

    #[error("`{field}` and `{alternate}` cannot both be set")]
    Conflict {
        field: &'static str,
        alternate: &'static str,
    },
}

impl From<UnsupportedVersion> for SchemaError {
    fn from(err: UnsupportedVersion) -> Self {
        SchemaError::UnsupportedVersion {
            version: err.0.into(),
        }
    }
}

impl SchemaError {
    pub(crate) fn shape(field: impl Into<String>) -> impl FnOnce(ShapeError) -> SchemaError {
        let field = field.into();
        move |source| SchemaError::Shape { field, source }
    }
}
