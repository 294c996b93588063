use thiserror::Error;

/// A collection or scalar does not have one of the permitted shapes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("expected {expected}, found {found}")]
    Unexpected {
        expected: &'static str,
        found: &'static str,
    },

    #[error("{what} must not be empty")]
    Empty { what: &'static str },

    #[error("first entry must be the default value as a non-empty scalar")]
    MissingDefaultEntry,

    #[error("entry {index}: expected a single `name: value` pair, found {found}")]
    NotAPair { index: usize, found: String },

    #[error("variant name must not be empty")]
    EmptyVariant,

    #[error("variant name `{key}` is reserved")]
    ReservedVariant { key: String },

    #[error("variant `{key}` is given more than once")]
    DuplicateVariant { key: String },

    /// Only a map holding the default entry can be written out.
    #[error("values without a default entry cannot be serialized")]
    NoDefault,

    #[error("invalid boolean `{value}`, expected yes or no")]
    InvalidBool { value: String },

    #[error("invalid number `{value}`")]
    InvalidNumber { value: String },
}

impl ShapeError {
    pub(crate) fn unexpected(expected: &'static str, found: &ypkg_yaml::Node) -> Self {
        ShapeError::Unexpected {
            expected,
            found: found.kind(),
        }
    }
}
