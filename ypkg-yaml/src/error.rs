//! Error types for ypkg-yaml.

use thiserror::Error;

/// Failure to turn document text into a [`Node`](crate::Node) tree.
#[derive(Debug, Error)]
pub enum YamlError {
    /// The text is not well-formed YAML.
    #[error("invalid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The document uses a construct package.yml never needs (tags, complex keys).
    #[error("unsupported YAML construct: {what}")]
    Unsupported {
        /// Short description of the construct.
        what: String,
    },

    /// The document root is not a mapping.
    #[error("document root must be a mapping, found {found}")]
    NotAMapping {
        /// Kind of the node that was found instead.
        found: &'static str,
    },
}

/// Result type alias using YamlError.
pub type YamlResult<T> = Result<T, YamlError>;
