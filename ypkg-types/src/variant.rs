use std::fmt;

use crate::error::ShapeError;

/// Selects which subpackage a value applies to.
///
/// The default (main) package is its own case rather than a magic string, so
/// no user-chosen name can collide with it. `Default` orders before every
/// named variant; named variants order lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Variant {
    Default,
    Named(String),
}

impl Variant {
    /// Build a named variant, rejecting the empty name.
    pub fn named(name: impl Into<String>) -> Result<Self, ShapeError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ShapeError::EmptyVariant);
        }
        Ok(Variant::Named(name))
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Variant::Default)
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Variant::Default => None,
            Variant::Named(name) => Some(name),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Default => f.write_str("(default)"),
            Variant::Named(name) => f.write_str(name),
        }
    }
}
