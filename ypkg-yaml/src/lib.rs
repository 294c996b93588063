//! Document layer for package.yml files.
//!
//! Responsibilities:
//! - Parse YAML text into an ordered [`Node`] tree (via `serde_yaml`).
//! - Recover inline comments and the raw text of numeric scalars, which
//!   `serde_yaml` alone discards.
//! - Emit a [`Node`] tree back to block-style YAML.
//!
//! Only trailing inline comments are kept. Whole-line comments and blank
//! lines are not part of the tree and do not survive a rewrite.

mod comments;
mod emit;
mod error;
mod node;
mod parse;

pub use emit::{INDENT, emit, is_plain_safe};
pub use error::{YamlError, YamlResult};
pub use node::{Mapping, Node, Scalar, ScalarKind};
pub use parse::{parse_document, parse_node};
