//! Canonical package model and the node codecs shared by every format version.
//!
//! - [`MultiValue`] and [`ListMultiValue`]: the flexible per-subpackage
//!   collections, decoded through the closed [`Shape`] classification.
//! - [`PackageSpec`]: the version-independent model records convert into.
//! - [`BuildFlags`] / [`Tristate`]: flags that distinguish "unset" from "no".
//!
//! Codecs are parameterized by a [`Codec`] value rather than global state.

pub mod codec;
pub mod error;
pub mod flags;
pub mod multi;
pub mod package;
pub mod variant;
pub mod version;

pub use codec::{Codec, FromNode, Shape, ToNode, one_or_many, one_or_many_node};
pub use error::ShapeError;
pub use flags::{BuildFlags, Flag, Tristate};
pub use multi::{ListMultiValue, MultiValue};
pub use package::{BuildStages, Dependencies, PackageSpec, Source, SplitValue, Stage};
pub use variant::Variant;
pub use version::{FormatVersion, UnsupportedVersion};

pub use ypkg_yaml::{Node, Scalar};
