//! The version-independent package model.

use std::collections::BTreeMap;

use ypkg_yaml::{Node, Scalar};

use crate::codec::{Codec, FromNode, ToNode};
use crate::error::ShapeError;
use crate::flags::BuildFlags;
use crate::multi::{ListMultiValue, MultiValue};
use crate::version::FormatVersion;

/// An upstream source: `- <uri> : <hash or git ref>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub uri: String,
    pub hash: Scalar,
}

impl Source {
    pub fn new(uri: impl Into<String>, hash: impl Into<Scalar>) -> Self {
        Self {
            uri: uri.into(),
            hash: hash.into(),
        }
    }
}

impl FromNode for Source {
    fn from_node(node: &Node, _codec: &Codec) -> Result<Self, ShapeError> {
        match node {
            Node::Mapping(map) if map.len() == 1 => match map.iter().next() {
                Some((uri, Node::Scalar(hash))) if !uri.is_empty() => Ok(Source::new(uri, hash.clone())),
                Some((_, Node::Scalar(_))) => Err(ShapeError::Empty { what: "source uri" }),
                Some((_, other)) => Err(ShapeError::unexpected("scalar", other)),
                None => Err(ShapeError::Empty { what: "source" }),
            },
            Node::Mapping(map) => Err(ShapeError::NotAPair {
                index: 0,
                found: format!("a mapping with {} keys", map.len()),
            }),
            other => Err(ShapeError::unexpected("`uri: hash` pair", other)),
        }
    }
}

impl ToNode for Source {
    fn to_node(&self, _codec: &Codec) -> Result<Node, ShapeError> {
        if self.uri.is_empty() {
            return Err(ShapeError::Empty { what: "source uri" });
        }
        Ok(Node::pair(&self.uri, Node::Scalar(self.hash.clone())))
    }
}

/// A field that is either one plain value or a per-subpackage map.
///
/// `Variants` always holds at least one named variant; a default-only map is
/// represented as `Plain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitValue {
    Plain(Scalar),
    Variants(MultiValue),
}

impl SplitValue {
    /// Collapse a map into the narrowest representation; `None` when empty.
    pub fn from_multi(mv: MultiValue) -> Option<Self> {
        if mv.is_empty() {
            return None;
        }
        Some(match mv.into_single() {
            Ok(plain) => SplitValue::Plain(plain),
            Err(mv) => SplitValue::Variants(mv),
        })
    }

    pub fn to_multi(&self) -> MultiValue {
        match self {
            SplitValue::Plain(s) => MultiValue::single(s.clone()),
            SplitValue::Variants(mv) => mv.clone(),
        }
    }

    /// The main package's value.
    pub fn default_value(&self) -> Option<&Scalar> {
        match self {
            SplitValue::Plain(s) => Some(s),
            SplitValue::Variants(mv) => mv.default_value(),
        }
    }
}

/// Dependency lists. `check` has no home in version 2 documents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dependencies {
    pub replaces: ListMultiValue,
    pub conflicts: ListMultiValue,
    pub build: Vec<Scalar>,
    pub check: Vec<Scalar>,
    pub run: ListMultiValue,
}

impl Dependencies {
    pub fn is_empty(&self) -> bool {
        self.replaces.is_empty()
            && self.conflicts.is_empty()
            && self.build.is_empty()
            && self.check.is_empty()
            && self.run.is_empty()
    }
}

/// A build phase script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Setup,
    Build,
    Profile,
    Check,
    Install,
}

impl Stage {
    /// Execution order, which is also the order they are written in.
    pub const ALL: [Stage; 5] = [
        Stage::Setup,
        Stage::Build,
        Stage::Profile,
        Stage::Check,
        Stage::Install,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Stage::Setup => "setup",
            Stage::Build => "build",
            Stage::Profile => "profile",
            Stage::Check => "check",
            Stage::Install => "install",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildStages {
    scripts: BTreeMap<Stage, Scalar>,
}

impl BuildStages {
    pub fn get(&self, stage: Stage) -> Option<&Scalar> {
        self.scripts.get(&stage)
    }

    pub fn set(&mut self, stage: Stage, script: Option<Scalar>) {
        match script {
            Some(script) => {
                self.scripts.insert(stage, script);
            }
            None => {
                self.scripts.remove(&stage);
            }
        }
    }

    /// Present scripts in execution order.
    pub fn iter(&self) -> impl Iterator<Item = (Stage, &Scalar)> {
        self.scripts.iter().map(|(stage, s)| (*stage, s))
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

/// Every field of a package recipe, independent of on-disk version.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackageSpec {
    /// Version of the document this was read from.
    pub format: FormatVersion,
    pub name: Scalar,
    pub version: Scalar,
    pub release: u64,
    pub sources: Vec<Source>,
    pub homepage: Option<Scalar>,
    pub licenses: Vec<Scalar>,
    pub component: Option<SplitValue>,
    pub summary: Option<SplitValue>,
    pub description: Option<SplitValue>,
    pub dependencies: Dependencies,
    pub flags: BuildFlags,
    pub environment: Option<Scalar>,
    pub stages: BuildStages,
    pub permanent: ListMultiValue,
    pub patterns: ListMultiValue,
}

impl PackageSpec {
    /// Placeholder recipe written by `init`.
    pub fn template() -> Self {
        let mut stages = BuildStages::default();
        stages.set(
            Stage::Install,
            Some(Scalar::new("# do some things\n# and stuff\n")),
        );
        PackageSpec {
            format: FormatVersion::default(),
            name: Scalar::new("Name-Of-Package"),
            version: Scalar::new("1.0.0a"),
            release: 1,
            sources: vec![Source::new("URI", "HASH")],
            licenses: vec![Scalar::new("GPL-2.0-or-later").with_comment("# CHECK AND/OR CHANGE ME")],
            component: Some(SplitValue::Plain(Scalar::new("# SET ME"))),
            summary: Some(SplitValue::Plain(Scalar::new(
                "# Short description of the package",
            ))),
            description: Some(SplitValue::Plain(Scalar::new(
                "# Long description of the package\n# Can be multiple lines\n# Just no 80/100 column wrapping!\n",
            ))),
            stages,
            ..PackageSpec::default()
        }
    }

    /// Increment the release counter.
    pub fn bump(&mut self) -> u64 {
        self.release += 1;
        self.release
    }
}
