//! Field groups shared by every record version.
//!
//! Versions differ mostly in *where* a group lives (top level or nested)
//! and what its keys are called, so each group is read and written once,
//! parameterized by a small layout value.

use tracing::{debug, warn};
use ypkg_types::{
    BuildFlags, BuildStages, Codec, Dependencies, Flag, FromNode, ListMultiValue, ShapeError,
    Source, Stage, ToNode, Tristate, one_or_many, one_or_many_node,
};
use ypkg_yaml::{Mapping, Node, Scalar};

use crate::error::SchemaError;

/// Reads keys out of one mapping and remembers which ones were consumed.
pub(crate) struct Fields<'a> {
    map: Option<&'a Mapping>,
    prefix: String,
    codec: &'a Codec,
    read: Vec<&'static str>,
}

impl<'a> Fields<'a> {
    /// `node` must be a mapping or null (an empty section).
    pub(crate) fn new(node: &'a Node, prefix: &str, codec: &'a Codec) -> Result<Self, SchemaError> {
        let map = match node {
            Node::Null => None,
            Node::Mapping(map) => Some(map),
            other => {
                return Err(SchemaError::Shape {
                    field: prefix.trim_end_matches('.').to_string(),
                    source: ShapeError::Unexpected {
                        expected: "mapping",
                        found: other.kind(),
                    },
                });
            }
        };
        Ok(Self {
            map,
            prefix: prefix.to_string(),
            codec,
            read: Vec::new(),
        })
    }

    fn field(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// The node under `key`; null values count as absent.
    pub(crate) fn node(&mut self, key: &'static str) -> Option<&'a Node> {
        self.read.push(key);
        self.map?.get(key).filter(|n| !n.is_null())
    }

    /// Mark `key` as known without reading it.
    pub(crate) fn skip(&mut self, key: &'static str) {
        self.read.push(key);
    }

    pub(crate) fn get<T: FromNode>(&mut self, key: &'static str) -> Result<Option<T>, SchemaError> {
        self.with(key, |node, codec| T::from_node(node, codec))
    }

    pub(crate) fn get_or_default<T: FromNode + Default>(
        &mut self,
        key: &'static str,
    ) -> Result<T, SchemaError> {
        Ok(self.get(key)?.unwrap_or_default())
    }

    pub(crate) fn with<T>(
        &mut self,
        key: &'static str,
        decode: impl FnOnce(&Node, &Codec) -> Result<T, ShapeError>,
    ) -> Result<Option<T>, SchemaError> {
        let codec = self.codec;
        match self.node(key) {
            None => Ok(None),
            Some(node) => decode(node, codec)
                .map(Some)
                .map_err(SchemaError::shape(self.field(key))),
        }
    }

    /// Nested section under `key`.
    pub(crate) fn section(&mut self, key: &'static str) -> Result<Fields<'a>, SchemaError> {
        let prefix = format!("{}{}.", self.prefix, key);
        let node = self.node(key).unwrap_or(&Node::Null);
        Fields::new(node, &prefix, self.codec)
    }

    /// Log keys nobody asked for.
    pub(crate) fn finish(self) {
        let Some(map) = self.map else { return };
        for key in map.keys().filter(|k| !self.read.iter().any(|r| r == k)) {
            debug!(field = %self.field(key), "ignoring unknown key");
        }
    }
}

/// Collects keys for one mapping in output order.
pub(crate) struct Writer<'a> {
    map: Mapping,
    prefix: String,
    codec: &'a Codec,
}

impl<'a> Writer<'a> {
    pub(crate) fn new(prefix: &str, codec: &'a Codec) -> Self {
        Self {
            map: Mapping::new(),
            prefix: prefix.to_string(),
            codec,
        }
    }

    pub(crate) fn codec(&self) -> &'a Codec {
        self.codec
    }

    pub(crate) fn put<T: ToNode + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), SchemaError> {
        let node = value
            .to_node(self.codec)
            .map_err(SchemaError::shape(format!("{}{}", self.prefix, key)))?;
        self.map.insert(key, node);
        Ok(())
    }

    pub(crate) fn put_opt<T: ToNode>(
        &mut self,
        key: &'static str,
        value: Option<&T>,
    ) -> Result<(), SchemaError> {
        match value {
            Some(value) => self.put(key, value),
            None => Ok(()),
        }
    }

    pub(crate) fn put_node(&mut self, key: &'static str, node: Node) {
        self.map.insert(key, node);
    }

    /// Skipped when empty.
    pub(crate) fn put_list(&mut self, key: &'static str, value: &ListMultiValue) -> Result<(), SchemaError> {
        if value.is_empty() {
            return Ok(());
        }
        self.put(key, value)
    }

    /// Skipped when empty.
    pub(crate) fn put_scalars(&mut self, key: &'static str, values: &[Scalar]) -> Result<(), SchemaError> {
        if values.is_empty() {
            return Ok(());
        }
        self.put(key, values)
    }

    pub(crate) fn section(&self, key: &str) -> Writer<'a> {
        Writer::new(&format!("{}{}.", self.prefix, key), self.codec)
    }

    /// Attach a finished section unless it is empty.
    pub(crate) fn put_section(&mut self, key: &'static str, section: Writer<'_>) {
        if !section.map.is_empty() {
            self.map.insert(key, Node::Mapping(section.map));
        }
    }

    pub(crate) fn finish(self) -> Node {
        Node::Mapping(self.map)
    }
}

/// Identity and provenance fields, stored alike in every version.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    pub name: Scalar,
    pub version: Scalar,
    pub release: u64,
    pub sources: Vec<Source>,
    pub homepage: Option<Scalar>,
    pub licenses: Vec<Scalar>,
}

impl Header {
    pub(crate) fn read(fields: &mut Fields<'_>) -> Result<Self, SchemaError> {
        Ok(Header {
            name: fields.get_or_default("name")?,
            version: fields.get_or_default("version")?,
            release: fields.get_or_default("release")?,
            sources: fields.get_or_default("source")?,
            homepage: fields.get("homepage")?.filter(|s: &Scalar| !s.is_empty()),
            licenses: fields.with("license", one_or_many)?.unwrap_or_default(),
        })
    }

    pub(crate) fn write(&self, out: &mut Writer<'_>) -> Result<(), SchemaError> {
        out.put("name", &self.name)?;
        out.put("version", &self.version)?;
        out.put("release", &self.release)?;
        if !self.sources.is_empty() {
            out.put("source", self.sources.as_slice())?;
        }
        out.put_opt("homepage", self.homepage.as_ref())?;
        if let Some(node) = one_or_many_node(&self.licenses, out.codec())
            .map_err(SchemaError::shape("license"))?
        {
            out.put_node("license", node);
        }
        Ok(())
    }
}

/// Where the dependency lists live and what their keys are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepsLayout {
    /// Enclosing section, or `None` for top-level keys.
    pub section: Option<&'static str>,
    pub replaces: &'static str,
    pub conflicts: &'static str,
    pub build: &'static str,
    /// `None` when the version cannot express check-time dependencies.
    pub check: Option<&'static str>,
    pub run: &'static str,
}

impl DepsLayout {
    pub(crate) fn read(&self, fields: &mut Fields<'_>) -> Result<Dependencies, SchemaError> {
        match self.section {
            Some(key) => {
                let mut nested = fields.section(key)?;
                let deps = self.read_flat(&mut nested)?;
                nested.finish();
                Ok(deps)
            }
            None => self.read_flat(fields),
        }
    }

    fn read_flat(&self, fields: &mut Fields<'_>) -> Result<Dependencies, SchemaError> {
        Ok(Dependencies {
            replaces: fields.get_or_default(self.replaces)?,
            conflicts: fields.get_or_default(self.conflicts)?,
            build: fields.get_or_default(self.build)?,
            check: match self.check {
                Some(key) => fields.get_or_default(key)?,
                None => Vec::new(),
            },
            run: fields.get_or_default(self.run)?,
        })
    }

    /// Fit `deps` into this layout.
    ///
    /// Without a check key, check-time dependencies are appended to the
    /// build-time list. The distinction is lost.
    pub fn project(&self, deps: &Dependencies) -> Dependencies {
        let mut out = deps.clone();
        if self.check.is_none() && !out.check.is_empty() {
            warn!(
                build = out.build.len(),
                check = out.check.len(),
                key = self.build,
                "merging check dependencies into build dependencies"
            );
            let check = std::mem::take(&mut out.check);
            out.build.extend(check);
        }
        out
    }

    pub(crate) fn write(&self, deps: &Dependencies, out: &mut Writer<'_>) -> Result<(), SchemaError> {
        match self.section {
            Some(key) => {
                let mut nested = out.section(key);
                self.write_flat(deps, &mut nested)?;
                out.put_section(key, nested);
                Ok(())
            }
            None => self.write_flat(deps, out),
        }
    }

    fn write_flat(&self, deps: &Dependencies, out: &mut Writer<'_>) -> Result<(), SchemaError> {
        out.put_list(self.replaces, &deps.replaces)?;
        out.put_list(self.conflicts, &deps.conflicts)?;
        out.put_scalars(self.build, &deps.build)?;
        if let Some(key) = self.check {
            out.put_scalars(key, &deps.check)?;
        }
        out.put_list(self.run, &deps.run)
    }
}

/// Where flags are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagPlacement {
    /// Directly among the top-level keys.
    Inline,
    /// Inside a named section.
    Nested(&'static str),
}

impl FlagPlacement {
    pub(crate) fn read(&self, fields: &mut Fields<'_>) -> Result<BuildFlags, SchemaError> {
        match self {
            FlagPlacement::Inline => read_flags(fields),
            FlagPlacement::Nested(key) => {
                let mut nested = fields.section(key)?;
                let flags = read_flags(&mut nested)?;
                nested.finish();
                Ok(flags)
            }
        }
    }

    pub(crate) fn write(&self, flags: &BuildFlags, out: &mut Writer<'_>) -> Result<(), SchemaError> {
        match self {
            FlagPlacement::Inline => write_flags(flags, out),
            FlagPlacement::Nested(key) => {
                let mut nested = out.section(key);
                write_flags(flags, &mut nested)?;
                out.put_section(key, nested);
                Ok(())
            }
        }
    }
}

fn read_flags(fields: &mut Fields<'_>) -> Result<BuildFlags, SchemaError> {
    let mut flags = BuildFlags::default();
    for flag in Flag::ALL {
        let read = fields.with(flag.key(), |node, codec| {
            let value: Tristate = codec.decode(node)?;
            Ok((value, node.as_scalar().cloned()))
        })?;
        match read {
            Some((value, Some(written))) => flags.set_written(flag, value, &written),
            Some((value, None)) => flags.set(flag, value),
            None => {}
        }
    }
    flags.optimize = fields.with("optimize", one_or_many)?.unwrap_or_default();
    Ok(flags)
}

fn write_flags(flags: &BuildFlags, out: &mut Writer<'_>) -> Result<(), SchemaError> {
    for flag in Flag::ALL {
        if let Some(node) = flags.to_node(flag) {
            out.put_node(flag.key(), node);
        }
    }
    out.put_scalars("optimize", &flags.optimize)
}

/// Build environment and stage scripts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Recipe {
    pub environment: Option<Scalar>,
    pub stages: BuildStages,
}

impl Recipe {
    pub(crate) fn read(fields: &mut Fields<'_>) -> Result<Self, SchemaError> {
        let environment = fields.get("environment")?;
        let mut stages = BuildStages::default();
        for stage in Stage::ALL {
            stages.set(stage, fields.get(stage.key())?);
        }
        Ok(Recipe {
            environment,
            stages,
        })
    }

    pub(crate) fn write(&self, out: &mut Writer<'_>) -> Result<(), SchemaError> {
        out.put_opt("environment", self.environment.as_ref())?;
        for (stage, script) in self.stages.iter() {
            out.put(stage.key(), script)?;
        }
        Ok(())
    }
}

/// File ownership rules.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Files {
    pub permanent: ListMultiValue,
    pub patterns: ListMultiValue,
}

impl Files {
    pub(crate) fn read(fields: &mut Fields<'_>) -> Result<Self, SchemaError> {
        Ok(Files {
            permanent: fields.get_or_default("permanent")?,
            patterns: fields.get_or_default("patterns")?,
        })
    }

    pub(crate) fn write(&self, out: &mut Writer<'_>) -> Result<(), SchemaError> {
        out.put_list("permanent", &self.permanent)?;
        out.put_list("patterns", &self.patterns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ypkg_yaml::{emit, parse_document};

    const V2: DepsLayout = DepsLayout {
        section: None,
        replaces: "replaces",
        conflicts: "conflicts",
        build: "builddeps",
        check: None,
        run: "rundeps",
    };

    const V3: DepsLayout = DepsLayout {
        section: Some("deps"),
        replaces: "replaces",
        conflicts: "conflicts",
        build: "build",
        check: Some("check"),
        run: "run",
    };

    fn deps() -> Dependencies {
        Dependencies {
            build: vec![Scalar::new("gcc")],
            check: vec![Scalar::new("python-pytest")],
            run: ListMultiValue::from_default(["glibc"]),
            ..Dependencies::default()
        }
    }

    #[test]
    fn projection_merges_check_only_without_a_check_key() {
        let merged = V2.project(&deps());
        assert_eq!(merged.build, vec![Scalar::new("gcc"), Scalar::new("python-pytest")]);
        assert!(merged.check.is_empty());

        assert_eq!(V3.project(&deps()), deps());
    }

    #[test]
    fn nested_layout_writes_a_section() {
        let codec = Codec::default();
        let mut out = Writer::new("", &codec);
        V3.write(&deps(), &mut out).unwrap();
        assert_eq!(
            emit(&out.finish()),
            "deps:\n    build:\n        - gcc\n    check:\n        - python-pytest\n    run:\n        - glibc\n"
        );
    }

    #[test]
    fn empty_section_is_not_written() {
        let codec = Codec::default();
        let mut out = Writer::new("", &codec);
        V3.write(&Dependencies::default(), &mut out).unwrap();
        FlagPlacement::Nested("flags")
            .write(&BuildFlags::default(), &mut out)
            .unwrap();
        assert_eq!(emit(&out.finish()), "{}\n");
    }

    #[test]
    fn flag_errors_name_the_nested_field() {
        let codec = Codec::default();
        let doc = parse_document("flags:\n    strip: maybe\n").unwrap();
        let mut fields = Fields::new(&doc, "", &codec).unwrap();
        let err = FlagPlacement::Nested("flags").read(&mut fields).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid `flags.strip`: invalid boolean `maybe`, expected yes or no"
        );
    }

    #[test]
    fn inline_flags_keep_unspecified() {
        let codec = Codec::default();
        let doc = parse_document("name: x\nnetworking: yes\nstrip: no\noptimize: speed\n").unwrap();
        let mut fields = Fields::new(&doc, "", &codec).unwrap();
        let flags = FlagPlacement::Inline.read(&mut fields).unwrap();
        assert_eq!(flags.get(Flag::Networking), Tristate::True);
        assert_eq!(flags.get(Flag::Strip), Tristate::False);
        assert_eq!(flags.get(Flag::Clang), Tristate::Unspecified);
        assert_eq!(flags.optimize, vec![Scalar::new("speed")]);

        let mut out = Writer::new("", &codec);
        FlagPlacement::Inline.write(&flags, &mut out).unwrap();
        assert_eq!(
            emit(&out.finish()),
            "networking: yes\nstrip: no\noptimize:\n    - speed\n"
        );
    }

    #[test]
    fn flag_spelling_and_comments_survive() {
        let codec = Codec::default();
        let text = "clang: false # gcc only\nstrip: On\n";
        let doc = parse_document(text).unwrap();
        let mut fields = Fields::new(&doc, "", &codec).unwrap();
        let flags = FlagPlacement::Inline.read(&mut fields).unwrap();
        assert_eq!(flags.get(Flag::Clang), Tristate::False);

        let mut out = Writer::new("", &codec);
        FlagPlacement::Inline.write(&flags, &mut out).unwrap();
        assert_eq!(emit(&out.finish()), text);
    }

    #[test]
    fn section_must_be_a_mapping() {
        let codec = Codec::default();
        let doc = parse_document("deps: [gcc]\n").unwrap();
        let mut fields = Fields::new(&doc, "", &codec).unwrap();
        assert!(matches!(
            V3.read(&mut fields),
            Err(SchemaError::Shape { ref field, .. }) if field == "deps"
        ));
    }

    #[test]
    fn header_writes_required_fields_even_when_empty() {
        let codec = Codec::default();
        let mut out = Writer::new("", &codec);
        Header::default().write(&mut out).unwrap();
        assert_eq!(emit(&out.finish()), "name: \"\"\nversion: \"\"\nrelease: 0\n");
    }
}
