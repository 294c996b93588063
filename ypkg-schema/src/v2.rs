//! Version 2: no marker, everything at the top level.
//!
//! ```yaml
//! name: nano
//! version: 5.4
//! release: 4
//! component: system.utils
//! builddeps:
//!     - pkgconfig(ncursesw)
//! networking: yes
//! ```

use tracing::debug;
use ypkg_types::{BuildFlags, Codec, Dependencies, FormatVersion, MultiValue, PackageSpec, SplitValue};
use ypkg_yaml::Node;

use crate::error::SchemaError;
use crate::record::VersionedRecord;
use crate::sections::{DepsLayout, Fields, FlagPlacement, Files, Header, Recipe, Writer};

pub const DEPS: DepsLayout = DepsLayout {
    section: None,
    replaces: "replaces",
    conflicts: "conflicts",
    build: "builddeps",
    check: None,
    run: "rundeps",
};

pub const FLAGS: FlagPlacement = FlagPlacement::Inline;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageYml {
    codec: Codec,
    pub header: Header,
    pub component: MultiValue,
    pub summary: MultiValue,
    pub description: MultiValue,
    pub deps: Dependencies,
    pub flags: BuildFlags,
    pub recipe: Recipe,
    pub files: Files,
}

impl PackageYml {
    pub fn new(codec: Codec) -> Self {
        Self {
            codec,
            header: Header::default(),
            component: MultiValue::new(),
            summary: MultiValue::new(),
            description: MultiValue::new(),
            deps: Dependencies::default(),
            flags: BuildFlags::default(),
            recipe: Recipe::default(),
            files: Files::default(),
        }
    }
}

impl VersionedRecord for PackageYml {
    fn version(&self) -> FormatVersion {
        FormatVersion::V2
    }

    fn decode(&mut self, doc: &Node) -> Result<(), SchemaError> {
        let mut fields = Fields::new(doc, "", &self.codec)?;
        let header = Header::read(&mut fields)?;
        let component = fields.get_or_default("component")?;
        let summary = fields.get_or_default("summary")?;
        let description = fields.get_or_default("description")?;
        let deps = DEPS.read(&mut fields)?;
        let flags = FLAGS.read(&mut fields)?;
        let recipe = Recipe::read(&mut fields)?;
        let files = Files::read(&mut fields)?;
        fields.finish();

        self.header = header;
        self.component = component;
        self.summary = summary;
        self.description = description;
        self.deps = deps;
        self.flags = flags;
        self.recipe = recipe;
        self.files = files;
        debug!(name = %self.header.name, "decoded version 2 record");
        Ok(())
    }

    fn encode(&self) -> Result<Node, SchemaError> {
        let mut out = Writer::new("", &self.codec);
        self.header.write(&mut out)?;
        for (key, value) in [
            ("component", &self.component),
            ("summary", &self.summary),
            ("description", &self.description),
        ] {
            if !value.is_empty() {
                out.put(key, value)?;
            }
        }
        DEPS.write(&self.deps, &mut out)?;
        FLAGS.write(&self.flags, &mut out)?;
        self.recipe.write(&mut out)?;
        self.files.write(&mut out)?;
        Ok(out.finish())
    }

    fn convert(&self) -> Result<PackageSpec, SchemaError> {
        Ok(PackageSpec {
            format: FormatVersion::V2,
            name: self.header.name.clone(),
            version: self.header.version.clone(),
            release: self.header.release,
            sources: self.header.sources.clone(),
            homepage: self.header.homepage.clone(),
            licenses: self.header.licenses.clone(),
            component: SplitValue::from_multi(self.component.clone()),
            summary: SplitValue::from_multi(self.summary.clone()),
            description: SplitValue::from_multi(self.description.clone()),
            dependencies: self.deps.clone(),
            flags: self.flags.clone(),
            environment: self.recipe.environment.clone(),
            stages: self.recipe.stages.clone(),
            permanent: self.files.permanent.clone(),
            patterns: self.files.patterns.clone(),
        })
    }

    fn modify(&mut self, spec: &PackageSpec) {
        let multi = |field: &Option<SplitValue>| {
            field.as_ref().map(SplitValue::to_multi).unwrap_or_default()
        };
        self.header = Header {
            name: spec.name.clone(),
            version: spec.version.clone(),
            release: spec.release,
            sources: spec.sources.clone(),
            homepage: spec.homepage.clone(),
            licenses: spec.licenses.clone(),
        };
        self.component = multi(&spec.component);
        self.summary = multi(&spec.summary);
        self.description = multi(&spec.description);
        self.deps = DEPS.project(&spec.dependencies);
        self.flags = spec.flags.clone();
        self.recipe = Recipe {
            environment: spec.environment.clone(),
            stages: spec.stages.clone(),
        };
        self.files = Files {
            permanent: spec.permanent.clone(),
            patterns: spec.patterns.clone(),
        };
    }
}
