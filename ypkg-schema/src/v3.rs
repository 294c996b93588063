//! Version 3: `YPKG: 3` marker, nested `deps:` and `flags:` sections, and
//! separate keys for plain and per-subpackage descriptive fields.
//!
//! ```yaml
//! YPKG: 3
//! name: nano
//! component: system.utils
//! deps:
//!     build:
//!         - pkgconfig(ncursesw)
//! flags:
//!     networking: yes
//! ```

use tracing::debug;
use ypkg_types::{
    BuildFlags, Codec, Dependencies, FormatVersion, MultiValue, PackageSpec, Scalar, SplitValue,
};
use ypkg_yaml::Node;

use crate::detect::MARKER;
use crate::error::SchemaError;
use crate::record::VersionedRecord;
use crate::sections::{DepsLayout, Fields, FlagPlacement, Files, Header, Recipe, Writer};

pub const DEPS: DepsLayout = DepsLayout {
    section: Some("deps"),
    replaces: "replaces",
    conflicts: "conflicts",
    build: "build",
    check: Some("check"),
    run: "run",
};

pub const FLAGS: FlagPlacement = FlagPlacement::Nested("flags");

/// A descriptive field stored under two keys: one for a plain value and one
/// for a per-subpackage map. At most one may be set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Split {
    pub plain: Option<Scalar>,
    pub variants: MultiValue,
}

#[derive(Debug, Clone, Copy)]
struct SplitKeys {
    plain: &'static str,
    variants: &'static str,
}

const COMPONENT: SplitKeys = SplitKeys {
    plain: "component",
    variants: "components",
};
const SUMMARY: SplitKeys = SplitKeys {
    plain: "summary",
    variants: "summaries",
};
const DESCRIPTION: SplitKeys = SplitKeys {
    plain: "description",
    variants: "descriptions",
};

impl SplitKeys {
    fn read(self, fields: &mut Fields<'_>) -> Result<Split, SchemaError> {
        Ok(Split {
            plain: fields
                .get(self.plain)?
                .filter(|s: &Scalar| !s.is_empty()),
            variants: fields.get_or_default(self.variants)?,
        })
    }

    fn write(self, split: &Split, out: &mut Writer<'_>) -> Result<(), SchemaError> {
        out.put_opt(self.plain, split.plain.as_ref())?;
        if !split.variants.is_empty() {
            out.put(self.variants, &split.variants)?;
        }
        Ok(())
    }

    fn convert(self, split: &Split) -> Result<Option<SplitValue>, SchemaError> {
        match &split.plain {
            Some(_) if !split.variants.is_empty() => Err(SchemaError::Conflict {
                field: self.plain,
                alternate: self.variants,
            }),
            Some(plain) => Ok(Some(SplitValue::Plain(plain.clone()))),
            None => Ok(SplitValue::from_multi(split.variants.clone())),
        }
    }
}

impl Split {
    fn from_canonical(value: &Option<SplitValue>) -> Self {
        match value {
            Some(SplitValue::Plain(s)) => Split {
                plain: Some(s.clone()),
                variants: MultiValue::new(),
            },
            Some(SplitValue::Variants(mv)) => Split {
                plain: None,
                variants: mv.clone(),
            },
            None => Split::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageYml {
    codec: Codec,
    pub header: Header,
    pub component: Split,
    pub summary: Split,
    pub description: Split,
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
            component: Split::default(),
            summary: Split::default(),
            description: Split::default(),
            deps: Dependencies::default(),
            flags: BuildFlags::default(),
            recipe: Recipe::default(),
            files: Files::default(),
        }
    }
}

impl VersionedRecord for PackageYml {
    fn version(&self) -> FormatVersion {
        FormatVersion::V3
    }

    fn decode(&mut self, doc: &Node) -> Result<(), SchemaError> {
        let mut fields = Fields::new(doc, "", &self.codec)?;
        // Already checked by detection.
        fields.skip(MARKER);
        let header = Header::read(&mut fields)?;
        let component = COMPONENT.read(&mut fields)?;
        let summary = SUMMARY.read(&mut fields)?;
        let description = DESCRIPTION.read(&mut fields)?;
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
        debug!(name = %self.header.name, "decoded version 3 record");
        Ok(())
    }

    fn encode(&self) -> Result<Node, SchemaError> {
        let mut out = Writer::new("", &self.codec);
        out.put(MARKER, &u64::from(FormatVersion::V3.number()))?;
        self.header.write(&mut out)?;
        COMPONENT.write(&self.component, &mut out)?;
        SUMMARY.write(&self.summary, &mut out)?;
        DESCRIPTION.write(&self.description, &mut out)?;
        DEPS.write(&self.deps, &mut out)?;
        FLAGS.write(&self.flags, &mut out)?;
        self.recipe.write(&mut out)?;
        self.files.write(&mut out)?;
        Ok(out.finish())
    }

    fn convert(&self) -> Result<PackageSpec, SchemaError> {
        Ok(PackageSpec {
            format: FormatVersion::V3,
            name: self.header.name.clone(),
            version: self.header.version.clone(),
            release: self.header.release,
            sources: self.header.sources.clone(),
            homepage: self.header.homepage.clone(),
            licenses: self.header.licenses.clone(),
            component: COMPONENT.convert(&self.component)?,
            summary: SUMMARY.convert(&self.summary)?,
            description: DESCRIPTION.convert(&self.description)?,
            dependencies: self.deps.clone(),
            flags: self.flags.clone(),
            environment: self.recipe.environment.clone(),
            stages: self.recipe.stages.clone(),
            permanent: self.files.permanent.clone(),
            patterns: self.files.patterns.clone(),
        })
    }

    fn modify(&mut self, spec: &PackageSpec) {
        self.header = Header {
            name: spec.name.clone(),
            version: spec.version.clone(),
            release: spec.release,
            sources: spec.sources.clone(),
            homepage: spec.homepage.clone(),
            licenses: spec.licenses.clone(),
        };
        self.component = Split::from_canonical(&spec.component);
        self.summary = Split::from_canonical(&spec.summary);
        self.description = Split::from_canonical(&spec.description);
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
