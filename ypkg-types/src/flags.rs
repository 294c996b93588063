//! Build flags.

use std::collections::BTreeMap;
use std::fmt;

use ypkg_yaml::{Node, Scalar};

use crate::codec::{Codec, FromNode};
use crate::error::ShapeError;

/// A boolean that remembers whether it was written at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Tristate {
    #[default]
    Unspecified,
    True,
    False,
}

impl Tristate {
    pub fn is_specified(self) -> bool {
        self != Tristate::Unspecified
    }

    pub fn value(self) -> Option<bool> {
        match self {
            Tristate::Unspecified => None,
            Tristate::True => Some(true),
            Tristate::False => Some(false),
        }
    }

    /// The explicit value, or `default` when unspecified.
    pub fn resolve(self, default: bool) -> bool {
        self.value().unwrap_or(default)
    }

    /// `yes` / `no`; `None` for unspecified, which is never written.
    pub fn to_node(self) -> Option<Node> {
        self.value()
            .map(|b| Node::scalar(if b { "yes" } else { "no" }))
    }
}

impl From<bool> for Tristate {
    fn from(value: bool) -> Self {
        if value { Tristate::True } else { Tristate::False }
    }
}

impl From<Option<bool>> for Tristate {
    fn from(value: Option<bool>) -> Self {
        value.map(Tristate::from).unwrap_or_default()
    }
}

/// A missing or null node reads as unspecified.
impl FromNode for Tristate {
    fn from_node(node: &Node, _codec: &Codec) -> Result<Self, ShapeError> {
        let scalar = match node {
            Node::Null => return Ok(Tristate::Unspecified),
            Node::Scalar(s) => s,
            other => return Err(ShapeError::unexpected("boolean", other)),
        };
        match scalar.value.to_ascii_lowercase().as_str() {
            "yes" | "true" | "on" => Ok(Tristate::True),
            "no" | "false" | "off" => Ok(Tristate::False),
            _ => Err(ShapeError::InvalidBool {
                value: scalar.value.clone(),
            }),
        }
    }
}

/// Every flag a recipe may set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Flag {
    AutoDep,
    Avx2,
    Clang,
    CCache,
    Debug,
    Devel,
    Emul32,
    Extract,
    LaStrip,
    LibSplit,
    Networking,
    Strip,
}

impl Flag {
    pub const ALL: [Flag; 12] = [
        Flag::AutoDep,
        Flag::Avx2,
        Flag::Clang,
        Flag::CCache,
        Flag::Debug,
        Flag::Devel,
        Flag::Emul32,
        Flag::Extract,
        Flag::LaStrip,
        Flag::LibSplit,
        Flag::Networking,
        Flag::Strip,
    ];

    /// Document key.
    pub fn key(self) -> &'static str {
        match self {
            Flag::AutoDep => "autodep",
            Flag::Avx2 => "avx2",
            Flag::Clang => "clang",
            Flag::CCache => "ccache",
            Flag::Debug => "debug",
            Flag::Devel => "devel",
            Flag::Emul32 => "emul32",
            Flag::Extract => "extract",
            Flag::LaStrip => "lastrip",
            Flag::LibSplit => "libsplit",
            Flag::Networking => "networking",
            Flag::Strip => "strip",
        }
    }

    pub fn from_key(key: &str) -> Option<Flag> {
        Flag::ALL.into_iter().find(|f| f.key() == key)
    }

    /// Value the build tooling assumes when the recipe is silent.
    pub fn default_value(self) -> bool {
        matches!(
            self,
            Flag::AutoDep
                | Flag::Clang
                | Flag::Debug
                | Flag::Extract
                | Flag::LaStrip
                | Flag::LibSplit
                | Flag::Strip
        )
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// An explicit flag value and, when it came from a document, the scalar it
/// was written as.
#[derive(Debug, Clone, Eq)]
struct FlagEntry {
    value: bool,
    written: Option<Scalar>,
}

/// Spelling is presentation; only the value takes part in equality.
impl PartialEq for FlagEntry {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// Flag settings plus the `optimize` list.
///
/// Only flags that were written down are stored; everything else is
/// [`Tristate::Unspecified`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildFlags {
    values: BTreeMap<Flag, FlagEntry>,
    pub optimize: Vec<Scalar>,
}

impl BuildFlags {
    pub fn get(&self, flag: Flag) -> Tristate {
        self.values.get(&flag).map(|e| e.value).into()
    }

    /// Set or clear a flag. A document spelling survives only while the
    /// value stays the same.
    pub fn set(&mut self, flag: Flag, value: Tristate) {
        match value.value() {
            Some(b) if self.values.get(&flag).is_some_and(|e| e.value == b) => {}
            Some(b) => {
                self.values.insert(
                    flag,
                    FlagEntry {
                        value: b,
                        written: None,
                    },
                );
            }
            None => {
                self.values.remove(&flag);
            }
        }
    }

    /// Record a flag read from a document, remembering how it was spelled.
    pub fn set_written(&mut self, flag: Flag, value: Tristate, written: &Scalar) {
        match value.value() {
            Some(b) => {
                self.values.insert(
                    flag,
                    FlagEntry {
                        value: b,
                        written: Some(written.clone()),
                    },
                );
            }
            None => {
                self.values.remove(&flag);
            }
        }
    }

    /// Node to write for `flag`: the original scalar when there is one,
    /// otherwise `yes` / `no`. `None` when unspecified.
    pub fn to_node(&self, flag: Flag) -> Option<Node> {
        let entry = self.values.get(&flag)?;
        match &entry.written {
            Some(scalar) => Some(Node::Scalar(scalar.clone())),
            None => Tristate::from(entry.value).to_node(),
        }
    }

    /// The value the build would use.
    pub fn effective(&self, flag: Flag) -> bool {
        self.get(flag).resolve(flag.default_value())
    }

    /// Explicitly set flags in key order.
    pub fn specified(&self) -> impl Iterator<Item = (Flag, bool)> + '_ {
        self.values.iter().map(|(f, e)| (*f, e.value))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.optimize.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ypkg_yaml::parse_node;

    #[test]
    fn decode_accepts_common_spellings() {
        let codec = Codec::default();
        for (text, want) in [
            ("yes", Tristate::True),
            ("No", Tristate::False),
            ("true", Tristate::True),
            ("FALSE", Tristate::False),
            ("on", Tristate::True),
            ("off", Tristate::False),
        ] {
            let node = parse_node(text).unwrap();
            assert_eq!(codec.decode::<Tristate>(&node), Ok(want), "input: {text}");
        }
    }

    #[test]
    fn decode_rejects_other_values() {
        let codec = Codec::default();
        let node = parse_node("maybe").unwrap();
        assert_eq!(
            codec.decode::<Tristate>(&node),
            Err(ShapeError::InvalidBool {
                value: "maybe".into()
            })
        );
    }

    #[test]
    fn unspecified_is_never_written() {
        assert_eq!(Tristate::Unspecified.to_node(), None);
        assert_eq!(Tristate::False.to_node(), Some(Node::scalar("no")));
        assert_eq!(
            Codec::default().decode::<Tristate>(&Node::Null),
            Ok(Tristate::Unspecified)
        );
    }

    #[test]
    fn effective_falls_back_to_defaults() {
        let mut flags = BuildFlags::default();
        assert!(flags.effective(Flag::Strip));
        assert!(!flags.effective(Flag::Networking));
        assert_eq!(flags.get(Flag::Strip), Tristate::Unspecified);

        flags.set(Flag::Strip, Tristate::False);
        assert!(!flags.effective(Flag::Strip));
        assert_eq!(flags.specified().collect::<Vec<_>>(), vec![(Flag::Strip, false)]);

        flags.set(Flag::Strip, Tristate::Unspecified);
        assert!(flags.is_empty());
    }

    #[test]
    fn written_spelling_is_kept_until_the_value_changes() {
        let mut flags = BuildFlags::default();
        flags.set_written(Flag::Strip, Tristate::True, &Scalar::raw("true").with_comment("# keep"));
        assert_eq!(
            flags.to_node(Flag::Strip),
            Some(Node::Scalar(Scalar::raw("true").with_comment("# keep")))
        );

        flags.set(Flag::Strip, Tristate::True);
        assert_eq!(flags.to_node(Flag::Strip), Some(Node::Scalar(Scalar::raw("true").with_comment("# keep"))));

        flags.set(Flag::Strip, Tristate::False);
        assert_eq!(flags.to_node(Flag::Strip), Some(Node::scalar("no")));
        assert_eq!(flags.to_node(Flag::Clang), None);
    }

    #[test]
    fn spelling_does_not_affect_equality() {
        let mut written = BuildFlags::default();
        written.set_written(Flag::Debug, Tristate::False, &Scalar::raw("false"));
        let mut plain = BuildFlags::default();
        plain.set(Flag::Debug, Tristate::False);
        assert_eq!(written, plain);
    }

    #[test]
    fn keys_round_trip() {
        for flag in Flag::ALL {
            assert_eq!(Flag::from_key(flag.key()), Some(flag));
        }
        assert_eq!(Flag::from_key("optimize"), None);
    }
}
