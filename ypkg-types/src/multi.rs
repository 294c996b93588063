//! Per-subpackage collections.

use std::collections::BTreeMap;

use ypkg_yaml::{Node, Scalar};

use crate::codec::{Codec, FromNode, Shape, ToNode};
use crate::error::ShapeError;
use crate::variant::Variant;

/// One scalar per variant.
///
/// Written either as a bare scalar (default only) or as a sequence whose
/// first element is the default value and whose remaining elements are
/// `name: value` pairs:
///
/// ```yaml
/// component:
///     - system.devel
///     - devel: programming.devel
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MultiValue {
    entries: BTreeMap<Variant, Scalar>,
}

impl MultiValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A default-only value.
    pub fn single(value: impl Into<Scalar>) -> Self {
        let mut mv = Self::new();
        mv.insert(Variant::Default, value);
        mv
    }

    /// Set the value for `variant`, returning the previous one.
    pub fn insert(&mut self, variant: Variant, value: impl Into<Scalar>) -> Option<Scalar> {
        self.entries.insert(variant, value.into())
    }

    pub fn get(&self, variant: &Variant) -> Option<&Scalar> {
        self.entries.get(variant)
    }

    pub fn default_value(&self) -> Option<&Scalar> {
        self.entries.get(&Variant::Default)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when the only entry is the default one.
    pub fn is_default_only(&self) -> bool {
        self.len() == 1 && self.default_value().is_some()
    }

    /// Entries in output order: default first, then named ascending.
    pub fn iter(&self) -> impl Iterator<Item = (&Variant, &Scalar)> {
        self.entries.iter()
    }

    /// The default value, if this is default-only.
    pub fn into_single(mut self) -> Result<Scalar, Self> {
        if self.is_default_only() {
            if let Some(value) = self.entries.remove(&Variant::Default) {
                return Ok(value);
            }
        }
        Err(self)
    }
}

impl FromNode for MultiValue {
    fn from_node(node: &Node, codec: &Codec) -> Result<Self, ShapeError> {
        match Shape::keyed_scalars(node, codec)? {
            Shape::Scalar(value) => Ok(MultiValue::single(value.clone())),
            Shape::KeyedScalars { default, keyed } => {
                let mut mv = MultiValue::single(default.clone());
                for (variant, value) in keyed {
                    let key = variant.to_string();
                    if mv.insert(variant, value.clone()).is_some() {
                        return Err(ShapeError::DuplicateVariant { key });
                    }
                }
                Ok(mv)
            }
            Shape::KeyedSequences(_) => Err(ShapeError::Unexpected {
                expected: "scalar or keyed scalars",
                found: "keyed sequences",
            }),
        }
    }
}

impl ToNode for MultiValue {
    fn to_node(&self, codec: &Codec) -> Result<Node, ShapeError> {
        if self.is_empty() {
            return Err(ShapeError::Empty { what: "multi value" });
        }
        let default = self.default_value().ok_or(ShapeError::NoDefault)?;
        if self.is_default_only() {
            return Ok(Node::Scalar(default.clone()));
        }
        let mut items = Vec::with_capacity(self.len());
        items.push(Node::Scalar(default.clone()));
        for (variant, value) in self.iter().filter(|(v, _)| !v.is_default()) {
            items.push(Node::pair(codec.key(variant)?, Node::Scalar(value.clone())));
        }
        Ok(Node::Sequence(items))
    }
}

/// An ordered list of scalars per variant.
///
/// Written as a sequence mixing bare scalars (default variant) and
/// `name: [scalars]` pairs:
///
/// ```yaml
/// patterns:
///     - /usr/bin
///     - devel:
///         - /usr/include
/// ```
///
/// Repeated keys append to the same variant.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListMultiValue {
    entries: BTreeMap<Variant, Vec<Scalar>>,
}

impl ListMultiValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default-variant list.
    pub fn from_default<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Scalar>,
    {
        let mut lmv = Self::new();
        lmv.extend(Variant::Default, values);
        lmv
    }

    pub fn push(&mut self, variant: Variant, value: impl Into<Scalar>) {
        self.entries.entry(variant).or_default().push(value.into());
    }

    pub fn extend<I, S>(&mut self, variant: Variant, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<Scalar>,
    {
        for value in values {
            self.push(variant.clone(), value);
        }
    }

    pub fn get(&self, variant: &Variant) -> Option<&[Scalar]> {
        self.entries.get(variant).map(Vec::as_slice)
    }

    /// Values of the default variant; empty when it has none.
    pub fn defaults(&self) -> &[Scalar] {
        self.get(&Variant::Default).unwrap_or_default()
    }

    /// Number of variants.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variant, &[Scalar])> {
        self.entries.iter().map(|(v, s)| (v, s.as_slice()))
    }
}

impl FromNode for ListMultiValue {
    fn from_node(node: &Node, codec: &Codec) -> Result<Self, ShapeError> {
        match Shape::keyed_sequences(node, codec)? {
            Shape::KeyedSequences(entries) => {
                let mut lmv = ListMultiValue::new();
                for (variant, values) in entries {
                    lmv.extend(variant, values.into_iter().cloned());
                }
                Ok(lmv)
            }
            _ => Err(ShapeError::Unexpected {
                expected: "keyed sequences",
                found: "keyed scalars",
            }),
        }
    }
}

impl ToNode for ListMultiValue {
    fn to_node(&self, codec: &Codec) -> Result<Node, ShapeError> {
        if self.is_empty() {
            return Err(ShapeError::Empty {
                what: "list multi value",
            });
        }
        let mut items: Vec<Node> = self.defaults().iter().cloned().map(Node::Scalar).collect();
        for (variant, values) in self.iter().filter(|(v, _)| !v.is_default()) {
            let values = values.iter().cloned().map(Node::Scalar).collect();
            items.push(Node::pair(codec.key(variant)?, Node::Sequence(values)));
        }
        Ok(Node::Sequence(items))
    }
}
