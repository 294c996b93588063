//! Node codecs.
//!
//! Every document field is read through [`FromNode`] and written through
//! [`ToNode`]. The [`Codec`] value carries the settings the conversions need,
//! which today is only the reserved variant key.

use ypkg_yaml::{Node, Scalar};

use crate::error::ShapeError;
use crate::variant::Variant;

/// Conversion settings shared by all node codecs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Codec {
    reserved: String,
}

impl Default for Codec {
    fn default() -> Self {
        Self {
            reserved: Self::DEFAULT_RESERVED.to_string(),
        }
    }
}

impl Codec {
    /// Key historical tooling used to mark the main package in keyed lists.
    pub const DEFAULT_RESERVED: &'static str = "^";

    pub fn new(reserved: impl Into<String>) -> Self {
        Self {
            reserved: reserved.into(),
        }
    }

    pub fn reserved(&self) -> &str {
        &self.reserved
    }

    pub fn decode<T: FromNode>(&self, node: &Node) -> Result<T, ShapeError> {
        T::from_node(node, self)
    }

    pub fn encode<T: ToNode + ?Sized>(&self, value: &T) -> Result<Node, ShapeError> {
        value.to_node(self)
    }

    /// Validate a key read from a document as a variant name.
    pub fn variant(&self, key: &str) -> Result<Variant, ShapeError> {
        if key == self.reserved {
            return Err(ShapeError::ReservedVariant {
                key: key.to_string(),
            });
        }
        Variant::named(key)
    }

    /// The key a named variant is written under.
    pub fn key<'v>(&self, variant: &'v Variant) -> Result<&'v str, ShapeError> {
        match variant {
            Variant::Default => Err(ShapeError::NoDefault),
            Variant::Named(name) if name.is_empty() => Err(ShapeError::EmptyVariant),
            Variant::Named(name) if *name == self.reserved => Err(ShapeError::ReservedVariant {
                key: name.clone(),
            }),
            Variant::Named(name) => Ok(name),
        }
    }
}

/// Decode a value from a document node.
pub trait FromNode: Sized {
    fn from_node(node: &Node, codec: &Codec) -> Result<Self, ShapeError>;
}

/// Encode a value as a document node.
pub trait ToNode {
    fn to_node(&self, codec: &Codec) -> Result<Node, ShapeError>;
}

/// The permitted layouts of a flexible collection, validated up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape<'a> {
    /// A bare non-empty scalar.
    Scalar(&'a Scalar),
    /// A default scalar followed by `name: value` pairs.
    KeyedScalars {
        default: &'a Scalar,
        keyed: Vec<(Variant, &'a Scalar)>,
    },
    /// Bare scalars for the default variant mixed with `name: [values]`
    /// pairs, in document order.
    KeyedSequences(Vec<(Variant, Vec<&'a Scalar>)>),
}

impl<'a> Shape<'a> {
    /// Classify a node as `Scalar` or `KeyedScalars`.
    pub fn keyed_scalars(node: &'a Node, codec: &Codec) -> Result<Self, ShapeError> {
        match node {
            Node::Scalar(s) => Ok(Shape::Scalar(non_empty(s, "value")?)),
            Node::Sequence(items) => {
                let (first, rest) = items
                    .split_first()
                    .ok_or(ShapeError::Empty { what: "sequence" })?;
                let default = match first {
                    Node::Scalar(s) if !s.is_empty() => s,
                    _ => return Err(ShapeError::MissingDefaultEntry),
                };
                let mut keyed = Vec::with_capacity(rest.len());
                for (offset, item) in rest.iter().enumerate() {
                    let (key, value) = single_pair(item, offset + 1)?;
                    let variant = codec.variant(key)?;
                    let value = match value {
                        Node::Scalar(s) => non_empty(s, "variant value")?,
                        other => return Err(ShapeError::unexpected("scalar", other)),
                    };
                    keyed.push((variant, value));
                }
                Ok(Shape::KeyedScalars { default, keyed })
            }
            other => Err(ShapeError::unexpected("scalar or sequence", other)),
        }
    }

    /// Classify a node as `KeyedSequences`.
    pub fn keyed_sequences(node: &'a Node, codec: &Codec) -> Result<Self, ShapeError> {
        let items = match node {
            Node::Sequence(items) if items.is_empty() => {
                return Err(ShapeError::Empty { what: "sequence" });
            }
            Node::Sequence(items) => items,
            other => return Err(ShapeError::unexpected("sequence", other)),
        };
        let mut entries = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match item {
                Node::Scalar(s) => entries.push((Variant::Default, vec![non_empty(s, "entry")?])),
                Node::Mapping(_) => {
                    let (key, value) = single_pair(item, index)?;
                    let variant = codec.variant(key)?;
                    let values = match value {
                        Node::Sequence(values) if values.is_empty() => {
                            return Err(ShapeError::Empty {
                                what: "variant list",
                            });
                        }
                        Node::Sequence(values) => values
                            .iter()
                            .map(|v| match v {
                                Node::Scalar(s) => non_empty(s, "entry"),
                                other => Err(ShapeError::unexpected("scalar", other)),
                            })
                            .collect::<Result<Vec<_>, _>>()?,
                        other => return Err(ShapeError::unexpected("sequence", other)),
                    };
                    entries.push((variant, values));
                }
                other => return Err(ShapeError::unexpected("scalar or mapping", other)),
            }
        }
        Ok(Shape::KeyedSequences(entries))
    }
}

fn non_empty<'a>(scalar: &'a Scalar, what: &'static str) -> Result<&'a Scalar, ShapeError> {
    if scalar.is_empty() {
        Err(ShapeError::Empty { what })
    } else {
        Ok(scalar)
    }
}

fn single_pair(node: &Node, index: usize) -> Result<(&str, &Node), ShapeError> {
    match node {
        Node::Mapping(map) if map.len() == 1 => map.iter().next().ok_or(ShapeError::NotAPair {
            index,
            found: "an empty mapping".to_string(),
        }),
        Node::Mapping(map) => Err(ShapeError::NotAPair {
            index,
            found: format!("a mapping with {} keys", map.len()),
        }),
        other => Err(ShapeError::NotAPair {
            index,
            found: format!("a {}", other.kind()),
        }),
    }
}

impl FromNode for Scalar {
    fn from_node(node: &Node, _codec: &Codec) -> Result<Self, ShapeError> {
        match node {
            Node::Scalar(s) => Ok(s.clone()),
            other => Err(ShapeError::unexpected("scalar", other)),
        }
    }
}

impl ToNode for Scalar {
    fn to_node(&self, _codec: &Codec) -> Result<Node, ShapeError> {
        Ok(Node::Scalar(self.clone()))
    }
}

/// A missing list reads as empty.
impl<T: FromNode> FromNode for Vec<T> {
    fn from_node(node: &Node, codec: &Codec) -> Result<Self, ShapeError> {
        match node {
            Node::Null => Ok(Vec::new()),
            Node::Sequence(items) => items.iter().map(|item| T::from_node(item, codec)).collect(),
            other => Err(ShapeError::unexpected("sequence", other)),
        }
    }
}

impl<T: ToNode> ToNode for [T] {
    fn to_node(&self, codec: &Codec) -> Result<Node, ShapeError> {
        self.iter()
            .map(|item| item.to_node(codec))
            .collect::<Result<Vec<_>, _>>()
            .map(Node::Sequence)
    }
}

impl FromNode for u64 {
    fn from_node(node: &Node, _codec: &Codec) -> Result<Self, ShapeError> {
        match node {
            Node::Scalar(s) => s.value.trim().parse().map_err(|_| ShapeError::InvalidNumber {
                value: s.value.clone(),
            }),
            other => Err(ShapeError::unexpected("number", other)),
        }
    }
}

impl ToNode for u64 {
    fn to_node(&self, _codec: &Codec) -> Result<Node, ShapeError> {
        Ok(Node::Scalar(Scalar::raw(self.to_string())))
    }
}

/// Read a field written either as one bare scalar or as a list of scalars.
pub fn one_or_many(node: &Node, codec: &Codec) -> Result<Vec<Scalar>, ShapeError> {
    match node {
        Node::Scalar(s) => Ok(vec![s.clone()]),
        other => codec.decode(other),
    }
}

/// Write a single scalar bare and two or more as a list; nothing when empty.
pub fn one_or_many_node(values: &[Scalar], codec: &Codec) -> Result<Option<Node>, ShapeError> {
    match values {
        [] => Ok(None),
        [one] => codec.encode(one).map(Some),
        many => codec.encode(many).map(Some),
    }
}
