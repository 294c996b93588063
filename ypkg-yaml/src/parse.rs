use crate::comments::LineIndex;
use crate::error::{YamlError, YamlResult};
use crate::node::{Mapping, Node, Scalar, ScalarKind};
use serde_yaml::Value;

/// Parse a whole package document. The root must be a mapping (or empty).
pub fn parse_document(text: &str) -> YamlResult<Node> {
    match parse_node(text)? {
        node @ (Node::Null | Node::Mapping(_)) => Ok(node),
        other => Err(YamlError::NotAMapping {
            found: other.kind(),
        }),
    }
}

/// Parse any YAML fragment into a [`Node`], recovering inline comments.
pub fn parse_node(text: &str) -> YamlResult<Node> {
    if is_blank(text) {
        return Ok(Node::Null);
    }
    let value: Value = serde_yaml::from_str(text)?;
    let mut index = LineIndex::scan(text);
    lift(&value, &mut index)
}

fn is_blank(text: &str) -> bool {
    text.lines().all(|l| {
        let l = l.trim();
        l.is_empty() || l.starts_with('#') || l == "---"
    })
}

fn lift(value: &Value, index: &mut LineIndex) -> YamlResult<Node> {
    Ok(match value {
        Value::Null => Node::Null,
        Value::Bool(b) => Node::Scalar(claim(value, index, b.to_string(), ScalarKind::Raw)),
        Value::Number(n) => Node::Scalar(claim(value, index, n.to_string(), ScalarKind::Raw)),
        Value::String(s) => Node::Scalar(claim(value, index, s.clone(), ScalarKind::Str)),
        Value::Sequence(items) => Node::Sequence(
            items
                .iter()
                .map(|item| lift(item, index))
                .collect::<YamlResult<Vec<_>>>()?,
        ),
        Value::Mapping(map) => {
            let mut out = Mapping::new();
            for (k, v) in map {
                out.insert(key_text(k)?, lift(v, index)?);
            }
            Node::Mapping(out)
        }
        Value::Tagged(tagged) => {
            return Err(YamlError::Unsupported {
                what: format!("tag {}", tagged.tag),
            });
        }
    })
}

fn claim(value: &Value, index: &mut LineIndex, fallback: String, kind: ScalarKind) -> Scalar {
    match index.claim(value) {
        Some(line) => Scalar {
            value: match kind {
                ScalarKind::Raw => line.raw.clone().unwrap_or(fallback),
                ScalarKind::Str => fallback,
            },
            comment: line.comment.clone(),
            kind,
        },
        None => Scalar {
            value: fallback,
            comment: None,
            kind,
        },
    }
}

fn key_text(key: &Value) -> YamlResult<String> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(YamlError::Unsupported {
            what: format!("non-scalar mapping key {:?}", other),
        }),
    }
}
