//! Block-style emitter.
//!
//! Output follows the layout package.yml files are written in: four-space
//! indentation, sequences indented under their key, literal block scalars for
//! multi-line text, and each scalar's inline comment after its value.

use crate::node::{Mapping, Node, Scalar, ScalarKind};
use serde_yaml::Value;

/// Indentation step.
pub const INDENT: usize = 4;

/// Render `node` as YAML text terminated by a newline (empty for `Null`).
pub fn emit(node: &Node) -> String {
    let mut out = String::new();
    match node {
        Node::Null => {}
        Node::Scalar(s) => push_scalar(&mut out, s, INDENT),
        Node::Sequence(items) if items.is_empty() => out.push_str("[]\n"),
        Node::Sequence(items) => emit_sequence(&mut out, items, 0),
        Node::Mapping(map) if map.is_empty() => out.push_str("{}\n"),
        Node::Mapping(map) => emit_mapping(&mut out, map, 0),
    }
    out
}

fn emit_mapping(out: &mut String, map: &Mapping, indent: usize) {
    for (key, value) in map.iter() {
        pad(out, indent);
        push_key(out, key);
        emit_after_key(out, value, indent + INDENT);
    }
}

fn emit_sequence(out: &mut String, items: &[Node], indent: usize) {
    for item in items {
        pad(out, indent);
        out.push('-');
        match item {
            Node::Mapping(map) if !map.is_empty() => {
                out.push(' ');
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        pad(out, indent + 2);
                    }
                    push_key(out, key);
                    emit_after_key(out, value, indent + INDENT);
                }
            }
            other => emit_after_key(out, other, indent + INDENT),
        }
    }
}

/// Everything after `key:` or `-`; nested blocks start at `child`.
fn emit_after_key(out: &mut String, value: &Node, child: usize) {
    match value {
        Node::Null => out.push('\n'),
        Node::Scalar(s) => {
            out.push(' ');
            push_scalar(out, s, child);
        }
        Node::Sequence(items) if items.is_empty() => out.push_str(" []\n"),
        Node::Sequence(items) => {
            out.push('\n');
            emit_sequence(out, items, child);
        }
        Node::Mapping(map) if map.is_empty() => out.push_str(" {}\n"),
        Node::Mapping(map) => {
            out.push('\n');
            emit_mapping(out, map, child);
        }
    }
}

fn push_key(out: &mut String, key: &str) {
    if is_plain_safe(key) {
        out.push_str(key);
    } else {
        out.push_str(&quoted(key));
    }
    out.push(':');
}

fn push_scalar(out: &mut String, scalar: &Scalar, block_indent: usize) {
    let text = &scalar.value;
    match scalar.kind {
        ScalarKind::Raw if !text.is_empty() => out.push_str(text),
        _ if text.contains('\n') && literal_ok(text) => {
            push_literal(out, text, scalar.comment.as_deref(), block_indent);
            return;
        }
        _ if is_plain_safe(text) => out.push_str(text),
        _ => out.push_str(&quoted(text)),
    }
    if let Some(comment) = &scalar.comment {
        out.push(' ');
        out.push_str(comment);
    }
    out.push('\n');
}

fn push_literal(out: &mut String, text: &str, comment: Option<&str>, indent: usize) {
    let body = text.trim_end_matches('\n');
    let trailing = text.len() - body.len();
    out.push_str(match trailing {
        0 => "|-",
        1 => "|",
        _ => "|+",
    });
    if let Some(comment) = comment {
        out.push(' ');
        out.push_str(comment);
    }
    out.push('\n');
    for line in body.split('\n') {
        if !line.is_empty() {
            pad(out, indent);
            out.push_str(line);
        }
        out.push('\n');
    }
    for _ in 1..trailing {
        out.push('\n');
    }
}

/// Literal style only works when indentation can be auto-detected and no
/// whitespace-only line would be swallowed.
fn literal_ok(text: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }
    let lines: Vec<&str> = text.trim_end_matches('\n').split('\n').collect();
    if lines.iter().any(|l| !l.is_empty() && l.trim().is_empty()) {
        return false;
    }
    if lines
        .iter()
        .any(|l| l.chars().any(|c| (c.is_control() && c != '\t') || needs_escape(c)))
    {
        return false;
    }
    match lines.iter().find(|l| !l.is_empty()) {
        Some(first) => !first.starts_with([' ', '\t']),
        None => false,
    }
}

/// True when `s` can be written without quotes and reads back as the same string.
pub fn is_plain_safe(s: &str) -> bool {
    if s.is_empty() || s != s.trim() {
        return false;
    }
    if s.chars().any(|c| c.is_control() || needs_escape(c)) {
        return false;
    }
    if s.contains(": ") || s.contains(" #") || s.ends_with(':') {
        return false;
    }
    if s.starts_with([
        '[', ']', '{', '}', ',', '#', '&', '*', '!', '|', '>', '\'', '"', '%', '@', '`',
    ]) {
        return false;
    }
    matches!(serde_yaml::from_str::<Value>(s), Ok(Value::String(ref v)) if v == s)
}

/// Double-quoted form. JSON string syntax is valid YAML, but JSON leaves
/// YAML's extra line breaks and non-printable characters raw.
fn quoted(s: &str) -> String {
    let json = serde_json::Value::String(s.to_owned()).to_string();
    if !json.chars().any(needs_escape) {
        return json;
    }
    let mut out = String::with_capacity(json.len() + 8);
    for c in json.chars() {
        match c {
            '\u{85}' => out.push_str("\\N"),
            '\u{2028}' => out.push_str("\\L"),
            '\u{2029}' => out.push_str("\\P"),
            c if needs_escape(c) && u32::from(c) <= 0xFFFF => {
                out.push_str(&format!("\\u{:04X}", u32::from(c)));
            }
            c if needs_escape(c) => out.push_str(&format!("\\U{:08X}", u32::from(c))),
            c => out.push(c),
        }
    }
    out
}

/// Characters that cannot appear unescaped in a scalar: YAML line breaks
/// other than `\n`, the byte order mark, and anything outside the YAML
/// printable set.
fn needs_escape(c: char) -> bool {
    let printable = matches!(
        c,
        '\t' | '\n' | ' '..='~' | '\u{A0}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..
    );
    !printable || matches!(c, '\u{2028}' | '\u{2029}' | '\u{FEFF}')
}

fn pad(out: &mut String, indent: usize) {
    out.extend(std::iter::repeat_n(' ', indent));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(entries: Vec<(&str, Node)>) -> Node {
        Node::Mapping(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    #[test]
    fn scalar_with_comment() {
        let node = doc(vec![(
            "component",
            Node::Scalar(Scalar::new("system.devel").with_comment("# comment")),
        )]);
        assert_eq!(emit(&node), "component: system.devel # comment\n");
    }

    #[test]
    fn keyed_sequence_layout() {
        let node = doc(vec![(
            "patterns",
            Node::Sequence(vec![
                Node::scalar("/usr/bin/go"),
                Node::pair(
                    "devel",
                    Node::Sequence(vec![Node::scalar("/usr/include")]),
                ),
            ]),
        )]);
        assert_eq!(
            emit(&node),
            "patterns:\n    - /usr/bin/go\n    - devel:\n        - /usr/include\n"
        );
    }

    #[test]
    fn ambiguous_strings_are_quoted() {
        let node = doc(vec![
            ("a", Node::scalar("1.0")),
            ("b", Node::scalar("true")),
            ("c", Node::scalar("# SET ME")),
            ("d", Node::scalar("")),
            ("e", Node::scalar("yes")),
        ]);
        assert_eq!(
            emit(&node),
            "a: \"1.0\"\nb: \"true\"\nc: \"# SET ME\"\nd: \"\"\ne: yes\n"
        );
    }

    #[test]
    fn raw_scalars_are_verbatim() {
        let node = doc(vec![("version", Node::Scalar(Scalar::raw("1.10")))]);
        assert_eq!(emit(&node), "version: 1.10\n");
    }

    #[test]
    fn multiline_uses_literal_blocks() {
        let node = doc(vec![
            ("clip", Node::scalar("one\ntwo\n")),
            ("strip", Node::scalar("one\ntwo")),
            ("keep", Node::scalar("one\n\n")),
        ]);
        assert_eq!(
            emit(&node),
            "clip: |\n    one\n    two\nstrip: |-\n    one\n    two\nkeep: |+\n    one\n\n"
        );
    }

    #[test]
    fn leading_space_falls_back_to_quotes() {
        let node = doc(vec![("setup", Node::scalar("  indented\nnext"))]);
        assert_eq!(emit(&node), "setup: \"  indented\\nnext\"\n");
    }

    #[test]
    fn nested_mapping_and_empty_collections() {
        let mut inner = Mapping::new();
        inner.insert("build", Node::Sequence(vec![Node::scalar("gcc")]));
        let node = doc(vec![
            ("deps", Node::Mapping(inner)),
            ("none", Node::Sequence(vec![])),
        ]);
        assert_eq!(
            emit(&node),
            "deps:\n    build:\n        - gcc\nnone: []\n"
        );
    }

    #[test]
    fn plain_safety() {
        assert!(is_plain_safe("pkgconfig(zlib)"));
        assert!(is_plain_safe("https://example.org/a.tar.xz"));
        assert!(is_plain_safe("git|https://github.com/a/b"));
        assert!(!is_plain_safe("a: b"));
        assert!(!is_plain_safe("a #b"));
        assert!(!is_plain_safe("~"));
        assert!(!is_plain_safe("null"));
        assert!(!is_plain_safe("42"));
        assert!(!is_plain_safe(" padded"));
        assert!(is_plain_safe("café"));
        assert!(!is_plain_safe("a\u{2028}b"));
        assert!(!is_plain_safe("a\u{85}b"));
        assert!(!is_plain_safe("a\u{feff}"));
    }

    #[test]
    fn yaml_line_breaks_are_escaped() {
        let node = doc(vec![
            ("ls", Node::scalar("a\u{2028}b")),
            ("ps", Node::scalar("a\u{2029}b")),
            ("nel", Node::scalar("a\u{85}b")),
            ("del", Node::scalar("a\u{7f}\u{feff}")),
        ]);
        assert_eq!(
            emit(&node),
            "ls: \"a\\Lb\"\nps: \"a\\Pb\"\nnel: \"a\\Nb\"\ndel: \"a\\u007F\\uFEFF\"\n"
        );
    }

    #[test]
    fn literal_blocks_never_carry_line_separators() {
        let node = doc(vec![("description", Node::scalar("one\u{2028}\ntwo\n"))]);
        assert_eq!(emit(&node), "description: \"one\\L\\ntwo\\n\"\n");
    }

    #[test]
    fn non_ascii_text_stays_plain() {
        let node = doc(vec![("summary", Node::scalar("Éditeur de texte 漢字"))]);
        assert_eq!(emit(&node), "summary: Éditeur de texte 漢字\n");
    }
}
