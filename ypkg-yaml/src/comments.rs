//! Side index of scalar positions.
//!
//! serde_yaml drops comments and normalises numbers, so the parser keeps a
//! line-oriented index with one slot per non-null scalar value in document
//! order: its raw text, what serde_yaml resolves it to, and the trailing
//! comment. Slots are claimed positionally while the value tree is walked.
//! A slot that does not hold the claimed value means the scanner lost track
//! of the document; nothing after that point gets a comment.

use serde_yaml::Value;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub(crate) struct LineScalar {
    /// Source text of a single-line plain or quoted scalar.
    pub raw: Option<String>,
    /// `None` for block scalars, which always resolve to a string.
    pub resolved: Option<Value>,
    pub comment: Option<String>,
}

impl LineScalar {
    fn holds(&self, value: &Value) -> bool {
        match &self.resolved {
            Some(resolved) => resolved == value,
            None => matches!(value, Value::String(_)),
        }
    }
}

#[derive(Debug)]
enum Slot {
    Scalar(LineScalar),
    /// Something the scanner cannot map to scalars one by one.
    Lost,
}

#[derive(Debug, Clone)]
enum Anchor {
    Scalar(LineScalar),
    Null,
    Collection,
}

/// A scalar that may continue on following lines.
#[derive(Debug)]
struct Pending {
    text: String,
    lines: usize,
    blanks: usize,
    comment: Option<String>,
    /// Quote character of a quoted scalar that is still open.
    quote: Option<u8>,
    anchor: Option<String>,
}

#[derive(Debug, Default)]
struct Flow {
    text: String,
    comment: Option<String>,
}

#[derive(Debug, Default)]
struct Scanner {
    slots: Vec<Slot>,
    anchors: HashMap<String, Anchor>,
    pending: Option<Pending>,
    flow: Option<Flow>,
    /// Indent of the line that opened a block scalar; deeper lines are its body.
    block_owner: Option<usize>,
}

impl Scanner {
    fn line(&mut self, line: &str) {
        let content = line.trim_start_matches(' ');
        let indent = line.len() - content.len();

        if let Some(owner) = self.block_owner {
            if content.trim().is_empty() || indent > owner {
                return;
            }
            self.block_owner = None;
        }

        if self.flow.is_some() {
            let (body, comment) = split_flow_comment(content.trim());
            self.feed_flow(body, comment);
            return;
        }
        if self.pending.as_ref().is_some_and(|p| p.quote.is_some()) {
            self.continue_quoted(content.trim());
            return;
        }

        let content = content.trim_end();
        if content.is_empty() {
            if let Some(pending) = &mut self.pending {
                pending.blanks += 1;
            }
            return;
        }
        let marker = content == "---" || content.starts_with("--- ") || content == "...";
        let directive = indent == 0 && self.pending.is_none() && content.starts_with('%');
        if content.starts_with('#') || marker || directive {
            self.flush();
            return;
        }

        let (body, comment) = split_comment(content);
        let (structured, value) = split_line(body);
        let value = value.trim();
        // `value` is a suffix of `body`, which is a prefix of `content`.
        let tail = &content[body.len() - value.len()..];
        if !structured {
            if let Some(pending) = &mut self.pending {
                pending.push(value);
                if comment.is_some() {
                    pending.comment = comment;
                    self.flush();
                }
                return;
            }
        }
        self.flush();
        self.start_value(indent, value, tail, comment);
    }

    /// `tail` is the rest of the line from `value` on, comment included.
    fn start_value(&mut self, indent: usize, value: &str, tail: &str, comment: Option<String>) {
        let (anchor, rest) = strip_anchor(value);
        let tail = &tail[value.len() - rest.len()..];
        let value = rest;

        if value.is_empty() {
            if let Some(name) = anchor {
                self.anchors.insert(name.to_string(), Anchor::Collection);
            }
            return;
        }
        if is_block_header(value) {
            if let Some(name) = anchor {
                self.anchors.insert(name.to_string(), Anchor::Collection);
            }
            self.slots.push(Slot::Scalar(LineScalar {
                raw: None,
                resolved: None,
                comment,
            }));
            self.block_owner = Some(indent);
            return;
        }
        if value.starts_with(['[', '{']) {
            if let Some(name) = anchor {
                self.anchors.insert(name.to_string(), Anchor::Collection);
            }
            // Quotes inside the brackets change where the comment starts.
            let (body, comment) = split_flow_comment(tail);
            self.flow = Some(Flow::default());
            self.feed_flow(body, comment);
            return;
        }
        if let Some(name) = value.strip_prefix('*') {
            match self.anchors.get(name.trim()) {
                Some(Anchor::Scalar(line)) => {
                    let line = LineScalar {
                        comment,
                        ..line.clone()
                    };
                    self.slots.push(Slot::Scalar(line));
                }
                Some(Anchor::Null) => {}
                Some(Anchor::Collection) | None => self.slots.push(Slot::Lost),
            }
            return;
        }
        if value.starts_with(['!', '?']) {
            self.slots.push(Slot::Lost);
            return;
        }

        let quote = match value.as_bytes()[0] {
            q @ (b'"' | b'\'') if closing_quote(value, q).is_none() => Some(q),
            _ => None,
        };
        let closed_quote = quote.is_none() && value.starts_with(['"', '\'']);
        self.pending = Some(Pending {
            text: value.to_string(),
            lines: 1,
            blanks: 0,
            comment,
            quote,
            anchor: anchor.map(str::to_string),
        });
        let ends_here = closed_quote || self.pending.as_ref().is_some_and(|p| p.comment.is_some());
        if ends_here {
            self.flush();
        }
    }

    fn continue_quoted(&mut self, content: &str) {
        let Some(pending) = &mut self.pending else {
            return;
        };
        let Some(quote) = pending.quote else {
            return;
        };
        pending.text.push_str("\n ");
        pending.text.push_str(content);
        pending.lines += 1;

        if let Some(end) = closing_quote(&pending.text, quote) {
            let rest = pending.text.split_off(end + 1);
            pending.comment = split_comment(&rest).1;
            pending.quote = None;
            self.flush();
        }
    }

    fn feed_flow(&mut self, body: String, comment: Option<String>) {
        let flow = self.flow.get_or_insert_with(Flow::default);
        if !flow.text.is_empty() {
            flow.text.push_str("\n ");
        }
        flow.text.push_str(&body);
        // Only a comment on the closing line belongs to the collection's last value.
        flow.comment = comment;
        if flow_depth(&flow.text) > 0 {
            return;
        }

        let Some(Flow { text, mut comment }) = self.flow.take() else {
            return;
        };
        let mut leaves = Vec::new();
        let parsed = serde_yaml::from_str::<Value>(&text)
            .is_ok_and(|value| flow_leaves(&value, &mut leaves));
        if !parsed {
            self.slots.push(Slot::Lost);
            return;
        }
        let last = leaves.len().saturating_sub(1);
        for (i, leaf) in leaves.into_iter().enumerate() {
            self.slots.push(Slot::Scalar(LineScalar {
                raw: None,
                resolved: Some(leaf),
                comment: if i == last { comment.take() } else { None },
            }));
        }
    }

    fn flush(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let resolved = serde_yaml::from_str::<Value>(&format!("k: {}", pending.text))
            .ok()
            .and_then(|doc| doc.get("k").cloned());

        let anchor = match resolved {
            Some(Value::Null) => Anchor::Null,
            Some(value @ (Value::Bool(_) | Value::Number(_) | Value::String(_))) => {
                let line = LineScalar {
                    raw: (pending.lines == 1).then(|| pending.text.clone()),
                    resolved: Some(value),
                    comment: pending.comment,
                };
                self.slots.push(Slot::Scalar(line.clone()));
                Anchor::Scalar(line)
            }
            _ => {
                self.slots.push(Slot::Lost);
                Anchor::Collection
            }
        };
        if let Some(name) = pending.anchor {
            self.anchors.insert(name, anchor);
        }
    }

    fn finish(mut self) -> Vec<Slot> {
        self.flush();
        if self.flow.is_some() {
            self.slots.push(Slot::Lost);
        }
        self.slots
    }
}

impl Pending {
    /// Append a continuation line of a multi-line plain scalar.
    fn push(&mut self, line: &str) {
        for _ in 0..self.blanks {
            self.text.push_str("\n ");
        }
        self.blanks = 0;
        self.text.push_str("\n ");
        self.text.push_str(line);
        self.lines += 1;
    }
}

#[derive(Debug, Default)]
pub(crate) struct LineIndex {
    slots: Vec<Slot>,
    cursor: usize,
    lost: bool,
}

impl LineIndex {
    pub fn scan(text: &str) -> Self {
        let mut scanner = Scanner::default();
        for line in text.lines() {
            scanner.line(line);
        }
        Self {
            slots: scanner.finish(),
            cursor: 0,
            lost: false,
        }
    }

    /// Claim the next slot, which must hold `value`.
    pub fn claim(&mut self, value: &Value) -> Option<&LineScalar> {
        if self.lost {
            return None;
        }
        let idx = self.cursor;
        self.cursor += 1;
        match self.slots.get(idx) {
            Some(Slot::Scalar(line)) if line.holds(value) => Some(line),
            _ => {
                self.lost = true;
                None
            }
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.len()
    }
}

/// Non-null scalars of a flow collection in document order; false on tags.
fn flow_leaves(value: &Value, out: &mut Vec<Value>) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            out.push(value.clone());
            true
        }
        Value::Sequence(items) => items.iter().all(|item| flow_leaves(item, out)),
        Value::Mapping(map) => map.values().all(|item| flow_leaves(item, out)),
        Value::Tagged(_) => false,
    }
}

/// Open brackets minus closed ones, ignoring quoted text.
fn flow_depth(s: &str) -> i32 {
    let bytes = s.as_bytes();
    let mut depth = 0;
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(b'\'') => {
                if b == b'\'' {
                    if bytes.get(i + 1) == Some(&b'\'') {
                        i += 1;
                    } else {
                        quote = None;
                    }
                }
            }
            Some(_) => {
                if b == b'\\' {
                    i += 1;
                } else if b == b'"' {
                    quote = None;
                }
            }
            None => match b {
                b'[' | b'{' => depth += 1,
                b']' | b'}' => depth -= 1,
                b'\'' | b'"' if i == 0 || is_flow_boundary(bytes[i - 1]) => quote = Some(b),
                _ => {}
            },
        }
        i += 1;
    }
    depth
}

fn is_flow_boundary(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'[' | b'{' | b',' | b':')
}

/// Split `s` at the first `#` that starts a comment (outside quotes, after whitespace).
fn split_comment(s: &str) -> (&str, Option<String>) {
    split_comment_at(s, |b| matches!(b, b' ' | b'\t'))
}

/// Like [`split_comment`], but quotes may also open right after flow indicators.
fn split_flow_comment(s: &str) -> (String, Option<String>) {
    let (body, comment) = split_comment_at(s, is_flow_boundary);
    (body.to_string(), comment)
}

fn split_comment_at(s: &str, opens_token: impl Fn(u8) -> bool) -> (&str, Option<String>) {
    let bytes = s.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(b'\'') => {
                if b == b'\'' {
                    if bytes.get(i + 1) == Some(&b'\'') {
                        i += 1;
                    } else {
                        quote = None;
                    }
                }
            }
            Some(_) => {
                if b == b'\\' {
                    i += 1;
                } else if b == b'"' {
                    quote = None;
                }
            }
            None => {
                let token_start = i == 0 || opens_token(bytes[i - 1]);
                if token_start && (b == b'\'' || b == b'"') {
                    quote = Some(b);
                } else if token_start && b == b'#' && (i == 0 || matches!(bytes[i - 1], b' ' | b'\t')) {
                    return (s[..i].trim_end(), Some(s[i..].to_string()));
                }
            }
        }
        i += 1;
    }
    (s, None)
}

/// Whether the line opens a node (`key:`, `- `, `? `) and the value text after it.
fn split_line(body: &str) -> (bool, &str) {
    let rest = strip_dashes(body);
    let dashed = rest.len() != body.len();
    if rest == "?" || rest.starts_with("? ") {
        return (true, rest);
    }
    match split_key(rest) {
        Some(value) => (true, value),
        None => (dashed, rest),
    }
}

fn strip_dashes(mut s: &str) -> &str {
    loop {
        if s == "-" {
            return "";
        }
        match s.strip_prefix("- ") {
            Some(rest) => s = rest.trim_start(),
            None => return s,
        }
    }
}

/// Value part of `key: value`, or `None` when the text holds no key.
fn split_key(s: &str) -> Option<&str> {
    if s.starts_with(['[', '{']) {
        return None;
    }
    let search_from = match s.as_bytes().first() {
        Some(&q @ (b'\'' | b'"')) => closing_quote(s, q)? + 1,
        _ => 0,
    };

    let tail = &s[search_from..];
    if let Some(pos) = tail.find(": ") {
        return Some(&s[search_from + pos + 2..]);
    }
    if tail.trim_end().ends_with(':') {
        return Some("");
    }
    None
}

/// Anchor name and the rest of the value for `&name value`.
fn strip_anchor(value: &str) -> (Option<&str>, &str) {
    match value.strip_prefix('&') {
        Some(rest) => {
            let end = rest.find([' ', '\t']).unwrap_or(rest.len());
            (Some(&rest[..end]), rest[end..].trim_start())
        }
        None => (None, value),
    }
}

fn closing_quote(s: &str, quote: u8) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        let b = bytes[i];
        if quote == b'"' && b == b'\\' {
            i += 2;
            continue;
        }
        if b == quote {
            if quote == b'\'' && bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return Some(i);
        }
        i += 1;
    }
    None
}

fn is_block_header(value: &str) -> bool {
    let mut chars = value.chars();
    matches!(chars.next(), Some('|' | '>')) && chars.all(|c| c == '+' || c == '-' || c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::String(text.into())
    }

    fn comment_of(index: &mut LineIndex, value: &Value) -> Option<String> {
        index.claim(value).and_then(|line| line.comment.clone())
    }

    #[test]
    fn comment_after_value_is_split() {
        assert_eq!(
            split_comment("license: MIT # hello"),
            ("license: MIT", Some("# hello".to_string()))
        );
    }

    #[test]
    fn hash_inside_word_is_not_a_comment() {
        assert_eq!(split_comment("- c#sharp"), ("- c#sharp", None));
    }

    #[test]
    fn hash_inside_quotes_is_not_a_comment() {
        assert_eq!(
            split_comment("summary: \"a # b\" # real"),
            ("summary: \"a # b\"", Some("# real".to_string()))
        );
        assert_eq!(split_comment("summary: 'it''s # x'"), ("summary: 'it''s # x'", None));
        assert_eq!(
            split_flow_comment("['a # b', c] # real"),
            ("['a # b', c]".to_string(), Some("# real".to_string()))
        );
    }

    #[test]
    fn apostrophe_in_plain_text_does_not_open_quote() {
        assert_eq!(
            split_comment("summary: don't panic # note"),
            ("summary: don't panic", Some("# note".to_string()))
        );
    }

    #[test]
    fn keys_and_dashes_are_stripped() {
        assert_eq!(split_line("- devel: programming.devel"), (true, "programming.devel"));
        assert_eq!(split_line("- /usr/bin"), (true, "/usr/bin"));
        assert_eq!(split_line("https://x.org/a.tar.xz : abc123"), (true, "abc123"));
        assert_eq!(split_line("patterns:"), (true, ""));
        assert_eq!(split_line("\"a: b\""), (false, "\"a: b\""));
        assert_eq!(split_line("{a: b}"), (false, "{a: b}"));
        assert_eq!(split_line("continued text"), (false, "continued text"));
    }

    #[test]
    fn block_scalar_bodies_are_skipped() {
        let text = "description: |\n    - not a list\n    key: value\nname: nano\n";
        let index = LineIndex::scan(text);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn block_header_keeps_its_comment() {
        let text = "description: | # note\n    text\nname: x # n\n";
        let mut index = LineIndex::scan(text);
        assert_eq!(comment_of(&mut index, &s("text\n")).as_deref(), Some("# note"));
        assert_eq!(comment_of(&mut index, &s("x")).as_deref(), Some("# n"));
    }

    #[test]
    fn claim_walks_forward() {
        let text = "a: x # first\nb: x # second\n";
        let mut index = LineIndex::scan(text);
        let x = s("x");
        assert_eq!(comment_of(&mut index, &x).as_deref(), Some("# first"));
        assert_eq!(comment_of(&mut index, &x).as_deref(), Some("# second"));
        assert!(index.claim(&x).is_none());
    }

    #[test]
    fn flow_values_take_their_own_slots() {
        let text = "license: [MIT]\nrundeps:\n    - MIT # keep me here\n";
        let mut index = LineIndex::scan(text);
        let mit = s("MIT");
        assert_eq!(comment_of(&mut index, &mit), None);
        assert_eq!(comment_of(&mut index, &mit).as_deref(), Some("# keep me here"));
    }

    #[test]
    fn multi_line_flow_keeps_the_closing_comment() {
        let text = "license: [MIT, # not here\n    GPL] # here\nname: x\n";
        let mut index = LineIndex::scan(text);
        assert_eq!(comment_of(&mut index, &s("MIT")), None);
        assert_eq!(comment_of(&mut index, &s("GPL")).as_deref(), Some("# here"));
        assert_eq!(comment_of(&mut index, &s("x")), None);
    }

    #[test]
    fn multi_line_plain_scalars_are_one_slot() {
        let text = "summary: a long\n    summary\n\n    text\nlicense: MIT # m\n";
        let mut index = LineIndex::scan(text);
        assert_eq!(comment_of(&mut index, &s("a long summary\ntext")), None);
        assert_eq!(comment_of(&mut index, &s("MIT")).as_deref(), Some("# m"));
    }

    #[test]
    fn multi_line_quoted_scalar_takes_the_closing_comment() {
        let text = "summary: \"one # not a comment\n    two\" # c\nname: x\n";
        let mut index = LineIndex::scan(text);
        assert_eq!(
            comment_of(&mut index, &s("one # not a comment two")).as_deref(),
            Some("# c")
        );
        assert_eq!(comment_of(&mut index, &s("x")), None);
    }

    #[test]
    fn scalar_aliases_repeat_their_anchor() {
        let text = "a: &v 1.10 # one\nb: *v # two\n";
        let mut index = LineIndex::scan(text);
        let value: Value = serde_yaml::from_str("1.10").unwrap();
        let first = index.claim(&value).unwrap();
        assert_eq!(first.raw.as_deref(), Some("1.10"));
        assert_eq!(first.comment.as_deref(), Some("# one"));
        let second = index.claim(&value).unwrap();
        assert_eq!(second.raw.as_deref(), Some("1.10"));
        assert_eq!(second.comment.as_deref(), Some("# two"));
    }

    #[test]
    fn nulls_take_no_slot() {
        let text = "a: ~ # gone\nb:\nc: x # kept\n";
        let mut index = LineIndex::scan(text);
        assert_eq!(index.len(), 1);
        assert_eq!(comment_of(&mut index, &s("x")).as_deref(), Some("# kept"));
    }

    #[test]
    fn mismatch_stops_recovery() {
        let text = "base: &b\n    - x\ncopy: *b\nafter: y # not recovered\n";
        let mut index = LineIndex::scan(text);
        let x = s("x");
        assert!(index.claim(&x).is_some());
        assert!(index.claim(&x).is_none());
        assert!(index.claim(&s("y")).is_none());
    }
}
