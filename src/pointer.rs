//! JSON Pointer representation for locating values in JSON documents.
//!
//! This module provides [`JsonPointer`], an immutable sequence of reference
//! tokens used both for the position inside the instance being validated and
//! for `$ref` fragments inside schema documents.

use std::fmt::{self, Display};

use serde_json::Value;

/// A JSON Pointer (RFC 6901).
///
/// Pointers are built incrementally and never mutated in place: every
/// `append` returns a new pointer. The empty pointer denotes the document
/// root. An empty segment is a real segment (`#/` is not `#`).
///
/// # Example
///
/// ```rust
/// use waymark::JsonPointer;
///
/// let pointer = JsonPointer::root()
///     .append("definitions")
///     .append("a/b");
///
/// assert_eq!(pointer.to_string(), "#/definitions/a~1b");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct JsonPointer {
    segments: Vec<String>,
}

impl JsonPointer {
    /// Creates an empty pointer representing the document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Creates a pointer from already-unescaped segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses an RFC 6901 pointer string such as `/definitions/x`.
    ///
    /// The empty string is the root pointer. Any other input must start with
    /// `/`, and `~` may only appear as `~0` or `~1`.
    pub fn parse(raw: &str) -> Result<Self, PointerError> {
        if raw.is_empty() {
            return Ok(Self::root());
        }
        let rest = raw
            .strip_prefix('/')
            .ok_or_else(|| PointerError::MissingSlash(raw.to_string()))?;

        let segments = rest
            .split('/')
            .map(|token| unescape(token).ok_or_else(|| PointerError::InvalidEscape(raw.to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { segments })
    }

    /// Parses the fragment part of a URI reference, with or without the
    /// leading `#`.
    pub fn from_fragment(fragment: &str) -> Result<Self, PointerError> {
        Self::parse(fragment.strip_prefix('#').unwrap_or(fragment))
    }

    /// Returns a new pointer with `segment` appended.
    pub fn append(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Returns a new pointer with an array index appended.
    pub fn append_index(&self, index: usize) -> Self {
        self.append(index.to_string())
    }

    /// Returns a new pointer made of this pointer's segments followed by
    /// `other`'s segments.
    pub fn join(&self, other: &JsonPointer) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// Returns true if this is the root pointer.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the number of segments in this pointer.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if this pointer has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns an iterator over the unescaped segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// Returns the parent pointer, or None if this is the root.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            None
        } else {
            Some(Self {
                segments: self.segments[..self.segments.len() - 1].to_vec(),
            })
        }
    }

    /// Returns the last segment, or None if this is the root.
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Resolves this pointer against `document`.
    ///
    /// Returns `None` as soon as one segment does not match: a missing object
    /// member, an out-of-range or non-canonical array index, or a scalar in
    /// the middle of the path.
    pub fn resolve<'v>(&self, document: &'v Value) -> Option<&'v Value> {
        self.segments
            .iter()
            .try_fold(document, |node, segment| match node {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => parse_index(segment).and_then(|i| items.get(i)),
                _ => None,
            })
    }

    /// Renders the pointer without the leading `#`, as RFC 6901 text.
    pub fn to_rfc6901(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            out.push('/');
            out.push_str(&escape(segment));
        }
        out
    }
}

impl Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_rfc6901())
    }
}

/// Errors produced when parsing a pointer string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PointerError {
    /// A non-empty pointer did not start with `/`.
    #[error("invalid JSON Pointer '{0}': must be empty or start with '/'")]
    MissingSlash(String),

    /// A `~` was not followed by `0` or `1`.
    #[error("invalid JSON Pointer '{0}': only ~0 and ~1 escapes are allowed")]
    InvalidEscape(String),
}

fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn unescape(token: &str) -> Option<String> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(ch) = chars.next() {
        if ch == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(ch);
        }
    }
    Some(out)
}

/// Array indices must be canonical decimal: no sign, no leading zeros.
fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty()
        || (segment.len() > 1 && segment.starts_with('0'))
        || !segment.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    segment.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_root_pointer_is_empty() {
        let pointer = JsonPointer::root();
        assert!(pointer.is_root());
        assert!(pointer.is_empty());
        assert_eq!(pointer.len(), 0);
        assert_eq!(pointer.to_string(), "#");
    }

    #[test]
    fn test_nested_segments() {
        let pointer = JsonPointer::root().append("properties").append("name");
        assert_eq!(pointer.to_string(), "#/properties/name");
        assert_eq!(pointer.len(), 2);
    }

    #[test]
    fn test_empty_segment_is_distinct_from_no_segment() {
        let root = JsonPointer::root();
        let empty = root.append("");
        assert_ne!(root, empty);
        assert_eq!(empty.to_string(), "#/");
        assert_eq!(empty.len(), 1);
    }

    #[test]
    fn test_escaping() {
        let pointer = JsonPointer::root().append("a/b").append("m~n");
        assert_eq!(pointer.to_string(), "#/a~1b/m~0n");
        assert_eq!(JsonPointer::parse(&pointer.to_rfc6901()).unwrap(), pointer);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(
            JsonPointer::parse("definitions"),
            Err(PointerError::MissingSlash("definitions".to_string()))
        );
        assert!(matches!(
            JsonPointer::parse("/a~2"),
            Err(PointerError::InvalidEscape(_))
        ));
    }

    #[test]
    fn test_from_fragment() {
        let pointer = JsonPointer::from_fragment("#/definitions/x").unwrap();
        assert_eq!(pointer, JsonPointer::from_segments(["definitions", "x"]));
        assert!(JsonPointer::from_fragment("#").unwrap().is_root());
        assert!(JsonPointer::from_fragment("").unwrap().is_root());
    }

    #[test]
    fn test_path_immutability() {
        let base = JsonPointer::root().append("items");
        let first = base.append_index(0);
        let second = base.append_index(1);

        assert_eq!(base.to_string(), "#/items");
        assert_eq!(first.to_string(), "#/items/0");
        assert_eq!(second.to_string(), "#/items/1");
    }

    #[test]
    fn test_join_is_associative() {
        let p = JsonPointer::from_segments(["a"]);
        let q = JsonPointer::from_segments(["b", ""]);
        let r = JsonPointer::from_segments(["c"]);

        assert_eq!(p.join(&q).join(&r), p.join(&q.join(&r)));
        assert_eq!(p.join(&q), p.append("b").append(""));
    }

    #[test]
    fn test_parent_and_last() {
        let pointer = JsonPointer::root().append("a").append("b");
        assert_eq!(pointer.last(), Some("b"));
        assert_eq!(pointer.parent().unwrap().to_string(), "#/a");
        assert!(JsonPointer::root().parent().is_none());
    }

    #[test]
    fn test_resolve() {
        let doc = json!({
            "definitions": { "x": { "type": "string" } },
            "items": [ { "a": 1 }, { "b": 2 } ],
            "": { "empty": true }
        });

        let x = JsonPointer::parse("/definitions/x").unwrap();
        assert_eq!(x.resolve(&doc), Some(&json!({ "type": "string" })));

        let item = JsonPointer::parse("/items/1/b").unwrap();
        assert_eq!(item.resolve(&doc), Some(&json!(2)));

        let empty = JsonPointer::root().append("").append("empty");
        assert_eq!(empty.resolve(&doc), Some(&json!(true)));

        assert!(JsonPointer::parse("/definitions/y").unwrap().resolve(&doc).is_none());
        assert!(JsonPointer::parse("/items/01").unwrap().resolve(&doc).is_none());
        assert!(JsonPointer::parse("/items/2").unwrap().resolve(&doc).is_none());
        assert!(JsonPointer::parse("/definitions/x/type/deeper")
            .unwrap()
            .resolve(&doc)
            .is_none());
    }
}
