//! Document paths: `users[1].favorites.musics[24].title`.
//!
//! A path is a sequence of attributes. Keys follow a `.` (or start the path) and
//! indices are written in brackets. Inside a key, `\.`, `\[` and `\\` stand for the
//! literal characters. Whether an attribute is a key or an index is decided by where
//! it appears, never by its content: `a.3` addresses the key `"3"`.

use std::fmt::{self, Write as _};
use std::iter::Peekable;
use std::str::Chars;

use crate::config;
use crate::errors::{DocError, Result};
use crate::value::{UNDEFINED, Value};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Attribute {
    Key(String),
    Index(usize),
}

impl Attribute {
    /// Index view: an index, or a key made only of ASCII digits.
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(i) => Some(*i),
            Self::Key(k) if !k.is_empty() && k.bytes().all(|b| b.is_ascii_digit()) => k.parse().ok(),
            Self::Key(_) => None,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) => f.write_str(k),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Attribute {
    fn from(s: &str) -> Self {
        Self::Key(s.to_string())
    }
}

impl From<String> for Attribute {
    fn from(s: String) -> Self {
        Self::Key(s)
    }
}

impl From<usize> for Attribute {
    fn from(i: usize) -> Self {
        Self::Index(i)
    }
}

/// Build a document path string from attributes.
///
/// ```
/// use docops::document_path;
/// assert_eq!(document_path!("users", 1, "name"), "users[1].name");
/// ```
#[macro_export]
macro_rules! document_path {
    ($($attr:expr),* $(,)?) => {
        $crate::path::create_document_path(&[$($crate::path::Attribute::from($attr)),*])
    };
}

/// Parse a document path into its attributes. The empty path has no attributes.
///
/// # Errors
/// `MalformedPath` for an unterminated or non-numeric bracket, characters after `]`
/// other than `.` or `[`, an index that overflows, or more attributes than the
/// configured maximum depth.
pub fn parse_document_path(path: &str) -> Result<Vec<Attribute>> {
    let mut attrs = Vec::new();
    if path.is_empty() {
        return Ok(attrs);
    }
    let mut chars = path.chars().peekable();
    if chars.peek() != Some(&'[') {
        attrs.push(Attribute::Key(read_key(&mut chars)));
    }
    while let Some(c) = chars.next() {
        match c {
            '.' => attrs.push(Attribute::Key(read_key(&mut chars))),
            '[' => attrs.push(Attribute::Index(read_index(path, &mut chars)?)),
            other => {
                return Err(DocError::malformed(path, format!("unexpected '{other}' after ']'")));
            }
        }
    }
    if let Some(max_depth) = config::max_path_depth().filter(|max| attrs.len() > *max) {
        return Err(DocError::malformed(path, format!("deeper than {max_depth} attributes")));
    }
    Ok(attrs)
}

fn read_key(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut key = String::new();
    while let Some(&c) = chars.peek() {
        match c {
            '.' | '[' => break,
            '\\' => {
                chars.next();
                key.push(chars.next().unwrap_or('\\'));
            }
            _ => {
                chars.next();
                key.push(c);
            }
        }
    }
    key
}

fn read_index(path: &str, chars: &mut Peekable<Chars<'_>>) -> Result<usize> {
    let mut digits = String::new();
    loop {
        match chars.next() {
            Some(']') => break,
            Some(c) if c.is_ascii_digit() => digits.push(c),
            Some(c) => {
                return Err(DocError::malformed(path, format!("'{c}' inside an array index")));
            }
            None => return Err(DocError::malformed(path, "unterminated '['")),
        }
    }
    if digits.is_empty() {
        return Err(DocError::malformed(path, "empty array index"));
    }
    digits.parse::<usize>().map_err(|e| DocError::malformed(path, format!("index {digits}: {e}")))
}

/// Serialize attributes into a document path; the inverse of [`parse_document_path`].
///
/// The one exception is an empty key in first position with nothing or an index
/// after it: `[""]` serializes like `[]`, and `["", 0]` like `[0]`, since the
/// grammar gives a leading `[` to the index.
#[must_use]
pub fn create_document_path(attrs: &[Attribute]) -> String {
    let mut out = String::new();
    for attr in attrs {
        match attr {
            Attribute::Key(k) => {
                out.push('.');
                for c in k.chars() {
                    if matches!(c, '.' | '[' | '\\') {
                        out.push('\\');
                    }
                    out.push(c);
                }
            }
            Attribute::Index(i) => {
                let _ = write!(out, "[{i}]");
            }
        }
    }
    if out.starts_with('.') {
        out.remove(0);
    }
    out
}

/// Rewrite `[N]` segments as `.N`, the dotted form MongoDB expects.
#[must_use]
pub fn convert_to_dot_notation(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut chars = path.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '[' => {
                let mut digits = String::new();
                while let Some(&d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                    digits.push(d);
                    chars.next();
                }
                if !digits.is_empty() && chars.peek() == Some(&']') {
                    chars.next();
                    out.push('.');
                } else {
                    out.push('[');
                }
                out.push_str(&digits);
            }
            _ => out.push(c),
        }
    }
    if path.starts_with('[') && out.starts_with('.') {
        out.remove(0);
    }
    out
}

/// Value at `path`, or `Undefined` when any step is missing.
///
/// # Errors
/// Only when `path` is malformed.
pub fn get_nested_value<'a>(doc: &'a Value, path: &str) -> Result<&'a Value> {
    Ok(get_by_attributes(doc, &parse_document_path(path)?))
}

pub(crate) fn get_by_attributes<'a>(doc: &'a Value, attrs: &[Attribute]) -> &'a Value {
    let mut cur = doc;
    for attr in attrs {
        match cur.child(attr) {
            Some(next) => cur = next,
            None => return &UNDEFINED,
        }
    }
    cur
}

/// Like [`get_nested_value`], but stepping into `null` or `undefined` is an error.
/// Stepping into any other scalar still yields `Undefined`.
///
/// # Errors
/// `PathNotFound` naming the attribute that could not be read, or `MalformedPath`.
pub fn get_nested_value_strict<'a>(doc: &'a Value, path: &str) -> Result<&'a Value> {
    let mut cur = doc;
    for attr in parse_document_path(path)? {
        if cur.is_nullish() {
            return Err(DocError::PathNotFound {
                path: path.to_string(),
                attribute: attr.to_string(),
            });
        }
        cur = cur.child(&attr).unwrap_or(&UNDEFINED);
    }
    Ok(cur)
}

/// Whether every step of `path` is an own slot of the container before it.
///
/// # Errors
/// Only when `path` is malformed.
pub fn has_own_nested_property(doc: &Value, path: &str) -> Result<bool> {
    let mut cur = doc;
    for attr in parse_document_path(path)? {
        if !cur.has_own(&attr) {
            return Ok(false);
        }
        cur = cur.child(&attr).unwrap_or(&UNDEFINED);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(attrs: &[&str]) -> Vec<Attribute> {
        attrs.iter().map(|a| Attribute::from(*a)).collect()
    }

    #[test]
    fn parses_mixed_path() {
        let attrs = parse_document_path("users[1].favorites.musics[24].title.3.value").unwrap();
        assert_eq!(
            attrs,
            vec![
                Attribute::from("users"),
                Attribute::Index(1),
                Attribute::from("favorites"),
                Attribute::from("musics"),
                Attribute::Index(24),
                Attribute::from("title"),
                Attribute::from("3"),
                Attribute::from("value"),
            ]
        );
    }

    #[test]
    fn leading_index_and_empty_path() {
        assert!(parse_document_path("").unwrap().is_empty());
        assert_eq!(
            parse_document_path("[0].name").unwrap(),
            vec![Attribute::Index(0), Attribute::from("name")]
        );
    }

    #[test]
    fn escaped_characters_stay_in_key() {
        assert_eq!(parse_document_path(r"user.name\.profile").unwrap(), keys(&["user", "name.profile"]));
        assert_eq!(parse_document_path(r"a\[0]").unwrap(), keys(&["a[0]"]));
        assert_eq!(create_document_path(&keys(&["a[0]", r"b\c"])), r"a\[0].b\\c");
    }

    #[test]
    fn empty_keys_round_trip_except_leading() {
        let inner = vec![Attribute::from("a"), Attribute::from(""), Attribute::Index(1), Attribute::from("")];
        assert_eq!(create_document_path(&inner), "a.[1].");
        assert_eq!(parse_document_path("a.[1].").unwrap(), inner);
        let leading = vec![Attribute::from(""), Attribute::from("b")];
        assert_eq!(parse_document_path(&create_document_path(&leading)).unwrap(), leading);

        assert_eq!(create_document_path(&[Attribute::from(""), Attribute::Index(0)]), "[0]");
        assert_eq!(create_document_path(&[Attribute::from("")]), "");
    }

    #[test]
    fn depth_is_unlimited_by_default() {
        let attrs: Vec<Attribute> = (0..300).map(|i| Attribute::Key(format!("k{i}"))).collect();
        assert_eq!(parse_document_path(&create_document_path(&attrs)).unwrap(), attrs);
    }

    #[test]
    fn malformed_brackets() {
        for bad in ["a[", "a[x]", "a[]", "a[1]b", "a[99999999999999999999999]"] {
            assert!(
                matches!(parse_document_path(bad), Err(DocError::MalformedPath { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn dot_notation() {
        assert_eq!(convert_to_dot_notation("users[1].name[20]"), "users.1.name.20");
        assert_eq!(convert_to_dot_notation("[1].name"), "1.name");
        assert_eq!(convert_to_dot_notation(r"a\[1]"), r"a\[1]");
    }

    #[test]
    fn strict_lookup_reports_missing_segment() {
        let doc = Value::from(json!({"a": {"b": null}, "n": 3}));
        assert_eq!(get_nested_value(&doc, "a.b.c").unwrap(), &Value::Undefined);
        assert_eq!(get_nested_value_strict(&doc, "n.x").unwrap(), &Value::Undefined);
        match get_nested_value_strict(&doc, "a.b.c") {
            Err(DocError::PathNotFound { attribute, .. }) => assert_eq!(attribute, "c"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn own_property_walk() {
        let doc = Value::from(json!({"a": {"b": null}, "list": [1, 2]}));
        assert!(has_own_nested_property(&doc, "a.b").unwrap());
        assert!(!has_own_nested_property(&doc, "a.b.c").unwrap());
        assert!(has_own_nested_property(&doc, "list[1]").unwrap());
        assert!(!has_own_nested_property(&doc, "list[2]").unwrap());
    }
}
