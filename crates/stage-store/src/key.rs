// key.rs — Keys and namespace paths.
//
// A Key addresses one child of a composite node. Mappings are addressed by
// string keys and lists by position; the conversions between the two are
// fixed here so every operation agrees on them.

use std::fmt;

use crate::error::StoreError;

/// One segment of a namespace path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A list position (or, on a mapping, its decimal string).
    Index(usize),
    /// A mapping key (or, on a list, a decimal position).
    Name(String),
}

impl Key {
    /// The key as used on a mapping node.
    pub fn as_name(&self) -> String {
        match self {
            Key::Index(i) => i.to_string(),
            Key::Name(s) => s.clone(),
        }
    }

    /// The key as used on a list node. `None` for non-numeric names.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Index(i) => Some(*i),
            Key::Name(s) => parse_index(s),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(i) => write!(f, "{}", i),
            Key::Name(s) => f.write_str(s),
        }
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Key::Index(i)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Name(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Name(s)
    }
}

impl From<&Key> for Key {
    fn from(k: &Key) -> Self {
        k.clone()
    }
}

/// Decimal index without sign or leading zeros ("0" is allowed).
fn parse_index(s: &str) -> Option<usize> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if s.len() > 1 && s.starts_with('0') {
        return None;
    }
    s.parse().ok()
}

/// Ordered keys from the root of a tree to a namespace's view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NamespacePath {
    segments: Vec<Key>,
}

impl NamespacePath {
    /// The empty path, addressing the root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dotted string like `baz.a.0`. All-digit segments become
    /// indices. An empty string is the root.
    pub fn parse(input: &str) -> Result<Self, StoreError> {
        let input = input.trim();
        if input.is_empty() || input == "$" {
            return Ok(Self::root());
        }
        let mut segments = Vec::new();
        for part in input.split('.') {
            if part.is_empty() {
                return Err(StoreError::InvalidPath {
                    path: input.to_string(),
                    reason: "empty segment".into(),
                });
            }
            segments.push(match parse_index(part) {
                Some(i) => Key::Index(i),
                None => Key::Name(part.to_string()),
            });
        }
        Ok(Self { segments })
    }

    /// A new path one segment deeper.
    pub fn child(&self, key: impl Into<Key>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(key.into());
        Self { segments }
    }

    /// The path without its last segment, and that segment.
    pub fn split_last(&self) -> Option<(NamespacePath, &Key)> {
        let (last, parent) = self.segments.split_last()?;
        Some((
            NamespacePath {
                segments: parent.to_vec(),
            },
            last,
        ))
    }

    pub fn segments(&self) -> &[Key] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for NamespacePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for seg in &self.segments {
            match seg {
                Key::Index(i) => write!(f, "[{}]", i)?,
                Key::Name(s) => write!(f, ".{}", s)?,
            }
        }
        Ok(())
    }
}
