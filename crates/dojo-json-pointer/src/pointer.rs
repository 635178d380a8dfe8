//! The [`Pointer`] path type.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::get::get;
use crate::util::{format_pointer, parse_pointer};
use crate::walk::{walk, PointerTarget};
use crate::PointerError;

/// An immutable JSON Pointer.
///
/// Holds the decoded segments; the canonical string form is derived on
/// demand. A pointer with no segments addresses the root value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Pointer {
    segments: Vec<String>,
}

impl Pointer {
    /// Parse a pointer string. The leading `/` is optional and `""` is the
    /// root.
    pub fn new(pointer: &str) -> Self {
        Self {
            segments: parse_pointer(pointer),
        }
    }

    /// Build a pointer from already-decoded segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// The root pointer.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The canonical, escaped string form.
    pub fn path(&self) -> String {
        format_pointer(&self.segments)
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// A new pointer with `segment` appended.
    pub fn push(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Resolve the pointer against `object`; `None` when anything along the
    /// way is missing.
    pub fn get<'a>(&self, object: &'a Value) -> Option<&'a Value> {
        get(object, &self.segments)
    }

    /// Walk to the slot this pointer addresses, see [`walk`].
    pub fn walk<'a>(
        &self,
        object: &'a mut Value,
        create_missing: bool,
    ) -> Result<Option<PointerTarget<'a>>, PointerError> {
        walk(&self.segments, object, create_missing)
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl FromStr for Pointer {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Pointer {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Pointer {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl Serialize for Pointer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.path())
    }
}

struct PointerVisitor;

impl Visitor<'_> for PointerVisitor {
    type Value = Pointer;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON pointer string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Pointer, E> {
        Ok(Pointer::new(v))
    }
}

impl<'de> Deserialize<'de> for Pointer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(PointerVisitor)
    }
}
