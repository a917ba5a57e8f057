use std::{
    fmt,
    hash::{Hash, Hasher},
    ops::Deref,
    str::FromStr,
};

use non_empty_string::NonEmptyString;

/// A validated kebab-case identifier segment (`[a-z0-9]+(-[a-z0-9]+)*`).
///
/// Used for the layer and type halves of a [`SpecNodeId`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Segment(NonEmptyString);

impl Segment {
    /// Creates a new `Segment` from a string.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidSegmentError`] if the string is empty, contains
    /// characters other than lowercase letters, digits and hyphens, or has a
    /// leading, trailing or doubled hyphen.
    pub fn new(s: String) -> Result<Self, InvalidSegmentError> {
        if !is_kebab_case(&s) {
            return Err(InvalidSegmentError(s));
        }
        let non_empty = NonEmptyString::new(s).map_err(InvalidSegmentError)?;
        Ok(Self(non_empty))
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Returns `true` if `s` is non-empty kebab-case: lowercase ASCII letters and
/// digits separated by single hyphens.
#[must_use]
pub fn is_kebab_case(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('-')
        && !s.ends_with('-')
        && !s.contains("--")
        && s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

impl Hash for Segment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl TryFrom<&str> for Segment {
    type Error = InvalidSegmentError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl AsRef<str> for Segment {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl Deref for Segment {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a string is not a kebab-case segment.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error(
    "Invalid segment '{0}': must be non-empty and contain only lowercase letters, digits and \
     single hyphens"
)]
pub struct InvalidSegmentError(String);

/// Identifier of a registered node type.
///
/// Format: `{layer}.{type}`, where both halves are kebab-case segments.
///
/// Examples: `business.service`, `data-model.entity`, `testing.test-case`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpecNodeId {
    layer: Segment,
    node_type: Segment,
}

impl SpecNodeId {
    /// Create a spec node id from pre-validated segments.
    #[must_use]
    pub const fn new(layer: Segment, node_type: Segment) -> Self {
        Self { layer, node_type }
    }

    /// Build a spec node id from an element's declared layer and type.
    ///
    /// # Errors
    ///
    /// Returns an error if either half is not kebab-case.
    pub fn from_parts(layer: &str, node_type: &str) -> Result<Self, Error> {
        Ok(Self::new(
            Segment::try_from(layer)?,
            Segment::try_from(node_type)?,
        ))
    }

    /// The layer half of the id.
    #[must_use]
    pub fn layer(&self) -> &str {
        self.layer.as_str()
    }

    /// The type half of the id.
    #[must_use]
    pub fn node_type(&self) -> &str {
        self.node_type.as_str()
    }
}

impl fmt::Display for SpecNodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.layer, self.node_type)
    }
}

/// Errors that can occur while parsing a [`SpecNodeId`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// The string is not of the form `{layer}.{type}`.
    #[error("Invalid spec node id '{0}': expected '{{layer}}.{{type}}'")]
    Syntax(String),

    /// One of the halves is not kebab-case.
    #[error(transparent)]
    Segment(#[from] InvalidSegmentError),
}

impl FromStr for SpecNodeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((layer, node_type)) = s.split_once('.') else {
            return Err(Error::Syntax(s.to_string()));
        };
        if node_type.contains('.') {
            return Err(Error::Syntax(s.to_string()));
        }
        Self::from_parts(layer, node_type)
    }
}

impl TryFrom<&str> for SpecNodeId {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_str(value)
    }
}

impl TryFrom<String> for SpecNodeId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value)
    }
}

impl From<SpecNodeId> for String {
    fn from(id: SpecNodeId) -> Self {
        id.to_string()
    }
}

impl serde::Serialize for SpecNodeId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for SpecNodeId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}
