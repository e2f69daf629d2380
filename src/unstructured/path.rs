//! # Field Paths
//!
//! Addresses into unstructured documents. A path is a list of field names
//! and array markers; numeric indices are deliberately not supported because
//! array entries are correlated by the fields they hold, never by position.

use crate::constants::ARRAY_SEGMENT;
use std::fmt;

/// A single step of a [`FieldPath`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    /// Descend into the named field of an object
    Field(String),
    /// Descend into the elements of an array, searching each for the rest of the path
    Elements,
}

impl Segment {
    /// Field name of this segment, `None` for the array marker
    #[must_use]
    pub fn as_field(&self) -> Option<&str> {
        match self {
            Segment::Field(name) => Some(name),
            Segment::Elements => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) => f.write_str(name),
            Segment::Elements => f.write_str(ARRAY_SEGMENT),
        }
    }
}

/// Ordered list of segments addressing a value inside a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    /// The empty path, addressing the document root
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dot separated path such as `spec.v1.[].name`
    ///
    /// Empty pieces are ignored, so `.name` and `name` are the same path.
    #[must_use]
    pub fn parse(dotted: &str) -> Self {
        let segments = dotted
            .split('.')
            .filter(|piece| !piece.is_empty())
            .map(|piece| {
                if piece == ARRAY_SEGMENT {
                    Segment::Elements
                } else {
                    Segment::Field(piece.to_string())
                }
            })
            .collect();
        Self { segments }
    }

    /// Build a path made only of field names
    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: fields
                .into_iter()
                .map(|field| Segment::Field(field.into()))
                .collect(),
        }
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Name of the last segment when it is a field
    #[must_use]
    pub fn base(&self) -> Option<&str> {
        self.segments.last().and_then(Segment::as_field)
    }

    /// Path without its last segment
    #[must_use]
    pub fn parent(&self) -> Self {
        let end = self.segments.len().saturating_sub(1);
        self.prefix(end)
    }

    /// First `len` segments of this path
    #[must_use]
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            segments: self.segments[..len.min(self.segments.len())].to_vec(),
        }
    }

    /// This path extended with a field
    #[must_use]
    pub fn child(&self, field: &str) -> Self {
        let mut path = self.clone();
        path.segments.push(Segment::Field(field.to_string()));
        path
    }

    /// This path extended with an array marker
    #[must_use]
    pub fn elements(&self) -> Self {
        let mut path = self.clone();
        path.segments.push(Segment::Elements);
        path
    }

    /// This path followed by all segments of `other`
    #[must_use]
    pub fn join(&self, other: &FieldPath) -> Self {
        let mut path = self.clone();
        path.segments.extend(other.segments.iter().cloned());
        path
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{segment}")?;
        }
        f.write_str("]")
    }
}

impl From<&str> for FieldPath {
    fn from(dotted: &str) -> Self {
        Self::parse(dotted)
    }
}

impl FromIterator<Segment> for FieldPath {
    fn from_iter<T: IntoIterator<Item = Segment>>(iter: T) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}
