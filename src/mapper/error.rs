//! # Mapping Errors
//!
//! Every failure aborts the whole expand/collapse call; absent optional
//! fields are the only condition recovered locally and never surface here.

use crate::refs::CodecError;
use crate::unstructured::{AccessError, FieldPath};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MappingError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("failed to find Kubernetes resource {name:?} in namespace {namespace:?} referenced at {path}")]
    ReferenceNotFound {
        path: FieldPath,
        name: String,
        namespace: String,
    },

    #[error("resource {name:?} referenced at {path} has none of the fields {fields:?}")]
    ReferenceFieldNotFound {
        path: FieldPath,
        name: String,
        fields: Vec<String>,
    },

    #[error("resource {name:?} referenced at {path} had to be a {expected:?} but got {actual:?}")]
    ReferenceKindMismatch {
        path: FieldPath,
        name: String,
        expected: String,
        actual: String,
    },

    #[error("unsupported mapping of type {type_name} at {path}")]
    UnsupportedMapping {
        path: FieldPath,
        type_name: &'static str,
    },

    #[error("unsupported extension at {path} with fields {fields:?}")]
    UnsupportedSchemaShape { path: FieldPath, fields: Vec<String> },

    #[error("{count} elements of array {path} carry the matching key {key:?}")]
    AmbiguousMatch {
        path: FieldPath,
        key: String,
        count: usize,
    },

    #[error("failed to convert value of reference {path}: {source}")]
    Codec {
        path: FieldPath,
        #[source]
        source: CodecError,
    },

    #[error("invalid reference at {path}: {reason}")]
    InvalidReference { path: FieldPath, reason: &'static str },

    #[error("failed to convert Kubernetes object {name:?}: {source}")]
    Conversion {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

impl MappingError {
    /// CamelCase reason used for status conditions and metric labels
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            MappingError::Access(_) => "InvalidDocument",
            MappingError::ReferenceNotFound { .. } => "ReferenceNotFound",
            MappingError::ReferenceFieldNotFound { .. } => "ReferenceFieldNotFound",
            MappingError::ReferenceKindMismatch { .. } => "ReferenceKindMismatch",
            MappingError::UnsupportedMapping { .. } => "UnsupportedMapping",
            MappingError::UnsupportedSchemaShape { .. } => "UnsupportedSchemaShape",
            MappingError::AmbiguousMatch { .. } => "AmbiguousMatch",
            MappingError::Codec { .. } => "ValueCodecFailed",
            MappingError::InvalidReference { .. } => "InvalidReference",
            MappingError::Conversion { .. } => "ObjectConversionFailed",
        }
    }

    /// Check if a later retry may succeed without any change to the mapping
    ///
    /// Only reference targets that do not exist (or are not populated) yet
    /// qualify: the referenced object may appear after its own reconciliation.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MappingError::ReferenceNotFound { .. } | MappingError::ReferenceFieldNotFound { .. }
        )
    }

    /// Check if this is a reference resolution failure
    #[must_use]
    pub fn is_reference_failure(&self) -> bool {
        matches!(
            self,
            MappingError::ReferenceNotFound { .. }
                | MappingError::ReferenceFieldNotFound { .. }
                | MappingError::ReferenceKindMismatch { .. }
        )
    }
}
