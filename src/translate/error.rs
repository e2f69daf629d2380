//! # Translation Errors

use crate::crd::CrdError;
use crate::mapper::MappingError;
use crate::schema::SchemaError;
use crate::unstructured::{AccessError, FieldPath};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("failed to map {at}: {source}")]
    Mapping {
        at: FieldPath,
        #[source]
        source: MappingError,
    },

    #[error("invalid mapping schema: {0}")]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Crd(#[from] CrdError),

    #[error("object must be a {expected:?} but got {actual:?}")]
    GvkMismatch { expected: String, actual: String },

    #[error("object {name:?} has no spec.{major} object")]
    MissingSpec { name: String, major: String },

    #[error("API document must be an object but got {actual}")]
    NotAnObject { actual: &'static str },

    #[error("object validation failed against CRD schema: {}", errors.join("; "))]
    Validation { errors: Vec<String> },

    #[error("failed to prepare {at}: {source}")]
    Access {
        at: FieldPath,
        #[source]
        source: AccessError,
    },
}

impl TranslateError {
    /// Condition reason for this error
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Mapping { source, .. } => source.reason(),
            Self::Schema(_) => "InvalidMappingSchema",
            Self::Crd(_) => "InvalidCRD",
            Self::GvkMismatch { .. } => "KindMismatch",
            Self::MissingSpec { .. } => "MissingVersionedSpec",
            Self::NotAnObject { .. } => "InvalidAPIDocument",
            Self::Access { .. } => "InvalidDocument",
            Self::Validation { .. } => "SchemaValidationFailed",
        }
    }

    /// Transient errors may succeed once dependents appear in the cluster
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Mapping { source, .. } if source.is_transient())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_error_reason_passes_through() {
        let err = TranslateError::Mapping {
            at: FieldPath::parse("spec.v20250312"),
            source: MappingError::ReferenceFieldNotFound {
                path: FieldPath::parse("entry.passwordSecretRef"),
                name: "creds".to_string(),
                fields: vec!["data.password".to_string()],
            },
        };
        assert_eq!(err.reason(), "ReferenceFieldNotFound");
        assert!(err.is_transient());
        assert!(err.to_string().starts_with("failed to map [spec v20250312]: "));
    }

    #[test]
    fn test_structural_errors_are_permanent() {
        let err = TranslateError::MissingSpec {
            name: "team".to_string(),
            major: "v20250312".to_string(),
        };
        assert_eq!(err.reason(), "MissingVersionedSpec");
        assert!(!err.is_transient());
    }

    #[test]
    fn test_validation_error_lists_every_violation() {
        let err = TranslateError::Validation {
            errors: vec!["/spec/a: x".to_string(), "/spec/b: y".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "object validation failed against CRD schema: /spec/a: x; /spec/b: y"
        );
        assert_eq!(err.reason(), "SchemaValidationFailed");
        assert!(!err.is_transient());
    }
}
