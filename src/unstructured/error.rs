//! # Access Errors
//!
//! Failures navigating unstructured documents.

use super::path::FieldPath;
use thiserror::Error;

/// Error returned by the document accessors
///
/// Every variant carries the (prefix of the) path at which navigation failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("path {path} not found")]
    NotFound { path: FieldPath },
    #[error("path {path} is not an object")]
    NotObject { path: FieldPath },
    #[error("path {path} is not an array")]
    NotArray { path: FieldPath },
    #[error("path {path} holds a nil object")]
    NilObject { path: FieldPath },
    #[error("path {path} expected a value of type {expected} but got {actual}")]
    TypeMismatch {
        path: FieldPath,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("invalid path {path}: {reason}")]
    InvalidPath {
        path: FieldPath,
        reason: &'static str,
    },
}

impl AccessError {
    /// Check if the addressed field is simply absent
    ///
    /// Absence is the only condition the mapper recovers from (optional fields).
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, AccessError::NotFound { .. })
    }

    /// Path at which navigation failed
    #[must_use]
    pub fn path(&self) -> &FieldPath {
        match self {
            AccessError::NotFound { path }
            | AccessError::NotObject { path }
            | AccessError::NotArray { path }
            | AccessError::NilObject { path }
            | AccessError::TypeMismatch { path, .. }
            | AccessError::InvalidPath { path, .. } => path,
        }
    }
}
