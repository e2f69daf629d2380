//! # Atlas Mapping Engine
//!
//! Schema-driven translation between generated Kubernetes custom resources
//! and the request/response documents of a versioned cloud API.
//!
//! ## Overview
//!
//! A generated CRD carries an `api-mappings` annotation describing which of
//! its fields are references to other Kubernetes objects. The engine uses it
//! in two directions:
//!
//! 1. **Collapse** - replace each `{name, key}` reference in the custom
//!    resource with the value it points to (a Secret key, a field of a
//!    sibling resource) to build an API request.
//! 2. **Expand** - write an API response back into the custom resource,
//!    replacing sensitive or cross-resource values with references and
//!    producing the dependent objects (usually Secrets) that hold them.
//!
//! ## Modules
//!
//! - [`unstructured`]: path-based access to untyped documents
//! - [`schema`]: the mapping schema parsed from the annotation
//! - [`repository`]: the main object plus its known dependents
//! - [`refs`]: dereferencing and dependent naming
//! - [`mapper`]: the recursive expand/collapse walk
//! - [`translate`]: CRD-level entry points
//! - [`status`]: `Ready` condition for a translation outcome
//! - [`observability`]: Prometheus metrics

pub mod constants;
pub mod crd;
pub mod mapper;
pub mod observability;
pub mod refs;
pub mod repository;
pub mod schema;
pub mod status;
pub mod translate;
pub mod unstructured;

pub use mapper::{collapse, expand, Direction, MapperConfig, MappingError, MatchPolicy};
pub use repository::{ObjectKey, ObjectRepository};
pub use schema::{MappingSchema, SchemaError};
pub use status::Condition;
pub use translate::{TranslateError, Translator, TranslatorConfig};
pub use unstructured::{AccessError, FieldPath};
