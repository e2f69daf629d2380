//! # Unstructured Documents
//!
//! Generic navigation of Kubernetes and API documents without compile-time
//! knowledge of their shape.
//!
//! - `path`: [`FieldPath`] addressing with the array search marker
//! - `access`: typed accessors and field creation
//! - `error`: [`AccessError`]

mod access;
mod error;
mod path;

pub use access::{
    access_field, access_field_mut, access_field_object, access_field_object_mut, copy_fields,
    create_field, fields_of, get_or_create_field, get_or_create_object, recursive_create_field,
    type_name, FieldType, Object,
};
pub use error::AccessError;
pub use path::{FieldPath, Segment};
