//! # Document Accessors
//!
//! Typed get/set/create operations over `serde_json::Value` trees.
//!
//! All navigation goes through [`locate`], which turns a [`FieldPath`] into a
//! trail of concrete steps (object keys and the indices of matching array
//! elements). Read and write accessors then follow the same trail, so both
//! agree on which array element a path designates.

use super::error::AccessError;
use super::path::{FieldPath, Segment};
use serde_json::{Map, Value};

/// An unstructured object node
pub type Object = Map<String, Value>;

/// Name of the runtime type of a document node, as used in error messages
#[must_use]
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Leaf or subtree type a caller expects at the end of a path
pub trait FieldType<'a>: Sized {
    /// Name reported in [`AccessError::TypeMismatch`]
    const TYPE_NAME: &'static str;

    fn from_value(value: &'a Value) -> Option<Self>;
}

impl<'a> FieldType<'a> for &'a Value {
    const TYPE_NAME: &'static str = "any";

    fn from_value(value: &'a Value) -> Option<Self> {
        Some(value)
    }
}

impl<'a> FieldType<'a> for &'a Object {
    const TYPE_NAME: &'static str = "object";

    fn from_value(value: &'a Value) -> Option<Self> {
        value.as_object()
    }
}

impl<'a> FieldType<'a> for &'a [Value] {
    const TYPE_NAME: &'static str = "array";

    fn from_value(value: &'a Value) -> Option<Self> {
        value.as_array().map(Vec::as_slice)
    }
}

impl<'a> FieldType<'a> for &'a str {
    const TYPE_NAME: &'static str = "string";

    fn from_value(value: &'a Value) -> Option<Self> {
        value.as_str()
    }
}

impl FieldType<'_> for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FieldType<'_> for i64 {
    const TYPE_NAME: &'static str = "integer";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64()
    }
}

impl FieldType<'_> for f64 {
    const TYPE_NAME: &'static str = "number";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

#[derive(Debug, Clone, Copy)]
enum Step<'p> {
    Key(&'p str),
    Index(usize),
}

/// Walk `path.segments()[depth..end]` from `current`, recording the steps taken
fn locate<'p>(
    current: &Value,
    path: &'p FieldPath,
    depth: usize,
    end: usize,
    trail: &mut Vec<Step<'p>>,
) -> Result<(), AccessError> {
    if depth >= end {
        return Ok(());
    }
    let is_last = depth + 1 == end;
    match &path.segments()[depth] {
        Segment::Field(name) => {
            let object = current.as_object().ok_or_else(|| AccessError::NotObject {
                path: path.prefix(depth),
            })?;
            let next = object
                .get(name.as_str())
                .ok_or_else(|| AccessError::NotFound {
                    path: path.prefix(depth + 1),
                })?;
            if next.is_null() && !is_last {
                return Err(AccessError::NilObject {
                    path: path.prefix(depth + 1),
                });
            }
            trail.push(Step::Key(name));
            locate(next, path, depth + 1, end, trail)
        }
        Segment::Elements => {
            let items = current.as_array().ok_or_else(|| AccessError::NotArray {
                path: path.prefix(depth),
            })?;
            if is_last {
                return Ok(());
            }
            for (index, item) in items.iter().enumerate() {
                let mark = trail.len();
                trail.push(Step::Index(index));
                match locate(item, path, depth + 1, end, trail) {
                    Err(err) if err.is_not_found() => trail.truncate(mark),
                    result => return result,
                }
            }
            Err(AccessError::NotFound {
                path: path.prefix(end),
            })
        }
    }
}

fn follow<'a>(mut current: &'a Value, trail: &[Step<'_>]) -> Option<&'a Value> {
    for step in trail {
        current = match *step {
            Step::Key(key) => current.get(key)?,
            Step::Index(index) => current.get(index)?,
        };
    }
    Some(current)
}

fn follow_mut<'a>(mut current: &'a mut Value, trail: &[Step<'_>]) -> Option<&'a mut Value> {
    for step in trail {
        current = match *step {
            Step::Key(key) => current.get_mut(key)?,
            Step::Index(index) => current.get_mut(index)?,
        };
    }
    Some(current)
}

fn trail_to<'p>(doc: &Value, path: &'p FieldPath) -> Result<Vec<Step<'p>>, AccessError> {
    let mut trail = Vec::with_capacity(path.len());
    locate(doc, path, 0, path.len(), &mut trail)?;
    Ok(trail)
}

/// Trail to the object holding the last field of `path`
///
/// When the parent resolves to an array, the first element holding the field
/// is selected.
fn holder_trail<'p>(doc: &Value, path: &'p FieldPath) -> Result<Vec<Step<'p>>, AccessError> {
    let field = path.base().ok_or_else(|| AccessError::InvalidPath {
        path: path.clone(),
        reason: "the last segment must be a field name",
    })?;
    let mut trail = Vec::with_capacity(path.len());
    locate(doc, path, 0, path.len() - 1, &mut trail)?;
    let not_found = || AccessError::NotFound { path: path.clone() };
    match follow(doc, &trail).ok_or_else(not_found)? {
        Value::Array(items) => {
            let index = items
                .iter()
                .position(|item| item.as_object().is_some_and(|o| o.contains_key(field)))
                .ok_or_else(not_found)?;
            trail.push(Step::Index(index));
            Ok(trail)
        }
        Value::Object(object) if object.contains_key(field) => Ok(trail),
        Value::Object(_) => Err(not_found()),
        _ => Err(AccessError::NotObject {
            path: path.parent(),
        }),
    }
}

/// Read the value at `path`, checked against the expected type `T`
///
/// # Errors
///
/// [`AccessError::NotFound`] when a field is absent (or no array element holds
/// the rest of the path), [`AccessError::NotObject`]/[`AccessError::NotArray`]
/// when the document shape does not match the path, [`AccessError::NilObject`]
/// when an intermediate field is null and [`AccessError::TypeMismatch`] when
/// the leaf is not a `T`.
pub fn access_field<'a, T: FieldType<'a>>(doc: &'a Value, path: &FieldPath) -> Result<T, AccessError> {
    let trail = trail_to(doc, path)?;
    let value = follow(doc, &trail).ok_or_else(|| AccessError::NotFound { path: path.clone() })?;
    T::from_value(value).ok_or_else(|| AccessError::TypeMismatch {
        path: path.clone(),
        expected: T::TYPE_NAME,
        actual: type_name(value),
    })
}

/// Mutable access to the value at `path`
///
/// # Errors
///
/// Same as [`access_field`], without the type check.
pub fn access_field_mut<'a>(doc: &'a mut Value, path: &FieldPath) -> Result<&'a mut Value, AccessError> {
    let trail = trail_to(doc, path)?;
    follow_mut(doc, &trail).ok_or_else(|| AccessError::NotFound { path: path.clone() })
}

/// Object holding the last field of `path`
///
/// # Errors
///
/// [`AccessError::NotFound`] when no holder carries the field.
pub fn access_field_object<'a>(doc: &'a Value, path: &FieldPath) -> Result<&'a Object, AccessError> {
    let trail = holder_trail(doc, path)?;
    follow(doc, &trail)
        .and_then(Value::as_object)
        .ok_or_else(|| AccessError::NotFound { path: path.clone() })
}

/// Mutable variant of [`access_field_object`]
///
/// # Errors
///
/// Same as [`access_field_object`].
pub fn access_field_object_mut<'a>(doc: &'a mut Value, path: &FieldPath) -> Result<&'a mut Object, AccessError> {
    let trail = holder_trail(doc, path)?;
    follow_mut(doc, &trail)
        .and_then(Value::as_object_mut)
        .ok_or_else(|| AccessError::NotFound { path: path.clone() })
}

/// Set `value` at `path`, whose parent must already exist
///
/// A path whose leaf is, or directly follows, an array marker appends the
/// value to that array.
///
/// # Errors
///
/// [`AccessError::InvalidPath`] for an empty path or a path starting with an
/// array marker, otherwise the errors of resolving the parent.
pub fn create_field(doc: &mut Value, value: Value, path: &FieldPath) -> Result<(), AccessError> {
    let segments = path.segments();
    match segments.first() {
        None => {
            return Err(AccessError::InvalidPath {
                path: path.clone(),
                reason: "at least one segment is required",
            })
        }
        Some(Segment::Elements) => {
            return Err(AccessError::InvalidPath {
                path: path.clone(),
                reason: "the root of a document must be an object",
            })
        }
        Some(Segment::Field(_)) => {}
    }

    let len = segments.len();
    let appends = segments[len - 1] == Segment::Elements
        || (len >= 2 && segments[len - 2] == Segment::Elements);
    if appends {
        let array_path = path.parent();
        let target = access_field_mut(doc, &array_path)?;
        let items = target
            .as_array_mut()
            .ok_or_else(|| AccessError::NotArray { path: array_path.clone() })?;
        items.push(value);
        return Ok(());
    }

    let Some(field) = path.base() else {
        return Err(AccessError::InvalidPath {
            path: path.clone(),
            reason: "the last segment must be a field name",
        });
    };
    let parent_path = path.parent();
    let parent = if parent_path.is_empty() {
        doc
    } else {
        access_field_mut(doc, &parent_path)?
    };
    let object = parent
        .as_object_mut()
        .ok_or_else(|| AccessError::NotObject { path: parent_path.clone() })?;
    object.insert(field.to_string(), value);
    Ok(())
}

/// Set `value` at `path`, creating every missing intermediate node first
///
/// Missing intermediates become empty objects, or empty arrays when the next
/// segment is an array marker.
///
/// # Errors
///
/// Any error other than [`AccessError::NotFound`] met while probing the path,
/// or the errors of [`create_field`].
pub fn recursive_create_field(doc: &mut Value, value: Value, path: &FieldPath) -> Result<(), AccessError> {
    let segments = path.segments();
    for len in 1..segments.len() {
        let prefix = path.prefix(len);
        match access_field::<&Value>(doc, &prefix) {
            Ok(_) => {}
            Err(err) if err.is_not_found() => {
                let empty = if segments[len] == Segment::Elements {
                    Value::Array(Vec::new())
                } else {
                    Value::Object(Map::new())
                };
                match prefix.base() {
                    Some(field) if len >= 2 && segments[len - 2] == Segment::Elements => {
                        let mut element = Map::new();
                        element.insert(field.to_string(), empty);
                        create_field(doc, Value::Object(element), &prefix)?;
                    }
                    _ => create_field(doc, empty, &prefix)?,
                }
            }
            Err(err) => return Err(err),
        }
    }
    create_field(doc, value, path)
}

/// Existing value at `path`, or `default` created there when absent
///
/// # Errors
///
/// Any error other than [`AccessError::NotFound`].
pub fn get_or_create_field<'a>(
    doc: &'a mut Value,
    default: Value,
    path: &FieldPath,
) -> Result<&'a mut Value, AccessError> {
    match access_field::<&Value>(doc, path) {
        Ok(_) => {}
        Err(err) if err.is_not_found() => recursive_create_field(doc, default, path)?,
        Err(err) => return Err(err),
    }
    access_field_mut(doc, path)
}

/// Existing object at `path`, or an empty one created there when absent
///
/// # Errors
///
/// [`AccessError::TypeMismatch`] when a non-object value already exists at `path`.
pub fn get_or_create_object<'a>(doc: &'a mut Value, path: &FieldPath) -> Result<&'a mut Object, AccessError> {
    let value = get_or_create_field(doc, Value::Object(Map::new()), path)?;
    let actual = type_name(value);
    value.as_object_mut().ok_or_else(|| AccessError::TypeMismatch {
        path: path.clone(),
        expected: "object",
        actual,
    })
}

/// Shallow copy of every field of `source` into `target`
pub fn copy_fields(target: &mut Object, source: &Object) {
    for (key, value) in source {
        target.insert(key.clone(), value.clone());
    }
}

/// Sorted field names of an object, for error messages
#[must_use]
pub fn fields_of(object: &Object) -> Vec<String> {
    let mut fields: Vec<String> = object.keys().cloned().collect();
    fields.sort();
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(dotted: &str) -> FieldPath {
        FieldPath::parse(dotted)
    }

    #[test]
    fn test_recursive_create_then_access_round_trip() {
        let mut doc = json!({});
        recursive_create_field(&mut doc, json!("proj1"), &path("spec.v1.entry.name")).unwrap();

        assert_eq!(
            access_field::<&str>(&doc, &path("spec.v1.entry.name")).unwrap(),
            "proj1"
        );
        assert_eq!(doc, json!({"spec": {"v1": {"entry": {"name": "proj1"}}}}));
    }

    #[test]
    fn test_array_search_returns_first_match() {
        let doc = json!({"roles": [{"key": "roleA", "val": 1}, {"key": "roleB", "val": 2}]});

        assert_eq!(
            access_field::<&str>(&doc, &path("roles.[].key")).unwrap(),
            "roleA"
        );
        let holder = access_field_object(&doc, &path("roles.[].key")).unwrap();
        assert_eq!(Value::Object(holder.clone()), json!({"key": "roleA", "val": 1}));
    }

    #[test]
    fn test_array_search_skips_elements_without_the_field() {
        let doc = json!({"items": [{"other": 1}, {"wanted": {"deep": true}}]});

        assert!(access_field::<bool>(&doc, &path("items.[].wanted.deep")).unwrap());
        let err = access_field::<&Value>(&doc, &path("items.[].missing")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_array_search_stops_at_non_object_element() {
        let doc = json!({"items": [1, {"wanted": true}]});
        let err = access_field::<bool>(&doc, &path("items.[].wanted")).unwrap_err();
        assert_eq!(err, AccessError::NotObject { path: path("items.[]") });
    }

    #[test]
    fn test_trailing_array_marker_returns_whole_array() {
        let doc = json!({"items": [1, 2, 3]});
        let items = access_field::<&[Value]>(&doc, &path("items.[]")).unwrap();
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn test_missing_field_is_not_found() {
        let doc = json!({"spec": {}});
        let err = access_field::<&Value>(&doc, &path("spec.v1")).unwrap_err();
        assert_eq!(err, AccessError::NotFound { path: path("spec.v1") });
        assert_eq!(err.to_string(), "path [spec v1] not found");
    }

    #[test]
    fn test_null_intermediate_is_nil_object() {
        let doc = json!({"spec": null});
        let err = access_field::<&Value>(&doc, &path("spec.v1")).unwrap_err();
        assert_eq!(err, AccessError::NilObject { path: path("spec") });
    }

    #[test]
    fn test_null_leaf_is_returned() {
        let doc = json!({"spec": null});
        assert!(access_field::<&Value>(&doc, &path("spec")).unwrap().is_null());
    }

    #[test]
    fn test_shape_errors() {
        let doc = json!({"spec": "scalar", "list": {"a": 1}});
        assert!(matches!(
            access_field::<&Value>(&doc, &path("spec.v1")),
            Err(AccessError::NotObject { .. })
        ));
        assert!(matches!(
            access_field::<&Value>(&doc, &path("list.[].a")),
            Err(AccessError::NotArray { .. })
        ));
    }

    #[test]
    fn test_type_mismatch_names_both_types() {
        let doc = json!({"enabled": "yes"});
        let err = access_field::<bool>(&doc, &path("enabled")).unwrap_err();
        assert_eq!(
            err,
            AccessError::TypeMismatch {
                path: path("enabled"),
                expected: "bool",
                actual: "string",
            }
        );
    }

    #[test]
    fn test_access_field_object_requires_field() {
        let doc = json!({"spec": {"name": "x"}});
        assert!(access_field_object(&doc, &path("spec.name")).is_ok());
        assert!(access_field_object(&doc, &path("spec.other"))
            .unwrap_err()
            .is_not_found());
        assert!(matches!(
            access_field_object(&doc, &path("spec.[]")),
            Err(AccessError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_access_field_object_mut_edits_matching_element() {
        let mut doc = json!({"roles": [{"a": 1}, {"b": 2}]});
        let holder = access_field_object_mut(&mut doc, &path("roles.[].b")).unwrap();
        holder.insert("c".to_string(), json!(3));
        assert_eq!(doc, json!({"roles": [{"a": 1}, {"b": 2, "c": 3}]}));
    }

    #[test]
    fn test_create_field_rejects_empty_and_root_array() {
        let mut doc = json!({});
        assert!(matches!(
            create_field(&mut doc, json!(1), &FieldPath::root()),
            Err(AccessError::InvalidPath { .. })
        ));
        assert!(matches!(
            create_field(&mut doc, json!(1), &path("[].a")),
            Err(AccessError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_create_field_requires_parent() {
        let mut doc = json!({});
        let err = create_field(&mut doc, json!(1), &path("spec.name")).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(doc, json!({}));
    }

    #[test]
    fn test_create_field_appends_to_array() {
        let mut doc = json!({"roles": [{"key": "a"}]});
        create_field(&mut doc, json!({"key": "b"}), &path("roles.[].key")).unwrap();
        assert_eq!(doc, json!({"roles": [{"key": "a"}, {"key": "b"}]}));

        let mut missing = json!({});
        assert!(create_field(&mut missing, json!(1), &path("roles.[].key"))
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_recursive_create_builds_arrays_for_array_markers() {
        let mut doc = json!({"spec": {}});
        recursive_create_field(&mut doc, json!("a"), &path("spec.tags.[]")).unwrap();
        assert_eq!(doc, json!({"spec": {"tags": ["a"]}}));
    }

    #[test]
    fn test_recursive_create_keeps_existing_siblings() {
        let mut doc = json!({"spec": {"other": true}});
        recursive_create_field(&mut doc, json!(2), &path("spec.a.b")).unwrap();
        assert_eq!(doc, json!({"spec": {"other": true, "a": {"b": 2}}}));
    }

    #[test]
    fn test_get_or_create_field() {
        let mut doc = json!({"spec": {"v1": {"x": 1}}});
        let existing = get_or_create_field(&mut doc, json!({}), &path("spec.v1")).unwrap();
        assert_eq!(*existing, json!({"x": 1}));

        let created = get_or_create_object(&mut doc, &path("status.v1")).unwrap();
        created.insert("id".to_string(), json!("abc"));
        assert_eq!(doc["status"], json!({"v1": {"id": "abc"}}));

        let mut scalar = json!({"spec": 3});
        assert!(matches!(
            get_or_create_object(&mut scalar, &path("spec")),
            Err(AccessError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_fields_of_is_sorted() {
        let doc = json!({"b": 1, "a": 2});
        assert_eq!(fields_of(doc.as_object().unwrap()), vec!["a", "b"]);
    }
}
