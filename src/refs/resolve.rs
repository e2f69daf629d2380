//! # Reference Resolution
//!
//! Expand and collapse of a single reference field.
//!
//! On the Kubernetes side a reference is an object `{name, key}` (plus an
//! optional `namespace`) naming the target object and the API property it
//! stands for. On the API side it is the plain property value.

use super::codec::ValueCodec;
use super::naming::dependent_name;
use crate::constants::{REF_KEY, REF_NAME, REF_NAMESPACE};
use crate::mapper::MappingError;
use crate::repository::{ObjectKey, ObjectRepository};
use crate::schema::ReferenceMapping;
use crate::unstructured::{access_field, recursive_create_field, type_name, AccessError, FieldPath, Object};
use kube::core::DynamicObject;
use serde_json::{json, Map, Value};
use tracing::debug;

/// A reference leaf bound to the field name it appears under
#[derive(Debug, Clone, Copy)]
pub struct Reference<'a> {
    name: &'a str,
    mapping: &'a ReferenceMapping,
}

impl<'a> Reference<'a> {
    #[must_use]
    pub fn new(name: &'a str, mapping: &'a ReferenceMapping) -> Self {
        Self { name, mapping }
    }

    /// Replace the API value held by `holder` with a reference to a dependent
    ///
    /// `path` is the path of the reference field, used for dependent naming
    /// and error reporting. An absent or null API value is skipped. A tracked
    /// dependent of the declared kind already carrying the value is reused;
    /// otherwise the value is stored in a dependent named after the main
    /// object and `path`, which is inserted into `repo` only when it changed.
    /// Without property selectors no dependent can be created and the API
    /// value is left in place.
    ///
    /// # Errors
    ///
    /// Fails on malformed reference mappings, values the target kind cannot
    /// store, or document shape errors.
    pub fn expand(
        &self,
        repo: &mut ObjectRepository,
        path: &FieldPath,
        holder: &mut Value,
    ) -> Result<(), MappingError> {
        let api_path = self.mapping.openapi.target_path();
        let api_field = api_path
            .base()
            .ok_or_else(|| MappingError::InvalidReference {
                path: path.clone(),
                reason: "x-openapi-mapping.property must name a field",
            })?
            .to_string();

        let value = match access_field::<&Value>(holder, &api_path) {
            Ok(value) if value.is_null() => return Ok(()),
            Ok(value) => value.clone(),
            Err(err) if err.is_not_found() => {
                debug!(path = %path, property = %api_field, "API value absent, skipping reference");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        let name = if let Some(name) = self.find_existing(repo, &value)? {
            debug!(path = %path, dependent = %name, "reusing existing dependent");
            name
        } else if self.mapping.kubernetes.property_selectors.is_empty() {
            debug!(path = %path, property = %api_field, "no matching dependent and no property selectors, keeping API value");
            return Ok(());
        } else {
            let name_path = path.parent().child(&api_field);
            self.store_in_dependent(repo, path, &name_path, &api_field, &value)?
        };

        let object = holder_object(holder, path)?;
        remove_field(object, &api_path);
        object.insert(
            self.name.to_string(),
            json!({ REF_NAME: name, REF_KEY: api_field }),
        );
        Ok(())
    }

    /// Replace the reference held by `holder` with the value it points to
    ///
    /// An absent, null or empty reference is skipped.
    ///
    /// # Errors
    ///
    /// Fails when the target object does not exist, has another kind, or
    /// carries none of the designated fields, and on decoding failures.
    pub fn collapse(
        &self,
        repo: &ObjectRepository,
        path: &FieldPath,
        holder: &mut Value,
    ) -> Result<(), MappingError> {
        let reference = match holder.get(self.name) {
            None | Some(Value::Null) => return Ok(()),
            Some(Value::Object(reference)) if reference.is_empty() => return Ok(()),
            Some(Value::Object(reference)) => Value::Object(reference.clone()),
            Some(other) => {
                return Err(AccessError::TypeMismatch {
                    path: path.clone(),
                    expected: "object",
                    actual: type_name(other),
                }
                .into())
            }
        };

        let api_path = self.mapping.openapi.target_path();
        let key = reference
            .get(REF_KEY)
            .and_then(Value::as_str)
            .filter(|key| !key.is_empty())
            .or_else(|| api_path.base())
            .ok_or_else(|| MappingError::InvalidReference {
                path: path.clone(),
                reason: "reference has no key and x-openapi-mapping.property names no field",
            })?
            .to_string();

        let name_path = self.mapping.kubernetes.name_path();
        if name_path.is_empty() {
            return Err(MappingError::InvalidReference {
                path: path.clone(),
                reason: "cannot solve reference without x-kubernetes-mapping.nameSelector",
            });
        }
        let target_name = access_field::<&str>(&reference, &name_path)?;
        let namespace = reference.get(REF_NAMESPACE).and_then(Value::as_str);

        let target = self.find_target(repo, path, target_name, namespace)?;
        let document = to_document(target)?;
        let stored = self.fetch_value(&document, &key).map_err(|err| match err {
            FetchError::Access(err) => MappingError::Access(err),
            FetchError::Missing(fields) => MappingError::ReferenceFieldNotFound {
                path: path.clone(),
                name: target_name.to_string(),
                fields,
            },
        })?;
        let value = ValueCodec::for_type(&self.mapping.kubernetes.kube_type)
            .decode(stored)
            .map_err(|source| MappingError::Codec {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path, target = %target_name, "collapsed reference");
        holder_object(holder, path)?.remove(self.name);
        recursive_create_field(holder, value, &api_path)?;
        Ok(())
    }

    fn find_target<'r>(
        &self,
        repo: &'r ObjectRepository,
        path: &FieldPath,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<&'r DynamicObject, MappingError> {
        let kube_type = &self.mapping.kubernetes.kube_type;
        let found = if kube_type.kind.is_empty() {
            repo.find(name, namespace)
        } else {
            repo.find_kind(&kube_type.api_version(), &kube_type.kind, name, namespace)
        };
        if let Some(target) = found {
            return Ok(target);
        }
        match repo.find(name, namespace) {
            Some(other) => {
                let key = ObjectKey::of(other);
                Err(MappingError::ReferenceKindMismatch {
                    path: path.clone(),
                    name: name.to_string(),
                    expected: kube_type.gvk(),
                    actual: format!("{}, Kind={}", key.api_version, key.kind),
                })
            }
            None => Err(MappingError::ReferenceNotFound {
                path: path.clone(),
                name: name.to_string(),
                namespace: repo.normalize_namespace(namespace),
            }),
        }
    }

    /// Stored value of a target: first resolving property, else first resolving selector
    fn fetch_value<'d>(&self, document: &'d Value, key: &str) -> Result<&'d Value, FetchError> {
        let kubernetes = &self.mapping.kubernetes;
        let candidates: Vec<FieldPath> = kubernetes
            .property_paths()
            .into_iter()
            .chain(kubernetes.selector_paths(key))
            .collect();
        for candidate in &candidates {
            match access_field::<&Value>(document, candidate) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(FetchError::Access(err)),
            }
        }
        Err(FetchError::Missing(
            candidates.iter().map(ToString::to_string).collect(),
        ))
    }

    /// Name of a tracked dependent of the declared kind already holding `value`
    fn find_existing(&self, repo: &ObjectRepository, value: &Value) -> Result<Option<String>, MappingError> {
        let kubernetes = &self.mapping.kubernetes;
        let kube_type = &kubernetes.kube_type;
        if kube_type.kind.is_empty() || kubernetes.properties.is_empty() {
            return Ok(None);
        }
        let properties = kubernetes.property_paths();
        let api_version = kube_type.api_version();
        for candidate in repo.objects_of_kind(&api_version, &kube_type.kind) {
            let document = to_document(candidate)?;
            let holds_value = properties
                .iter()
                .any(|property| access_field::<&Value>(&document, property).is_ok_and(|v| v == value));
            if holds_value {
                return Ok(candidate.metadata.name.clone());
            }
        }
        Ok(None)
    }

    /// Write `value` into the dependent named after `name_path`, returning its name
    fn store_in_dependent(
        &self,
        repo: &mut ObjectRepository,
        path: &FieldPath,
        name_path: &FieldPath,
        api_field: &str,
        value: &Value,
    ) -> Result<String, MappingError> {
        let kubernetes = &self.mapping.kubernetes;
        let kube_type = &kubernetes.kube_type;
        if kube_type.kind.is_empty() {
            return Err(MappingError::InvalidReference {
                path: path.clone(),
                reason: "x-kubernetes-mapping.type.kind is required to create a dependent",
            });
        }
        let target = kubernetes
            .selector_paths(api_field)
            .into_iter()
            .next()
            .ok_or_else(|| MappingError::InvalidReference {
                path: path.clone(),
                reason: "x-kubernetes-mapping has no property selector",
            })?;
        let encoded = ValueCodec::for_type(kube_type)
            .encode(value)
            .map_err(|source| MappingError::Codec {
                path: path.clone(),
                source,
            })?;

        let name = dependent_name(repo.main_name(), name_path);
        let api_version = kube_type.api_version();
        let mut document = match repo.find_kind(&api_version, &kube_type.kind, &name, None) {
            Some(existing) => to_document(existing)?,
            None => json!({
                "apiVersion": api_version,
                "kind": kube_type.kind,
                "metadata": {"name": name, "namespace": repo.namespace()},
            }),
        };

        if access_field::<&Value>(&document, &target).is_ok_and(|current| *current == encoded) {
            debug!(path = %path, dependent = %name, "dependent already up to date");
            return Ok(name);
        }
        recursive_create_field(&mut document, encoded, &target)?;
        let dependent: DynamicObject =
            serde_json::from_value(document).map_err(|source| MappingError::Conversion {
                name: name.clone(),
                source,
            })?;
        debug!(path = %path, dependent = %name, kind = %kube_type.kind, "storing value in dependent");
        repo.insert(dependent);
        Ok(name)
    }
}

enum FetchError {
    Access(AccessError),
    Missing(Vec<String>),
}

fn to_document(obj: &DynamicObject) -> Result<Value, MappingError> {
    serde_json::to_value(obj).map_err(|source| MappingError::Conversion {
        name: obj.metadata.name.clone().unwrap_or_default(),
        source,
    })
}

fn holder_object<'h>(holder: &'h mut Value, path: &FieldPath) -> Result<&'h mut Object, MappingError> {
    holder.as_object_mut().ok_or_else(|| {
        AccessError::NotObject {
            path: path.parent(),
        }
        .into()
    })
}

/// Remove the field addressed by a holder-relative path made of field names
fn remove_field(object: &mut Map<String, Value>, path: &FieldPath) {
    let Some(field) = path.base() else {
        return;
    };
    let mut current = object;
    for segment in &path.segments()[..path.len() - 1] {
        match segment
            .as_field()
            .and_then(|name| current.get_mut(name))
            .and_then(Value::as_object_mut)
        {
            Some(next) => current = next,
            None => return,
        }
    }
    current.remove(field);
}
