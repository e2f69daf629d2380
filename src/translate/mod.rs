//! # Translator
//!
//! Translation between a custom resource and an API document, pinned to one
//! served CRD version and one API major version.
//!
//! ## Layout
//!
//! A resource keeps the API fields of major version `<major>` under
//! `spec.<major>` (top-level request parameters) and `spec.<major>.entry`
//! (request body), and the observed API state under `status.<major>`.
//!
//! - [`Translator::to_api`] collapses the references of `spec.<major>` and
//!   merges its top-level fields with the `entry` fields (entry wins).
//! - [`Translator::from_api`] copies an API document into all three
//!   locations, then expands references into dependents. Fields the CRD
//!   does not declare under `spec.<major>` or `status.<major>` are dropped
//!   there, the way the API server prunes them.
//!
//! A translator built from a CRD validates the resource against the CRD
//! schema of its version: the input of `to_api` before collapsing, and the
//! output of `from_api` before it is written back.
//!
//! Both operations work on copies and only write back on success.

mod error;
mod validation;

pub use error::TranslateError;

use validation::ObjectValidator;

use crate::constants::ENTRY_FIELD;
use crate::crd;
use crate::mapper::{self, Direction, MapperConfig};
use crate::observability::metrics;
use crate::repository::ObjectRepository;
use crate::schema::{find_references, MappingSchema, ReferenceSite};
use crate::unstructured::{access_field_mut, copy_fields, get_or_create_object, type_name, FieldPath, Object};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::core::{DynamicObject, GroupVersionKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;
use tracing::{debug, warn};

/// Versions a translator is pinned to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatorConfig {
    /// Served CRD version, e.g. `v1`
    pub crd_version: String,
    /// API major version property under `spec`, e.g. `v20250312`
    pub major_version: String,
    #[serde(default)]
    pub mapper: MapperConfig,
}

impl TranslatorConfig {
    pub fn new(crd_version: impl Into<String>, major_version: impl Into<String>) -> Self {
        Self {
            crd_version: crd_version.into(),
            major_version: major_version.into(),
            mapper: MapperConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Translator {
    gvk: GroupVersionKind,
    config: TranslatorConfig,
    schema: MappingSchema,
    spec_fields: Option<BTreeSet<String>>,
    status_fields: Option<BTreeSet<String>>,
    validator: Option<ObjectValidator>,
}

impl Translator {
    /// Build a translator for one version of a CRD
    ///
    /// # Errors
    ///
    /// Fails when the CRD does not serve `config.crd_version`, does not declare
    /// `spec.<major>`, has a schema that does not compile, or carries an
    /// invalid `api-mappings` annotation.
    pub fn new(crd: &CustomResourceDefinition, config: TranslatorConfig) -> Result<Self, TranslateError> {
        crd::assert_major_version(crd, &config.crd_version, &config.major_version)?;
        let validator = ObjectValidator::compile(
            crd::crd_kind(crd),
            &config.crd_version,
            crd::open_api_schema(crd, &config.crd_version)?,
        )?;
        let schema = match crd::mapping_annotation(crd) {
            Some(text) => MappingSchema::from_yaml(text)?,
            None => MappingSchema::empty(),
        };
        let gvk = GroupVersionKind::gvk(&crd.spec.group, &config.crd_version, crd::crd_kind(crd));
        let spec_fields = crd::declared_fields(crd, &config.crd_version, "spec", &config.major_version);
        let status_fields = crd::declared_fields(crd, &config.crd_version, "status", &config.major_version);
        Ok(Self {
            spec_fields,
            status_fields,
            validator: Some(validator),
            ..Self::from_schema(gvk, config, schema)
        })
    }

    /// One translator per API major version of a CRD version
    ///
    /// # Errors
    ///
    /// Same as [`Translator::new`], for any of the major versions.
    pub fn per_version<'a>(
        crd: &CustomResourceDefinition,
        crd_version: &str,
        major_versions: impl IntoIterator<Item = &'a str>,
        mapper: &MapperConfig,
    ) -> Result<BTreeMap<String, Translator>, TranslateError> {
        major_versions
            .into_iter()
            .map(|major| {
                let config = TranslatorConfig {
                    crd_version: crd_version.to_string(),
                    major_version: major.to_string(),
                    mapper: mapper.clone(),
                };
                Ok((major.to_string(), Translator::new(crd, config)?))
            })
            .collect()
    }

    /// Build a translator from an already parsed schema
    ///
    /// Without a CRD there is nothing to prune or validate by, so every API
    /// field is copied into `spec.<major>` and `status.<major>`.
    #[must_use]
    pub fn from_schema(gvk: GroupVersionKind, config: TranslatorConfig, schema: MappingSchema) -> Self {
        Self {
            gvk,
            config,
            schema,
            spec_fields: None,
            status_fields: None,
            validator: None,
        }
    }

    #[must_use]
    pub fn gvk(&self) -> &GroupVersionKind {
        &self.gvk
    }

    #[must_use]
    pub fn major_version(&self) -> &str {
        &self.config.major_version
    }

    #[must_use]
    pub fn schema(&self) -> &MappingSchema {
        &self.schema
    }

    /// Reference mappings of `spec.<major>`, with their full paths
    #[must_use]
    pub fn references(&self) -> Vec<ReferenceSite<'_>> {
        let major = self.major_version();
        self.schema
            .properties_at(&["spec", major])
            .map(|props| find_references(props, &FieldPath::from_fields(["spec", major])))
            .unwrap_or_default()
    }

    /// API request document for `main`, with references resolved against `deps`
    ///
    /// # Errors
    ///
    /// Fails on a GVK mismatch, a schema violation, a missing `spec.<major>`
    /// or any mapping error.
    pub fn to_api(
        &self,
        main: &DynamicObject,
        deps: impl IntoIterator<Item = DynamicObject>,
    ) -> Result<Value, TranslateError> {
        let started = Instant::now();
        let result = self.collapse_object(main, deps);
        self.record(Direction::Collapse, main, started, &result);
        result
    }

    /// Write an API document into `main`, returning the dependents to persist
    ///
    /// # Errors
    ///
    /// Fails on a GVK mismatch, a non-object API document, any mapping error
    /// or an expanded resource that violates the schema. `main` is left
    /// untouched on failure.
    pub fn from_api(
        &self,
        main: &mut DynamicObject,
        api: &Value,
        deps: impl IntoIterator<Item = DynamicObject>,
    ) -> Result<Vec<DynamicObject>, TranslateError> {
        let started = Instant::now();
        let result = self.expand_object(main, api, deps);
        self.record(Direction::Expand, main, started, &result);
        if let Ok(added) = &result {
            metrics::add_dependents(added.len());
        }
        result
    }

    fn check_gvk(&self, obj: &DynamicObject) -> Result<(), TranslateError> {
        let (api_version, kind) = obj
            .types
            .as_ref()
            .map(|t| (t.api_version.as_str(), t.kind.as_str()))
            .unwrap_or_default();
        let expected_api_version = api_version_of(&self.gvk);
        if kind == self.gvk.kind && api_version == expected_api_version {
            return Ok(());
        }
        Err(TranslateError::GvkMismatch {
            expected: format!("{expected_api_version}, Kind={}", self.gvk.kind),
            actual: format!("{api_version}, Kind={kind}"),
        })
    }

    fn validate(&self, obj: &DynamicObject) -> Result<(), TranslateError> {
        let Some(validator) = &self.validator else {
            return Ok(());
        };
        let object = serde_json::to_value(obj).map_err(|err| TranslateError::Validation {
            errors: vec![err.to_string()],
        })?;
        validator.validate(&object)
    }

    fn collapse_object(
        &self,
        main: &DynamicObject,
        deps: impl IntoIterator<Item = DynamicObject>,
    ) -> Result<Value, TranslateError> {
        self.check_gvk(main)?;
        self.validate(main)?;
        let major = self.major_version();
        let spec_path = FieldPath::from_fields(["spec", major]);
        let mut versioned = main
            .data
            .get("spec")
            .and_then(|spec| spec.get(major))
            .filter(|value| value.is_object())
            .cloned()
            .ok_or_else(|| TranslateError::MissingSpec {
                name: object_name(main),
                major: major.to_string(),
            })?;

        let repo = ObjectRepository::new(main.clone(), deps);
        if let Some(props) = self.schema.properties_at(&["spec", major]) {
            mapper::collapse(props, &mut versioned, &repo, &self.config.mapper)
                .map_err(|source| TranslateError::Mapping { at: spec_path, source })?;
        }

        let mut request = Map::new();
        if let Value::Object(fields) = &versioned {
            for (key, value) in fields {
                if key != ENTRY_FIELD {
                    request.insert(key.clone(), value.clone());
                }
            }
            if let Some(Value::Object(entry)) = fields.get(ENTRY_FIELD) {
                copy_fields(&mut request, entry);
            }
        }
        Ok(Value::Object(request))
    }

    fn expand_object(
        &self,
        main: &mut DynamicObject,
        api: &Value,
        deps: impl IntoIterator<Item = DynamicObject>,
    ) -> Result<Vec<DynamicObject>, TranslateError> {
        self.check_gvk(main)?;
        let api_fields = api.as_object().ok_or_else(|| TranslateError::NotAnObject {
            actual: type_name(api),
        })?;
        let major = self.major_version();

        let mut document = if main.data.is_object() {
            main.data.clone()
        } else {
            Value::Object(Map::new())
        };
        let spec_path = FieldPath::from_fields(["spec", major]);
        let status_path = FieldPath::from_fields(["status", major]);

        let spec = versioned_object(&mut document, &spec_path)?;
        copy_declared(spec, api_fields, self.spec_fields.as_ref());
        let mut entry = Object::new();
        copy_fields(&mut entry, api_fields);
        spec.insert(ENTRY_FIELD.to_string(), Value::Object(entry));
        copy_declared(
            versioned_object(&mut document, &status_path)?,
            api_fields,
            self.status_fields.as_ref(),
        );

        let mut repo = ObjectRepository::new(main.clone(), deps);
        for (root, at) in [("spec", spec_path), ("status", status_path)] {
            let Some(props) = self.schema.properties_at(&[root, major]) else {
                debug!(path = %at, "no mappings declared");
                continue;
            };
            let subtree = access_field_mut(&mut document, &at).map_err(|source| TranslateError::Access {
                at: at.clone(),
                source,
            })?;
            mapper::expand(props, subtree, &mut repo, &self.config.mapper)
                .map_err(|source| TranslateError::Mapping { at, source })?;
        }

        let mut expanded = main.clone();
        expanded.data = document;
        self.validate(&expanded)?;
        *main = expanded;
        Ok(repo.into_added())
    }

    fn record<T>(
        &self,
        direction: Direction,
        obj: &DynamicObject,
        started: Instant,
        result: &Result<T, TranslateError>,
    ) {
        metrics::increment_operations(direction.as_str());
        metrics::observe_duration(direction.as_str(), started.elapsed().as_secs_f64());
        if let Err(err) = result {
            metrics::increment_errors(direction.as_str(), err.reason());
            warn!(
                kind = %self.gvk.kind,
                name = %object_name(obj),
                direction = %direction,
                reason = err.reason(),
                error = %err,
                "mapping failed"
            );
        }
    }
}

fn versioned_object<'d>(document: &'d mut Value, at: &FieldPath) -> Result<&'d mut Object, TranslateError> {
    get_or_create_object(document, at).map_err(|source| TranslateError::Access {
        at: at.clone(),
        source,
    })
}

/// Copy the API fields `declared` allows, or all of them
fn copy_declared(target: &mut Object, source: &Object, declared: Option<&BTreeSet<String>>) {
    for (key, value) in source {
        if key == ENTRY_FIELD {
            continue;
        }
        if declared.is_none_or(|fields| fields.contains(key)) {
            target.insert(key.clone(), value.clone());
        }
    }
}

fn api_version_of(gvk: &GroupVersionKind) -> String {
    if gvk.group.is_empty() {
        gvk.version.clone()
    } else {
        format!("{}/{}", gvk.group, gvk.version)
    }
}

fn object_name(obj: &DynamicObject) -> String {
    obj.metadata.name.clone().unwrap_or_default()
}
