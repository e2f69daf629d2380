//! # CRD Helpers
//!
//! Lookups on `CustomResourceDefinition` objects needed to pin a translator
//! to one served CRD version and one API major version.
//!
//! A generated resource nests each API major version under its spec:
//!
//! ```yaml
//! apiVersion: atlas.generated.mongodb.com/v1
//! kind: SearchIndex
//! spec:
//!   v20250312: {}
//! ```
//!
//! Here the CRD version is `v1` and the major version is `v20250312`.

use crate::constants::API_MAPPINGS_ANNOTATION;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    CustomResourceDefinition, CustomResourceDefinitionVersion, JSONSchemaProps,
};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrdError {
    #[error("CRD {kind} does not serve version {version}")]
    VersionNotFound { kind: String, version: String },

    #[error("CRD {kind} version {version} has no OpenAPI v3 schema")]
    MissingSchema { kind: String, version: String },

    #[error("CRD {kind} version {version} has an invalid OpenAPI v3 schema: {reason}")]
    InvalidSchema {
        kind: String,
        version: String,
        reason: String,
    },

    #[error("CRD {kind} version {version} has no spec.{major} property")]
    MajorVersionNotFound {
        kind: String,
        version: String,
        major: String,
    },

    #[error("failed to parse CRD: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Kind served by the CRD
#[must_use]
pub fn crd_kind(crd: &CustomResourceDefinition) -> &str {
    &crd.spec.names.kind
}

/// Version entry named `version`
///
/// # Errors
///
/// [`CrdError::VersionNotFound`] when the CRD does not list it.
pub fn select_version<'a>(
    crd: &'a CustomResourceDefinition,
    version: &str,
) -> Result<&'a CustomResourceDefinitionVersion, CrdError> {
    crd.spec
        .versions
        .iter()
        .find(|v| v.name == version)
        .ok_or_else(|| CrdError::VersionNotFound {
            kind: crd_kind(crd).to_string(),
            version: version.to_string(),
        })
}

/// Check that version `version` of the CRD declares `spec.<major>`
///
/// # Errors
///
/// Fails when the version, its schema or the major version property is missing.
pub fn assert_major_version(
    crd: &CustomResourceDefinition,
    version: &str,
    major: &str,
) -> Result<(), CrdError> {
    let schema = open_api_schema(crd, version)?;
    let has_major = schema
        .properties
        .as_ref()
        .and_then(|props| props.get("spec"))
        .and_then(|spec| spec.properties.as_ref())
        .is_some_and(|props| props.contains_key(major));
    if has_major {
        Ok(())
    } else {
        Err(CrdError::MajorVersionNotFound {
            kind: crd_kind(crd).to_string(),
            version: version.to_string(),
            major: major.to_string(),
        })
    }
}

/// OpenAPI v3 schema of version `version`
///
/// # Errors
///
/// Fails when the version is not served or carries no schema.
pub fn open_api_schema<'a>(
    crd: &'a CustomResourceDefinition,
    version: &str,
) -> Result<&'a JSONSchemaProps, CrdError> {
    select_version(crd, version)?
        .schema
        .as_ref()
        .and_then(|s| s.open_api_v3_schema.as_ref())
        .ok_or_else(|| CrdError::MissingSchema {
            kind: crd_kind(crd).to_string(),
            version: version.to_string(),
        })
}

/// Property names declared under `<root>.<major>` in version `version`
///
/// `None` when the schema does not restrict the fields there (no
/// properties, or unknown fields preserved), in which case every field is
/// kept.
#[must_use]
pub fn declared_fields(
    crd: &CustomResourceDefinition,
    version: &str,
    root: &str,
    major: &str,
) -> Option<BTreeSet<String>> {
    let schema = open_api_schema(crd, version).ok()?;
    let versioned = child(schema, root).and_then(|props| child(props, major))?;
    if versioned.x_kubernetes_preserve_unknown_fields == Some(true) {
        return None;
    }
    versioned
        .properties
        .as_ref()
        .filter(|props| !props.is_empty())
        .map(|props| props.keys().cloned().collect())
}

fn child<'a>(schema: &'a JSONSchemaProps, name: &str) -> Option<&'a JSONSchemaProps> {
    schema.properties.as_ref().and_then(|props| props.get(name))
}

/// Raw `api-mappings` annotation, if the CRD carries a non-empty one
#[must_use]
pub fn mapping_annotation(crd: &CustomResourceDefinition) -> Option<&str> {
    crd.metadata
        .annotations
        .as_ref()
        .and_then(|annotations| annotations.get(API_MAPPINGS_ANNOTATION))
        .map(String::as_str)
        .filter(|text| !text.trim().is_empty())
}

/// Parse a CRD from YAML (or JSON)
///
/// # Errors
///
/// [`CrdError::Parse`] when the text is not a CRD.
pub fn load_crd_yaml(text: &str) -> Result<CustomResourceDefinition, CrdError> {
    Ok(serde_yaml::from_str(text)?)
}
