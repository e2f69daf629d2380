//! # Reference Mappings
//!
//! Typed view of the `x-kubernetes-mapping` / `x-openapi-mapping` extension
//! pair carried by reference leaves of a mapping schema.

use crate::constants::{PROPERTY_SELECTOR_SUFFIX, SECRET_API_VERSION, SECRET_KIND, SECRET_RESOURCE};
use crate::unstructured::FieldPath;
use serde::{Deserialize, Serialize};

/// A schema leaf whose value is resolved through another Kubernetes object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceMapping {
    #[serde(rename = "x-kubernetes-mapping")]
    pub kubernetes: KubeMapping,
    #[serde(rename = "x-openapi-mapping")]
    pub openapi: OpenApiMapping,
}

/// Kubernetes side of a reference: which object and which of its fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubeMapping {
    /// Location of the target name inside the reference value (`.name`)
    #[serde(default)]
    pub name_selector: String,
    /// Target fields templated on the API property name (`$.data.#`)
    #[serde(default)]
    pub property_selectors: Vec<String>,
    /// Target fields holding the linked value verbatim (`$.status.v20250312.id`)
    #[serde(default)]
    pub properties: Vec<String>,
    #[serde(rename = "type", default)]
    pub kube_type: KubeType,
}

impl KubeMapping {
    #[must_use]
    pub fn name_path(&self) -> FieldPath {
        resolve_xpath(&self.name_selector)
    }

    #[must_use]
    pub fn property_paths(&self) -> Vec<FieldPath> {
        self.properties.iter().map(|p| resolve_xpath(p)).collect()
    }

    /// Property selectors with the `.#` placeholder replaced by `api_field`
    #[must_use]
    pub fn selector_paths(&self, api_field: &str) -> Vec<FieldPath> {
        self.property_selectors
            .iter()
            .map(|selector| match selector.strip_suffix(PROPERTY_SELECTOR_SUFFIX) {
                Some(stem) => resolve_xpath(stem).child(api_field),
                None => resolve_xpath(selector),
            })
            .collect()
    }
}

/// Group/version/kind/resource of a reference target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KubeType {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub version: String,
}

impl KubeType {
    /// `apiVersion` string of the target (`v1`, `atlas.generated.mongodb.com/v1`)
    #[must_use]
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// Human readable group/version/kind for error messages
    #[must_use]
    pub fn gvk(&self) -> String {
        format!("{}, Kind={}", self.api_version(), self.kind)
    }

    /// Check an object's type against this one
    ///
    /// An undeclared kind accepts any object.
    #[must_use]
    pub fn matches(&self, api_version: &str, kind: &str) -> bool {
        self.kind.is_empty() || (self.kind == kind && self.api_version() == api_version)
    }

    #[must_use]
    pub fn is_secret(&self) -> bool {
        self.group.is_empty()
            && self.version == SECRET_API_VERSION
            && (self.resource == SECRET_RESOURCE || self.kind == SECRET_KIND)
    }
}

/// API side of a reference: the request/response property it stands for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenApiMapping {
    #[serde(default)]
    pub property: String,
    #[serde(rename = "type", default)]
    pub value_type: String,
}

impl OpenApiMapping {
    /// Path of the API property, relative to the object holding the reference
    #[must_use]
    pub fn target_path(&self) -> FieldPath {
        resolve_xpath(&self.property)
    }

    /// Last field of the API property path
    #[must_use]
    pub fn api_field(&self) -> Option<String> {
        self.target_path().base().map(str::to_string)
    }
}

/// Turn a `$.a.b` style selector into a path
///
/// The leading `$` is optional, so `$.groupId`, `.groupId` and `groupId`
/// address the same field.
#[must_use]
pub fn resolve_xpath(xpath: &str) -> FieldPath {
    FieldPath::parse(xpath.strip_prefix('$').unwrap_or(xpath))
}
