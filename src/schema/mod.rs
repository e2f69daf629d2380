//! # Mapping Schema
//!
//! Immutable, typed form of the `api-mappings` annotation.
//!
//! The annotation is a pruned OpenAPI `properties` tree. Each node is one of:
//!
//! - an object with nested `properties`
//! - an array whose `items.properties` describe per-element mappings
//! - a reference leaf carrying both `x-kubernetes-mapping` and `x-openapi-mapping`
//! - a plain leaf, copied verbatim by the mapper
//!
//! The schema is parsed once per CRD version and shared by reference with
//! every mapping call.

mod reference;

pub use reference::{resolve_xpath, KubeMapping, KubeType, OpenApiMapping, ReferenceMapping};

use crate::constants::{ITEMS, PROPERTIES, X_KUBERNETES_MAPPING, X_OPENAPI_MAPPING};
use crate::unstructured::FieldPath;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Named child nodes of an object (or array item) schema node
pub type Properties = BTreeMap<String, SchemaNode>;

/// Error parsing a mapping schema
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to parse mapping schema: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("mapping schema node at {path} is not an object")]
    NotAnObject { path: FieldPath },

    #[error("mapping schema node at {path} is a reference and also declares properties")]
    ReferenceWithProperties { path: FieldPath },

    #[error("mapping schema node at {path} has a malformed reference: {source}")]
    MalformedReference {
        path: FieldPath,
        #[source]
        source: serde_json::Error,
    },

    #[error("mapping schema node at {path} has array items that are not objects with properties")]
    UnsupportedItems { path: FieldPath },

    #[error("mapping schema root must be an object with properties")]
    InvalidRoot,
}

/// One node of a mapping schema
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Object(Properties),
    /// Array whose elements are mapped by the item properties
    Array(Properties),
    Reference(ReferenceMapping),
    /// Node carrying a single reference extension; rejected when a document reaches it
    Unsupported { fields: Vec<String> },
    Leaf,
}

impl SchemaNode {
    #[must_use]
    pub fn as_reference(&self) -> Option<&ReferenceMapping> {
        match self {
            SchemaNode::Reference(mapping) => Some(mapping),
            _ => None,
        }
    }
}

/// A reference leaf found while walking a schema
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSite<'a> {
    /// Path of the reference field, array items appear as `[]`
    pub path: FieldPath,
    pub name: String,
    pub mapping: &'a ReferenceMapping,
}

/// Parsed `api-mappings` annotation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingSchema {
    root: Properties,
}

impl MappingSchema {
    /// Schema with no mappings; every mapping call becomes a no-op
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse an annotation value (YAML, which includes JSON)
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when the text is not valid YAML or a node breaks
    /// the node rules listed in the module documentation.
    pub fn from_yaml(text: &str) -> Result<Self, SchemaError> {
        if text.trim().is_empty() {
            return Ok(Self::empty());
        }
        let value: Value = serde_yaml::from_str(text)?;
        Self::from_value(&value)
    }

    /// Build from an already decoded schema document
    ///
    /// # Errors
    ///
    /// Same as [`MappingSchema::from_yaml`].
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        match parse_node(value, &FieldPath::root())? {
            SchemaNode::Object(root) => Ok(Self { root }),
            SchemaNode::Leaf => Ok(Self::empty()),
            _ => Err(SchemaError::InvalidRoot),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    #[must_use]
    pub fn root(&self) -> &Properties {
        &self.root
    }

    /// Properties of the object node reached through `fields` (e.g. `["spec", "v20250312"]`)
    #[must_use]
    pub fn properties_at(&self, fields: &[&str]) -> Option<&Properties> {
        let mut current = &self.root;
        for field in fields {
            match current.get(*field) {
                Some(SchemaNode::Object(properties)) => current = properties,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Every reference leaf of the schema
    #[must_use]
    pub fn references(&self) -> Vec<ReferenceSite<'_>> {
        find_references(&self.root, &FieldPath::root())
    }
}

/// Every reference leaf under `properties`, with paths rooted at `base`
#[must_use]
pub fn find_references<'a>(properties: &'a Properties, base: &FieldPath) -> Vec<ReferenceSite<'a>> {
    let mut sites = Vec::new();
    collect_references(properties, base, &mut sites);
    sites
}

fn collect_references<'a>(properties: &'a Properties, base: &FieldPath, sites: &mut Vec<ReferenceSite<'a>>) {
    for (name, node) in properties {
        let path = base.child(name);
        match node {
            SchemaNode::Reference(mapping) => sites.push(ReferenceSite {
                path,
                name: name.clone(),
                mapping,
            }),
            SchemaNode::Object(nested) => collect_references(nested, &path, sites),
            SchemaNode::Array(items) => collect_references(items, &path.elements(), sites),
            SchemaNode::Unsupported { .. } | SchemaNode::Leaf => {}
        }
    }
}

fn parse_node(value: &Value, path: &FieldPath) -> Result<SchemaNode, SchemaError> {
    let object = value
        .as_object()
        .ok_or_else(|| SchemaError::NotAnObject { path: path.clone() })?;

    match (
        object.contains_key(X_KUBERNETES_MAPPING),
        object.contains_key(X_OPENAPI_MAPPING),
    ) {
        (true, true) => {
            if object.contains_key(PROPERTIES) {
                return Err(SchemaError::ReferenceWithProperties { path: path.clone() });
            }
            let mapping = ReferenceMapping::deserialize(value).map_err(|source| {
                SchemaError::MalformedReference {
                    path: path.clone(),
                    source,
                }
            })?;
            return Ok(SchemaNode::Reference(mapping));
        }
        (true, false) | (false, true) => {
            let mut fields: Vec<String> = object.keys().cloned().collect();
            fields.sort();
            return Ok(SchemaNode::Unsupported { fields });
        }
        (false, false) => {}
    }

    if let Some(properties) = object.get(PROPERTIES) {
        return parse_properties(properties, path).map(SchemaNode::Object);
    }

    if let Some(items) = object.get(ITEMS) {
        return match parse_node(items, &path.elements())? {
            SchemaNode::Object(properties) => Ok(SchemaNode::Array(properties)),
            SchemaNode::Leaf => Ok(SchemaNode::Leaf),
            _ => Err(SchemaError::UnsupportedItems { path: path.clone() }),
        };
    }

    Ok(SchemaNode::Leaf)
}

fn parse_properties(value: &Value, path: &FieldPath) -> Result<Properties, SchemaError> {
    let object = value
        .as_object()
        .ok_or_else(|| SchemaError::NotAnObject { path: path.clone() })?;
    object
        .iter()
        .map(|(name, node)| Ok((name.clone(), parse_node(node, &path.child(name))?)))
        .collect()
}
