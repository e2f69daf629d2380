//! # Mapper
//!
//! Schema-driven traversal shared by both mapping directions.
//!
//! - **Expand**: API values found in a Kubernetes-shaped working document are
//!   replaced by references to dependents, which are created or updated in
//!   the repository.
//! - **Collapse**: references in a Kubernetes-shaped working document are
//!   replaced by the API values they point to.
//!
//! Both directions walk the same [`Properties`] tree; only the array
//! matching key and the reference operation differ. A call either succeeds
//! as a whole or leaves the document and the repository untouched.

mod error;

pub use error::MappingError;

use crate::refs::Reference;
use crate::repository::ObjectRepository;
use crate::schema::{Properties, ReferenceMapping, SchemaNode};
use crate::unstructured::{fields_of, type_name, AccessError, FieldPath};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// API document to Kubernetes document
    Expand,
    /// Kubernetes document to API document
    Collapse,
}

impl Direction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Expand => "expand",
            Direction::Collapse => "collapse",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How array elements are correlated when several carry the matching key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchPolicy {
    /// Map the first element carrying the key
    #[default]
    FirstMatch,
    /// Fail with [`MappingError::AmbiguousMatch`] when more than one element carries the key
    Unique,
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first-match" => Ok(MatchPolicy::FirstMatch),
            "unique" => Ok(MatchPolicy::Unique),
            other => Err(format!(
                "unknown match policy '{other}', expected 'first-match' or 'unique'"
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapperConfig {
    #[serde(default)]
    pub match_policy: MatchPolicy,
}

enum Pass<'r> {
    Expand(&'r mut ObjectRepository),
    Collapse(&'r ObjectRepository),
}

struct Mapper<'r> {
    pass: Pass<'r>,
    config: &'r MapperConfig,
}

impl Mapper<'_> {
    fn direction(&self) -> Direction {
        match self.pass {
            Pass::Expand(_) => Direction::Expand,
            Pass::Collapse(_) => Direction::Collapse,
        }
    }

    fn map_properties(
        &mut self,
        path: &FieldPath,
        properties: &Properties,
        holder: &mut Value,
    ) -> Result<(), MappingError> {
        for (name, node) in properties {
            let field_path = path.child(name);
            if let SchemaNode::Reference(mapping) = node {
                self.map_reference(&field_path, name, mapping, holder)?;
                continue;
            }
            let Some(value) = holder.get_mut(name.as_str()) else {
                debug!(path = %field_path, "optional field absent, skipping");
                continue;
            };
            // Plain API fields; a container under a leaf is a shape mismatch
            if value.is_null() || (matches!(node, SchemaNode::Leaf) && !value.is_object() && !value.is_array()) {
                continue;
            }
            if let Value::Array(elements) = value {
                let SchemaNode::Array(items) = node else {
                    return Err(MappingError::UnsupportedMapping {
                        path: field_path,
                        type_name: "array",
                    });
                };
                self.map_array(&field_path, items, elements)?;
            } else if value.is_object() {
                self.map_object(&field_path, name, node, value)?;
            } else {
                return Err(MappingError::UnsupportedMapping {
                    path: field_path,
                    type_name: type_name(value),
                });
            }
        }
        Ok(())
    }

    fn map_array(
        &mut self,
        path: &FieldPath,
        items: &Properties,
        elements: &mut [Value],
    ) -> Result<(), MappingError> {
        for (name, node) in items {
            let key = self.matching_key(path, name, node)?;
            let matches: Vec<usize> = elements
                .iter()
                .enumerate()
                .filter(|(_, element)| element.get(key.as_str()).is_some())
                .map(|(index, _)| index)
                .collect();
            let Some(&index) = matches.first() else {
                debug!(path = %path, key = %key, "no array element carries the matching key, skipping");
                continue;
            };
            if self.config.match_policy == MatchPolicy::Unique && matches.len() > 1 {
                return Err(MappingError::AmbiguousMatch {
                    path: path.clone(),
                    key,
                    count: matches.len(),
                });
            }
            let element_path = path.child(&key);
            self.map_object(&element_path, name, node, &mut elements[index])?;
        }
        Ok(())
    }

    /// Field an array element must carry to correspond to the item mapping `name`
    ///
    /// Expanding reads API arrays, where a reference item is only present
    /// under its API property name.
    fn matching_key(&self, path: &FieldPath, name: &str, node: &SchemaNode) -> Result<String, MappingError> {
        match (self.direction(), node) {
            (Direction::Expand, SchemaNode::Reference(mapping)) => {
                mapping
                    .openapi
                    .api_field()
                    .ok_or_else(|| MappingError::InvalidReference {
                        path: path.child(name),
                        reason: "x-openapi-mapping.property must name a field",
                    })
            }
            _ => Ok(name.to_string()),
        }
    }

    fn map_object(
        &mut self,
        path: &FieldPath,
        name: &str,
        node: &SchemaNode,
        target: &mut Value,
    ) -> Result<(), MappingError> {
        match node {
            SchemaNode::Object(properties) => self.map_properties(path, properties, target),
            SchemaNode::Reference(mapping) => self.map_reference(path, name, mapping, target),
            SchemaNode::Leaf | SchemaNode::Array(_) => Err(MappingError::UnsupportedSchemaShape {
                path: path.clone(),
                fields: target.as_object().map(fields_of).unwrap_or_default(),
            }),
            SchemaNode::Unsupported { fields } => Err(MappingError::UnsupportedSchemaShape {
                path: path.clone(),
                fields: fields.clone(),
            }),
        }
    }

    fn map_reference(
        &mut self,
        path: &FieldPath,
        name: &str,
        mapping: &ReferenceMapping,
        holder: &mut Value,
    ) -> Result<(), MappingError> {
        let reference = Reference::new(name, mapping);
        match &mut self.pass {
            Pass::Expand(repo) => reference.expand(repo, path, holder),
            Pass::Collapse(repo) => reference.collapse(repo, path, holder),
        }
    }
}

fn require_object(document: &Value) -> Result<(), MappingError> {
    if document.is_object() {
        Ok(())
    } else {
        Err(AccessError::NotObject {
            path: FieldPath::root(),
        }
        .into())
    }
}

/// Expand API values in `document` into references, following `properties`
///
/// Dependents created or changed are inserted into `repo`. On failure
/// neither `document` nor `repo` is modified.
///
/// # Errors
///
/// Any [`MappingError`]; absent optional fields are not errors.
pub fn expand(
    properties: &Properties,
    document: &mut Value,
    repo: &mut ObjectRepository,
    config: &MapperConfig,
) -> Result<(), MappingError> {
    require_object(document)?;
    let mut working = document.clone();
    let mut working_repo = repo.clone();
    Mapper {
        pass: Pass::Expand(&mut working_repo),
        config,
    }
    .map_properties(&FieldPath::root(), properties, &mut working)?;
    *document = working;
    *repo = working_repo;
    Ok(())
}

/// Collapse references in `document` into the API values they point to
///
/// On failure `document` is not modified.
///
/// # Errors
///
/// Any [`MappingError`]; an unresolvable reference always fails the call.
pub fn collapse(
    properties: &Properties,
    document: &mut Value,
    repo: &ObjectRepository,
    config: &MapperConfig,
) -> Result<(), MappingError> {
    require_object(document)?;
    let mut working = document.clone();
    Mapper {
        pass: Pass::Collapse(repo),
        config,
    }
    .map_properties(&FieldPath::root(), properties, &mut working)?;
    *document = working;
    Ok(())
}
