//! # Object Validation
//!
//! Checks a whole custom resource against the OpenAPI v3 schema of the CRD
//! version a translator is pinned to. Kubernetes extensions
//! (`x-kubernetes-*`) are not JSON Schema keywords and are ignored.

use super::TranslateError;
use crate::crd::CrdError;
use jsonschema::{Draft, JSONSchema};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::JSONSchemaProps;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub(super) struct ObjectValidator {
    compiled: Arc<JSONSchema>,
}

impl fmt::Debug for ObjectValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectValidator").finish_non_exhaustive()
    }
}

impl ObjectValidator {
    /// Compile the `openAPIV3Schema` of CRD `kind` version `version`
    pub(super) fn compile(kind: &str, version: &str, schema: &JSONSchemaProps) -> Result<Self, CrdError> {
        let invalid = |reason: String| CrdError::InvalidSchema {
            kind: kind.to_string(),
            version: version.to_string(),
            reason,
        };
        let document = serde_json::to_value(schema).map_err(|err| invalid(err.to_string()))?;
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&document)
            .map_err(|err| invalid(err.to_string()))?;
        Ok(Self {
            compiled: Arc::new(compiled),
        })
    }

    /// Every schema violation in `object`, as `<instance path>: <message>`
    pub(super) fn validate(&self, object: &Value) -> Result<(), TranslateError> {
        let Err(errors) = self.compiled.validate(object) else {
            return Ok(());
        };
        let errors: Vec<String> = errors
            .map(|err| format!("{}: {err}", err.instance_path))
            .collect();
        Err(TranslateError::Validation { errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validator() -> ObjectValidator {
        let schema: JSONSchemaProps = serde_json::from_value(json!({
            "type": "object",
            "properties": {
                "spec": {
                    "type": "object",
                    "properties": {
                        "v20250312": {
                            "type": "object",
                            "properties": {
                                "groupId": {"type": "string"},
                                "entry": {"type": "object", "x-kubernetes-preserve-unknown-fields": true}
                            }
                        }
                    }
                }
            }
        }))
        .unwrap();
        ObjectValidator::compile("Team", "v1", &schema).unwrap()
    }

    #[test]
    fn test_conforming_object_passes() {
        let object = json!({
            "apiVersion": "atlas.generated.mongodb.com/v1",
            "kind": "Team",
            "spec": {"v20250312": {"groupId": "g1", "entry": {"anything": [1, 2]}}}
        });
        assert!(validator().validate(&object).is_ok());
    }

    #[test]
    fn test_violations_name_the_instance_path() {
        let object = json!({"spec": {"v20250312": {"groupId": 12345}}});

        let Err(TranslateError::Validation { errors }) = validator().validate(&object) else {
            panic!("expected a validation error");
        };
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("/spec/v20250312/groupId: "), "{}", errors[0]);
    }
}
