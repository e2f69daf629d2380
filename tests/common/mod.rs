//! Shared fixtures for the mapping integration tests
//!
//! A `GroupAlertsConfig` CRD with an `api-mappings` annotation covering a
//! lookup-only reference (`groupRef`) and a Secret-backed array item
//! reference (`notifications[].apiKeySecretRef`).

#![allow(dead_code, reason = "Each test binary uses a subset of the fixtures")]

use atlas_mapping_engine::crd::load_crd_yaml;
use atlas_mapping_engine::{MapperConfig, Translator, TranslatorConfig};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::core::DynamicObject;
use serde_json::{json, Value};

pub const MAJOR: &str = "v20250312";
pub const NAMESPACE: &str = "ns1";

pub const GROUP_ALERTS_CRD: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: groupalertsconfigs.atlas.generated.mongodb.com
  annotations:
    api-mappings: |
      properties:
        spec:
          properties:
            v20250312:
              properties:
                groupRef:
                  x-kubernetes-mapping:
                    nameSelector: .name
                    properties:
                    - $.status.v20250312.id
                    type:
                      kind: Group
                      group: atlas.generated.mongodb.com
                      resource: groups
                      version: v1
                  x-openapi-mapping:
                    property: $.groupId
                    type: string
                entry:
                  properties:
                    notifications:
                      items:
                        properties:
                          apiKeySecretRef:
                            x-kubernetes-mapping:
                              nameSelector: .name
                              propertySelectors:
                              - $.data.#
                              type:
                                kind: Secret
                                resource: secrets
                                version: v1
                            x-openapi-mapping:
                              property: .apiKey
                              type: string
spec:
  group: atlas.generated.mongodb.com
  scope: Namespaced
  names:
    kind: GroupAlertsConfig
    plural: groupalertsconfigs
  versions:
  - name: v1
    served: true
    storage: true
    schema:
      openAPIV3Schema:
        type: object
        properties:
          spec:
            type: object
            properties:
              v20250312:
                type: object
                properties:
                  groupId:
                    type: string
                  groupRef:
                    type: object
                    properties:
                      name:
                        type: string
                      key:
                        type: string
                  entry:
                    type: object
                    x-kubernetes-preserve-unknown-fields: true
          status:
            type: object
            properties:
              v20250312:
                type: object
                properties:
                  id:
                    type: string
                  enabled:
                    type: boolean
"#;

pub fn crd() -> CustomResourceDefinition {
    load_crd_yaml(GROUP_ALERTS_CRD).unwrap()
}

pub fn translator() -> Translator {
    Translator::new(&crd(), TranslatorConfig::new("v1", MAJOR)).unwrap()
}

pub fn translator_with(mapper: MapperConfig) -> Translator {
    let config = TranslatorConfig {
        mapper,
        ..TranslatorConfig::new("v1", MAJOR)
    };
    Translator::new(&crd(), config).unwrap()
}

pub fn object(value: Value) -> DynamicObject {
    serde_json::from_value(value).unwrap()
}

/// The resource under reconciliation with the given `spec.v20250312`
pub fn alerts_config(versioned_spec: Value) -> DynamicObject {
    object(json!({
        "apiVersion": "atlas.generated.mongodb.com/v1",
        "kind": "GroupAlertsConfig",
        "metadata": {"name": "alerts", "namespace": NAMESPACE},
        "spec": {MAJOR: versioned_spec},
    }))
}

pub fn empty_alerts_config() -> DynamicObject {
    object(json!({
        "apiVersion": "atlas.generated.mongodb.com/v1",
        "kind": "GroupAlertsConfig",
        "metadata": {"name": "alerts", "namespace": NAMESPACE},
    }))
}

/// A `Group` reporting `id` as its observed API identifier
pub fn group(name: &str, id: &str) -> DynamicObject {
    object(json!({
        "apiVersion": "atlas.generated.mongodb.com/v1",
        "kind": "Group",
        "metadata": {"name": name, "namespace": NAMESPACE},
        "status": {MAJOR: {"id": id}},
    }))
}

/// A Secret holding `key` = `value` (base64 encoded, as stored by the API server)
pub fn secret(name: &str, key: &str, value: &str) -> DynamicObject {
    object(json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "metadata": {"name": name, "namespace": NAMESPACE},
        "data": {key: STANDARD.encode(value)},
    }))
}

pub fn secret_value(obj: &DynamicObject, key: &str) -> Option<String> {
    let encoded = obj.data.get("data")?.get(key)?.as_str()?;
    let bytes = STANDARD.decode(encoded).ok()?;
    String::from_utf8(bytes).ok()
}

pub fn kind_of(obj: &DynamicObject) -> &str {
    obj.types.as_ref().map_or("", |t| t.kind.as_str())
}
