//! # Constants
//!
//! Shared constants used throughout the mapping engine.
//!
//! Annotation and extension keys are part of the contract with the CRD
//! generation tooling and must not change independently of it.

/// CRD annotation holding the mapping schema (YAML or JSON)
pub const API_MAPPINGS_ANNOTATION: &str = "api-mappings";

/// Schema extension describing the Kubernetes side of a reference
pub const X_KUBERNETES_MAPPING: &str = "x-kubernetes-mapping";

/// Schema extension describing the API side of a reference
pub const X_OPENAPI_MAPPING: &str = "x-openapi-mapping";

/// Schema keyword for nested object properties
pub const PROPERTIES: &str = "properties";

/// Schema keyword for array item schemas
pub const ITEMS: &str = "items";

/// Field holding the target object name inside a reference value
pub const REF_NAME: &str = "name";

/// Field holding the API property name inside a reference value
pub const REF_KEY: &str = "key";

/// Field holding an explicit target namespace inside a reference value
pub const REF_NAMESPACE: &str = "namespace";

/// Suffix of a property selector templated on the API property name
/// (`$.data.#` selects `data.<property>`)
pub const PROPERTY_SELECTOR_SUFFIX: &str = ".#";

/// Path segment marking "any element of the enclosing array"
pub const ARRAY_SEGMENT: &str = "[]";

/// Namespace placeholder meaning "the namespace of the main object"
pub const SAME_NAMESPACE: &str = ".";

/// Versioned spec wrapper holding the API entry fields
pub const ENTRY_FIELD: &str = "entry";

/// Secret data is stored base64 encoded
pub const SECRET_API_VERSION: &str = "v1";
pub const SECRET_RESOURCE: &str = "secrets";
pub const SECRET_KIND: &str = "Secret";

/// Length of the hash suffix appended to generated dependent names
pub const DEPENDENT_NAME_HASH_LEN: usize = 19;

/// Maximum length of a Kubernetes object name (DNS subdomain)
pub const MAX_OBJECT_NAME_LEN: usize = 253;

/// Condition type reported for mapping outcomes
pub const READY_CONDITION: &str = "Ready";

/// Condition reason reported when a mapping succeeds
pub const MAPPING_SUCCEEDED_REASON: &str = "MappingSucceeded";
