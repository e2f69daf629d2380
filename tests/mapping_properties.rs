//! # Mapping Property Tests
//!
//! Behavioural guarantees of document access and the expand/collapse walk:
//! path creation and lookup, array search, optional fields, fatal reference
//! misses, idempotent expansion and symmetric array correlation.

mod common;

use atlas_mapping_engine::unstructured::{
    access_field, access_field_object, recursive_create_field, FieldPath,
};
use atlas_mapping_engine::{
    collapse, expand, MapperConfig, MappingError, MappingSchema, ObjectRepository,
};
use common::{empty_alerts_config, object, secret, secret_value, NAMESPACE};
use kube::core::DynamicObject;
use serde_json::{json, Value};

fn properties(schema: &Value) -> atlas_mapping_engine::schema::Properties {
    MappingSchema::from_value(schema).unwrap().root().clone()
}

fn repo(deps: Vec<DynamicObject>) -> ObjectRepository {
    ObjectRepository::new(empty_alerts_config(), deps)
}

fn secret_ref_schema() -> Value {
    json!({"properties": {
        "passwordSecretRef": {
            "x-kubernetes-mapping": {
                "nameSelector": ".name",
                "propertySelectors": ["$.data.#"],
                "type": {"kind": "Secret", "resource": "secrets", "version": "v1"}
            },
            "x-openapi-mapping": {"property": ".password", "type": "string"}
        }
    }})
}

fn roles_schema() -> Value {
    json!({"properties": {
        "roles": {"items": {"properties": {
            "roleRef": {
                "x-kubernetes-mapping": {
                    "nameSelector": ".name",
                    "properties": ["$.spec.name"],
                    "type": {
                        "kind": "Role",
                        "group": "atlas.generated.mongodb.com",
                        "resource": "roles",
                        "version": "v1"
                    }
                },
                "x-openapi-mapping": {"property": ".roleName", "type": "string"}
            }
        }}}
    }})
}

fn role(name: &str, role_name: &str) -> DynamicObject {
    object(json!({
        "apiVersion": "atlas.generated.mongodb.com/v1",
        "kind": "Role",
        "metadata": {"name": name, "namespace": NAMESPACE},
        "spec": {"name": role_name},
    }))
}

#[test]
fn test_created_path_reads_back() {
    let mut doc = json!({});
    let path = FieldPath::from_fields(["spec", "v1", "entry", "name"]);

    recursive_create_field(&mut doc, json!("proj1"), &path).unwrap();

    assert_eq!(access_field::<&str>(&doc, &path).unwrap(), "proj1");
    assert_eq!(doc, json!({"spec": {"v1": {"entry": {"name": "proj1"}}}}));
}

#[test]
fn test_array_search_returns_first_match() {
    let doc = json!({"roles": [{"key": "roleA", "val": 1}, {"key": "roleB", "val": 2}]});
    let path = FieldPath::parse("roles.[].key");

    assert_eq!(access_field::<&str>(&doc, &path).unwrap(), "roleA");
    assert_eq!(
        access_field_object(&doc, &path).unwrap(),
        json!({"key": "roleA", "val": 1}).as_object().unwrap()
    );
}

#[test]
fn test_missing_optional_field_is_not_an_error() {
    let props = properties(&json!({"properties": {
        "entry": {"properties": {
            "passwordSecretRef": secret_ref_schema()["properties"]["passwordSecretRef"].clone(),
            "labels": {"items": {"properties": {"key": {"type": "string"}}}}
        }}
    }}));
    let mut doc = json!({"entry": {"username": "admin"}});

    collapse(&props, &mut doc, &repo(Vec::new()), &MapperConfig::default()).unwrap();
    assert_eq!(doc, json!({"entry": {"username": "admin"}}));

    let mut repo = repo(Vec::new());
    expand(&props, &mut doc, &mut repo, &MapperConfig::default()).unwrap();
    assert_eq!(doc, json!({"entry": {"username": "admin"}}));
    assert!(repo.added().is_empty());
}

#[test]
fn test_unresolvable_reference_fails_without_partial_write() {
    let props = properties(&json!({"properties": {
        "first": {"properties": {"flag": {"type": "boolean"}}},
        "passwordSecretRef": secret_ref_schema()["properties"]["passwordSecretRef"].clone()
    }}));
    let mut doc = json!({
        "first": {"flag": true},
        "passwordSecretRef": {"name": "does-not-exist", "key": "password"}
    });
    let before = doc.clone();

    let err = collapse(&props, &mut doc, &repo(Vec::new()), &MapperConfig::default()).unwrap_err();

    assert!(err.is_reference_failure());
    assert!(matches!(err, MappingError::ReferenceNotFound { ref name, .. } if name == "does-not-exist"));
    assert_eq!(doc, before);
}

#[test]
fn test_reference_to_secret_missing_the_key() {
    let props = properties(&secret_ref_schema());
    let mut doc = json!({"passwordSecretRef": {"name": "creds", "key": "password"}});

    let err = collapse(
        &props,
        &mut doc,
        &repo(vec![secret("creds", "username", "admin")]),
        &MapperConfig::default(),
    )
    .unwrap_err();

    assert_eq!(
        err.to_string(),
        "resource \"creds\" referenced at [passwordSecretRef] has none of the fields [\"[data password]\"]"
    );
    assert_eq!(err.reason(), "ReferenceFieldNotFound");
}

#[test]
fn test_reference_namespace_defaults_to_main_object() {
    let props = properties(&secret_ref_schema());
    let deps = vec![
        secret("creds", "password", "in-main-namespace"),
        object(json!({
            "apiVersion": "v1",
            "kind": "Secret",
            "metadata": {"name": "creds", "namespace": "other"},
            "data": {"password": "aW4tb3RoZXI="}
        })),
    ];
    let repo = repo(deps);

    let mut same = json!({"passwordSecretRef": {"name": "creds", "namespace": "."}});
    collapse(&props, &mut same, &repo, &MapperConfig::default()).unwrap();
    assert_eq!(same, json!({"password": "in-main-namespace"}));

    let mut other = json!({"passwordSecretRef": {"name": "creds", "namespace": "other"}});
    collapse(&props, &mut other, &repo, &MapperConfig::default()).unwrap();
    assert_eq!(other, json!({"password": "in-other"}));
}

#[test]
fn test_expand_twice_yields_the_same_dependents() {
    let props = properties(&secret_ref_schema());
    let source = json!({"username": "admin", "password": "hunter2"});
    let initial = repo(Vec::new());

    let mut first_doc = source.clone();
    let mut first_repo = initial.clone();
    expand(&props, &mut first_doc, &mut first_repo, &MapperConfig::default()).unwrap();
    let mut second_doc = source.clone();
    let mut second_repo = initial.clone();
    expand(&props, &mut second_doc, &mut second_repo, &MapperConfig::default()).unwrap();

    let first_added = first_repo.into_added();
    let second_added = second_repo.into_added();
    assert_eq!(first_added.len(), 1);
    assert_eq!(
        serde_json::to_value(&first_added).unwrap(),
        serde_json::to_value(&second_added).unwrap()
    );
    assert_eq!(first_doc, second_doc);
    assert_eq!(secret_value(&first_added[0], "password").as_deref(), Some("hunter2"));

    // A repository that already holds the dependent reports nothing new
    let mut seeded = repo(first_added);
    let mut third_doc = source;
    expand(&props, &mut third_doc, &mut seeded, &MapperConfig::default()).unwrap();
    assert!(seeded.added().is_empty());
    assert_eq!(third_doc, first_doc);
}

#[test]
fn test_expand_updates_a_stale_dependent() {
    let props = properties(&secret_ref_schema());
    let mut first_doc = json!({"password": "old"});
    let mut first_repo = repo(Vec::new());
    expand(&props, &mut first_doc, &mut first_repo, &MapperConfig::default()).unwrap();
    let stale = first_repo.into_added();

    let mut doc = json!({"password": "new"});
    let mut repo = repo(stale);
    expand(&props, &mut doc, &mut repo, &MapperConfig::default()).unwrap();

    let added = repo.into_added();
    assert_eq!(added.len(), 1);
    assert_eq!(secret_value(&added[0], "password").as_deref(), Some("new"));
    assert_eq!(doc, first_doc);
}

#[test]
fn test_array_correlation_round_trips_through_linked_role() {
    let props = properties(&roles_schema());
    let api = json!({"roles": [{"roleName": "readWrite", "databaseName": "admin"}]});
    let mut repo = repo(vec![role("read-write", "readWrite")]);

    let mut doc = api.clone();
    expand(&props, &mut doc, &mut repo, &MapperConfig::default()).unwrap();
    assert_eq!(
        doc,
        json!({"roles": [{"databaseName": "admin", "roleRef": {"name": "read-write", "key": "roleName"}}]})
    );
    assert!(repo.added().is_empty());

    collapse(&props, &mut doc, &repo, &MapperConfig::default()).unwrap();
    assert_eq!(doc, api);
}

#[test]
fn test_array_correlation_without_linked_role_keeps_api_value() {
    let props = properties(&roles_schema());
    let api = json!({"roles": [{"roleName": "readWrite", "databaseName": "admin"}]});
    let mut repo = repo(Vec::new());

    let mut doc = api.clone();
    expand(&props, &mut doc, &mut repo, &MapperConfig::default()).unwrap();
    assert_eq!(doc, api);

    collapse(&props, &mut doc, &repo, &MapperConfig::default()).unwrap();
    assert_eq!(doc, api);
}

#[test]
fn test_plain_fields_expand_verbatim() {
    let props = properties(&json!({"properties": {
        "auditing": {"properties": {
            "auditFilter": {"type": "string"},
            "enabled": {"type": "boolean"}
        }}
    }}));
    let mut doc = json!({"auditing": {"auditFilter": "{}", "enabled": true}});
    let mut repo = repo(Vec::new());

    expand(&props, &mut doc, &mut repo, &MapperConfig::default()).unwrap();

    assert_eq!(doc, json!({"auditing": {"auditFilter": "{}", "enabled": true}}));
    assert!(repo.into_added().is_empty());
}
