//! # Object Repository
//!
//! Per-call, in-memory snapshot of the Kubernetes objects a mapping may read
//! or produce.
//!
//! The repository is seeded with the main object (the one under
//! reconciliation, authoritative for the default namespace) and the
//! dependents the caller already fetched. References are resolved against it
//! and expansion records every object it creates or changes so the caller can
//! persist them afterwards. The main object is never reported as added.

use crate::constants::SAME_NAMESPACE;
use kube::core::DynamicObject;
use std::collections::BTreeMap;
use std::fmt;

/// Identity of a tracked object
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectKey {
    pub api_version: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    #[must_use]
    pub fn of(obj: &DynamicObject) -> Self {
        let (api_version, kind) = obj
            .types
            .as_ref()
            .map(|t| (t.api_version.clone(), t.kind.clone()))
            .unwrap_or_default();
        Self {
            api_version,
            kind,
            namespace: obj.metadata.namespace.clone().unwrap_or_default(),
            name: obj.metadata.name.clone().unwrap_or_default(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}/{}",
            self.api_version, self.kind, self.namespace, self.name
        )
    }
}

#[derive(Debug, Clone)]
pub struct ObjectRepository {
    main: DynamicObject,
    main_key: ObjectKey,
    objects: BTreeMap<ObjectKey, DynamicObject>,
    added: Vec<ObjectKey>,
}

impl ObjectRepository {
    /// Build a repository around `main`, pre-seeded with known dependents
    ///
    /// Seeded objects are indexed (with their namespace normalized) but are
    /// not reported as added.
    pub fn new(main: DynamicObject, deps: impl IntoIterator<Item = DynamicObject>) -> Self {
        let main_key = ObjectKey::of(&main);
        let mut repo = Self {
            main,
            main_key,
            objects: BTreeMap::new(),
            added: Vec::new(),
        };
        for dep in deps {
            let dep = repo.normalized(dep);
            let key = ObjectKey::of(&dep);
            if key != repo.main_key {
                repo.objects.insert(key, dep);
            }
        }
        repo
    }

    #[must_use]
    pub fn main(&self) -> &DynamicObject {
        &self.main
    }

    #[must_use]
    pub fn main_name(&self) -> &str {
        &self.main_key.name
    }

    /// Namespace of the main object, the default for every lookup
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.main_key.namespace
    }

    /// Resolve an optional namespace, mapping absent, empty and `.` to the
    /// main object's namespace
    #[must_use]
    pub fn normalize_namespace(&self, namespace: Option<&str>) -> String {
        match namespace {
            None | Some("" | SAME_NAMESPACE) => self.namespace().to_string(),
            Some(namespace) => namespace.to_string(),
        }
    }

    /// First tracked object with `name` in `namespace`, whatever its kind
    #[must_use]
    pub fn find(&self, name: &str, namespace: Option<&str>) -> Option<&DynamicObject> {
        let namespace = self.normalize_namespace(namespace);
        self.objects
            .iter()
            .find(|(key, _)| key.name == name && key.namespace == namespace)
            .map(|(_, obj)| obj)
    }

    /// Tracked object with the exact identity given
    #[must_use]
    pub fn find_kind(
        &self,
        api_version: &str,
        kind: &str,
        name: &str,
        namespace: Option<&str>,
    ) -> Option<&DynamicObject> {
        let key = ObjectKey {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            namespace: self.normalize_namespace(namespace),
            name: name.to_string(),
        };
        self.objects.get(&key)
    }

    #[must_use]
    pub fn has(&self, name: &str, namespace: Option<&str>) -> bool {
        self.find(name, namespace).is_some()
    }

    /// Tracked objects of one kind in the main object's namespace
    pub fn objects_of_kind<'a>(
        &'a self,
        api_version: &'a str,
        kind: &'a str,
    ) -> impl Iterator<Item = &'a DynamicObject> + 'a {
        self.objects
            .iter()
            .filter(move |(key, _)| {
                key.api_version == api_version
                    && key.kind == kind
                    && key.namespace == self.main_key.namespace
            })
            .map(|(_, obj)| obj)
    }

    /// Insert or replace an object, recording it as added
    ///
    /// An object with the main object's identity replaces the main object and
    /// is not recorded.
    pub fn insert(&mut self, obj: DynamicObject) {
        let obj = self.normalized(obj);
        let key = ObjectKey::of(&obj);
        if key == self.main_key {
            self.main = obj;
            return;
        }
        if !self.added.contains(&key) {
            self.added.push(key.clone());
        }
        self.objects.insert(key, obj);
    }

    /// Objects added or replaced so far, in insertion order
    #[must_use]
    pub fn added(&self) -> Vec<&DynamicObject> {
        self.added
            .iter()
            .filter_map(|key| self.objects.get(key))
            .collect()
    }

    /// Consume the repository, returning the added objects in insertion order
    #[must_use]
    pub fn into_added(mut self) -> Vec<DynamicObject> {
        self.added
            .iter()
            .filter_map(|key| self.objects.remove(key))
            .collect()
    }

    fn normalized(&self, mut obj: DynamicObject) -> DynamicObject {
        let namespace = self.normalize_namespace(obj.metadata.namespace.as_deref());
        obj.metadata.namespace = Some(namespace);
        obj
    }
}
