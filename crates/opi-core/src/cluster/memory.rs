use std::{
    collections::BTreeMap,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use async_trait::async_trait;
use serde_json::Value;
use tracing::trace;

use super::{ClusterClient, LabelSelector, Namespace, ObjectMeta, Propagation, Resource, ResourceKind};
use crate::error::ClusterError;

/// Verbs counted by [`MemoryCluster::calls`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verb {
    Create,
    Get,
    List,
    Replace,
    Delete,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct ObjectKey {
    kind: ResourceKind,
    namespace: String,
    name: String,
}

#[derive(Default)]
struct Inner {
    objects: BTreeMap<ObjectKey, Value>,
    versions: BTreeMap<ObjectKey, u64>,
    next_version: u64,
    calls: BTreeMap<(ResourceKind, Verb), usize>,
    deletions: Vec<(ResourceKind, String, Propagation)>,
}

/// In-memory object store implementing [`ClusterClient`].
///
/// Behaves like an API server for the calls the core makes: names are unique per kind and
/// namespace, namespaced objects need an existing namespace, every write bumps a resource
/// version, and replace honours the version carried by the object. Dependents are not modelled,
/// so the propagation policy is only recorded.
///
/// Cloning shares the store.
#[derive(Clone, Default)]
pub struct MemoryCluster {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with `namespace` already present.
    pub fn with_namespace(namespace: &str) -> Self {
        let cluster = Self::new();
        let ns = Namespace {
            metadata: ObjectMeta::named(namespace),
        };
        if let Err(e) = cluster.insert(namespace, &ns) {
            trace!(error = %e, "seed namespace rejected");
        }
        cluster
    }

    /// Number of `verb` calls made against `kind` so far, successful or not.
    pub fn calls(&self, kind: ResourceKind, verb: Verb) -> usize {
        self.read()
            .calls
            .get(&(kind, verb))
            .copied()
            .unwrap_or_default()
    }

    /// Successful deletions in call order.
    pub fn deletions(&self) -> Vec<(ResourceKind, String, Propagation)> {
        self.read().deletions.clone()
    }

    /// Number of stored objects of `kind` across all namespaces.
    pub fn count(&self, kind: ResourceKind) -> usize {
        self.read().objects.keys().filter(|k| k.kind == kind).count()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn key<R: Resource>(namespace: &str, name: &str) -> ObjectKey {
        ObjectKey {
            kind: R::KIND,
            namespace: if R::KIND.is_namespaced() {
                namespace.to_string()
            } else {
                String::new()
            },
            name: name.to_string(),
        }
    }

    fn count_call(inner: &mut Inner, kind: ResourceKind, verb: Verb) {
        *inner.calls.entry((kind, verb)).or_default() += 1;
    }

    fn insert<R: Resource>(&self, namespace: &str, object: &R) -> Result<R, ClusterError> {
        let mut inner = self.write();
        Self::count_call(&mut inner, R::KIND, Verb::Create);

        if object.name().is_empty() {
            return Err(ClusterError::Invalid(format!("{} without a name", R::KIND)));
        }
        if R::KIND.is_namespaced() {
            let ns_key = Self::key::<Namespace>("", namespace);
            if !inner.objects.contains_key(&ns_key) {
                return Err(ClusterError::NotFound {
                    kind: ResourceKind::Namespace,
                    name: namespace.to_string(),
                });
            }
        }

        let key = Self::key::<R>(namespace, object.name());
        if inner.objects.contains_key(&key) {
            return Err(ClusterError::AlreadyExists {
                kind: R::KIND,
                name: key.name,
            });
        }

        let stored = Self::stamp(&mut inner, &key, object.clone());
        inner.objects.insert(key, encode(&stored)?);
        Ok(stored)
    }

    /// Assign the next resource version and the object's namespace.
    fn stamp<R: Resource>(inner: &mut Inner, key: &ObjectKey, mut object: R) -> R {
        inner.next_version += 1;
        let version = inner.next_version;
        inner.versions.insert(key.clone(), version);

        let meta = object.meta_mut();
        meta.namespace = key.namespace.clone();
        meta.resource_version = Some(version.to_string());
        object
    }
}

fn encode<R: Resource>(object: &R) -> Result<Value, ClusterError> {
    serde_json::to_value(object).map_err(|e| ClusterError::Invalid(e.to_string()))
}

fn decode<R: Resource>(value: &Value) -> Result<R, ClusterError> {
    serde_json::from_value(value.clone()).map_err(|e| ClusterError::Invalid(e.to_string()))
}

#[async_trait]
impl ClusterClient for MemoryCluster {
    async fn create<R: Resource>(&self, namespace: &str, object: &R) -> Result<R, ClusterError> {
        self.insert(namespace, object)
    }

    async fn get<R: Resource>(&self, namespace: &str, name: &str) -> Result<R, ClusterError> {
        let mut inner = self.write();
        Self::count_call(&mut inner, R::KIND, Verb::Get);

        let key = Self::key::<R>(namespace, name);
        match inner.objects.get(&key) {
            Some(value) => decode(value),
            None => Err(ClusterError::NotFound {
                kind: R::KIND,
                name: name.to_string(),
            }),
        }
    }

    async fn list<R: Resource>(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<R>, ClusterError> {
        let mut inner = self.write();
        Self::count_call(&mut inner, R::KIND, Verb::List);

        let scope = Self::key::<R>(namespace, "").namespace;
        let mut out = Vec::new();
        for (key, value) in &inner.objects {
            if key.kind != R::KIND || key.namespace != scope {
                continue;
            }
            let object: R = decode(value)?;
            if selector.matches(&object.meta().labels) {
                out.push(object);
            }
        }
        trace!(kind = %R::KIND, namespace, selector = %selector, matched = out.len(), "list");
        Ok(out)
    }

    async fn replace<R: Resource>(&self, namespace: &str, object: &R) -> Result<R, ClusterError> {
        let mut inner = self.write();
        Self::count_call(&mut inner, R::KIND, Verb::Replace);

        let key = Self::key::<R>(namespace, object.name());
        let Some(current) = inner.versions.get(&key).copied() else {
            return Err(ClusterError::NotFound {
                kind: R::KIND,
                name: key.name,
            });
        };
        if let Some(expected) = &object.meta().resource_version
            && *expected != current.to_string()
        {
            return Err(ClusterError::Conflict {
                kind: R::KIND,
                name: key.name,
            });
        }

        let stored = Self::stamp(&mut inner, &key, object.clone());
        inner.objects.insert(key, encode(&stored)?);
        Ok(stored)
    }

    async fn delete<R: Resource>(
        &self,
        namespace: &str,
        name: &str,
        propagation: Propagation,
    ) -> Result<(), ClusterError> {
        let mut inner = self.write();
        Self::count_call(&mut inner, R::KIND, Verb::Delete);

        let key = Self::key::<R>(namespace, name);
        if inner.objects.remove(&key).is_none() {
            return Err(ClusterError::NotFound {
                kind: R::KIND,
                name: name.to_string(),
            });
        }
        inner.versions.remove(&key);
        inner
            .deletions
            .push((R::KIND, name.to_string(), propagation));
        Ok(())
    }
}
