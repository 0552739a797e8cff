//! Orchestrator boundary.
//!
//! The core never talks to an API server directly; it goes through [`ClusterClient`], a CRUD
//! capability over typed [`Resource`]s. [`MemoryCluster`] is the in-memory reference store.

use std::fmt;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::ClusterError;

mod resources;
pub use resources::*;

mod selector;
pub use selector::LabelSelector;

mod memory;
pub use memory::{MemoryCluster, Verb};

/// Kinds of orchestrator objects the core manages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    Namespace,
    Deployment,
    StatefulSet,
    Service,
    Job,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Namespace => "namespace",
            ResourceKind::Deployment => "deployment",
            ResourceKind::StatefulSet => "statefulset",
            ResourceKind::Service => "service",
            ResourceKind::Job => "job",
        }
    }

    /// Namespaces are the only cluster-scoped kind.
    pub fn is_namespaced(&self) -> bool {
        !matches!(self, ResourceKind::Namespace)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens to dependents (pods, replica sets) when an owner is deleted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Propagation {
    #[default]
    Background,
    Foreground,
    Orphan,
}

/// A typed orchestrator object.
pub trait Resource: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: ResourceKind;

    fn meta(&self) -> &ObjectMeta;
    fn meta_mut(&mut self) -> &mut ObjectMeta;

    fn name(&self) -> &str {
        &self.meta().name
    }
}

/// CRUD access to the orchestrator's object store.
///
/// `namespace` is ignored for cluster-scoped kinds. Every call is atomic on the store side;
/// the core adds no locking of its own.
#[async_trait]
pub trait ClusterClient: Send + Sync + 'static {
    /// Create `object`; fails with `AlreadyExists` if the name is taken.
    async fn create<R: Resource>(&self, namespace: &str, object: &R) -> Result<R, ClusterError>;

    async fn get<R: Resource>(&self, namespace: &str, name: &str) -> Result<R, ClusterError>;

    /// List objects of kind `R` whose labels match `selector`, ordered by name.
    async fn list<R: Resource>(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<R>, ClusterError>;

    /// Overwrite an existing object.
    ///
    /// When `object` carries a resource version the write only succeeds if it still matches the
    /// stored one (`Conflict` otherwise).
    async fn replace<R: Resource>(&self, namespace: &str, object: &R) -> Result<R, ClusterError>;

    async fn delete<R: Resource>(
        &self,
        namespace: &str,
        name: &str,
        propagation: Propagation,
    ) -> Result<(), ClusterError>;
}
