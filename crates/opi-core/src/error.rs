use thiserror::Error;

use crate::cluster::ResourceKind;

/// Failure reported by the orchestrator's resource store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClusterError {
    #[error("{kind} {name:?} not found")]
    NotFound { kind: ResourceKind, name: String },

    #[error("{kind} {name:?} already exists")]
    AlreadyExists { kind: ResourceKind, name: String },

    #[error("{kind} {name:?} was modified concurrently")]
    Conflict { kind: ResourceKind, name: String },

    #[error("invalid object: {0}")]
    Invalid(String),

    #[error("cluster transport error: {0}")]
    Transport(String),
}

impl ClusterError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, ClusterError::AlreadyExists { .. })
    }
}

/// Failure of the routing collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct IngressError(pub String);

#[derive(Debug, Error)]
pub enum DesireError {
    #[error("app not found: {0}")]
    NotFound(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("cluster error: {0}")]
    Cluster(#[from] ClusterError),

    #[error("ingress update failed for {app}: {source}")]
    Ingress {
        app: String,
        #[source]
        source: IngressError,
    },

    #[error("invalid application metadata for {app}: {reason}")]
    InvalidMetadata { app: String, reason: String },

    #[error("invalid task: {0}")]
    InvalidTask(String),

    #[error("more than one workload is labelled {0}")]
    DuplicateWorkload(String),
}

impl DesireError {
    /// `true` for a missing app as well as for a missing underlying resource.
    pub fn is_not_found(&self) -> bool {
        match self {
            DesireError::NotFound(_) => true,
            DesireError::Cluster(e) => e.is_not_found(),
            _ => false,
        }
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, DesireError::Cluster(e) if e.is_already_exists())
    }
}
