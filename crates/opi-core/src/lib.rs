//! Cluster-backed desire reconciliation.
//!
//! Maps [`opi_model::Lrp`] and [`opi_model::Task`] values onto orchestrator resources through
//! the [`cluster::ClusterClient`] capability: one workload controller per app, a stable service,
//! an optional headless service, a routing update, and bounded jobs for staging.

pub mod cluster;
pub use cluster::{ClusterClient, LabelSelector, MemoryCluster, Propagation, Resource, ResourceKind};

mod error;
pub use error::{ClusterError, DesireError, IngressError};

mod ctx;
pub use ctx::guarded;

pub mod naming;

mod ingress;
pub use ingress::IngressManager;

pub mod workload;
pub use workload::{DeploymentManager, StatefulSetManager, WorkloadBackend, WorkloadManager};

pub mod service;
pub use service::{ClusterServiceManager, ServiceManager};

pub mod task;
pub use task::{ClusterTaskDesirer, TaskConfig, TaskDesirer};

pub mod desirer;
pub use desirer::{ClusterDesirer, Desirer, DesirerConfig};

pub use tokio_util::sync::CancellationToken;
