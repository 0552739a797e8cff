//! The façade the rest of the platform calls to reconcile LRPs.

use std::sync::Arc;

use async_trait::async_trait;
use opi_model::{Lrp, LrpUpdate, VcapApp};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument};

use crate::{
    cluster::ClusterClient,
    ctx::{ensure_namespace, guarded},
    error::DesireError,
    ingress::IngressManager,
    service::{ClusterServiceManager, ServiceManager},
    workload::{DeploymentManager, StatefulSetManager, WorkloadBackend, WorkloadManager},
};

/// Reconcile desired LRPs against the cluster.
#[async_trait]
pub trait Desirer: Send + Sync {
    /// Create-or-reconcile every LRP in `lrps`.
    ///
    /// Idempotent: resources that already exist are left as they are. Every LRP is attempted even
    /// when an earlier one fails; the first failure is returned and nothing is rolled back.
    /// Cancellation stops the batch at once.
    async fn desire(&self, ctx: &CancellationToken, lrps: &[Lrp]) -> Result<(), DesireError>;

    /// Every app in the namespace; empty when there is none.
    async fn list(&self, ctx: &CancellationToken) -> Result<Vec<Lrp>, DesireError>;

    async fn get(&self, ctx: &CancellationToken, name: &str) -> Result<Lrp, DesireError>;

    /// Change the instance count of an existing app.
    async fn update(&self, ctx: &CancellationToken, update: &LrpUpdate)
    -> Result<(), DesireError>;

    /// Remove the app's workload and services.
    async fn stop(&self, ctx: &CancellationToken, name: &str) -> Result<(), DesireError>;
}

#[derive(Debug, Clone)]
pub struct DesirerConfig {
    /// Namespace all app resources live in; created on first desire.
    pub namespace: String,
    pub backend: WorkloadBackend,
    /// Whether to create a headless service per app.
    ///
    /// `None` picks the backend's default: StatefulSets need a governing headless service,
    /// Deployments do not.
    pub headless_services: Option<bool>,
}

impl DesirerConfig {
    pub fn headless_services(&self) -> bool {
        self.headless_services
            .unwrap_or(self.backend == WorkloadBackend::StatefulSet)
    }
}

impl Default for DesirerConfig {
    fn default() -> Self {
        Self {
            namespace: "opi".to_string(),
            backend: WorkloadBackend::default(),
            headless_services: None,
        }
    }
}

/// [`Desirer`] combining a workload manager, a service manager and an ingress collaborator.
pub struct ClusterDesirer<C> {
    client: Arc<C>,
    config: DesirerConfig,
    workloads: Box<dyn WorkloadManager>,
    services: ClusterServiceManager<C>,
    ingress: Arc<dyn IngressManager>,
}

impl<C: ClusterClient> ClusterDesirer<C> {
    pub fn new(client: Arc<C>, config: DesirerConfig, ingress: Arc<dyn IngressManager>) -> Self {
        let workloads: Box<dyn WorkloadManager> = match config.backend {
            WorkloadBackend::Deployment => Box::new(DeploymentManager::new(
                client.clone(),
                config.namespace.clone(),
            )),
            WorkloadBackend::StatefulSet => Box::new(StatefulSetManager::new(
                client.clone(),
                config.namespace.clone(),
            )),
        };
        let services = ClusterServiceManager::new(client.clone(), config.namespace.clone());

        Self {
            client,
            config,
            workloads,
            services,
            ingress,
        }
    }

    pub fn config(&self) -> &DesirerConfig {
        &self.config
    }

    #[instrument(level = "debug", skip(self, ctx, lrp), fields(app = %lrp.name, process_guid = ?lrp.process_guid()))]
    async fn desire_one(&self, ctx: &CancellationToken, lrp: &Lrp) -> Result<(), DesireError> {
        let app = VcapApp::from_env(&lrp.env).map_err(|e| DesireError::InvalidMetadata {
            app: lrp.name.clone(),
            reason: e.to_string(),
        })?;

        swallow_existing(self.workloads.desire(ctx, lrp).await, "workload")?;
        swallow_existing(self.services.create(ctx, lrp).await, "service")?;
        if self.config.headless_services() {
            swallow_existing(
                self.services.create_headless(ctx, lrp).await,
                "headless service",
            )?;
        }

        guarded(ctx, async {
            self.ingress
                .update_ingress(&self.config.namespace, lrp, &app)
                .await
                .map_err(|source| DesireError::Ingress {
                    app: lrp.name.clone(),
                    source,
                })
        })
        .await
    }
}

fn swallow_existing(res: Result<(), DesireError>, what: &str) -> Result<(), DesireError> {
    match res {
        Err(e) if e.is_already_exists() => {
            debug!(resource = what, "already exists");
            Ok(())
        }
        other => other,
    }
}

fn ignore_missing(res: Result<(), DesireError>) -> Result<(), DesireError> {
    match res {
        Err(e) if e.is_not_found() => Ok(()),
        other => other,
    }
}

#[async_trait]
impl<C: ClusterClient> Desirer for ClusterDesirer<C> {
    #[instrument(level = "debug", skip(self, ctx, lrps), fields(namespace = %self.config.namespace, count = lrps.len()))]
    async fn desire(&self, ctx: &CancellationToken, lrps: &[Lrp]) -> Result<(), DesireError> {
        ensure_namespace(ctx, self.client.as_ref(), &self.config.namespace).await?;

        let mut first_err = None;
        for lrp in lrps {
            match self.desire_one(ctx, lrp).await {
                Ok(()) => {}
                Err(DesireError::Cancelled) => return Err(DesireError::Cancelled),
                Err(e) => {
                    error!(app = %lrp.name, process_guid = ?lrp.process_guid(), error = %e, "failed to desire lrp");
                    first_err.get_or_insert(e);
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn list(&self, ctx: &CancellationToken) -> Result<Vec<Lrp>, DesireError> {
        self.workloads.list(ctx).await
    }

    async fn get(&self, ctx: &CancellationToken, name: &str) -> Result<Lrp, DesireError> {
        self.workloads.get(ctx, name).await
    }

    async fn update(
        &self,
        ctx: &CancellationToken,
        update: &LrpUpdate,
    ) -> Result<(), DesireError> {
        self.workloads.update(ctx, update).await
    }

    #[instrument(level = "debug", skip(self, ctx))]
    async fn stop(&self, ctx: &CancellationToken, name: &str) -> Result<(), DesireError> {
        self.workloads.delete(ctx, name).await?;
        ignore_missing(self.services.delete(ctx, name).await)?;
        ignore_missing(self.services.delete_headless(ctx, name).await)
    }
}
