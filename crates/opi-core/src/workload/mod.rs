//! Replica controllers backing long-running apps.
//!
//! Two interchangeable backends share one contract: a Deployment (stateless replicas) or a
//! StatefulSet (ordinal replicas with stable identity). Both run a single container per pod, carry
//! `name=<app>` on the controller and its pod template, and mirror `target_instances` into the
//! replica count. The label is the selector and the only lookup key for `get` and `list`.

use std::{fmt, marker::PhantomData, str::FromStr, sync::Arc};

use async_trait::async_trait;
use opi_model::{Env, LABEL_NAME, LAST_UPDATED, Lrp, LrpUpdate, Metadata, PROCESS_GUID};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::{
    cluster::{
        ClusterClient, Container, ContainerPort, EnvVar, LabelSelector, Labels, MatchLabels,
        ObjectMeta, PodSpec, PodTemplateSpec, Propagation, Resource,
    },
    ctx::guarded,
    error::DesireError,
};

mod deployment;
mod statefulset;

/// Name of the app container in every pod template.
pub const APP_CONTAINER: &str = "opi";
/// Port the app container listens on.
pub const APP_PORT: u16 = 8080;

/// Which controller kind backs long-running apps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WorkloadBackend {
    #[default]
    Deployment,
    StatefulSet,
}

impl WorkloadBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadBackend::Deployment => "deployment",
            WorkloadBackend::StatefulSet => "statefulset",
        }
    }
}

impl fmt::Display for WorkloadBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown workload backend {0:?} (expected \"deployment\" or \"statefulset\")")]
pub struct ParseBackendError(pub String);

impl FromStr for WorkloadBackend {
    type Err = ParseBackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deployment" => Ok(WorkloadBackend::Deployment),
            "statefulset" | "stateful-set" => Ok(WorkloadBackend::StatefulSet),
            _ => Err(ParseBackendError(s.to_string())),
        }
    }
}

/// Create, read, scale and delete the replica controller of one app.
#[async_trait]
pub trait WorkloadManager: Send + Sync {
    fn backend(&self) -> WorkloadBackend;

    /// Create the controller for `lrp`.
    ///
    /// Fails with `AlreadyExists` when the app already has one; callers that want
    /// create-if-absent semantics swallow that error.
    async fn desire(&self, ctx: &CancellationToken, lrp: &Lrp) -> Result<(), DesireError>;

    /// Project the app's controller back to an LRP.
    async fn get(&self, ctx: &CancellationToken, name: &str) -> Result<Lrp, DesireError>;

    /// Project every controller in the namespace.
    async fn list(&self, ctx: &CancellationToken) -> Result<Vec<Lrp>, DesireError>;

    /// Apply an instance-count change with a compare-and-swap write.
    async fn update(&self, ctx: &CancellationToken, update: &LrpUpdate)
    -> Result<(), DesireError>;

    /// Delete the controller; its pods go with it in the background.
    async fn delete(&self, ctx: &CancellationToken, name: &str) -> Result<(), DesireError>;
}

/// A controller kind that can back an LRP.
pub trait Workload: Resource + Default {
    const BACKEND: WorkloadBackend;

    fn assemble(
        metadata: ObjectMeta,
        selector: MatchLabels,
        template: PodTemplateSpec,
        replicas: u32,
    ) -> Self;

    fn replicas(&self) -> u32;
    fn set_replicas(&mut self, replicas: u32);
    fn template(&self) -> &PodTemplateSpec;
}

/// [`WorkloadManager`] over any [`Workload`] kind.
pub struct ControllerManager<C, W> {
    client: Arc<C>,
    namespace: String,
    _kind: PhantomData<fn() -> W>,
}

/// Deployment-backed workloads.
pub type DeploymentManager<C> = ControllerManager<C, crate::cluster::Deployment>;
/// StatefulSet-backed workloads.
pub type StatefulSetManager<C> = ControllerManager<C, crate::cluster::StatefulSet>;

impl<C, W> ControllerManager<C, W>
where
    C: ClusterClient,
    W: Workload,
{
    pub fn new(client: Arc<C>, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            _kind: PhantomData,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The single controller labelled `name=<name>`.
    async fn find(&self, ctx: &CancellationToken, name: &str) -> Result<W, DesireError> {
        let selector = LabelSelector::eq(LABEL_NAME, name);
        let mut found: Vec<W> =
            guarded(ctx, self.client.list(&self.namespace, &selector)).await?;

        match found.len() {
            0 => Err(DesireError::NotFound(name.to_string())),
            1 => Ok(found.remove(0)),
            _ => Err(DesireError::DuplicateWorkload(name.to_string())),
        }
    }
}

#[async_trait]
impl<C, W> WorkloadManager for ControllerManager<C, W>
where
    C: ClusterClient,
    W: Workload,
{
    fn backend(&self) -> WorkloadBackend {
        W::BACKEND
    }

    #[instrument(level = "debug", skip(self, ctx, lrp), fields(app = %lrp.name, backend = %W::BACKEND))]
    async fn desire(&self, ctx: &CancellationToken, lrp: &Lrp) -> Result<(), DesireError> {
        let workload = to_workload::<W>(lrp);
        guarded(ctx, self.client.create(&self.namespace, &workload)).await?;
        debug!(replicas = lrp.target_instances, "workload created");
        Ok(())
    }

    #[instrument(level = "trace", skip(self, ctx), fields(backend = %W::BACKEND))]
    async fn get(&self, ctx: &CancellationToken, name: &str) -> Result<Lrp, DesireError> {
        let workload = self.find(ctx, name).await?;
        Ok(to_lrp(&workload))
    }

    #[instrument(level = "trace", skip(self, ctx), fields(backend = %W::BACKEND))]
    async fn list(&self, ctx: &CancellationToken) -> Result<Vec<Lrp>, DesireError> {
        let selector = LabelSelector::exists(LABEL_NAME);
        let workloads: Vec<W> = guarded(ctx, self.client.list(&self.namespace, &selector)).await?;
        Ok(workloads.iter().map(to_lrp).collect())
    }

    #[instrument(level = "debug", skip(self, ctx, update), fields(app = %update.name, backend = %W::BACKEND))]
    async fn update(
        &self,
        ctx: &CancellationToken,
        update: &LrpUpdate,
    ) -> Result<(), DesireError> {
        let mut workload = self.find(ctx, &update.name).await?;

        if let Some(instances) = update.instances {
            workload.set_replicas(instances);
        }
        if let Some(last_updated) = &update.last_updated {
            workload
                .meta_mut()
                .annotations
                .insert(LAST_UPDATED.to_string(), last_updated.clone());
        }

        guarded(ctx, self.client.replace(&self.namespace, &workload)).await?;
        debug!(replicas = workload.replicas(), "workload updated");
        Ok(())
    }

    #[instrument(level = "debug", skip(self, ctx), fields(backend = %W::BACKEND))]
    async fn delete(&self, ctx: &CancellationToken, name: &str) -> Result<(), DesireError> {
        guarded(
            ctx,
            self.client
                .delete::<W>(&self.namespace, name, Propagation::Background),
        )
        .await
    }
}

fn app_labels(name: &str) -> Labels {
    Labels::from([(LABEL_NAME.to_string(), name.to_string())])
}

fn to_workload<W: Workload>(lrp: &Lrp) -> W {
    let labels = app_labels(&lrp.name);
    let metadata = ObjectMeta::named(&lrp.name)
        .with_labels(labels.clone())
        .with_annotations(lrp.metadata.clone());

    W::assemble(
        metadata,
        MatchLabels {
            match_labels: labels.clone(),
        },
        pod_template(lrp, labels),
        lrp.target_instances,
    )
}

fn pod_template(lrp: &Lrp, labels: Labels) -> PodTemplateSpec {
    PodTemplateSpec {
        metadata: ObjectMeta::default().with_labels(labels),
        spec: PodSpec {
            containers: vec![Container {
                name: APP_CONTAINER.to_string(),
                image: lrp.image.clone(),
                command: lrp.command.clone(),
                env: to_env_vars(&lrp.env),
                ports: vec![ContainerPort {
                    name: "http".to_string(),
                    container_port: APP_PORT,
                }],
                ..Container::default()
            }],
            ..PodSpec::default()
        },
    }
}

pub(crate) fn to_env_vars(env: &Env) -> Vec<EnvVar> {
    env.iter()
        .map(|(name, value)| EnvVar {
            name: name.clone(),
            value: value.clone(),
        })
        .collect()
}

fn to_env(vars: &[EnvVar]) -> Env {
    vars.iter()
        .map(|v| (v.name.clone(), v.value.clone()))
        .collect()
}

fn to_lrp<W: Workload>(workload: &W) -> Lrp {
    let meta = workload.meta();
    let container = assert_single_container(&workload.template().spec.containers);

    let mut metadata: Metadata = meta.annotations.clone();
    metadata.entry(PROCESS_GUID.to_string()).or_default();

    Lrp {
        name: meta
            .labels
            .get(LABEL_NAME)
            .cloned()
            .unwrap_or_else(|| meta.name.clone()),
        image: container.image.clone(),
        command: container.command.clone(),
        env: to_env(&container.env),
        target_instances: workload.replicas(),
        metadata,
    }
}

/// The app container of a pod template.
///
/// # Panics
///
/// If the template does not hold exactly one container. Only single-container pods are ever
/// created, so anything else means the object was written by someone else.
fn assert_single_container(containers: &[Container]) -> &Container {
    match containers {
        [only] => only,
        _ => panic!(
            "expected exactly one container in pod template, found {}",
            containers.len()
        ),
    }
}
