//! Bounded one-shot jobs.
//!
//! Every job carries an active deadline; the orchestrator kills it once the deadline passes. No
//! progress is polled from here.

use std::sync::Arc;

use async_trait::async_trait;
use opi_model::{LABEL_NAME, Task};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::{
    cluster::{
        ClusterClient, Container, HostAlias, Job, JobSpec, Labels, ObjectMeta, PodSpec,
        PodTemplateSpec, Propagation, RestartPolicy, SecretVolumeSource, Volume, VolumeMount,
    },
    ctx::{ensure_namespace, guarded},
    error::DesireError,
    workload::to_env_vars,
};

/// Name of the container running a task.
pub const TASK_CONTAINER: &str = "opi-task";
/// Hostname staging tasks use to reach the droplet uploader.
pub const CC_UPLOADER_HOSTNAME: &str = "cc-uploader.service.cf.internal";
pub const CC_CERTS_VOLUME: &str = "cc-certs-volume";
pub const CC_CERTS_MOUNT_PATH: &str = "/cc-certs";

/// Upper bound on task runtime, in seconds.
pub const DEFAULT_ACTIVE_DEADLINE_SECONDS: u64 = 900;

#[derive(Debug, Clone)]
pub struct TaskConfig {
    pub namespace: String,
    /// Address the uploader hostname resolves to inside staging pods; no host alias is added
    /// when empty.
    pub cc_uploader_ip: String,
    /// Secret holding the mutual-TLS material for the uploader.
    pub certs_secret_name: String,
    pub active_deadline_seconds: u64,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            namespace: "opi".to_string(),
            cc_uploader_ip: String::new(),
            certs_secret_name: "cc-uploader-certs".to_string(),
            active_deadline_seconds: DEFAULT_ACTIVE_DEADLINE_SECONDS,
        }
    }
}

#[async_trait]
pub trait TaskDesirer: Send + Sync {
    /// Start a plain task.
    async fn desire(&self, ctx: &CancellationToken, task: &Task) -> Result<(), DesireError>;

    /// Start a staging task that can call back into the droplet uploader over mutual TLS.
    async fn desire_staging(&self, ctx: &CancellationToken, task: &Task)
    -> Result<(), DesireError>;

    /// Delete the job `name` and its pods.
    ///
    /// A job that is already gone counts as deleted.
    async fn delete(&self, ctx: &CancellationToken, name: &str) -> Result<(), DesireError>;
}

/// [`TaskDesirer`] that runs tasks as orchestrator jobs.
pub struct ClusterTaskDesirer<C> {
    client: Arc<C>,
    config: TaskConfig,
}

impl<C: ClusterClient> ClusterTaskDesirer<C> {
    pub fn new(client: Arc<C>, config: TaskConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    fn to_job(&self, task: &Task) -> Result<Job, DesireError> {
        let name = task.name().ok_or_else(|| {
            DesireError::InvalidTask("task environment has no staging guid".to_string())
        })?;
        let labels = Labels::from([(
            LABEL_NAME.to_string(),
            task.app_id().unwrap_or_default().to_string(),
        )]);

        Ok(Job {
            metadata: ObjectMeta::named(name)
                .with_labels(labels.clone())
                .with_annotations(task.metadata.clone()),
            spec: JobSpec {
                active_deadline_seconds: Some(self.config.active_deadline_seconds),
                template: PodTemplateSpec {
                    metadata: ObjectMeta::default().with_labels(labels),
                    spec: PodSpec {
                        containers: vec![Container {
                            name: TASK_CONTAINER.to_string(),
                            image: task.image.clone(),
                            env: to_env_vars(&task.env),
                            ..Container::default()
                        }],
                        restart_policy: RestartPolicy::Never,
                        ..PodSpec::default()
                    },
                },
            },
        })
    }

    fn to_staging_job(&self, task: &Task) -> Result<Job, DesireError> {
        let mut job = self.to_job(task)?;
        let pod = &mut job.spec.template.spec;

        if !self.config.cc_uploader_ip.is_empty() {
            pod.host_aliases = vec![HostAlias {
                ip: self.config.cc_uploader_ip.clone(),
                hostnames: vec![CC_UPLOADER_HOSTNAME.to_string()],
            }];
        }
        pod.volumes = vec![Volume {
            name: CC_CERTS_VOLUME.to_string(),
            secret: Some(SecretVolumeSource {
                secret_name: self.config.certs_secret_name.clone(),
            }),
        }];
        for container in &mut pod.containers {
            container.volume_mounts = vec![VolumeMount {
                name: CC_CERTS_VOLUME.to_string(),
                mount_path: CC_CERTS_MOUNT_PATH.to_string(),
                read_only: true,
            }];
        }
        Ok(job)
    }

    async fn create(&self, ctx: &CancellationToken, job: Job) -> Result<(), DesireError> {
        ensure_namespace(ctx, self.client.as_ref(), &self.config.namespace).await?;
        guarded(ctx, self.client.create(&self.config.namespace, &job)).await?;
        debug!(job = %job.metadata.name, "job created");
        Ok(())
    }
}

#[async_trait]
impl<C: ClusterClient> TaskDesirer for ClusterTaskDesirer<C> {
    #[instrument(level = "debug", skip(self, ctx, task), fields(task = ?task.name()))]
    async fn desire(&self, ctx: &CancellationToken, task: &Task) -> Result<(), DesireError> {
        let job = self.to_job(task)?;
        self.create(ctx, job).await
    }

    #[instrument(level = "debug", skip(self, ctx, task), fields(task = ?task.name()))]
    async fn desire_staging(
        &self,
        ctx: &CancellationToken,
        task: &Task,
    ) -> Result<(), DesireError> {
        let job = self.to_staging_job(task)?;
        self.create(ctx, job).await
    }

    #[instrument(level = "debug", skip(self, ctx))]
    async fn delete(&self, ctx: &CancellationToken, name: &str) -> Result<(), DesireError> {
        let res = guarded(
            ctx,
            self.client
                .delete::<Job>(&self.config.namespace, name, Propagation::Background),
        )
        .await;

        match res {
            Err(e) if e.is_not_found() => {
                debug!("job already gone");
                Ok(())
            }
            other => other,
        }
    }
}
