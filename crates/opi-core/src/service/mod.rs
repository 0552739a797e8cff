//! Stable and headless network identities of an app.
//!
//! Unlike workload creation, creating a service that already exists is an error here: the name is
//! derived deterministically, so a duplicate means two apps collided on it.

use std::sync::Arc;

use async_trait::async_trait;
use opi_model::{ANNOTATION_ROUTES, LABEL_NAME, Lrp};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::{
    cluster::{
        CLUSTER_IP_NONE, ClusterClient, Labels, ObjectMeta, Propagation, Service, ServicePort,
        ServiceSpec,
    },
    ctx::guarded,
    error::DesireError,
    naming::{headless_service_name, service_name},
};

/// Port name and number exposed by every app service.
pub const SERVICE_PORT_NAME: &str = "service";
pub const SERVICE_PORT: u16 = 8080;

/// Routes annotation value for an app without routes.
const NO_ROUTES: &str = "[]";

#[async_trait]
pub trait ServiceManager: Send + Sync {
    /// Create the load-balanced service of `lrp`; fails if it already exists.
    async fn create(&self, ctx: &CancellationToken, lrp: &Lrp) -> Result<(), DesireError>;

    /// Create the headless service of `lrp`; fails if it already exists.
    async fn create_headless(&self, ctx: &CancellationToken, lrp: &Lrp)
    -> Result<(), DesireError>;

    /// Delete the load-balanced service of `app_name`; fails if it is absent.
    async fn delete(&self, ctx: &CancellationToken, app_name: &str) -> Result<(), DesireError>;

    /// Delete the headless service of `app_name`; fails if it is absent.
    async fn delete_headless(
        &self,
        ctx: &CancellationToken,
        app_name: &str,
    ) -> Result<(), DesireError>;
}

/// [`ServiceManager`] backed by a [`ClusterClient`].
pub struct ClusterServiceManager<C> {
    client: Arc<C>,
    namespace: String,
}

impl<C: ClusterClient> ClusterServiceManager<C> {
    pub fn new(client: Arc<C>, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    async fn create_named(
        &self,
        ctx: &CancellationToken,
        service: Service,
    ) -> Result<(), DesireError> {
        guarded(ctx, self.client.create(&self.namespace, &service)).await?;
        debug!(service = %service.metadata.name, headless = service.is_headless(), "service created");
        Ok(())
    }

    async fn delete_named(&self, ctx: &CancellationToken, name: &str) -> Result<(), DesireError> {
        guarded(
            ctx,
            self.client
                .delete::<Service>(&self.namespace, name, Propagation::Background),
        )
        .await
    }
}

#[async_trait]
impl<C: ClusterClient> ServiceManager for ClusterServiceManager<C> {
    #[instrument(level = "debug", skip(self, ctx, lrp), fields(app = %lrp.name))]
    async fn create(&self, ctx: &CancellationToken, lrp: &Lrp) -> Result<(), DesireError> {
        self.create_named(ctx, to_service(lrp, service_name(&lrp.name), None))
            .await
    }

    #[instrument(level = "debug", skip(self, ctx, lrp), fields(app = %lrp.name))]
    async fn create_headless(
        &self,
        ctx: &CancellationToken,
        lrp: &Lrp,
    ) -> Result<(), DesireError> {
        let service = to_service(
            lrp,
            headless_service_name(&lrp.name),
            Some(CLUSTER_IP_NONE.to_string()),
        );
        self.create_named(ctx, service).await
    }

    #[instrument(level = "debug", skip(self, ctx))]
    async fn delete(&self, ctx: &CancellationToken, app_name: &str) -> Result<(), DesireError> {
        self.delete_named(ctx, &service_name(app_name)).await
    }

    #[instrument(level = "debug", skip(self, ctx))]
    async fn delete_headless(
        &self,
        ctx: &CancellationToken,
        app_name: &str,
    ) -> Result<(), DesireError> {
        self.delete_named(ctx, &headless_service_name(app_name))
            .await
    }
}

fn to_service(lrp: &Lrp, name: String, cluster_ip: Option<String>) -> Service {
    let labels = Labels::from([(LABEL_NAME.to_string(), lrp.name.clone())]);
    let annotations = Labels::from([(
        ANNOTATION_ROUTES.to_string(),
        lrp.routes().unwrap_or(NO_ROUTES).to_string(),
    )]);

    Service {
        metadata: ObjectMeta::named(name)
            .with_labels(labels.clone())
            .with_annotations(annotations),
        spec: ServiceSpec {
            cluster_ip,
            ports: vec![ServicePort {
                name: SERVICE_PORT_NAME.to_string(),
                port: SERVICE_PORT,
            }],
            selector: labels,
        },
    }
}
