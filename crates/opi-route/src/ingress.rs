use async_trait::async_trait;
use opi_core::{IngressError, IngressManager, naming::service_name, service::SERVICE_PORT};
use opi_model::{Lrp, VcapApp};
use tokio::sync::mpsc;
use tracing::trace;

use crate::message::RegistryMessage;

/// [`IngressManager`] that queues router registrations for the [`crate::RouteEmitter`].
///
/// Each app is registered under the cluster DNS name of its stable service.
#[derive(Clone)]
pub struct RouteIngress {
    work: mpsc::Sender<Vec<RegistryMessage>>,
    cluster_domain: String,
}

impl RouteIngress {
    pub fn new(work: mpsc::Sender<Vec<RegistryMessage>>) -> Self {
        Self {
            work,
            cluster_domain: "cluster.local".to_string(),
        }
    }

    pub fn with_cluster_domain(mut self, domain: impl Into<String>) -> Self {
        self.cluster_domain = domain.into();
        self
    }

    fn messages(&self, namespace: &str, lrp: &Lrp, app: &VcapApp) -> Vec<RegistryMessage> {
        if app.app_uris.is_empty() {
            return Vec::new();
        }
        vec![RegistryMessage {
            host: format!(
                "{}.{namespace}.svc.{}",
                service_name(&lrp.name),
                self.cluster_domain
            ),
            port: SERVICE_PORT,
            uris: app.app_uris.clone(),
            app: app.app_name.clone(),
            private_instance_id: lrp.process_guid().unwrap_or(&lrp.name).to_string(),
        }]
    }
}

#[async_trait]
impl IngressManager for RouteIngress {
    async fn update_ingress(
        &self,
        namespace: &str,
        lrp: &Lrp,
        app: &VcapApp,
    ) -> Result<(), IngressError> {
        let batch = self.messages(namespace, lrp, app);
        if batch.is_empty() {
            trace!(app = %lrp.name, "no routes to register");
            return Ok(());
        }
        self.work
            .send(batch)
            .await
            .map_err(|_| IngressError("route emitter is not running".to_string()))
    }
}
