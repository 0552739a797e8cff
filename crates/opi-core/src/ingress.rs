use async_trait::async_trait;
use opi_model::{Lrp, VcapApp};

use crate::error::IngressError;

/// Routing collaborator notified once per desired LRP.
#[async_trait]
pub trait IngressManager: Send + Sync {
    async fn update_ingress(
        &self,
        namespace: &str,
        lrp: &Lrp,
        app: &VcapApp,
    ) -> Result<(), IngressError>;
}
