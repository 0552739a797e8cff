use async_trait::async_trait;
use opi_bifrost::{Bifrost, Stager};
use opi_core::CancellationToken;
use opi_model::{
    DesireLrpRequest, DesiredLrp, DesiredLrpSchedulingInfo, StagingCompletion, StagingRequest,
    UpdateDesiredLrpRequest,
};

use crate::{error::ApiError, handler::ApiHandler};

/// [`ApiHandler`] delegating to [`Bifrost`] and [`Stager`].
///
/// Every request runs under a child of `shutdown`, so cancelling it aborts in-flight cluster
/// calls.
pub struct BifrostApiAdapter {
    bifrost: Bifrost,
    stager: Stager,
    shutdown: CancellationToken,
}

impl BifrostApiAdapter {
    pub fn new(bifrost: Bifrost, stager: Stager, shutdown: CancellationToken) -> Self {
        Self {
            bifrost,
            stager,
            shutdown,
        }
    }

    fn ctx(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}

#[async_trait]
impl ApiHandler for BifrostApiAdapter {
    async fn desire_app(&self, request: DesireLrpRequest) -> Result<(), ApiError> {
        self.bifrost
            .transfer(&self.ctx(), std::slice::from_ref(&request))
            .await
            .map_err(ApiError::from)
    }

    async fn list_apps(&self) -> Result<Vec<DesiredLrpSchedulingInfo>, ApiError> {
        Ok(self.bifrost.list(&self.ctx()).await?)
    }

    async fn get_app(&self, process_guid: &str) -> Result<DesiredLrp, ApiError> {
        Ok(self.bifrost.get(&self.ctx(), process_guid).await?)
    }

    async fn update_app(&self, request: UpdateDesiredLrpRequest) -> Result<(), ApiError> {
        Ok(self.bifrost.update(&self.ctx(), &request).await?)
    }

    async fn stop_app(&self, process_guid: &str) -> Result<(), ApiError> {
        Ok(self.bifrost.stop(&self.ctx(), process_guid).await?)
    }

    async fn stage(&self, staging_guid: &str, request: StagingRequest) -> Result<(), ApiError> {
        Ok(self.stager.stage(&self.ctx(), staging_guid, &request).await?)
    }

    async fn staging_complete(&self, completion: StagingCompletion) -> Result<(), ApiError> {
        Ok(self
            .stager
            .complete_staging(&self.ctx(), &completion)
            .await?)
    }
}
