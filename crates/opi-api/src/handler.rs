use async_trait::async_trait;
use opi_model::{
    DesireLrpRequest, DesiredLrp, DesiredLrpSchedulingInfo, StagingCompletion, StagingRequest,
    UpdateDesiredLrpRequest,
};

use crate::error::ApiError;

/// Platform-facing operations, independent of the transport serving them.
///
/// [`crate::BifrostApiAdapter`] is the stock implementation; wrap or replace it to add auth,
/// auditing and the like.
#[async_trait]
pub trait ApiHandler: Send + Sync + 'static {
    /// Desire one app.
    async fn desire_app(&self, request: DesireLrpRequest) -> Result<(), ApiError>;

    async fn list_apps(&self) -> Result<Vec<DesiredLrpSchedulingInfo>, ApiError>;

    async fn get_app(&self, process_guid: &str) -> Result<DesiredLrp, ApiError>;

    async fn update_app(&self, request: UpdateDesiredLrpRequest) -> Result<(), ApiError>;

    async fn stop_app(&self, process_guid: &str) -> Result<(), ApiError>;

    /// Start staging an app.
    async fn stage(&self, staging_guid: &str, request: StagingRequest) -> Result<(), ApiError>;

    /// Record that a staging task has finished.
    async fn staging_complete(&self, completion: StagingCompletion) -> Result<(), ApiError>;
}
