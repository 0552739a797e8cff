use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use opi_bifrost::BifrostError;
use opi_core::{ClusterError, DesireError};
use opi_model::{
    DesireLrpRequest, DesiredLrp, DesiredLrpSchedulingInfo, StagingCompletion, StagingRequest,
    UpdateDesiredLrpRequest,
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::error;

use crate::{error::ApiError, handler::ApiHandler};

/// HTTP API service builder.
pub struct HttpApi<H> {
    handler: Arc<H>,
}

impl<H> HttpApi<H>
where
    H: ApiHandler,
{
    pub fn new(handler: Arc<H>) -> Self {
        Self { handler }
    }

    /// Build axum router with mounted endpoints.
    ///
    /// Routes:
    /// - PUT /apps/{process_guid} - Desire app
    /// - GET /apps - List apps
    /// - GET /apps/{process_guid} - Get app
    /// - POST /apps/{process_guid} - Update app
    /// - PUT /apps/{process_guid}/stop - Stop app
    /// - PUT /stage/{staging_guid} - Stage app
    /// - PUT /stage/{staging_guid}/completed - Staging finished
    pub fn router(self) -> Router {
        Router::new()
            .route("/apps", get(list_apps::<H>))
            .route(
                "/apps/{process_guid}",
                put(desire_app::<H>)
                    .get(get_app::<H>)
                    .post(update_app::<H>),
            )
            .route("/apps/{process_guid}/stop", put(stop_app::<H>))
            .route("/stage/{staging_guid}", put(stage::<H>))
            .route("/stage/{staging_guid}/completed", put(staging_complete::<H>))
            .with_state(self.handler)
    }
}

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize)]
struct ListAppsResponse {
    desired_lrp_scheduling_infos: Vec<DesiredLrpSchedulingInfo>,
}

#[derive(Debug, Serialize)]
struct GetAppResponse {
    desired_lrp: DesiredLrp,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorMessage,
}

#[derive(Debug, Serialize)]
struct ErrorMessage {
    message: String,
}

/// Parse a JSON body, reporting malformed input as a 400 with an error body.
fn parse<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::InvalidRequest(format!("invalid json: {e}")))
}

fn ensure_guid(kind: &str, path: &str, body: &str) -> Result<(), ApiError> {
    if path != body {
        return Err(ApiError::InvalidRequest(format!(
            "{kind} mismatch: path {path:?}, body {body:?}"
        )));
    }
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// PUT /apps/{process_guid}
async fn desire_app<H>(
    State(handler): State<Arc<H>>,
    Path(process_guid): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let request: DesireLrpRequest = parse(&body)?;
    ensure_guid("process guid", &process_guid, &request.process_guid)?;

    handler.desire_app(request).await?;
    Ok(StatusCode::ACCEPTED)
}

/// GET /apps
async fn list_apps<H>(State(handler): State<Arc<H>>) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let infos = handler.list_apps().await?;
    Ok(Json(ListAppsResponse {
        desired_lrp_scheduling_infos: infos,
    }))
}

/// GET /apps/{process_guid}
async fn get_app<H>(
    State(handler): State<Arc<H>>,
    Path(process_guid): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let desired_lrp = handler.get_app(&process_guid).await?;
    Ok(Json(GetAppResponse { desired_lrp }))
}

/// POST /apps/{process_guid}
async fn update_app<H>(
    State(handler): State<Arc<H>>,
    Path(process_guid): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let request: UpdateDesiredLrpRequest = parse(&body)?;
    ensure_guid("process guid", &process_guid, &request.process_guid)?;

    handler.update_app(request).await?;
    Ok(StatusCode::OK)
}

/// PUT /apps/{process_guid}/stop
async fn stop_app<H>(
    State(handler): State<Arc<H>>,
    Path(process_guid): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    handler.stop_app(&process_guid).await?;
    Ok(StatusCode::OK)
}

/// PUT /stage/{staging_guid}
async fn stage<H>(
    State(handler): State<Arc<H>>,
    Path(staging_guid): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let request: StagingRequest = parse(&body)?;
    handler.stage(&staging_guid, request).await?;
    Ok(StatusCode::ACCEPTED)
}

/// PUT /stage/{staging_guid}/completed
async fn staging_complete<H>(
    State(handler): State<Arc<H>>,
    Path(staging_guid): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let mut completion: StagingCompletion = parse(&body)?;
    if completion.task_guid.is_empty() {
        completion.task_guid = staging_guid;
    } else {
        ensure_guid("task guid", &staging_guid, &completion.task_guid)?;
    }

    handler.staging_complete(completion).await?;
    Ok(StatusCode::OK)
}

// ============================================================================
// Errors
// ============================================================================

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Bifrost(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            ApiError::Bifrost(BifrostError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
            ApiError::Bifrost(BifrostError::Desire(DesireError::Cluster(
                ClusterError::Conflict { .. },
            ))) => StatusCode::CONFLICT,
            ApiError::Bifrost(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let body = ErrorBody {
            error: ErrorMessage {
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use opi_model::DesiredLrpUpdate;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;

    #[derive(Default)]
    struct FakeHandler {
        desired: Mutex<Vec<DesireLrpRequest>>,
        updates: Mutex<Vec<UpdateDesiredLrpRequest>>,
        completions: Mutex<Vec<StagingCompletion>>,
        fail_updates: bool,
    }

    #[async_trait]
    impl ApiHandler for FakeHandler {
        async fn desire_app(&self, request: DesireLrpRequest) -> Result<(), ApiError> {
            self.desired.lock().unwrap().push(request);
            Ok(())
        }

        async fn list_apps(&self) -> Result<Vec<DesiredLrpSchedulingInfo>, ApiError> {
            Ok(vec![DesiredLrpSchedulingInfo {
                process_guid: "guid-1".into(),
            }])
        }

        async fn get_app(&self, process_guid: &str) -> Result<DesiredLrp, ApiError> {
            match process_guid {
                "guid-1" => Ok(DesiredLrp {
                    process_guid: "guid-1".into(),
                    instances: 3,
                }),
                other => Err(BifrostError::NotFound(other.to_string()).into()),
            }
        }

        async fn update_app(&self, request: UpdateDesiredLrpRequest) -> Result<(), ApiError> {
            if self.fail_updates {
                return Err(ApiError::Internal("cluster unavailable".into()));
            }
            self.updates.lock().unwrap().push(request);
            Ok(())
        }

        async fn stop_app(&self, _process_guid: &str) -> Result<(), ApiError> {
            Ok(())
        }

        async fn stage(&self, staging_guid: &str, _request: StagingRequest) -> Result<(), ApiError> {
            if staging_guid.is_empty() {
                return Err(BifrostError::InvalidRequest("empty staging guid".into()).into());
            }
            Ok(())
        }

        async fn staging_complete(&self, completion: StagingCompletion) -> Result<(), ApiError> {
            self.completions.lock().unwrap().push(completion);
            Ok(())
        }
    }

    async fn send(handler: Arc<FakeHandler>, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
        let app = HttpApi::new(handler).router();
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn desire_accepts_matching_guid() {
        let handler = Arc::new(FakeHandler::default());
        let body = json!({"process_guid": "guid-1", "docker_image": "busybox", "num_instances": 2});

        let (status, _) = send(handler.clone(), "PUT", "/apps/guid-1", &body.to_string()).await;

        assert_eq!(status, StatusCode::ACCEPTED);
        let desired = handler.desired.lock().unwrap();
        assert_eq!(desired[0].docker_image_url, "busybox");
        assert_eq!(desired[0].num_instances, 2);
    }

    #[tokio::test]
    async fn desire_rejects_guid_mismatch() {
        let handler = Arc::new(FakeHandler::default());
        let body = json!({"process_guid": "other"});

        let (status, value) = send(handler.clone(), "PUT", "/apps/guid-1", &body.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(value["error"]["message"].as_str().unwrap().contains("mismatch"));
        assert!(handler.desired.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_wraps_scheduling_infos() {
        let (status, value) = send(Arc::new(FakeHandler::default()), "GET", "/apps", "").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            value,
            json!({"desired_lrp_scheduling_infos": [{"process_guid": "guid-1"}]})
        );
    }

    #[tokio::test]
    async fn get_returns_app_or_404() {
        let handler = Arc::new(FakeHandler::default());

        let (status, value) = send(handler.clone(), "GET", "/apps/guid-1", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["desired_lrp"]["instances"], 3);

        let (status, value) = send(handler, "GET", "/apps/ghost", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(value["error"]["message"].is_string());
    }

    #[tokio::test]
    async fn update_succeeds() {
        let handler = Arc::new(FakeHandler::default());
        let body = json!({"process_guid": "guid-1", "update": {"instances": 5}});

        let (status, _) = send(handler.clone(), "POST", "/apps/guid-1", &body.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            handler.updates.lock().unwrap()[0].update,
            DesiredLrpUpdate {
                instances: Some(5),
                annotation: None,
            }
        );
    }

    #[tokio::test]
    async fn update_rejects_bad_input_without_calling_handler() {
        let handler = Arc::new(FakeHandler::default());

        let mismatch = json!({"process_guid": "other", "update": {"instances": 5}});
        let (status, value) =
            send(handler.clone(), "POST", "/apps/guid-1", &mismatch.to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(value["error"]["message"].is_string());

        let (status, value) = send(handler.clone(), "POST", "/apps/guid-1", "{ not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(value["error"]["message"].as_str().unwrap().contains("invalid json"));

        assert!(handler.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_failure_is_500() {
        let handler = Arc::new(FakeHandler {
            fail_updates: true,
            ..FakeHandler::default()
        });
        let body = json!({"process_guid": "guid-1", "update": {"instances": 5}});

        let (status, value) = send(handler, "POST", "/apps/guid-1", &body.to_string()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(value["error"]["message"].as_str().unwrap().contains("cluster unavailable"));
    }

    #[tokio::test]
    async fn stop_and_stage() {
        let handler = Arc::new(FakeHandler::default());

        let (status, _) = send(handler.clone(), "PUT", "/apps/guid-1/stop", "").await;
        assert_eq!(status, StatusCode::OK);

        let body = json!({"app_guid": "app-1"});
        let (status, _) = send(handler, "PUT", "/stage/stg-1", &body.to_string()).await;
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn staging_completion_takes_guid_from_path() {
        let handler = Arc::new(FakeHandler::default());

        let (status, _) = send(
            handler.clone(),
            "PUT",
            "/stage/stg-1/completed",
            &json!({"failed": false}).to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(handler.completions.lock().unwrap()[0].task_guid, "stg-1");

        let (status, _) = send(
            handler.clone(),
            "PUT",
            "/stage/stg-1/completed",
            &json!({"task_guid": "stg-2"}).to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(handler.completions.lock().unwrap().len(), 1);
    }

    #[test]
    fn conflict_maps_to_409() {
        let err = ApiError::from(BifrostError::Desire(DesireError::Cluster(
            ClusterError::Conflict {
                kind: opi_core::ResourceKind::Deployment,
                name: "app".into(),
            },
        )));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }
}
