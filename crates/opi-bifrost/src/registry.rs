use async_trait::async_trait;
use opi_model::{DesireLrpRequest, VcapApp};
use tracing::{debug, instrument};

use crate::error::StagingError;

/// Produces a runnable image for a request that only carries a droplet.
#[async_trait]
pub trait ImageResolver: Send + Sync {
    async fn resolve(
        &self,
        request: &DesireLrpRequest,
        app: &VcapApp,
    ) -> Result<String, StagingError>;
}

#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Base URL the droplet is pushed to.
    pub registry_url: String,
    /// Registry address as seen from cluster nodes; prefix of the resulting image.
    pub registry_ip: String,
    /// Base URL of the platform API serving droplets.
    pub cf_api_url: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            registry_url: "http://127.0.0.1:8080".to_string(),
            registry_ip: "127.0.0.1:8080".to_string(),
            cf_api_url: "http://127.0.0.1:9022".to_string(),
        }
    }
}

/// Downloads the app's droplet from the platform API and pushes it into the internal registry.
#[derive(Debug, Clone)]
pub struct RegistryStager {
    client: reqwest::Client,
    config: RegistryConfig,
}

impl RegistryStager {
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: RegistryConfig) -> Self {
        Self { client, config }
    }

    async fn download_droplet(&self, app_guid: &str) -> Result<Vec<u8>, StagingError> {
        let uri = droplet_download_uri(&self.config.cf_api_url, app_guid);
        let response = self
            .client
            .get(uri.as_str())
            .send()
            .await
            .map_err(|source| StagingError::Http {
                uri: uri.clone(),
                source,
            })?;
        let response = check_status(&uri, response)?;

        let body = response
            .bytes()
            .await
            .map_err(|source| StagingError::Http { uri, source })?;
        Ok(body.to_vec())
    }

    async fn push_droplet(
        &self,
        app: &VcapApp,
        droplet_hash: &str,
        droplet: Vec<u8>,
    ) -> Result<(), StagingError> {
        let uri = registry_stage_uri(
            &self.config.registry_url,
            &app.space_name,
            &app.app_name,
            droplet_hash,
        );
        debug!(%uri, bytes = droplet.len(), "pushing droplet to registry");

        let response = self
            .client
            .post(uri.as_str())
            .header(reqwest::header::CONTENT_TYPE, "application/gzip")
            .body(droplet)
            .send()
            .await
            .map_err(|source| StagingError::Http {
                uri: uri.clone(),
                source,
            })?;
        check_status(&uri, response)?;
        Ok(())
    }
}

#[async_trait]
impl ImageResolver for RegistryStager {
    #[instrument(level = "debug", skip(self, request, app), fields(process_guid = %request.process_guid, app_guid = %app.app_id))]
    async fn resolve(
        &self,
        request: &DesireLrpRequest,
        app: &VcapApp,
    ) -> Result<String, StagingError> {
        if request.droplet_hash.is_empty() {
            return Err(StagingError::MissingDroplet);
        }

        let droplet = self.download_droplet(&app.app_id).await?;
        self.push_droplet(app, &request.droplet_hash, droplet).await?;

        Ok(format!(
            "{}/cloudfoundry/app-name:{}",
            self.config.registry_ip, request.droplet_hash
        ))
    }
}

fn check_status(uri: &str, response: reqwest::Response) -> Result<reqwest::Response, StagingError> {
    let status = response.status();
    if !status.is_success() {
        return Err(StagingError::Status {
            uri: uri.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response)
}

fn droplet_download_uri(base_url: &str, app_guid: &str) -> String {
    format!("{base_url}/v2/apps/{app_guid}/droplet/download")
}

fn registry_stage_uri(base_url: &str, space: &str, app_name: &str, guid: &str) -> String {
    format!("{base_url}/v2/{space}/{app_name}/blobs/?guid={guid}")
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Router,
        body::Bytes,
        extract::{Path, RawQuery, State},
        http::{HeaderMap, StatusCode},
        routing::{get, post},
    };

    use super::*;

    #[derive(Clone, Default)]
    struct Registry {
        pushed: Arc<Mutex<Vec<(String, String, Option<String>, Option<String>, Vec<u8>)>>>,
        reject: bool,
    }

    async fn download(Path(guid): Path<String>) -> Result<&'static [u8], StatusCode> {
        if guid == "app-id" {
            Ok(b"droplet-bytes")
        } else {
            Err(StatusCode::NOT_FOUND)
        }
    }

    async fn push(
        State(registry): State<Registry>,
        Path((space, app)): Path<(String, String)>,
        RawQuery(query): RawQuery,
        headers: HeaderMap,
        body: Bytes,
    ) -> StatusCode {
        if registry.reject {
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        let content_type = headers
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        registry
            .pushed
            .lock()
            .unwrap()
            .push((space, app, query, content_type, body.to_vec()));
        StatusCode::CREATED
    }

    async fn start_test_server(registry: Registry) -> String {
        let app = Router::new()
            .route("/v2/apps/{guid}/droplet/download", get(download))
            .route("/v2/{space}/{app}/blobs/", post(push))
            .with_state(registry);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn stager(base_url: &str) -> RegistryStager {
        RegistryStager::new(RegistryConfig {
            registry_url: base_url.to_string(),
            registry_ip: "10.0.0.5:5000".to_string(),
            cf_api_url: base_url.to_string(),
        })
    }

    fn app() -> VcapApp {
        VcapApp {
            app_name: "dora".into(),
            app_id: "app-id".into(),
            space_name: "dev".into(),
            ..VcapApp::default()
        }
    }

    fn request(hash: &str) -> DesireLrpRequest {
        DesireLrpRequest {
            process_guid: "dora-guid".into(),
            droplet_hash: hash.into(),
            ..DesireLrpRequest::default()
        }
    }

    #[test]
    fn uris() {
        assert_eq!(
            droplet_download_uri("http://api", "a1"),
            "http://api/v2/apps/a1/droplet/download"
        );
        assert_eq!(
            registry_stage_uri("http://reg", "dev", "dora", "h1"),
            "http://reg/v2/dev/dora/blobs/?guid=h1"
        );
    }

    #[tokio::test]
    async fn pushes_droplet_and_names_image() {
        let registry = Registry::default();
        let base = start_test_server(registry.clone()).await;

        let image = stager(&base)
            .resolve(&request("abc123"), &app())
            .await
            .unwrap();
        assert_eq!(image, "10.0.0.5:5000/cloudfoundry/app-name:abc123");

        let pushed = registry.pushed.lock().unwrap();
        assert_eq!(pushed.len(), 1);
        let (space, app, query, content_type, body) = &pushed[0];
        assert_eq!(space, "dev");
        assert_eq!(app, "dora");
        assert_eq!(query.as_deref(), Some("guid=abc123"));
        assert_eq!(content_type.as_deref(), Some("application/gzip"));
        assert_eq!(body, b"droplet-bytes");
    }

    #[tokio::test]
    async fn missing_droplet_fails() {
        let registry = Registry::default();
        let base = start_test_server(registry.clone()).await;

        let mut unknown = app();
        unknown.app_id = "ghost".into();
        let err = stager(&base)
            .resolve(&request("abc123"), &unknown)
            .await
            .unwrap_err();
        assert!(matches!(err, StagingError::Status { status: 404, .. }));
        assert!(registry.pushed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn registry_rejection_fails_closed() {
        let base = start_test_server(Registry {
            reject: true,
            ..Registry::default()
        })
        .await;

        let err = stager(&base)
            .resolve(&request("abc123"), &app())
            .await
            .unwrap_err();
        assert!(matches!(err, StagingError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn request_without_hash_is_rejected() {
        let err = stager("http://127.0.0.1:1")
            .resolve(&request(""), &app())
            .await
            .unwrap_err();
        assert!(matches!(err, StagingError::MissingDroplet));
    }
}
