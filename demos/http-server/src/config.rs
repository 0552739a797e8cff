use std::env;

use anyhow::{Context, Result};
use opi_core::WorkloadBackend;
use opi_observe::{LoggerConfig, LoggerFormat};

/// Server settings read from `OPI_*` environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub namespace: String,
    pub backend: WorkloadBackend,
    pub logger: LoggerConfig,
    /// Route publisher endpoint; registrations are only logged when unset.
    pub route_endpoint: Option<String>,
    pub cluster_domain: String,
    pub registry_url: Option<String>,
    pub registry_ip: Option<String>,
    pub cf_api_url: Option<String>,
    pub stager_image: Option<String>,
    pub eirini_address: Option<String>,
    pub callback_host: Option<String>,
    /// Address of the droplet uploader as seen from staging pods.
    pub cc_uploader_ip: Option<String>,
    pub certs_secret_name: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let backend = match var("OPI_WORKLOAD_BACKEND") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("OPI_WORKLOAD_BACKEND={raw:?}"))?,
            None => WorkloadBackend::default(),
        };

        let mut logger = LoggerConfig::default();
        if let Some(level) = var("OPI_LOG_LEVEL") {
            logger.level = level;
        }
        if let Some(raw) = var("OPI_LOG_FORMAT") {
            logger.format = raw
                .parse::<LoggerFormat>()
                .with_context(|| format!("OPI_LOG_FORMAT={raw:?}"))?;
        }

        Ok(Self {
            listen_addr: var("OPI_LISTEN_ADDR").unwrap_or_else(|| "0.0.0.0:8085".to_string()),
            namespace: var("OPI_NAMESPACE").unwrap_or_else(|| "opi".to_string()),
            backend,
            logger,
            route_endpoint: var("OPI_ROUTE_ENDPOINT"),
            cluster_domain: var("OPI_CLUSTER_DOMAIN")
                .unwrap_or_else(|| "cluster.local".to_string()),
            registry_url: var("OPI_REGISTRY_URL"),
            registry_ip: var("OPI_REGISTRY_IP"),
            cf_api_url: var("OPI_CF_API_URL"),
            stager_image: var("OPI_STAGER_IMAGE"),
            eirini_address: var("OPI_EIRINI_ADDRESS"),
            callback_host: var("OPI_CALLBACK_HOST"),
            cc_uploader_ip: var("OPI_CC_UPLOADER_IP"),
            certs_secret_name: var("OPI_CERTS_SECRET_NAME"),
        })
    }
}

/// Non-empty value of `key`.
fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
