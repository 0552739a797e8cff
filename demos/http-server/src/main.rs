use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{info, warn};

use opi_api::{BifrostApiAdapter, HttpApi};
use opi_bifrost::{Bifrost, LrpConverter, RegistryConfig, RegistryStager, Stager, StagerConfig};
use opi_core::{
    CancellationToken, ClusterDesirer, ClusterTaskDesirer, DesirerConfig, MemoryCluster,
    TaskConfig,
};
use opi_observe::logger_init;
use opi_route::{HttpPublisher, LogPublisher, Publisher, RouteEmitter, RouteIngress};

mod config;
use config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1) Config + logger
    let cfg = ServerConfig::from_env()?;
    logger_init(&cfg.logger)?;
    info!(namespace = %cfg.namespace, backend = %cfg.backend, "logger initialized");

    let shutdown = CancellationToken::new();
    let cluster = Arc::new(MemoryCluster::with_namespace(&cfg.namespace));

    // 2) Routing
    let publisher: Arc<dyn Publisher> = match &cfg.route_endpoint {
        Some(endpoint) => Arc::new(HttpPublisher::new(endpoint.clone())),
        None => Arc::new(LogPublisher),
    };
    let (route_tx, route_rx) = mpsc::channel(64);
    let emitter = RouteEmitter::new(publisher, route_rx);
    let emitter = tokio::spawn(emitter.run(shutdown.child_token()));
    let ingress = RouteIngress::new(route_tx).with_cluster_domain(cfg.cluster_domain.clone());
    info!(endpoint = ?cfg.route_endpoint, "route emitter started");

    // 3) Desire pipeline
    let desirer = ClusterDesirer::new(
        cluster.clone(),
        DesirerConfig {
            namespace: cfg.namespace.clone(),
            backend: cfg.backend,
            ..DesirerConfig::default()
        },
        Arc::new(ingress),
    );

    let defaults = RegistryConfig::default();
    let registry = RegistryStager::new(RegistryConfig {
        registry_url: cfg.registry_url.clone().unwrap_or(defaults.registry_url),
        registry_ip: cfg.registry_ip.clone().unwrap_or(defaults.registry_ip),
        cf_api_url: cfg.cf_api_url.clone().unwrap_or(defaults.cf_api_url),
    });
    let bifrost = Bifrost::new(
        Arc::new(LrpConverter::new(Arc::new(registry))),
        Arc::new(desirer),
    );

    // 4) Staging
    let defaults = TaskConfig::default();
    let tasks = ClusterTaskDesirer::new(
        cluster,
        TaskConfig {
            namespace: cfg.namespace.clone(),
            cc_uploader_ip: cfg.cc_uploader_ip.clone().unwrap_or(defaults.cc_uploader_ip),
            certs_secret_name: cfg
                .certs_secret_name
                .clone()
                .unwrap_or(defaults.certs_secret_name),
            ..defaults
        },
    );
    if cfg.cc_uploader_ip.is_none() {
        warn!("OPI_CC_UPLOADER_IP not set; staging pods get no uploader host alias");
    }
    let defaults = StagerConfig::default();
    let stager = Stager::new(
        Arc::new(tasks),
        StagerConfig {
            image: cfg.stager_image.clone().unwrap_or(defaults.image),
            eirini_address: cfg.eirini_address.clone().unwrap_or(defaults.eirini_address),
            callback_host: cfg.callback_host.clone(),
        },
    );

    // 5) HTTP API
    let adapter = BifrostApiAdapter::new(bifrost, stager, shutdown.clone());
    let app = HttpApi::new(Arc::new(adapter)).router();

    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr)
        .await
        .with_context(|| format!("bind {}", cfg.listen_addr))?;
    info!("http api listening on {}", cfg.listen_addr);
    info!("press Ctrl+C to stop");

    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("shutting down..."),
                Err(e) => warn!(error = %e, "failed to listen for ctrl-c; shutting down"),
            }
            signal.cancel();
        })
        .await?;

    shutdown.cancel();
    emitter.await?;
    Ok(())
}
