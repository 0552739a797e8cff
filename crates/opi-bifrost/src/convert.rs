use std::sync::Arc;

use async_trait::async_trait;
use opi_core::naming::is_dns_label;
use opi_model::{
    DesireLrpRequest, ENV_VCAP_APPLICATION, Env, EnvironmentVariable, LAST_UPDATED, Lrp, Metadata,
    PROCESS_GUID, VcapApp,
};
use serde_json::Value;
use tracing::debug;

use crate::{error::ConvertError, registry::ImageResolver};

/// Turns one platform desire request into an LRP.
///
/// Failures are per request; a batch driver drops the failing request and keeps going.
#[async_trait]
pub trait Converter: Send + Sync {
    async fn convert(&self, request: &DesireLrpRequest) -> Result<Lrp, ConvertError>;
}

/// [`Converter`] from a plain function.
pub struct ConvertFn<F>(pub F);

#[async_trait]
impl<F> Converter for ConvertFn<F>
where
    F: Fn(&DesireLrpRequest) -> Result<Lrp, ConvertError> + Send + Sync,
{
    async fn convert(&self, request: &DesireLrpRequest) -> Result<Lrp, ConvertError> {
        (self.0)(request)
    }
}

/// The production converter.
///
/// Requests without an image get one from the [`ImageResolver`]; a resolver failure fails the
/// conversion.
#[derive(Clone)]
pub struct LrpConverter {
    resolver: Arc<dyn ImageResolver>,
}

impl LrpConverter {
    pub fn new(resolver: Arc<dyn ImageResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Converter for LrpConverter {
    async fn convert(&self, request: &DesireLrpRequest) -> Result<Lrp, ConvertError> {
        let invalid = |source| ConvertError::InvalidVcapApplication {
            process_guid: request.process_guid.clone(),
            source,
        };

        let env = env_to_map(&request.environment);
        let app = VcapApp::from_env(&env).map_err(invalid)?;
        let mut metadata = match env.get(ENV_VCAP_APPLICATION) {
            Some(raw) => flatten_vcap(raw).map_err(invalid)?,
            None => Metadata::new(),
        };
        metadata.insert(PROCESS_GUID.to_string(), request.process_guid.clone());
        if !request.last_updated.is_empty() {
            metadata.insert(LAST_UPDATED.to_string(), request.last_updated.clone());
        }

        let name = if app.app_id.is_empty() {
            request.process_guid.clone()
        } else {
            app.app_id.clone()
        };
        if name.is_empty() {
            return Err(ConvertError::MissingAppName {
                process_guid: request.process_guid.clone(),
            });
        }
        if !is_dns_label(&name) {
            return Err(ConvertError::InvalidAppName {
                process_guid: request.process_guid.clone(),
                name,
            });
        }

        let image = if request.docker_image_url.is_empty() {
            let image = self.resolver.resolve(request, &app).await?;
            debug!(process_guid = %request.process_guid, %image, "image resolved from droplet");
            image
        } else {
            request.docker_image_url.clone()
        };

        Ok(Lrp {
            name,
            image,
            command: vec![request.start_command.clone()],
            env,
            target_instances: request.num_instances,
            metadata,
        })
    }
}

/// List-to-map projection of platform environment variables; later duplicates win.
pub fn env_to_map(vars: &[EnvironmentVariable]) -> Env {
    vars.iter()
        .map(|v| (v.name.clone(), v.value.clone()))
        .collect()
}

/// Flatten a `VCAP_APPLICATION` object into metadata entries.
///
/// String values are copied verbatim; anything else (route lists, limits) is kept as its JSON
/// text.
pub fn flatten_vcap(raw: &str) -> Result<Metadata, serde_json::Error> {
    let object: serde_json::Map<String, Value> = serde_json::from_str(raw)?;
    Ok(object
        .into_iter()
        .map(|(k, v)| {
            let v = match v {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (k, v)
        })
        .collect())
}
