use std::sync::Arc;

use opi_core::{CancellationToken, Desirer};
use opi_model::{
    DesireLrpRequest, DesiredLrp, DesiredLrpSchedulingInfo, Lrp, LrpUpdate,
    UpdateDesiredLrpRequest,
};
use tracing::{debug, error, instrument};

use crate::{convert::Converter, error::BifrostError};

/// Entry point for platform desire traffic.
///
/// Apps are addressed by process GUID here; the GUID is resolved to the app name through the
/// `process_guid` metadata of the desired LRPs.
#[derive(Clone)]
pub struct Bifrost {
    converter: Arc<dyn Converter>,
    desirer: Arc<dyn Desirer>,
}

impl Bifrost {
    pub fn new(converter: Arc<dyn Converter>, desirer: Arc<dyn Desirer>) -> Self {
        Self { converter, desirer }
    }

    /// Convert and desire a batch of requests.
    ///
    /// A request that fails to convert is logged and dropped; the rest of the batch is still
    /// desired.
    #[instrument(level = "debug", skip_all, fields(count = requests.len()))]
    pub async fn transfer(
        &self,
        ctx: &CancellationToken,
        requests: &[DesireLrpRequest],
    ) -> Result<(), BifrostError> {
        let mut lrps = Vec::with_capacity(requests.len());
        for request in requests {
            match self.converter.convert(request).await {
                Ok(lrp) => lrps.push(lrp),
                Err(e) => {
                    error!(process_guid = %request.process_guid, error = %e, "failed to convert desire request")
                }
            }
        }

        debug!(converted = lrps.len(), "desiring converted lrps");
        self.desirer.desire(ctx, &lrps).await?;
        Ok(())
    }

    pub async fn list(
        &self,
        ctx: &CancellationToken,
    ) -> Result<Vec<DesiredLrpSchedulingInfo>, BifrostError> {
        let lrps = self.desirer.list(ctx).await.inspect_err(|e| {
            error!(error = %e, "failed to list desired lrps");
        })?;

        Ok(lrps
            .iter()
            .map(|lrp| DesiredLrpSchedulingInfo {
                process_guid: lrp.process_guid().unwrap_or_default().to_string(),
            })
            .collect())
    }

    pub async fn get(
        &self,
        ctx: &CancellationToken,
        process_guid: &str,
    ) -> Result<DesiredLrp, BifrostError> {
        let lrp = self.find(ctx, process_guid).await?;
        Ok(DesiredLrp {
            process_guid: process_guid.to_string(),
            instances: lrp.target_instances,
        })
    }

    /// Apply an instance-count change.
    #[instrument(level = "debug", skip_all, fields(process_guid = %request.process_guid))]
    pub async fn update(
        &self,
        ctx: &CancellationToken,
        request: &UpdateDesiredLrpRequest,
    ) -> Result<(), BifrostError> {
        let lrp = self.find(ctx, &request.process_guid).await?;
        let update = LrpUpdate {
            name: lrp.name,
            instances: request.update.instances,
            last_updated: request.update.annotation.clone(),
        };
        self.desirer.update(ctx, &update).await?;
        Ok(())
    }

    /// Remove the app and its network identities.
    #[instrument(level = "debug", skip(self, ctx))]
    pub async fn stop(&self, ctx: &CancellationToken, process_guid: &str) -> Result<(), BifrostError> {
        let lrp = self.find(ctx, process_guid).await?;
        self.desirer.stop(ctx, &lrp.name).await?;
        Ok(())
    }

    async fn find(&self, ctx: &CancellationToken, process_guid: &str) -> Result<Lrp, BifrostError> {
        if process_guid.is_empty() {
            return Err(BifrostError::InvalidRequest("empty process guid".to_string()));
        }

        self.desirer
            .list(ctx)
            .await?
            .into_iter()
            .find(|lrp| lrp.process_guid() == Some(process_guid))
            .ok_or_else(|| {
                error!(process_guid, "application not found");
                BifrostError::NotFound(process_guid.to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use opi_core::DesireError;
    use opi_model::{DesiredLrpUpdate, PROCESS_GUID};

    use super::*;
    use crate::{convert::ConvertFn, error::ConvertError};

    #[derive(Default)]
    struct FakeDesirer {
        lrps: Mutex<Vec<Lrp>>,
        batches: Mutex<Vec<Vec<String>>>,
        updates: Mutex<Vec<LrpUpdate>>,
        stopped: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Desirer for FakeDesirer {
        async fn desire(&self, _ctx: &CancellationToken, lrps: &[Lrp]) -> Result<(), DesireError> {
            self.batches
                .lock()
                .unwrap()
                .push(lrps.iter().map(|l| l.name.clone()).collect());
            self.lrps.lock().unwrap().extend(lrps.iter().cloned());
            Ok(())
        }

        async fn list(&self, _ctx: &CancellationToken) -> Result<Vec<Lrp>, DesireError> {
            Ok(self.lrps.lock().unwrap().clone())
        }

        async fn get(&self, _ctx: &CancellationToken, name: &str) -> Result<Lrp, DesireError> {
            self.lrps
                .lock()
                .unwrap()
                .iter()
                .find(|l| l.name == name)
                .cloned()
                .ok_or_else(|| DesireError::NotFound(name.to_string()))
        }

        async fn update(
            &self,
            _ctx: &CancellationToken,
            update: &LrpUpdate,
        ) -> Result<(), DesireError> {
            self.updates.lock().unwrap().push(update.clone());
            Ok(())
        }

        async fn stop(&self, _ctx: &CancellationToken, name: &str) -> Result<(), DesireError> {
            self.stopped.lock().unwrap().push(name.to_string());
            Ok(())
        }
    }

    fn lrp(name: &str, guid: &str, instances: u32) -> Lrp {
        let mut lrp = Lrp::new(name, "busybox", instances);
        lrp.metadata.insert(PROCESS_GUID.into(), guid.into());
        lrp
    }

    fn request(guid: &str) -> DesireLrpRequest {
        DesireLrpRequest {
            process_guid: guid.into(),
            docker_image_url: "busybox".into(),
            num_instances: 1,
            ..DesireLrpRequest::default()
        }
    }

    /// Converts by process guid; guids starting with `bad` fail.
    fn converter() -> Arc<dyn Converter> {
        Arc::new(ConvertFn(|req: &DesireLrpRequest| {
            if req.process_guid.starts_with("bad") {
                return Err(ConvertError::MissingAppName {
                    process_guid: req.process_guid.clone(),
                });
            }
            Ok(lrp(
                &format!("{}-app", req.process_guid),
                &req.process_guid,
                req.num_instances,
            ))
        }))
    }

    fn bifrost(desirer: Arc<FakeDesirer>) -> Bifrost {
        Bifrost::new(converter(), desirer)
    }

    #[tokio::test]
    async fn transfer_drops_only_failed_conversions() {
        let desirer = Arc::new(FakeDesirer::default());
        let ctx = CancellationToken::new();

        bifrost(desirer.clone())
            .transfer(&ctx, &[request("g1"), request("bad-g2"), request("g3")])
            .await
            .unwrap();

        assert_eq!(
            *desirer.batches.lock().unwrap(),
            vec![vec!["g1-app".to_string(), "g3-app".to_string()]]
        );
    }

    #[tokio::test]
    async fn list_projects_process_guids() {
        let desirer = Arc::new(FakeDesirer::default());
        desirer.lrps.lock().unwrap().extend([
            lrp("app0", "guid-0", 1),
            lrp("app1", "guid-1", 3),
            Lrp::new("bare", "busybox", 1),
        ]);
        let ctx = CancellationToken::new();

        let infos = bifrost(desirer).list(&ctx).await.unwrap();
        let guids: Vec<&str> = infos.iter().map(|i| i.process_guid.as_str()).collect();
        assert_eq!(guids, vec!["guid-0", "guid-1", ""]);
    }

    #[tokio::test]
    async fn get_by_process_guid() {
        let desirer = Arc::new(FakeDesirer::default());
        desirer.lrps.lock().unwrap().push(lrp("app1", "guid-1", 3));
        let ctx = CancellationToken::new();
        let b = bifrost(desirer);

        let got = b.get(&ctx, "guid-1").await.unwrap();
        assert_eq!(
            got,
            DesiredLrp {
                process_guid: "guid-1".into(),
                instances: 3
            }
        );
        assert!(b.get(&ctx, "guid-9").await.unwrap_err().is_not_found());
        assert!(matches!(
            b.get(&ctx, "").await.unwrap_err(),
            BifrostError::InvalidRequest(_)
        ));
    }

    #[tokio::test]
    async fn update_targets_app_name() {
        let desirer = Arc::new(FakeDesirer::default());
        desirer.lrps.lock().unwrap().push(lrp("app1", "guid-1", 3));
        let ctx = CancellationToken::new();

        let req = UpdateDesiredLrpRequest {
            process_guid: "guid-1".into(),
            update: DesiredLrpUpdate {
                instances: Some(5),
                annotation: Some("99.0".into()),
            },
        };
        bifrost(desirer.clone()).update(&ctx, &req).await.unwrap();

        assert_eq!(
            *desirer.updates.lock().unwrap(),
            vec![LrpUpdate {
                name: "app1".into(),
                instances: Some(5),
                last_updated: Some("99.0".into()),
            }]
        );
    }

    #[tokio::test]
    async fn update_of_unknown_guid_is_not_found() {
        let desirer = Arc::new(FakeDesirer::default());
        let ctx = CancellationToken::new();
        let req = UpdateDesiredLrpRequest {
            process_guid: "ghost".into(),
            ..UpdateDesiredLrpRequest::default()
        };

        let err = bifrost(desirer.clone()).update(&ctx, &req).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(desirer.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn stop_resolves_app_name() {
        let desirer = Arc::new(FakeDesirer::default());
        desirer.lrps.lock().unwrap().push(lrp("app1", "guid-1", 3));
        let ctx = CancellationToken::new();

        bifrost(desirer.clone()).stop(&ctx, "guid-1").await.unwrap();
        assert_eq!(*desirer.stopped.lock().unwrap(), vec!["app1".to_string()]);
    }

    #[tokio::test]
    async fn malformed_vcap_does_not_sink_the_batch() {
        use crate::{convert::LrpConverter, error::StagingError, registry::ImageResolver};
        use opi_model::{EnvironmentVariable, VcapApp};

        struct NoResolver;

        #[async_trait]
        impl ImageResolver for NoResolver {
            async fn resolve(
                &self,
                _request: &DesireLrpRequest,
                _app: &VcapApp,
            ) -> Result<String, StagingError> {
                Err(StagingError::MissingDroplet)
            }
        }

        let desirer = Arc::new(FakeDesirer::default());
        let b = Bifrost::new(Arc::new(LrpConverter::new(Arc::new(NoResolver))), desirer.clone());
        let ctx = CancellationToken::new();

        let mut broken = request("g2");
        broken.environment = vec![EnvironmentVariable::new("VCAP_APPLICATION", "{oops")];
        let mut imageless = request("g3");
        imageless.docker_image_url.clear();

        b.transfer(&ctx, &[request("g1"), broken, imageless, request("g4")])
            .await
            .unwrap();

        assert_eq!(
            *desirer.batches.lock().unwrap(),
            vec![vec!["g1".to_string(), "g4".to_string()]]
        );
    }
}
