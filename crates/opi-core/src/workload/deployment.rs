use super::{Workload, WorkloadBackend};
use crate::cluster::{Deployment, DeploymentSpec, MatchLabels, ObjectMeta, PodTemplateSpec};

impl Workload for Deployment {
    const BACKEND: WorkloadBackend = WorkloadBackend::Deployment;

    fn assemble(
        metadata: ObjectMeta,
        selector: MatchLabels,
        template: PodTemplateSpec,
        replicas: u32,
    ) -> Self {
        Deployment {
            metadata,
            spec: DeploymentSpec {
                replicas,
                selector,
                template,
            },
        }
    }

    fn replicas(&self) -> u32 {
        self.spec.replicas
    }

    fn set_replicas(&mut self, replicas: u32) {
        self.spec.replicas = replicas;
    }

    fn template(&self) -> &PodTemplateSpec {
        &self.spec.template
    }
}
