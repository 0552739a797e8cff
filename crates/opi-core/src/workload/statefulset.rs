use super::{Workload, WorkloadBackend};
use crate::{
    cluster::{
        MatchLabels, ObjectMeta, PodManagementPolicy, PodTemplateSpec, StatefulSet,
        StatefulSetSpec,
    },
    naming::headless_service_name,
};

impl Workload for StatefulSet {
    const BACKEND: WorkloadBackend = WorkloadBackend::StatefulSet;

    /// Replicas start in parallel; app instances do not depend on each other's ordinals.
    fn assemble(
        metadata: ObjectMeta,
        selector: MatchLabels,
        template: PodTemplateSpec,
        replicas: u32,
    ) -> Self {
        let service_name = headless_service_name(&metadata.name);
        StatefulSet {
            metadata,
            spec: StatefulSetSpec {
                replicas,
                selector,
                service_name,
                pod_management_policy: PodManagementPolicy::Parallel,
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
