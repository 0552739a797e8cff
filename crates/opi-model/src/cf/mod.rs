//! Platform-shaped request and response records.

mod desire;
pub use desire::{DesireLrpRequest, EnvironmentVariable};

mod update;
pub use update::{DesiredLrpUpdate, UpdateDesiredLrpRequest};

mod info;
pub use info::{DesiredLrp, DesiredLrpSchedulingInfo};

mod staging;
pub use staging::{Buildpack, LifecycleData, StagingCompletion, StagingRequest};
