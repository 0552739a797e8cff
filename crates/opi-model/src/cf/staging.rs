use serde::{Deserialize, Serialize};

use crate::EnvironmentVariable;

/// Buildpack offered to the staging task.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buildpack {
    pub name: String,
    pub key: String,
    pub url: String,
    #[serde(default)]
    pub skip_detect: bool,
}

/// Lifecycle-specific part of a staging request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleData {
    #[serde(default)]
    pub app_bits_download_uri: String,
    #[serde(default)]
    pub droplet_upload_uri: String,
    #[serde(default)]
    pub buildpacks: Vec<Buildpack>,
}

/// Request to stage an app's source into a runnable droplet.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingRequest {
    pub app_guid: String,
    #[serde(default)]
    pub completion_callback: String,
    #[serde(default)]
    pub environment: Vec<EnvironmentVariable>,
    #[serde(default)]
    pub lifecycle_data: LifecycleData,
}

/// Callback sent by a staging task once it has finished.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingCompletion {
    #[serde(default)]
    pub task_guid: String,
    #[serde(default)]
    pub failed: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub failure_reason: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub result: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub annotation: String,
}
