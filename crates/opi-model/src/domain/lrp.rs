use serde::{Deserialize, Serialize};

use crate::{Env, LAST_UPDATED, Metadata, PROCESS_GUID, VCAP_APP_URIS};

/// One desired long-running app.
///
/// `name` doubles as the orchestrator resource name and as the value of the `name` label,
/// so it must be a valid DNS label.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lrp {
    /// Stable identifier of the app.
    pub name: String,
    /// Resolved container image reference.
    pub image: String,
    /// Entrypoint argv; may be empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    /// Container environment.
    #[serde(default)]
    pub env: Env,
    /// Desired replica count.
    pub target_instances: u32,
    /// Identifiers that round-trip through orchestrator annotations.
    #[serde(default)]
    pub metadata: Metadata,
}

impl Lrp {
    /// Create an LRP with empty env, metadata and command.
    pub fn new(name: impl Into<String>, image: impl Into<String>, target_instances: u32) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            target_instances,
            ..Self::default()
        }
    }

    /// Platform process GUID, if the LRP carries one.
    pub fn process_guid(&self) -> Option<&str> {
        self.metadata.get(PROCESS_GUID).map(String::as_str)
    }

    /// Platform "last updated" marker, if present.
    pub fn last_updated(&self) -> Option<&str> {
        self.metadata.get(LAST_UPDATED).map(String::as_str)
    }

    /// Route URIs as the serialized JSON array copied from the embedded app metadata.
    pub fn routes(&self) -> Option<&str> {
        self.metadata.get(VCAP_APP_URIS).map(String::as_str)
    }
}

/// Instance-count change for an existing LRP.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LrpUpdate {
    /// Name of the LRP to update.
    pub name: String,
    /// New replica count; `None` leaves the count untouched.
    pub instances: Option<u32>,
    /// New "last updated" marker to record alongside the change.
    pub last_updated: Option<String>,
}

impl LrpUpdate {
    pub fn instances(name: impl Into<String>, instances: u32) -> Self {
        Self {
            name: name.into(),
            instances: Some(instances),
            last_updated: None,
        }
    }
}
