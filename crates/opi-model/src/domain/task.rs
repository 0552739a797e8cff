use serde::{Deserialize, Serialize};

use crate::{ENV_APP_ID, ENV_STAGING_GUID, Env, Metadata};

/// One bounded unit of work, e.g. staging a droplet.
///
/// Runs to completion once; the job name and app label are taken from the task environment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub image: String,
    #[serde(default)]
    pub env: Env,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Task {
    /// Name of the job backing this task (the staging GUID).
    pub fn name(&self) -> Option<&str> {
        self.env
            .get(ENV_STAGING_GUID)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    /// App the task belongs to.
    pub fn app_id(&self) -> Option<&str> {
        self.env.get(ENV_APP_ID).map(String::as_str)
    }
}
