//! Well-known keys shared between the converter, the cluster mapping and the platform.

/// Metadata key holding the platform process GUID.
pub const PROCESS_GUID: &str = "process_guid";
/// Metadata key holding the platform "last updated" marker.
pub const LAST_UPDATED: &str = "last_updated";

/// Keys found inside the embedded application metadata blob.
pub const VCAP_APP_NAME: &str = "application_name";
pub const VCAP_APP_ID: &str = "application_id";
pub const VCAP_VERSION: &str = "version";
pub const VCAP_APP_URIS: &str = "application_uris";
pub const VCAP_SPACE_NAME: &str = "space_name";

/// Reserved environment variable carrying the serialized application metadata.
pub const ENV_VCAP_APPLICATION: &str = "VCAP_APPLICATION";

/// Environment contract between the stager and the staging task.
pub const ENV_APP_ID: &str = "APP_ID";
pub const ENV_STAGING_GUID: &str = "STAGING_GUID";
pub const ENV_COMPLETION_CALLBACK: &str = "COMPLETION_CALLBACK";
pub const ENV_EIRINI_ADDRESS: &str = "EIRINI_ADDRESS";
pub const ENV_BUILDPACKS: &str = "BUILDPACKS";
pub const ENV_DOWNLOAD_URL: &str = "DOWNLOAD_URL";
pub const ENV_DROPLET_UPLOAD_URL: &str = "DROPLET_UPLOAD_URL";

/// Label placed on every controller and pod template; selector and lookup key.
pub const LABEL_NAME: &str = "name";

/// Service annotation carrying the app's route URIs as a JSON array.
pub const ANNOTATION_ROUTES: &str = "routes";
