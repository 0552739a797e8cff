use opi_core::DesireError;
use thiserror::Error;

/// Why the staged image of an app could not be produced.
#[derive(Error, Debug)]
pub enum StagingError {
    #[error("request carries neither an image nor a droplet hash")]
    MissingDroplet,

    #[error("request to {uri} failed: {source}")]
    Http {
        uri: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{uri} answered with status {status}")]
    Status { uri: String, status: u16 },
}

/// Why a single desire request could not be turned into an LRP.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("request {process_guid:?} names no app")]
    MissingAppName { process_guid: String },

    #[error("request {process_guid:?} names app {name:?}, which is not a DNS label")]
    InvalidAppName { process_guid: String, name: String },

    #[error("request {process_guid:?} has malformed VCAP_APPLICATION: {source}")]
    InvalidVcapApplication {
        process_guid: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("staging failed: {0}")]
    Staging(#[from] StagingError),
}

#[derive(Error, Debug)]
pub enum BifrostError {
    #[error(transparent)]
    Desire(#[from] DesireError),

    #[error("no app with process guid {0:?}")]
    NotFound(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl BifrostError {
    pub fn is_not_found(&self) -> bool {
        match self {
            BifrostError::NotFound(_) => true,
            BifrostError::Desire(e) => e.is_not_found(),
            BifrostError::InvalidRequest(_) => false,
        }
    }
}
