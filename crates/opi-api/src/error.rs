use opi_bifrost::BifrostError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Bifrost(#[from] BifrostError),
}
