use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouteError {
    #[error("failed to encode route message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("http request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("router rejected message: {0}")]
    Rejected(String),
}
