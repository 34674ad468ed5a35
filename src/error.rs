use thiserror::Error;

#[derive(Debug, Error)]
pub enum StarMapError {
    #[error("request for {url} failed: {message}")]
    Fetch { url: String, message: String },

    #[error("request for {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("malformed catalog data: {0}")]
    MalformedCatalog(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
