use thiserror::Error;

#[derive(Error, Debug)]
pub enum WaypointError {
    #[error("Request error: {0}")]
    Request(#[from] crate::request::RequestError),
    #[error("Hit error: {0}")]
    Hit(#[from] crate::hit::HitError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Backend error: {0}")]
    Backend(anyhow::Error),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Init Logging error: {0}")]
    InitLoggingError(#[from] tracing_subscriber::filter::ParseError),
}

pub type Result<T> = std::result::Result<T, WaypointError>;
