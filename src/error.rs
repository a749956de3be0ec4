use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("client is closed")]
    Closed,

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API returned non-2xx status: {status}, body: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, ClientError>;
