use docquery_core::QueryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocqueryError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type DocqueryResult<T> = Result<T, DocqueryError>;
