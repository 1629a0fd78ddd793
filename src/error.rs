use thiserror::Error;

use crate::renderer::RenderError;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Bridge event loop is no longer running")]
    Closed,
}

pub type Result<T> = std::result::Result<T, BridgeError>;
