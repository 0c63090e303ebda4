use thiserror::Error;

/// Problems with form input that are caught before any request is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a prompt to generate an image")]
    EmptyPrompt,
    #[error("Unknown aspect ratio: {0}")]
    UnknownAspectRatio(String),
    #[error("Unknown style: {0}")]
    UnknownStyle(String),
}

#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Service error ({status}): {body}")]
    Service { status: u16, body: String },
    #[error("Response error: {0}")]
    Response(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
    #[error("No generated image is available")]
    NoResult,
}

pub type Result<T> = std::result::Result<T, ForgeError>;
