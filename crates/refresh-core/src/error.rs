use std::path::PathBuf;

/// Central error type for the refresh system.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("decode {context}: {message}")]
    Decode { context: String, message: String },

    #[error("{stage}: {source}")]
    Stage {
        stage: String,
        #[source]
        source: Box<RefreshError>,
    },

    #[error("task failed: {message}")]
    TaskFailed { message: String },

    #[error("invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("credential error: {message}")]
    CredentialError { message: String },

    #[error("invalid output path {}: {message}", path.display())]
    InvalidOutputPath { path: PathBuf, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl RefreshError {
    /// Attach the step that failed, e.g. "list integrations".
    pub fn at(self, stage: &str) -> Self {
        RefreshError::Stage {
            stage: stage.to_string(),
            source: Box::new(self),
        }
    }
}
