use reqwest::StatusCode;
use vizport_core::error::VizportError;

/// Every failure mode the client can hit.
#[derive(Debug, thiserror::Error)]
pub enum OpenAiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("couldn’t (de)serialise body: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("endpoint returned non-success status {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("format error: {0}")]
    Format(String),
}

impl From<OpenAiError> for VizportError {
    fn from(value: OpenAiError) -> Self {
        VizportError::GenerationFailed(Box::new(value))
    }
}
