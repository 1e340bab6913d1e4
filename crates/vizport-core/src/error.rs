//! Unified error type exposed by **`vizport-core`**.
//!
//! Backend crates convert their internal errors into one of these variants
//! before bubbling them up to the [`GenerationGateway`](crate::gateway::GenerationGateway).
//! Transports only need [`VizportError::kind`] to pick a status code.

use thiserror::Error;

/// Convenient alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, VizportError>;

#[derive(Debug, Error)]
pub enum VizportError {
    /// The caller supplied malformed or empty input. Never retried.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A reference that does not resolve. Terminal for that reference.
    #[error("reference `{reference}` not found")]
    NotFound { reference: String },

    /// The external generation collaborator failed (transport, quota,
    /// malformed response, …).
    #[error("generation failed: {0}")]
    GenerationFailed(Box<dyn std::error::Error + Send + Sync + 'static>),

    /// The generation was abandoned through its cancellation token.
    #[error("generation cancelled")]
    Cancelled,

    #[error("internal fault: {0}")]
    Internal(String),
}

/// The four error classes callers are expected to distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidRequest,
    NotFound,
    GenerationFailed,
    InternalFault,
}

impl VizportError {
    /// Shorthand for a generation failure that only carries a message.
    pub fn generation(reason: impl Into<String>) -> Self {
        VizportError::GenerationFailed(reason.into().into())
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        VizportError::InvalidRequest(reason.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            VizportError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            VizportError::NotFound { .. } => ErrorKind::NotFound,
            VizportError::GenerationFailed(_) | VizportError::Cancelled => {
                ErrorKind::GenerationFailed
            }
            VizportError::Internal(_) => ErrorKind::InternalFault,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_taxonomy() {
        assert_eq!(
            VizportError::invalid("Prompt is required").kind(),
            ErrorKind::InvalidRequest
        );
        assert_eq!(
            VizportError::NotFound {
                reference: "viz_0".into()
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(VizportError::Cancelled.kind(), ErrorKind::GenerationFailed);
        assert_eq!(
            VizportError::Internal("lock poisoned".into()).kind(),
            ErrorKind::InternalFault
        );
    }

    #[test]
    fn generation_failure_keeps_the_reason() {
        let err = VizportError::generation("quota exceeded");
        assert_eq!(err.to_string(), "generation failed: quota exceeded");
    }
}
