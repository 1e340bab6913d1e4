//! The generation gateway: a stateless facade over the hosted model.
//!
//! Every call sends exactly two messages, the deployment's system prompt and
//! the caller's prompt, and returns either the completed text or a lazy
//! stream of text chunks.
//!
//! ```rust,no_run
//! # async fn demo(backend: impl vizport_core::provider::StreamingTextProvider + 'static)
//! # -> vizport_core::error::Result<()> {
//! use tokio_util::sync::CancellationToken;
//! use vizport_core::{gateway::GenerationGateway, model::Model};
//!
//! let gateway = GenerationGateway::new(backend, "You design charts.", Model::default());
//! let text = gateway
//!     .complete("Bar chart of Q1 45K, Q2 52K", CancellationToken::new())
//!     .await?;
//! # Ok(()) }
//! ```

use std::sync::Arc;

use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{
    error::{Result, VizportError},
    generic::GenericMessage,
    model::Model,
    provider::{GenerateParameters, StreamingTextProvider, TextStream},
};

/// How the caller wants the generated text delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    /// Wait for the full text.
    #[default]
    Buffered,
    /// Forward chunks as they arrive.
    Streaming,
}

/// Result of [`GenerationGateway::generate`].
pub enum Generation {
    Complete(String),
    Stream(TextStream<'static>),
}

impl std::fmt::Debug for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Generation::Complete(text) => f.debug_tuple("Complete").field(text).finish(),
            Generation::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Cheap to clone; clones share the backend.
#[derive(Clone)]
pub struct GenerationGateway {
    backend: Arc<dyn StreamingTextProvider>,
    system_prompt: Arc<str>,
    model: Model,
}

impl GenerationGateway {
    pub fn new(
        backend: impl StreamingTextProvider + 'static,
        system_prompt: impl Into<Arc<str>>,
        model: Model,
    ) -> Self {
        Self::from_shared(Arc::new(backend), system_prompt, model)
    }

    pub fn from_shared(
        backend: Arc<dyn StreamingTextProvider>,
        system_prompt: impl Into<Arc<str>>,
        model: Model,
    ) -> Self {
        Self {
            backend,
            system_prompt: system_prompt.into(),
            model,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub async fn generate(
        &self,
        user_prompt: &str,
        delivery: Delivery,
        cancel: CancellationToken,
    ) -> Result<Generation> {
        match delivery {
            Delivery::Buffered => self.complete(user_prompt, cancel).await.map(Generation::Complete),
            Delivery::Streaming => self.stream(user_prompt, cancel).map(Generation::Stream),
        }
    }

    /// Wait for the complete text. A cancelled token abandons the upstream
    /// call and yields [`VizportError::Cancelled`].
    pub async fn complete(&self, user_prompt: &str, cancel: CancellationToken) -> Result<String> {
        let params = self.parameters(user_prompt)?;
        tracing::debug!(model = %self.model, prompt_len = user_prompt.len(), "starting buffered generation");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(VizportError::Cancelled),
            text = self.backend.generate(params) => text,
        }
    }

    /// Start a streaming generation.
    ///
    /// Validation happens eagerly; the upstream request is only sent once the
    /// stream is first polled. When `cancel` fires the stream ends with
    /// [`VizportError::Cancelled`], and dropping it abandons the request.
    pub fn stream(&self, user_prompt: &str, cancel: CancellationToken) -> Result<TextStream<'static>> {
        let params = self.parameters(user_prompt)?;
        let backend = Arc::clone(&self.backend);
        tracing::debug!(model = %self.model, prompt_len = user_prompt.len(), "starting streaming generation");

        Ok(Box::pin(async_stream::stream! {
            let chunks = backend.generate_stream(params);
            futures_util::pin_mut!(chunks);

            loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Some(Err(VizportError::Cancelled)),
                    chunk = chunks.next() => chunk,
                };
                let Some(chunk) = next else {
                    break;
                };

                let failed = chunk.is_err();
                yield chunk;
                if failed {
                    break;
                }
            }
        }))
    }

    fn parameters(&self, user_prompt: &str) -> Result<GenerateParameters> {
        if user_prompt.trim().is_empty() {
            return Err(VizportError::invalid("Prompt is required"));
        }

        Ok(GenerateParameters::new(
            vec![
                GenericMessage::system(self.system_prompt.as_ref()),
                GenericMessage::user(user_prompt),
            ],
            self.model.clone(),
        ))
    }
}
