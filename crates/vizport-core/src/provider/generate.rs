use std::{future::Future, pin::Pin};

use futures_core::stream::Stream;

use crate::{error::Result, generic::GenericMessage, model::Model};

/// Boxed future returned by [`TextGenerationProvider::generate`].
pub type GenerateFuture<'s> = Pin<Box<dyn Future<Output = Result<String>> + Send + 's>>;

/// Lazy, finite sequence of UTF-8 text deltas in emission order.
pub type TextStream<'s> = Pin<Box<dyn Stream<Item = Result<String>> + Send + 's>>;

/// A **backend** turns a list of chat messages into a network call to a
/// concrete provider and returns the completed text.
///
/// The trait is intentionally minimal:
///
/// * no associated message type – every backend consumes
///   [`GenericMessage`] and converts it into its own wire format,
/// * one async-ish method returning a boxed future, so the trait stays
///   object-safe without pulling in `async_trait`.
///
/// Implementations hold no state between calls and never retry.
pub trait TextGenerationProvider: Send + Sync {
    /// Perform a single non-streaming round-trip.
    fn generate(&self, params: GenerateParameters) -> GenerateFuture<'_>;
}

/// A provider that can deliver the model’s answer **incrementally**.
///
/// The stream yields plain text deltas. Dropping it must abandon the
/// upstream request.
pub trait StreamingTextProvider: TextGenerationProvider {
    /// Start a streaming generation.
    fn generate_stream(&self, params: GenerateParameters) -> TextStream<'_>;
}

#[derive(Debug, Clone)]
pub struct GenerateParameters {
    pub messages: Vec<GenericMessage>,
    pub model: Model,
    pub temperature: Option<f64>,
}

impl GenerateParameters {
    pub fn new(messages: Vec<GenericMessage>, model: Model) -> Self {
        Self {
            messages,
            model,
            temperature: None,
        }
    }

    pub fn messages(&self) -> &[GenericMessage] {
        &self.messages
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn into_messages(self) -> Vec<GenericMessage> {
        self.messages
    }
}
