//! OpenAI-compatible chat completion backend for vizport.
//!
//! The default endpoint is the hosted Thesys C1 embed API, which answers
//! the `/chat/completions` protocol with generative-UI markup. Any other
//! server that speaks the same protocol works via
//! [`OpenAiAdapterBuilder::with_base_url`].

mod adapter;
pub mod api_v1;
mod client;
pub mod error;
mod model_map;
mod provider_impl;
mod sse;

pub use adapter::{API_KEY_ENV, BASE_URL_ENV, OpenAiAdapter, OpenAiAdapterBuilder};
pub use client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, OpenAiClient};
