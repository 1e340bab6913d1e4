use async_stream::try_stream;

use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::{
    Client as HttpClient,
    header::{ACCEPT, HeaderValue},
};
use std::time::Duration;

use crate::{
    api_v1::{ChatCompletionChunkResponse, ChatCompletionRequest, ChatCompletionResponse},
    error::OpenAiError,
    sse::{SseData, SseDecoder},
};

/// Hosted generative-UI endpoint. Speaks the OpenAI chat completion protocol.
pub const DEFAULT_BASE_URL: &str = "https://api.thesys.dev/v1/embed";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimal HTTP client for an OpenAI-compatible *chat/completions* endpoint.
///
/// * Accepts and returns the `api_v1` request / response structs defined
///   in this crate.
/// * Shares a single `reqwest::Client`, so cloning `OpenAiClient` is cheap.
/// * Never retries; that is the caller's call.
#[derive(Clone)]
pub struct OpenAiClient {
    api_key: String,
    http: HttpClient,
    base: String,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    /// Build a default `reqwest` client with the given overall timeout.
    pub fn new(
        api_key: impl Into<String>,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, OpenAiError> {
        let http = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self::with_http(api_key, http, base_url))
    }

    /// Build with a custom `reqwest::Client` in case the caller needs proxy
    /// settings, custom TLS, etc.
    pub fn with_http(
        api_key: impl Into<String>,
        http: HttpClient,
        base_url: Option<String>,
    ) -> Self {
        let base = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        Self {
            api_key: api_key.into(),
            http,
            base: base.trim_end_matches('/').to_owned(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base)
    }

    /// Perform a **non-streaming** chat completion.
    pub async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, OpenAiError> {
        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(OpenAiError::Api { status, body });
        }

        let bytes = resp.bytes().await?;
        let parsed: ChatCompletionResponse = serde_json::from_slice(&bytes)?;
        Ok(parsed)
    }

    /// Perform a **streaming** chat completion.
    ///
    /// Nothing is sent until the stream is first polled; dropping the stream
    /// closes the connection.
    pub fn chat_completion_stream(
        &self,
        request: ChatCompletionRequest,
    ) -> impl Stream<Item = Result<ChatCompletionChunkResponse, OpenAiError>> + '_ {
        let request = request.stream(true);

        try_stream! {
            let resp = self
                .http
                .post(self.endpoint())
                .bearer_auth(&self.api_key)
                .header(ACCEPT, HeaderValue::from_static("text/event-stream"))
                .json(&request)
                .send()
                .await?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                Err::<(), _>(OpenAiError::Api { status, body })?;
                return;
            }

            let mut bytes_stream = resp.bytes_stream();
            let mut decoder = SseDecoder::default();

            while let Some(chunk) = bytes_stream.next().await {
                let chunk = chunk?;
                for event in decoder.push(&chunk)? {
                    match event {
                        SseData::Done => return,
                        SseData::Message(data) => {
                            let parsed: ChatCompletionChunkResponse = serde_json::from_str(&data)?;
                            yield parsed;
                        }
                    }
                }
            }

            if decoder.has_pending() {
                Err::<(), _>(OpenAiError::Format("event stream ended mid-event".into()))?;
            }
        }
    }
}
