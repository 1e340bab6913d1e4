use std::{env, sync::Arc, time::Duration};

use vizport_core::error::{Result, VizportError};

use crate::client::{DEFAULT_TIMEOUT, OpenAiClient};

/// Environment variable holding the bearer credential.
pub const API_KEY_ENV: &str = "THESYS_API_KEY";
/// Optional override of the endpoint base URL.
pub const BASE_URL_ENV: &str = "THESYS_BASE_URL";

/// Thin wrapper that wires the HTTP client [`OpenAiClient`] into a value that
/// implements [`vizport_core::provider::StreamingTextProvider`].
///
/// The type exposes no additional methods. Everything user facing happens
/// through the gateway once the adapter is plugged in.
#[derive(Debug, Clone)]
pub struct OpenAiAdapter {
    pub(crate) client: Arc<OpenAiClient>,
}

impl OpenAiAdapter {
    /// Wrap an already configured client.
    pub fn from_client(client: OpenAiClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }
}

/// Builder for [`OpenAiAdapter`].
///
/// # Typical usage
///
/// ```rust,no_run
/// use vizport_openai::OpenAiAdapterBuilder;
///
/// let backend = OpenAiAdapterBuilder::new_from_env()
///     .build()
///     .expect("THESYS_API_KEY must be set");
/// ```
#[derive(Debug, Default, Clone)]
pub struct OpenAiAdapterBuilder {
    pub(crate) api_key: Option<String>,
    pub(crate) base_url: Option<String>,
    pub(crate) timeout: Option<Duration>,
}

impl OpenAiAdapterBuilder {
    /// Create an *empty* builder. Remember to supply an API key manually.
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor that reads `THESYS_API_KEY` and
    /// `THESYS_BASE_URL`.
    ///
    /// Never panics. A missing key only surfaces during [`Self::build`].
    pub fn new_from_env() -> Self {
        Self {
            api_key: env::var(API_KEY_ENV).ok().filter(|key| !key.trim().is_empty()),
            base_url: env::var(BASE_URL_ENV).ok().filter(|url| !url.trim().is_empty()),
            timeout: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Upper bound for a whole generation call, streaming included.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Finalise the builder and return a ready-to-use adapter.
    ///
    /// # Errors
    ///
    /// * [`VizportError::InvalidRequest`] if the API key is missing.
    /// * [`VizportError::GenerationFailed`] if the HTTP client cannot be built.
    pub fn build(self) -> Result<OpenAiAdapter> {
        let api_key = self.api_key.ok_or_else(|| {
            VizportError::invalid(format!("missing env variable: `{API_KEY_ENV}`"))
        })?;

        let client = OpenAiClient::new(
            api_key,
            self.base_url,
            self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        )?;

        Ok(OpenAiAdapter::from_client(client))
    }
}
