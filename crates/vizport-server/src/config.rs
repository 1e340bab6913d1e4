use std::{net::SocketAddr, path::PathBuf, time::Duration};

use clap::{Parser, ValueEnum};
use vizport_core::{Delivery, MemoryPolicy, reference::ReferenceStyle};

/// Runtime configuration, resolved once at startup from flags and the
/// environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "vizport", version, about = "Generate data visualizations and hand out retrieval links")]
pub struct Config {
    /// Address the HTTP server binds to.
    #[arg(long, env = "VIZPORT_LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,

    /// Public base URL used to build retrieval links.
    #[arg(long, env = "VIZPORT_PUBLIC_URL", default_value = "http://localhost:3000")]
    pub public_url: String,

    /// Credential for the generation endpoint.
    #[arg(long, env = vizport_openai::API_KEY_ENV, hide_env_values = true)]
    pub api_key: String,

    /// Override of the generation endpoint base URL.
    #[arg(long, env = vizport_openai::BASE_URL_ENV)]
    pub base_url: Option<String>,

    #[arg(long, env = "VIZPORT_MODEL", default_value_t = vizport_core::model::Model::default().to_string())]
    pub model: String,

    /// How references are issued.
    #[arg(long, env = "VIZPORT_REFERENCE_STYLE", value_enum, default_value_t = StyleArg::Stored)]
    pub reference_style: StyleArg,

    /// Delivery used when a create request does not name one.
    #[arg(long, env = "VIZPORT_DELIVERY", value_enum, default_value_t = DeliveryArg::Buffered)]
    pub delivery: DeliveryArg,

    /// Seconds a stored artifact stays retrievable. 0 keeps it for the
    /// process lifetime.
    #[arg(long, env = "VIZPORT_STORE_TTL_SECS", default_value_t = 3600)]
    pub store_ttl_secs: u64,

    /// Upper bound on stored artifacts; the oldest goes first. 0 means
    /// unbounded.
    #[arg(long, env = "VIZPORT_MAX_ENTRIES", default_value_t = 10_000)]
    pub max_entries: usize,

    #[arg(long, env = "VIZPORT_SWEEP_INTERVAL_SECS", default_value_t = 60)]
    pub sweep_interval_secs: u64,

    /// Retrieval URLs above this length come with a warning.
    #[arg(long, env = "VIZPORT_MAX_REFERENCE_LEN", default_value_t = vizport_core::reference::DEFAULT_MAX_REFERENCE_LEN)]
    pub max_reference_len: usize,

    /// Replace the built-in system prompt with the contents of this file.
    #[arg(long, env = "VIZPORT_SYSTEM_PROMPT_FILE")]
    pub system_prompt_file: Option<PathBuf>,

    /// Upper bound on a single generation call.
    #[arg(long, env = "VIZPORT_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StyleArg {
    Stored,
    Inline,
}

impl From<StyleArg> for ReferenceStyle {
    fn from(value: StyleArg) -> Self {
        match value {
            StyleArg::Stored => ReferenceStyle::Stored,
            StyleArg::Inline => ReferenceStyle::Inline,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeliveryArg {
    Buffered,
    Streaming,
}

impl From<DeliveryArg> for Delivery {
    fn from(value: DeliveryArg) -> Self {
        match value {
            DeliveryArg::Buffered => Delivery::Buffered,
            DeliveryArg::Streaming => Delivery::Streaming,
        }
    }
}

impl Config {
    pub fn store_ttl(&self) -> Option<Duration> {
        (self.store_ttl_secs > 0).then(|| Duration::from_secs(self.store_ttl_secs))
    }

    pub fn memory_policy(&self) -> MemoryPolicy {
        let mut policy = MemoryPolicy::unbounded();
        if let Some(ttl) = self.store_ttl() {
            policy = policy.with_ttl(ttl);
        }
        if self.max_entries > 0 {
            policy = policy.with_max_entries(self.max_entries);
        }
        policy
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
