use std::sync::Arc;

use anyhow::Context as _;
use vizport_core::{
    ArtifactService, GenerationGateway, InMemoryArtifactStore, Storage,
    model::Model,
    reference::{ReferenceStyle, RetrievalLinks},
    store::ArtifactStore,
};
use vizport_openai::OpenAiAdapterBuilder;

use crate::config::Config;

/// Shared, cheaply cloneable handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: ArtifactService,
}

impl AppState {
    pub fn new(service: ArtifactService) -> Self {
        Self { service }
    }

    /// Wire backend, store and links from `config`.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let mut backend = OpenAiAdapterBuilder::new()
            .with_api_key(config.api_key.clone())
            .with_timeout(config.request_timeout());
        if let Some(base_url) = &config.base_url {
            backend = backend.with_base_url(base_url.clone());
        }
        let backend = backend.build().context("building generation backend")?;

        let system_prompt = match &config.system_prompt_file {
            Some(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading system prompt from {}", path.display()))?,
            None => vizport_prompt::default_system_prompt(),
        };

        let gateway = GenerationGateway::new(backend, system_prompt, Model::parse(&config.model));

        let storage = match ReferenceStyle::from(config.reference_style) {
            ReferenceStyle::Stored => {
                Storage::stored(InMemoryArtifactStore::new(config.memory_policy()))
            }
            ReferenceStyle::Inline => Storage::Inline {
                max_reference_len: config.max_reference_len,
            },
        };

        let service = ArtifactService::new(gateway, storage, RetrievalLinks::new(&config.public_url))
            .with_default_delivery(config.delivery.into());

        Ok(Self::new(service))
    }

    /// The backing store, if this deployment keeps one.
    pub fn store(&self) -> Option<Arc<dyn ArtifactStore>> {
        match self.service.storage() {
            Storage::Stored(store) => Some(Arc::clone(store)),
            Storage::Inline { .. } => None,
        }
    }
}
