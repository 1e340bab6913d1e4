//! Create / retrieve contract, independent of any transport.
//!
//! One [`ArtifactService`] covers every deployment shape through two
//! configuration axes:
//!
//! * [`Delivery`]: wait for the full text, or forward chunks as they arrive;
//! * [`Storage`]: keep the payload in an [`ArtifactStore`] and hand out a short
//!   id, or encode the payload into a self-describing reference.

use std::{
    collections::HashSet,
    pin::Pin,
    sync::{Arc, Mutex, PoisonError},
};

use chrono::{DateTime, Utc};
use futures_core::Stream;
use futures_util::StreamExt;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::{
    artifact::{ArtifactId, ArtifactRecord, NewArtifact},
    error::{Result, VizportError},
    gateway::{Delivery, GenerationGateway},
    id::{Clock, SystemClock},
    reference::{self, DEFAULT_MAX_REFERENCE_LEN, ReferenceStyle, RetrievalLinks},
    store::ArtifactStore,
};

/// Where generated payloads go.
#[derive(Clone)]
pub enum Storage {
    /// Persist and return a short id.
    Stored(Arc<dyn ArtifactStore>),
    /// Return the payload encoded into the reference. `max_reference_len`
    /// bounds the retrieval URL; longer ones are still returned, with a
    /// warning.
    Inline { max_reference_len: usize },
}

impl Storage {
    pub fn stored(store: impl ArtifactStore + 'static) -> Self {
        Storage::Stored(Arc::new(store))
    }

    pub fn inline() -> Self {
        Storage::Inline {
            max_reference_len: DEFAULT_MAX_REFERENCE_LEN,
        }
    }

    pub fn style(&self) -> ReferenceStyle {
        match self {
            Storage::Stored(_) => ReferenceStyle::Stored,
            Storage::Inline { .. } => ReferenceStyle::Inline,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateRequest {
    pub prompt: String,
    /// Store under this id instead of a generated one. Requires a store.
    pub id: Option<String>,
    /// Overrides the service default.
    pub delivery: Option<Delivery>,
}

impl CreateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_delivery(mut self, delivery: Delivery) -> Self {
        self.delivery = Some(delivery);
        self
    }
}

/// A successfully created artifact, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Created {
    pub reference: String,
    pub retrieval_url: String,
    pub style: ReferenceStyle,
    pub payload: String,
    pub source_prompt: String,
    pub created_at: DateTime<Utc>,
    /// Set when a self-describing URL exceeds the configured bound.
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreationEvent {
    Chunk(String),
    /// Always the last item of a successful stream.
    Created(Created),
}

pub type CreationStream = Pin<Box<dyn Stream<Item = Result<CreationEvent>> + Send>>;

pub enum CreateResponse {
    Complete(Created),
    Streaming(CreationStream),
}

impl std::fmt::Debug for CreateResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreateResponse::Complete(created) => f.debug_tuple("Complete").field(created).finish(),
            CreateResponse::Streaming(_) => f.write_str("Streaming(..)"),
        }
    }
}

/// Caller-chosen ids whose generation is still in flight.
#[derive(Debug, Default)]
struct PendingIds(Mutex<HashSet<ArtifactId>>);

impl PendingIds {
    fn reserve(self: &Arc<Self>, id: ArtifactId) -> Result<Reservation> {
        let mut pending = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if !pending.insert(id.clone()) {
            return Err(already_exists(&id));
        }
        Ok(Reservation {
            pending: Arc::clone(self),
            id,
        })
    }
}

/// Holds a caller-chosen id until the create finishes or is abandoned.
#[derive(Debug)]
struct Reservation {
    pending: Arc<PendingIds>,
    id: ArtifactId,
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.pending
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

fn already_exists(id: &ArtifactId) -> VizportError {
    VizportError::invalid(format!("reference `{id}` already exists"))
}

#[derive(Clone)]
pub struct ArtifactService {
    gateway: GenerationGateway,
    storage: Storage,
    links: RetrievalLinks,
    default_delivery: Delivery,
    clock: Arc<dyn Clock>,
    pending: Arc<PendingIds>,
}

impl ArtifactService {
    pub fn new(gateway: GenerationGateway, storage: Storage, links: RetrievalLinks) -> Self {
        Self {
            gateway,
            storage,
            links,
            default_delivery: Delivery::Buffered,
            clock: Arc::new(SystemClock),
            pending: Arc::default(),
        }
    }

    pub fn with_default_delivery(mut self, delivery: Delivery) -> Self {
        self.default_delivery = delivery;
        self
    }

    /// Clock used to timestamp self-describing artifacts.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn links(&self) -> &RetrievalLinks {
        &self.links
    }

    pub fn default_delivery(&self) -> Delivery {
        self.default_delivery
    }

    pub async fn create(
        &self,
        request: CreateRequest,
        cancel: CancellationToken,
    ) -> Result<CreateResponse> {
        match request.delivery.unwrap_or(self.default_delivery) {
            Delivery::Buffered => self
                .create_buffered(request, cancel)
                .await
                .map(CreateResponse::Complete),
            Delivery::Streaming => self
                .create_streaming(request, cancel)
                .await
                .map(CreateResponse::Streaming),
        }
    }

    /// Generate, persist, then report. A failed generation persists nothing.
    pub async fn create_buffered(
        &self,
        request: CreateRequest,
        cancel: CancellationToken,
    ) -> Result<Created> {
        let reservation = self.admit(&request).await?;
        let payload = self.gateway.complete(&request.prompt, cancel).await?;
        self.finish(payload, request.prompt, reservation.as_ref()).await
    }

    /// Forward chunks as they arrive, then persist the concatenation and
    /// emit [`CreationEvent::Created`].
    ///
    /// Dropping the stream or firing `cancel` abandons the upstream call and
    /// nothing is stored.
    pub async fn create_streaming(
        &self,
        request: CreateRequest,
        cancel: CancellationToken,
    ) -> Result<CreationStream> {
        let reservation = self.admit(&request).await?;
        let chunks = self.gateway.stream(&request.prompt, cancel.clone())?;
        let service = self.clone();

        Ok(Box::pin(async_stream::stream! {
            // Cancels the generation if the consumer goes away mid-stream.
            let _abandon = cancel.drop_guard();
            let mut chunks = chunks;
            let mut payload = String::new();

            while let Some(chunk) = chunks.next().await {
                match chunk {
                    Ok(text) => {
                        payload.push_str(&text);
                        yield Ok(CreationEvent::Chunk(text));
                    }
                    Err(err) => {
                        yield Err(err);
                        return;
                    }
                }
            }

            yield service
                .finish(payload, request.prompt, reservation.as_ref())
                .await
                .map(CreationEvent::Created);
        }))
    }

    /// Resolve a stored reference.
    pub async fn retrieve(&self, reference: &str) -> Result<ArtifactRecord> {
        let id = ArtifactId::parse(reference)?;
        let Storage::Stored(store) = &self.storage else {
            return Err(VizportError::invalid(
                "this deployment issues self-describing references; decode them instead of looking them up",
            ));
        };

        match store.get(&id).await? {
            Some(record) => Ok(record),
            None => {
                tracing::debug!(reference = %id, "reference not found");
                Err(VizportError::NotFound {
                    reference: id.to_string(),
                })
            }
        }
    }

    /// Validate a create request before any upstream cost is incurred.
    ///
    /// A caller-chosen id stays reserved until the returned guard drops, so
    /// concurrent creates for the same id cannot both start a generation.
    async fn admit(&self, request: &CreateRequest) -> Result<Option<Reservation>> {
        if request.prompt.trim().is_empty() {
            return Err(VizportError::invalid("Prompt is required"));
        }

        let Some(raw) = request.id.as_deref() else {
            return Ok(None);
        };
        let Storage::Stored(store) = &self.storage else {
            return Err(VizportError::invalid(
                "custom ids require an artifact store",
            ));
        };

        let reservation = self.pending.reserve(ArtifactId::parse_custom(raw)?)?;
        if store.get(&reservation.id).await?.is_some() {
            return Err(already_exists(&reservation.id));
        }
        Ok(Some(reservation))
    }

    async fn finish(
        &self,
        payload: String,
        source_prompt: String,
        reservation: Option<&Reservation>,
    ) -> Result<Created> {
        match &self.storage {
            Storage::Stored(store) => {
                let mut artifact = NewArtifact::new(payload, source_prompt);
                artifact.id = reservation.map(|held| held.id.clone());
                let record = store.put(artifact).await?;
                tracing::info!(reference = %record.id, payload_len = record.payload.len(), "artifact stored");

                Ok(Created {
                    retrieval_url: self.links.stored(&record.id),
                    reference: record.id.to_string(),
                    style: ReferenceStyle::Stored,
                    payload: record.payload,
                    source_prompt: record.source_prompt,
                    created_at: record.created_at,
                    warning: None,
                })
            }
            Storage::Inline { max_reference_len } => {
                let reference = reference::encode_inline(&payload);
                let retrieval_url = self.links.inline(&reference);
                let warning = (retrieval_url.len() > *max_reference_len).then(|| {
                    tracing::warn!(
                        url_len = retrieval_url.len(),
                        limit = max_reference_len,
                        "self-describing retrieval url exceeds limit"
                    );
                    format!(
                        "retrieval_url is {} bytes, above the {} byte limit; it will likely be rejected, use the inline payload instead",
                        retrieval_url.len(),
                        max_reference_len
                    )
                });

                Ok(Created {
                    reference,
                    retrieval_url,
                    style: ReferenceStyle::Inline,
                    payload,
                    source_prompt,
                    created_at: self.clock.now(),
                    warning,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ErrorKind,
        model::Model,
        reference::decode_inline,
        store::InMemoryArtifactStore,
        testing::ScriptedProvider,
    };
    use futures_util::TryStreamExt;
    use rstest::rstest;

    const BASE: &str = "https://adi.example.com";
    const PROMPT: &str = "Create a bar chart showing Q1 45K, Q2 52K, Q3 48K, Q4 61K";

    fn service(provider: &ScriptedProvider, storage: Storage) -> ArtifactService {
        let gateway = GenerationGateway::new(provider.clone(), "system", Model::default());
        ArtifactService::new(gateway, storage, RetrievalLinks::new(BASE))
    }

    fn stored(provider: &ScriptedProvider) -> (ArtifactService, Arc<InMemoryArtifactStore>) {
        let store = Arc::new(InMemoryArtifactStore::default());
        let service = service(provider, Storage::Stored(store.clone()));
        (service, store)
    }

    #[tokio::test]
    async fn create_then_retrieve_returns_generated_text() {
        let provider = ScriptedProvider::new(["<BarChart ", "data=[45,52,48,61]/>"]);
        let (service, _) = stored(&provider);

        let created = service
            .create_buffered(CreateRequest::new(PROMPT), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(created.style, ReferenceStyle::Stored);
        assert!(created.reference.starts_with(ArtifactId::PREFIX));
        assert!(created.retrieval_url.contains(&created.reference));

        let record = service.retrieve(&created.reference).await.unwrap();
        assert_eq!(record.payload, provider.full_text());
        assert_eq!(record.source_prompt, PROMPT);
        assert_eq!(record.created_at, created.created_at);
    }

    #[tokio::test]
    async fn fabricated_reference_is_not_found() {
        let provider = ScriptedProvider::new(["x"]);
        let (service, _) = stored(&provider);

        let err = service.retrieve("viz_0_zzzzzzzzz").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[rstest]
    #[case::empty("")]
    #[case::blank("    ")]
    #[tokio::test]
    async fn blank_prompt_is_rejected_without_generation(#[case] prompt: &str) {
        let provider = ScriptedProvider::new(["x"]);
        let (service, store) = stored(&provider);

        for delivery in [Delivery::Buffered, Delivery::Streaming] {
            let err = service
                .create(
                    CreateRequest::new(prompt).with_delivery(delivery),
                    CancellationToken::new(),
                )
                .await
                .unwrap_err();
            assert!(matches!(err, VizportError::InvalidRequest(ref m) if m == "Prompt is required"));
        }

        assert_eq!(provider.calls(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn generation_failure_persists_nothing() {
        let provider = ScriptedProvider::failing("upstream 503");
        let (service, store) = stored(&provider);

        let err = service
            .create_buffered(CreateRequest::new(PROMPT), CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::GenerationFailed);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn streaming_emits_chunks_then_created() {
        let provider = ScriptedProvider::new(["<Line", "Chart", "/>"]);
        let (service, _) = stored(&provider);

        let events: Vec<CreationEvent> = service
            .create_streaming(CreateRequest::new(PROMPT), CancellationToken::new())
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        let (last, chunks) = events.split_last().unwrap();
        let text: String = chunks
            .iter()
            .map(|event| match event {
                CreationEvent::Chunk(text) => text.as_str(),
                CreationEvent::Created(_) => panic!("created before the end"),
            })
            .collect();
        assert_eq!(text, "<LineChart/>");

        let CreationEvent::Created(created) = last else {
            panic!("stream must end with Created");
        };
        let record = service.retrieve(&created.reference).await.unwrap();
        assert_eq!(record.payload, text);
    }

    #[tokio::test]
    async fn failing_stream_ends_with_error_and_stores_nothing() {
        let provider = ScriptedProvider::new(["a", "b", "c"]).failing_after(2, "connection reset");
        let (service, store) = stored(&provider);

        let events: Vec<Result<CreationEvent>> = service
            .create_streaming(CreateRequest::new(PROMPT), CancellationToken::new())
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], Ok(CreationEvent::Chunk(ref t)) if t == "a"));
        assert!(matches!(events[2], Err(VizportError::GenerationFailed(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn dropped_stream_cancels_and_stores_nothing() {
        let provider = ScriptedProvider::new(["a", "b", "c"]);
        let (service, store) = stored(&provider);
        let cancel = CancellationToken::new();

        let mut stream = service
            .create_streaming(CreateRequest::new(PROMPT), cancel.clone())
            .await
            .unwrap();
        assert!(matches!(stream.next().await, Some(Ok(CreationEvent::Chunk(_)))));
        drop(stream);

        assert!(cancel.is_cancelled());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn cancelled_stream_ends_with_error_and_stores_nothing() {
        let provider = ScriptedProvider::new(["<Bar", "Chart", "/>"]);
        let (service, store) = stored(&provider);
        let cancel = CancellationToken::new();

        let mut stream = service
            .create_streaming(CreateRequest::new("chart"), cancel.clone())
            .await
            .unwrap();
        assert!(matches!(stream.next().await, Some(Ok(CreationEvent::Chunk(ref t))) if t == "<Bar"));

        cancel.cancel();
        let rest: Vec<Result<CreationEvent>> = stream.collect().await;

        assert_eq!(rest.len(), 1);
        assert!(matches!(rest[0], Err(VizportError::Cancelled)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn cancelled_buffered_create_stores_nothing() {
        let provider = ScriptedProvider::new(["x"]).pending_forever();
        let (service, store) = stored(&provider);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = service
            .create_buffered(CreateRequest::new(PROMPT), cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, VizportError::Cancelled));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn inline_mode_encodes_payload_into_reference() {
        let provider = ScriptedProvider::new(["<PieChart data=\"a&b\"/>"]);
        let service = service(&provider, Storage::inline());

        let created = service
            .create_buffered(CreateRequest::new(PROMPT), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(created.style, ReferenceStyle::Inline);
        assert_eq!(decode_inline(&created.reference).unwrap(), provider.full_text());
        assert_eq!(
            created.retrieval_url,
            format!("{BASE}/viz?data={}", created.reference)
        );
        assert_eq!(created.warning, None);
    }

    #[tokio::test]
    async fn inline_mode_warns_past_the_limit() {
        let provider = ScriptedProvider::new(["x".repeat(200)]);
        let service = service(&provider, Storage::Inline { max_reference_len: 64 });

        let created = service
            .create_buffered(CreateRequest::new(PROMPT), CancellationToken::new())
            .await
            .unwrap();

        assert!(created.warning.unwrap().contains("64 byte limit"));
        assert_eq!(created.payload.len(), 200);
    }

    #[tokio::test]
    async fn inline_mode_has_nothing_to_retrieve() {
        let provider = ScriptedProvider::new(["x"]);
        let service = service(&provider, Storage::inline());

        let err = service.retrieve("abc").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn custom_id_is_used_once() {
        let provider = ScriptedProvider::new(["x"]);
        let (service, _) = stored(&provider);

        let created = service
            .create_buffered(
                CreateRequest::new(PROMPT).with_id("session_1700000000_k3j9x"),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(created.reference, "session_1700000000_k3j9x");
        assert_eq!(
            created.retrieval_url,
            format!("{BASE}/visualization/session_1700000000_k3j9x")
        );

        let again = service
            .create_buffered(
                CreateRequest::new(PROMPT).with_id("session_1700000000_k3j9x"),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(again.kind(), ErrorKind::InvalidRequest);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn custom_id_in_flight_is_reserved() {
        let provider = ScriptedProvider::new(["a", "b"]);
        let (service, store) = stored(&provider);

        let mut first = service
            .create_streaming(
                CreateRequest::new(PROMPT).with_id("session_abc"),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        let err = service
            .create_buffered(
                CreateRequest::new(PROMPT).with_id("session_abc"),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert_eq!(provider.calls(), 0);

        let mut last = None;
        while let Some(event) = first.next().await {
            last = Some(event.unwrap());
        }
        assert!(matches!(last, Some(CreationEvent::Created(ref c)) if c.reference == "session_abc"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn abandoned_custom_id_is_released() {
        let provider = ScriptedProvider::new(["a", "b"]);
        let (service, store) = stored(&provider);

        let stream = service
            .create_streaming(
                CreateRequest::new(PROMPT).with_id("session_retry"),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        drop(stream);
        assert!(store.is_empty());

        let created = service
            .create_buffered(
                CreateRequest::new(PROMPT).with_id("session_retry"),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(created.reference, "session_retry");
    }

    #[tokio::test]
    async fn custom_id_needs_a_store() {
        let provider = ScriptedProvider::new(["x"]);
        let service = service(&provider, Storage::inline());

        let err = service
            .create_buffered(CreateRequest::new(PROMPT).with_id("abc"), CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn concurrent_creates_receive_independent_ids() {
        let provider = ScriptedProvider::new(["same text"]);
        let (service, store) = stored(&provider);

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .create_buffered(CreateRequest::new(PROMPT), CancellationToken::new())
                        .await
                        .unwrap()
                        .reference
                })
            })
            .collect();

        let mut references = std::collections::HashSet::new();
        for task in tasks {
            references.insert(task.await.unwrap());
        }
        assert_eq!(references.len(), 16);
        assert_eq!(store.len(), 16);
    }

    #[tokio::test]
    async fn default_delivery_applies_when_unspecified() {
        let provider = ScriptedProvider::new(["x"]);
        let (service, _) = stored(&provider);
        let service = service.with_default_delivery(Delivery::Streaming);

        let response = service
            .create(CreateRequest::new(PROMPT), CancellationToken::new())
            .await
            .unwrap();
        assert!(matches!(response, CreateResponse::Streaming(_)));

        let response = service
            .create(
                CreateRequest::new(PROMPT).with_delivery(Delivery::Buffered),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(matches!(response, CreateResponse::Complete(_)));
    }
}
