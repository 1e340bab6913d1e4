//! JSON API handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use vizport_core::{
    ArtifactRecord, CreateRequest, CreateResponse, Created, CreationEvent, Delivery,
    VizportError, reference::ReferenceStyle, service::CreationStream,
};

use crate::{
    error::{ApiError, envelope},
    state::AppState,
};

/// Body of `POST /api/visualize`.
///
/// Besides creation it accepts the lookup form `{"action": "get", ...}`
/// that older clients send to the same endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizeBody {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    /// Requested id for a new artifact.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub visualization_id: Option<String>,
    #[serde(default)]
    pub mode: Option<Delivery>,
}

impl VisualizeBody {
    fn lookup_reference(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .or(self.visualization_id.as_deref())
            .or(self.session_id.as_deref())
    }

    fn into_create_request(self) -> CreateRequest {
        CreateRequest {
            prompt: self.prompt.unwrap_or_default(),
            id: self.id.or(self.session_id),
            delivery: self.mode,
        }
    }
}

/// Body of `POST /api/visualize/get`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupBody {
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub visualization_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedEnvelope {
    pub success: bool,
    pub reference: String,
    pub retrieval_url: String,
    pub timestamp: DateTime<Utc>,
    pub style: ReferenceStyle,
    pub data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl From<Created> for CreatedEnvelope {
    fn from(value: Created) -> Self {
        Self {
            success: true,
            reference: value.reference,
            retrieval_url: value.retrieval_url,
            timestamp: value.created_at,
            style: value.style,
            data: value.payload,
            warning: value.warning,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetrievedEnvelope {
    pub success: bool,
    pub reference: String,
    pub payload: String,
    pub created_at: DateTime<Utc>,
    pub source_prompt: String,
}

impl From<ArtifactRecord> for RetrievedEnvelope {
    fn from(value: ArtifactRecord) -> Self {
        Self {
            success: true,
            reference: value.id.to_string(),
            payload: value.payload,
            created_at: value.created_at,
            source_prompt: value.source_prompt,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChunkEnvelope {
    text: String,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn visualize(
    State(state): State<AppState>,
    body: Result<Json<VisualizeBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let action = body.action.clone();

    match action.as_deref() {
        None | Some("create") => create(&state, body.into_create_request()).await,
        Some("get") => {
            let reference = body.lookup_reference().unwrap_or_default();
            retrieve(&state, reference)
                .await
                .map(|found| found.into_response())
        }
        Some(other) => Err(VizportError::invalid(format!("unknown action `{other}`")).into()),
    }
}

pub async fn lookup(
    State(state): State<AppState>,
    body: Result<Json<LookupBody>, JsonRejection>,
) -> Result<Json<RetrievedEnvelope>, ApiError> {
    let Json(body) = body?;
    let reference = body
        .reference
        .or(body.visualization_id)
        .or(body.session_id)
        .unwrap_or_default();
    retrieve(&state, &reference).await
}

pub async fn lookup_by_path(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<RetrievedEnvelope>, ApiError> {
    retrieve(&state, &reference).await
}

async fn retrieve(state: &AppState, reference: &str) -> Result<Json<RetrievedEnvelope>, ApiError> {
    let record = state.service.retrieve(reference).await?;
    Ok(Json(record.into()))
}

async fn create(state: &AppState, request: CreateRequest) -> Result<Response, ApiError> {
    let cancel = CancellationToken::new();
    // Dropping this handler future (client went away) cancels the generation.
    let guard = cancel.clone().drop_guard();

    match state.service.create(request, cancel).await? {
        CreateResponse::Complete(created) => {
            Ok(Json(CreatedEnvelope::from(created)).into_response())
        }
        CreateResponse::Streaming(stream) => {
            // The stream carries its own guard from here on.
            let _ = guard.disarm();
            Ok(event_stream(stream).into_response())
        }
    }
}

/// `chunk` events, then exactly one `done` or `error` event.
fn event_stream(
    stream: CreationStream,
) -> Sse<impl futures_util::Stream<Item = Result<Event, axum::Error>>> {
    let events = stream.map(|item| match item {
        Ok(CreationEvent::Chunk(text)) => Event::default()
            .event("chunk")
            .json_data(ChunkEnvelope { text }),
        Ok(CreationEvent::Created(created)) => Event::default()
            .event("done")
            .json_data(CreatedEnvelope::from(created)),
        Err(err) => {
            let (_, body) = envelope(&err);
            Event::default().event("error").json_data(body)
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
