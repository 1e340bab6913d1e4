use serde::Deserialize;

use super::chat_completion::FinishReason;

/// The part of a streamed delta the backend reads.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionMessageDelta {
    #[serde(default)]
    pub content: Option<String>,
}

/// A single streaming choice payload.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionChunkChoice {
    #[serde(default)]
    pub index: i64,
    pub delta: ChatCompletionMessageDelta,
    pub finish_reason: Option<FinishReason>,
}

/// The outermost object sent for each SSE chunk.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionChunkResponse {
    pub choices: Vec<ChatCompletionChunkChoice>,
}
