use serde::{Deserialize, Serialize};
use vizport_core::error::VizportError;
use vizport_core::generic::{GenericMessage, GenericRole};
use vizport_core::provider::GenerateParameters;

use crate::impl_builder_methods;
use crate::model_map::map_model;

use super::common;

#[derive(Debug, Serialize, Clone)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatCompletionMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl ChatCompletionRequest {
    pub fn new(model: String, messages: Vec<ChatCompletionMessage>) -> Self {
        Self {
            model,
            messages,
            temperature: None,
            top_p: None,
            max_tokens: None,
            stream: None,
        }
    }
}

impl_builder_methods!(
    ChatCompletionRequest,
    temperature: f64,
    top_p: f64,
    max_tokens: i64,
    stream: bool
);

impl TryFrom<GenerateParameters> for ChatCompletionRequest {
    type Error = VizportError;

    fn try_from(value: GenerateParameters) -> Result<Self, Self::Error> {
        let model = map_model(value.model()).ok_or_else(|| {
            VizportError::invalid(format!(
                "backend does not support selected model: {}",
                value.model()
            ))
        })?;

        Ok(Self {
            model: model.into_owned(),
            temperature: value.temperature,
            top_p: None,
            max_tokens: None,
            stream: None,
            messages: value.into_messages().into_iter().map(Into::into).collect(),
        })
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    System,
    Assistant,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ChatCompletionMessage {
    pub role: MessageRole,
    pub content: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionMessageForResponse {
    pub role: MessageRole,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionChoice {
    pub index: i64,
    pub message: ChatCompletionMessageForResponse,
    pub finish_reason: Option<FinishReason>,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: Option<String>,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<ChatCompletionChoice>,
    #[serde(default)]
    pub usage: Option<common::Usage>,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    /// Anything else the endpoint reports, such as `tool_calls`.
    #[serde(other)]
    Other,
}

impl From<GenericRole> for MessageRole {
    fn from(value: GenericRole) -> Self {
        match value {
            GenericRole::System => MessageRole::System,
            GenericRole::Assistant => MessageRole::Assistant,
            GenericRole::User => MessageRole::User,
        }
    }
}

impl From<GenericMessage> for ChatCompletionMessage {
    fn from(value: GenericMessage) -> Self {
        Self {
            role: value.role.into(),
            content: value.content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vizport_core::model::Model;

    #[test]
    fn request_from_parameters_uses_wire_model_and_roles() {
        let params = GenerateParameters::new(
            vec![GenericMessage::system("sys"), GenericMessage::user("chart please")],
            Model::default(),
        );

        let request = ChatCompletionRequest::try_from(params).unwrap();
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "model": "c1/anthropic/claude-sonnet-4/v-20250815",
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "chart please"}
                ]
            })
        );
    }

    #[test]
    fn builder_methods_set_optional_fields() {
        let request = ChatCompletionRequest::new("m".into(), vec![])
            .stream(true)
            .temperature(0.2);

        assert_eq!(request.stream, Some(true));
        assert_eq!(request.temperature, Some(0.2));
    }

    #[test]
    fn unknown_finish_reason_still_parses() {
        let body = r#"{
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": null},
                "finish_reason": "tool_calls"
            }]
        }"#;

        let response: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.choices[0].finish_reason, Some(FinishReason::Other));
        assert_eq!(response.choices[0].message.content, None);
    }

    #[test]
    fn response_without_usage_parses() {
        let body = r#"{
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1755250000,
            "model": "c1/anthropic/claude-sonnet-4/v-20250815",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "<content>chart</content>"},
                "finish_reason": "stop"
            }]
        }"#;

        let response: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.usage, None);
        assert_eq!(response.choices[0].finish_reason, Some(FinishReason::Stop));
        assert_eq!(
            response.choices[0].message.content.as_deref(),
            Some("<content>chart</content>")
        );
    }
}
