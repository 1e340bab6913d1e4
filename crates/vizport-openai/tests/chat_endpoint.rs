use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use futures_util::TryStreamExt;
use serde_json::{Value, json};
use vizport_core::{
    error::{ErrorKind, VizportError},
    generic::GenericMessage,
    model::Model,
    provider::{GenerateParameters, StreamingTextProvider, TextGenerationProvider},
};
use vizport_openai::{OpenAiAdapter, OpenAiAdapterBuilder};

const KEY: &str = "test-key";

async fn completions(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let authorised = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        == Some("Bearer test-key");
    if !authorised {
        return (StatusCode::UNAUTHORIZED, "invalid api key").into_response();
    }

    let user_prompt = body["messages"][1]["content"].as_str().unwrap_or_default();
    if user_prompt == "explode" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream broke").into_response();
    }

    if body["stream"] == json!(true) {
        let frames = [
            json!({"choices": [{"index": 0, "delta": {"role": "assistant"}, "finish_reason": null}]}),
            json!({"choices": [{"index": 0, "delta": {"content": "<BarChart "}, "finish_reason": null}]}),
            json!({"choices": [{"index": 0, "delta": {"content": ""}, "finish_reason": null}]}),
            json!({"choices": [{"index": 0, "delta": {"content": "data=[45,52]/>"}, "finish_reason": null}]}),
            json!({"choices": [{"index": 0, "delta": {}, "finish_reason": "stop"}]}),
        ];
        let mut sse = String::from(": keep-alive\n\n");
        for frame in frames {
            sse.push_str(&format!("data: {frame}\n\n"));
        }
        sse.push_str("data: [DONE]\n\n");
        return ([(header::CONTENT_TYPE, "text/event-stream")], sse).into_response();
    }

    Json(json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "created": 1755250000,
        "model": body["model"],
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": format!("<Card>{user_prompt}</Card>")},
            "finish_reason": "stop"
        }]
    }))
    .into_response()
}

async fn spawn_mock() -> String {
    let router = Router::new().route("/v1/chat/completions", post(completions));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/v1")
}

fn adapter(base: &str, key: &str) -> OpenAiAdapter {
    OpenAiAdapterBuilder::new()
        .with_api_key(key)
        .with_base_url(base)
        .build()
        .unwrap()
}

fn params(prompt: &str) -> GenerateParameters {
    GenerateParameters::new(
        vec![GenericMessage::system("render charts"), GenericMessage::user(prompt)],
        Model::default(),
    )
}

#[tokio::test]
async fn buffered_completion_returns_first_choice_text() {
    let base = spawn_mock().await;

    let text = adapter(&base, KEY)
        .generate(params("sales by quarter"))
        .await
        .unwrap();

    assert_eq!(text, "<Card>sales by quarter</Card>");
}

#[tokio::test]
async fn streamed_completion_yields_non_empty_deltas_in_order() {
    let base = spawn_mock().await;
    let adapter = adapter(&base, KEY);

    let chunks: Vec<String> = adapter
        .generate_stream(params("chart"))
        .try_collect()
        .await
        .unwrap();

    assert_eq!(chunks, ["<BarChart ", "data=[45,52]/>"]);
}

#[tokio::test]
async fn rejected_credentials_are_generation_failures() {
    let base = spawn_mock().await;

    let err = adapter(&base, "wrong-key")
        .generate(params("chart"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::GenerationFailed);
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn upstream_error_status_ends_the_stream_with_an_error() {
    let base = spawn_mock().await;
    let adapter = adapter(&base, KEY);

    let result: Result<Vec<String>, VizportError> =
        adapter.generate_stream(params("explode")).try_collect().await;

    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::GenerationFailed);
    assert!(err.to_string().contains("upstream broke"));
}

#[tokio::test]
async fn unreachable_endpoint_is_a_generation_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}/v1", listener.local_addr().unwrap());
    drop(listener);

    let err = adapter(&base, KEY)
        .generate(params("chart"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::GenerationFailed);
}
