//! Minimal HTML retrieval pages. The payload is shown verbatim, escaped,
//! inside a `<pre>` block.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
};
use serde::Deserialize;

use crate::{error::envelope, state::AppState};

#[derive(Debug, Deserialize)]
pub struct VizQuery {
    pub data: Option<String>,
}

/// `GET /visualization/{reference}`
pub async fn stored_page(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> (StatusCode, Html<String>) {
    match state.service.retrieve(&reference).await {
        Ok(record) => (
            StatusCode::OK,
            render_payload(&record.payload, Some(&record.source_prompt)),
        ),
        Err(err) => {
            let (status, body) = envelope(&err);
            (status, render_message(&body.error))
        }
    }
}

/// `GET /viz?data=...`
///
/// The query extractor already undoes the percent-encoding of the
/// reference, so `data` is the payload itself.
pub async fn inline_page(Query(query): Query<VizQuery>) -> (StatusCode, Html<String>) {
    match query.data.filter(|data| !data.is_empty()) {
        Some(data) => (StatusCode::OK, render_payload(&data, None)),
        None => (
            StatusCode::BAD_REQUEST,
            render_message("No visualization data found"),
        ),
    }
}

fn render_payload(payload: &str, source_prompt: Option<&str>) -> Html<String> {
    let prompt = source_prompt
        .map(|prompt| format!("<p class=\"prompt\">{}</p>\n", escape_html(prompt)))
        .unwrap_or_default();

    Html(layout(&format!(
        "{prompt}<pre>{}</pre>\n<p class=\"meta\">Data length: {} characters</p>\n",
        escape_html(payload),
        payload.chars().count()
    )))
}

fn render_message(message: &str) -> Html<String> {
    Html(layout(&format!("<p class=\"meta\">{}</p>\n", escape_html(message))))
}

fn layout(body: &str) -> String {
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Data Visualization</title>\n</head>\n<body>\n<h1>Data Visualization</h1>\n{body}</body>\n</html>\n"
    )
}

pub(crate) fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
