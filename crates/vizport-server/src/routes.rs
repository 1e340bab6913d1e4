use axum::{
    Router,
    http::{Method, header},
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{handlers, pages, state::AppState};

/// Every route the service answers, with CORS and request tracing.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/visualize", post(handlers::visualize))
        .route("/api/visualize/get", post(handlers::lookup))
        .route("/api/visualizations/{reference}", get(handlers::lookup_by_path))
        .route("/visualization/{reference}", get(pages::stored_page))
        .route("/viz", get(pages::inline_page))
        .route("/health", get(handlers::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
