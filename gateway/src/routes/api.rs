use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::api;
use crate::state::AppState;
use std::sync::Arc;

/// Create the HTTP router
///
/// - `GET /` - health check
/// - `POST /voice` - inbound-call webhook returning stream markup (GET is accepted too)
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(api::health_check))
        .route("/voice", get(api::voice_webhook).post(api::voice_webhook))
        .layer(TraceLayer::new_for_http())
}
