use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, plugins};
use crate::state::AppState;
use std::sync::Arc;

/// Create the API router
///
/// The routing layer only turns a URL into a call into the core; all
/// behavior (target selection, parameter resolution, error shaping) lives
/// behind these handlers.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(api::health_check))
        .route("/api/", get(api::analyse))
        .route("/api/plugins/", get(plugins::list_plugins))
        .route("/api/plugins/{name}/", get(plugins::get_plugin))
        .route("/api/plugins/{name}/activate", post(plugins::activate_plugin))
        .route(
            "/api/plugins/{name}/deactivate",
            post(plugins::deactivate_plugin),
        )
        .route("/api/contexts/context.jsonld", get(api::get_context))
        .route("/api/schemas/definitions.json", get(api::get_definitions))
        .layer(TraceLayer::new_for_http())
}
