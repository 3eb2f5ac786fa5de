//! Core API Handlers
//!
//! The analysis endpoint plus the static vocabulary/context and schema
//! documents. The static documents are consumed, not generated: they are
//! embedded at compile time and served verbatim; the gateway only decides
//! whether responses attach a reference to them.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use once_cell::sync::Lazy;
use serde_json::{json, Value};

use crate::errors::ApiResult;
use crate::plugin::envelope::AnalysisResults;
use crate::plugin::dispatch;
use crate::state::AppState;

/// Parsed vocabulary/context document, embedded at compile time
static CONTEXT_DOCUMENT: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../static/context.jsonld"))
        .expect("embedded context.jsonld is valid JSON")
});

/// Parsed schema document, embedded at compile time
static SCHEMA_DOCUMENT: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../static/definitions.json"))
        .expect("embedded definitions.json is valid JSON")
});

/// Health check endpoint
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "sema-gateway",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Analyse the input with the selected (or default) plugin
///
/// `GET /api/?i=...&algo=...&inHeaders=...` plus any plugin-declared
/// parameters. Every failure is a structured error object.
pub async fn analyse(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<AnalysisResults>> {
    let results = dispatch::dispatch(&state.registry, &params).await?;
    Ok(Json(results))
}

/// Serve the vocabulary/context document
pub async fn get_context() -> Json<Value> {
    Json(CONTEXT_DOCUMENT.clone())
}

/// Serve the response schema document
pub async fn get_definitions() -> Json<Value> {
    Json(SCHEMA_DOCUMENT.clone())
}
