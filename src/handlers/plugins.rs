//! Plugin REST Endpoints
//!
//! Discovery and lifecycle endpoints for analysis plugins:
//!
//! - `GET /api/plugins/` - list all plugins
//! - `GET /api/plugins/{name}/` - plugin detail; the literal name `default`
//!   resolves the registry default
//! - `POST /api/plugins/{name}/activate` - activate (background unless
//!   `sync=1`)
//! - `POST /api/plugins/{name}/deactivate` - deactivate, same shape
//!
//! Listing and detail documents obey the same `inHeaders` negotiation flag
//! as the analysis endpoint.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde_json::{json, Value};

use crate::errors::{ApiError, ApiResult};
use crate::plugin::envelope::{build_detail, build_listing, PluginDetail, PluginListing};
use crate::plugin::params::{negotiation_flag, parse_flag};
use crate::plugin::registry::PluginHandle;
use crate::state::AppState;

/// Reserved plugin name resolving to the registry default
const DEFAULT_ALIAS: &str = "default";

/// List all registered plugins
pub async fn list_plugins(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<PluginListing>> {
    let handles = state.registry.list();
    let in_headers = negotiation_flag(&params);
    Ok(Json(build_listing(&handles, in_headers)))
}

/// Get one plugin by name, or the default via the `default` alias
pub async fn get_plugin(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<PluginDetail>> {
    let handle = lookup(&state, &name)?;
    let in_headers = negotiation_flag(&params);
    Ok(Json(build_detail(&handle, in_headers)))
}

/// Activate a plugin
///
/// Runs in the background by default; `sync=1` (or `sync=true`) suspends
/// the request until the plugin reaches `Activated` or `Failed`.
pub async fn activate_plugin(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    let sync = params.get("sync").map(|v| parse_flag(v)).unwrap_or(false);
    let new_state = state.registry.activate(&name, sync).await?;
    Ok(Json(transition_document(&state, &name, new_state)?))
}

/// Deactivate a plugin, symmetric to [`activate_plugin`]
pub async fn deactivate_plugin(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    let sync = params.get("sync").map(|v| parse_flag(v)).unwrap_or(false);
    let new_state = state.registry.deactivate(&name, sync).await?;
    Ok(Json(transition_document(&state, &name, new_state)?))
}

fn lookup(state: &AppState, name: &str) -> Result<PluginHandle, ApiError> {
    if name == DEFAULT_ALIAS {
        state
            .registry
            .resolve_default()
            .map_err(|_| ApiError::UnknownPlugin(DEFAULT_ALIAS.to_string()))
    } else {
        Ok(state.registry.get(name)?)
    }
}

fn transition_document(
    state: &AppState,
    name: &str,
    new_state: crate::plugin::PluginState,
) -> Result<Value, ApiError> {
    let handle = state.registry.get(name)?;
    Ok(json!({
        "@id": handle.plugin.id(),
        "name": name,
        "status": new_state.to_string(),
    }))
}
