//! Request Dispatcher
//!
//! The per-request orchestration: select the target plugin (explicit `algo`
//! or the registry default), resolve parameters against the merged schema,
//! invoke the plugin under panic isolation and package the result into a
//! response envelope.
//!
//! The dispatcher is stateless between calls; all state lives in the
//! registry. No registry lock is held while a plugin runs, so analysis can
//! never block unrelated activation calls.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;

use crate::errors::{ApiError, ApiResult};

use super::envelope::{build_results, AnalysisResults};
use super::isolation::call_plugin_safely;
use super::params::{global_schema, PARAM_ALGORITHM, PARAM_INPUT, PARAM_IN_HEADERS};
use super::registry::{PluginHandle, PluginRegistry, RegistryError};

/// Dispatch one analysis request
///
/// `raw` is the raw key-value parameter map supplied by the routing layer
/// (query parameters, case-sensitive keys).
pub async fn dispatch(
    registry: &PluginRegistry,
    raw: &HashMap<String, String>,
) -> ApiResult<AnalysisResults> {
    // Global parameters first: a missing input fails before any plugin
    // lookup, and `algo` needs alias normalization before it can be used.
    let globals = global_schema().resolve(raw)?;

    let handle = select_plugin(registry, globals.get_str(PARAM_ALGORITHM))?;

    // Merge the plugin's declared schema and re-resolve; this is where
    // plugin-required parameters without defaults fail the request.
    let merged = global_schema().merge(&handle.plugin.schema());
    let resolved = merged.resolve(raw)?;

    let input = resolved
        .get_str(PARAM_INPUT)
        .ok_or_else(|| ApiError::MissingParameter(PARAM_INPUT.to_string()))?
        .to_string();

    let plugin = handle.plugin.clone();
    let name = plugin.name().to_string();
    tracing::debug!(plugin = %name, "Dispatching analysis");

    // Panic-isolated invocation; no registry lock is held here.
    let result = call_plugin_safely(AssertUnwindSafe(|| plugin.analyse(&input, &resolved)));

    match result {
        Ok(entries) => {
            registry.record_success(&name);
            let in_headers = resolved.get_flag(PARAM_IN_HEADERS);
            Ok(build_results(entries, plugin.id(), in_headers))
        }
        Err(e) => {
            registry.record_error(&name, e.to_string());
            Err(ApiError::execution(name, &e))
        }
    }
}

/// Select the dispatch target: explicit `algo` or the registry default
///
/// A named plugin that is unknown *or* not activated maps to the same 404;
/// only `Activated` plugins are eligible targets.
fn select_plugin(
    registry: &PluginRegistry,
    algo: Option<&str>,
) -> Result<PluginHandle, ApiError> {
    match algo {
        Some(name) => {
            let handle = registry
                .get(name)
                .map_err(|_| ApiError::UnknownPlugin(name.to_string()))?;
            if !handle.is_active() {
                return Err(ApiError::UnknownPlugin(name.to_string()));
            }
            Ok(handle)
        }
        None => registry.resolve_default().map_err(|e| match e {
            RegistryError::NoDefaultAvailable => ApiError::NoDefaultAvailable,
            other => other.into(),
        }),
    }
}
