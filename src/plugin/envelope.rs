//! Response Envelope Builder
//!
//! Assembles the JSON-LD-flavoured documents returned by the gateway:
//! analysis results, plugin listings and plugin details. Every document
//! optionally carries a `@context` reference to the vocabulary document;
//! the `inHeaders` negotiation flag omits it *structurally* (the key is
//! absent, never null), and applies uniformly to every endpoint that
//! returns a document.
//!
//! Identifiers are stable: plugin-bearing documents expose
//! `plugins/{name}_{version}` verbatim, analysis responses get a fresh
//! `Results_{uuid}` id.

use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::analysis::Entry;
use super::params::ParameterSchema;
use super::registry::PluginHandle;

/// Reference URI for the vocabulary/context document
///
/// The gateway consumes this document, it never generates its contents;
/// responses only attach this reference.
pub const CONTEXT_URI: &str = "/api/contexts/context.jsonld";

/// Analysis response document
#[derive(Debug, Serialize)]
pub struct AnalysisResults {
    /// Context reference, omitted when the negotiation flag is truthy
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Response-level identifier, distinct from any plugin identifier
    #[serde(rename = "@id")]
    pub id: String,

    /// Identifier of the plugin that produced the entries
    pub analysis: Vec<String>,

    /// Plugin-produced result entries, in plugin order
    pub entries: Vec<Entry>,
}

/// Summary document describing a single plugin
#[derive(Debug, Serialize)]
pub struct PluginSummary {
    /// Stable identifier, `plugins/{name}_{version}` verbatim
    #[serde(rename = "@id")]
    pub id: String,

    /// Plugin name
    pub name: String,

    /// Plugin version
    pub version: String,

    /// Brief description
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Current lifecycle state
    pub status: String,

    /// Whether this plugin is the registry-wide default
    pub is_default: bool,

    /// Declared plugin parameters
    pub extra_params: Value,
}

/// Plugin detail response document
///
/// Carries the usage counters the listing leaves out.
#[derive(Debug, Serialize)]
pub struct PluginDetail {
    /// Context reference, omitted when the negotiation flag is truthy
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// The plugin summary
    #[serde(flatten)]
    pub plugin: PluginSummary,

    /// Number of analysis calls served
    pub call_count: u64,

    /// Number of errors encountered (activation or analysis)
    pub error_count: u64,

    /// Last error message, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Plugin listing response document
#[derive(Debug, Serialize)]
pub struct PluginListing {
    /// Context reference, omitted when the negotiation flag is truthy
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Listing identifier
    #[serde(rename = "@id")]
    pub id: String,

    /// One summary per registered plugin, in registration order
    pub plugins: Vec<PluginSummary>,
}

fn context_for(in_headers: bool) -> Option<String> {
    if in_headers {
        None
    } else {
        Some(CONTEXT_URI.to_string())
    }
}

/// Render a parameter schema as a JSON document for plugin summaries
fn schema_document(schema: &ParameterSchema) -> Value {
    let mut doc = serde_json::Map::new();
    for spec in schema.specs() {
        let mut entry = serde_json::Map::new();
        entry.insert("required".to_string(), Value::Bool(spec.required));
        if let Some(default) = &spec.default {
            entry.insert("default".to_string(), default.clone());
        }
        if !spec.aliases.is_empty() {
            entry.insert("aliases".to_string(), json!(spec.aliases));
        }
        doc.insert(spec.name.clone(), Value::Object(entry));
    }
    Value::Object(doc)
}

/// Build the analysis response document
pub fn build_results(
    entries: Vec<Entry>,
    plugin_id: impl Into<String>,
    in_headers: bool,
) -> AnalysisResults {
    AnalysisResults {
        context: context_for(in_headers),
        id: format!("Results_{}", Uuid::new_v4()),
        analysis: vec![plugin_id.into()],
        entries,
    }
}

/// Build a plugin summary from a registry snapshot
pub fn plugin_summary(handle: &PluginHandle) -> PluginSummary {
    PluginSummary {
        id: handle.plugin.id(),
        name: handle.plugin.name().to_string(),
        version: handle.plugin.version().to_string(),
        description: handle.plugin.description().to_string(),
        status: handle.state.to_string(),
        is_default: handle.is_default,
        extra_params: schema_document(&handle.plugin.schema()),
    }
}

/// Build the plugin detail document
pub fn build_detail(handle: &PluginHandle, in_headers: bool) -> PluginDetail {
    PluginDetail {
        context: context_for(in_headers),
        plugin: plugin_summary(handle),
        call_count: handle.call_count,
        error_count: handle.error_count,
        last_error: handle.last_error.clone(),
    }
}

/// Build the plugin listing document
pub fn build_listing(handles: &[PluginHandle], in_headers: bool) -> PluginListing {
    PluginListing {
        context: context_for(in_headers),
        id: "plugins".to_string(),
        plugins: handles.iter().map(plugin_summary).collect(),
    }
}
