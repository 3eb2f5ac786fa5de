//! Analysis Plugin Contract
//!
//! An analysis plugin is a named, versioned unit that turns an input text
//! into a sequence of annotated entries. Plugins additionally declare a
//! parameter schema (merged with the global one at dispatch time) and may
//! implement async lifecycle hooks for setup work such as loading models or
//! opening connections.
//!
//! Conformance is checked at registration time: anything that implements
//! this trait can be registered, anything else cannot. There is no
//! duck-typed dispatch.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use super::isolation::PluginError;
use super::params::{ParameterSchema, ResolvedParams};

/// Derive the stable plugin identifier used verbatim in responses
///
/// Format: `plugins/{name}_{version}`.
pub fn plugin_id(name: &str, version: &str) -> String {
    format!("plugins/{name}_{version}")
}

/// A single analysis result entry
///
/// The core treats entries as opaque beyond serializability: plugins attach
/// whatever vocabulary-specific annotations they produce via the flattened
/// annotation map.
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    /// The analysed text (or the matched fragment)
    pub text: String,

    /// Plugin-produced annotations, flattened into the entry document
    #[serde(flatten)]
    pub annotations: Map<String, Value>,
}

impl Entry {
    /// Create an entry with no annotations
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            annotations: Map::new(),
        }
    }

    /// Attach an annotation
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }
}

/// The capability contract every analysis plugin satisfies
///
/// `analyse` is synchronous and CPU-bound by assumption; it runs to
/// completion once dispatched and is panic-isolated by the dispatcher.
/// Lifecycle hooks are async because activation may perform arbitrary,
/// possibly slow setup.
#[async_trait]
pub trait AnalysisPlugin: Send + Sync {
    /// Unique plugin name within the registry
    fn name(&self) -> &str;

    /// Plugin version string
    fn version(&self) -> &str;

    /// Brief human-readable description
    fn description(&self) -> &str {
        ""
    }

    /// Plugin-specific parameter schema, merged with the global schema at
    /// dispatch time
    fn schema(&self) -> ParameterSchema {
        ParameterSchema::new()
    }

    /// Lifecycle hook run on activation
    ///
    /// Return an error to leave the plugin in the `Failed` state.
    async fn activate(&self) -> Result<(), PluginError> {
        Ok(())
    }

    /// Lifecycle hook run on deactivation
    async fn deactivate(&self) -> Result<(), PluginError> {
        Ok(())
    }

    /// Analyse the input with the given resolved parameters
    fn analyse(&self, input: &str, params: &ResolvedParams) -> Result<Vec<Entry>, PluginError>;

    /// The stable identifier exposed in responses
    fn id(&self) -> String {
        plugin_id(self.name(), self.version())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_id_format() {
        assert_eq!(plugin_id("wordcount", "0.1"), "plugins/wordcount_0.1");
    }

    #[test]
    fn test_entry_serialization_flattens_annotations() {
        let entry = Entry::new("hello").with_annotation("tokens", 1);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["text"], "hello");
        assert_eq!(json["tokens"], 1);
    }
}
