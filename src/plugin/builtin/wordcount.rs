//! Word Count Plugin
//!
//! Emits one entry per request with simple token statistics. Declares an
//! optional `language` parameter with a default, which makes it a useful
//! smoke-test target: every request that reaches it succeeds.

use async_trait::async_trait;

use crate::plugin::analysis::{AnalysisPlugin, Entry};
use crate::plugin::isolation::PluginError;
use crate::plugin::params::{ParamSpec, ParameterSchema, ResolvedParams};

/// Built-in token statistics plugin
#[derive(Debug, Default)]
pub struct WordCountPlugin;

impl WordCountPlugin {
    /// Create the plugin
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AnalysisPlugin for WordCountPlugin {
    fn name(&self) -> &str {
        "wordcount"
    }

    fn version(&self) -> &str {
        "0.1"
    }

    fn description(&self) -> &str {
        "Whitespace token statistics for the input text"
    }

    fn schema(&self) -> ParameterSchema {
        ParameterSchema::new().with(
            ParamSpec::string("language")
                .with_default("en")
                .with_aliases(["lang"]),
        )
    }

    fn analyse(&self, input: &str, params: &ResolvedParams) -> Result<Vec<Entry>, PluginError> {
        let tokens: Vec<&str> = input.split_whitespace().collect();
        let language = params.get_str("language").unwrap_or("en");
        Ok(vec![Entry::new(input)
            .with_annotation("tokens", tokens.len())
            .with_annotation("characters", input.chars().count())
            .with_annotation("language", language)])
    }
}
