//! Pattern Matching Plugin
//!
//! Emits one entry per regex match in the input. The `pattern` parameter is
//! required and has no default, so requests that omit it fail with a 400
//! before the plugin ever runs. This is the built-in exercising the
//! missing-required-parameter path end to end.

use async_trait::async_trait;
use regex::Regex;

use crate::plugin::analysis::{AnalysisPlugin, Entry};
use crate::plugin::isolation::PluginError;
use crate::plugin::params::{ParamSpec, ParameterSchema, ResolvedParams};

/// Built-in regex matching plugin
#[derive(Debug, Default)]
pub struct PatternPlugin;

impl PatternPlugin {
    /// Create the plugin
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AnalysisPlugin for PatternPlugin {
    fn name(&self) -> &str {
        "pattern"
    }

    fn version(&self) -> &str {
        "0.1"
    }

    fn description(&self) -> &str {
        "Regular expression matches over the input text"
    }

    fn schema(&self) -> ParameterSchema {
        ParameterSchema::new()
            .with(ParamSpec::string("pattern").required().with_aliases(["re"]))
            .with(ParamSpec::boolean("case_sensitive").with_default(true))
    }

    fn analyse(&self, input: &str, params: &ResolvedParams) -> Result<Vec<Entry>, PluginError> {
        let pattern = params
            .get_str("pattern")
            .ok_or_else(|| PluginError::ConfigurationError("missing pattern".to_string()))?;

        let case_sensitive = params
            .get("case_sensitive")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(true);

        let expr = if case_sensitive {
            pattern.to_string()
        } else {
            format!("(?i){pattern}")
        };

        let regex = Regex::new(&expr)
            .map_err(|e| PluginError::ConfigurationError(format!("invalid pattern: {e}")))?;

        Ok(regex
            .find_iter(input)
            .map(|m| {
                Entry::new(m.as_str())
                    .with_annotation("start", m.start())
                    .with_annotation("end", m.end())
            })
            .collect())
    }
}
