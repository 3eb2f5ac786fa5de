//! Parameter Schema and Resolution
//!
//! Every analysis request carries a raw key-value parameter map. Each plugin
//! declares a parameter schema, which is merged with the global schema (the
//! parameters every request understands: `i`, `algo`, `inHeaders`) and then
//! resolved against the raw map.
//!
//! Resolution is a pure function: alias normalization, default substitution,
//! required-parameter checks and type coercion all happen here, with no side
//! effects. Missing required parameters fail fast in schema declaration
//! order so callers get a deterministic error when several are missing.

use std::collections::HashMap;

use serde_json::Value;

/// Name of the input-text parameter
pub const PARAM_INPUT: &str = "i";

/// Name of the plugin-selection parameter
pub const PARAM_ALGORITHM: &str = "algo";

/// Name of the content-negotiation flag controlling `@context` attachment
pub const PARAM_IN_HEADERS: &str = "inHeaders";

/// Error produced by parameter resolution
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    /// A required parameter has no caller value and no default
    #[error("Missing or invalid parameters: '{0}' is required")]
    Missing(String),

    /// A supplied value failed type coercion
    #[error("Missing or invalid parameters: '{value}' is not a valid value for '{name}'")]
    Invalid {
        /// Canonical parameter name
        name: String,
        /// The rejected raw value
        value: String,
    },
}

/// Declared type of a parameter, driving coercion of the raw string value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Kept verbatim as a string
    String,

    /// Strict boolean: `1`/`true`/`0`/`false` (case-insensitive), anything
    /// else is an [`ParamError::Invalid`]
    Bool,

    /// Total truthy flag: exactly `"1"` and `"true"` are truthy, every other
    /// literal is falsy. Never fails coercion.
    Flag,
}

/// Parse a negotiation-flag literal
///
/// The accepted-true set is fixed and deliberately narrow: `"1"` and
/// `"true"`, nothing else. `"yes"`, `"True"`, `"on"` and arbitrary non-empty
/// strings are all falsy. The function is total; a flag value can never fail
/// a request.
pub fn parse_flag(raw: &str) -> bool {
    matches!(raw, "1" | "true")
}

/// A single declared parameter
#[derive(Debug, Clone)]
pub struct ParamSpec {
    /// Canonical parameter name
    pub name: String,

    /// Alternative raw keys accepted for this parameter (first match wins,
    /// after the canonical name)
    pub aliases: Vec<String>,

    /// Whether resolution fails when neither a value nor a default exists
    pub required: bool,

    /// Default substituted when the caller supplies no value
    pub default: Option<Value>,

    /// Declared type, drives coercion
    pub kind: ParamKind,
}

impl ParamSpec {
    /// Declare an optional string parameter
    pub fn string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            required: false,
            default: None,
            kind: ParamKind::String,
        }
    }

    /// Declare an optional strict-boolean parameter
    pub fn boolean(name: impl Into<String>) -> Self {
        Self {
            kind: ParamKind::Bool,
            ..Self::string(name)
        }
    }

    /// Declare a total truthy flag (defaults to false when absent)
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            kind: ParamKind::Flag,
            default: Some(Value::Bool(false)),
            ..Self::string(name)
        }
    }

    /// Mark the parameter as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the default value
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Add accepted aliases
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    /// Find the raw value for this parameter: canonical name first, then
    /// aliases in declaration order.
    fn lookup<'a>(&self, raw: &'a HashMap<String, String>) -> Option<&'a String> {
        raw.get(&self.name)
            .or_else(|| self.aliases.iter().find_map(|alias| raw.get(alias)))
    }

    /// Coerce a raw string value to the declared type
    fn coerce(&self, raw: &str) -> Result<Value, ParamError> {
        match self.kind {
            ParamKind::String => Ok(Value::String(raw.to_string())),
            ParamKind::Flag => Ok(Value::Bool(parse_flag(raw))),
            ParamKind::Bool => match raw.to_ascii_lowercase().as_str() {
                "1" | "true" => Ok(Value::Bool(true)),
                "0" | "false" => Ok(Value::Bool(false)),
                _ => Err(ParamError::Invalid {
                    name: self.name.clone(),
                    value: raw.to_string(),
                }),
            },
        }
    }
}

/// An ordered set of parameter declarations
///
/// Declaration order matters: resolution reports the first missing required
/// parameter in this order.
#[derive(Debug, Clone, Default)]
pub struct ParameterSchema {
    specs: Vec<ParamSpec>,
}

impl ParameterSchema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter declaration
    pub fn with(mut self, spec: ParamSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Iterate declarations in order
    pub fn specs(&self) -> impl Iterator<Item = &ParamSpec> {
        self.specs.iter()
    }

    /// Merge this (global) schema with a plugin-declared schema
    ///
    /// Plugin redeclarations of a global name take the plugin's default and
    /// aliases, but may only strengthen required-ness, never weaken it.
    /// Plugin-only names are appended after the global declarations.
    pub fn merge(&self, plugin: &ParameterSchema) -> ParameterSchema {
        let mut merged = self.clone();
        for spec in &plugin.specs {
            if let Some(existing) = merged.specs.iter_mut().find(|s| s.name == spec.name) {
                existing.default = spec.default.clone();
                existing.aliases = spec.aliases.clone();
                existing.kind = spec.kind;
                existing.required = existing.required || spec.required;
            } else {
                merged.specs.push(spec.clone());
            }
        }
        merged
    }

    /// Resolve a raw parameter map against this schema
    ///
    /// Raw keys that match no declaration are ignored. The result is the
    /// final, immutable parameter set handed to exactly one plugin
    /// invocation.
    pub fn resolve(&self, raw: &HashMap<String, String>) -> Result<ResolvedParams, ParamError> {
        let mut values = HashMap::with_capacity(self.specs.len());
        for spec in &self.specs {
            if let Some(raw_value) = spec.lookup(raw) {
                values.insert(spec.name.clone(), spec.coerce(raw_value)?);
            } else if let Some(default) = &spec.default {
                values.insert(spec.name.clone(), default.clone());
            } else if spec.required {
                return Err(ParamError::Missing(spec.name.clone()));
            }
        }
        Ok(ResolvedParams { values })
    }
}

/// The resolved parameter set for one plugin invocation
///
/// Canonical names only; aliases have been normalized away and defaults
/// substituted. Immutable once produced.
#[derive(Debug, Clone, Default)]
pub struct ResolvedParams {
    values: HashMap<String, Value>,
}

impl ResolvedParams {
    /// Get a resolved value by canonical name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Get a resolved string value by canonical name
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    /// Get a resolved boolean value, false when absent or non-boolean
    pub fn get_flag(&self, name: &str) -> bool {
        self.values
            .get(name)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Read the negotiation flag straight from a raw parameter map
///
/// Used by endpoints that return a document without running full parameter
/// resolution (listing, detail). The lookup comes from the `inHeaders`
/// declaration in [`global_schema`], so alias handling cannot drift from
/// the analyse endpoint.
pub fn negotiation_flag(raw: &HashMap<String, String>) -> bool {
    global_schema()
        .specs
        .iter()
        .find(|spec| spec.name == PARAM_IN_HEADERS)
        .and_then(|spec| spec.lookup(raw))
        .map(|v| parse_flag(v))
        .unwrap_or(false)
}

/// The global parameter schema shared by every analysis request
pub fn global_schema() -> ParameterSchema {
    ParameterSchema::new()
        .with(
            ParamSpec::string(PARAM_INPUT)
                .required()
                .with_aliases(["input"]),
        )
        .with(ParamSpec::string(PARAM_ALGORITHM).with_aliases(["algorithm", "a"]))
        .with(ParamSpec::flag(PARAM_IN_HEADERS).with_aliases(["headers"]))
}
