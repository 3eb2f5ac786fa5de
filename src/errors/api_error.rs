//! Structured API error object
//!
//! The single error shape emitted by every endpoint: a taxonomy status code
//! (400/404/500-equivalent), a human-readable message and, where applicable,
//! the offending parameter or plugin. Serialized as a JSON document with
//! `@type: "error"` so clients can distinguish it from a result envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::plugin::isolation::PluginError;
use crate::plugin::params::ParamError;
use crate::plugin::registry::RegistryError;

/// Convenience result alias for handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// The gateway error taxonomy
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required parameter (global or plugin-declared) is absent
    #[error("Missing or invalid parameters")]
    MissingParameter(String),

    /// A supplied value failed type/shape validation
    #[error("Missing or invalid parameters")]
    InvalidParameter {
        /// Canonical parameter name
        name: String,
        /// The rejected value
        value: String,
    },

    /// The requested `algo` does not exist or is not activated
    #[error("Plugin not found: {0}")]
    UnknownPlugin(String),

    /// No `algo` given and no usable default
    #[error("No default plugin available")]
    NoDefaultAvailable,

    /// A lifecycle transition was requested from an illegal state
    #[error("{0}")]
    InvalidTransition(String),

    /// A plugin name collision during registration
    #[error("{0}")]
    Conflict(String),

    /// An activation transition ended in `Failed`
    #[error("Activation of plugin '{plugin}' failed")]
    ActivationFailure {
        /// Plugin name
        plugin: String,
        /// Failure reason reported by the plugin
        reason: String,
    },

    /// The plugin raised during analysis
    #[error("Plugin '{plugin}' failed during analysis")]
    ExecutionFailure {
        /// Plugin name
        plugin: String,
        /// Failure reason (error message or panic payload)
        reason: String,
    },
}

impl ApiError {
    /// The taxonomy status code
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingParameter(_)
            | ApiError::InvalidParameter { .. }
            | ApiError::NoDefaultAvailable
            | ApiError::InvalidTransition(_) => StatusCode::BAD_REQUEST,
            ApiError::UnknownPlugin(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ActivationFailure { .. } | ApiError::ExecutionFailure { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The serialized error object
    pub fn to_document(&self) -> Value {
        let mut fields = serde_json::Map::new();
        fields.insert("@type".to_string(), json!("error"));
        fields.insert("status".to_string(), json!(self.status().as_u16()));
        fields.insert("message".to_string(), json!(self.to_string()));
        match self {
            ApiError::MissingParameter(name) => {
                fields.insert("parameter".to_string(), json!(name));
            }
            ApiError::InvalidParameter { name, value } => {
                fields.insert("parameter".to_string(), json!(name));
                fields.insert("value".to_string(), json!(value));
            }
            ApiError::UnknownPlugin(plugin) => {
                fields.insert("plugin".to_string(), json!(plugin));
            }
            ApiError::ActivationFailure { plugin, reason }
            | ApiError::ExecutionFailure { plugin, reason } => {
                fields.insert("plugin".to_string(), json!(plugin));
                fields.insert("reason".to_string(), json!(reason));
            }
            _ => {}
        }
        Value::Object(fields)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.to_document())).into_response()
    }
}

impl From<ParamError> for ApiError {
    fn from(err: ParamError) -> Self {
        match err {
            ParamError::Missing(name) => ApiError::MissingParameter(name),
            ParamError::Invalid { name, value } => ApiError::InvalidParameter { name, value },
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(name) => ApiError::UnknownPlugin(name),
            RegistryError::NoDefaultAvailable => ApiError::NoDefaultAvailable,
            RegistryError::NotActivated(_) | RegistryError::InvalidTransition { .. } => {
                ApiError::InvalidTransition(err.to_string())
            }
            RegistryError::DuplicateName(_) => ApiError::Conflict(err.to_string()),
            RegistryError::ActivationFailed { plugin, reason }
            | RegistryError::DeactivationFailed { plugin, reason } => {
                ApiError::ActivationFailure { plugin, reason }
            }
        }
    }
}

impl ApiError {
    /// Shape a plugin failure raised during analysis
    pub fn execution(plugin: impl Into<String>, err: &PluginError) -> Self {
        ApiError::ExecutionFailure {
            plugin: plugin.into(),
            reason: err.to_string(),
        }
    }
}
