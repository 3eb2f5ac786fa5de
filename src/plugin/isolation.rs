//! Plugin Isolation and Panic Safety
//!
//! This module provides panic isolation for plugin calls using
//! `catch_unwind`. A panic inside a plugin's `analyse` is caught and
//! converted to an error, so a misbehaving plugin can never crash the
//! gateway or leave the caller with an unstructured failure.
//!
//! # Safety Considerations
//!
//! - `catch_unwind` only catches panics, not aborts
//! - The binary must not be compiled with `panic = "abort"` in dev profiles
//!   used for plugin work

use std::any::Any;
use std::panic::{catch_unwind, UnwindSafe};

/// Plugin-specific error type
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// Plugin panicked during execution
    #[error("Plugin panicked: {0}")]
    Panic(String),

    /// Plugin activation hook failed
    #[error("Plugin activation failed: {0}")]
    ActivationFailed(String),

    /// Plugin deactivation hook failed
    #[error("Plugin deactivation failed: {0}")]
    DeactivationFailed(String),

    /// Plugin analysis failed
    #[error("Plugin execution failed: {0}")]
    ExecutionFailed(String),

    /// Plugin rejected its configuration or parameters
    #[error("Plugin configuration error: {0}")]
    ConfigurationError(String),
}

/// Safely call a plugin function with panic catching
///
/// Wraps the call in `catch_unwind`; a panic is converted to
/// [`PluginError::Panic`], a plugin error is passed through unchanged.
pub fn call_plugin_safely<F, T>(plugin_fn: F) -> Result<T, PluginError>
where
    F: FnOnce() -> Result<T, PluginError> + UnwindSafe,
{
    match catch_unwind(plugin_fn) {
        Ok(result) => result,
        Err(panic_info) => {
            let msg = extract_panic_message(&panic_info);
            tracing::error!(message = %msg, "Plugin panicked");
            Err(PluginError::Panic(msg))
        }
    }
}

/// Extract a human-readable message from a panic payload
fn extract_panic_message(panic_info: &Box<dyn Any + Send>) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
