//! Shared application state
//!
//! The state handed to every handler: the configuration and the plugin
//! registry. The registry is the only mutable part and carries its own
//! synchronization; the state itself is cheaply cloneable behind an `Arc`.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::plugin::builtin::register_builtins;
use crate::plugin::PluginRegistry;

/// Application state shared across all request handlers
pub struct AppState {
    /// Server configuration (read-only after startup)
    pub config: ServerConfig,

    /// The plugin registry
    pub registry: Arc<PluginRegistry>,
}

impl AppState {
    /// Create the application state and bring the registry to its startup
    /// configuration: built-ins registered, configured plugins activated
    /// synchronously, default plugin set.
    ///
    /// Activation failures are logged and skipped rather than aborting
    /// startup; the affected plugin stays `Failed` and can be re-activated
    /// through the API.
    pub async fn new(config: ServerConfig) -> Arc<Self> {
        let registry = Arc::new(PluginRegistry::new());

        if let Err(e) = register_builtins(&registry) {
            // Only reachable if a built-in name collides with itself.
            tracing::error!(error = %e, "Failed to register built-in plugins");
        }

        for name in &config.autoactivate {
            match registry.activate(name, true).await {
                Ok(state) => tracing::info!(plugin = %name, state = %state, "Startup activation"),
                Err(e) => tracing::warn!(plugin = %name, error = %e, "Startup activation failed"),
            }
        }

        if let Some(default) = &config.default_plugin {
            if let Err(e) = registry.set_default(default) {
                tracing::warn!(plugin = %default, error = %e, "Could not set default plugin");
            }
        }

        Arc::new(Self { config, registry })
    }
}
