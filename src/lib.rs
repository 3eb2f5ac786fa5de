pub mod config;
pub mod errors;
pub mod handlers;
pub mod plugin;
pub mod routes;
pub mod state;

// Re-export commonly used items for convenience
pub use config::ServerConfig;
pub use errors::{ApiError, ApiResult};
pub use plugin::{AnalysisPlugin, PluginRegistry, PluginState};
pub use state::AppState;
