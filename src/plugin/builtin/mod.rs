//! Built-in Analysis Plugins
//!
//! Two deliberately small plugins ship with the gateway so a fresh install
//! can serve requests out of the box:
//!
//! - `wordcount` - token statistics, no required parameters, the default
//!   plugin unless configured otherwise
//! - `pattern` - regex matching, requires a `pattern` parameter with no
//!   default

pub mod pattern;
pub mod wordcount;

use std::sync::Arc;

pub use pattern::PatternPlugin;
pub use wordcount::WordCountPlugin;

use super::registry::{PluginRegistry, RegistryError};

/// Register all built-in plugins with the registry
///
/// Plugins are registered in `Created` state; activation is a separate,
/// explicit step driven by startup configuration.
pub fn register_builtins(registry: &PluginRegistry) -> Result<(), RegistryError> {
    registry.register(Arc::new(WordCountPlugin::new()))?;
    registry.register(Arc::new(PatternPlugin::new()))?;
    Ok(())
}
