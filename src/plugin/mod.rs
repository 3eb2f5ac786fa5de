//! Plugin System for Sema Gateway
//!
//! The core of the gateway: a registry of named, versioned analysis plugins
//! that can be activated and deactivated (synchronously or in the
//! background) while requests are concurrently served, a pure parameter
//! resolver merging caller arguments with declared schemas, and a
//! per-request dispatcher that packages plugin output into a
//! content-negotiated response envelope.
//!
//! # Architecture
//!
//! ```text
//! request -> dispatch -> (registry lookup, parameter resolution)
//!         -> AnalysisPlugin::analyse (panic-isolated)
//!         -> envelope builder -> response document
//! ```
//!
//! Plugins implement the [`AnalysisPlugin`] trait; conformance is checked
//! at registration, not at dispatch time. The registry is the only shared
//! mutable state and serializes lifecycle transitions per plugin.

pub mod analysis;
pub mod builtin;
pub mod dispatch;
pub mod envelope;
pub mod isolation;
pub mod lifecycle;
pub mod params;
pub mod registry;

// Re-exports for convenience
pub use analysis::{plugin_id, AnalysisPlugin, Entry};
pub use dispatch::dispatch;
pub use envelope::{build_detail, build_listing, build_results, CONTEXT_URI};
pub use isolation::{call_plugin_safely, PluginError};
pub use lifecycle::{PluginState, PluginStatus};
pub use params::{global_schema, parse_flag, ParamSpec, ParameterSchema, ResolvedParams};
pub use registry::{PluginHandle, PluginRegistry, RegistryError};
