//! Plugin Registry
//!
//! The central owner of all known analysis plugins and their lifecycle
//! state. The registry is the only shared mutable resource in the gateway
//! and is safe for concurrent use: plugin lookup uses DashMap, per-plugin
//! metadata sits behind short-lived RwLocks, and activation/deactivation of
//! a given plugin is serialized through a per-plugin async mutex so two
//! overlapping transitions of the same name can never race into an
//! inconsistent state. Transitions of different plugins never block each
//! other.
//!
//! Reads (`get`, `list`, `resolve_default`) return consistent snapshots and
//! never wait on an in-flight transition of an unrelated plugin.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;

use super::analysis::AnalysisPlugin;
use super::lifecycle::{PluginState, PluginStatus};

/// Errors produced by registry operations
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No plugin registered under this name
    #[error("Plugin not found: {0}")]
    NotFound(String),

    /// A plugin with this name is already registered
    #[error("A plugin named '{0}' is already registered")]
    DuplicateName(String),

    /// The requested transition is not legal from the current state
    #[error("Plugin '{plugin}' cannot {action} from state '{state}'")]
    InvalidTransition {
        /// Plugin name
        plugin: String,
        /// The attempted operation (`activate` or `deactivate`)
        action: &'static str,
        /// The state the plugin was in
        state: PluginState,
    },

    /// The activation hook returned an error; the plugin is now `Failed`
    #[error("Activation of plugin '{plugin}' failed: {reason}")]
    ActivationFailed {
        /// Plugin name
        plugin: String,
        /// Failure reason reported by the plugin
        reason: String,
    },

    /// The deactivation hook returned an error; the plugin is now `Failed`
    #[error("Deactivation of plugin '{plugin}' failed: {reason}")]
    DeactivationFailed {
        /// Plugin name
        plugin: String,
        /// Failure reason reported by the plugin
        reason: String,
    },

    /// Only `Activated` plugins can be made the default
    #[error("Plugin '{0}' must be activated before it can be made the default")]
    NotActivated(String),

    /// No `algo` was given and no usable default exists
    #[error("No default plugin available")]
    NoDefaultAvailable,
}

/// A registered plugin together with its guarded runtime state
struct PluginSlot {
    /// The plugin itself
    plugin: Arc<dyn AnalysisPlugin>,

    /// Lifecycle state and usage counters
    status: RwLock<PluginStatus>,

    /// Serializes activation/deactivation of this plugin. Held across the
    /// lifecycle hook await, never while serving reads.
    transition: tokio::sync::Mutex<()>,
}

/// A consistent point-in-time view of one registered plugin
///
/// Reads never expose a plugin in a partial state: all snapshot fields are
/// taken under a single lock acquisition.
#[derive(Clone)]
pub struct PluginHandle {
    /// The plugin itself
    pub plugin: Arc<dyn AnalysisPlugin>,

    /// Lifecycle state at snapshot time
    pub state: PluginState,

    /// Whether this plugin is the registry-wide default
    pub is_default: bool,

    /// Number of analysis calls served
    pub call_count: u64,

    /// Number of errors encountered
    pub error_count: u64,

    /// Last error message (if any)
    pub last_error: Option<String>,
}

impl PluginHandle {
    /// Whether the plugin can serve requests right now
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }
}

/// The central plugin registry
///
/// All mutation goes through the documented operations; the internal maps
/// are never exposed.
pub struct PluginRegistry {
    /// Plugins indexed by name
    slots: DashMap<String, Arc<PluginSlot>>,

    /// Registration order, used for stable listing
    order: RwLock<Vec<String>>,

    /// Name of the default plugin, if one has been set
    default_name: RwLock<Option<String>>,
}

impl PluginRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
            order: RwLock::new(Vec::new()),
            default_name: RwLock::new(None),
        }
    }

    /// Register a plugin in state `Created`
    ///
    /// Fails with [`RegistryError::DuplicateName`] if the name is taken.
    pub fn register(&self, plugin: Arc<dyn AnalysisPlugin>) -> Result<(), RegistryError> {
        let name = plugin.name().to_string();
        match self.slots.entry(name.clone()) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateName(name)),
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(PluginSlot {
                    plugin: plugin.clone(),
                    status: RwLock::new(PluginStatus::new()),
                    transition: tokio::sync::Mutex::new(()),
                }));
                self.order.write().push(name.clone());
                tracing::debug!(
                    plugin = %name,
                    version = %plugin.version(),
                    "Registered plugin"
                );
                Ok(())
            }
        }
    }

    fn slot(&self, name: &str) -> Result<Arc<PluginSlot>, RegistryError> {
        self.slots
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    fn snapshot(&self, slot: &PluginSlot, default_name: Option<&str>) -> PluginHandle {
        let status = slot.status.read();
        PluginHandle {
            plugin: slot.plugin.clone(),
            state: status.state,
            is_default: default_name == Some(slot.plugin.name()),
            call_count: status.call_count,
            error_count: status.error_count,
            last_error: status.last_error.clone(),
        }
    }

    /// Get a snapshot of the named plugin
    pub fn get(&self, name: &str) -> Result<PluginHandle, RegistryError> {
        let slot = self.slot(name)?;
        let default_name = self.default_name.read().clone();
        Ok(self.snapshot(&slot, default_name.as_deref()))
    }

    /// List all plugins in registration order
    ///
    /// Snapshot semantics: the returned sequence reflects the registry at
    /// one point in time and is unaffected by concurrent mutation.
    pub fn list(&self) -> Vec<PluginHandle> {
        let order = self.order.read().clone();
        let default_name = self.default_name.read().clone();
        order
            .iter()
            .filter_map(|name| self.slots.get(name).map(|entry| entry.value().clone()))
            .map(|slot| self.snapshot(&slot, default_name.as_deref()))
            .collect()
    }

    /// Make the named plugin the registry-wide default
    ///
    /// Fails unless the plugin exists and is currently `Activated`.
    pub fn set_default(&self, name: &str) -> Result<(), RegistryError> {
        let slot = self.slot(name)?;
        if !slot.status.read().state.is_active() {
            return Err(RegistryError::NotActivated(name.to_string()));
        }
        *self.default_name.write() = Some(name.to_string());
        tracing::info!(plugin = %name, "Default plugin set");
        Ok(())
    }

    /// Resolve the default plugin
    ///
    /// Fails closed: if the configured default has been deactivated (or has
    /// failed) this returns [`RegistryError::NoDefaultAvailable`] rather
    /// than falling back to an arbitrary plugin.
    pub fn resolve_default(&self) -> Result<PluginHandle, RegistryError> {
        let default_name = self.default_name.read().clone();
        let name = default_name.ok_or(RegistryError::NoDefaultAvailable)?;
        let handle = self.get(&name)?;
        if !handle.is_active() {
            return Err(RegistryError::NoDefaultAvailable);
        }
        Ok(handle)
    }

    /// Name of the configured default plugin, if any (regardless of state)
    pub fn default_name(&self) -> Option<String> {
        self.default_name.read().clone()
    }

    /// Activate the named plugin
    ///
    /// With `sync` true, suspends the caller until the plugin reaches
    /// `Activated` or `Failed` and reports the outcome. With `sync` false,
    /// the transition runs in a background task and the call returns
    /// immediately; the eventual outcome is observable via [`Self::get`].
    ///
    /// Activation of the same plugin is mutually exclusive: a concurrent
    /// call observes the in-flight transition instead of duplicating it.
    pub async fn activate(&self, name: &str, sync: bool) -> Result<PluginState, RegistryError> {
        let slot = self.slot(name)?;
        if sync {
            Self::run_activation(slot).await
        } else {
            self.spawn_transition(slot, "activate")
        }
    }

    /// Deactivate the named plugin, symmetric to [`Self::activate`]
    pub async fn deactivate(&self, name: &str, sync: bool) -> Result<PluginState, RegistryError> {
        let slot = self.slot(name)?;
        if sync {
            Self::run_deactivation(slot).await
        } else {
            self.spawn_transition(slot, "deactivate")
        }
    }

    /// Schedule a background transition, unless one is already in flight
    fn spawn_transition(
        &self,
        slot: Arc<PluginSlot>,
        action: &'static str,
    ) -> Result<PluginState, RegistryError> {
        {
            let status = slot.status.read();
            // An in-flight transition is observed, not duplicated.
            if status.state.is_transitioning() {
                return Ok(status.state);
            }
            let legal = match action {
                "activate" => status.state.can_activate(),
                _ => status.state.can_deactivate(),
            };
            if !legal {
                return Err(RegistryError::InvalidTransition {
                    plugin: slot.plugin.name().to_string(),
                    action,
                    state: status.state,
                });
            }
        }
        let name = slot.plugin.name().to_string();
        let returned = if action == "activate" {
            PluginState::Activating
        } else {
            PluginState::Deactivating
        };
        tokio::spawn(async move {
            let outcome = if action == "activate" {
                Self::run_activation(slot).await
            } else {
                Self::run_deactivation(slot).await
            };
            if let Err(e) = outcome {
                tracing::warn!(plugin = %name, error = %e, "Background transition failed");
            }
        });
        Ok(returned)
    }

    /// Run an activation to completion, serialized per plugin
    async fn run_activation(slot: Arc<PluginSlot>) -> Result<PluginState, RegistryError> {
        let name = slot.plugin.name().to_string();
        // Generation at arrival. A changed generation after acquiring the
        // transition lock means another caller's transition completed while
        // we waited; we report its outcome instead of re-running the hook.
        let entry_generation = slot.status.read().generation;

        let _guard = slot.transition.lock().await;

        {
            let mut status = slot.status.write();
            match status.state {
                PluginState::Activated => return Ok(PluginState::Activated),
                PluginState::Failed if status.generation != entry_generation => {
                    let reason = status
                        .last_error
                        .clone()
                        .unwrap_or_else(|| "unknown activation failure".to_string());
                    return Err(RegistryError::ActivationFailed {
                        plugin: name,
                        reason,
                    });
                }
                state if !state.can_activate() => {
                    return Err(RegistryError::InvalidTransition {
                        plugin: name,
                        action: "activate",
                        state,
                    });
                }
                _ => status.transition(PluginState::Activating),
            }
        }

        match slot.plugin.activate().await {
            Ok(()) => {
                slot.status.write().transition(PluginState::Activated);
                tracing::info!(plugin = %name, "Plugin activated");
                Ok(PluginState::Activated)
            }
            Err(e) => {
                let reason = e.to_string();
                {
                    let mut status = slot.status.write();
                    status.record_error(&reason);
                    status.transition(PluginState::Failed);
                }
                tracing::warn!(plugin = %name, error = %reason, "Plugin activation failed");
                Err(RegistryError::ActivationFailed {
                    plugin: name,
                    reason,
                })
            }
        }
    }

    /// Run a deactivation to completion, serialized per plugin
    async fn run_deactivation(slot: Arc<PluginSlot>) -> Result<PluginState, RegistryError> {
        let name = slot.plugin.name().to_string();
        let entry_generation = slot.status.read().generation;

        let _guard = slot.transition.lock().await;

        {
            let mut status = slot.status.write();
            match status.state {
                PluginState::Deactivated => return Ok(PluginState::Deactivated),
                PluginState::Failed if status.generation != entry_generation => {
                    let reason = status
                        .last_error
                        .clone()
                        .unwrap_or_else(|| "unknown deactivation failure".to_string());
                    return Err(RegistryError::DeactivationFailed {
                        plugin: name,
                        reason,
                    });
                }
                state if !state.can_deactivate() => {
                    return Err(RegistryError::InvalidTransition {
                        plugin: name,
                        action: "deactivate",
                        state,
                    });
                }
                _ => status.transition(PluginState::Deactivating),
            }
        }

        match slot.plugin.deactivate().await {
            Ok(()) => {
                slot.status.write().transition(PluginState::Deactivated);
                tracing::info!(plugin = %name, "Plugin deactivated");
                Ok(PluginState::Deactivated)
            }
            Err(e) => {
                let reason = e.to_string();
                {
                    let mut status = slot.status.write();
                    status.record_error(&reason);
                    status.transition(PluginState::Failed);
                }
                tracing::warn!(plugin = %name, error = %reason, "Plugin deactivation failed");
                Err(RegistryError::DeactivationFailed {
                    plugin: name,
                    reason,
                })
            }
        }
    }

    /// Record a successful analysis call for the named plugin
    pub fn record_success(&self, name: &str) {
        if let Some(slot) = self.slots.get(name) {
            slot.status.write().record_success();
        }
    }

    /// Record a failed analysis call for the named plugin
    pub fn record_error(&self, name: &str, error: impl Into<String>) {
        if let Some(slot) = self.slots.get(name) {
            slot.status.write().record_error(error);
        }
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::plugin::analysis::Entry;
    use crate::plugin::isolation::PluginError;
    use crate::plugin::params::ResolvedParams;

    /// Test plugin with configurable activation behavior
    struct TestPlugin {
        name: &'static str,
        fail_activation: bool,
        activation_delay: Duration,
        activations: AtomicU64,
    }

    impl TestPlugin {
        fn named(name: &'static str) -> Self {
            Self {
                name,
                fail_activation: false,
                activation_delay: Duration::ZERO,
                activations: AtomicU64::new(0),
            }
        }

        fn failing(name: &'static str) -> Self {
            Self {
                fail_activation: true,
                ..Self::named(name)
            }
        }

        fn slow(name: &'static str, delay: Duration) -> Self {
            Self {
                activation_delay: delay,
                ..Self::named(name)
            }
        }
    }

    #[async_trait]
    impl AnalysisPlugin for TestPlugin {
        fn name(&self) -> &str {
            self.name
        }

        fn version(&self) -> &str {
            "0.1"
        }

        async fn activate(&self) -> Result<(), PluginError> {
            if !self.activation_delay.is_zero() {
                tokio::time::sleep(self.activation_delay).await;
            }
            self.activations.fetch_add(1, Ordering::SeqCst);
            if self.fail_activation {
                Err(PluginError::ActivationFailed("test failure".to_string()))
            } else {
                Ok(())
            }
        }

        fn analyse(
            &self,
            input: &str,
            _params: &ResolvedParams,
        ) -> Result<Vec<Entry>, PluginError> {
            Ok(vec![Entry::new(input)])
        }
    }

    fn registry_with(plugin: TestPlugin) -> PluginRegistry {
        let registry = PluginRegistry::new();
        registry.register(Arc::new(plugin)).unwrap();
        registry
    }

    #[test]
    fn test_register_duplicate_name() {
        let registry = registry_with(TestPlugin::named("dup"));
        let err = registry
            .register(Arc::new(TestPlugin::named("dup")))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName(name) if name == "dup"));
    }

    #[test]
    fn test_get_unknown_plugin() {
        let registry = PluginRegistry::new();
        assert!(matches!(
            registry.get("missing"),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_sync_activation() {
        let registry = registry_with(TestPlugin::named("p"));
        assert_eq!(registry.get("p").unwrap().state, PluginState::Created);

        let state = registry.activate("p", true).await.unwrap();
        assert_eq!(state, PluginState::Activated);
        assert!(registry.get("p").unwrap().is_active());
    }

    #[tokio::test]
    async fn test_sync_activation_failure() {
        let registry = registry_with(TestPlugin::failing("bad"));
        let err = registry.activate("bad", true).await.unwrap_err();
        assert!(matches!(err, RegistryError::ActivationFailed { .. }));
        assert_eq!(registry.get("bad").unwrap().state, PluginState::Failed);
    }

    #[tokio::test]
    async fn test_async_activation_eventually_activates() {
        let registry = registry_with(TestPlugin::slow("slow", Duration::from_millis(20)));
        let state = registry.activate("slow", false).await.unwrap();
        assert_eq!(state, PluginState::Activating);

        // Poll until the background transition finishes.
        for _ in 0..50 {
            if registry.get("slow").unwrap().is_active() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("plugin never reached Activated");
    }

    #[tokio::test]
    async fn test_concurrent_sync_activation_single_outcome() {
        let plugin = Arc::new(TestPlugin::slow("shared", Duration::from_millis(20)));
        let registry = Arc::new(PluginRegistry::new());
        registry.register(plugin.clone()).unwrap();

        let a = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.activate("shared", true).await })
        };
        let b = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.activate("shared", true).await })
        };

        let state_a = a.await.unwrap().unwrap();
        let state_b = b.await.unwrap().unwrap();

        // Both callers observe the same terminal state and the activation
        // hook ran exactly once despite two callers.
        assert_eq!(state_a, PluginState::Activated);
        assert_eq!(state_b, PluginState::Activated);
        assert_eq!(plugin.activations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_sync_activation_failure_single_outcome() {
        let plugin = Arc::new(TestPlugin {
            fail_activation: true,
            ..TestPlugin::slow("flaky", Duration::from_millis(20))
        });
        let registry = Arc::new(PluginRegistry::new());
        registry.register(plugin.clone()).unwrap();

        let a = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.activate("flaky", true).await })
        };
        let b = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.activate("flaky", true).await })
        };

        let result_a = a.await.unwrap();
        let result_b = b.await.unwrap();

        // The failing hook ran exactly once; whichever caller lost the race
        // observes the winner's failure instead of re-running the hook, so
        // both see the same outcome.
        assert!(matches!(
            result_a,
            Err(RegistryError::ActivationFailed { .. })
        ));
        assert!(matches!(
            result_b,
            Err(RegistryError::ActivationFailed { .. })
        ));
        assert_eq!(plugin.activations.load(Ordering::SeqCst), 1);
        assert_eq!(registry.get("flaky").unwrap().state, PluginState::Failed);
    }

    #[tokio::test]
    async fn test_failed_plugin_can_be_reactivated_after_settling() {
        let registry = registry_with(TestPlugin::failing("bad"));
        let err = registry.activate("bad", true).await.unwrap_err();
        assert!(matches!(err, RegistryError::ActivationFailed { .. }));

        // A fresh request arriving after the failure settled is an explicit
        // re-activation, not an observation of the old attempt.
        let err = registry.activate("bad", true).await.unwrap_err();
        assert!(matches!(err, RegistryError::ActivationFailed { .. }));
        assert_eq!(registry.get("bad").unwrap().error_count, 2);
    }

    #[tokio::test]
    async fn test_async_activation_not_duplicated() {
        let registry = registry_with(TestPlugin::slow("slow", Duration::from_millis(30)));
        let first = registry.activate("slow", false).await.unwrap();
        assert_eq!(first, PluginState::Activating);

        // Second asynchronous request observes the in-flight transition.
        let second = registry.activate("slow", false).await.unwrap();
        assert_eq!(second, PluginState::Activating);
    }

    #[tokio::test]
    async fn test_deactivate_and_reactivate() {
        let registry = registry_with(TestPlugin::named("p"));
        registry.activate("p", true).await.unwrap();

        let state = registry.deactivate("p", true).await.unwrap();
        assert_eq!(state, PluginState::Deactivated);

        // Deactivated plugins can be activated again.
        let state = registry.activate("p", true).await.unwrap();
        assert_eq!(state, PluginState::Activated);
    }

    #[tokio::test]
    async fn test_deactivate_from_created_is_invalid() {
        let registry = registry_with(TestPlugin::named("p"));
        let err = registry.deactivate("p", true).await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_set_default_requires_activated() {
        let registry = registry_with(TestPlugin::named("p"));
        assert!(matches!(
            registry.set_default("p"),
            Err(RegistryError::NotActivated(_))
        ));

        registry.activate("p", true).await.unwrap();
        registry.set_default("p").unwrap();
        assert_eq!(registry.resolve_default().unwrap().plugin.name(), "p");
    }

    #[tokio::test]
    async fn test_default_fails_closed_after_deactivation() {
        let registry = PluginRegistry::new();
        registry.register(Arc::new(TestPlugin::named("a"))).unwrap();
        registry.register(Arc::new(TestPlugin::named("b"))).unwrap();
        registry.activate("a", true).await.unwrap();
        registry.activate("b", true).await.unwrap();
        registry.set_default("a").unwrap();

        registry.deactivate("a", true).await.unwrap();

        // Never silently falls back to "b".
        assert!(matches!(
            registry.resolve_default(),
            Err(RegistryError::NoDefaultAvailable)
        ));
    }

    #[tokio::test]
    async fn test_list_registration_order() {
        let registry = PluginRegistry::new();
        for name in ["one", "two", "three"] {
            registry.register(Arc::new(TestPlugin::named(name))).unwrap();
        }
        let names: Vec<_> = registry
            .list()
            .iter()
            .map(|h| h.plugin.name().to_string())
            .collect();
        assert_eq!(names, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_reads_do_not_block_on_unrelated_activation() {
        let registry = Arc::new(PluginRegistry::new());
        registry
            .register(Arc::new(TestPlugin::slow("slow", Duration::from_millis(50))))
            .unwrap();
        registry.register(Arc::new(TestPlugin::named("fast"))).unwrap();

        registry.activate("slow", false).await.unwrap();

        // While "slow" is activating, reads and transitions of "fast"
        // proceed immediately.
        let state = tokio::time::timeout(
            Duration::from_millis(20),
            registry.activate("fast", true),
        )
        .await
        .expect("unrelated activation blocked")
        .unwrap();
        assert_eq!(state, PluginState::Activated);
        assert_eq!(registry.get("slow").unwrap().state, PluginState::Activating);
    }
}
