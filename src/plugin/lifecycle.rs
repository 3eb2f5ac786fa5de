//! Plugin Lifecycle Management
//!
//! This module defines the plugin lifecycle states and the legal transitions
//! between them. Plugins go through a defined lifecycle from registration to
//! deactivation.
//!
//! # Lifecycle State Machine
//!
//! ```text
//!     +-----------+
//!     |  Created  |  (register())
//!     +-----+-----+
//!           |
//!           v
//!     +-----+------+
//!     | Activating |  (activate() called)
//!     +-----+------+
//!           |
//!     +-----+-----+
//!     |           |
//!     v           v
//! +---+-------+ +-+------+
//! | Activated | | Failed |
//! +---+-------+ +--------+
//!     |
//!     v
//! +---+----------+
//! | Deactivating |  (deactivate() called)
//! +---+----------+
//!     |
//!     v
//! +---+---------+
//! | Deactivated |  (activate() may run again from here)
//! +-------------+
//! ```
//!
//! A `Failed` plugin may be re-activated; the registry never retries on its
//! own, re-activation is always an explicit caller decision.

/// Plugin lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    /// Plugin has been registered but never activated
    Created,

    /// Plugin activation is in flight
    Activating,

    /// Plugin is active and eligible as a dispatch target
    Activated,

    /// Plugin deactivation is in flight
    Deactivating,

    /// Plugin has been deactivated
    Deactivated,

    /// Plugin activation failed
    Failed,
}

impl std::fmt::Display for PluginState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PluginState::Created => write!(f, "created"),
            PluginState::Activating => write!(f, "activating"),
            PluginState::Activated => write!(f, "activated"),
            PluginState::Deactivating => write!(f, "deactivating"),
            PluginState::Deactivated => write!(f, "deactivated"),
            PluginState::Failed => write!(f, "failed"),
        }
    }
}

impl PluginState {
    /// Check if the plugin can serve analysis requests
    pub fn is_active(&self) -> bool {
        matches!(self, PluginState::Activated)
    }

    /// Check if an activation may start from this state
    pub fn can_activate(&self) -> bool {
        matches!(
            self,
            PluginState::Created | PluginState::Deactivated | PluginState::Failed
        )
    }

    /// Check if a deactivation may start from this state
    pub fn can_deactivate(&self) -> bool {
        matches!(self, PluginState::Activated)
    }

    /// Check if a transition is currently in flight
    pub fn is_transitioning(&self) -> bool {
        matches!(self, PluginState::Activating | PluginState::Deactivating)
    }
}

/// Bookkeeping attached to every registered plugin
///
/// Tracks the current lifecycle state plus simple usage counters exposed by
/// the detail endpoint. The registry guards this behind a lock; the struct
/// itself is plain data.
#[derive(Debug)]
pub struct PluginStatus {
    /// Current plugin state
    pub state: PluginState,

    /// Incremented on every state transition. The registry compares
    /// generations to tell "a transition completed while I waited for the
    /// lock" apart from "nothing happened", so an overlapping caller
    /// observes the other caller's outcome instead of re-running the hook.
    pub generation: u64,

    /// Number of analysis calls served
    pub call_count: u64,

    /// Number of errors encountered (activation or analysis)
    pub error_count: u64,

    /// Last error message (if any)
    pub last_error: Option<String>,
}

impl PluginStatus {
    /// Create bookkeeping for a freshly registered plugin
    pub fn new() -> Self {
        Self {
            state: PluginState::Created,
            generation: 0,
            call_count: 0,
            error_count: 0,
            last_error: None,
        }
    }

    /// Record a successful analysis call
    pub fn record_success(&mut self) {
        self.call_count += 1;
    }

    /// Record an error
    pub fn record_error(&mut self, error: impl Into<String>) {
        self.error_count += 1;
        self.last_error = Some(error.into());
    }

    /// Transition to a new state
    pub fn transition(&mut self, new_state: PluginState) {
        tracing::debug!(
            from = %self.state,
            to = %new_state,
            "Plugin state transition"
        );
        self.state = new_state;
        self.generation += 1;
    }
}

impl Default for PluginStatus {
    fn default() -> Self {
        Self::new()
    }
}
