//! Configuration for the information-model engine.
//!
//! Provides the per-address-space configuration and the process-wide
//! node id separator default used when synthesizing child identifiers.

use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

/// Separator used when no process-wide override is set.
pub const DEFAULT_NODE_ID_SEPARATOR: &str = "-";

static NODE_ID_SEPARATOR: RwLock<Option<String>> = RwLock::new(None);

/// Get the process-wide separator placed between a parent's string id and a
/// child's browse name when instantiating.
pub fn node_id_separator() -> String {
    NODE_ID_SEPARATOR
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .unwrap_or_else(|| DEFAULT_NODE_ID_SEPARATOR.to_string())
}

/// Set the process-wide separator.
///
/// Address spaces snapshot this value when they are created. Changing it while
/// another thread is creating an address space is unsafe in the sense that the
/// other thread may observe either value; pass an explicit separator through
/// `InstantiationConfig` or the instantiate options when that matters.
pub fn set_node_id_separator(separator: impl Into<String>) {
    *NODE_ID_SEPARATOR
        .write()
        .unwrap_or_else(PoisonError::into_inner) = Some(separator.into());
}

/// Restore the default process-wide separator.
pub fn reset_node_id_separator() {
    *NODE_ID_SEPARATOR
        .write()
        .unwrap_or_else(PoisonError::into_inner) = None;
}

/// Address-space configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ModelConfig {
    /// Instantiation configuration.
    pub instantiation: InstantiationConfig,
    /// Naming policy configuration.
    pub naming: NamingConfig,
    /// Traversal limits.
    pub limits: LimitsConfig,
}

impl ModelConfig {
    /// Parse a configuration from JSON. Missing sections take their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Set the instantiation separator.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.instantiation.separator = separator.into();
        self
    }

    /// Set the duplicate browse name policy.
    pub fn with_browse_name_policy(mut self, policy: BrowseNamePolicy) -> Self {
        self.naming.duplicate_browse_names = policy;
        self
    }

    /// Set the traversal limits.
    pub fn with_limits(mut self, limits: LimitsConfig) -> Self {
        self.limits = limits;
        self
    }
}

/// Instantiation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstantiationConfig {
    /// Separator between a parent's string id and a child's browse name.
    pub separator: String,
}

impl Default for InstantiationConfig {
    fn default() -> Self {
        Self {
            separator: node_id_separator(),
        }
    }
}

/// Naming policy configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NamingConfig {
    /// What to do when a hierarchical sibling already uses a browse name.
    pub duplicate_browse_names: BrowseNamePolicy,
}

/// Policy for duplicate browse names among hierarchical siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BrowseNamePolicy {
    /// Accept the duplicate and record a warning.
    #[default]
    Warn,
    /// Reject the reference that would introduce the duplicate.
    Reject,
}

/// Traversal limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum number of supertype hops before a chain is treated as cyclic.
    pub max_type_depth: usize,
    /// Maximum nesting depth of instance declarations during instantiation.
    pub max_instantiation_depth: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_type_depth: 64,
            max_instantiation_depth: 32,
        }
    }
}
