//! Retention delay configuration.
//!
//! Each policy names the config keys holding its delete and anonymize delays;
//! this module is the lookup those keys resolve against. A missing key
//! resolves to 0, which disables the corresponding pass.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Retention thresholds and selection scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Tenant/entity scope substituted for `__ENTITY__` in selection
    /// templates.
    #[serde(default = "default_entity")]
    pub entity: i64,

    /// Delay in months per config key. Keys a policy references but that are
    /// absent here resolve to 0 (action disabled).
    #[serde(default)]
    pub delays: HashMap<String, i64>,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            entity: default_entity(),
            delays: HashMap::new(),
        }
    }
}

impl RetentionConfig {
    /// Resolve a delay key to months; 0 when unset.
    pub fn months(&self, key: &str) -> i64 {
        self.delays.get(key).copied().unwrap_or(0)
    }
}

fn default_entity() -> i64 {
    1
}
