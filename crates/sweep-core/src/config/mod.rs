//! Configuration types for the sweep retention engine.
//!
//! Configuration is loaded from a single YAML file (conventionally
//! `sweep.yaml`) into [`SweepConfig`]. It carries the upstream database
//! connection, the per-policy retention delays, and the optional feature
//! areas that gate parts of the policy catalog.
//!
//! # Example
//!
//! ```yaml
//! upstream:
//!   database_url_env: DATABASE_URL
//! actor: "system:sweep"
//! features:
//!   members: true
//! retention:
//!   entity: 1
//!   delays:
//!     third_party_customer_anonymize: 36
//!     contact_delete: 60
//! ```

pub mod features;
pub mod retention;
pub mod upstream;

pub use features::FeaturesConfig;
pub use retention::RetentionConfig;
pub use upstream::UpstreamConfig;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid YAML for [`SweepConfig`].
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Complete sweep configuration loaded from a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Project name, for logs and reports only.
    #[serde(default)]
    pub project: Option<String>,

    /// Upstream Postgres connection.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Actor recorded on every mutation performed by a run.
    #[serde(default = "default_actor")]
    pub actor: String,

    /// Feature areas gating optional policy catalog entries.
    #[serde(default)]
    pub features: FeaturesConfig,

    /// Retention delays and selection scope.
    #[serde(default)]
    pub retention: RetentionConfig,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            project: None,
            upstream: UpstreamConfig::default(),
            actor: default_actor(),
            features: FeaturesConfig::default(),
            retention: RetentionConfig::default(),
        }
    }
}

impl SweepConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

fn default_actor() -> String {
    "system:sweep".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_parses_with_defaults() {
        let cfg: SweepConfig = serde_yaml::from_str("{}").expect("empty config must parse");
        assert_eq!(cfg.actor, "system:sweep");
        assert_eq!(cfg.retention.entity, 1);
        assert!(!cfg.features.members);
        assert_eq!(cfg.retention.months("third_party_customer_delete"), 0);
    }

    #[test]
    fn delays_resolve_by_key() {
        let cfg: SweepConfig = serde_yaml::from_str(
            r#"
            retention:
              entity: 2
              delays:
                contact_delete: 60
                contact_anonymize: 24
            "#,
        )
        .expect("config must parse");
        assert_eq!(cfg.retention.entity, 2);
        assert_eq!(cfg.retention.months("contact_delete"), 60);
        assert_eq!(cfg.retention.months("contact_anonymize"), 24);
        assert_eq!(cfg.retention.months("unknown_key"), 0);
    }
}
