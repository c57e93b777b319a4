//! Upstream database configuration.
//!
//! Two configuration methods are supported:
//! 1. `database_url_env` - reference an environment variable
//! 2. `database_url` - provide the URL directly

use serde::{Deserialize, Serialize};

/// Configuration for the upstream Postgres connection.
///
/// `database_url_env` takes precedence over `database_url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Environment variable name containing the PostgreSQL connection URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url_env: Option<String>,

    /// Full PostgreSQL connection URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,

    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            database_url_env: None,
            database_url: None,
            max_connections: default_max_connections(),
        }
    }
}

impl UpstreamConfig {
    /// Resolve the connection URL, preferring the environment variable.
    pub fn resolve_url(&self) -> Option<String> {
        if let Some(var) = &self.database_url_env {
            if let Ok(url) = std::env::var(var) {
                if !url.is_empty() {
                    return Some(url);
                }
            }
        }
        self.database_url.clone()
    }
}

fn default_max_connections() -> u32 {
    5
}
