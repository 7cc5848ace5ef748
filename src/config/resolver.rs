//! Resolver Configuration
//!
//! Settings passed through to client address resolution.

use serde::Deserialize;

/// Client resolution configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Addresses handed to `resolve` as its whitelist.
    /// Accepted for forward compatibility; resolution does not consult it yet.
    pub whitelist: Vec<String>,
}

impl ResolverConfig {
    /// Whitelist argument for `resolve`, `None` when no entries are configured
    pub fn whitelist(&self) -> Option<&[String]> {
        if self.whitelist.is_empty() {
            None
        } else {
            Some(&self.whitelist)
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    /// Default: "info"
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
