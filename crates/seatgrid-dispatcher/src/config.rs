//! Dispatcher configuration, read from the `[proxy]` TOML tables.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The `[proxy]` configuration surface consumed by this crate's users.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ProxyConfig {
    /// Whether sessions are rebuilt from surviving containers at startup.
    pub persist_sessions: bool,
    pub sharing: SharingConfig,
}

impl ProxyConfig {
    /// Read the `[proxy]` table from a TOML config file. Missing sections
    /// fall back to defaults.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.proxy)
    }
}

/// Tunables of the dispatcher's wait loop and pending-claim table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SharingConfig {
    /// Length of one wait attempt, in seconds.
    pub wait_unit_seconds: u64,
    /// Number of wait attempts before a start fails.
    pub max_attempts: u32,
    /// Write-TTL of pending-claim entries, in seconds.
    #[serde(rename = "pending-ttl")]
    pub pending_ttl_seconds: u64,
}

impl Default for SharingConfig {
    fn default() -> Self {
        Self {
            wait_unit_seconds: 3,
            max_attempts: 600,
            pending_ttl_seconds: 600,
        }
    }
}

impl SharingConfig {
    pub fn wait_unit(&self) -> Duration {
        Duration::from_secs(self.wait_unit_seconds)
    }

    pub fn pending_ttl(&self) -> Duration {
        Duration::from_secs(self.pending_ttl_seconds)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    proxy: ProxyConfig,
}
