//! `cloudcfg.toml` loading.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use anyhow::Context;
use cloudcfg_monitor::bus::DEFAULT_BUS_CAPACITY;
use cloudcfg_monitor::{MonitorConfig, RepositoryConfig};
use cloudcfg_vault::VaultConfig;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8888;

/// Top-level configuration file. Every section may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: HttpConfig,
    pub monitor: MonitorConfig,
    pub repository: RepositoryConfig,
    pub vault: Option<VaultConfig>,
}

impl ServerConfig {
    /// Read `path`, or fall back to defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

/// The webhook listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: SocketAddr,

    /// Mount point of the `/monitor` route.
    pub monitor_path_prefix: String,

    /// Origin stamped on refresh events; a random id when unset.
    pub context_id: Option<String>,

    pub bus_capacity: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            monitor_path_prefix: String::new(),
            context_id: None,
            bus_capacity: DEFAULT_BUS_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ServerConfig::parse("").unwrap();

        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.server.bind.to_string(), "127.0.0.1:8888");
        assert_eq!(config.monitor.fixed_delay(), Duration::from_secs(5));
        assert!(config.vault.is_none());
    }

    #[test]
    fn test_full_config() {
        let config = ServerConfig::parse(
            r#"
            [server]
            bind = "0.0.0.0:9000"
            monitor_path_prefix = "/config"
            context_id = "config-server:9000"

            [monitor]
            fixed_delay_ms = 250
            excludes = ["*.bak"]

            [repository.native]
            search_locations = ["file:./config", "file:./shared"]

            [vault]
            host = "https://vault.internal:8200"
            token = "s.abc"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.bind.port(), 9000);
        assert_eq!(config.server.monitor_path_prefix, "/config");
        assert_eq!(config.server.context_id.as_deref(), Some("config-server:9000"));
        assert_eq!(config.monitor.fixed_delay_ms, 250);
        assert_eq!(config.monitor.excludes, vec!["*.bak"]);
        assert_eq!(
            config.repository,
            RepositoryConfig::native(["file:./config", "file:./shared"])
        );

        let vault = config.vault.unwrap();
        assert_eq!(vault.token.as_deref(), Some("s.abc"));
        assert_eq!(vault.timeout_ms, 10_000);
    }

    #[test]
    fn test_git_repository() {
        let config = ServerConfig::parse(
            r#"
            [repository.git]
            uri = "file:///srv/config-repo"
            "#,
        )
        .unwrap();

        assert_eq!(config.repository, RepositoryConfig::git("file:///srv/config-repo"));
    }

    #[test]
    fn test_invalid_bind_is_rejected() {
        assert!(ServerConfig::parse("[server]\nbind = \"not an address\"").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let err = ServerConfig::load(Some(&temp_dir.path().join("missing.toml"))).unwrap_err();

        assert!(err.to_string().contains("failed to read config"));
    }
}
