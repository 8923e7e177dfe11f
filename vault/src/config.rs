//! Connection settings for the Vault server.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};

/// Environment variable consulted when no token is configured.
pub const VAULT_TOKEN_ENV: &str = "VAULT_TOKEN";

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Where Vault lives and how to authenticate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Base URL, e.g. `http://127.0.0.1:8200`.
    pub host: String,

    /// Token sent as `X-Vault-Token`.
    pub token: Option<String>,

    /// Per-request timeout.
    pub timeout_ms: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            host: "http://127.0.0.1:8200".to_string(),
            token: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl VaultConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Host without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.host.trim_end_matches('/')
    }

    /// The configured token, falling back to `VAULT_TOKEN`. Blank values
    /// count as missing.
    pub fn resolve_token(&self) -> Result<String> {
        self.token
            .clone()
            .filter(|token| !token.trim().is_empty())
            .or_else(|| std::env::var(VAULT_TOKEN_ENV).ok())
            .filter(|token| !token.trim().is_empty())
            .ok_or(VaultError::MissingToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = VaultConfig::default();
        assert_eq!(config.host, "http://127.0.0.1:8200");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(config.token.is_none());
    }

    #[test]
    fn test_partial_deserialize() {
        let config: VaultConfig =
            serde_json::from_str(r#"{"host": "https://vault.internal:8200/"}"#).unwrap();

        assert_eq!(config.base_url(), "https://vault.internal:8200");
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn test_configured_token_wins() {
        let config = VaultConfig::default().with_token("s.abc");
        assert_eq!(config.resolve_token().unwrap(), "s.abc");
    }
}
