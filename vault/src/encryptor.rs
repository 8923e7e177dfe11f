//! Text encryptors backed by Vault transit keys.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::error::{Result, VaultError};
use crate::transit::TransitClient;

/// Profile used when the locator keys carry none.
pub const DEFAULT_PROFILE: &str = "default";

/// Encrypts and decrypts property values.
#[async_trait]
pub trait TextEncryptor: Send + Sync {
    async fn encrypt(&self, text: &str) -> Result<String>;

    async fn decrypt(&self, encrypted: &str) -> Result<String>;

    /// Public half of the key, when the backend exposes one.
    fn public_key(&self) -> Option<&str> {
        None
    }
}

/// Picks an encryptor for a set of lookup keys (`name`, `profiles`).
#[async_trait]
pub trait TextEncryptorLocator: Send + Sync {
    async fn locate(&self, keys: &HashMap<String, String>) -> Result<Box<dyn TextEncryptor>>;
}

/// Encryptor bound to one transit key.
#[derive(Debug, Clone)]
pub struct VaultTextEncryptor {
    key_name: String,
    public_key: String,
    client: Arc<TransitClient>,
}

impl VaultTextEncryptor {
    pub fn new(
        key_name: impl Into<String>,
        public_key: impl Into<String>,
        client: Arc<TransitClient>,
    ) -> Self {
        Self {
            key_name: key_name.into(),
            public_key: public_key.into(),
            client,
        }
    }

    pub fn key_name(&self) -> &str {
        &self.key_name
    }
}

#[async_trait]
impl TextEncryptor for VaultTextEncryptor {
    async fn encrypt(&self, text: &str) -> Result<String> {
        self.client.encrypt(&self.key_name, text).await
    }

    async fn decrypt(&self, encrypted: &str) -> Result<String> {
        self.client.decrypt(&self.key_name, encrypted).await
    }

    fn public_key(&self) -> Option<&str> {
        Some(&self.public_key)
    }
}

/// Looks up `{name}_{profiles}` in Vault and wraps it in a
/// [`VaultTextEncryptor`].
#[derive(Debug, Clone)]
pub struct VaultTextEncryptorLocator {
    client: Arc<TransitClient>,
}

impl VaultTextEncryptorLocator {
    pub fn new(client: TransitClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Resolve the encryptor without erasing its type.
    pub async fn locate_key(&self, keys: &HashMap<String, String>) -> Result<VaultTextEncryptor> {
        let key_name = transit_key_name(keys)?;
        let data = self.client.read_key(&key_name).await?;
        let public_key = data
            .key
            .filter(|key| !key.is_empty())
            .ok_or_else(|| VaultError::MissingKeyMaterial(key_name.clone()))?;

        info!("Located vault key {key_name}");
        Ok(VaultTextEncryptor::new(key_name, public_key, self.client.clone()))
    }
}

#[async_trait]
impl TextEncryptorLocator for VaultTextEncryptorLocator {
    async fn locate(&self, keys: &HashMap<String, String>) -> Result<Box<dyn TextEncryptor>> {
        Ok(Box::new(self.locate_key(keys).await?))
    }
}

/// `{name}_{profiles}`, with `profiles` defaulting to [`DEFAULT_PROFILE`].
fn transit_key_name(keys: &HashMap<String, String>) -> Result<String> {
    let name = keys
        .get("name")
        .filter(|name| !name.is_empty())
        .ok_or(VaultError::MissingKey("name"))?;
    let profiles = keys
        .get("profiles")
        .map(String::as_str)
        .filter(|profiles| !profiles.is_empty())
        .unwrap_or(DEFAULT_PROFILE);

    Ok(format!("{name}_{profiles}"))
}
