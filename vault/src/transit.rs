//! Raw calls against Vault's transit secrets engine.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::RequestBuilder;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::VaultConfig;
use crate::error::{Result, VaultError};

const TOKEN_HEADER: &str = "X-Vault-Token";

/// Envelope shared by every Vault response.
#[derive(Debug, Clone, Deserialize)]
pub struct VaultResponse<T> {
    pub data: Option<T>,

    #[serde(default)]
    pub lease_id: Option<String>,

    #[serde(default)]
    pub lease_duration: u64,

    #[serde(default)]
    pub renewable: bool,
}

/// `data` of a key lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyData {
    pub key: Option<String>,
    pub name: Option<String>,
    pub cipher_mode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EncryptData {
    ciphertext: String,
}

#[derive(Debug, Deserialize)]
struct DecryptData {
    plaintext: String,
}

/// HTTP client for `/v1/transit`. One request per call, no retries.
#[derive(Clone)]
pub struct TransitClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for TransitClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl TransitClient {
    /// Build a client from `config`, resolving the token up front.
    pub fn new(config: &VaultConfig) -> Result<Self> {
        let token = config.resolve_token()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            base_url: config.base_url().to_string(),
            token,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /v1/transit/keys/{name}`.
    pub async fn read_key(&self, name: &str) -> Result<KeyData> {
        let request = self.client.get(self.url(&format!("keys/{name}")));
        let response: VaultResponse<KeyData> = self.send(request).await?;
        response
            .data
            .ok_or_else(|| VaultError::InvalidResponse(format!("key {name} has no data")))
    }

    /// Encrypt `plaintext` under `key`, returning Vault's ciphertext.
    pub async fn encrypt(&self, key: &str, plaintext: &str) -> Result<String> {
        let body = serde_json::json!({ "plaintext": STANDARD.encode(plaintext) });
        let request = self
            .client
            .post(self.url(&format!("encrypt/{key}")))
            .json(&body);

        let response: VaultResponse<EncryptData> = self.send(request).await?;
        let data = response
            .data
            .ok_or_else(|| VaultError::InvalidResponse("encrypt response has no data".into()))?;
        Ok(data.ciphertext)
    }

    /// Decrypt `ciphertext` under `key`.
    pub async fn decrypt(&self, key: &str, ciphertext: &str) -> Result<String> {
        let body = serde_json::json!({ "ciphertext": ciphertext });
        let request = self
            .client
            .post(self.url(&format!("decrypt/{key}")))
            .json(&body);

        let response: VaultResponse<DecryptData> = self.send(request).await?;
        let data = response
            .data
            .ok_or_else(|| VaultError::InvalidResponse("decrypt response has no data".into()))?;

        let bytes = STANDARD.decode(data.plaintext)?;
        Ok(String::from_utf8(bytes)?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/transit/{path}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.header(TOKEN_HEADER, &self.token).send().await?;
        let status = response.status();
        debug!("Vault responded {status} for {}", response.url().path());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Vault request failed with {status}");
            return Err(VaultError::Unavailable {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}
