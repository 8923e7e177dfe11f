//! Error types for the transit client.

use thiserror::Error;

/// Result type alias for transit operations.
pub type Result<T> = std::result::Result<T, VaultError>;

/// Errors returned by the transit client. Every variant means the
/// encryption capability is unavailable for this call.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Vault answered with a non-success status.
    #[error("vault returned {status}: {body}")]
    Unavailable { status: u16, body: String },

    /// No token in the configuration or the environment.
    #[error("vault token not configured")]
    MissingToken,

    /// A required locator key was not supplied.
    #[error("missing locator key: {0}")]
    MissingKey(&'static str),

    /// The key lookup succeeded but carried no key material.
    #[error("no key material for {0}")]
    MissingKeyMaterial(String),

    /// The response parsed but lacked the expected `data` fields.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Plaintext returned by Vault was not valid base64.
    #[error("invalid base64 plaintext: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Decrypted bytes were not UTF-8.
    #[error("plaintext is not utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
