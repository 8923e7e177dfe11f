//! # Vault Transit
//!
//! Encrypts and decrypts config property values through Vault's transit
//! secrets engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Vault Transit                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  VaultTextEncryptorLocator ──► GET  /v1/transit/keys/{name}_{p} │
//! │            │                                                    │
//! │            ▼                                                    │
//! │  VaultTextEncryptor ──► POST /v1/transit/{encrypt,decrypt}/{k}  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any non-success status surfaces as [`VaultError::Unavailable`]; nothing
//! is retried.

pub mod config;
pub mod encryptor;
pub mod error;
pub mod transit;

pub use config::VaultConfig;
pub use encryptor::{TextEncryptor, TextEncryptorLocator, VaultTextEncryptor, VaultTextEncryptorLocator};
pub use error::{Result, VaultError};
pub use transit::{KeyData, TransitClient, VaultResponse};
