//! Command line arguments.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "cloudcfg", version, about = "Config server file monitor and Vault transit client")]
pub struct Cli {
    /// Path to cloudcfg.toml.
    #[arg(long, global = true, env = "CLOUDCFG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset, e.g. `debug`.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Watch the repository and serve the `/monitor` webhook.
    Serve {
        /// Overrides `server.bind`.
        #[arg(long)]
        bind: Option<SocketAddr>,
    },

    /// Print the public key of `{name}_{profiles}`.
    Key(KeyArgs),

    /// Encrypt TEXT with the located key.
    Encrypt {
        #[command(flatten)]
        key: KeyArgs,
        text: String,
    },

    /// Decrypt CIPHERTEXT with the located key.
    Decrypt {
        #[command(flatten)]
        key: KeyArgs,
        ciphertext: String,
    },
}

#[derive(Debug, Clone, Args)]
pub struct KeyArgs {
    /// Application name.
    #[arg(long)]
    pub name: String,

    /// Profile; `default` when omitted.
    #[arg(long)]
    pub profiles: Option<String>,
}

impl KeyArgs {
    /// Locator keys as the encryption subsystem passes them.
    pub fn to_keys(&self) -> HashMap<String, String> {
        let mut keys = HashMap::from([("name".to_string(), self.name.clone())]);
        if let Some(profiles) = &self.profiles {
            keys.insert("profiles".to_string(), profiles.clone());
        }
        keys
    }
}
