//! Deployment settings read from the process environment.

use std::{env, fmt, time::Duration};

use ethers::types::Address;
use url::Url;

use crate::error::{DeployError, Result};

pub const RPC_URL_VAR: &str = "INFURA_URL";
pub const SENDER_ADDRESS_VAR: &str = "SENDER_ADDRESS";
pub const PRIVATE_KEY_VAR: &str = "PRIVATE_KEY";
pub const BYTECODE_VAR: &str = "BYTECODE";
pub const NONCE_VAR: &str = "NONCE";

/// Variables that must be set (and non-blank) before anything touches the network.
pub const REQUIRED_VARS: [&str; 4] = [
    RPC_URL_VAR,
    SENDER_ADDRESS_VAR,
    PRIVATE_KEY_VAR,
    BYTECODE_VAR,
];

pub const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Clone)]
pub struct Config {
    pub rpc_url: Url,
    pub sender: Address,
    pub private_key: String,
    pub bytecode: String,
    /// Pinned nonce. `None` means ask the node for the sender's pending count.
    pub nonce: Option<u64>,
    pub receipt_timeout: Duration,
    pub poll_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any key/value source. All missing variables are
    /// reported together.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let values = REQUIRED_VARS.map(|name| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        });
        let missing: Vec<&'static str> = REQUIRED_VARS
            .iter()
            .zip(&values)
            .filter_map(|(name, value)| value.is_none().then_some(*name))
            .collect();

        let [Some(rpc_url), Some(sender), Some(private_key), Some(bytecode)] = values else {
            return Err(DeployError::MissingConfig(missing));
        };

        let nonce = match lookup(NONCE_VAR).map(|value| value.trim().to_owned()) {
            Some(value) if !value.is_empty() => Some(parse_nonce(&value)?),
            _ => None,
        };

        Ok(Config {
            rpc_url: parse_rpc_url(&rpc_url)?,
            sender: parse_address(&sender)?,
            private_key,
            bytecode,
            nonce,
            receipt_timeout: DEFAULT_RECEIPT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn with_receipt_timeout(mut self, timeout: Duration) -> Self {
        self.receipt_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

// Keep the signing key out of logs and panics
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("rpc_url", &self.rpc_url.as_str())
            .field("sender", &self.sender)
            .field("private_key", &"<redacted>")
            .field("bytecode_len", &self.bytecode.len())
            .field("nonce", &self.nonce)
            .field("receipt_timeout", &self.receipt_timeout)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

fn parse_rpc_url(value: &str) -> Result<Url> {
    let url = Url::parse(value).map_err(|e| DeployError::InvalidConfig {
        name: RPC_URL_VAR,
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(DeployError::InvalidConfig {
            name: RPC_URL_VAR,
            reason: format!("unsupported scheme '{}', expected http or https", scheme),
        }),
    }
}

// Parse without ENS resolution, with or without the 0x prefix
fn parse_address(value: &str) -> Result<Address> {
    let addr = value.trim_start_matches("0x");
    if addr.len() != 40 {
        return Err(DeployError::InvalidConfig {
            name: SENDER_ADDRESS_VAR,
            reason: format!("expected 20 hex bytes, got {} characters", addr.len()),
        });
    }
    addr.parse::<Address>().map_err(|e| DeployError::InvalidConfig {
        name: SENDER_ADDRESS_VAR,
        reason: e.to_string(),
    })
}

// Same range as the --nonce flag
fn parse_nonce(value: &str) -> Result<u64> {
    value.parse::<u64>().map_err(|e| DeployError::InvalidConfig {
        name: NONCE_VAR,
        reason: e.to_string(),
    })
}
