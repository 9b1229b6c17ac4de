//! Configuration for proxy transports.
//!
//! Settings come from defaults, a JSON document, or environment variables.
//! Environment variables:
//!
//! - `SWITCHBOARD_LOCK_TIMEOUT_MS`: wait for exclusive use of a shared
//!   transport
//! - `SWITCHBOARD_CALL_TIMEOUT_MS`: bound on one request/reply exchange
//! - `SWITCHBOARD_I2C_ADDRESS`: 7-bit board address, decimal or `0x..`

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::error::{Error, Result};

const LOCK_TIMEOUT_VAR: &str = "SWITCHBOARD_LOCK_TIMEOUT_MS";
const CALL_TIMEOUT_VAR: &str = "SWITCHBOARD_CALL_TIMEOUT_MS";
const I2C_ADDRESS_VAR: &str = "SWITCHBOARD_I2C_ADDRESS";

/// Transport settings shared by every proxy on a connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProxyConfig {
    /// Lock acquisition timeout in milliseconds
    pub lock_timeout_ms: u64,

    /// Request/reply timeout in milliseconds
    pub call_timeout_ms: u64,

    /// Board address on the I2C bus
    pub i2c_address: Option<u8>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: 2000,
            call_timeout_ms: 1000,
            i2c_address: None,
        }
    }
}

impl ProxyConfig {
    /// Parse a JSON document; missing keys take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by any `SWITCHBOARD_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(value) = lookup(LOCK_TIMEOUT_VAR) {
            config.lock_timeout_ms = parse_millis(LOCK_TIMEOUT_VAR, &value)?;
        }
        if let Some(value) = lookup(CALL_TIMEOUT_VAR) {
            config.call_timeout_ms = parse_millis(CALL_TIMEOUT_VAR, &value)?;
        }
        if let Some(value) = lookup(I2C_ADDRESS_VAR) {
            config.i2c_address = Some(parse_address(&value)?);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.lock_timeout_ms == 0 || self.call_timeout_ms == 0 {
            return Err(Error::Config("timeouts must be non-zero".into()));
        }
        if let Some(address) = self.i2c_address {
            if address > 0x7F {
                return Err(Error::Config(format!(
                    "I2C address {address:#04x} is not a 7-bit address"
                )));
            }
        }
        Ok(())
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

fn parse_millis(var: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{var}: `{value}` is not a duration in ms")))
}

fn parse_address(value: &str) -> Result<u8> {
    let value = value.trim();
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|_| Error::Config(format!("{I2C_ADDRESS_VAR}: `{value}` is not an address")))
}
