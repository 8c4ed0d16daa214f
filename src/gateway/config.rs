use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Playground (test) SOAP endpoint.
pub const PLAYGROUND_URL: &str = "https://pg.eet.cz:443/eet/services/EETServiceSOAP/v3";

/// Production SOAP endpoint.
pub const PRODUCTION_URL: &str = "https://prod.eet.cz:443/eet/services/EETServiceSOAP/v3";

/// Who supplies the message UUID when a request omits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UuidPolicy {
    /// The gateway generates a fresh UUID.
    #[default]
    Generate,
    /// The caller must send one; omission is a validation error.
    Require,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Gateway settings, stored as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Talk to the production endpoint instead of the playground.
    pub production_mode: bool,
    pub uuid_policy: UuidPolicy,
    pub request_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            production_mode: false,
            uuid_policy: UuidPolicy::Generate,
            request_timeout_secs: 30,
        }
    }
}

impl GatewayConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn endpoint_url(&self) -> &'static str {
        if self.production_mode {
            PRODUCTION_URL
        } else {
            PLAYGROUND_URL
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
