//! Connection configuration
//!
//! Settings are read from a TOML file and then overlaid with explicit
//! overrides (CLI flags, which themselves fall back to `NFVIS_*`
//! environment variables).

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// How to reach and authenticate against one appliance
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Hostname, or a full `http(s)://host[:port]` base
    pub host: String,

    pub user: String,

    pub password: String,

    /// Verify the appliance's TLS certificate
    pub validate_certs: bool,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            user: String::new(),
            password: String::new(),
            validate_certs: false,
            timeout_secs: 60,
        }
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("validate_certs", &self.validate_certs)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Values that take precedence over the configuration file
#[derive(Debug, Clone, Default)]
pub struct ConnectionOverrides {
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub validate_certs: Option<bool>,
    pub timeout_secs: Option<u64>,
}

impl ConnectionConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            tracing::debug!("Loaded connection settings from {}", path.display());
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Load the file, apply overrides and validate the result
    pub fn resolve(path: &Path, overrides: ConnectionOverrides) -> Result<Self> {
        let config = Self::load(path)?.with_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn with_overrides(mut self, overrides: ConnectionOverrides) -> Self {
        if let Some(host) = overrides.host {
            self.host = host;
        }
        if let Some(user) = overrides.user {
            self.user = user;
        }
        if let Some(password) = overrides.password {
            self.password = password;
        }
        if let Some(validate_certs) = overrides.validate_certs {
            self.validate_certs = validate_certs;
        }
        if let Some(timeout_secs) = overrides.timeout_secs {
            self.timeout_secs = timeout_secs;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::InvalidConfig("host is required".to_string()));
        }
        if self.user.is_empty() {
            return Err(Error::InvalidConfig("user is required".to_string()));
        }
        if self.password.is_empty() {
            return Err(Error::InvalidConfig("password is required".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::InvalidConfig(
                "timeout must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    /// Root of the configuration API
    pub fn base_url(&self) -> String {
        let host = self.host.trim().trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}/api", host)
        } else {
            format!("https://{}/api", host)
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
