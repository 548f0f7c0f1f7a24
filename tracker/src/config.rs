use crate::allowlist::{Allowlist, DEFAULT_SAFE_HOSTS};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Allowlist cannot be empty")]
    EmptyAllowlist,

    #[error("Invalid allowlist entry: {0:?}")]
    InvalidAllowedHost(String),
}

/// What to do with a click that passed validation
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RedirectMode {
    /// Answer 200 with a message naming the target
    #[default]
    Simulate,
    /// Answer 301 with a Location header
    Permanent,
}

/// Tracking service configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Listener for click-tracking requests
    pub listener: Listener,
    /// Listener for health and readiness probes
    pub admin_listener: Listener,
    pub redirect_mode: RedirectMode,
    /// Hosts that may be redirected to, matched exactly
    pub allowed_hosts: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listener: Listener {
                host: "0.0.0.0".into(),
                port: 8080,
            },
            admin_listener: Listener {
                host: "127.0.0.1".into(),
                port: 8081,
            },
            redirect_mode: RedirectMode::default(),
            allowed_hosts: DEFAULT_SAFE_HOSTS.iter().map(|h| h.to_string()).collect(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if self.allowed_hosts.is_empty() {
            return Err(ValidationError::EmptyAllowlist);
        }

        for host in &self.allowed_hosts {
            if host.is_empty() || host.contains(char::is_whitespace) || host.contains('/') {
                return Err(ValidationError::InvalidAllowedHost(host.clone()));
            }
        }

        Ok(())
    }

    pub fn allowlist(&self) -> Allowlist {
        Allowlist::new(self.allowed_hosts.iter().cloned())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}
