//! Server configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then the
//! environment (`STOCKROOM_HOST`, `PORT`). The binary applies CLI flags last.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Longest session lifetime accepted (ten years)
pub const MAX_SESSION_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    pub port: u16,
    /// Directory holding the HTML pages
    pub public_dir: PathBuf,
    /// Name of the session cookie
    pub session_cookie: String,
    /// Session lifetime in seconds
    pub session_ttl_secs: u64,
    /// Mark the session cookie `Secure`
    pub secure_cookie: bool,
    /// Honour `role: "admin"` at registration
    pub allow_admin_registration: bool,
    /// Value of `Access-Control-Allow-Origin`
    pub cors_allow_origin: String,
    /// Largest request body accepted, in bytes
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            public_dir: PathBuf::from("public"),
            session_cookie: "sid".to_string(),
            session_ttl_secs: 24 * 60 * 60,
            secure_cookie: false,
            allow_admin_registration: true,
            cors_allow_origin: "*".to_string(),
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Defaults, overlaid with `path` when given, then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env(|key| std::env::var(key).ok())?.validate()
    }

    /// Reject values the server cannot run with
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.session_ttl_secs == 0 || self.session_ttl_secs > MAX_SESSION_TTL_SECS {
            return Err(ConfigError::Invalid {
                key: "session_ttl_secs",
                value: self.session_ttl_secs.to_string(),
            });
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid {
                key: "max_body_bytes",
                value: "0".to_string(),
            });
        }
        Ok(self)
    }

    /// Apply `STOCKROOM_HOST` and `PORT` as read through `lookup`
    pub fn with_env(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(host) = lookup("STOCKROOM_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.port = port.parse().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value: port.clone(),
            })?;
        }
        Ok(self)
    }

    /// `host:port` as handed to the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    Parse { message: String },

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}
