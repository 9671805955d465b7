//! Feed configuration.
//!
//! Values come from three layers, later ones winning:
//! 1. built-in defaults pointing at the public News Bharat endpoint
//! 2. an optional YAML file passed with `--config`
//! 3. command-line flags and their environment variables (see [`crate::cli`])
//!
//! # Example `config.yaml`
//!
//! ```yaml
//! endpoint: https://news-api-ten-omega.vercel.app/news
//! credentials: include
//! cookies:
//!   - "session=abc123"
//! timeout_secs: 20
//! ```

use crate::cli::Cli;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument};
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://news-api-ten-omega.vercel.app/news";
pub const DEFAULT_PAGE_TITLE: &str = "News Bharat - News India";
pub const DEFAULT_CANONICAL_URL: &str = "https://newsbharat.vercel.app/";

/// Errors raised while assembling a [`FeedConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Whether stored session credentials are attached to the outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialPolicy {
    /// Send the configured cookies with the request.
    #[default]
    Include,
    /// Never send cookies, even if some are configured.
    Omit,
}

/// Everything the feed needs to fetch and render.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FeedConfig {
    /// URL of the news list endpoint.
    pub endpoint: String,
    pub credentials: CredentialPolicy,
    /// Raw `name=value` cookie pairs.
    pub cookies: Vec<String>,
    /// Request timeout. No timeout when unset.
    pub timeout_secs: Option<u64>,
    pub page_title: String,
    pub canonical_url: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            credentials: CredentialPolicy::default(),
            cookies: Vec::new(),
            timeout_secs: None,
            page_title: DEFAULT_PAGE_TITLE.to_string(),
            canonical_url: DEFAULT_CANONICAL_URL.to_string(),
        }
    }
}

impl FeedConfig {
    /// Parse a YAML document. Omitted keys keep their defaults.
    pub fn from_yaml(path: &str, yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Load the YAML file at `path`.
    #[instrument(level = "info")]
    pub async fn load(path: &str) -> Result<Self, ConfigError> {
        let yaml = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_string(),
                source,
            })?;
        let config = Self::from_yaml(path, &yaml)?;
        info!(path, endpoint = %config.endpoint, "Loaded configuration");
        Ok(config)
    }

    /// Build the effective configuration for a command-line invocation.
    pub async fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match cli.config.as_deref() {
            Some(path) => Self::load(path).await?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        config.validate()?;
        debug!(?config.credentials, cookies = config.cookies.len(), "Resolved configuration");
        Ok(config)
    }

    /// Overlay command-line values on top of this configuration.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(endpoint) = &cli.endpoint {
            self.endpoint = endpoint.clone();
        }
        if !cli.cookies.is_empty() {
            self.cookies = cli.cookies.clone();
        }
        if cli.omit_credentials {
            self.credentials = CredentialPolicy::Omit;
        }
        if let Some(secs) = cli.timeout_secs {
            self.timeout_secs = Some(secs);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = Url::parse(&self.endpoint).map_err(|e| ConfigError::Invalid {
            key: "endpoint",
            message: e.to_string(),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                key: "endpoint",
                message: format!("unsupported scheme {:?}", endpoint.scheme()),
            });
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::Invalid {
                key: "timeout_secs",
                message: "must be greater than zero".to_string(),
            });
        }
        if let Some(bad) = self.cookies.iter().find(|c| !c.contains('=')) {
            return Err(ConfigError::Invalid {
                key: "cookies",
                message: format!("expected name=value, got {bad:?}"),
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// The `Cookie` header value for the request, if the policy allows one.
    pub fn cookie_header(&self) -> Option<String> {
        match self.credentials {
            CredentialPolicy::Include if !self.cookies.is_empty() => {
                Some(self.cookies.join("; "))
            }
            _ => None,
        }
    }
}
