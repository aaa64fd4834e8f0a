//! # Configuration
//!
//! Settings come from three places, later ones winning:
//!
//! 1. `tscat.toml` (or the file given with `--config`)
//! 2. `TSCAT_*` environment variables
//! 3. command line flags
//!
//! ```toml
//! [lint]
//! placeholders = true
//! accelerators = false
//! fail_on = "warning"
//!
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! rate_limit = 50
//! cors_origins = ["https://translate.example.org"]
//! ```
//!
//! ## Environment Variables
//!
//! - `TSCAT_API_KEY`: bearer key required by the HTTP API (except `/health`)
//! - `TSCAT_RATE_LIMIT`: requests per second, `0` disables limiting
//! - `TSCAT_CORS_ORIGINS`: comma-separated origins, or `*` for all
//! - `TSCAT_LOG_FORMAT`: `json` for machine-readable logs (read in `main`)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tscat_core::{LintConfig, TscatError};

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "tscat.toml";

/// Maximum accepted size of a configuration file (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Default rate limit: 100 requests per second.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

// =============================================================================
// SERVER CONFIGURATION
// =============================================================================

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Requests per second; 0 disables rate limiting.
    pub rate_limit: u32,
    /// Allowed CORS origins. `None` means localhost only, `["*"]` means all.
    pub cors_origins: Option<Vec<String>>,
    /// Bearer key for the API. Usually set through `TSCAT_API_KEY`.
    pub api_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            rate_limit: DEFAULT_RATE_LIMIT,
            cors_origins: None,
            api_key: None,
        }
    }
}

// =============================================================================
// TOP-LEVEL CONFIGURATION
// =============================================================================

/// Everything `tscat.toml` can set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TscatConfig {
    pub lint: LintConfig,
    pub server: ServerConfig,
}

impl TscatConfig {
    /// Parse configuration text.
    pub fn from_toml_str(text: &str) -> Result<Self, TscatError> {
        toml::from_str(text).map_err(|e| TscatError::ConfigError(e.to_string()))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `tscat.toml` in the working
    /// directory is used when present, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, TscatError> {
        let path: PathBuf = match path {
            Some(explicit) => explicit.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    tracing::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    return Ok(Self::default());
                }
                default
            }
        };

        let metadata = std::fs::metadata(&path).map_err(|e| {
            TscatError::ConfigError(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(TscatError::ConfigError(format!(
                "Configuration file '{}' is larger than {} bytes",
                path.display(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(&path).map_err(|e| {
            TscatError::ConfigError(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Apply `TSCAT_*` overrides from the process environment.
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_env_from(|name| std::env::var(name).ok())
    }

    /// Apply `TSCAT_*` overrides from an arbitrary variable source.
    #[must_use]
    pub fn with_env_from(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = var("TSCAT_API_KEY") {
            // An empty key disables authentication, also over a configured one.
            self.server.api_key = Some(key).filter(|k| !k.is_empty());
        }
        if let Some(raw) = var("TSCAT_RATE_LIMIT") {
            match raw.trim().parse() {
                Ok(limit) => self.server.rate_limit = limit,
                Err(_) => tracing::warn!("Ignoring invalid TSCAT_RATE_LIMIT '{}'", raw),
            }
        }
        if let Some(raw) = var("TSCAT_CORS_ORIGINS") {
            self.server.cors_origins = Some(
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            );
        }
        self
    }
}

// =============================================================================
// TESTS
// =============================================================================
