//! Ingestion configuration
//!
//! Loaded from a TOML file with three sections:
//!
//! ```toml
//! [parser]
//! dialect = "mysql"
//!
//! [segmenter]
//! line_mode = "continuous"
//!
//! [backend]
//! base_url = "http://localhost:8080/api/v1"
//! auth_token = "secret"
//! timeout_seconds = 30
//! ```
//!
//! Every field is optional and falls back to its default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parser::{SqlDialect, SqlParserBackend};
use crate::segment::LineMode;

/// Default address of the table service
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
/// Default HTTP timeout in seconds
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Parser settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub dialect: SqlDialect,
}

/// Segmenter settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    pub line_mode: LineMode,
}

/// Table service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    /// Bearer token sent with every request
    pub auth_token: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_token: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

/// Main ingestion configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub parser: ParserConfig,
    pub segmenter: SegmenterConfig,
    pub backend: BackendConfig,
}

impl IngestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Set the SQL dialect
    pub fn with_dialect(mut self, dialect: SqlDialect) -> Self {
        self.parser.dialect = dialect;
        self
    }

    /// Set how the segmenter treats line boundaries
    pub fn with_line_mode(mut self, line_mode: LineMode) -> Self {
        self.segmenter.line_mode = line_mode;
        self
    }

    /// Set the table service address
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.backend.base_url = base_url.into();
        self
    }

    /// Set the bearer token
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.backend.auth_token = Some(token.into());
        self
    }

    /// Set the HTTP timeout
    pub fn with_timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.backend.timeout_seconds = timeout_seconds;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.backend.base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::Invalid("Backend base_url is required".to_string()));
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "Backend base_url must start with http:// or https://, got {}",
                base_url
            )));
        }
        if self.backend.timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "Backend timeout_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Parser for the configured dialect
    pub fn build_parser(&self) -> SqlParserBackend {
        SqlParserBackend::new(self.parser.dialect)
    }

    /// Processor wired to the HTTP handlers of the configured backend
    #[cfg(feature = "api-backend")]
    pub fn build_processor(&self) -> Result<crate::processor::ScriptProcessor, ConfigError> {
        use crate::handlers::{ApiClient, api_dispatcher};

        self.validate()?;
        let client = ApiClient::new(
            self.backend.base_url.trim(),
            self.backend.auth_token.clone(),
            self.backend.timeout_seconds,
        )
        .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        Ok(crate::processor::ScriptProcessor::new(
            self.build_parser(),
            api_dispatcher(client),
            self.segmenter.line_mode,
        ))
    }
}
