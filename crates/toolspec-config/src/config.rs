// toolspec-config/src/config.rs
// ============================================================================
// Module: ToolSpec Configuration
// Description: Configuration loading and validation for ToolSpec.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: toolspec-core, toolspec-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing sections fall back to safe defaults; invalid values fail closed.
//! The tool whitelist is part of configuration so registry content can be
//! versioned and replaced without a rebuild.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;
use toolspec_core::WhitelistRegistry;
use toolspec_store_sqlite::SqliteRegistryConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "toolspec.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "TOOLSPEC_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of whitelist names accepted from configuration.
pub(crate) const MAX_WHITELIST_NAMES: usize = 4_096;
/// Maximum length of a whitelist name.
pub(crate) const MAX_WHITELIST_NAME_LENGTH: usize = 200;
/// Default server bind address.
const DEFAULT_BIND: &str = "127.0.0.1:8787";
/// Default maximum request body size in bytes.
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
/// Maximum allowed request body limit.
const MAX_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
/// Default per-file history tail cap in bytes.
const DEFAULT_HISTORY_FILE_BYTES: u64 = 1024 * 1024;
/// Default cumulative history read budget in bytes.
const DEFAULT_HISTORY_TOTAL_BYTES: u64 = 16 * 1024 * 1024;
/// Default maximum number of history files inspected per scan.
const DEFAULT_HISTORY_MAX_FILES: usize = 250;
/// Default maximum directory entries visited per listing.
const DEFAULT_HISTORY_MAX_DIR_ENTRIES: usize = 5_000;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// ToolSpec configuration shared by the server and the agent.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ToolSpecConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Tool whitelist configuration.
    #[serde(default)]
    pub whitelist: WhitelistConfig,
    /// History extraction limits.
    #[serde(default)]
    pub history: HistoryConfig,
    /// Registry store configuration.
    #[serde(default)]
    pub store: StoreConfig,
}

impl ToolSpecConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// A missing file yields the built-in defaults; a present but invalid
    /// file is an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        if path.is_none() && !resolved.exists() {
            let mut config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.whitelist.validate()?;
        self.history.validate()?;
        self.store.validate()?;
        Ok(())
    }
}

/// Server configuration for the HTTP transport.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP listener.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// Validates server transport configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let bind = self.bind.trim();
        if bind.is_empty() {
            return Err(ConfigError::Invalid("server.bind must be set".to_string()));
        }
        let _: SocketAddr = bind
            .parse()
            .map_err(|_| ConfigError::Invalid("server.bind is not a socket address".to_string()))?;
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_body_bytes > MAX_MAX_BODY_BYTES {
            return Err(ConfigError::Invalid(
                "server.max_body_bytes exceeds the allowed maximum".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the address fails to parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid("server.bind is not a socket address".to_string()))
    }
}

/// Tool whitelist configuration.
///
/// When `names` is empty the built-in registry ships with the binary.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WhitelistConfig {
    /// Registry content version label; defaults to the built-in version.
    #[serde(default)]
    pub version: Option<String>,
    /// Whitelisted tool names; defaults to the built-in list.
    #[serde(default)]
    pub names: Vec<String>,
}

impl WhitelistConfig {
    /// Validates whitelist configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(version) = &self.version
            && version.trim().is_empty()
        {
            return Err(ConfigError::Invalid("whitelist.version must be non-empty".to_string()));
        }
        if self.names.len() > MAX_WHITELIST_NAMES {
            return Err(ConfigError::Invalid("whitelist.names exceeds entry limit".to_string()));
        }
        for name in &self.names {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(ConfigError::Invalid(
                    "whitelist.names must not contain empty entries".to_string(),
                ));
            }
            if trimmed.len() > MAX_WHITELIST_NAME_LENGTH {
                return Err(ConfigError::Invalid(
                    "whitelist.names contains an overlong entry".to_string(),
                ));
            }
        }
        if self.names.is_empty() && self.version.is_some() {
            return Err(ConfigError::Invalid(
                "whitelist.version requires whitelist.names".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds the effective whitelist registry.
    #[must_use]
    pub fn registry(&self) -> WhitelistRegistry {
        if self.names.is_empty() {
            return WhitelistRegistry::default();
        }
        let version = self
            .version
            .as_deref()
            .unwrap_or(toolspec_core::DEFAULT_WHITELIST_VERSION);
        WhitelistRegistry::new(version, self.names.iter().cloned())
    }
}

/// History extraction limit configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Per-file tail cap in bytes.
    #[serde(default = "default_history_file_bytes")]
    pub max_file_bytes: u64,
    /// Cumulative read budget in bytes.
    #[serde(default = "default_history_total_bytes")]
    pub max_total_bytes: u64,
    /// Maximum number of files inspected per scan.
    #[serde(default = "default_history_max_files")]
    pub max_files: usize,
    /// Maximum directory entries visited per listing.
    #[serde(default = "default_history_max_dir_entries")]
    pub max_dir_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_history_file_bytes(),
            max_total_bytes: default_history_total_bytes(),
            max_files: default_history_max_files(),
            max_dir_entries: default_history_max_dir_entries(),
        }
    }
}

impl HistoryConfig {
    /// Validates history limit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_file_bytes == 0 {
            return Err(ConfigError::Invalid(
                "history.max_file_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_total_bytes < self.max_file_bytes {
            return Err(ConfigError::Invalid(
                "history.max_total_bytes must be at least max_file_bytes".to_string(),
            ));
        }
        if self.max_files == 0 {
            return Err(ConfigError::Invalid(
                "history.max_files must be greater than zero".to_string(),
            ));
        }
        if self.max_dir_entries == 0 {
            return Err(ConfigError::Invalid(
                "history.max_dir_entries must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Registry store configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct StoreConfig {
    /// Optional `SQLite` backend; the in-memory store is used when absent.
    #[serde(default)]
    pub sqlite: Option<SqliteRegistryConfig>,
}

impl StoreConfig {
    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(sqlite) = &self.sqlite {
            validate_path_string("store.sqlite.path", &sqlite.path.display().to_string())?;
            if sqlite.busy_timeout_ms == 0 {
                return Err(ConfigError::Invalid(
                    "store.sqlite.busy_timeout_ms must be greater than zero".to_string(),
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Returns the default server bind address.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Returns the default maximum request body size.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Returns the default per-file history tail cap.
const fn default_history_file_bytes() -> u64 {
    DEFAULT_HISTORY_FILE_BYTES
}

/// Returns the default cumulative history budget.
const fn default_history_total_bytes() -> u64 {
    DEFAULT_HISTORY_TOTAL_BYTES
}

/// Returns the default history file count cap.
const fn default_history_max_files() -> usize {
    DEFAULT_HISTORY_MAX_FILES
}

/// Returns the default directory entry cap.
const fn default_history_max_dir_entries() -> usize {
    DEFAULT_HISTORY_MAX_DIR_ENTRIES
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    let path = Path::new(trimmed);
    for component in path.components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use super::*;

    #[test]
    fn default_config_validates() {
        let mut config = ToolSpecConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.bind, "127.0.0.1:8787");
        assert_eq!(config.history.max_files, 250);
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let mut config: ToolSpecConfig = toml::from_str("").expect("parse");
        config.validate().expect("valid");
        assert_eq!(config.server.max_body_bytes, 1024 * 1024);
        assert!(config.store.sqlite.is_none());
    }

    #[test]
    fn whitelist_override_builds_versioned_registry() {
        let mut config: ToolSpecConfig = toml::from_str(
            "[whitelist]\nversion = \"2026-03\"\nnames = [\"github\", \"Linear\"]\n",
        )
        .expect("parse");
        config.validate().expect("valid");
        let registry = config.whitelist.registry();
        assert_eq!(registry.version(), "2026-03");
        assert!(registry.is_public("linear"));
        assert!(!registry.is_public("slack"));
    }

    #[test]
    fn whitelist_version_without_names_is_rejected() {
        let mut config: ToolSpecConfig =
            toml::from_str("[whitelist]\nversion = \"2026-03\"\n").expect("parse");
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_whitelist_name_is_rejected() {
        let mut config: ToolSpecConfig =
            toml::from_str("[whitelist]\nnames = [\"github\", \" \"]\n").expect("parse");
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_body_limit_is_rejected() {
        let mut config: ToolSpecConfig =
            toml::from_str("[server]\nmax_body_bytes = 0\n").expect("parse");
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_bind_address_is_rejected() {
        let mut config: ToolSpecConfig =
            toml::from_str("[server]\nbind = \"not-an-address\"\n").expect("parse");
        assert!(config.validate().is_err());
    }

    #[test]
    fn history_total_below_file_cap_is_rejected() {
        let mut config: ToolSpecConfig = toml::from_str(
            "[history]\nmax_file_bytes = 1048576\nmax_total_bytes = 1024\n",
        )
        .expect("parse");
        assert!(config.validate().is_err());
    }

    #[test]
    fn sqlite_store_section_parses() {
        let mut config: ToolSpecConfig = toml::from_str(
            "[store.sqlite]\npath = \"/tmp/toolspec/registry.sqlite\"\nsync_mode = \"normal\"\n",
        )
        .expect("parse");
        config.validate().expect("valid");
        assert!(config.store.sqlite.is_some());
    }
}
