// toolspec-agent/src/local.rs
// ============================================================================
// Module: Local Agent State
// Description: Config-directory persistence for install and approval state.
// Purpose: Read and write the agent's install.json and state.json files.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The agent keeps its registered install credentials and approval state
//! under one config directory (`~/.toolspec` unless overridden). Reads are
//! tolerant: a missing or malformed file behaves like an absent one, so a
//! damaged state file never bricks the CLI. Writes are strict and surface
//! their errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::client::InstallRegistered;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV_VAR: &str = "TOOLSPEC_CONFIG_DIR";

/// Default config directory name under the home directory.
pub const DEFAULT_CONFIG_DIR_NAME: &str = ".toolspec";

/// File holding the registered install credentials.
const INSTALL_FILE: &str = "install.json";

/// File holding approval state.
const STATE_FILE: &str = "state.json";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Local persistence failure.
#[derive(Debug, Error)]
pub enum LocalError {
    /// Filesystem operation failed.
    #[error("local state io failure at {path}: {source}")]
    Io {
        /// Affected path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// State could not be serialized.
    #[error("local state serialization failure: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ============================================================================
// SECTION: Stored Shapes
// ============================================================================

/// Registered install credentials as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredInstall {
    /// Install identifier.
    pub install_id: String,
    /// Install secret captured at registration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_secret: Option<String>,
    /// Credential version captured at registration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_version: Option<u32>,
}

impl From<InstallRegistered> for StoredInstall {
    fn from(registered: InstallRegistered) -> Self {
        Self {
            install_id: registered.install_id,
            install_secret: Some(registered.install_secret),
            secret_version: Some(registered.secret_version),
        }
    }
}

/// Approval state recorded after submissions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentState {
    /// RFC 3339 time of the last approved submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at_utc: Option<String>,
    /// Review id returned for the last approved submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_approved_review_id: Option<String>,
}

// ============================================================================
// SECTION: Agent Home
// ============================================================================

/// Handle to the agent's config directory.
#[derive(Debug, Clone)]
pub struct AgentHome {
    /// Config directory root.
    dir: PathBuf,
}

impl AgentHome {
    /// Creates a handle for the given config directory.
    #[must_use]
    pub const fn new(dir: PathBuf) -> Self {
        Self {
            dir,
        }
    }

    /// Returns the config directory path.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the install credentials file path.
    #[must_use]
    pub fn install_path(&self) -> PathBuf {
        self.dir.join(INSTALL_FILE)
    }

    /// Returns the approval state file path.
    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    /// Reads the stored install, tolerating absence and damage.
    #[must_use]
    pub fn read_install(&self) -> Option<StoredInstall> {
        let record: StoredInstall = read_json(&self.install_path())?;
        if record.install_id.is_empty() {
            return None;
        }
        Some(record)
    }

    /// Writes the stored install.
    ///
    /// # Errors
    ///
    /// Returns [`LocalError`] when the directory or file cannot be written.
    pub fn write_install(&self, install: &StoredInstall) -> Result<(), LocalError> {
        self.write_json(&self.install_path(), install)
    }

    /// Reads the approval state, defaulting when absent or damaged.
    #[must_use]
    pub fn read_state(&self) -> AgentState {
        read_json(&self.state_path()).unwrap_or_default()
    }

    /// Writes the approval state.
    ///
    /// # Errors
    ///
    /// Returns [`LocalError`] when the directory or file cannot be written.
    pub fn write_state(&self, state: &AgentState) -> Result<(), LocalError> {
        self.write_json(&self.state_path(), state)
    }

    /// Best-effort removal of all local state files.
    pub fn remove_local_files(&self) {
        let _ = fs::remove_file(self.install_path());
        let _ = fs::remove_file(self.state_path());
    }

    /// Serializes a value to pretty JSON at the given path.
    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), LocalError> {
        fs::create_dir_all(&self.dir).map_err(|source| LocalError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let rendered = serde_json::to_string_pretty(value)?;
        fs::write(path, rendered).map_err(|source| LocalError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Reads and parses a JSON file, returning `None` on any failure.
fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Option<T> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
