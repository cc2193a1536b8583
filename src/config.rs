//! Run configuration loaded from `sync.toml`.
//!
//! Settings are loaded once per invocation into an immutable value and
//! passed by reference into the engine. There is no process-wide state.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::SyncError;

/// Name of the settings file expected in the working directory.
pub const SETTINGS_FILE: &str = "sync.toml";

/// Per-run configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncSettings {
    /// Base path for archive storage. Relative paths resolve against the
    /// working directory.
    pub cloud_dir: PathBuf,
    /// Keep only the newest archive per branch.
    #[serde(default)]
    pub keep_latest: bool,
    /// Inclusion patterns for file selection.
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Skip files larger than this many bytes during selection.
    #[serde(default)]
    pub max_file_size: Option<u64>,
}

impl SyncSettings {
    /// Load `sync.toml` from the working directory.
    pub fn load(workdir: &Path) -> Result<Self, SyncError> {
        let path = workdir.join(SETTINGS_FILE);
        let data = fs::read_to_string(&path)
            .map_err(|e| SyncError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        toml::from_str(&data)
            .map_err(|e| SyncError::Config(format!("cannot parse {}: {}", path.display(), e)))
    }

    /// Contents written by `init` when no settings file exists yet.
    pub fn default_file_contents() -> &'static str {
        r#"# sync.toml - treestash configuration

# Base path for archive storage.
cloud_dir = "/path/to/cloud"

# Keep only the newest archive per branch.
keep_latest = true

# Inclusion patterns: `*` matches any run of characters, `.` is literal.
patterns = ["assets/*"]

# Skip files larger than this many bytes.
# max_file_size = 104857600
"#
    }
}
