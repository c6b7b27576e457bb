//! Configuration file loading and setting resolution
//!
//! Every setting is resolved in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Command-line arguments and environment variables are merged by clap in the
//! service binaries, so this module only sees "explicit value or nothing" for
//! the first two tiers.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Directory name used under the platform config directory
const CONFIG_DIR_NAME: &str = "smartlogic-concordance";

/// Config file name looked up in the default locations
const CONFIG_FILE_NAME: &str = "config.toml";

/// Settings that may be supplied through a TOML config file
///
/// All fields are optional; a missing key falls through to the compiled default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub app_system_code: Option<String>,
    pub app_name: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    /// Redis URL of the stream broker
    pub broker_connection_string: Option<String>,
    /// Stream key the consumer reads from
    pub topic: Option<String>,
    /// Consumer group name
    pub group_name: Option<String>,
    /// Base address of the concordance writer
    pub writer_address: Option<String>,
    pub writer_timeout_secs: Option<u64>,
}

impl TomlConfig {
    /// Load and parse a TOML config file
    ///
    /// Fails with [`Error::Config`] when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }

    /// Load the config file if one is available
    ///
    /// An explicitly requested file must exist and parse. Without an explicit
    /// path the default locations are probed; finding nothing is not an error
    /// and yields an empty config.
    pub fn load_optional(explicit: Option<&Path>) -> Result<Self> {
        match explicit.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }
}

/// Find the first existing config file in the platform default locations
///
/// Linux probes `~/.config/smartlogic-concordance/config.toml` and then
/// `/etc/smartlogic-concordance/config.toml`; other platforms only the user
/// config directory.
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc")
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME);
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Resolve a setting that has a compiled default
pub fn resolve_setting<T>(explicit: Option<T>, file: Option<T>, default: impl FnOnce() -> T) -> T {
    explicit.or(file).unwrap_or_else(default)
}

/// Resolve a setting that has no default
///
/// Fails with [`Error::Config`] naming the setting when neither an explicit
/// value nor a config file value is present. Blank strings count as missing.
pub fn require_setting(name: &str, explicit: Option<String>, file: Option<String>) -> Result<String> {
    explicit
        .filter(|v| !v.trim().is_empty())
        .or_else(|| file.filter(|v| !v.trim().is_empty()))
        .ok_or_else(|| Error::Config(format!("Missing required setting: {}", name)))
}
