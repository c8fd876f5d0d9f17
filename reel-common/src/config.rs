//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration comes from a small TOML file. Everything that can
//! change at runtime (the TMDB API key, for instance) lives in the database
//! `settings` table and is resolved by the service itself.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "reel.db";

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "REEL_ROOT_FOLDER";

/// Bootstrap configuration loaded from TOML file
///
/// Every field is optional so that an absent or partial file still yields a
/// usable configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// HTTP server port (optional, CLI/env default applies otherwise)
    #[serde(default)]
    pub port: Option<u16>,

    /// TMDB API key (lowest priority source)
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    /// Override for the TMDB API base URL
    #[serde(default)]
    pub tmdb_base_url: Option<String>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Import job defaults
    #[serde(default)]
    pub import: ImportDefaults,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Defaults applied to every import run started by the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportDefaults {
    /// Pause between processed entries, in milliseconds
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Maximum number of discover pages fetched per run
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

impl Default for ImportDefaults {
    fn default() -> Self {
        Self {
            page_delay_ms: default_page_delay_ms(),
            max_pages: default_max_pages(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_page_delay_ms() -> u64 {
    250
}

fn default_max_pages() -> u32 {
    500
}

/// Load TOML configuration from an explicit path
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Load TOML configuration, falling back to defaults
///
/// An explicit path must exist and parse. Without one, the platform config
/// file is used when present; otherwise the built-in defaults apply.
pub fn load_or_default(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        return load_toml_config(path);
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            tracing::info!("Loading config from {}", path.display());
            load_toml_config(&path)
        }
        _ => {
            tracing::debug!("No config file found, using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Default configuration file path for the platform
///
/// Linux: `~/.config/reel/config.toml`, falling back to `/etc/reel/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("reel").join("config.toml"));

    if cfg!(target_os = "linux") {
        if let Some(path) = &user_config {
            if path.exists() {
                return user_config;
            }
        }
        let system_config = PathBuf::from("/etc/reel/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    user_config
}

/// Root folder resolution, in priority order:
/// 1. Command-line argument
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml_config: &TomlConfig,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// Create the root folder if missing and return the database path inside it
pub fn prepare_root_folder(root_folder: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(root_folder)?;
    Ok(root_folder.join(DATABASE_FILE_NAME))
}

/// OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/reel (or /var/lib/reel for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("reel"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/reel"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("reel"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/reel"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("reel"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\reel"))
    } else {
        PathBuf::from("./reel_data")
    }
}
