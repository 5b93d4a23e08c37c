//! Configuration loading
//!
//! Each setting resolves in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or unreadable config file is never fatal: a warning is logged and
//! the compiled defaults are used.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::{Error, Result};

pub const ENV_SERVER_URL: &str = "VIGIL_SERVER_URL";
pub const ENV_BIND_ADDR: &str = "VIGIL_BIND_ADDR";
pub const ENV_DATA_FOLDER: &str = "VIGIL_DATA_FOLDER";
pub const ENV_API_TOKEN: &str = "VIGIL_API_TOKEN";
pub const ENV_CONFIG_FILE: &str = "VIGIL_CONFIG";

/// Logging section of the TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing filter when `RUST_LOG` is unset
    pub level: Option<String>,
}

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Base URL of the hub, used by the dashboard
    pub server_url: Option<String>,
    /// Listen address of the hub
    pub bind_addr: Option<String>,
    /// Folder holding the hub database
    pub data_folder: Option<PathBuf>,
    /// Staff bearer token accepted by the hub
    pub api_token: Option<String>,
    /// Delay between push-channel reconnect attempts
    pub reconnect_delay_ms: Option<u64>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load from the first config file found, or defaults if there is none
    pub fn load_or_default() -> Self {
        let Some(path) = config_file_path() else {
            debug!("No config file found, using compiled defaults");
            return Self::default();
        };

        match Self::load(&path) {
            Ok(config) => {
                debug!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Built-in defaults
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledDefaults {
    pub server_url: String,
    pub bind_addr: String,
    pub data_folder: PathBuf,
    pub reconnect_delay_ms: u64,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            server_url: "http://127.0.0.1:5780".to_string(),
            bind_addr: "127.0.0.1:5780".to_string(),
            data_folder: default_data_folder(),
            reconnect_delay_ms: 2000,
            log_level: "info".to_string(),
        }
    }
}

/// Resolves settings across CLI, environment, TOML and compiled defaults
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    toml: TomlConfig,
    defaults: CompiledDefaults,
}

impl ConfigResolver {
    /// Resolver backed by the on-disk config file (if any)
    pub fn new() -> Self {
        Self::with_toml(TomlConfig::load_or_default())
    }

    pub fn with_toml(toml: TomlConfig) -> Self {
        Self {
            toml,
            defaults: CompiledDefaults::for_current_platform(),
        }
    }

    pub fn server_url(&self, cli_arg: Option<&str>) -> String {
        resolve(cli_arg, ENV_SERVER_URL, self.toml.server_url.as_deref())
            .unwrap_or_else(|| self.defaults.server_url.clone())
    }

    pub fn bind_addr(&self, cli_arg: Option<&str>) -> String {
        resolve(cli_arg, ENV_BIND_ADDR, self.toml.bind_addr.as_deref())
            .unwrap_or_else(|| self.defaults.bind_addr.clone())
    }

    pub fn data_folder(&self, cli_arg: Option<&Path>) -> PathBuf {
        if let Some(path) = cli_arg {
            return path.to_path_buf();
        }
        if let Ok(path) = std::env::var(ENV_DATA_FOLDER) {
            return PathBuf::from(path);
        }
        self.toml
            .data_folder
            .clone()
            .unwrap_or_else(|| self.defaults.data_folder.clone())
    }

    /// Staff token; `None` means staff routes are closed
    pub fn api_token(&self, cli_arg: Option<&str>) -> Option<String> {
        resolve(cli_arg, ENV_API_TOKEN, self.toml.api_token.as_deref())
            .filter(|token| !token.is_empty())
    }

    pub fn reconnect_delay_ms(&self, cli_arg: Option<u64>) -> u64 {
        cli_arg
            .or(self.toml.reconnect_delay_ms)
            .unwrap_or(self.defaults.reconnect_delay_ms)
    }

    /// Tracing filter used when `RUST_LOG` is unset
    pub fn log_level(&self) -> &str {
        self.toml
            .logging
            .level
            .as_deref()
            .unwrap_or(&self.defaults.log_level)
    }
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve(cli_arg: Option<&str>, env_var: &str, toml_value: Option<&str>) -> Option<String> {
    if let Some(value) = cli_arg {
        return Some(value.to_string());
    }
    if let Ok(value) = std::env::var(env_var) {
        return Some(value);
    }
    toml_value.map(str::to_string)
}

/// Location of the config file, if one exists
///
/// `VIGIL_CONFIG` wins; otherwise `~/.config/vigil/config.toml`, then
/// `/etc/vigil/config.toml` on Linux.
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(ENV_CONFIG_FILE) {
        let path = PathBuf::from(path);
        return path.exists().then_some(path);
    }

    let user_config = dirs::config_dir().map(|d| d.join("vigil").join("config.toml"));
    if let Some(path) = user_config.filter(|p| p.exists()) {
        return Some(path);
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/vigil/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }
    None
}

/// OS-dependent default data folder
fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("vigil"))
        .unwrap_or_else(|| PathBuf::from("./vigil_data"))
}

/// Creates the data folder and names the files inside it
pub struct DataFolderInitializer {
    data_folder: PathBuf,
}

impl DataFolderInitializer {
    pub fn new(data_folder: PathBuf) -> Self {
        Self { data_folder }
    }

    /// Idempotent
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_folder)?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_folder.join("vigil.db")
    }
}
