//! Configuration loading and root folder resolution
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or unreadable config file never aborts startup; it is logged and
//! the compiled defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Backend base URL used when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "https://backend.globaljournal.co.in/";

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "GJP_ROOT_FOLDER";

/// Environment variable overriding the backend base URL
pub const BASE_URL_ENV: &str = "GJP_BASE_URL";

/// HTTP request timeout applied by the client layer
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5000;

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_login_delay_ms() -> u64 {
    1000
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// `[retry]` section
///
/// `max_attempts` counts the first attempt, so the default of 3 means two retries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay between attempts for backend calls other than login
    #[serde(default)]
    pub delay_ms: u64,
    /// Delay between login attempts
    #[serde(default = "default_login_delay_ms")]
    pub login_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: 0,
            login_delay_ms: default_login_delay_ms(),
        }
    }
}

/// On-disk TOML configuration (`~/.config/gjp/config.toml`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub root_folder: Option<PathBuf>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Compiled fallback values for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub base_url: String,
    pub log_level: String,
    pub request_timeout_ms: u64,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            base_url: DEFAULT_BASE_URL.to_string(),
            log_level: default_log_level(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

/// OS-dependent default root folder
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/gjp
        dirs::data_local_dir()
            .map(|d| d.join("gjp"))
            .unwrap_or_else(|| PathBuf::from("./gjp_data"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/gjp
        dirs::data_dir()
            .map(|d| d.join("gjp"))
            .unwrap_or_else(|| PathBuf::from("./gjp_data"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\gjp
        dirs::data_local_dir()
            .map(|d| d.join("gjp"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\gjp"))
    } else {
        PathBuf::from("./gjp_data")
    }
}

/// Default config file location, if the platform has a config directory
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("gjp").join("config.toml"))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load the config file, falling back to defaults on any problem
///
/// `explicit` is a path given on the command line; when it is absent the
/// platform default location is tried. A missing default file is silent, a
/// missing explicit file or a parse failure is logged at warn.
pub fn load_config_or_default(explicit: Option<&Path>) -> TomlConfig {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => {
                debug!("No config file found, using compiled defaults");
                return TomlConfig::default();
            }
        },
    };

    match load_toml_config(&path) {
        Ok(config) => {
            debug!(path = %path.display(), "Loaded config file");
            config
        }
        Err(e) => {
            warn!("{}; using compiled defaults", e);
            TomlConfig::default()
        }
    }
}

/// Write a TOML config atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;
    write_atomic(path, content.as_bytes())
}

/// Write bytes to `path` via a sibling `.tmp` file and rename
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Normalize a backend base URL so endpoint names can be appended directly
///
/// Requires an http(s) scheme and guarantees a single trailing slash.
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(Error::Config(format!(
            "Base URL must start with http:// or https:// (got {:?})",
            raw
        )));
    }
    Ok(format!("{}/", trimmed.trim_end_matches('/')))
}

/// Fully resolved runtime configuration
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub root_folder: PathBuf,
    pub base_url: String,
    pub request_timeout: Duration,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
}

impl PortalConfig {
    /// Resolve every setting from CLI → ENV → TOML → compiled default
    pub fn resolve(
        toml_config: &TomlConfig,
        cli_root_folder: Option<&Path>,
        cli_base_url: Option<&str>,
    ) -> Result<Self> {
        let defaults = CompiledDefaults::for_current_platform();

        let root_folder = resolve_root_folder(cli_root_folder, toml_config, &defaults);
        let base_url = resolve_base_url(cli_base_url, toml_config, &defaults)?;

        let request_timeout = Duration::from_millis(
            toml_config
                .request_timeout_ms
                .unwrap_or(defaults.request_timeout_ms),
        );

        let mut retry = toml_config.retry.clone();
        if retry.max_attempts == 0 {
            warn!("retry.max_attempts = 0 is invalid, using 1");
            retry.max_attempts = 1;
        }

        Ok(Self {
            root_folder,
            base_url,
            request_timeout,
            retry,
            logging: toml_config.logging.clone(),
        })
    }

    /// Directory holding the persisted key/value records
    pub fn storage_dir(&self) -> PathBuf {
        self.root_folder.join("storage")
    }
}

/// Root folder: CLI → `GJP_ROOT_FOLDER` → TOML → compiled default
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    toml_config: &TomlConfig,
    defaults: &CompiledDefaults,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    defaults.root_folder.clone()
}

/// Backend base URL: CLI → `GJP_BASE_URL` → TOML → compiled default
pub fn resolve_base_url(
    cli_arg: Option<&str>,
    toml_config: &TomlConfig,
    defaults: &CompiledDefaults,
) -> Result<String> {
    if let Some(url) = cli_arg {
        return normalize_base_url(url);
    }

    if let Ok(url) = std::env::var(BASE_URL_ENV) {
        if !url.trim().is_empty() {
            return normalize_base_url(&url);
        }
    }

    if let Some(url) = &toml_config.base_url {
        return normalize_base_url(url);
    }

    normalize_base_url(&defaults.base_url)
}

/// Create the directory (and parents) if it does not exist yet
pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
        debug!(path = %path.display(), "Created directory");
    }
    Ok(())
}
