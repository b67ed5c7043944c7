//! Configuration loading and root folder resolution
//!
//! Bootstrap settings come from a small TOML file. Every key has a built-in
//! default so a missing or partial file never prevents startup.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "SCOUT_ROOT_FOLDER";

/// Name of the config file looked up in the user/system config directories
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Root folder holding the local database
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// SQLite file name, relative to the root folder
    #[serde(default = "default_database_file")]
    pub database_file: String,

    /// Base URL of the REST backend (e.g. `https://xyz.supabase.co`)
    #[serde(default)]
    pub backend_url: Option<String>,

    /// Anonymous API key sent with every backend request
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request timeout for backend calls
    ///
    /// A hung call would otherwise keep a submission in `Routing`;
    /// the timeout turns it into a local queue write.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// EventBus channel capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,

    /// How often the daemon probes backend reachability
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,

    /// Assignment list invalidation timer
    #[serde(default = "default_assignment_refresh_secs")]
    pub assignment_refresh_secs: u64,

    /// Send inserts with the natural key as upsert conflict target
    ///
    /// Requires a matching unique constraint on the backend.
    #[serde(default)]
    pub idempotent_inserts: bool,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_database_file() -> String {
    "scout.db".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_event_bus_capacity() -> usize {
    100
}

fn default_probe_interval_secs() -> u64 {
    30
}

fn default_assignment_refresh_secs() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LoggingConfig {
    /// Open the configured log file for appending, creating parent folders
    ///
    /// `None` when logs go to stderr.
    pub fn open_file(&self) -> Result<Option<std::fs::File>> {
        let Some(path) = &self.file else {
            return Ok(None);
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Some(file))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            database_file: default_database_file(),
            backend_url: None,
            api_key: None,
            request_timeout_ms: default_request_timeout_ms(),
            event_bus_capacity: default_event_bus_capacity(),
            probe_interval_secs: default_probe_interval_secs(),
            assignment_refresh_secs: default_assignment_refresh_secs(),
            idempotent_inserts: false,
            logging: LoggingConfig::default(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(format!("Invalid TOML config: {}", e)))
    }

    /// Load configuration from an explicit file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is missing or invalid
    ///
    /// With no explicit path, the platform config locations are searched.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let candidate = match path {
            Some(p) => Some(p.to_path_buf()),
            None => find_config_file().ok(),
        };

        match candidate {
            Some(p) => match Self::load(&p) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Could not load config {}: {} (using defaults)", p.display(), e);
                    Self::default()
                }
            },
            None => {
                warn!("No config file found, using built-in defaults");
                Self::default()
            }
        }
    }

    /// Request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        crate::time::millis_or(self.request_timeout_ms, Duration::from_millis(default_request_timeout_ms()))
    }

    /// Full path of the SQLite database under the given root folder
    pub fn database_path(&self, root_folder: &Path) -> PathBuf {
        root_folder.join(&self.database_file)
    }
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>, toml_config: Option<&TomlConfig>) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(root) = toml_config.and_then(|c| c.root_folder.clone()) {
        return root;
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Locate the config file for the platform
fn find_config_file() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("scout").join(CONFIG_FILE_NAME));

    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/scout").join(CONFIG_FILE_NAME);
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("scout"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/scout"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("scout"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/scout"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("scout"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\scout"))
    } else {
        PathBuf::from("./scout_data")
    }
}
