use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "paranoid";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const LOG_DIR_NAME: &str = "logs";

pub const DEFAULT_API_PORT: u16 = 5000;
pub const DEFAULT_BASE_PATH: &str = "paranoid";
pub const DEFAULT_KEYBASE_BINARY: &str = "keybase";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port for the local API server (always bound to loopback)
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Directory under each user's KBFS root holding paranoid files
    #[serde(default = "default_base_path")]
    pub base_path: String,
    /// Do not send share requests over keybase chat
    #[serde(default)]
    pub disable_chat: bool,
    /// Warm the cache on startup
    #[serde(default = "default_prefetch")]
    pub prefetch: bool,
    /// Where identities are stored
    #[serde(default)]
    pub store: StoreConfig,
}

fn default_api_port() -> u16 {
    DEFAULT_API_PORT
}

fn default_base_path() -> String {
    DEFAULT_BASE_PATH.to_string()
}

fn default_prefetch() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            base_path: default_base_path(),
            disable_chat: false,
            prefetch: default_prefetch(),
            store: StoreConfig::default(),
        }
    }
}

/// Remote store backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// KBFS through the `keybase` command line client
    Keybase {
        /// Path to the executable (defaults to `keybase` on $PATH)
        #[serde(default = "default_keybase_binary")]
        binary: PathBuf,
    },
    /// Process-local store, lost on exit. For development only.
    Memory {
        /// Who the daemon acts as
        username: String,
    },
}

fn default_keybase_binary() -> PathBuf {
    PathBuf::from(DEFAULT_KEYBASE_BINARY)
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Keybase {
            binary: default_keybase_binary(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the paranoid directory (~/.paranoid)
    pub paranoid_dir: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Default directory for log files
    pub log_dir: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the paranoid directory path (custom or default ~/.paranoid)
    pub fn paranoid_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new paranoid state directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let paranoid_dir = Self::paranoid_dir(custom_path)?;
        let config_path = paranoid_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&paranoid_dir)?;
        let log_dir = paranoid_dir.join(LOG_DIR_NAME);
        fs::create_dir_all(&log_dir)?;

        let config = config.unwrap_or_default();
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            paranoid_dir,
            config_path,
            log_dir,
            config,
        })
    }

    /// Load existing state from the paranoid directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let paranoid_dir = Self::paranoid_dir(custom_path)?;
        let config_path = paranoid_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            log_dir: paranoid_dir.join(LOG_DIR_NAME),
            paranoid_dir,
            config_path,
            config,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("paranoid directory not initialized. Run 'paranoid init' first")]
    NotInitialized,

    #[error("paranoid directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
