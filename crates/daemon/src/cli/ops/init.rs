use std::path::PathBuf;

use clap::{Args, ValueEnum};

use paranoid_daemon::state::{AppConfig, AppState, StateError, StoreConfig, DEFAULT_API_PORT};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// KBFS through the keybase command line client
    Keybase,
    /// Process-local store, for development
    Memory,
}

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Port for the local API server
    #[arg(long, default_value_t = DEFAULT_API_PORT)]
    pub api_port: u16,

    /// Directory under each user's KBFS root holding paranoid files
    #[arg(long)]
    pub base_path: Option<String>,

    /// Where identities are stored
    #[arg(long, value_enum, default_value_t = StoreKind::Keybase)]
    pub store: StoreKind,

    /// Path to the keybase executable
    #[arg(long)]
    pub keybase_binary: Option<PathBuf>,

    /// User the memory store acts as
    #[arg(long, required_if_eq("store", "memory"))]
    pub username: Option<String>,

    /// Do not send share requests over keybase chat
    #[arg(long)]
    pub disable_chat: bool,

    /// Do not warm the cache on startup
    #[arg(long)]
    pub no_prefetch: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("state error: {0}")]
    State(#[from] StateError),

    #[error("--username is required with the memory store")]
    MissingUsername,
}

impl Init {
    fn app_config(&self) -> Result<AppConfig, InitError> {
        let defaults = AppConfig::default();
        let store = match self.store {
            StoreKind::Keybase => StoreConfig::Keybase {
                binary: self
                    .keybase_binary
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(paranoid_daemon::state::DEFAULT_KEYBASE_BINARY)),
            },
            StoreKind::Memory => StoreConfig::Memory {
                username: self.username.clone().ok_or(InitError::MissingUsername)?,
            },
        };

        Ok(AppConfig {
            api_port: self.api_port,
            base_path: self.base_path.clone().unwrap_or(defaults.base_path),
            disable_chat: self.disable_chat,
            prefetch: !self.no_prefetch,
            store,
        })
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = self.app_config()?;
        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        Ok(format!(
            "Initialized paranoid directory at {}\n  config.toml: {}\n  api_port:    {}",
            state.paranoid_dir.display(),
            state.config_path.display(),
            state.config.api_port
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init(store: StoreKind, username: Option<&str>) -> Init {
        Init {
            api_port: 5005,
            base_path: None,
            store,
            keybase_binary: None,
            username: username.map(str::to_string),
            disable_chat: true,
            no_prefetch: true,
        }
    }

    #[test]
    fn test_memory_store_config() {
        let config = init(StoreKind::Memory, Some("alice")).app_config().unwrap();
        assert_eq!(
            config.store,
            StoreConfig::Memory {
                username: "alice".to_string()
            }
        );
        assert_eq!(config.api_port, 5005);
        assert!(config.disable_chat);
        assert!(!config.prefetch);
    }

    #[test]
    fn test_memory_store_requires_username() {
        assert!(matches!(
            init(StoreKind::Memory, None).app_config(),
            Err(InitError::MissingUsername)
        ));
    }
}
