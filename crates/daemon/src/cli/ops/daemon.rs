use clap::Args;

use paranoid_daemon::state::AppState;
use paranoid_daemon::{spawn_service, ServiceConfig};

#[derive(Args, Debug, Clone)]
pub struct Daemon {
    /// Override API server port (default from config)
    #[arg(long)]
    pub api_port: Option<u16>,

    /// Skip warming the cache on startup
    #[arg(long)]
    pub no_prefetch: bool,

    /// Directory for log files (logs to stdout only if not set)
    #[arg(long)]
    pub log_dir: Option<std::path::PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("state error: {0}")]
    StateError(#[from] paranoid_daemon::state::StateError),

    #[error("daemon failed: {0}")]
    Failed(#[from] paranoid_daemon::process::ServiceError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Daemon {
    type Error = DaemonError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        // Load state from config path (or default ~/.paranoid)
        let state = AppState::load(ctx.config_path.clone())?;

        let config = ServiceConfig {
            store: state.config.store.clone(),
            base_path: state.config.base_path.clone(),
            disable_chat: state.config.disable_chat,
            prefetch: state.config.prefetch && !self.no_prefetch,
            api_port: self.api_port.unwrap_or(state.config.api_port),
            log_level: tracing::Level::DEBUG,
            log_dir: self.log_dir.clone(),
        };

        spawn_service(&config).await?;
        Ok("daemon ended".to_string())
    }
}
