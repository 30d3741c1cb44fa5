use std::path::PathBuf;

use crate::state::StoreConfig;

#[derive(Debug, Clone)]
pub struct Config {
    // store configuration
    /// Backend holding services, identities and field values
    pub store: StoreConfig,
    /// Directory under each user's KBFS root holding paranoid files
    pub base_path: String,

    // manager configuration
    /// Do not send share requests over chat
    pub disable_chat: bool,
    /// Warm the cache in the background on startup
    pub prefetch: bool,

    // http server configuration
    /// Port for the API server. Always bound to loopback.
    pub api_port: u16,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}
