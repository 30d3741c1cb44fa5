pub mod daemon;
pub mod health;
pub mod init;
pub mod services;
pub mod version;

pub use daemon::Daemon;
pub use health::Health;
pub use init::Init;
pub use services::Services;
pub use version::Version;
