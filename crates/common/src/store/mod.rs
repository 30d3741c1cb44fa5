mod memory;
mod path;
mod provider;

pub use memory::{MemoryBackend, MemoryRemoteStore, Notification};
pub use path::{Scope, StorePath};
pub use provider::{RemoteStore, StoreError};
