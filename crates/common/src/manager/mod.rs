//! # Identity/Sharing Manager
//!
//! The manager owns the layout of the remote store and keeps the cache in
//! step with it. Nothing above this layer builds a store path.
//!
//! ```text
//! <private>/services/<origin>/info.json
//! <private>/services/<origin>/uids/<uid>.json
//! <private>/services/<origin>/foreign_map.json
//! <public>/ids/<sha256("origin:uid:field_name")>
//! ```
//!
//! Lookups that find nothing return `None` or an empty list. Operations whose
//! preconditions do not hold fail with a [`ParanoidError`].
//!
//! ## Capability opacity
//!
//! A field value that exists but is not encrypted for the caller is reported
//! exactly like a field value that does not exist. This is intentional: a
//! caller must not be able to enumerate which fields other users hold.
//!
//! ## Concurrency
//!
//! Read-modify-write cycles on an identity (sharing, unsharing, metadata
//! writes, value writes) and on an origin's foreign map each hold a coarse
//! per-key lock, so two concurrent shares of the same field cannot lose an
//! update. The cache assumes this process is the only writer of the store.

mod error;
mod fields;
mod foreign;
mod locks;
mod prefetch;
mod sharing;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::ParanoidCache;
use crate::field::FieldHash;
use crate::identity::{Identity, ResolvedIdentity, ServiceInfo};
use crate::origin;
use crate::store::{RemoteStore, StorePath};

pub use error::ParanoidError;
pub use foreign::ResolvedForeignMap;
pub use prefetch::PrefetchReport;
pub use sharing::share_request_uri;

use locks::{LockKey, Locks};

const SERVICES_DIR: &str = "services";
const UIDS_DIR: &str = "uids";
const IDS_DIR: &str = "ids";
const INFO_FILE: &str = "info.json";
const FOREIGN_MAP_FILE: &str = "foreign_map.json";
const IDENTITY_EXT: &str = ".json";

const USERNAME_MIN_LEN: usize = 2;
const USERNAME_MAX_LEN: usize = 16;

#[derive(Debug, Clone, Default)]
pub struct ManagerConfig {
    /// Skip share notifications entirely
    pub disable_chat: bool,
}

#[derive(Debug, Clone)]
pub struct Manager {
    store: Arc<dyn RemoteStore>,
    cache: Arc<ParanoidCache>,
    locks: Arc<Locks>,
    config: ManagerConfig,
}

impl Manager {
    pub fn new(store: Arc<dyn RemoteStore>, config: ManagerConfig) -> Self {
        Self::with_cache(store, Arc::new(ParanoidCache::new()), config)
    }

    pub fn with_cache(
        store: Arc<dyn RemoteStore>,
        cache: Arc<ParanoidCache>,
        config: ManagerConfig,
    ) -> Self {
        Self {
            store,
            cache,
            locks: Arc::new(Locks::default()),
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn RemoteStore> {
        &self.store
    }

    pub fn cache(&self) -> &ParanoidCache {
        &self.cache
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// The principal this manager acts as
    pub fn username(&self) -> &str {
        self.store.current_username()
    }

    /// Make sure the top-level directories exist.
    ///
    /// # Returns
    /// The directories created by this call, empty on every run but the first
    pub async fn init_layout(&self) -> Result<Vec<StorePath>, ParanoidError> {
        let mut created = Vec::new();
        for path in [services_path(), StorePath::public().join(IDS_DIR)] {
            if self.store.ensure_dir(&path).await? {
                tracing::info!(path = %path, "initialized on first run");
                created.push(path);
            }
        }
        Ok(created)
    }

    pub async fn list_origins(&self) -> Result<Vec<String>, ParanoidError> {
        if let Some(origins) = self.cache.origins() {
            return Ok(origins);
        }

        let filenames = match self.store.list_dir(&services_path(), None).await {
            Ok(filenames) => filenames,
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let origins: Vec<String> = filenames
            .iter()
            .filter_map(|filename| match origin::from_filename(filename) {
                Ok(origin) => Some(origin),
                Err(e) => {
                    tracing::warn!(filename, error = %e, "skipping unrecognised service directory");
                    None
                }
            })
            .collect();

        self.cache.set_origins(origins.clone());
        Ok(origins)
    }

    pub async fn get_service(&self, origin: &str) -> Result<Option<ServiceInfo>, ParanoidError> {
        if let Some(info) = self.cache.service(origin) {
            return Ok(Some(info));
        }

        let dir = service_path(origin)?;
        if !self.store.exists(&dir).await? {
            return Ok(None);
        }
        let path = dir.join(INFO_FILE);
        if !self.store.exists(&path).await? {
            return Ok(None);
        }

        let Some(info) = self.read_json::<ServiceInfo>(&path).await? else {
            return Ok(None);
        };
        self.cache.set_service(origin, info.clone());
        Ok(Some(info))
    }

    /// Create or replace the service for `origin`.
    pub async fn put_service(&self, origin: &str, info: ServiceInfo) -> Result<(), ParanoidError> {
        let dir = service_path(origin)?;
        let created = self.store.ensure_dir(&dir).await?;
        self.store.ensure_dir(&dir.clone().join(UIDS_DIR)).await?;
        self.write_json(&dir.join(INFO_FILE), &info).await?;

        if created {
            // A directory we just made cannot hold identities yet
            self.cache.set_service_uids(origin, Vec::new());
        }
        self.cache.set_service(origin, info);

        tracing::info!(origin, created, "service saved");
        Ok(())
    }

    pub async fn list_service_uids(&self, origin: &str) -> Result<Vec<String>, ParanoidError> {
        if let Some(uids) = self.cache.service_uids(origin) {
            return Ok(uids);
        }

        let dir = service_path(origin)?;
        if !self.store.exists(&dir).await? {
            return Ok(Vec::new());
        }

        let filenames = match self
            .store
            .list_dir(&dir.join(UIDS_DIR), Some("*.json"))
            .await
        {
            Ok(filenames) => filenames,
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let uids: Vec<String> = filenames
            .iter()
            .filter_map(|filename| filename.strip_suffix(IDENTITY_EXT))
            .map(str::to_string)
            .collect();

        self.cache.set_service_uids(origin, uids.clone());
        Ok(uids)
    }

    pub async fn get_service_identity(
        &self,
        origin: &str,
        uid: &str,
    ) -> Result<Option<Identity>, ParanoidError> {
        if let Some(identity) = self.cache.identity(origin, uid) {
            return Ok(Some(identity));
        }

        let path = identity_path(origin, uid)?;
        if !self.store.exists(&path).await? {
            return Ok(None);
        }

        let Some(identity) = self.read_json::<Identity>(&path).await? else {
            return Ok(None);
        };
        self.cache.set_identity(origin, uid, identity.clone());
        Ok(Some(identity))
    }

    /// Write identity metadata. The service must already exist; the uid may
    /// or may not.
    pub async fn set_service_identity(
        &self,
        origin: &str,
        uid: &str,
        identity: &Identity,
    ) -> Result<(), ParanoidError> {
        let _guard = self.locks.lock(LockKey::identity(origin, uid)).await;
        self.write_identity(origin, uid, identity).await
    }

    /// Like [`Manager::set_service_identity`], but refuses to replace an
    /// identity that already exists.
    pub async fn create_service_identity(
        &self,
        origin: &str,
        uid: &str,
        identity: &Identity,
    ) -> Result<(), ParanoidError> {
        let _guard = self.locks.lock(LockKey::identity(origin, uid)).await;
        if self.get_service_identity(origin, uid).await?.is_some() {
            return Err(ParanoidError::IdentityExists {
                origin: origin.to_string(),
                uid: uid.to_string(),
            });
        }
        self.write_identity(origin, uid, identity).await
    }

    /// Identity metadata plus every field value the caller can decrypt.
    pub async fn resolve_identity(
        &self,
        origin: &str,
        uid: &str,
    ) -> Result<Option<ResolvedIdentity>, ParanoidError> {
        let Some(identity) = self.get_service_identity(origin, uid).await? else {
            return Ok(None);
        };

        let mut map = BTreeMap::new();
        for field_name in identity.field_names() {
            if let Some(value) = self.decrypt_field(origin, uid, field_name).await? {
                map.insert(field_name.to_string(), value);
            }
        }

        Ok(Some(ResolvedIdentity { identity, map }))
    }

    /// Callers must hold the identity lock
    async fn write_identity(
        &self,
        origin: &str,
        uid: &str,
        identity: &Identity,
    ) -> Result<(), ParanoidError> {
        if self.get_service(origin).await?.is_none() {
            return Err(ParanoidError::ServiceNotFound(origin.to_string()));
        }

        let path = identity_path(origin, uid)?;
        self.store.ensure_dir(&uids_path(origin)?).await?;
        self.write_json(&path, identity).await?;
        self.cache.set_identity(origin, uid, identity.clone());

        tracing::debug!(origin, uid, "service identity saved");
        Ok(())
    }

    async fn require_identity(&self, origin: &str, uid: &str) -> Result<Identity, ParanoidError> {
        self.get_service_identity(origin, uid)
            .await?
            .ok_or_else(|| ParanoidError::IdentityNotFound {
                origin: origin.to_string(),
                uid: uid.to_string(),
            })
    }

    /// Read and decode a JSON file. Missing or undecodable files are absent.
    async fn read_json<T: DeserializeOwned>(
        &self,
        path: &StorePath,
    ) -> Result<Option<T>, ParanoidError> {
        let bytes = match self.store.read_file(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "could not decode json");
                Ok(None)
            }
        }
    }

    async fn write_json<T: Serialize + ?Sized>(
        &self,
        path: &StorePath,
        value: &T,
    ) -> Result<(), ParanoidError> {
        let bytes = serde_json::to_vec(value)?;
        self.store.write_file(path, &bytes).await?;
        Ok(())
    }
}

/// Keybase usernames are 2 to 16 ASCII letters, digits or underscores and do
/// not start with an underscore. Anything else never reaches the store.
pub(crate) fn validate_username(username: &str) -> Result<(), ParanoidError> {
    let well_formed = (USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&username.len())
        && !username.starts_with('_')
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !well_formed {
        return Err(ParanoidError::InvalidUsername(username.to_string()));
    }
    Ok(())
}

fn services_path() -> StorePath {
    StorePath::private().join(SERVICES_DIR)
}

fn service_path(origin: &str) -> Result<StorePath, ParanoidError> {
    Ok(services_path().join(origin::to_filename(origin)?))
}

fn uids_path(origin: &str) -> Result<StorePath, ParanoidError> {
    Ok(service_path(origin)?.join(UIDS_DIR))
}

fn identity_path(origin: &str, uid: &str) -> Result<StorePath, ParanoidError> {
    if uid.is_empty() || uid.contains('/') {
        return Err(ParanoidError::InvalidUid(uid.to_string()));
    }
    Ok(uids_path(origin)?.join(format!("{}{}", uid, IDENTITY_EXT)))
}

fn foreign_map_path(origin: &str) -> Result<StorePath, ParanoidError> {
    Ok(service_path(origin)?.join(FOREIGN_MAP_FILE))
}

/// Where the value of (origin, uid, field_name) lives. `owner` is `None` for
/// the caller's own namespace.
fn field_path(owner: Option<&str>, origin: &str, uid: &str, field_name: &str) -> StorePath {
    let hash = FieldHash::new(origin, uid, field_name);
    let root = match owner {
        Some(owner) => StorePath::public().owned_by(owner),
        None => StorePath::public(),
    };
    root.join(IDS_DIR).join(hash.to_hex())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        assert_eq!(
            service_path("http://a.com:80").unwrap().relative(),
            "services/http@a.com@80"
        );
        assert_eq!(
            identity_path("http://a.com:80", "1").unwrap().relative(),
            "services/http@a.com@80/uids/1.json"
        );
        assert_eq!(
            foreign_map_path("http://a.com:80").unwrap().relative(),
            "services/http@a.com@80/foreign_map.json"
        );

        let own = field_path(None, "http://a.com:80", "1", "email");
        assert_eq!(
            own.relative(),
            format!("ids/{}", FieldHash::new("http://a.com:80", "1", "email"))
        );
        assert_eq!(own.owner(), None);

        let foreign = field_path(Some("malte"), "http://a.com:80", "1", "email");
        assert_eq!(foreign.owner(), Some("malte"));
        assert_eq!(foreign.relative(), own.relative());
    }

    #[test]
    fn test_validate_username() {
        for ok in ["alice", "bob", "max_42", "Irvin", "ab"] {
            assert!(validate_username(ok).is_ok(), "{ok}");
        }
        for bad in [
            "",
            "a",
            "--infile=/home/alice/.ssh/id_rsa",
            "--help",
            "-x",
            "_alice",
            "../bob",
            "alice bob",
            "abcdefghijklmnopq",
            "al\u{e9}",
        ] {
            assert!(
                matches!(validate_username(bad), Err(ParanoidError::InvalidUsername(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_rejects_path_breaking_uids() {
        assert!(matches!(
            identity_path("http://a.com:80", "../x"),
            Err(ParanoidError::InvalidUid(_))
        ));
        assert!(matches!(
            identity_path("http://a.com:80", ""),
            Err(ParanoidError::InvalidUid(_))
        ));
        assert!(matches!(
            identity_path("a.com", "1"),
            Err(ParanoidError::InvalidOrigin(_))
        ));
    }
}
