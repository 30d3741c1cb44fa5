use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::path::{Scope, StorePath};
use super::provider::{RemoteStore, StoreError};

/// A message delivered through [`RemoteStore::notify`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub from: String,
    pub to: String,
    pub message: String,
}

/// Entries are keyed by (scope, owner, relative path)
type EntryKey = (Scope, String, String);

#[derive(Debug, Clone)]
enum Entry {
    Dir,
    File(Vec<u8>),
    /// Encrypted object: plaintext plus everyone allowed to read it
    Sealed {
        data: Vec<u8>,
        recipients: BTreeSet<String>,
    },
}

#[derive(Debug, Default)]
struct MemoryBackendInner {
    entries: BTreeMap<EntryKey, Entry>,
    notifications: Vec<Notification>,
}

/// In-memory stand-in for the shared remote filesystem.
///
/// One backend models the whole world; [`MemoryBackend::client`] hands out a
/// [`MemoryRemoteStore`] acting as a particular user. Private files are only
/// visible to their owner, public files to everyone, sealed objects only
/// decrypt for their recipients.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<RwLock<MemoryBackendInner>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store client acting as `username`
    pub fn client(&self, username: impl Into<String>) -> MemoryRemoteStore {
        MemoryRemoteStore {
            backend: self.clone(),
            username: username.into(),
            offline: Arc::new(AtomicBool::new(false)),
            calls: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Every message sent so far, oldest first
    pub fn notifications(&self) -> Vec<Notification> {
        self.inner.read().notifications.clone()
    }

    /// Recipients of a sealed object, if `path` (resolved for `owner`) holds one
    pub fn recipients(&self, owner: &str, path: &StorePath) -> Option<Vec<String>> {
        let key = (path.scope(), owner.to_string(), path.relative());
        match self.inner.read().entries.get(&key) {
            Some(Entry::Sealed { recipients, .. }) => Some(recipients.iter().cloned().collect()),
            _ => None,
        }
    }
}

/// A [`RemoteStore`] over a [`MemoryBackend`], acting as one user.
///
/// Counts every call it serves and can be switched offline, in which case
/// every call fails with a backend error. Tests use both to prove that a
/// read was answered from the cache.
#[derive(Debug, Clone)]
pub struct MemoryRemoteStore {
    backend: MemoryBackend,
    username: String,
    offline: Arc<AtomicBool>,
    calls: Arc<AtomicU64>,
}

impl MemoryRemoteStore {
    pub fn backend(&self) -> &MemoryBackend {
        &self.backend
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of store calls served (or refused) so far
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(anyhow::anyhow!(
                "memory store is offline"
            )));
        }
        Ok(())
    }

    fn key(&self, path: &StorePath) -> EntryKey {
        let owner = path.owner().unwrap_or(&self.username).to_string();
        (path.scope(), owner, path.relative())
    }

    fn visible(&self, key: &EntryKey) -> bool {
        key.0 == Scope::Public || key.1 == self.username
    }

    fn writable(&self, key: &EntryKey) -> Result<(), StoreError> {
        if key.1 != self.username {
            return Err(StoreError::Backend(anyhow::anyhow!(
                "{} cannot write into the namespace of {}",
                self.username,
                key.1
            )));
        }
        Ok(())
    }

    fn insert_parents(entries: &mut BTreeMap<EntryKey, Entry>, key: &EntryKey) {
        let (scope, owner, relative) = key;
        let segments: Vec<&str> = relative.split('/').collect();
        for end in 1..segments.len() {
            entries
                .entry((*scope, owner.clone(), segments[..end].join("/")))
                .or_insert(Entry::Dir);
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn exists(&self, path: &StorePath) -> Result<bool, StoreError> {
        self.begin()?;
        let key = self.key(path);
        if !self.visible(&key) {
            return Ok(false);
        }
        // The root of every namespace always exists
        if key.2.is_empty() {
            return Ok(true);
        }
        Ok(self.backend.inner.read().entries.contains_key(&key))
    }

    async fn list_dir(
        &self,
        path: &StorePath,
        pattern: Option<&str>,
    ) -> Result<Vec<String>, StoreError> {
        self.begin()?;
        let key = self.key(path);
        if !self.visible(&key) {
            return Err(StoreError::NotFound(path.clone()));
        }
        let pattern = pattern
            .map(glob::Pattern::new)
            .transpose()
            .map_err(|e| StoreError::Backend(e.into()))?;

        let inner = self.backend.inner.read();
        if !key.2.is_empty() && !matches!(inner.entries.get(&key), Some(Entry::Dir)) {
            return Err(StoreError::NotFound(path.clone()));
        }

        let prefix = if key.2.is_empty() {
            String::new()
        } else {
            format!("{}/", key.2)
        };
        let names = inner
            .entries
            .keys()
            .filter(|(scope, owner, _)| *scope == key.0 && *owner == key.1)
            .filter_map(|(_, _, relative)| relative.strip_prefix(&prefix))
            .filter(|name| !name.is_empty() && !name.contains('/'))
            .filter(|name| pattern.as_ref().map_or(true, |p| p.matches(name)))
            .map(str::to_string)
            .collect();

        Ok(names)
    }

    async fn read_file(&self, path: &StorePath) -> Result<Vec<u8>, StoreError> {
        self.begin()?;
        let key = self.key(path);
        if !self.visible(&key) {
            return Err(StoreError::NotFound(path.clone()));
        }
        match self.backend.inner.read().entries.get(&key) {
            Some(Entry::File(data)) => Ok(data.clone()),
            Some(Entry::Sealed { data, .. }) => {
                // What a reader without the key would see
                Ok(format!("BEGIN SEALED MESSAGE. {} bytes. END SEALED MESSAGE.", data.len())
                    .into_bytes())
            }
            Some(Entry::Dir) => Err(StoreError::Backend(anyhow::anyhow!(
                "{} is a directory",
                path
            ))),
            None => Err(StoreError::NotFound(path.clone())),
        }
    }

    async fn write_file(&self, path: &StorePath, data: &[u8]) -> Result<(), StoreError> {
        self.begin()?;
        let key = self.key(path);
        self.writable(&key)?;
        let mut inner = self.backend.inner.write();
        Self::insert_parents(&mut inner.entries, &key);
        inner.entries.insert(key, Entry::File(data.to_vec()));
        Ok(())
    }

    async fn mkdir(&self, path: &StorePath) -> Result<(), StoreError> {
        self.begin()?;
        let key = self.key(path);
        self.writable(&key)?;
        let mut inner = self.backend.inner.write();
        Self::insert_parents(&mut inner.entries, &key);
        inner.entries.entry(key).or_insert(Entry::Dir);
        Ok(())
    }

    async fn encrypt_for(
        &self,
        path: &StorePath,
        data: &[u8],
        recipients: &[String],
    ) -> Result<(), StoreError> {
        self.begin()?;
        if recipients.is_empty() {
            return Err(StoreError::Backend(anyhow::anyhow!(
                "encryption requires at least one recipient"
            )));
        }
        let key = self.key(path);
        self.writable(&key)?;

        let mut recipients: BTreeSet<String> = recipients.iter().cloned().collect();
        recipients.insert(self.username.clone());

        let mut inner = self.backend.inner.write();
        Self::insert_parents(&mut inner.entries, &key);
        inner.entries.insert(
            key,
            Entry::Sealed {
                data: data.to_vec(),
                recipients,
            },
        );
        Ok(())
    }

    async fn decrypt(&self, path: &StorePath) -> Result<Option<Vec<u8>>, StoreError> {
        self.begin()?;
        let key = self.key(path);
        match self.backend.inner.read().entries.get(&key) {
            Some(Entry::Sealed { data, recipients }) if recipients.contains(&self.username) => {
                Ok(Some(data.clone()))
            }
            _ => Ok(None),
        }
    }

    fn current_username(&self) -> &str {
        &self.username
    }

    async fn notify(&self, username: &str, message: &str) -> Result<(), StoreError> {
        self.begin()?;
        self.backend.inner.write().notifications.push(Notification {
            from: self.username.clone(),
            to: username.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_files_and_dirs() {
        let store = MemoryBackend::new().client("alice");
        let dir = StorePath::private().join("services").join("http@a.com@80");

        assert!(!store.exists(&dir).await.unwrap());
        assert!(store.ensure_dir(&dir).await.unwrap());
        assert!(!store.ensure_dir(&dir).await.unwrap());

        let file = dir.clone().join("info.json");
        store.write_file(&file, b"{}").await.unwrap();
        assert_eq!(store.read_file(&file).await.unwrap(), b"{}");

        let listed = store
            .list_dir(&StorePath::private().join("services"), None)
            .await
            .unwrap();
        assert_eq!(listed, vec!["http@a.com@80".to_string()]);

        let missing = StorePath::private().join("nope");
        assert!(store.read_file(&missing).await.unwrap_err().is_not_found());
        assert!(store.list_dir(&missing, None).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_list_dir_glob_filter() {
        let store = MemoryBackend::new().client("alice");
        let uids = StorePath::private().join("uids");
        store.write_file(&uids.clone().join("1.json"), b"{}").await.unwrap();
        store.write_file(&uids.clone().join("2.json"), b"{}").await.unwrap();
        store.write_file(&uids.clone().join("notes.txt"), b"").await.unwrap();

        let names = store.list_dir(&uids, Some("*.json")).await.unwrap();
        assert_eq!(names, vec!["1.json".to_string(), "2.json".to_string()]);
    }

    #[tokio::test]
    async fn test_private_namespace_is_owner_only() {
        let backend = MemoryBackend::new();
        let alice = backend.client("alice");
        let bob = backend.client("bob");

        let path = StorePath::private().join("secret.json");
        alice.write_file(&path, b"x").await.unwrap();

        let as_bob = path.clone().owned_by("alice");
        assert!(!bob.exists(&as_bob).await.unwrap());
        assert!(bob.read_file(&as_bob).await.unwrap_err().is_not_found());
        assert!(bob.write_file(&as_bob, b"y").await.is_err());
    }

    #[tokio::test]
    async fn test_sealed_objects_decrypt_for_recipients_only() {
        let backend = MemoryBackend::new();
        let alice = backend.client("alice");
        let bob = backend.client("bob");
        let carol = backend.client("carol");

        let path = StorePath::public().join("ids").join("abc");
        alice
            .encrypt_for(&path, b"Irvin", &["bob".to_string()])
            .await
            .unwrap();

        let foreign = path.clone().owned_by("alice");
        assert_eq!(alice.decrypt(&path).await.unwrap(), Some(b"Irvin".to_vec()));
        assert_eq!(bob.decrypt(&foreign).await.unwrap(), Some(b"Irvin".to_vec()));
        assert_eq!(carol.decrypt(&foreign).await.unwrap(), None);
        assert!(carol.exists(&foreign).await.unwrap());
        assert_ne!(carol.read_file(&foreign).await.unwrap(), b"Irvin");

        assert!(alice.encrypt_for(&path, b"x", &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_offline_store_fails_and_counts() {
        let store = MemoryBackend::new().client("alice");
        store.exists(&StorePath::private()).await.unwrap();
        store.set_offline(true);
        assert!(matches!(
            store.exists(&StorePath::private()).await,
            Err(StoreError::Backend(_))
        ));
        assert_eq!(store.calls(), 2);
    }

    #[tokio::test]
    async fn test_notify_records_messages() {
        let backend = MemoryBackend::new();
        backend.client("alice").notify("bob", "hi").await.unwrap();
        assert_eq!(
            backend.notifications(),
            vec![Notification {
                from: "alice".into(),
                to: "bob".into(),
                message: "hi".into(),
            }]
        );
    }
}
