//! Write-through mirror of the remote namespace.
//!
//! Six independent namespaces, keyed exactly like the store's logical paths:
//!
//! - the origin list
//! - service info per origin
//! - uid list per origin
//! - identity metadata per (origin, uid)
//! - foreign map per origin
//! - decrypted field values per (owner, origin, uid, field_name)
//!
//! Reads return `Some` on a hit and `None` on a miss. Writes are made by the
//! manager right after the matching remote write succeeded. Nothing is ever
//! evicted or expired; the cache is only correct while this process is the
//! sole writer of the store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::identity::{ForeignMapping, Identity, ServiceInfo};

#[derive(Debug, Default)]
struct CacheInner {
    origins: Option<Vec<String>>,
    services: HashMap<String, ServiceInfo>,
    uids: HashMap<String, Vec<String>>,
    identities: HashMap<(String, String), Identity>,
    foreign_maps: HashMap<String, Vec<ForeignMapping>>,
    fields: HashMap<FieldKey, String>,
}

/// Counters for debugging and the prefetch report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub identities: usize,
    pub fields: usize,
}

#[derive(Debug, Default)]
pub struct ParanoidCache {
    inner: RwLock<CacheInner>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Key of a decrypted value. Values read from another user's namespace carry
/// that user as `owner` so they never shadow the caller's own fields.
///
/// Kept as separate members: uids and field names may contain any separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FieldKey {
    owner: Option<String>,
    origin: String,
    uid: String,
    field_name: String,
}

impl FieldKey {
    fn new(owner: Option<&str>, origin: &str, uid: &str, field_name: &str) -> Self {
        Self {
            owner: owner.map(str::to_string),
            origin: origin.to_string(),
            uid: uid.to_string(),
            field_name: field_name.to_string(),
        }
    }
}

impl ParanoidCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn record<T>(&self, value: Option<T>) -> Option<T> {
        match value {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        value
    }

    pub fn origins(&self) -> Option<Vec<String>> {
        self.record(self.inner.read().origins.clone())
    }

    /// Replace the origin list with a complete listing
    pub fn set_origins(&self, origins: Vec<String>) {
        let mut deduped: Vec<String> = Vec::with_capacity(origins.len());
        for origin in origins {
            if !deduped.contains(&origin) {
                deduped.push(origin);
            }
        }
        self.inner.write().origins = Some(deduped);
    }

    /// Extend the origin list, if it has been loaded
    pub fn add_origin(&self, origin: &str) {
        if let Some(origins) = self.inner.write().origins.as_mut() {
            if !origins.iter().any(|o| o == origin) {
                origins.push(origin.to_string());
            }
        }
    }

    pub fn service(&self, origin: &str) -> Option<ServiceInfo> {
        self.record(self.inner.read().services.get(origin).cloned())
    }

    pub fn set_service(&self, origin: &str, info: ServiceInfo) {
        self.add_origin(origin);
        self.inner.write().services.insert(origin.to_string(), info);
    }

    pub fn service_uids(&self, origin: &str) -> Option<Vec<String>> {
        self.record(self.inner.read().uids.get(origin).cloned())
    }

    /// Replace an origin's uid list with a complete listing
    pub fn set_service_uids(&self, origin: &str, uids: Vec<String>) {
        self.inner.write().uids.insert(origin.to_string(), uids);
    }

    /// Extend an origin's uid list, if it has been loaded
    pub fn add_service_uid(&self, origin: &str, uid: &str) {
        if let Some(uids) = self.inner.write().uids.get_mut(origin) {
            if !uids.iter().any(|u| u == uid) {
                uids.push(uid.to_string());
            }
        }
    }

    pub fn identity(&self, origin: &str, uid: &str) -> Option<Identity> {
        let key = (origin.to_string(), uid.to_string());
        self.record(self.inner.read().identities.get(&key).cloned())
    }

    pub fn set_identity(&self, origin: &str, uid: &str, identity: Identity) {
        self.add_service_uid(origin, uid);
        self.inner
            .write()
            .identities
            .insert((origin.to_string(), uid.to_string()), identity);
    }

    pub fn foreign_map(&self, origin: &str) -> Option<Vec<ForeignMapping>> {
        self.record(self.inner.read().foreign_maps.get(origin).cloned())
    }

    pub fn set_foreign_map(&self, origin: &str, foreign_map: Vec<ForeignMapping>) {
        self.inner
            .write()
            .foreign_maps
            .insert(origin.to_string(), foreign_map);
    }

    /// A decrypted value. `owner` is `None` for the caller's own fields.
    pub fn field(
        &self,
        owner: Option<&str>,
        origin: &str,
        uid: &str,
        field_name: &str,
    ) -> Option<String> {
        let key = FieldKey::new(owner, origin, uid, field_name);
        self.record(self.inner.read().fields.get(&key).cloned())
    }

    pub fn set_field(
        &self,
        owner: Option<&str>,
        origin: &str,
        uid: &str,
        field_name: &str,
        value: String,
    ) {
        let key = FieldKey::new(owner, origin, uid, field_name);
        self.inner.write().fields.insert(key, value);
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.read();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            identities: inner.identities.len(),
            fields: inner.fields.len(),
        }
    }
}
