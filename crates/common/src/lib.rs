/**
 * Write-through mirror of the remote namespace.
 *  Six independent namespaces, no eviction,
 *  valid for the lifetime of one process.
 */
pub mod cache;
/**
 * Content addressing for encrypted field values.
 *  sha256("origin:uid:field_name") is the only
 *  way anything locates a field object.
 */
pub mod field;
/**
 * Services, identities, field metadata and
 *  foreign mappings as they are persisted.
 */
pub mod identity;
/**
 * The identity/sharing manager. Everything the
 *  daemon exposes goes through here.
 */
pub mod manager;
/**
 * Origin key <-> filesystem name transform.
 */
pub mod origin;
/**
 * The remote store interface (encrypted, signed
 *  filesystem + messaging) and an in-memory
 *  implementation of it.
 */
pub mod store;

pub mod prelude {
    pub use crate::cache::{CacheStats, ParanoidCache};
    pub use crate::field::FieldHash;
    pub use crate::identity::{
        FieldMeta, ForeignMapping, Identity, ResolvedIdentity, ServiceInfo, SharingState,
    };
    pub use crate::manager::{
        share_request_uri, Manager, ManagerConfig, ParanoidError, PrefetchReport,
        ResolvedForeignMap,
    };
    pub use crate::origin::OriginError;
    pub use crate::store::{RemoteStore, Scope, StoreError, StorePath};
}
