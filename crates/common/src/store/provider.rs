use std::fmt::Debug;

use async_trait::async_trait;

use super::path::StorePath;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The path does not exist
    #[error("file does not exist: {0}")]
    NotFound(StorePath),
    /// The backing store or its transport failed
    #[error("remote store error: {0}")]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// An encrypted, signed remote filesystem with out-of-band messaging.
///
/// The manager never does cryptography or file I/O itself; everything goes
/// through these calls. Implementations must be cheap to share between
/// concurrent requests.
#[async_trait]
pub trait RemoteStore: Send + Sync + Debug + 'static {
    /// Whether anything exists at `path`. Never fails for absence.
    async fn exists(&self, path: &StorePath) -> Result<bool, StoreError>;

    /// Names of the entries directly under `path`
    ///
    /// # Arguments
    /// * `path` - The directory to list
    /// * `pattern` - Optional glob (e.g. `*.json`) names must match
    ///
    /// # Returns
    /// * `Ok(Vec<String>)` - Matching names, empty if the directory is empty
    /// * `Err(StoreError::NotFound)` - The directory does not exist
    async fn list_dir(
        &self,
        path: &StorePath,
        pattern: Option<&str>,
    ) -> Result<Vec<String>, StoreError>;

    /// Read a whole file. Fails with `NotFound` if absent.
    async fn read_file(&self, path: &StorePath) -> Result<Vec<u8>, StoreError>;

    /// Create or overwrite a file.
    async fn write_file(&self, path: &StorePath, data: &[u8]) -> Result<(), StoreError>;

    /// Create a directory.
    async fn mkdir(&self, path: &StorePath) -> Result<(), StoreError>;

    /// Make sure `path` exists as a directory.
    ///
    /// # Returns
    /// * `Ok(true)` - The directory was created by this call
    /// * `Ok(false)` - It already existed
    async fn ensure_dir(&self, path: &StorePath) -> Result<bool, StoreError> {
        if self.exists(path).await? {
            return Ok(false);
        }
        self.mkdir(path).await?;
        Ok(true)
    }

    /// Encrypt `data` for `recipients` and write the result to `path`.
    ///
    /// The writing principal can always decrypt objects it wrote.
    async fn encrypt_for(
        &self,
        path: &StorePath,
        data: &[u8],
        recipients: &[String],
    ) -> Result<(), StoreError>;

    /// Decrypt the object at `path`.
    ///
    /// Returns `Ok(None)` on any decryption or authorization failure,
    /// including the object being absent. Callers cannot tell "not shared with
    /// you" from "does not exist", and must not try to.
    async fn decrypt(&self, path: &StorePath) -> Result<Option<Vec<u8>>, StoreError>;

    /// The calling principal, resolved once when the client was built.
    fn current_username(&self) -> &str;

    /// Deliver a message to another user. Fire-and-forget.
    async fn notify(&self, username: &str, message: &str) -> Result<(), StoreError>;
}
