//! Object store for asset bytes.
//!
//! [`ObjectStore`] is the seam between the core and wherever bytes live. It
//! mints signed upload/download URLs and reads or deletes objects.
//!
//! [`InMemoryObjectStore`] keeps small objects in memory as [`Bytes`] and
//! spills larger ones to temporary files on disk. Temp files are removed
//! when the last reference to the entry is dropped (via the [`Drop`]
//! implementation on [`StoredData`]). Its URLs point at the server's own
//! `/storage/...` data plane.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, trace, warn};

use assetgate_auth::UrlSigner;

/// Default maximum object size (in bytes) kept in memory before spilling to
/// disk. The default is 512 KiB.
const DEFAULT_MAX_MEMORY_SIZE: usize = 524_288;

/// Composite key identifying a stored object: `(bucket, path)`.
type StorageKey = (String, String);

/// Errors raised by an [`ObjectStore`].
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Nothing is stored at the path.
    #[error("Object not found: {bucket}/{path}")]
    NotFound {
        /// Bucket that was read.
        bucket: String,
        /// Path that was read.
        path: String,
    },

    /// An object is already stored at the path.
    #[error("Object already exists: {bucket}/{path}")]
    AlreadyExists {
        /// Bucket that was written.
        bucket: String,
        /// Path that was written.
        path: String,
    },

    /// The store could not be reached or failed internally.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Where asset bytes live.
#[async_trait]
pub trait ObjectStore: Send + Sync + fmt::Debug {
    /// Mint a URL the client may `PUT` the object to until `expires_at`.
    async fn create_upload_url(
        &self,
        path: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String, StorageError>;

    /// Mint a URL the client may `GET` the object from until `expires_at`.
    async fn create_download_url(
        &self,
        path: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String, StorageError>;

    /// Read the full object.
    async fn download(&self, path: &str) -> Result<Bytes, StorageError>;

    /// Remove the object. Removing a missing object is not an error.
    async fn delete(&self, path: &str) -> Result<(), StorageError>;
}

// ---------------------------------------------------------------------------
// StoredData
// ---------------------------------------------------------------------------

/// Internal representation of stored data.
enum StoredData {
    /// Small objects kept entirely in memory.
    InMemory {
        /// The raw object bytes.
        data: Bytes,
    },
    /// Large objects spilled to a temp file.
    OnDisk {
        /// Path to the temporary file.
        path: PathBuf,
        /// Size of the stored data in bytes.
        size: u64,
    },
}

impl fmt::Debug for StoredData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InMemory { data } => f
                .debug_struct("InMemory")
                .field("size", &data.len())
                .finish(),
            Self::OnDisk { path, size } => f
                .debug_struct("OnDisk")
                .field("path", path)
                .field("size", size)
                .finish(),
        }
    }
}

impl Drop for StoredData {
    fn drop(&mut self) {
        if let Self::OnDisk { path, .. } = self {
            if let Err(e) = std::fs::remove_file(path.as_path()) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "failed to remove temp file");
                }
            } else {
                trace!(path = %path.display(), "removed temp file");
            }
        }
    }
}

impl StoredData {
    async fn read_all(&self) -> Result<Bytes, StorageError> {
        match self {
            Self::InMemory { data } => Ok(data.clone()),
            Self::OnDisk { path, .. } => {
                let data = tokio::fs::read(path).await.map_err(|e| {
                    StorageError::Internal(anyhow::anyhow!(
                        "failed to read temp file {}: {e}",
                        path.display()
                    ))
                })?;
                Ok(Bytes::from(data))
            }
        }
    }

    fn size(&self) -> u64 {
        match self {
            Self::InMemory { data } => data.len() as u64,
            Self::OnDisk { size, .. } => *size,
        }
    }
}

// ---------------------------------------------------------------------------
// InMemoryObjectStore
// ---------------------------------------------------------------------------

/// In-memory object store with spillover to temp files and HMAC-signed URLs.
///
/// # Examples
///
/// ```
/// use assetgate_auth::UrlSigner;
/// use assetgate_core::storage::{InMemoryObjectStore, ObjectStore};
/// use bytes::Bytes;
///
/// # tokio_test::block_on(async {
/// let store = InMemoryObjectStore::new("private", "http://localhost:4000", UrlSigner::new("k"), 1024);
/// store.create_object("private", "a.txt", Bytes::from("hello")).await.unwrap();
/// assert_eq!(store.download("a.txt").await.unwrap().as_ref(), b"hello");
/// # });
/// ```
pub struct InMemoryObjectStore {
    /// Bucket served through the [`ObjectStore`] interface.
    bucket: String,
    /// Base URL prefixed to minted URLs.
    base_url: String,
    /// Signs minted URLs.
    signer: UrlSigner,
    /// Object data keyed by `(bucket, path)`.
    objects: DashMap<StorageKey, Arc<StoredData>>,
    /// Max size in bytes for in-memory storage before spilling to disk.
    max_memory_size: usize,
}

impl fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("bucket", &self.bucket)
            .field("base_url", &self.base_url)
            .field("objects_count", &self.objects.len())
            .field("max_memory_size", &self.max_memory_size)
            .finish_non_exhaustive()
    }
}

impl InMemoryObjectStore {
    /// Create a store serving `bucket`, minting URLs under `base_url`.
    #[must_use]
    pub fn new(
        bucket: impl Into<String>,
        base_url: impl Into<String>,
        signer: UrlSigner,
        max_memory_size: usize,
    ) -> Self {
        let bucket = bucket.into();
        debug!(bucket, max_memory_size, "creating InMemoryObjectStore");
        Self {
            bucket,
            base_url: base_url.into(),
            signer,
            objects: DashMap::new(),
            max_memory_size,
        }
    }

    /// A store with default spill threshold, for tests and local runs.
    #[must_use]
    pub fn with_defaults(bucket: impl Into<String>, signer: UrlSigner) -> Self {
        Self::new(bucket, "http://localhost:4000", signer, DEFAULT_MAX_MEMORY_SIZE)
    }

    /// Bucket served through the [`ObjectStore`] interface.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Store object data at a key nothing is stored at yet.
    ///
    /// Objects are write-once: a second write to the same key is refused and
    /// the stored bytes stay as they were. Returns the stored size.
    ///
    /// # Errors
    ///
    /// - [`StorageError::AlreadyExists`] if the key is taken.
    /// - [`StorageError::Internal`] if a temp file cannot be written.
    pub async fn create_object(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
    ) -> Result<u64, StorageError> {
        let key = (bucket.to_owned(), path.to_owned());
        let already_exists = || StorageError::AlreadyExists {
            bucket: bucket.to_owned(),
            path: path.to_owned(),
        };
        if self.objects.contains_key(&key) {
            debug!(bucket, path, "refusing to overwrite stored object");
            return Err(already_exists());
        }

        let stored = self.store_data(data).await?;
        let size = stored.size();
        match self.objects.entry(key) {
            Entry::Occupied(_) => {
                debug!(bucket, path, "lost race to create object");
                Err(already_exists())
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(stored));
                trace!(bucket, path, size, "stored object data");
                Ok(size)
            }
        }
    }

    /// Read object data.
    ///
    /// # Errors
    ///
    /// - [`StorageError::NotFound`] if the object is not found.
    /// - [`StorageError::Internal`] if the on-disk file cannot be read.
    pub async fn read_object(&self, bucket: &str, path: &str) -> Result<Bytes, StorageError> {
        let entry = self
            .objects
            .get(&(bucket.to_owned(), path.to_owned()))
            .map(|e| Arc::clone(e.value()))
            .ok_or_else(|| StorageError::NotFound {
                bucket: bucket.to_owned(),
                path: path.to_owned(),
            })?;
        entry.read_all().await
    }

    /// Delete object data. No-op if the object does not exist.
    pub fn delete_object(&self, bucket: &str, path: &str) {
        if self
            .objects
            .remove(&(bucket.to_owned(), path.to_owned()))
            .is_some()
        {
            trace!(bucket, path, "deleted object data");
        }
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn sign(&self, method: &http::Method, path: &str, expires_at: DateTime<Utc>) -> String {
        self.signer
            .sign_url(&self.base_url, method, &self.bucket, path, expires_at)
    }

    async fn store_data(&self, data: Bytes) -> Result<StoredData, StorageError> {
        if data.len() > self.max_memory_size {
            Self::spill_to_disk(&data).await
        } else {
            Ok(StoredData::InMemory { data })
        }
    }

    async fn spill_to_disk(data: &[u8]) -> Result<StoredData, StorageError> {
        let size = data.len() as u64;

        // Keep the file past the handle's lifetime; cleanup is ours via Drop.
        let temp = tempfile::NamedTempFile::new().map_err(|e| {
            StorageError::Internal(anyhow::anyhow!("failed to create temp file: {e}"))
        })?;
        let (_, path) = temp.keep().map_err(|e| {
            StorageError::Internal(anyhow::anyhow!("failed to keep temp file: {e}"))
        })?;

        tokio::fs::write(&path, data).await.map_err(|e| {
            StorageError::Internal(anyhow::anyhow!(
                "failed to write temp file {}: {e}",
                path.display()
            ))
        })?;

        trace!(path = %path.display(), size, "spilled data to disk");
        Ok(StoredData::OnDisk { path, size })
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn create_upload_url(
        &self,
        path: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String, StorageError> {
        Ok(self.sign(&http::Method::PUT, path, expires_at))
    }

    async fn create_download_url(
        &self,
        path: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String, StorageError> {
        Ok(self.sign(&http::Method::GET, path, expires_at))
    }

    async fn download(&self, path: &str) -> Result<Bytes, StorageError> {
        self.read_object(&self.bucket, path).await
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.delete_object(&self.bucket, path);
        Ok(())
    }
}
