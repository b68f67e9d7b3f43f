//! In-process object store.
//!
//! Objects live in a map guarded by a tokio mutex. Every call is appended to
//! an operation log so callers can inspect the exact I/O sequence a request
//! performed.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::Mutex;

use super::{ObjectStore, StorageError, StorageResult};

/// One recorded store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    /// A download of the given path.
    Download(String),
    /// An upload to the given path.
    Upload(String),
}

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

#[derive(Debug, Default)]
struct Inner {
    objects: BTreeMap<String, StoredObject>,
    log: Vec<StoreOp>,
    failing_reads: HashSet<String>,
    failing_writes: bool,
}

/// Object store backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an object without recording an operation.
    pub async fn insert(&self, path: impl Into<String>, bytes: Vec<u8>) {
        let mut inner = self.inner.lock().await;
        inner.objects.insert(
            path.into(),
            StoredObject {
                bytes,
                content_type: super::PDF_CONTENT_TYPE.to_string(),
            },
        );
    }

    /// Make every download of `path` fail, even if the object exists.
    pub async fn fail_reads_of(&self, path: impl Into<String>) {
        self.inner.lock().await.failing_reads.insert(path.into());
    }

    /// Make every upload fail.
    pub async fn fail_writes(&self) {
        self.inner.lock().await.failing_writes = true;
    }

    /// Content of the object at `path`, if present.
    pub async fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.inner
            .lock()
            .await
            .objects
            .get(path)
            .map(|o| o.bytes.clone())
    }

    /// Content type recorded for the object at `path`, if present.
    pub async fn content_type(&self, path: &str) -> Option<String> {
        self.inner
            .lock()
            .await
            .objects
            .get(path)
            .map(|o| o.content_type.clone())
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.objects.len()
    }

    /// Whether the store holds no objects.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Every store call performed so far, in order.
    pub async fn operations(&self) -> Vec<StoreOp> {
        self.inner.lock().await.log.clone()
    }

    /// Paths of all uploads performed so far, in order.
    pub async fn uploads(&self) -> Vec<String> {
        self.operations()
            .await
            .into_iter()
            .filter_map(|op| match op {
                StoreOp::Upload(path) => Some(path),
                StoreOp::Download(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn download(&self, path: &str) -> StorageResult<Vec<u8>> {
        let mut inner = self.inner.lock().await;
        inner.log.push(StoreOp::Download(path.to_string()));

        if inner.failing_reads.contains(path) {
            return Err(StorageError::read(path, "simulated read failure"));
        }

        inner
            .objects
            .get(path)
            .map(|o| o.bytes.clone())
            .ok_or_else(|| StorageError::read(path, "Object not found"))
    }

    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        overwrite: bool,
    ) -> StorageResult<()> {
        let mut inner = self.inner.lock().await;
        inner.log.push(StoreOp::Upload(path.to_string()));

        if inner.failing_writes {
            return Err(StorageError::write(path, "simulated write failure"));
        }

        if !overwrite && inner.objects.contains_key(path) {
            return Err(StorageError::write(path, "The resource already exists"));
        }

        inner.objects.insert(
            path.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }
}
