//! In-process blob store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::client::BlobStore;
use super::error::{StoreError, StoreResult};

/// An uploaded object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Bucket-scoped in-memory blob store.
#[derive(Clone)]
pub struct MemoryBlobStore {
    base_url: String,
    buckets: Arc<RwLock<HashMap<String, HashMap<String, StoredObject>>>>,
}

impl MemoryBlobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            buckets: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Provision an empty bucket.
    pub fn create_bucket(&self, bucket: impl Into<String>) {
        self.buckets.write().entry(bucket.into()).or_default();
    }

    /// Fetch an uploaded object.
    pub fn object(&self, bucket: &str, path: &str) -> Option<StoredObject> {
        self.buckets.read().get(bucket)?.get(path).cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StoreResult<String> {
        {
            let mut buckets = self.buckets.write();
            let objects = buckets
                .get_mut(bucket)
                .ok_or_else(|| StoreError::BucketNotFound {
                    bucket: bucket.to_string(),
                })?;
            objects.insert(
                path.to_string(),
                StoredObject {
                    bytes,
                    content_type: content_type.to_string(),
                },
            );
        }
        Ok(self.public_url(bucket, path))
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            bucket,
            path.trim_start_matches('/')
        )
    }
}
