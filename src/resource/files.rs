use super::{
    service::{ByteStream, FileResourceService, ServiceError},
    FileResource,
};
use crate::storage::{ContentStore, StorageError};
use async_trait::async_trait;
use bytes::Bytes;
use std::{collections::HashMap, sync::Arc, sync::RwLock};
use time::Duration;
use url::Url;

/// File metadata held in memory, content delegated to a `ContentStore`.
pub struct StoredFileResources {
    files: RwLock<HashMap<String, FileResource>>,
    store: Arc<dyn ContentStore>,
    signed_url_ttl: Duration,
}

impl StoredFileResources {
    pub fn new(store: Arc<dyn ContentStore>, signed_url_ttl: Duration) -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
            store,
            signed_url_ttl,
        }
    }

    /// Registers metadata for content that already sits in the store.
    pub fn register(&self, file_resource: FileResource) -> Result<(), ServiceError> {
        let mut files = self.files.write().map_err(|_| "file registry lock poisoned")?;
        files.insert(file_resource.uid.clone(), file_resource);
        Ok(())
    }
}

#[async_trait]
impl FileResourceService for StoredFileResources {
    async fn get(&self, uid: &str) -> Result<Option<FileResource>, ServiceError> {
        let files = self.files.read().map_err(|_| "file registry lock poisoned")?;
        Ok(files.get(uid).cloned())
    }

    async fn signed_get_uri(&self, uid: &str) -> Result<Option<Url>, ServiceError> {
        let Some(file_resource) = self.get(uid).await? else {
            return Ok(None);
        };

        Ok(self
            .store
            .signed_get_uri(&file_resource.storage_key, self.signed_url_ttl))
    }

    async fn open_content(&self, file_resource: &FileResource) -> Result<ByteStream, StorageError> {
        tracing::debug!(
            uid = %file_resource.uid,
            store = self.store.name(),
            "opening content"
        );
        self.store.open(&file_resource.storage_key).await
    }

    async fn save(&self, file_resource: FileResource, content: Bytes) -> Result<(), StorageError> {
        self.store.put(&file_resource.storage_key, content).await?;
        self.register(file_resource)
            .map_err(|error| StorageError::Filesystem(std::io::Error::other(error)))
    }
}
