use super::{validate_key, ContentStore, StorageError};
use crate::resource::service::ByteStream;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use time::Duration;
use url::Url;

/// Content kept below a local directory. Local files are always streamed, never signed.
#[derive(Debug, Clone)]
pub struct FilesystemStore {
    root: PathBuf,
}

impl FilesystemStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, key: &str) -> Result<PathBuf, StorageError> {
        Ok(self.root.join(validate_key(key)?))
    }
}

#[async_trait]
impl ContentStore for FilesystemStore {
    fn name(&self) -> &'static str {
        "filesystem"
    }

    async fn open(&self, key: &str) -> Result<ByteStream, StorageError> {
        let file = tokio::fs::File::open(self.path(key)?).await?;

        // opening a directory succeeds on unix, reading it does not
        if !file.metadata().await?.is_file() {
            return Err(StorageError::Filesystem(std::io::Error::other(format!(
                "'{key}' is not a regular file"
            ))));
        }

        Ok(Box::pin(file))
    }

    async fn put(&self, key: &str, content: Bytes) -> Result<(), StorageError> {
        let path = self.path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &content).await?;

        tracing::debug!(key, bytes = content.len(), "stored content on disk");
        Ok(())
    }

    fn signed_get_uri(&self, _key: &str, _ttl: Duration) -> Option<Url> {
        None
    }
}
