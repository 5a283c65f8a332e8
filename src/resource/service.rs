use super::{ExternalFileResource, FileResource};
use crate::storage::StorageError;
use async_trait::async_trait;
use bytes::Bytes;
use std::{error::Error, pin::Pin};
use tokio::io::AsyncRead;
use url::Url;

/// Readable content of a stored file. Dropping it releases the underlying handle or connection.
pub type ByteStream = Pin<Box<dyn AsyncRead + Send>>;

pub type ServiceError = Box<dyn Error + Send + Sync>;

/// Resolves access tokens to the shares they grant.
#[async_trait]
pub trait ExternalFileResourceService: Send + Sync {
    async fn get_by_access_token(
        &self,
        access_token: &str,
    ) -> Result<Option<ExternalFileResource>, ServiceError>;

    /// Registers a share and returns the access token it is reachable under.
    async fn save(&self, resource: ExternalFileResource) -> Result<String, ServiceError>;
}

/// Metadata and content access for stored files.
#[async_trait]
pub trait FileResourceService: Send + Sync {
    async fn get(&self, uid: &str) -> Result<Option<FileResource>, ServiceError>;

    /// A time-limited URI the client can fetch the content from directly.
    /// `None` when the backing store cannot sign requests.
    async fn signed_get_uri(&self, uid: &str) -> Result<Option<Url>, ServiceError>;

    async fn open_content(&self, file_resource: &FileResource) -> Result<ByteStream, StorageError>;

    async fn save(&self, file_resource: FileResource, content: Bytes) -> Result<(), StorageError>;
}
