use crate::resource::service::ByteStream;
use async_trait::async_trait;
use bytes::Bytes;
use time::Duration;
use url::Url;

pub mod filesystem;
pub mod remote;
pub mod signing;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("network error while talking to the storage backend: {0}")]
    Network(#[from] reqwest::Error),

    #[error("storage backend answered {status} for '{key}'")]
    Status { key: String, status: reqwest::StatusCode },

    #[error("file system error: {0}")]
    Filesystem(#[from] std::io::Error),

    #[error("invalid storage key '{0}'")]
    InvalidKey(String),
}

impl StorageError {
    /// Classifies a failed read on an opened content stream. Remote streams carry the
    /// HTTP client error inside the `io::Error`.
    pub fn from_read(error: std::io::Error) -> Self {
        if !error.get_ref().is_some_and(|inner| inner.is::<reqwest::Error>()) {
            return Self::Filesystem(error);
        }

        match error.into_inner().map(|inner| inner.downcast::<reqwest::Error>()) {
            Some(Ok(network)) => Self::Network(*network),
            Some(Err(other)) => Self::Filesystem(std::io::Error::other(other)),
            None => Self::Filesystem(std::io::Error::other("content stream failed")),
        }
    }

    /// Human readable root cause, used as developer message on failed downloads.
    pub fn cause(&self) -> &'static str {
        match self {
            Self::Network(_) | Self::Status { .. } => {
                "The storage backend could not be reached or refused the request (network related)."
            }
            Self::Filesystem(_) | Self::InvalidKey(_) => {
                "The file could not be read from the storage backend (file system related)."
            }
        }
    }
}

/// Backend holding the bytes of file resources, addressed by storage key.
#[async_trait]
pub trait ContentStore: Send + Sync {
    fn name(&self) -> &'static str;

    async fn open(&self, key: &str) -> Result<ByteStream, StorageError>;

    async fn put(&self, key: &str, content: Bytes) -> Result<(), StorageError>;

    /// Stores that can't sign requests return `None`.
    fn signed_get_uri(&self, key: &str, ttl: Duration) -> Option<Url>;
}

/// Rejects keys that would escape the store's namespace.
pub(crate) fn validate_key(key: &str) -> Result<&str, StorageError> {
    let invalid = key.is_empty()
        || key.starts_with('/')
        || key.contains(['\\', '?', '#'])
        || key.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..");

    match invalid {
        true => Err(StorageError::InvalidKey(key.to_string())),
        false => Ok(key),
    }
}
