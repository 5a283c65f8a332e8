use super::{signing::UrlSigner, validate_key, ContentStore, StorageError};
use crate::resource::service::ByteStream;
use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use reqwest::Client;
use time::Duration;
use tokio_util::io::StreamReader;
use url::Url;

/// Object store reachable over HTTP, e.g. a bucket behind a CDN.
///
/// With a signer configured, clients are redirected to signed URLs and
/// never proxied through the gateway.
#[derive(Debug, Clone)]
pub struct RemoteStore {
    client: Client,
    base_url: Url,
    signer: Option<UrlSigner>,
}

impl RemoteStore {
    pub fn new(client: Client, base_url: Url, signer: Option<UrlSigner>) -> Self {
        // Url::join drops the last segment unless the base ends with a slash
        let base_url = match base_url.path().ends_with('/') {
            true => base_url,
            false => {
                let mut base_url = base_url;
                let path = format!("{}/", base_url.path());
                base_url.set_path(&path);
                base_url
            }
        };

        Self { client, base_url, signer }
    }

    fn object_url(&self, key: &str) -> Result<Url, StorageError> {
        self.base_url
            .join(validate_key(key)?)
            .map_err(|_| StorageError::InvalidKey(key.to_string()))
    }
}

#[async_trait]
impl ContentStore for RemoteStore {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn open(&self, key: &str) -> Result<ByteStream, StorageError> {
        let response = self.client.get(self.object_url(key)?).send().await?;

        if !response.status().is_success() {
            return Err(StorageError::Status {
                key: key.to_string(),
                status: response.status(),
            });
        }

        let stream = response.bytes_stream().map_err(std::io::Error::other);
        Ok(Box::pin(StreamReader::new(stream)))
    }

    async fn put(&self, key: &str, content: Bytes) -> Result<(), StorageError> {
        let response = self.client.put(self.object_url(key)?).body(content).send().await?;

        match response.status().is_success() {
            true => Ok(()),
            false => Err(StorageError::Status {
                key: key.to_string(),
                status: response.status(),
            }),
        }
    }

    fn signed_get_uri(&self, key: &str, ttl: Duration) -> Option<Url> {
        let signer = self.signer.as_ref()?;
        let url = self.object_url(key).ok()?;
        Some(signer.sign(url, key, ttl))
    }
}
