//! Test scaffolding: registers a small text file under a chosen access token.

use super::{
    service::{ExternalFileResourceService, FileResourceService, ServiceError},
    ExternalFileResource, FileResource, FileResourceDomain,
};
use crate::storage::signing::b64;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::io::Write;

/// Writes `"<key> content"` to a temporary file, registers it in the `EXTERNAL` domain and
/// shares it under `key` without expiry. Returns the access token.
pub async fn create_test_resource(
    key: &str,
    shares: &dyn ExternalFileResourceService,
    files: &dyn FileResourceService,
) -> Result<String, ServiceError> {
    let mut temp = tempfile::NamedTempFile::new()?;
    write!(temp, "{key} content")?;
    temp.flush()?;

    let content = Bytes::from(std::fs::read(temp.path())?);
    let file_resource = FileResource {
        uid: uuid::Uuid::new_v4().simple().to_string(),
        name: format!("{key}.txt"),
        content_type: "text/plain".to_string(),
        content_length: content.len() as u64,
        domain: FileResourceDomain::External,
        storage_key: format!("external/{key}"),
        content_hash: Some(b64(Sha256::digest(&content))),
    };

    files.save(file_resource.clone(), content).await?;

    let access_token = shares
        .save(ExternalFileResource {
            access_token: key.to_string(),
            name: key.to_string(),
            expires: None,
            file_resource,
        })
        .await?;

    log::info!("{access_token} :: AccessToken");
    Ok(access_token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{files::StoredFileResources, memory::InMemoryExternalFileResources};
    use crate::storage::filesystem::FilesystemStore;
    use std::sync::Arc;
    use time::Duration;

    #[tokio::test]
    async fn registers_a_servable_share() {
        let dir = tempfile::tempdir().unwrap();
        let shares = InMemoryExternalFileResources::new();
        let files = StoredFileResources::new(Arc::new(FilesystemStore::new(dir.path())), Duration::minutes(5));

        let token = create_test_resource("demo", &shares, &files).await.unwrap();

        let share = shares.get_by_access_token(&token).await.unwrap().unwrap();
        assert!(share.is_public());
        assert_eq!(share.expires, None);
        assert_eq!(share.file_resource.name, "demo.txt");
        assert_eq!(share.file_resource.content_length, "demo content".len() as u64);
        assert_eq!(
            share.file_resource.content_hash.as_deref(),
            Some(b64(Sha256::digest(b"demo content")).as_str())
        );
        assert_eq!(std::fs::read(dir.path().join("external/demo")).unwrap(), b"demo content");
    }
}
