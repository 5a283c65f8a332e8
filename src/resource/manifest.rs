use super::{
    files::StoredFileResources,
    service::{ExternalFileResourceService, ServiceError},
    ExternalFileResource,
};
use std::{collections::HashSet, path::Path};

/// Reads a JSON array of shares and registers each one together with its file resource.
/// Returns the number of shares registered. A manifest with a duplicate or already
/// registered access token is rejected as a whole.
pub async fn load(
    path: &Path,
    shares: &dyn ExternalFileResourceService,
    files: &StoredFileResources,
) -> Result<usize, ServiceError> {
    let raw = tokio::fs::read(path).await?;
    register_all(&raw, shares, files).await
}

pub async fn register_all(
    raw: &[u8],
    shares: &dyn ExternalFileResourceService,
    files: &StoredFileResources,
) -> Result<usize, ServiceError> {
    let entries: Vec<ExternalFileResource> = serde_json::from_slice(raw)?;
    let count = entries.len();

    // nothing is registered unless every token is free
    let mut tokens = HashSet::new();
    for entry in &entries {
        if entry.access_token.is_empty() {
            continue;
        }
        if !tokens.insert(entry.access_token.as_str())
            || shares.get_by_access_token(&entry.access_token).await?.is_some()
        {
            return Err(format!("access token '{}' is already in use", entry.access_token).into());
        }
    }

    for entry in entries {
        files.register(entry.file_resource.clone())?;
        shares.save(entry).await?;
    }

    Ok(count)
}
