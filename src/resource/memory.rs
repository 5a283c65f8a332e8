use super::{
    service::{ExternalFileResourceService, ServiceError},
    ExternalFileResource,
};
use async_trait::async_trait;
use std::{collections::HashMap, sync::RwLock};
use uuid::Uuid;

/// Token registry held in process memory, seeded from the manifest at startup.
#[derive(Debug, Default)]
pub struct InMemoryExternalFileResources {
    shares: RwLock<HashMap<String, ExternalFileResource>>,
}

impl InMemoryExternalFileResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.shares.read().map(|shares| shares.len()).unwrap_or_default()
    }
}

#[async_trait]
impl ExternalFileResourceService for InMemoryExternalFileResources {
    async fn get_by_access_token(
        &self,
        access_token: &str,
    ) -> Result<Option<ExternalFileResource>, ServiceError> {
        let shares = self.shares.read().map_err(|_| "token registry lock poisoned")?;
        Ok(shares.get(access_token).cloned())
    }

    async fn save(&self, mut resource: ExternalFileResource) -> Result<String, ServiceError> {
        if resource.access_token.is_empty() {
            resource.access_token = Uuid::new_v4().simple().to_string();
        }

        let mut shares = self.shares.write().map_err(|_| "token registry lock poisoned")?;
        if shares.contains_key(&resource.access_token) {
            return Err(format!("access token '{}' is already in use", resource.access_token).into());
        }

        let access_token = resource.access_token.clone();
        log::info!("registered share {} for file {}", resource.name, resource.file_resource.uid);
        shares.insert(access_token.clone(), resource);

        Ok(access_token)
    }
}
