use axum::middleware;
use crate::config::{Settings, SigningKeySource};
use crate::resource::{
    files::StoredFileResources,
    memory::InMemoryExternalFileResources,
    service::{ExternalFileResourceService, FileResourceService},
};
use std::{net::SocketAddr, sync::Arc};
use crate::storage::{filesystem::FilesystemStore, remote::RemoteStore, signing::UrlSigner, ContentStore};
use crate::utils::tracing::{cosmos_sink, cosmos_tracing, init_logging};

mod config;
mod http;
mod keyvault;
mod resource;
mod storage;
mod utils;

type Environment = Arc<EnvironmentInner>;

pub struct EnvironmentInner {
    external_files: Arc<dyn ExternalFileResourceService>,
    files: Arc<dyn FileResourceService>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;

    init_logging(settings.log_level).map_err(|e| format!("could not initialise logging: {e}"))?;

    let store = content_store(&settings).await?;
    log::info!("Serving content from the {} store", store.name());

    let external_files = Arc::new(InMemoryExternalFileResources::new());
    let files = Arc::new(StoredFileResources::new(store, settings.signed_url_ttl));

    if let Some(manifest) = &settings.manifest {
        let count = resource::manifest::load(manifest, external_files.as_ref(), &files)
            .await
            .map_err(|e| format!("could not load manifest {}: {e}", manifest.display()))?;
        log::info!(
            "{} shares registered from {} ({} in total)",
            count,
            manifest.display(),
            external_files.len()
        );
    }

    let environment: Environment = Arc::new(EnvironmentInner {
        external_files,
        files,
    });

    let app = http::routes(Arc::clone(&environment), &settings.base_path);

    // persist request traces if a connection to cosmos db is configured (this is optional)
    let app = match settings.cosmos.as_ref().and_then(|cosmos| cosmos_sink(cosmos, settings.log_level)) {
        Some(sink) => app.layer(middleware::from_fn_with_state(sink, cosmos_tracing)),
        None => app,
    };

    // run our app with hyper
    let addr = SocketAddr::new(settings.bind_addr, settings.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, base_path = %settings.base_path, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn content_store(settings: &Settings) -> Result<Arc<dyn ContentStore>, Box<dyn std::error::Error>> {
    let Some(remote_url) = &settings.remote_url else {
        return Ok(Arc::new(FilesystemStore::new(&settings.storage_root)));
    };

    let signer = match &settings.signing_key {
        SigningKeySource::Disabled => None,
        SigningKeySource::Inline(key) => Some(UrlSigner::new(key).map_err(|_| "invalid signing key")?),
        SigningKeySource::KeyVault { url, secret_name } => {
            let key = keyvault::signing_key(url, secret_name).await?;
            Some(UrlSigner::new(key).map_err(|_| "invalid signing key")?)
        }
    };

    if signer.is_none() {
        log::warn!("No signing key configured, remote content will be proxied");
    }

    Ok(Arc::new(RemoteStore::new(reqwest::Client::new(), remote_url.clone(), signer)))
}
