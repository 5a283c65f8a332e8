use crate::http::DEFAULT_BASE_PATH;
use std::{error::Error, net::IpAddr, path::PathBuf};
use time::Duration;
use tracing::Level;
use url::Url;

/// Where the signing secret for remote URLs comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningKeySource {
    Disabled,
    Inline(String),
    KeyVault { url: String, secret_name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CosmosSettings {
    pub account: String,
    pub master_key: String,
    pub database: String,
}

/// Startup configuration, read once from the process environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub base_path: String,
    pub manifest: Option<PathBuf>,
    pub storage_root: PathBuf,
    pub remote_url: Option<Url>,
    pub signing_key: SigningKeySource,
    pub signed_url_ttl: Duration,
    pub cosmos: Option<CosmosSettings>,
    pub log_level: Level,
}

impl Settings {
    pub fn from_env() -> Result<Self, Box<dyn Error>> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Box<dyn Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match var("FUNCTIONS_CUSTOMHANDLER_PORT") {
            Some(val) => val.parse::<u16>().map_err(|_| format!("Custom Handler port '{val}' is not a number!"))?,
            None => 3000,
        };

        let bind_addr = match var("GATEWAY_BIND_ADDR") {
            Some(val) => val.parse().map_err(|_| format!("invalid bind address '{val}'"))?,
            None => IpAddr::from([127, 0, 0, 1]),
        };

        let remote_url = match var("STORAGE_REMOTE_URL") {
            Some(val) => Some(Url::parse(&val).map_err(|e| format!("invalid STORAGE_REMOTE_URL '{val}': {e}"))?),
            None => None,
        };

        let signing_key = match (
            var("STORAGE_SIGNING_KEY"),
            var("STORAGE_SIGNING_KEYVAULT_URL"),
            var("STORAGE_SIGNING_SECRET_NAME"),
        ) {
            (Some(key), _, _) => SigningKeySource::Inline(key),
            (None, Some(url), Some(secret_name)) => SigningKeySource::KeyVault { url, secret_name },
            (None, Some(_), None) => return Err("STORAGE_SIGNING_KEYVAULT_URL requires STORAGE_SIGNING_SECRET_NAME".into()),
            (None, None, _) => SigningKeySource::Disabled,
        };

        let signed_url_ttl = match var("SIGNED_URL_TTL_SECONDS") {
            Some(val) => {
                let seconds: i64 = val.parse().map_err(|_| format!("invalid SIGNED_URL_TTL_SECONDS '{val}'"))?;
                if seconds <= 0 {
                    return Err("SIGNED_URL_TTL_SECONDS must be positive".into());
                }
                Duration::seconds(seconds)
            }
            None => Duration::minutes(5),
        };

        let cosmos = match (var("COSMOS_ACCOUNT"), var("COSMOS_MASTER_KEY")) {
            (Some(account), Some(master_key)) => Some(CosmosSettings {
                account,
                master_key,
                database: var("COSMOS_DATABASE").unwrap_or_else(|| "gateway".to_string()),
            }),
            _ => None,
        };

        let log_level = match var("RUST_LOG_LEVEL") {
            Some(val) => val.parse().map_err(|_| format!("invalid RUST_LOG_LEVEL '{val}'"))?,
            None => Level::INFO,
        };

        Ok(Self {
            bind_addr,
            port,
            base_path: var("GATEWAY_BASE_PATH").unwrap_or_else(|| DEFAULT_BASE_PATH.to_string()),
            manifest: var("GATEWAY_MANIFEST").map(PathBuf::from),
            storage_root: var("STORAGE_ROOT").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("./storage")),
            remote_url,
            signing_key,
            signed_url_ttl,
            cosmos,
            log_level,
        })
    }
}
